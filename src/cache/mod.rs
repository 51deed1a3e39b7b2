//! Response cache over a shared key-value store.
//!
//! [`ResponseCache`] stores JSON-serialized values under namespaced keys
//! derived by [`key::generate_key`]. The cache is strictly best-effort:
//! store failures and undecodable payloads are logged, counted and treated
//! as a miss (reads) or a no-op (writes). They never reach the caller.
//!
//! [`ResponseCache::get_or_fetch`] does not coalesce concurrent misses. Two
//! requests that miss the same key at the same time both run their fetch
//! and the later write wins; every entry is a full overwrite with the same
//! TTL, so the result is still consistent.

pub mod key;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub use key::{CacheNamespace, generate_key};

use crate::Result;
use crate::store::KeyValueStore;
use crate::telemetry;

/// Metric label for keys outside the known namespaces.
const OTHER_NAMESPACE: &str = "other";

fn namespace_label(key: &str) -> &'static str {
    CacheNamespace::of_key(key).map_or(OTHER_NAMESPACE, |ns| ns.name())
}

fn record_error(operation: &'static str) {
    metrics::counter!(telemetry::CACHE_ERRORS_TOTAL, "operation" => operation).increment(1);
}

/// Best-effort JSON cache.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("store", &self.store.name())
            .finish()
    }
}

impl ResponseCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Read and decode the value under `key`. Any failure is a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, treating as miss");
                record_error("get");
                return None;
            }
        };

        let namespace = namespace_label(key);
        let Some(raw) = raw else {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "namespace" => namespace).increment(1);
            debug!(key, "cache miss");
            return None;
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "namespace" => namespace)
                    .increment(1);
                debug!(key, "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "cached payload undecodable, treating as miss");
                record_error("get");
                None
            }
        }
    }

    /// Encode and store `value`. `ttl = None` stores without expiry.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "cache value not serializable, skipping write");
                record_error("set");
                return;
            }
        };
        if let Err(e) = self.store.set(key, &raw, ttl).await {
            warn!(key, error = %e, "cache write failed");
            record_error("set");
        }
    }

    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            warn!(key, error = %e, "cache delete failed");
            record_error("delete");
        }
    }

    /// Delete every entry under `prefix`. Returns the number removed, or 0
    /// when the store is unavailable.
    pub async fn invalidate_namespace(&self, prefix: &str) -> u64 {
        match self.store.delete_prefix(prefix).await {
            Ok(deleted) => {
                debug!(prefix, deleted, "cache namespace invalidated");
                deleted
            }
            Err(e) => {
                warn!(prefix, error = %e, "cache namespace invalidation failed");
                record_error("invalidate");
                0
            }
        }
    }

    /// Return the cached value under `key`, or run `fetch`, store its result
    /// and return it.
    ///
    /// `fetch` runs at most once. Its errors propagate and nothing is
    /// stored.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(cached) = self.get(key).await {
            return Ok(cached);
        }
        let fresh = fetch().await?;
        self.set(key, &fresh, ttl).await;
        Ok(fresh)
    }
}
