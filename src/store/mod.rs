//! Key-value store backends.
//!
//! The cache layer talks to a [`KeyValueStore`]; two backends exist:
//!
//! - [`RedisStore`]: the shared networked store. Its single connection is
//!   owned by a [`Connector`], which connects lazily, de-duplicates
//!   concurrent connection attempts and reconnects after terminal failures.
//! - [`MemoryStore`]: an in-process moka cache with per-entry TTL, for
//!   single-instance deployments and tests.
//!
//! Store errors never reach API callers: the cache layer logs and absorbs
//! them (see [`crate::cache::ResponseCache`]).

pub mod connector;
pub mod memory;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;

pub use connector::{Connector, Dialer};
pub use memory::MemoryStore;
pub use redis::{RedisDialer, RedisSettings, RedisStore};

/// Errors raised by store backends.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Could not establish a connection.
    #[error("store connection error: {0}")]
    Connection(String),

    /// No ready signal within the connect deadline.
    #[error("store connection timed out after {0:?}")]
    Timeout(Duration),

    /// A command failed on an established connection.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Minimal string key-value store with optional per-entry expiry.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Fetch the raw value under `key`.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, overwriting any previous entry.
    ///
    /// `ttl = None` stores without expiration.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    /// Remove `key` if present.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Remove every key starting with `prefix`, returning the count removed.
    async fn delete_prefix(&self, prefix: &str) -> StoreResult<u64>;

    /// Whether the backend currently holds a ready connection.
    fn is_ready(&self) -> bool {
        true
    }

    /// Shut the backend down gracefully.
    async fn release(&self) {}
}
