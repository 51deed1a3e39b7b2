//! Domain fetchers.
//!
//! Each fetcher gates on its feature flag, derives a namespaced cache key
//! from the normalized inputs, and runs the provider call through
//! [`ResponseCache::get_or_fetch`] when caching is enabled. LLM-backed
//! fetchers go through the [`CompletionRouter`], which admits calls per
//! model configuration.

pub mod food;
pub mod geocode;
pub mod llm;
pub mod prompt;
pub mod weather;

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use food::{FoodService, RecommendationQuery};
pub use geocode::GeocodeService;
pub use llm::CompletionRouter;
pub use weather::WeatherService;

use crate::Result;
use crate::cache::{CacheNamespace, ResponseCache};
use crate::features::{Feature, FeatureFlags};

/// Cache handle bound to the `enableCaching` flag.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    cache: ResponseCache,
    enabled: bool,
}

impl CachePolicy {
    pub fn new(cache: ResponseCache, flags: &FeatureFlags) -> Self {
        Self {
            cache,
            enabled: flags.is_enabled(Feature::EnableCaching),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Run `fetch` through the cache under `namespace`, or directly when
    /// caching is off. The key is only derived when it is used.
    pub(crate) async fn fetch<T, K, F, Fut>(
        &self,
        namespace: CacheNamespace,
        key: K,
        fetch: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        K: FnOnce() -> String,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.enabled {
            return fetch().await;
        }
        self.cache
            .get_or_fetch(&key(), Some(namespace.ttl()), fetch)
            .await
    }
}
