//! Forkcast - weather-aware dish recommendations
//!
//! This crate recommends dishes from the weather, the location and the
//! user's dietary constraints, backed by an OpenAI-compatible LLM. Expensive
//! upstream calls are cached in a shared key-value store (Redis, or an
//! in-process moka cache) under namespaced, hashed keys, and LLM calls are
//! admitted through per-configuration FIFO lanes.
//!
//! # Weather Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use forkcast::cache::ResponseCache;
//! use forkcast::catalog::MessageCatalog;
//! use forkcast::features::FeatureFlags;
//! use forkcast::providers::{NominatimClient, OpenMeteoClient, http_client, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
//! use forkcast::services::{CachePolicy, WeatherService};
//! use forkcast::store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> forkcast::Result<()> {
//!     let http = http_client(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)?;
//!     let cache = CachePolicy::new(
//!         ResponseCache::new(Arc::new(MemoryStore::default())),
//!         &FeatureFlags::default(),
//!     );
//!     let weather = WeatherService::new(
//!         Arc::new(OpenMeteoClient::new(http.clone())),
//!         Arc::new(NominatimClient::new(http)),
//!         Arc::new(MessageCatalog::builtin()?),
//!         cache,
//!     );
//!
//!     let now = weather.current(21.03, 105.85, "vi").await?;
//!     println!("{}: {}°C, {}", now.location, now.temperature, now.condition_text);
//!     Ok(())
//! }
//! ```
//!
//! # Admission Example
//!
//! ```rust
//! use forkcast::admission::AdmissionController;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> forkcast::Result<()> {
//! let admission = AdmissionController::new([("openai", 2)]);
//! let answer = admission.submit("openai", || async { Ok(42) }).await?;
//! assert_eq!(answer, 42);
//! assert!(admission.submit("unknown", || async { Ok(0) }).await.is_err());
//! # Ok(())
//! # }
//! ```

pub mod admission;
pub mod cache;
pub mod catalog;
pub mod error;
pub mod features;
pub mod providers;
#[cfg(feature = "server")]
pub mod server;
pub mod services;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use admission::AdmissionController;
pub use cache::{CacheNamespace, ResponseCache, generate_key};
pub use error::{ForkcastError, Result};
pub use features::{Feature, FeatureFlags};
pub use version::{PKG_VERSION, version_string};

// Re-export all types
pub use types::{
    FoodInfo, FoodRecommendation, GeocodeResult, HourlyForecast, Location, MealType, ModelConfig,
    Verification, Weather, weather_condition, weather_icon,
};
