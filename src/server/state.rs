//! Shared application state for the HTTP routes.

use std::sync::Arc;

use tracing::info;

use super::config::{CacheBackend, Config};
use crate::cache::ResponseCache;
use crate::catalog::MessageCatalog;
use crate::features::FeatureFlags;
use crate::providers::{
    GeocodeProvider, HumanVerifier, IpApiClient, IpLocator, NominatimClient, OpenMeteoClient,
    RecaptchaVerifier, WeatherProvider, http_client,
};
use crate::services::{CachePolicy, CompletionRouter, FoodService, GeocodeService, WeatherService};
use crate::store::{KeyValueStore, MemoryStore, RedisStore};
use crate::{ForkcastError, Result};

/// Everything a route handler needs, built once at startup.
pub struct AppState {
    pub flags: FeatureFlags,
    pub weather: WeatherService,
    pub geocode: GeocodeService,
    pub food: FoodService,
    pub verifier: Arc<dyn HumanVerifier>,
    pub min_score: f64,
    pub default_locale: String,
    pub store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("flags", &self.flags)
            .field("store", &self.store.name())
            .field("default_locale", &self.default_locale)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the state with the store selected by `[cache] backend`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match config.cache.backend {
            CacheBackend::Redis => {
                info!(target = %config.redis.describe(), "using redis cache store");
                Arc::new(
                    RedisStore::new(config.redis.clone())
                        .map_err(|e| ForkcastError::Configuration(e.to_string()))?,
                )
            }
            CacheBackend::Memory => {
                info!(capacity = config.cache.memory_capacity, "using in-memory cache store");
                Arc::new(MemoryStore::new(config.cache.memory_capacity))
            }
        };
        Self::with_store(config, store)
    }

    /// Build the state around an existing store.
    pub fn with_store(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        config.validate()?;

        let flags = config.features.clone();
        let catalog = Arc::new(
            MessageCatalog::builtin()?.with_default_locale(&config.locale.default_locale),
        );
        let cache = CachePolicy::new(ResponseCache::new(Arc::clone(&store)), &flags);

        let providers = &config.providers;
        let http = http_client(providers.timeout(), &providers.user_agent)?;
        let weather_provider: Arc<dyn WeatherProvider> = Arc::new(OpenMeteoClient::with_base_url(
            http.clone(),
            &providers.open_meteo_url,
        ));
        let geocoder: Arc<dyn GeocodeProvider> = Arc::new(NominatimClient::with_base_url(
            http.clone(),
            &providers.nominatim_url,
        ));
        let ip_locator: Arc<dyn IpLocator> =
            Arc::new(IpApiClient::with_base_url(http.clone(), &providers.ipapi_url));
        let verifier: Arc<dyn HumanVerifier> = Arc::new(RecaptchaVerifier::with_verify_url(
            http,
            &config.verification.verify_url,
            config.verification.secret_key.clone(),
        ));

        let llm = Arc::new(CompletionRouter::from_model_configs(&config.models)?);

        Ok(Self {
            weather: WeatherService::new(
                weather_provider,
                Arc::clone(&geocoder),
                catalog,
                cache.clone(),
            ),
            geocode: GeocodeService::new(geocoder, ip_locator, flags.clone(), cache.clone()),
            food: FoodService::new(llm, flags.clone(), cache)
                .with_model_config(&config.server.model_config),
            flags,
            verifier,
            min_score: config.verification.min_score,
            default_locale: config.locale.default_locale.clone(),
            store,
        })
    }

    /// Release the store connection.
    pub async fn shutdown(&self) {
        self.store.release().await;
    }
}
