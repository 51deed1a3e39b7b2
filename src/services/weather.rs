//! Localized current weather with a short hourly outlook.

use std::sync::Arc;

use tracing::{debug, instrument};

use super::CachePolicy;
use crate::Result;
use crate::cache::CacheNamespace;
use crate::catalog::MessageCatalog;
use crate::providers::{GeocodeProvider, WeatherProvider};
use crate::types::{Forecast, HourlyForecast, MAX_HOURLY_FORECAST, Weather, weather_condition};

/// Display name components kept for the weather location label.
const LOCATION_NAME_PARTS: usize = 2;

#[derive(Clone)]
pub struct WeatherService {
    weather: Arc<dyn WeatherProvider>,
    geocoder: Arc<dyn GeocodeProvider>,
    catalog: Arc<MessageCatalog>,
    cache: CachePolicy,
}

impl std::fmt::Debug for WeatherService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherService")
            .field("weather", &self.weather.name())
            .field("geocoder", &self.geocoder.name())
            .field("cache", &self.cache)
            .finish()
    }
}

impl WeatherService {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        geocoder: Arc<dyn GeocodeProvider>,
        catalog: Arc<MessageCatalog>,
        cache: CachePolicy,
    ) -> Self {
        Self {
            weather,
            geocoder,
            catalog,
            cache,
        }
    }

    /// Current weather at a point, with condition texts in `locale`.
    ///
    /// Cached for ten minutes per (lat, lon rounded to 2 decimals, locale).
    #[instrument(skip(self))]
    pub async fn current(&self, latitude: f64, longitude: f64, locale: &str) -> Result<Weather> {
        self.cache
            .fetch(
                CacheNamespace::Weather,
                || weather_key(latitude, longitude, locale),
                || self.fetch(latitude, longitude, locale),
            )
            .await
    }

    async fn fetch(&self, latitude: f64, longitude: f64, locale: &str) -> Result<Weather> {
        let (forecast, place) = tokio::try_join!(
            self.weather.forecast(latitude, longitude),
            self.geocoder.reverse(latitude, longitude),
        )?;
        let location = location_name(&place.display_name);
        debug!(%location, hours = forecast.hourly.len(), "fetched weather");
        Ok(self.localize(forecast, location, locale))
    }

    fn localize(&self, forecast: Forecast, location: String, locale: &str) -> Weather {
        let current = forecast.current;
        let hourly: Vec<HourlyForecast> = forecast
            .hourly
            .into_iter()
            .take(MAX_HOURLY_FORECAST)
            .map(|point| HourlyForecast {
                condition_text: self.catalog.condition_text(locale, point.weather_code),
                time: point.time,
                temperature: point.temperature,
                weather_code: point.weather_code,
            })
            .collect();

        Weather {
            temperature: current.temperature,
            condition: weather_condition(current.weather_code),
            condition_text: self.catalog.condition_text(locale, current.weather_code),
            location,
            humidity: current.humidity,
            uv_index: current.uv_index,
            hourly_forecast: (!hourly.is_empty()).then_some(hourly),
        }
    }
}

/// Cache key for a weather lookup.
pub fn weather_key(latitude: f64, longitude: f64, locale: &str) -> String {
    CacheNamespace::Weather.key([
        Some(format!("{latitude:.2}")),
        Some(format!("{longitude:.2}")),
        Some(locale.to_string()),
    ])
}

/// Short location label: the first two components of a display name.
pub fn location_name(display_name: &str) -> String {
    display_name
        .split(',')
        .take(LOCATION_NAME_PARTS)
        .collect::<Vec<_>>()
        .join(",")
}
