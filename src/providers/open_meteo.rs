//! Open-Meteo forecast client.
//!
//! See: <https://open-meteo.com/en/docs>

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::traits::WeatherProvider;
use super::{api_error, record_request};
use crate::Result;
use crate::types::{CurrentConditions, Forecast, HourlyPoint, MAX_HOURLY_FORECAST};

/// Default base URL for the Open-Meteo API.
pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

const PROVIDER: &str = "open-meteo";

const CURRENT_FIELDS: &str = "temperature_2m,weather_code,relative_humidity_2m,uv_index";
const HOURLY_FIELDS: &str = "temperature_2m,weather_code";

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<Forecast> {
        let url = format!("{}/v1/forecast", self.base_url);
        let (latitude, longitude) = (latitude.to_string(), longitude.to_string());
        let forecast_hours = MAX_HOURLY_FORECAST.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current", CURRENT_FIELDS),
                ("hourly", HOURLY_FIELDS),
                ("forecast_hours", forecast_hours.as_str()),
                ("timezone", "auto"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(PROVIDER, response).await);
        }

        let body: ForecastResponse = response.json().await?;
        Ok(body.into_forecast())
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<Forecast> {
        let started = Instant::now();
        let result = self.fetch(latitude, longitude).await;
        record_request(PROVIDER, started, &result);
        result
    }
}

#[derive(Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    #[serde(default)]
    hourly: Option<HourlyBlock>,
}

#[derive(Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    weather_code: i64,
    #[serde(default)]
    relative_humidity_2m: Option<f64>,
    #[serde(default)]
    uv_index: Option<f64>,
}

#[derive(Deserialize)]
struct HourlyBlock {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<i64>>,
}

impl ForecastResponse {
    fn into_forecast(self) -> Forecast {
        let hourly = self
            .hourly
            .map(|block| {
                block
                    .time
                    .into_iter()
                    .zip(block.temperature_2m)
                    .zip(block.weather_code)
                    .filter_map(|((time, temperature), code)| {
                        Some(HourlyPoint {
                            time,
                            temperature: temperature?,
                            weather_code: code?,
                        })
                    })
                    .take(MAX_HOURLY_FORECAST)
                    .collect()
            })
            .unwrap_or_default();

        Forecast {
            current: CurrentConditions {
                temperature: self.current.temperature_2m,
                weather_code: self.current.weather_code,
                humidity: self.current.relative_humidity_2m,
                uv_index: self.current.uv_index,
            },
            hourly,
        }
    }
}
