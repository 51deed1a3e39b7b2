//! Nominatim (OpenStreetMap) geocoding client.
//!
//! See: <https://nominatim.org/release-docs/latest/api/Overview/>. The
//! usage policy requires an identifying `User-Agent`, which the shared HTTP
//! client sets.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::traits::GeocodeProvider;
use super::{api_error, record_request};
use crate::types::{GeocodeResult, Location};
use crate::{ForkcastError, Result};

/// Default base URL for the public Nominatim instance.
pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Reverse-geocoding zoom: city level.
pub const REVERSE_ZOOM: u8 = 10;

const PROVIDER: &str = "nominatim";

#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: Client,
    base_url: String,
}

impl NominatimClient {
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

    async fn fetch_search(&self, query: &str) -> Result<GeocodeResult> {
        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", "1"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(PROVIDER, response).await);
        }

        let places: Vec<Place> = response.json().await?;
        places
            .into_iter()
            .next()
            .and_then(Place::into_result)
            .ok_or_else(|| ForkcastError::LocationNotFound(query.to_string()))
    }

    async fn fetch_reverse(&self, latitude: f64, longitude: f64) -> Result<GeocodeResult> {
        let (lat, lon, zoom) = (
            latitude.to_string(),
            longitude.to_string(),
            REVERSE_ZOOM.to_string(),
        );
        let response = self
            .http
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "json"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("zoom", zoom.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(PROVIDER, response).await);
        }

        // Unknown points come back as 200 with an `error` field and no coordinates.
        let place: Place = response.json().await?;
        place
            .into_result()
            .ok_or_else(|| ForkcastError::LocationNotFound(format!("{latitude},{longitude}")))
    }
}

#[async_trait]
impl GeocodeProvider for NominatimClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn search(&self, query: &str) -> Result<GeocodeResult> {
        let started = Instant::now();
        let result = self.fetch_search(query).await;
        record_request(PROVIDER, started, &result);
        result
    }

    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<GeocodeResult> {
        let started = Instant::now();
        let result = self.fetch_reverse(latitude, longitude).await;
        record_request(PROVIDER, started, &result);
        result
    }
}

#[derive(Deserialize)]
struct Place {
    lat: Option<String>,
    lon: Option<String>,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    county: Option<String>,
    country: Option<String>,
}

impl Place {
    fn into_result(self) -> Option<GeocodeResult> {
        let latitude = self.lat?.parse().ok()?;
        let longitude = self.lon?.parse().ok()?;
        let mut location = Location::new(latitude, longitude);
        if let Some(address) = self.address {
            location.city = address.city.or(address.town).or(address.village);
            location.region = address.state.or(address.county);
            location.country = address.country;
        }
        Some(GeocodeResult {
            location,
            display_name: self.display_name,
        })
    }
}
