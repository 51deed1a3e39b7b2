//! ipapi.co IP geolocation client.

use std::net::IpAddr;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::traits::IpLocator;
use super::{api_error, record_request};
use crate::types::Location;
use crate::{ForkcastError, Result};

/// Default base URL for ipapi.co.
pub const DEFAULT_BASE_URL: &str = "https://ipapi.co";

const PROVIDER: &str = "ipapi";

#[derive(Debug, Clone)]
pub struct IpApiClient {
    http: Client,
    base_url: String,
}

impl IpApiClient {
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

    async fn fetch(&self, ip: Option<IpAddr>) -> Result<Location> {
        let url = match ip {
            Some(ip) => format!("{}/{ip}/json/", self.base_url),
            None => format!("{}/json/", self.base_url),
        };
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(api_error(PROVIDER, response).await);
        }

        let body: IpApiResponse = response.json().await?;
        let not_found = || {
            let target = ip.map_or_else(|| "caller".to_string(), |ip| ip.to_string());
            match &body.reason {
                Some(reason) => ForkcastError::LocationNotFound(format!("{target}: {reason}")),
                None => ForkcastError::LocationNotFound(target),
            }
        };
        let (Some(latitude), Some(longitude)) = (body.latitude, body.longitude) else {
            return Err(not_found());
        };

        Ok(Location {
            latitude,
            longitude,
            city: body.city,
            region: body.region,
            country: body.country_name,
        })
    }
}

#[async_trait]
impl IpLocator for IpApiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn locate(&self, ip: Option<IpAddr>) -> Result<Location> {
        let started = Instant::now();
        let result = self.fetch(ip).await;
        record_request(PROVIDER, started, &result);
        result
    }
}

#[derive(Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    region: Option<String>,
    country_name: Option<String>,
    /// Set alongside `"error": true` for reserved or unknown addresses.
    reason: Option<String>,
}
