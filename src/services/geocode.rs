//! Forward, reverse and IP geolocation lookups.

use std::net::IpAddr;
use std::sync::Arc;

use tracing::instrument;

use super::CachePolicy;
use crate::cache::CacheNamespace;
use crate::features::{Feature, FeatureFlags};
use crate::providers::{GeocodeProvider, IpLocator};
use crate::types::{GeocodeResult, Location};
use crate::{ForkcastError, Result};

/// Key part used for IP lookups without a known caller address.
const IP_DEFAULT_PART: &str = "ip_geolocation";

#[derive(Clone)]
pub struct GeocodeService {
    geocoder: Arc<dyn GeocodeProvider>,
    ip_locator: Arc<dyn IpLocator>,
    flags: FeatureFlags,
    cache: CachePolicy,
}

impl std::fmt::Debug for GeocodeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodeService")
            .field("geocoder", &self.geocoder.name())
            .field("ip_locator", &self.ip_locator.name())
            .field("cache", &self.cache)
            .finish()
    }
}

impl GeocodeService {
    pub fn new(
        geocoder: Arc<dyn GeocodeProvider>,
        ip_locator: Arc<dyn IpLocator>,
        flags: FeatureFlags,
        cache: CachePolicy,
    ) -> Self {
        Self {
            geocoder,
            ip_locator,
            flags,
            cache,
        }
    }

    /// Resolve a free-text place name.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<GeocodeResult> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ForkcastError::InvalidInput("query must not be empty".into()));
        }
        self.cache
            .fetch(
                CacheNamespace::Geolocation,
                || search_key(query),
                || self.geocoder.search(query),
            )
            .await
    }

    /// Name the place at a point.
    #[instrument(skip(self))]
    pub async fn reverse(&self, latitude: f64, longitude: f64) -> Result<GeocodeResult> {
        self.cache
            .fetch(
                CacheNamespace::Geolocation,
                || reverse_key(latitude, longitude),
                || self.geocoder.reverse(latitude, longitude),
            )
            .await
    }

    /// Locate a caller by IP address. Gated on `ipGeolocation`.
    ///
    /// Without an address the provider geolocates the connection it sees.
    #[instrument(skip(self))]
    pub async fn locate_ip(&self, ip: Option<IpAddr>) -> Result<Location> {
        self.flags.require(Feature::IpGeolocation)?;
        self.cache
            .fetch(
                CacheNamespace::Geolocation,
                || ip_key(ip),
                || self.ip_locator.locate(ip),
            )
            .await
    }
}

/// Cache key for a forward lookup: case and surrounding whitespace are
/// ignored.
pub fn search_key(query: &str) -> String {
    CacheNamespace::Geolocation.key([Some(query.trim().to_lowercase())])
}

/// Cache key for a reverse lookup, coordinates rounded to 3 decimals.
pub fn reverse_key(latitude: f64, longitude: f64) -> String {
    CacheNamespace::Geolocation.key([Some(format!("rev:{latitude:.3},{longitude:.3}"))])
}

/// Cache key for an IP lookup.
pub fn ip_key(ip: Option<IpAddr>) -> String {
    let part = ip.map_or_else(|| IP_DEFAULT_PART.to_string(), |ip| ip.to_string());
    CacheNamespace::Geolocation.key([Some(part)])
}
