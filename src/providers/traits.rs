//! Provider traits for the upstream services forkcast depends on.
//!
//! Each upstream capability gets its own narrow trait rather than one
//! "god trait", which keeps the fetchers testable against in-process fakes
//! and lets decorators like [`RetryingCompletionProvider`](super::retry::RetryingCompletionProvider)
//! wrap a single capability.

use std::net::IpAddr;

use async_trait::async_trait;

use crate::Result;
use crate::types::{CompletionRequest, Forecast, GeocodeResult, Location, Verification};

// ============================================================================
// LLM completions
// ============================================================================

/// Chat-completion backend returning the raw message content.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logging/metrics.
    fn name(&self) -> &str;

    /// Run one completion and return the first choice's content.
    ///
    /// Empty content is [`ForkcastError::EmptyResponse`](crate::ForkcastError::EmptyResponse);
    /// HTTP 429 is [`ForkcastError::RateLimited`](crate::ForkcastError::RateLimited).
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

// ============================================================================
// Weather
// ============================================================================

/// Current conditions and short-range hourly forecast for a point.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<Forecast>;
}

// ============================================================================
// Geocoding
// ============================================================================

/// Forward and reverse geocoding.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Best match for a free-text place query.
    ///
    /// No match is [`ForkcastError::LocationNotFound`](crate::ForkcastError::LocationNotFound).
    async fn search(&self, query: &str) -> Result<GeocodeResult>;

    /// Place containing a coordinate, at city-level granularity.
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<GeocodeResult>;
}

/// Approximate location of an IP address.
#[async_trait]
pub trait IpLocator: Send + Sync {
    fn name(&self) -> &str;

    /// Locate `ip`, or the address the request reaches the provider from
    /// when `None`.
    async fn locate(&self, ip: Option<IpAddr>) -> Result<Location>;
}

// ============================================================================
// Human verification
// ============================================================================

/// Pass/fail check of a client-side verification token.
///
/// Never errors: transport failures are reported as a failed
/// [`Verification`] with a `verification-failed` code.
#[async_trait]
pub trait HumanVerifier: Send + Sync {
    async fn verify(&self, token: &str, expected_action: &str, min_score: f64) -> Verification;
}
