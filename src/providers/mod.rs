//! Upstream provider clients.
//!
//! - [`OpenAiClient`]: OpenAI-compatible chat completions (LLM)
//! - [`OpenMeteoClient`]: current weather and hourly forecast
//! - [`NominatimClient`]: forward and reverse geocoding
//! - [`IpApiClient`]: IP geolocation
//! - [`RecaptchaVerifier`]: human verification
//!
//! Every client takes its base URL at construction so tests can point it at
//! a wiremock server.

pub mod ipapi;
pub mod nominatim;
pub mod open_meteo;
pub mod openai;
pub mod recaptcha;
pub mod retry;
pub mod traits;

use std::time::{Duration, Instant};

use reqwest::Client;

pub use ipapi::IpApiClient;
pub use nominatim::NominatimClient;
pub use open_meteo::OpenMeteoClient;
pub use openai::OpenAiClient;
pub use recaptcha::RecaptchaVerifier;
pub use retry::{RetryConfig, RetryingCompletionProvider};
pub use traits::{CompletionProvider, GeocodeProvider, HumanVerifier, IpLocator, WeatherProvider};

use crate::{ForkcastError, Result, telemetry};

/// User agent sent to every upstream. Nominatim's usage policy requires one.
pub const DEFAULT_USER_AGENT: &str = concat!("forkcast/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout for non-LLM providers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Build an HTTP client with the given timeout and user agent.
pub fn http_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| ForkcastError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Record request count and latency for one upstream call.
pub(crate) fn record_request<T>(provider: &str, started: Instant, result: &Result<T>) {
    let status = if result.is_ok() { "ok" } else { "error" };
    metrics::counter!(
        telemetry::PROVIDER_REQUESTS_TOTAL,
        "provider" => provider.to_owned(),
        "status" => status,
    )
    .increment(1);
    metrics::histogram!(telemetry::PROVIDER_REQUEST_DURATION_SECONDS, "provider" => provider.to_owned())
        .record(started.elapsed().as_secs_f64());
}

/// Map a non-success status to an [`ForkcastError::Api`] carrying a short
/// excerpt of the body.
pub(crate) async fn api_error(provider: &str, response: reqwest::Response) -> ForkcastError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(200).collect();
    ForkcastError::Api {
        status: status.as_u16(),
        message: format!("{provider} returned {status}: {excerpt}"),
    }
}
