//! Forkcast error types

use std::time::Duration;

/// Forkcast error types
#[derive(Debug, thiserror::Error)]
pub enum ForkcastError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Upstream answered 429. Surfaced to callers as a "try again" condition;
    /// the admission controller never re-submits these.
    #[error("rate limit exceeded for {config}, please try again in a moment")]
    RateLimited {
        config: String,
        retry_after: Option<Duration>,
    },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("location not found: {0}")]
    LocationNotFound(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider returned a payload that does not match the expected shape.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("empty response from model")]
    EmptyResponse,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Gating errors
    #[error("{0} feature is disabled")]
    FeatureDisabled(&'static str),

    // Configuration errors
    #[error("no configuration found for model type: {0}")]
    UnknownModelConfig(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ForkcastError {
    /// Whether a retry at the client level may succeed.
    ///
    /// Rate limits are deliberately not transient here: they are reported to
    /// the caller instead of being hammered again from inside the process.
    pub fn is_transient(&self) -> bool {
        match self {
            ForkcastError::Http(_) => true,
            ForkcastError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Provider-supplied backoff hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ForkcastError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ForkcastError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ForkcastError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            ForkcastError::MalformedResponse(err.to_string())
        } else {
            ForkcastError::Http(err.to_string())
        }
    }
}

/// Result type alias for Forkcast operations
pub type Result<T> = std::result::Result<T, ForkcastError>;
