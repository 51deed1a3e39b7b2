//! HTTP error responses.
//!
//! Every failure leaves a route as `{"error": "...", "details": {...}?}` with
//! status 400, 403 or 500. Upstream failures are logged here and replaced by
//! the route's generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::ForkcastError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                details,
            },
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, None)
    }

    /// 400 carrying validation or verification detail.
    pub fn invalid(error: impl Into<String>, details: impl Serialize) -> Self {
        let details = serde_json::to_value(details).ok();
        Self::new(StatusCode::BAD_REQUEST, error, details)
    }

    pub fn forbidden(error: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, error, None)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error, None)
    }

    /// Map a fetcher error for a route whose generic failure text is `fallback`.
    ///
    /// Gating and input errors keep their own message. Rate limits say to try
    /// again. Everything else is logged and reported as `fallback`.
    pub fn from_service(err: ForkcastError, fallback: &str) -> Self {
        match err {
            ForkcastError::FeatureDisabled(_) => Self::forbidden(err.to_string()),
            ForkcastError::InvalidInput(message) => Self::bad_request(message),
            ForkcastError::RateLimited { .. } => {
                warn!(error = %err, "upstream rate limit reached");
                Self::internal(err.to_string())
            }
            other => {
                error!(error = %other, "{fallback}");
                Self::internal(fallback)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_disabled_is_forbidden() {
        let err = ApiError::from_service(
            ForkcastError::FeatureDisabled("Meal type selection"),
            "Failed to generate food recommendations",
        );
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.body.error, "Meal type selection feature is disabled");
    }

    #[test]
    fn upstream_errors_are_generic() {
        let err = ApiError::from_service(
            ForkcastError::Api {
                status: 502,
                message: "secret upstream detail".into(),
            },
            "Failed to fetch weather data",
        );
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.error, "Failed to fetch weather data");
        assert!(err.body.details.is_none());
    }

    #[test]
    fn rate_limit_says_try_again() {
        let err = ApiError::from_service(
            ForkcastError::RateLimited {
                config: "openai".into(),
                retry_after: None,
            },
            "Failed to get food details",
        );
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.body.error.contains("try again"));
    }

    #[test]
    fn body_skips_missing_details() {
        let json = serde_json::to_value(ApiError::bad_request("bad").body).unwrap();
        assert_eq!(json, serde_json::json!({"error": "bad"}));
    }
}
