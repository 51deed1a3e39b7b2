//! Route handlers.

pub mod food;
pub mod geocode;
pub mod health;
pub mod weather;

use std::net::IpAddr;

use axum::http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{info, warn};

use super::error::ApiError;
use super::state::AppState;
use crate::features::Feature;

/// Decode a JSON body. Syntax and shape errors are both a 400 with the
/// serde message in `details`.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        ApiError::invalid("Invalid request data", json!({ "message": e.to_string() }))
    })
}

/// Check a human-verification token when the `recaptcha` flag is on.
pub(crate) async fn verify_human(
    state: &AppState,
    token: Option<&str>,
    action: &str,
) -> Result<(), ApiError> {
    if !state.flags.is_enabled(Feature::Recaptcha) {
        return Ok(());
    }
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return Err(ApiError::bad_request("Human verification required"));
    };

    let verification = state.verifier.verify(token, action, state.min_score).await;
    if !verification.success {
        warn!(action, codes = ?verification.error_codes, "human verification failed");
        return Err(ApiError::invalid("Human verification failed", &verification));
    }
    info!(action, score = ?verification.score, "human verification passed");
    Ok(())
}

/// Caller address from proxy headers: first `X-Forwarded-For` hop, then
/// `X-Real-IP`.
pub(crate) fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok());
    forwarded.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    })
}

/// Parse a coordinate query value.
pub(crate) fn parse_coordinate(value: Option<&str>, limit: f64) -> Option<f64> {
    value?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() <= limit)
}

/// Parse a `lat`/`lon` pair, reporting the invalid fields.
pub(crate) fn parse_coordinates(lat: Option<&str>, lon: Option<&str>) -> Result<(f64, f64), ApiError> {
    match (parse_coordinate(lat, 90.0), parse_coordinate(lon, 180.0)) {
        (Some(lat), Some(lon)) => Ok((lat, lon)),
        (lat, lon) => {
            let mut details = serde_json::Map::new();
            if lat.is_none() {
                details.insert("lat".into(), json!("Latitude must be a valid number"));
            }
            if lon.is_none() {
                details.insert("lon".into(), json!("Longitude must be a valid number"));
            }
            Err(ApiError::invalid("Invalid query parameters", details))
        }
    }
}
