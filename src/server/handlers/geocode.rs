//! `GET /geocode` and `GET /ip-geolocation`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::json;

use super::{client_ip, parse_coordinates};
use crate::features::Feature;
use crate::server::error::ApiError;
use crate::server::state::AppState;
use crate::types::{GeocodeResult, Location};

#[derive(Debug, Deserialize)]
pub struct GeocodeParams {
    pub q: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

/// GET /geocode?q= or GET /geocode?lat=&lon=
///
/// A `lat`/`lon` pair selects reverse geocoding; otherwise `q` is required.
pub async fn geocode(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GeocodeParams>,
) -> Result<Json<GeocodeResult>, ApiError> {
    if params.lat.is_some() && params.lon.is_some() {
        let (lat, lon) = parse_coordinates(params.lat.as_deref(), params.lon.as_deref())?;
        return state
            .geocode
            .reverse(lat, lon)
            .await
            .map(Json)
            .map_err(|e| ApiError::from_service(e, "Failed to reverse geocode coordinates"));
    }

    let Some(query) = params.q.filter(|q| !q.trim().is_empty()) else {
        return Err(ApiError::invalid(
            "Invalid query parameters",
            json!({ "q": "Location query is required" }),
        ));
    };
    state
        .geocode
        .search(&query)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, "Failed to geocode location"))
}

/// GET /ip-geolocation
pub async fn ip_geolocation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Location>, ApiError> {
    state
        .flags
        .require(Feature::IpGeolocation)
        .map_err(|e| ApiError::forbidden(e.to_string()))?;

    state
        .geocode
        .locate_ip(client_ip(&headers))
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, "Failed to get location from IP address"))
}
