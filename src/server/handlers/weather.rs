//! `GET /weather`

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use super::parse_coordinates;
use crate::catalog::FALLBACK_LOCALE;
use crate::server::error::ApiError;
use crate::server::state::AppState;
use crate::types::Weather;

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub locale: Option<String>,
}

/// GET /weather?lat=&lon=&locale=
///
/// Condition texts default to English.
pub async fn weather(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<Weather>, ApiError> {
    let (lat, lon) = parse_coordinates(params.lat.as_deref(), params.lon.as_deref())?;
    let locale = params
        .locale
        .as_deref()
        .filter(|l| !l.is_empty())
        .unwrap_or(FALLBACK_LOCALE);

    state
        .weather
        .current(lat, lon, locale)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, "Failed to fetch weather data"))
}
