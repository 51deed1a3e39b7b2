//! `GET /health`

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::server::state::AppState;
use crate::version;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub store: StoreHealth,
}

#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub backend: String,
    /// A cold store is not an outage: it connects on first use.
    pub ready: bool,
}

/// Always 200 while the process serves requests.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: version::version_string(),
        store: StoreHealth {
            backend: state.store.name().to_string(),
            ready: state.store.is_ready(),
        },
    })
}
