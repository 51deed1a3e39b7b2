//! HTTP API.
//!
//! This module provides:
//! - Configuration types and loading (`config`)
//! - Shared state wiring providers, cache and admission together (`state`)
//! - The `{error, details?}` error response (`error`)
//! - Route handlers (`handlers`)

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::ApiError;
pub use state::AppState;

/// Build the router with the tracing, CORS and timeout layers applied.
pub fn create_app(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/recommendations", post(handlers::food::recommendations))
        .route("/food-details", post(handlers::food::food_details))
        .route("/weather", get(handlers::weather::weather))
        .route("/geocode", get(handlers::geocode::geocode))
        .route("/ip-geolocation", get(handlers::geocode::ip_geolocation))
        .route("/health", get(handlers::health::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                )),
        )
        .with_state(state)
}

fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
