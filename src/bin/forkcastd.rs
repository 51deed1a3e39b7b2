//! forkcastd: the Forkcast daemon.
//!
//! Serves the recommendation, food-details, weather and geocoding routes
//! over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use forkcast::server::config::{Config, Secrets};
use forkcast::server::{AppState, create_app};

const DEFAULT_LOG_FILTER: &str = "forkcast=info,forkcastd=info,tower_http=info";

/// Forkcast daemon: weather-aware dish recommendations.
#[derive(Parser)]
#[command(name = "forkcastd")]
#[command(version = forkcast::PKG_VERSION)]
#[command(about = "Forkcast recommendation service")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "FORKCAST_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let secrets = Secrets::load()?;
    let config = Config::load(args.config.as_deref())?
        .with_secrets(&secrets)
        .with_env_overrides();
    config.validate()?;

    let addr: SocketAddr = config.server.address.parse().map_err(|e| {
        forkcast::ForkcastError::Configuration(format!("Invalid address: {e}"))
    })?;

    let state = Arc::new(AppState::from_config(&config)?);
    if state.flags.recaptcha && config.verification.secret_key.is_none() {
        warn!("human verification is enabled but no secret is configured; verified routes will reject requests");
    }
    let app = create_app(Arc::clone(&state), config.server.request_timeout());

    info!(version = %forkcast::version_string(), %addr, "forkcastd starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown().await;
    info!("forkcastd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
