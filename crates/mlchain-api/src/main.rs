//! # mlchain-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Settings come from `MLCHAIN_SETTINGS`
//! (a YAML file, optional) and `MLCHAIN_*` overrides; the port from `PORT`
//! (default 5000).

use std::path::PathBuf;

use mlchain_api::state::{AppConfig, AppState};
use mlchain_core::Settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    let settings_path = std::env::var_os("MLCHAIN_SETTINGS").map(PathBuf::from);
    let settings = Settings::load(settings_path.as_deref()).map_err(|e| {
        tracing::error!("Settings rejected: {e}");
        e
    })?;
    tracing::info!(
        channel = %settings.channel,
        connection_dir = %settings.connection_dir.display(),
        wallet_dir = %settings.wallet_dir.display(),
        "settings loaded"
    );

    let port = config.port;
    let app = mlchain_api::app(AppState::from_settings(config, settings));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("mlchain API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
