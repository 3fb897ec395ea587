//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. Holds no ledger data: every request opens
//! its own gateway session through [`Services`].

use mlchain_core::Settings;
use mlchain_workflow::Services;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind.
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { port: 5000 }
    }
}

impl AppConfig {
    /// Read `PORT` from the environment, falling back to 5000.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);
        Self { port }
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: Services,
}

impl AppState {
    /// State over already-wired services.
    pub fn new(config: AppConfig, services: Services) -> Self {
        Self { config, services }
    }

    /// State with on-disk wallets and network clients built from `settings`.
    pub fn from_settings(config: AppConfig, settings: Settings) -> Self {
        Self::new(config, Services::from_settings(settings))
    }
}
