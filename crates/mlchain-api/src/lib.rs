//! # mlchain-api: REST Gateway
//!
//! Thin HTTP front for the ledger workflow. Each request opens one gateway
//! session as a configured admin identity, runs its chaincode calls, and
//! disconnects before responding.
//!
//! ## API Surface
//!
//! | Route | Handler | Chaincode calls |
//! |-------|---------|-----------------|
//! | `POST /api/users/register` | [`routes::users`] | CA register |
//! | `POST /api/users/authorize` | [`routes::users`] | `Authorize` |
//! | `POST /api/tokens` | [`routes::tokens`] | `GetBalance`, `Mint` (shortfall), `Transfer` |
//! | `GET /api/tokens/balance` | [`routes::tokens`] | `GetUserBalance` |
//! | `GET /api/tokens/totalSupply` | [`routes::tokens`] | `TotalSupply` |
//! | `GET /api/tokens/allowance` | [`routes::tokens`] | `Allowance` |
//! | `GET /api/models` | [`routes::models`] | `GetModel`, `GetModelsByDev`, `GetAllModels` |
//!
//! Health probes live at `/health/liveness` and `/health/readiness`; the
//! OpenAPI document at `/openapi.json`.

pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::users::router())
        .merge(routes::tokens::router())
        .merge(routes::models::router())
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe: 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the router is serving.
async fn readiness() -> &'static str {
    "ready"
}
