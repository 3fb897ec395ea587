//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI document for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "mlchain API",
        description = "REST gateway to the mlchain token and model-registry chaincodes.",
        license(name = "Apache-2.0")
    ),
    paths(
        // Users
        crate::routes::users::register_user,
        crate::routes::users::authorize_user,
        // Tokens
        crate::routes::tokens::purchase,
        crate::routes::tokens::balance,
        crate::routes::tokens::total_supply,
        crate::routes::tokens::allowance,
        // Models
        crate::routes::models::get_models,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::users::RegisterUserRequest,
        crate::routes::users::RegisterUserResponse,
        crate::routes::users::AuthorizeUserRequest,
        crate::routes::users::MessageResponse,
        crate::routes::tokens::PurchaseRequest,
        crate::routes::tokens::BalanceResponse,
        crate::routes::tokens::TotalSupplyResponse,
        crate::routes::tokens::AllowanceResponse,
    )),
    tags(
        (name = "users", description = "Identity registration and role grants"),
        (name = "tokens", description = "Token sale and balances"),
        (name = "models", description = "Model registry reads"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
