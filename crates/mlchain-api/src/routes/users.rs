//! # Users API
//!
//! CA registration of new users by the registrar organization's admin, and
//! role grants on the token chaincode by the token admin.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use mlchain_core::IdentityName;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, require, Validate};
use crate::state::AppState;

/// Register a user at the CA.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterUserRequest {
    /// Identity name to register.
    pub name: String,
}

impl Validate for RegisterUserRequest {
    fn validate(&self) -> Result<(), String> {
        IdentityName::new(self.name.as_str())
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// One-time enrollment secret for a newly registered user.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterUserResponse {
    pub secret: String,
    pub message: String,
}

/// Grant a role on the token chaincode.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthorizeUserRequest {
    /// Ledger client id of the user.
    pub id: String,
    /// Role to grant, e.g. "dev" or "user".
    pub role: String,
}

impl Validate for AuthorizeUserRequest {
    fn validate(&self) -> Result<(), String> {
        require("id", &self.id)?;
        require("role", &self.role)
    }
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/register", post(register_user))
        .route("/api/users/authorize", post(authorize_user))
}

/// POST /api/users/register: Register a user at the registrar organization's CA.
#[utoipa::path(
    post,
    path = "/api/users/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "User registered", body = RegisterUserResponse),
        (status = 403, description = "Registrar admin not enrolled", body = crate::error::ErrorBody),
        (status = 409, description = "Already registered", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn register_user(
    State(state): State<AppState>,
    body: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<Json<RegisterUserResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let name = IdentityName::new(req.name)?;
    let org = state.services.settings().registrar_org.clone();
    let secret = state.services.enrollment.register_user(&org, &name).await?;
    tracing::info!(identity = %name, org = %org, "user registered");
    Ok(Json(RegisterUserResponse {
        secret: secret.expose().to_string(),
        message: "user registered".to_string(),
    }))
}

/// POST /api/users/authorize: Grant a role as the token admin.
#[utoipa::path(
    post,
    path = "/api/users/authorize",
    request_body = AuthorizeUserRequest,
    responses(
        (status = 200, description = "Role granted", body = MessageResponse),
        (status = 409, description = "Rejected by the chaincode", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn authorize_user(
    State(state): State<AppState>,
    body: Result<Json<AuthorizeUserRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let admin = state.services.token_admin();
    state
        .services
        .tokens
        .authorize(&admin, &req.id, &req.role)
        .await?;
    Ok(Json(MessageResponse {
        message: "user authorized".to_string(),
    }))
}
