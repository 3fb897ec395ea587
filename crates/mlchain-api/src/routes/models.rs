//! # Models API
//!
//! Read-only access to the model registry, acting as the admin of the
//! model-reader organization.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use mlchain_workflow::ModelRecord;
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::error::AppError;
use crate::state::AppState;

/// Select one model by name, the models of one developer, or all models.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ModelQuery {
    /// Model name.
    pub id: Option<String>,
    /// Client id of the developer.
    #[serde(rename = "userID")]
    pub user_id: Option<String>,
}

/// One model or a list, depending on the query.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ModelsResponse {
    One(ModelRecord),
    Many(Vec<ModelRecord>),
}

/// Build the models router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/models", get(get_models))
}

/// GET /api/models: `?id=` for one model, `?userID=` for a developer's models, none for all.
#[utoipa::path(
    get,
    path = "/api/models",
    params(ModelQuery),
    responses(
        (status = 200, description = "Model record, or list of records"),
        (status = 502, description = "Malformed registry response", body = crate::error::ErrorBody),
    ),
    tag = "models"
)]
pub(crate) async fn get_models(
    State(state): State<AppState>,
    query: Result<Query<ModelQuery>, QueryRejection>,
) -> Result<Json<ModelsResponse>, AppError> {
    let Query(q) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let reader = state.services.model_reader();
    let models = &state.services.models;

    let response = match (non_blank(q.id), non_blank(q.user_id)) {
        (Some(id), _) => ModelsResponse::One(models.get(&reader, &id).await?),
        (None, Some(developer)) => ModelsResponse::Many(models.by_developer(&reader, &developer).await?),
        (None, None) => ModelsResponse::Many(models.all(&reader).await?),
    };
    Ok(Json(response))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
