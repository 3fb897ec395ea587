//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Workflow failures keep their stable code and map to a status by kind.
//! Messages of 500 errors are logged, never returned to clients. Upstream
//! failures (502) keep their message so callers can see which peer or CA
//! failed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mlchain_workflow::{ErrorKind, WorkflowError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_ENROLLED", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request body or query string could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// A workflow or ledger operation failed; status follows its kind.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

fn status_of(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotEnrolled => StatusCode::NOT_FOUND,
        ErrorKind::AuthFailure => StatusCode::UNAUTHORIZED,
        ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorKind::AlreadyExists | ErrorKind::TransactionRejected => StatusCode::CONFLICT,
        ErrorKind::Connection | ErrorKind::Decode => StatusCode::BAD_GATEWAY,
        ErrorKind::Config | ErrorKind::Wallet => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Workflow(e) => (status_of(e.kind()), e.code()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, code, "internal server error");
            "An internal error occurred".to_string()
        } else {
            if status.is_client_error() {
                tracing::debug!(error = %self, code, "request failed");
            } else {
                tracing::warn!(error = %self, code, "upstream failure");
            }
            self.to_string()
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<mlchain_core::ValidationError> for AppError {
    fn from(err: mlchain_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlchain_core::{ConfigError, IdentityName, OrgId};
    use mlchain_fabric::GatewayError;

    fn workflow(e: WorkflowError) -> (StatusCode, &'static str) {
        AppError::from(e).status_and_code()
    }

    #[test]
    fn not_enrolled_is_404() {
        let (status, code) = workflow(WorkflowError::NotEnrolled {
            org: OrgId::new("org2").unwrap(),
            name: IdentityName::new("admin").unwrap(),
        });
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_ENROLLED");
    }

    #[test]
    fn admin_not_enrolled_is_403() {
        let (status, code) = workflow(WorkflowError::AdminNotEnrolled {
            org: OrgId::new("org1").unwrap(),
        });
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(code, "PERMISSION_DENIED");
    }

    #[test]
    fn rejection_is_409_and_unreachable_is_502() {
        let (status, _) = workflow(
            GatewayError::TransactionRejected {
                function: "Transfer".into(),
                message: "insufficient funds".into(),
            }
            .into(),
        );
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, code) = workflow(
            GatewayError::Unreachable {
                org: "Org2".into(),
                reason: "refused".into(),
            }
            .into(),
        );
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "CONNECTION_ERROR");
    }

    async fn body_of(response: Response) -> ErrorBody {
        let bytes = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn upstream_failure_keeps_its_message() {
        let err = AppError::from(WorkflowError::from(GatewayError::Unreachable {
            org: "Org2".into(),
            reason: "connection refused".into(),
        }));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_of(response).await;
        assert_eq!(body.error.code, "CONNECTION_ERROR");
        assert!(body.error.message.contains("connection refused"));
    }

    #[tokio::test]
    async fn internal_failure_hides_its_message() {
        let err = AppError::from(WorkflowError::from(ConfigError::NoPeers("Org1".into())));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(response).await;
        assert_eq!(body.error.message, "An internal error occurred");
        assert!(!body.error.message.contains("Org1"));
    }

    #[test]
    fn config_error_is_500() {
        let (status, code) = workflow(ConfigError::NoPeers("Org1".into()).into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "CONFIG_ERROR");
    }

    #[test]
    fn bad_request_status_code() {
        let (status, code) = AppError::BadRequest("malformed JSON".into()).status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "BAD_REQUEST");
    }

    #[test]
    fn validation_status_code() {
        let (status, code) = AppError::Validation("bad amount".into()).status_and_code();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "VALIDATION_ERROR");
    }
}
