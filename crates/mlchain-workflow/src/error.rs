//! # Workflow Error Taxonomy
//!
//! Every failure a dispatcher can see is a [`WorkflowError`]. Each variant
//! classifies into an [`ErrorKind`] with a stable machine-readable code; the
//! HTTP layer maps kinds to status codes and the CLI prints the message.

use mlchain_core::{ConfigError, IdentityName, OrgId, ValidationError, WalletError};
use mlchain_fabric::{CaError, GatewayError};
use thiserror::Error;

use crate::enrollment::IdentityState;

/// Failure class of a [`WorkflowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad caller input.
    Validation,
    /// Missing or malformed configuration.
    Config,
    /// No wallet identity for the acting user.
    NotEnrolled,
    /// The CA or peer rejected the presented credentials.
    AuthFailure,
    /// The caller lacks rights, including "admin not enrolled yet".
    PermissionDenied,
    /// The identity is already registered.
    AlreadyExists,
    /// The chaincode rejected the call.
    TransactionRejected,
    /// A remote service could not be reached or failed.
    Connection,
    /// A remote response had an unexpected shape.
    Decode,
    /// The credential store failed.
    Wallet,
}

impl ErrorKind {
    /// Stable code, e.g. `NOT_ENROLLED`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Config => "CONFIG_ERROR",
            Self::NotEnrolled => "NOT_ENROLLED",
            Self::AuthFailure => "AUTH_FAILURE",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::TransactionRejected => "TRANSACTION_REJECTED",
            Self::Connection => "CONNECTION_ERROR",
            Self::Decode => "DECODE_ERROR",
            Self::Wallet => "WALLET_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors from workflow and contract operations.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Caller input failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration or connection profile error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Credential store error.
    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),

    /// The acting identity has no credential in its organization's wallet.
    #[error("an identity for {name} does not exist in the {org} wallet; enroll it first")]
    NotEnrolled {
        /// Organization wallet that was searched.
        org: OrgId,
        /// Identity that was looked up.
        name: IdentityName,
    },

    /// Registration was attempted before the organization's admin was enrolled.
    #[error("the admin of {org} is not enrolled; enroll admins before registering users")]
    AdminNotEnrolled {
        /// Organization whose admin is missing.
        org: OrgId,
    },

    /// Certificate-authority failure.
    #[error("certificate authority: {0}")]
    Ca(#[from] CaError),

    /// Gateway or chaincode failure.
    #[error("{0}")]
    Gateway(#[from] GatewayError),

    /// A chaincode returned a payload that does not decode.
    #[error("malformed {function} response: {message}")]
    Decode {
        /// Chaincode function that produced the payload.
        function: String,
        /// What was wrong with it.
        message: String,
    },

    /// Onboarding stopped part-way; the partial state stays in place.
    #[error(transparent)]
    Onboarding(#[from] Box<OnboardingError>),
}

impl WorkflowError {
    /// Failure class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Config(_) => ErrorKind::Config,
            Self::Wallet(_) => ErrorKind::Wallet,
            Self::NotEnrolled { .. } => ErrorKind::NotEnrolled,
            Self::AdminNotEnrolled { .. } => ErrorKind::PermissionDenied,
            Self::Ca(e) => match e {
                CaError::AuthFailure { .. } => ErrorKind::AuthFailure,
                CaError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
                CaError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
                CaError::Rejected { .. } | CaError::Http { .. } => ErrorKind::Connection,
                CaError::Deserialization { .. } => ErrorKind::Decode,
                CaError::Key(_) => ErrorKind::Wallet,
                CaError::Config(_) => ErrorKind::Config,
            },
            Self::Gateway(e) => match e {
                GatewayError::AuthFailure { .. } => ErrorKind::AuthFailure,
                GatewayError::TransactionRejected { .. } => ErrorKind::TransactionRejected,
                GatewayError::Http { .. } | GatewayError::Unreachable { .. } => {
                    ErrorKind::Connection
                }
                GatewayError::Deserialization { .. } => ErrorKind::Decode,
                GatewayError::Key(_) => ErrorKind::Wallet,
                GatewayError::Config(_) => ErrorKind::Config,
            },
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Onboarding(e) => e.source.kind(),
        }
    }

    /// Stable code of the failure class.
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}

/// Partial onboarding failure: which state was reached, and what stopped it.
#[derive(Error, Debug)]
#[error("onboarding of {name} stopped at {completed:?}: {source}")]
pub struct OnboardingError {
    /// Identity being onboarded.
    pub name: IdentityName,
    /// Last state successfully reached.
    pub completed: IdentityState,
    /// The failure.
    #[source]
    pub source: WorkflowError,
}

impl From<OnboardingError> for WorkflowError {
    fn from(e: OnboardingError) -> Self {
        Self::Onboarding(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org() -> OrgId {
        OrgId::new("org1").unwrap()
    }

    #[test]
    fn admin_not_enrolled_is_permission_denied() {
        let e = WorkflowError::AdminNotEnrolled { org: org() };
        assert_eq!(e.kind(), ErrorKind::PermissionDenied);
        assert_eq!(e.code(), "PERMISSION_DENIED");
    }

    #[test]
    fn ca_errors_classify() {
        let auth = WorkflowError::from(CaError::AuthFailure {
            name: "a".into(),
            message: "m".into(),
        });
        assert_eq!(auth.code(), "AUTH_FAILURE");
        let dup = WorkflowError::from(CaError::AlreadyExists { name: "a".into() });
        assert_eq!(dup.code(), "ALREADY_EXISTS");
    }

    #[test]
    fn gateway_rejection_message_is_verbatim() {
        let e = WorkflowError::from(GatewayError::TransactionRejected {
            function: "Transfer".into(),
            message: "insufficient funds".into(),
        });
        assert_eq!(e.code(), "TRANSACTION_REJECTED");
        assert!(e.to_string().contains("insufficient funds"));
    }

    #[test]
    fn onboarding_error_takes_kind_of_cause() {
        let e = WorkflowError::from(OnboardingError {
            name: IdentityName::new("alice").unwrap(),
            completed: IdentityState::Enrolled,
            source: WorkflowError::Gateway(GatewayError::Unreachable {
                org: "Org1".into(),
                reason: "refused".into(),
            }),
        });
        assert_eq!(e.kind(), ErrorKind::Connection);
        assert!(e.to_string().contains("Enrolled"));
    }
}
