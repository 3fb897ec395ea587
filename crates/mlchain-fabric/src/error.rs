//! Ledger client error types.

use mlchain_core::ConfigError;

use crate::signer::KeyError;

/// Errors from certificate-authority calls.
#[derive(Debug, thiserror::Error)]
pub enum CaError {
    /// The CA rejected the presented name/secret pair, or the secret was
    /// already consumed.
    #[error("CA authentication failed for {name}: {message}")]
    AuthFailure {
        /// Identity that attempted to authenticate.
        name: String,
        /// Message returned by the CA.
        message: String,
    },

    /// The registrar lacks the rights required for the operation.
    #[error("CA denied operation: {message}")]
    PermissionDenied {
        /// Message returned by the CA.
        message: String,
    },

    /// The identity is already registered.
    #[error("identity {name} is already registered")]
    AlreadyExists {
        /// Identity name.
        name: String,
    },

    /// The CA returned another non-2xx status.
    #[error("CA {endpoint} returned {status}: {message}")]
    Rejected {
        /// Operation label.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Message returned by the CA.
        message: String,
    },

    /// HTTP transport error.
    #[error("HTTP error calling CA {endpoint}: {source}")]
    Http {
        /// Operation label.
        endpoint: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },

    /// The CA response did not match the expected envelope.
    #[error("malformed CA response from {endpoint}: {message}")]
    Deserialization {
        /// Operation label.
        endpoint: String,
        /// What was wrong with it.
        message: String,
    },

    /// The registrar's signing key could not be loaded.
    #[error("registrar key: {0}")]
    Key(#[from] KeyError),

    /// CA endpoint configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from gateway sessions.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The peer did not accept the presented identity.
    #[error("gateway rejected identity {identity}: {message}")]
    AuthFailure {
        /// Identity the session was opened for.
        identity: String,
        /// Message returned by the peer.
        message: String,
    },

    /// The chaincode returned an error, or endorsement/commit failed.
    /// The message is the peer's, passed through verbatim.
    #[error("{function} rejected: {message}")]
    TransactionRejected {
        /// Chaincode function name.
        function: String,
        /// Message returned by the peer.
        message: String,
    },

    /// HTTP transport error.
    #[error("HTTP error calling gateway {endpoint}: {source}")]
    Http {
        /// Operation label.
        endpoint: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },

    /// No declared peer accepted a session.
    #[error("no reachable peer for {org}: {reason}")]
    Unreachable {
        /// Organization of the profile.
        org: String,
        /// Last failure observed.
        reason: String,
    },

    /// A gateway response did not match the expected shape.
    #[error("malformed gateway response from {endpoint}: {message}")]
    Deserialization {
        /// Operation label.
        endpoint: String,
        /// What was wrong with it.
        message: String,
    },

    /// The identity's signing key could not be loaded.
    #[error("identity key: {0}")]
    Key(#[from] KeyError),

    /// Connection profile error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
