//! # Error Hierarchy
//!
//! Structured error types for the foundational layer, built with `thiserror`.
//! Each variant carries the offending input so operators can diagnose a bad
//! wallet directory or connection profile without guesswork.

use std::path::PathBuf;

use thiserror::Error;

/// Validation errors for identifier newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identity name is empty, too long, or contains forbidden characters.
    #[error("invalid identity name: \"{0}\" (expected 1-64 characters, no path separators or control characters)")]
    InvalidIdentityName(String),

    /// Organization key is not lowercase alphanumeric.
    #[error("invalid organization: \"{0}\" (expected lowercase alphanumeric, e.g. org1)")]
    InvalidOrg(String),

    /// MSP identifier is empty or contains whitespace.
    #[error("invalid MSP id: \"{0}\"")]
    InvalidMspId(String),

    /// A numeric argument could not be parsed.
    #[error("invalid amount: \"{0}\" (expected a non-negative integer)")]
    InvalidAmount(String),

    /// A required field is empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// A structured field fails its format check.
    #[error("invalid {0}: {1}")]
    InvalidField(&'static str, String),
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The connection profile for an organization does not exist on disk.
    #[error("no such connection profile: {}", .0.display())]
    MissingProfile(PathBuf),

    /// A configuration file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A connection profile is not valid JSON or does not match the schema.
    #[error("malformed connection profile {}: {source}", .path.display())]
    MalformedProfile {
        /// Path of the file.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// A settings file is not valid YAML or does not match the schema.
    #[error("malformed settings file {}: {source}", .path.display())]
    MalformedSettings {
        /// Path of the file.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_yaml::Error,
    },

    /// The profile does not declare the requested certificate authority.
    #[error("certificate authority {0} not declared in connection profile")]
    UnknownCertificateAuthority(String),

    /// The profile declares no peers for the client organization.
    #[error("connection profile for {0} declares no reachable peers")]
    NoPeers(String),

    /// The organization is not listed in the settings.
    #[error("organization {0} is not configured")]
    UnknownOrganization(String),

    /// An endpoint URL in the profile or environment is invalid.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),

    /// A configuration value fails validation.
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// Credential store errors. Absence of an identity is NOT an error.
#[derive(Error, Debug)]
pub enum WalletError {
    /// Filesystem failure while reading or writing an identity file.
    #[error("wallet I/O error at {}: {source}", .path.display())]
    Io {
        /// Path of the identity file or wallet directory.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An identity file exists but does not decode to a credential.
    #[error("corrupt wallet entry {}: {source}", .path.display())]
    Corrupt {
        /// Path of the identity file.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}
