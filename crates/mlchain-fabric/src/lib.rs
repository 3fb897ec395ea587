#![deny(missing_docs)]

//! # mlchain-fabric: Ledger Network Clients
//!
//! Capability-typed access to the two remote services of the permissioned
//! ledger network:
//!
//! - **Certificate authority** ([`CertificateAuthority`]): register
//!   identities and exchange one-time secrets for credentials.
//! - **Gateway** ([`Gateway`] / [`Session`] / [`Contract`]): open a session
//!   as a stored identity and evaluate or submit chaincode functions.
//!
//! Both are traits. [`HttpCertificateAuthority`] and [`HttpGateway`] speak
//! the services' REST dialects. The `mock` feature (off by default) adds
//! [`mock`], in-process implementations for tests and offline runs.
//!
//! ## Retry policy
//!
//! Only gateway `evaluate` calls are retried on transport failure
//! (200ms, 400ms, 800ms). CA calls and `submit` are sent exactly once.

pub mod ca;
pub mod error;
pub mod gateway;
pub mod http_ca;
pub mod http_gateway;
#[cfg(feature = "mock")]
pub mod mock;
pub(crate) mod retry;
pub mod signer;

pub use ca::{CaConnector, CertificateAuthority, Enrollment, RegistrationRequest, CLIENT_ROLE};
pub use error::{CaError, GatewayError};
pub use gateway::{ChaincodeTarget, Contract, Gateway, Session, TransientData};
pub use http_ca::{HttpCaConnector, HttpCertificateAuthority};
pub use http_gateway::HttpGateway;
pub use signer::{IdentityKey, KeyError};
