//! # mlchain-workflow: Identity Enrollment and Ledger Operations
//!
//! Sits between the dispatchers (CLI, REST API) and the remote services.
//!
//! - [`enrollment`]: admin bootstrap, user registration, enrollment, and
//!   on-chain registration, with partial-failure reporting.
//! - [`connector`]: per-request gateway sessions for stored identities,
//!   always disconnected before returning.
//! - [`token`], [`model`]: typed chaincode calls.
//! - [`decode`]: payload decoders.
//! - [`error`]: [`WorkflowError`] and its stable codes.

#![deny(missing_docs)]

pub mod connector;
pub mod decode;
pub mod enrollment;
pub mod error;
pub mod model;
pub mod services;
pub mod token;

pub use connector::{Actor, Connector};
pub use enrollment::{AdminEnrollment, BootstrapReport, EnrollmentWorkflow, IdentityState, Onboarding};
pub use error::{ErrorKind, OnboardingError, WorkflowError};
pub use model::{ModelContract, ModelDefinition, ModelRecord, ShapeSpec, TensorDefinition, TensorInfo};
pub use services::Services;
pub use token::{parse_amount, PurchaseReceipt, TokenContract, ADMIN_ROLE};
