#![deny(missing_docs)]

//! # mlchain-core: Foundational Types for mlchain
//!
//! Every other crate in the workspace depends on this one. It has no internal
//! crate dependencies and performs no network I/O.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** An [`IdentityName`] is not an
//!    [`OrgId`] is not an [`MspId`]. Names are validated at construction, so a
//!    wallet file stem can never escape its directory.
//!
//! 2. **Absent is not failed.** [`CredentialStore::get`] returns
//!    `Ok(None)` for an identity that was never enrolled. Errors are reserved
//!    for I/O and corrupt wallet data.
//!
//! 3. **Explicit configuration.** [`Settings`] carries channel and chaincode
//!    names, admin bootstrap credentials, per-organization CA hosts and the
//!    REST base URL. Nothing is read from process-global state after startup.
//!
//! 4. **Secrets stay secret.** Private keys and enrollment secrets are held in
//!    `zeroize::Zeroizing` buffers and redacted from `Debug` output.

pub mod credential;
pub mod error;
pub mod identity;
pub mod profile;
pub mod settings;
pub mod wallet;

pub use credential::{Credential, EnrollmentSecret, CREDENTIAL_TYPE_X509};
pub use error::{ConfigError, ValidationError, WalletError};
pub use identity::{IdentityName, MspId, OrgId};
pub use profile::{
    CaEndpoint, ConnectionProfile, DirectoryProfiles, PeerEndpoint, ProfileSource, StaticProfiles,
};
pub use settings::{DiscoverySettings, OrgSettings, PriceSettings, Settings};
pub use wallet::{
    CredentialStore, FileSystemWallet, FileSystemWallets, InMemoryWallet, InMemoryWallets,
    WalletProvider,
};
