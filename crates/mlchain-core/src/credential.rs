//! # Credentials and Enrollment Secrets
//!
//! A [`Credential`] is the enrollment material for one identity: the
//! certificate issued by the CA, the private key generated at enrollment,
//! and the MSP tag of the issuing organization. It serializes to the wallet
//! identity document:
//!
//! ```json
//! {
//!   "credentials": { "certificate": "-----BEGIN CERTIFICATE-----...", "privateKey": "..." },
//!   "mspId": "Org1MSP",
//!   "type": "X.509",
//!   "version": 1
//! }
//! ```
//!
//! Credentials are immutable once issued. Key material is wiped on drop.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::identity::MspId;

/// Type tag stored alongside every credential.
pub const CREDENTIAL_TYPE_X509: &str = "X.509";

const WALLET_FORMAT_VERSION: u32 = 1;

/// Certificate and private key pair. Wiped from memory on drop.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
struct CredentialMaterial {
    certificate: String,
    private_key: String,
}

/// Enrollment material for a single identity.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    credentials: CredentialMaterial,
    #[serde(rename = "mspId")]
    msp_id: MspId,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default = "default_version")]
    version: u32,
}

fn default_version() -> u32 {
    WALLET_FORMAT_VERSION
}

impl Credential {
    /// Build an X.509 credential from freshly issued enrollment material.
    pub fn x509(certificate: impl Into<String>, private_key: impl Into<String>, msp_id: MspId) -> Self {
        Self {
            credentials: CredentialMaterial {
                certificate: certificate.into(),
                private_key: private_key.into(),
            },
            msp_id,
            kind: CREDENTIAL_TYPE_X509.to_string(),
            version: WALLET_FORMAT_VERSION,
        }
    }

    /// PEM certificate issued by the CA.
    pub fn certificate(&self) -> &str {
        &self.credentials.certificate
    }

    /// Encoded private key. Handle with care; never log it.
    pub fn private_key(&self) -> &str {
        &self.credentials.private_key
    }

    /// MSP tag of the issuing organization.
    pub fn msp_id(&self) -> &MspId {
        &self.msp_id
    }

    /// Credential type tag (always `X.509` for CA-issued identities).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Wallet document format version.
    pub fn version(&self) -> u32 {
        self.version
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("certificate", &self.credentials.certificate)
            .field("private_key", &"[REDACTED]")
            .field("msp_id", &self.msp_id)
            .field("kind", &self.kind)
            .field("version", &self.version)
            .finish()
    }
}

/// One-time secret issued by the CA at registration and consumed at enrollment.
///
/// Single use is enforced by the CA, not by this type.
#[derive(Clone, PartialEq, Eq)]
pub struct EnrollmentSecret(Zeroizing<String>);

impl EnrollmentSecret {
    /// Wrap a secret string.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Reveal the secret for transmission to the CA or to the registering caller.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for EnrollmentSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EnrollmentSecret([REDACTED])")
    }
}
