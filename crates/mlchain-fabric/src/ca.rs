//! # Certificate-Authority Client
//!
//! Issues enrollment secrets (register) and exchanges them for credentials
//! (enroll). The CA is an opaque remote service; this module only defines
//! the capability surface. See [`crate::http_ca`] for the HTTP
//! implementation and [`crate::mock`] for the in-process one.

use async_trait::async_trait;
use mlchain_core::{CaEndpoint, Credential, EnrollmentSecret, IdentityName, MspId};
use zeroize::Zeroizing;

use crate::error::CaError;

/// Role given to application users at registration.
pub const CLIENT_ROLE: &str = "client";

/// Material returned by a successful enrollment.
pub struct Enrollment {
    /// PEM certificate issued by the CA.
    pub certificate: String,
    /// Hex-encoded private key generated locally for this enrollment.
    pub private_key: Zeroizing<String>,
}

impl Enrollment {
    /// Stamp the enrollment with the issuing organization's MSP tag.
    pub fn into_credential(self, msp_id: MspId) -> Credential {
        Credential::x509(self.certificate, self.private_key.as_str(), msp_id)
    }
}

impl std::fmt::Debug for Enrollment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enrollment")
            .field("certificate", &self.certificate)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Registration of a new identity at the CA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    /// Identity to register.
    pub name: IdentityName,
    /// Affiliation, e.g. `org1.department1`.
    pub affiliation: String,
    /// CA role, normally [`CLIENT_ROLE`].
    pub role: String,
}

impl RegistrationRequest {
    /// A `client`-role registration.
    pub fn client(name: IdentityName, affiliation: impl Into<String>) -> Self {
        Self {
            name,
            affiliation: affiliation.into(),
            role: CLIENT_ROLE.to_string(),
        }
    }
}

/// Operations offered by a certificate authority.
#[async_trait]
pub trait CertificateAuthority: Send + Sync {
    /// Exchange `secret` for a certificate. Fails with
    /// [`CaError::AuthFailure`] for a wrong, consumed or unknown secret.
    async fn enroll(
        &self,
        name: &IdentityName,
        secret: &EnrollmentSecret,
    ) -> Result<Enrollment, CaError>;

    /// Register a new identity, authenticated as `registrar`. Fails with
    /// [`CaError::PermissionDenied`] when the registrar lacks admin rights
    /// and [`CaError::AlreadyExists`] for a duplicate name.
    async fn register(
        &self,
        request: &RegistrationRequest,
        registrar: &Credential,
    ) -> Result<EnrollmentSecret, CaError>;
}

/// Builds CA clients from connection-profile entries.
pub trait CaConnector: Send + Sync {
    /// Create a client for `endpoint`.
    fn connect(&self, endpoint: &CaEndpoint) -> Result<Box<dyn CertificateAuthority>, CaError>;
}
