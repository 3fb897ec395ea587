//! HTTP client for the certificate authority's REST API.
//!
//! | Method | Path | Auth | Operation |
//! |--------|------|------|-----------|
//! | POST | `/api/v1/enroll` | Basic `name:secret` | Enroll |
//! | POST | `/api/v1/register` | Signed token | Register |
//!
//! Every response is wrapped in `{"success", "result", "errors"}`. Calls are
//! never retried: a repeated enroll would hit an already-consumed secret.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use mlchain_core::{CaEndpoint, Credential, EnrollmentSecret, IdentityName};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ca::{CaConnector, CertificateAuthority, Enrollment, RegistrationRequest};
use crate::error::CaError;
use crate::signer::IdentityKey;

const ENROLL_PATH: &str = "api/v1/enroll";
const REGISTER_PATH: &str = "api/v1/register";

#[derive(Debug, Serialize)]
struct EnrollBody<'a> {
    caname: &'a str,
    public_key: String,
}

#[derive(Debug, Deserialize)]
struct EnrollResult {
    /// Base64 of the PEM certificate.
    #[serde(rename = "Cert")]
    cert: String,
}

#[derive(Debug, Serialize)]
struct RegisterBody<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    affiliation: &'a str,
    caname: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegisterResult {
    secret: String,
}

#[derive(Debug, Deserialize)]
struct CaMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct CaEnvelope<T> {
    #[serde(default)]
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<CaMessage>,
}

impl<T> CaEnvelope<T> {
    fn error_text(&self) -> String {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("code {}: {}", e.code, e.message))
            .collect();
        parts.join("; ")
    }
}

/// Client for one certificate authority.
#[derive(Debug, Clone)]
pub struct HttpCertificateAuthority {
    http: reqwest::Client,
    base_url: Url,
    ca_name: String,
}

impl HttpCertificateAuthority {
    /// Build a client from a profile CA entry. TLS roots come from the
    /// profile; `verify: false` disables certificate verification.
    pub fn new(endpoint: &CaEndpoint, timeout: Duration) -> Result<Self, CaError> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if endpoint.verify_tls {
            for pem in &endpoint.tls_ca_pems {
                let cert = reqwest::Certificate::from_pem(pem.as_bytes()).map_err(|e| {
                    CaError::Http {
                        endpoint: format!("tls roots for {}", endpoint.host),
                        source: e,
                    }
                })?;
                builder = builder.add_root_certificate(cert);
            }
        } else {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().map_err(|e| CaError::Http {
            endpoint: "client_init".into(),
            source: e,
        })?;
        Ok(Self {
            http,
            base_url: endpoint.url.clone(),
            ca_name: endpoint.ca_name.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, CaError> {
        self.base_url.join(path).map_err(|e| {
            CaError::Config(mlchain_core::ConfigError::InvalidUrl(
                self.ca_name.clone(),
                e.to_string(),
            ))
        })
    }
}

/// Decode the envelope and map failure statuses onto the error taxonomy.
async fn read_envelope<T: DeserializeOwned>(
    endpoint: &str,
    name: &str,
    resp: reqwest::Response,
) -> Result<T, CaError> {
    let status = resp.status();
    let text = resp.text().await.map_err(|e| CaError::Http {
        endpoint: endpoint.into(),
        source: e,
    })?;
    let envelope: Option<CaEnvelope<T>> = serde_json::from_str(&text).ok();
    let message = envelope
        .as_ref()
        .map(CaEnvelope::error_text)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| text.clone());

    if !status.is_success() {
        return Err(classify(endpoint, name, status.as_u16(), message));
    }

    let envelope = envelope.ok_or_else(|| CaError::Deserialization {
        endpoint: endpoint.into(),
        message: "response is not a CA envelope".into(),
    })?;
    if !envelope.success {
        return Err(classify(endpoint, name, status.as_u16(), message));
    }
    envelope.result.ok_or_else(|| CaError::Deserialization {
        endpoint: endpoint.into(),
        message: "envelope has no result".into(),
    })
}

fn classify(endpoint: &str, name: &str, status: u16, message: String) -> CaError {
    if message.contains("already registered") || status == 409 {
        return CaError::AlreadyExists { name: name.into() };
    }
    match status {
        401 => CaError::AuthFailure {
            name: name.into(),
            message,
        },
        403 => CaError::PermissionDenied { message },
        _ => CaError::Rejected {
            endpoint: endpoint.into(),
            status,
            message,
        },
    }
}

#[async_trait]
impl CertificateAuthority for HttpCertificateAuthority {
    async fn enroll(
        &self,
        name: &IdentityName,
        secret: &EnrollmentSecret,
    ) -> Result<Enrollment, CaError> {
        let endpoint = "POST /enroll";
        let key = IdentityKey::generate();
        let body = EnrollBody {
            caname: &self.ca_name,
            public_key: key.public_key_b64(),
        };

        let resp = self
            .http
            .post(self.url(ENROLL_PATH)?)
            .basic_auth(name.as_str(), Some(secret.expose()))
            .json(&body)
            .send()
            .await
            .map_err(|e| CaError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let result: EnrollResult = read_envelope(endpoint, name.as_str(), resp).await?;
        let pem = B64
            .decode(result.cert.as_bytes())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| CaError::Deserialization {
                endpoint: endpoint.into(),
                message: "certificate is not base64 PEM".into(),
            })?;

        tracing::info!(identity = %name, ca = %self.ca_name, "enrolled identity");
        Ok(Enrollment {
            certificate: pem,
            private_key: key.private_key_hex(),
        })
    }

    async fn register(
        &self,
        request: &RegistrationRequest,
        registrar: &Credential,
    ) -> Result<EnrollmentSecret, CaError> {
        let endpoint = "POST /register";
        let key = IdentityKey::from_credential(registrar)?;
        let body = serde_json::to_vec(&RegisterBody {
            id: request.name.as_str(),
            kind: &request.role,
            affiliation: &request.affiliation,
            caname: &self.ca_name,
        })
        .map_err(|e| CaError::Deserialization {
            endpoint: endpoint.into(),
            message: e.to_string(),
        })?;
        let token = key.authorization_token(registrar.certificate(), &body);

        let resp = self
            .http
            .post(self.url(REGISTER_PATH)?)
            .header(reqwest::header::AUTHORIZATION, token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| CaError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let result: RegisterResult = read_envelope(endpoint, request.name.as_str(), resp).await?;
        tracing::info!(identity = %request.name, affiliation = %request.affiliation, "registered identity");
        Ok(EnrollmentSecret::new(result.secret))
    }
}

/// Builds [`HttpCertificateAuthority`] clients with a fixed transport timeout.
#[derive(Debug, Clone)]
pub struct HttpCaConnector {
    timeout: Duration,
}

impl HttpCaConnector {
    /// Create a connector.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CaConnector for HttpCaConnector {
    fn connect(&self, endpoint: &CaEndpoint) -> Result<Box<dyn CertificateAuthority>, CaError> {
        Ok(Box::new(HttpCertificateAuthority::new(endpoint, self.timeout)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_maps_statuses() {
        assert!(matches!(
            classify("e", "bob", 401, "bad secret".into()),
            CaError::AuthFailure { .. }
        ));
        assert!(matches!(
            classify("e", "bob", 403, "not a registrar".into()),
            CaError::PermissionDenied { .. }
        ));
        assert!(matches!(
            classify("e", "bob", 409, String::new()),
            CaError::AlreadyExists { .. }
        ));
        assert!(matches!(
            classify("e", "bob", 500, "Identity 'bob' is already registered".into()),
            CaError::AlreadyExists { .. }
        ));
        assert!(matches!(
            classify("e", "bob", 500, "boom".into()),
            CaError::Rejected { status: 500, .. }
        ));
    }
}
