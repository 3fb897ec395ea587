//! HTTP client for the peer gateway's REST API.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST | `/api/v1/sessions` | Open session |
//! | POST | `/api/v1/channels/{ch}/chaincodes/{cc}/evaluate` | Query |
//! | POST | `/api/v1/channels/{ch}/chaincodes/{cc}/submit` | Transaction |
//! | DELETE | `/api/v1/sessions/{id}` | Close session |
//!
//! Every request carries `X-Msp-Id`, `X-Identity` (base64 certificate) and
//! `X-Signature` (Ed25519 over the request body, or over the session id for
//! bodiless requests).

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use mlchain_core::{ConnectionProfile, Credential, DiscoverySettings, IdentityName, PeerEndpoint};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::GatewayError;
use crate::gateway::{ChaincodeTarget, Gateway, Session, TransientData};
use crate::retry::Backoff;
use crate::signer::IdentityKey;

const HEADER_MSP_ID: &str = "x-msp-id";
const HEADER_IDENTITY: &str = "x-identity";
const HEADER_SIGNATURE: &str = "x-signature";
const HEADER_SESSION: &str = "x-session-id";

#[derive(Debug, Serialize)]
struct OpenSessionBody<'a> {
    identity: &'a str,
    msp_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenSessionResponse {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct InvokeBody<'a> {
    function: &'a str,
    args: &'a [String],
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    transient: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Clone, Copy)]
enum InvokeKind {
    Evaluate,
    Submit,
}

impl InvokeKind {
    fn path_segment(self) -> &'static str {
        match self {
            Self::Evaluate => "evaluate",
            Self::Submit => "submit",
        }
    }
}

/// Opens sessions over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    timeout: Duration,
    backoff: Backoff,
}

impl HttpGateway {
    /// Create a gateway with a fixed transport timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            backoff: Backoff::default(),
        }
    }

    /// Override how queries are re-sent when the peer is unreachable.
    pub fn with_query_retries(mut self, retries: u32, first_delay: Duration) -> Self {
        self.backoff = Backoff {
            retries,
            first_delay,
        };
        self
    }

    fn client_for(&self, peer: &PeerEndpoint) -> Result<reqwest::Client, GatewayError> {
        let mut builder = reqwest::Client::builder().timeout(self.timeout);
        for pem in &peer.tls_ca_pems {
            let cert = reqwest::Certificate::from_pem(pem.as_bytes()).map_err(|e| {
                GatewayError::Http {
                    endpoint: format!("tls roots for {}", peer.name),
                    source: e,
                }
            })?;
            builder = builder.add_root_certificate(cert);
        }
        builder.build().map_err(|e| GatewayError::Http {
            endpoint: "client_init".into(),
            source: e,
        })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn connect(
        &self,
        profile: &ConnectionProfile,
        identity: &IdentityName,
        credential: &Credential,
        discovery: DiscoverySettings,
    ) -> Result<Box<dyn Session>, GatewayError> {
        let mut peers = profile.client_peers(discovery.as_localhost)?;
        if !discovery.enabled {
            peers.truncate(1);
        }

        let mut last_failure = String::new();
        for peer in peers {
            let http = self.client_for(&peer)?;
            let mut session = HttpSession {
                http,
                base_url: peer.url.clone(),
                session_id: String::new(),
                identity: identity.clone(),
                msp_id: credential.msp_id().to_string(),
                certificate_b64: B64.encode(credential.certificate().as_bytes()),
                key: IdentityKey::from_credential(credential)?,
                backoff: self.backoff,
            };
            match session.open().await {
                Ok(id) => {
                    session.session_id = id;
                    tracing::debug!(identity = %identity, peer = %peer.name, "gateway session opened");
                    return Ok(Box::new(session));
                }
                Err(e @ GatewayError::AuthFailure { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(peer = %peer.name, "peer unavailable: {e}");
                    last_failure = e.to_string();
                }
            }
        }
        Err(GatewayError::Unreachable {
            org: profile.client_organization().to_string(),
            reason: last_failure,
        })
    }
}

/// A session on one peer.
struct HttpSession {
    http: reqwest::Client,
    base_url: Url,
    session_id: String,
    identity: IdentityName,
    msp_id: String,
    certificate_b64: String,
    key: IdentityKey,
    backoff: Backoff,
}

impl HttpSession {
    fn url(&self, path: &str) -> Result<Url, GatewayError> {
        self.base_url.join(path).map_err(|e| {
            GatewayError::Config(mlchain_core::ConfigError::InvalidUrl(
                self.base_url.to_string(),
                e.to_string(),
            ))
        })
    }

    fn signed(&self, req: reqwest::RequestBuilder, signed_bytes: &[u8]) -> reqwest::RequestBuilder {
        req.header(HEADER_MSP_ID, &self.msp_id)
            .header(HEADER_IDENTITY, &self.certificate_b64)
            .header(HEADER_SIGNATURE, self.key.sign_b64(signed_bytes))
    }

    async fn open(&self) -> Result<String, GatewayError> {
        let endpoint = "POST /sessions";
        let body = serde_json::to_vec(&OpenSessionBody {
            identity: self.identity.as_str(),
            msp_id: &self.msp_id,
        })
        .map_err(|e| GatewayError::Deserialization {
            endpoint: endpoint.into(),
            message: e.to_string(),
        })?;
        let req = self
            .http
            .post(self.url("api/v1/sessions")?)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        let resp = self
            .signed(req, &body)
            .body(body)
            .send()
            .await
            .map_err(|e| GatewayError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(GatewayError::AuthFailure {
                identity: self.identity.to_string(),
                message: error_message(resp).await,
            });
        }
        if !status.is_success() {
            return Err(GatewayError::Unreachable {
                org: self.msp_id.clone(),
                reason: format!("{status}: {}", error_message(resp).await),
            });
        }
        let opened: OpenSessionResponse =
            resp.json().await.map_err(|e| GatewayError::Deserialization {
                endpoint: endpoint.into(),
                message: e.to_string(),
            })?;
        Ok(opened.session_id)
    }

    async fn invoke(
        &self,
        kind: InvokeKind,
        target: &ChaincodeTarget,
        function: &str,
        args: &[String],
        transient: Option<&TransientData>,
    ) -> Result<Vec<u8>, GatewayError> {
        let endpoint = format!("{} {}.{function}", kind.path_segment(), target.chaincode);
        let url = self.url(&format!(
            "api/v1/channels/{}/chaincodes/{}/{}",
            target.channel,
            target.chaincode,
            kind.path_segment()
        ))?;
        let body = serde_json::to_vec(&InvokeBody {
            function,
            args,
            transient: transient.map(TransientData::encoded).unwrap_or_default(),
        })
        .map_err(|e| GatewayError::Deserialization {
            endpoint: endpoint.clone(),
            message: e.to_string(),
        })?;

        let send = || {
            let req = self
                .http
                .post(url.clone())
                .header(HEADER_SESSION, &self.session_id)
                .header(reqwest::header::CONTENT_TYPE, "application/json");
            self.signed(req, &body).body(body.clone()).send()
        };
        let resp = match kind {
            InvokeKind::Evaluate => self.backoff.run(function, send).await,
            InvokeKind::Submit => send().await,
        }
        .map_err(|e| GatewayError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(GatewayError::AuthFailure {
                identity: self.identity.to_string(),
                message: error_message(resp).await,
            });
        }
        if !status.is_success() {
            return Err(GatewayError::TransactionRejected {
                function: function.to_string(),
                message: error_message(resp).await,
            });
        }
        let bytes = resp.bytes().await.map_err(|e| GatewayError::Http {
            endpoint,
            source: e,
        })?;
        Ok(bytes.to_vec())
    }
}

async fn error_message(resp: reqwest::Response) -> String {
    let text = resp.text().await.unwrap_or_default();
    serde_json::from_str::<GatewayErrorBody>(&text)
        .ok()
        .map(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or(text)
}

#[async_trait]
impl Session for HttpSession {
    fn identity(&self) -> &IdentityName {
        &self.identity
    }

    async fn evaluate(
        &self,
        target: &ChaincodeTarget,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>, GatewayError> {
        self.invoke(InvokeKind::Evaluate, target, function, args, None)
            .await
    }

    async fn submit(
        &self,
        target: &ChaincodeTarget,
        function: &str,
        args: &[String],
        transient: Option<&TransientData>,
    ) -> Result<Vec<u8>, GatewayError> {
        self.invoke(InvokeKind::Submit, target, function, args, transient)
            .await
    }

    async fn disconnect(self: Box<Self>) -> Result<(), GatewayError> {
        let endpoint = "DELETE /sessions";
        let url = self.url(&format!("api/v1/sessions/{}", self.session_id))?;
        let req = self.http.delete(url);
        let resp = self
            .signed(req, self.session_id.as_bytes())
            .send()
            .await
            .map_err(|e| GatewayError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        if !resp.status().is_success() && resp.status() != reqwest::StatusCode::NOT_FOUND {
            tracing::warn!(
                identity = %self.identity,
                status = resp.status().as_u16(),
                "gateway did not acknowledge disconnect"
            );
        }
        tracing::debug!(identity = %self.identity, "gateway session closed");
        Ok(())
    }
}
