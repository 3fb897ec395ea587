//! Typed client for the mlchain REST gateway.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `users/register` | Register a user at the registrar CA |
//! | POST   | `users/authorize` | Grant a token-chaincode role |
//! | POST   | `tokens` | Buy tokens |
//! | GET    | `tokens/balance?id=` | Balance of a client |
//! | GET    | `tokens/totalSupply` | Total supply |
//! | GET    | `tokens/allowance?owner=&spender=` | Remaining allowance |
//! | GET    | `models` | Model registry reads |
//!
//! Paths are relative to `api_base_url`, which must end in `/`.

use std::time::Duration;

use mlchain_core::Settings;
use mlchain_workflow::ModelRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors from the REST gateway.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("{endpoint}: request failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The gateway answered with its error envelope.
    #[error("{endpoint}: {code} ({status}): {message}")]
    Api {
        endpoint: String,
        status: u16,
        code: String,
        message: String,
    },

    /// Non-success status without a readable error envelope.
    #[error("{endpoint}: unexpected status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// A success body did not have the expected shape.
    #[error("{endpoint}: malformed response: {source}")]
    Deserialization {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// A path could not be joined onto the base URL.
    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// One-time secret returned by `users/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct Registered {
    pub secret: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Balance {
    balance: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalSupply {
    total_supply: u64,
}

#[derive(Debug, Deserialize)]
struct Allowance {
    allowance: u64,
}

#[derive(Debug, Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct AuthorizeBody<'a> {
    id: &'a str,
    role: &'a str,
}

#[derive(Debug, Serialize)]
struct PurchaseBody<'a> {
    id: &'a str,
    amount: String,
}

/// Client for the REST gateway.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client with the given base URL and request timeout.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self { http, base_url })
    }

    /// Build a client from runtime settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        Self::new(settings.api_base_url.clone(), settings.timeout())
    }

    /// Register `name` at the registrar organization's CA.
    ///
    /// Calls `POST {base_url}users/register`.
    pub async fn register(&self, name: &str) -> Result<Registered, ApiError> {
        let endpoint = "POST users/register";
        let url = self.base_url.join("users/register")?;
        let resp = self
            .http
            .post(url)
            .json(&RegisterBody { name })
            .send()
            .await
            .map_err(|e| ApiError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        read(endpoint, resp).await
    }

    /// Grant `role` on the token chaincode to `id`.
    ///
    /// Calls `POST {base_url}users/authorize`.
    pub async fn authorize(&self, id: &str, role: &str) -> Result<String, ApiError> {
        let endpoint = "POST users/authorize";
        let url = self.base_url.join("users/authorize")?;
        let resp = self
            .http
            .post(url)
            .json(&AuthorizeBody { id, role })
            .send()
            .await
            .map_err(|e| ApiError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        read::<Message>(endpoint, resp).await.map(|m| m.message)
    }

    /// Buy `amount` tokens for `id`.
    ///
    /// Calls `POST {base_url}tokens`.
    pub async fn purchase(&self, id: &str, amount: u64) -> Result<String, ApiError> {
        let endpoint = "POST tokens";
        let url = self.base_url.join("tokens")?;
        let body = PurchaseBody {
            id,
            amount: amount.to_string(),
        };
        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        read::<Message>(endpoint, resp).await.map(|m| m.message)
    }

    /// Calls `GET {base_url}tokens/balance?id=`.
    pub async fn balance(&self, id: &str) -> Result<u64, ApiError> {
        let b: Balance = self.get("GET tokens/balance", "tokens/balance", &[("id", id)]).await?;
        Ok(b.balance)
    }

    /// Calls `GET {base_url}tokens/totalSupply`.
    pub async fn total_supply(&self) -> Result<u64, ApiError> {
        let t: TotalSupply = self.get("GET tokens/totalSupply", "tokens/totalSupply", &[]).await?;
        Ok(t.total_supply)
    }

    /// Calls `GET {base_url}tokens/allowance?owner=&spender=`.
    pub async fn allowance(&self, owner: &str, spender: &str) -> Result<u64, ApiError> {
        let a: Allowance = self
            .get(
                "GET tokens/allowance",
                "tokens/allowance",
                &[("owner", owner), ("spender", spender)],
            )
            .await?;
        Ok(a.allowance)
    }

    /// Calls `GET {base_url}models?id=`.
    pub async fn model(&self, name: &str) -> Result<ModelRecord, ApiError> {
        self.get("GET models", "models", &[("id", name)]).await
    }

    /// All models, or those of one developer.
    ///
    /// Calls `GET {base_url}models`, with `userID` when `developer` is set.
    pub async fn models(&self, developer: Option<&str>) -> Result<Vec<ModelRecord>, ApiError> {
        match developer {
            Some(dev) => self.get("GET models", "models", &[("userID", dev)]).await,
            None => self.get("GET models", "models", &[]).await,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.base_url.join(path)?;
        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        read(endpoint, resp).await
    }
}

async fn read<T: DeserializeOwned>(endpoint: &str, resp: reqwest::Response) -> Result<T, ApiError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => ApiError::Api {
                endpoint: endpoint.into(),
                status,
                code: envelope.error.code,
                message: envelope.error.message,
            },
            Err(_) => ApiError::Status {
                endpoint: endpoint.into(),
                status,
                body,
            },
        });
    }
    resp.json().await.map_err(|e| ApiError::Deserialization {
        endpoint: endpoint.into(),
        source: e,
    })
}
