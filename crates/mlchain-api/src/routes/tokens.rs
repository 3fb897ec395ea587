//! # Tokens API
//!
//! Token sale and read-only token queries. Every call acts as the token
//! admin of the configured token-admin organization.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use mlchain_workflow::parse_amount;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, extract_validated_query, require, Validate};
use crate::routes::users::MessageResponse;
use crate::state::AppState;

/// A token amount given either as a JSON number or as decimal text.
///
/// Any other JSON shape still deserializes so that it fails validation
/// with a 422 rather than as a malformed body.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    Number(serde_json::Number),
    Text(String),
    Other(serde_json::Value),
}

impl AmountField {
    fn value(&self) -> Result<u64, AppError> {
        match self {
            Self::Number(n) => match n.as_u64() {
                Some(0) => Err(AppError::Validation("amount must be positive".into())),
                Some(v) => Ok(v),
                None => Err(AppError::Validation(format!(
                    "amount must be a positive whole number, got {n}"
                ))),
            },
            Self::Text(raw) => Ok(parse_amount(raw)?),
            Self::Other(v) => Err(AppError::Validation(format!(
                "amount must be a number or decimal text, got {v}"
            ))),
        }
    }
}

/// Buy tokens for a client id.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PurchaseRequest {
    /// Ledger client id of the buyer.
    pub id: String,
    /// Number of tokens, as a number or decimal text.
    #[schema(value_type = String, example = "100")]
    pub amount: AmountField,
}

impl Validate for PurchaseRequest {
    fn validate(&self) -> Result<(), String> {
        require("id", &self.id)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BalanceQuery {
    /// Ledger client id.
    pub id: String,
}

impl Validate for BalanceQuery {
    fn validate(&self) -> Result<(), String> {
        require("id", &self.id)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AllowanceQuery {
    /// Client id of the token owner.
    pub owner: String,
    /// Client id of the spender.
    pub spender: String,
}

impl Validate for AllowanceQuery {
    fn validate(&self) -> Result<(), String> {
        require("owner", &self.owner)?;
        require("spender", &self.spender)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    pub balance: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TotalSupplyResponse {
    pub total_supply: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AllowanceResponse {
    pub allowance: u64,
}

/// Build the tokens router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tokens", post(purchase))
        .route("/api/tokens/balance", get(balance))
        .route("/api/tokens/totalSupply", get(total_supply))
        .route("/api/tokens/allowance", get(allowance))
}

/// POST /api/tokens: Sell tokens to a client, minting any shortfall first.
#[utoipa::path(
    post,
    path = "/api/tokens",
    request_body = PurchaseRequest,
    responses(
        (status = 200, description = "Tokens transferred", body = MessageResponse),
        (status = 422, description = "Invalid amount", body = crate::error::ErrorBody),
        (status = 409, description = "Rejected by the chaincode", body = crate::error::ErrorBody),
    ),
    tag = "tokens"
)]
pub(crate) async fn purchase(
    State(state): State<AppState>,
    body: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let amount = req.amount.value()?;
    let seller = state.services.token_admin();
    let receipt = state.services.tokens.purchase(&seller, &req.id, amount).await?;
    tracing::info!(
        recipient = %receipt.recipient,
        minted = receipt.minted,
        transferred = receipt.transferred,
        "tokens sold"
    );
    Ok(Json(MessageResponse {
        message: format!("{} tokens transferred to {}", receipt.transferred, receipt.recipient),
    }))
}

/// GET /api/tokens/balance: Balance of a client id.
#[utoipa::path(
    get,
    path = "/api/tokens/balance",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Current balance", body = BalanceResponse),
    ),
    tag = "tokens"
)]
pub(crate) async fn balance(
    State(state): State<AppState>,
    query: Result<Query<BalanceQuery>, QueryRejection>,
) -> Result<Json<BalanceResponse>, AppError> {
    let q = extract_validated_query(query)?;
    let admin = state.services.token_admin();
    let balance = state.services.tokens.balance(&admin, &q.id).await?;
    Ok(Json(BalanceResponse { balance }))
}

/// GET /api/tokens/totalSupply: Total token supply.
#[utoipa::path(
    get,
    path = "/api/tokens/totalSupply",
    responses(
        (status = 200, description = "Total supply", body = TotalSupplyResponse),
    ),
    tag = "tokens"
)]
pub(crate) async fn total_supply(
    State(state): State<AppState>,
) -> Result<Json<TotalSupplyResponse>, AppError> {
    let admin = state.services.token_admin();
    let total_supply = state.services.tokens.total_supply(&admin).await?;
    Ok(Json(TotalSupplyResponse { total_supply }))
}

/// GET /api/tokens/allowance: Remaining allowance of a spender.
#[utoipa::path(
    get,
    path = "/api/tokens/allowance",
    params(AllowanceQuery),
    responses(
        (status = 200, description = "Remaining allowance", body = AllowanceResponse),
    ),
    tag = "tokens"
)]
pub(crate) async fn allowance(
    State(state): State<AppState>,
    query: Result<Query<AllowanceQuery>, QueryRejection>,
) -> Result<Json<AllowanceResponse>, AppError> {
    let q = extract_validated_query(query)?;
    let admin = state.services.token_admin();
    let allowance = state
        .services
        .tokens
        .allowance(&admin, &q.owner, &q.spender)
        .await?;
    Ok(Json(AllowanceResponse { allowance }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_accepts_number_or_text() {
        let n: AmountField = serde_json::from_str("25").unwrap();
        assert_eq!(n.value().unwrap(), 25);
        let t: AmountField = serde_json::from_str("\"25\"").unwrap();
        assert_eq!(t.value().unwrap(), 25);
    }

    #[test]
    fn amount_rejects_zero_and_garbage() {
        let zero: AmountField = serde_json::from_str("0").unwrap();
        assert!(zero.value().is_err());
        let text: AmountField = serde_json::from_str("\"lots\"").unwrap();
        assert!(text.value().is_err());
    }

    #[test]
    fn amount_rejects_negative_fractional_and_non_numeric_json() {
        for raw in ["-5", "1.5", "true", "null", "[1]"] {
            let field: AmountField = serde_json::from_str(raw).unwrap();
            assert!(
                matches!(field.value(), Err(AppError::Validation(_))),
                "{raw} was accepted"
            );
        }
    }
}
