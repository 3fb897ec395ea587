//! Typed operations on the token chaincode.
//!
//! Each call opens one session as the given [`Actor`], runs one or more
//! chaincode functions, and disconnects. Amounts are validated before any
//! network traffic.

use mlchain_core::ValidationError;
use mlchain_fabric::Contract;

use crate::connector::{Actor, Connector};
use crate::decode;
use crate::error::WorkflowError;

/// Role granted to the token administrator.
pub const ADMIN_ROLE: &str = "admin";

/// Parse a positive token amount.
pub fn parse_amount(raw: &str) -> Result<u64, ValidationError> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ValidationError::InvalidAmount(raw.to_string())),
        Ok(n) => Ok(n),
    }
}

/// Result of [`TokenContract::purchase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// Client id credited.
    pub recipient: String,
    /// Tokens minted to cover the seller's shortfall; zero when none were needed.
    pub minted: u64,
    /// Tokens transferred to the recipient.
    pub transferred: u64,
}

/// Token chaincode client.
#[derive(Debug, Clone)]
pub struct TokenContract {
    connector: Connector,
}

impl TokenContract {
    /// Address the configured token chaincode.
    pub fn new(connector: Connector) -> Self {
        Self { connector }
    }

    async fn evaluate(&self, actor: &Actor, function: &'static str, args: Vec<String>) -> Result<Vec<u8>, WorkflowError> {
        let target = self.connector.token_target();
        self.connector.evaluate(actor, target, function, args).await
    }

    async fn submit(&self, actor: &Actor, function: &'static str, args: Vec<String>) -> Result<Vec<u8>, WorkflowError> {
        let target = self.connector.token_target();
        self.connector.submit(actor, target, function, args, None).await
    }

    /// Ledger client id of the acting identity.
    pub async fn client_id(&self, actor: &Actor) -> Result<String, WorkflowError> {
        let payload = self.evaluate(actor, "GetClientId", Vec::new()).await?;
        decode::text("GetClientId", &payload)
    }

    /// Balance of `id`.
    pub async fn balance(&self, actor: &Actor, id: &str) -> Result<u64, WorkflowError> {
        let payload = self.evaluate(actor, "GetUserBalance", vec![id.to_string()]).await?;
        decode::amount("GetUserBalance", &payload)
    }

    /// Balance of the acting identity.
    pub async fn own_balance(&self, actor: &Actor) -> Result<u64, WorkflowError> {
        let payload = self.evaluate(actor, "GetBalance", Vec::new()).await?;
        decode::amount("GetBalance", &payload)
    }

    /// Total token supply.
    pub async fn total_supply(&self, actor: &Actor) -> Result<u64, WorkflowError> {
        let payload = self.evaluate(actor, "TotalSupply", Vec::new()).await?;
        decode::amount("TotalSupply", &payload)
    }

    /// Amount `spender` may still withdraw from `owner`.
    pub async fn allowance(&self, actor: &Actor, owner: &str, spender: &str) -> Result<u64, WorkflowError> {
        let args = vec![owner.to_string(), spender.to_string()];
        let payload = self.evaluate(actor, "Allowance", args).await?;
        decode::amount("Allowance", &payload)
    }

    /// Mint `amount` to the acting identity.
    pub async fn mint(&self, actor: &Actor, amount: u64) -> Result<(), WorkflowError> {
        self.submit(actor, "Mint", vec![amount.to_string()]).await?;
        Ok(())
    }

    /// Transfer `amount` from the acting identity to `to`.
    pub async fn transfer(&self, actor: &Actor, to: &str, amount: u64) -> Result<(), WorkflowError> {
        self.submit(actor, "Transfer", vec![to.to_string(), amount.to_string()])
            .await?;
        Ok(())
    }

    /// Let `spender` withdraw up to `amount` from the acting identity.
    pub async fn approve(&self, actor: &Actor, spender: &str, amount: u64) -> Result<(), WorkflowError> {
        self.submit(actor, "Approve", vec![spender.to_string(), amount.to_string()])
            .await?;
        Ok(())
    }

    /// Move `amount` from `from` to `to` under an allowance held by the acting identity.
    pub async fn transfer_from(
        &self,
        actor: &Actor,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<(), WorkflowError> {
        let args = vec![from.to_string(), to.to_string(), amount.to_string()];
        self.submit(actor, "TransferFrom", args).await?;
        Ok(())
    }

    /// Register `name` as a token user. Returns the chaincode's message.
    pub async fn register(&self, actor: &Actor, name: &str) -> Result<String, WorkflowError> {
        let payload = self.submit(actor, "Register", vec![name.to_string()]).await?;
        decode::text("Register", &payload)
    }

    /// Grant `role` to the user with client id `id`.
    pub async fn authorize(&self, actor: &Actor, id: &str, role: &str) -> Result<(), WorkflowError> {
        if role.trim().is_empty() {
            return Err(ValidationError::Empty("role").into());
        }
        self.submit(actor, "Authorize", vec![id.to_string(), role.to_string()])
            .await?;
        Ok(())
    }

    /// Install upload and usage prices.
    pub async fn set_prices(&self, actor: &Actor, upload: u64, usage: u64) -> Result<(), WorkflowError> {
        self.submit(actor, "SetPrices", vec![upload.to_string(), usage.to_string()])
            .await?;
        Ok(())
    }

    /// Sell `amount` tokens from the acting identity to `recipient`.
    ///
    /// Mints only the shortfall when the seller's balance is below `amount`,
    /// then transfers exactly `amount`. All three calls share one session.
    pub async fn purchase(&self, seller: &Actor, recipient: &str, amount: u64) -> Result<PurchaseReceipt, WorkflowError> {
        if amount == 0 {
            return Err(ValidationError::InvalidAmount("0".into()).into());
        }
        let target = self.connector.token_target();
        let recipient = recipient.to_string();
        self.connector
            .with_session(seller, move |session| {
                Box::pin(async move {
                    let tokens = Contract::new(session, target);
                    let balance = decode::amount("GetBalance", &tokens.evaluate("GetBalance", &[]).await?)?;
                    let minted = amount.saturating_sub(balance);
                    if minted > 0 {
                        tracing::info!(balance, minted, "minting shortfall");
                        tokens.submit("Mint", &[&minted.to_string()], None).await?;
                    }
                    tokens
                        .submit("Transfer", &[&recipient, &amount.to_string()], None)
                        .await?;
                    Ok(PurchaseReceipt {
                        recipient,
                        minted,
                        transferred: amount,
                    })
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_must_be_positive_integers() {
        assert_eq!(parse_amount("10").unwrap(), 10);
        assert_eq!(parse_amount(" 3 ").unwrap(), 3);
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("ten").is_err());
        assert!(parse_amount("").is_err());
    }
}
