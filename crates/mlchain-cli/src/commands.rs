//! Executes parsed verbs.
//!
//! Token reads, purchases, role requests and model reads go through the REST
//! gateway. Everything that needs a wallet identity talks to the ledger
//! directly, acting in the client organization.

use std::path::Path;

use anyhow::{Context, Result};
use mlchain_core::{EnrollmentSecret, IdentityName};
use mlchain_workflow::{Actor, AdminEnrollment, ModelDefinition, Services, TensorDefinition};

use crate::api_client::ApiClient;
use crate::verbs::Command;

/// Everything a verb may need.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    services: Services,
    api: ApiClient,
}

impl Dispatcher {
    pub fn new(services: Services, api: ApiClient) -> Self {
        Self { services, api }
    }

    fn wallet_user(&self, name: &IdentityName) -> Actor {
        Actor::new(self.services.settings().client_org.clone(), name.clone())
    }

    /// Run one command and return the text to print.
    pub async fn run(&self, command: Command) -> Result<String> {
        let tokens = &self.services.tokens;
        let models = &self.services.models;

        match command {
            Command::Enroll { user } => {
                let registered = self
                    .api
                    .register(user.as_str())
                    .await
                    .with_context(|| format!("registering {user}"))?;
                let secret = EnrollmentSecret::new(registered.secret);
                self.onboard(&user, &secret).await
            }
            Command::EnrollUser { user, secret } => {
                self.onboard(&user, &EnrollmentSecret::new(secret)).await
            }
            Command::EnrollAdmins => {
                let report = self.services.enrollment.bootstrap_admins().await?;
                let mut lines: Vec<String> = report
                    .admins
                    .iter()
                    .map(|(org, outcome)| match outcome {
                        AdminEnrollment::AlreadyEnrolled => {
                            format!("admin of {org} already exists in the wallet")
                        }
                        AdminEnrollment::Enrolled => {
                            format!("enrolled admin of {org} and imported it into the wallet")
                        }
                    })
                    .collect();
                lines.push(format!("token admin authorized: {}", report.token_admin_id));
                Ok(lines.join("\n"))
            }
            Command::GetClientId { wallet_user } => {
                Ok(tokens.client_id(&self.wallet_user(&wallet_user)).await?)
            }
            Command::Buy { client_id, amount } => Ok(self.api.purchase(&client_id, amount).await?),
            Command::RequestRole { client_id, role } => {
                Ok(self.api.authorize(&client_id, &role).await?)
            }
            Command::GetBalance { client_id } => Ok(self.api.balance(&client_id).await?.to_string()),
            Command::GetTotalSupply => Ok(self.api.total_supply().await?.to_string()),
            Command::GetAllowance { owner, spender } => {
                Ok(self.api.allowance(&owner, &spender).await?.to_string())
            }
            Command::Transfer {
                wallet_user,
                to,
                amount,
            } => {
                tokens
                    .transfer(&self.wallet_user(&wallet_user), &to, amount)
                    .await?;
                Ok(format!("transferred {amount} tokens to {to}"))
            }
            Command::Approve {
                wallet_user,
                spender,
                amount,
            } => {
                tokens
                    .approve(&self.wallet_user(&wallet_user), &spender, amount)
                    .await?;
                Ok(format!("approved {spender} to spend {amount} tokens"))
            }
            Command::TransferFrom {
                wallet_user,
                from,
                to,
                amount,
            } => {
                tokens
                    .transfer_from(&self.wallet_user(&wallet_user), &from, &to, amount)
                    .await?;
                Ok(format!("transferred {amount} tokens from {from} to {to}"))
            }
            Command::Submit {
                wallet_user,
                model,
                cid,
                input_def,
                output_def,
            } => {
                let definition = ModelDefinition {
                    name: model,
                    cid,
                    input: load_tensor(&input_def)?,
                    output: load_tensor(&output_def)?,
                };
                models.save(&self.wallet_user(&wallet_user), &definition).await?;
                Ok(format!("model {} saved", definition.name))
            }
            Command::Authorize {
                wallet_user,
                model,
                user,
            } => {
                models
                    .authorize(&self.wallet_user(&wallet_user), &model, &user)
                    .await?;
                Ok(format!("{user} authorized to run {model}"))
            }
            Command::Execute {
                wallet_user,
                model,
                input,
            } => {
                let bytes = std::fs::read(&input)
                    .with_context(|| format!("reading input {}", input.display()))?;
                Ok(models.run(&self.wallet_user(&wallet_user), &model, &bytes).await?)
            }
            Command::GetModel { name } => pretty(&self.api.model(&name).await?),
            Command::GetAllModels => pretty(&self.api.models(None).await?),
            Command::GetModelsByUser { client_id } => {
                pretty(&self.api.models(Some(&client_id)).await?)
            }
        }
    }

    async fn onboard(&self, user: &IdentityName, secret: &EnrollmentSecret) -> Result<String> {
        let org = &self.services.settings().client_org;
        let onboarding = self.services.enrollment.onboard(org, user, secret).await?;
        Ok(format!(
            "enrolled {} and imported it into the wallet\n{}",
            onboarding.name, onboarding.message
        ))
    }
}

fn load_tensor(path: &Path) -> Result<TensorDefinition> {
    TensorDefinition::from_file(path)
        .with_context(|| format!("loading tensor definition {}", path.display()))
}

fn pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
