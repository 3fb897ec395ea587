//! # Enrollment Workflow
//!
//! Takes an identity from nothing to usable on the ledger:
//!
//! ```text
//! Unregistered --register_user--> Registered(secret)
//!              --enroll_user----> Enrolled (credential in wallet)
//!              --register_on_chain--> AuthorizedOnChain
//! ```
//!
//! Admin bootstrap is the special case: the CA already knows each
//! organization's admin, so only enrollment is needed, and it is skipped
//! when the wallet already holds the admin credential.
//!
//! Registration requires the registrar organization's admin credential.
//! Without it the call fails with [`WorkflowError::AdminNotEnrolled`] and
//! is not retried.

use std::sync::Arc;

use mlchain_core::{Credential, EnrollmentSecret, IdentityName, OrgId};
use mlchain_fabric::{CaConnector, CertificateAuthority, GatewayError, RegistrationRequest};

use crate::connector::{Actor, Connector};
use crate::error::{OnboardingError, WorkflowError};
use crate::token::{TokenContract, ADMIN_ROLE};

/// Lifecycle position of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityState {
    /// Not known to the CA.
    Unregistered,
    /// Registered at the CA; holds an unused enrollment secret.
    Registered,
    /// Credential stored in the wallet.
    Enrolled,
    /// Registered as a user on the token chaincode.
    AuthorizedOnChain,
}

/// Outcome of [`EnrollmentWorkflow::enroll_admin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminEnrollment {
    /// The wallet already held the admin credential; the CA was not contacted.
    AlreadyEnrolled,
    /// The admin was enrolled and stored.
    Enrolled,
}

/// A completed onboarding.
#[derive(Debug, Clone)]
pub struct Onboarding {
    /// Identity onboarded.
    pub name: IdentityName,
    /// Credential stored in the wallet.
    pub credential: Credential,
    /// Message returned by the on-chain registration.
    pub message: String,
    /// Always [`IdentityState::AuthorizedOnChain`].
    pub state: IdentityState,
}

/// Summary of [`EnrollmentWorkflow::bootstrap_admins`].
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    /// Per-organization admin enrollment outcome, in settings order.
    pub admins: Vec<(OrgId, AdminEnrollment)>,
    /// Client id of the token admin on the ledger.
    pub token_admin_id: String,
}

/// Drives identities through registration and enrollment.
#[derive(Clone)]
pub struct EnrollmentWorkflow {
    connector: Connector,
    cas: Arc<dyn CaConnector>,
}

impl std::fmt::Debug for EnrollmentWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrollmentWorkflow")
            .field("connector", &self.connector)
            .finish_non_exhaustive()
    }
}

impl EnrollmentWorkflow {
    /// Build the workflow over a connector and a CA client factory.
    pub fn new(connector: Connector, cas: Arc<dyn CaConnector>) -> Self {
        Self { connector, cas }
    }

    fn certificate_authority(&self, org: &OrgId) -> Result<Box<dyn CertificateAuthority>, WorkflowError> {
        let org_settings = self.connector.settings().org(org)?;
        let profile = self.connector.profiles().load(org)?;
        let endpoint = profile.certificate_authority(&org_settings.ca_host)?;
        tracing::debug!(org = %org, ca = %endpoint.ca_name, "built CA client");
        Ok(self.cas.connect(&endpoint)?)
    }

    /// Enroll `org`'s CA admin unless its credential is already stored.
    pub async fn enroll_admin(&self, org: &OrgId) -> Result<AdminEnrollment, WorkflowError> {
        let settings = self.connector.settings();
        let admin = &settings.admin_id;
        let wallet = self.connector.wallets().open(org)?;
        if wallet.contains(admin)? {
            tracing::info!(org = %org, "admin identity already exists in the wallet");
            return Ok(AdminEnrollment::AlreadyEnrolled);
        }

        let msp_id = settings.org(org)?.msp_id.clone();
        let ca = self.certificate_authority(org)?;
        let enrollment = ca.enroll(admin, &settings.admin_secret).await?;
        wallet.put(admin, &enrollment.into_credential(msp_id))?;
        tracing::info!(org = %org, "admin enrolled and imported into the wallet");
        Ok(AdminEnrollment::Enrolled)
    }

    /// Register `name` at `org`'s CA with the `client` role.
    pub async fn register_user(
        &self,
        org: &OrgId,
        name: &IdentityName,
    ) -> Result<EnrollmentSecret, WorkflowError> {
        let settings = self.connector.settings();
        let admin = self
            .connector
            .wallets()
            .open(org)?
            .get(&settings.admin_id)?
            .ok_or_else(|| WorkflowError::AdminNotEnrolled { org: org.clone() })?;

        let affiliation = settings.org(org)?.affiliation.clone();
        let ca = self.certificate_authority(org)?;
        let secret = ca
            .register(&RegistrationRequest::client(name.clone(), affiliation), &admin)
            .await?;
        tracing::info!(org = %org, identity = %name, "user registered at CA");
        Ok(secret)
    }

    /// Exchange `secret` for a credential and store it in `org`'s wallet.
    pub async fn enroll_user(
        &self,
        org: &OrgId,
        name: &IdentityName,
        secret: &EnrollmentSecret,
    ) -> Result<Credential, WorkflowError> {
        let msp_id = self.connector.settings().org(org)?.msp_id.clone();
        let ca = self.certificate_authority(org)?;
        let credential = ca.enroll(name, secret).await?.into_credential(msp_id);
        self.connector.wallets().open(org)?.put(name, &credential)?;
        tracing::info!(org = %org, identity = %name, "user enrolled and imported into the wallet");
        Ok(credential)
    }

    /// Register the enrolled identity as a token-chaincode user, acting as itself.
    pub async fn register_on_chain(
        &self,
        org: &OrgId,
        name: &IdentityName,
    ) -> Result<String, WorkflowError> {
        let tokens = TokenContract::new(self.connector.clone());
        tokens
            .register(&Actor::new(org.clone(), name.clone()), name.as_str())
            .await
    }

    /// Enroll with `secret`, then register on chain.
    ///
    /// On failure the error reports the last state reached. A stored
    /// credential is kept even if on-chain registration fails.
    pub async fn onboard(
        &self,
        org: &OrgId,
        name: &IdentityName,
        secret: &EnrollmentSecret,
    ) -> Result<Onboarding, OnboardingError> {
        let stopped = |completed, source| OnboardingError {
            name: name.clone(),
            completed,
            source,
        };

        let credential = self
            .enroll_user(org, name, secret)
            .await
            .map_err(|e| stopped(IdentityState::Registered, e))?;
        let message = self
            .register_on_chain(org, name)
            .await
            .map_err(|e| stopped(IdentityState::Enrolled, e))?;

        Ok(Onboarding {
            name: name.clone(),
            credential,
            message,
            state: IdentityState::AuthorizedOnChain,
        })
    }

    /// Enroll every configured admin, make the token admin a ledger admin,
    /// and install prices. Safe to run again: enrolled admins are skipped
    /// and an existing on-chain admin registration is accepted.
    pub async fn bootstrap_admins(&self) -> Result<BootstrapReport, WorkflowError> {
        let settings = self.connector.settings();
        let mut admins = Vec::with_capacity(settings.organizations.len());
        for org in &settings.organizations {
            let outcome = self.enroll_admin(&org.id).await?;
            admins.push((org.id.clone(), outcome));
        }

        let tokens = TokenContract::new(self.connector.clone());
        let admin = self.connector.admin_of(&settings.token_admin_org);
        let admin_name = settings.admin_id.to_string();

        match tokens.register(&admin, &admin_name).await {
            Ok(message) => tracing::info!("{message}"),
            Err(WorkflowError::Gateway(GatewayError::TransactionRejected { message, .. }))
                if message.contains("already exists") =>
            {
                tracing::info!("token admin already registered on chain");
            }
            Err(e) => return Err(e),
        }
        let token_admin_id = tokens.client_id(&admin).await?;
        tokens.authorize(&admin, &token_admin_id, ADMIN_ROLE).await?;
        tokens
            .set_prices(&admin, settings.prices.upload, settings.prices.usage)
            .await?;
        tracing::info!(org = %settings.token_admin_org, "token admin authorized and prices set");

        Ok(BootstrapReport {
            admins,
            token_admin_id,
        })
    }

    /// Local view of an identity: enrolled if its credential is stored.
    pub fn identity_state(&self, org: &OrgId, name: &IdentityName) -> Result<IdentityState, WorkflowError> {
        let stored = self.connector.wallets().open(org)?.contains(name)?;
        Ok(if stored {
            IdentityState::Enrolled
        } else {
            IdentityState::Unregistered
        })
    }
}
