//! # Session-Scoped Ledger Access
//!
//! [`Connector::with_session`] resolves an identity's stored credential and
//! its organization's connection profile, opens a gateway session, runs one
//! operation, and disconnects. The disconnect happens on every return path,
//! success or error, so callers cannot leak sessions.
//!
//! The operation is a closure returning a boxed future that borrows the
//! session. Anything else it uses must be moved in.

use std::sync::Arc;

use futures::future::BoxFuture;
use mlchain_core::{IdentityName, OrgId, ProfileSource, Settings, WalletProvider};
use mlchain_fabric::{ChaincodeTarget, Contract, Gateway, Session, TransientData};

use crate::error::WorkflowError;

/// The identity an operation acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Organization whose wallet holds the identity.
    pub org: OrgId,
    /// Identity name.
    pub name: IdentityName,
}

impl Actor {
    /// Act as `name` from `org`'s wallet.
    pub fn new(org: OrgId, name: IdentityName) -> Self {
        Self { org, name }
    }

    /// Parse and validate both parts.
    pub fn parse(org: &str, name: &str) -> Result<Self, WorkflowError> {
        Ok(Self {
            org: OrgId::new(org)?,
            name: IdentityName::new(name)?,
        })
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.org)
    }
}

/// Opens per-request gateway sessions for stored identities.
#[derive(Clone)]
pub struct Connector {
    settings: Arc<Settings>,
    profiles: Arc<dyn ProfileSource>,
    wallets: Arc<dyn WalletProvider>,
    gateway: Arc<dyn Gateway>,
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("channel", &self.settings.channel)
            .finish_non_exhaustive()
    }
}

impl Connector {
    /// Assemble a connector from its collaborators.
    pub fn new(
        settings: Arc<Settings>,
        profiles: Arc<dyn ProfileSource>,
        wallets: Arc<dyn WalletProvider>,
        gateway: Arc<dyn Gateway>,
    ) -> Self {
        Self {
            settings,
            profiles,
            wallets,
            gateway,
        }
    }

    /// Runtime settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Wallets of all organizations.
    pub fn wallets(&self) -> &Arc<dyn WalletProvider> {
        &self.wallets
    }

    /// Connection profiles of all organizations.
    pub fn profiles(&self) -> &Arc<dyn ProfileSource> {
        &self.profiles
    }

    /// Address of the token chaincode.
    pub fn token_target(&self) -> ChaincodeTarget {
        ChaincodeTarget::new(&self.settings.channel, &self.settings.token_chaincode)
    }

    /// Address of the model-registry chaincode.
    pub fn model_target(&self) -> ChaincodeTarget {
        ChaincodeTarget::new(&self.settings.channel, &self.settings.model_chaincode)
    }

    /// The admin identity of `org`.
    pub fn admin_of(&self, org: &OrgId) -> Actor {
        Actor::new(org.clone(), self.settings.admin_id.clone())
    }

    /// Run `op` inside a fresh session for `actor`, then disconnect.
    ///
    /// Fails with [`WorkflowError::NotEnrolled`] before any network traffic
    /// when the actor has no stored credential.
    pub async fn with_session<T, F>(&self, actor: &Actor, op: F) -> Result<T, WorkflowError>
    where
        T: Send,
        F: for<'s> FnOnce(&'s dyn Session) -> BoxFuture<'s, Result<T, WorkflowError>> + Send,
    {
        let credential = self
            .wallets
            .open(&actor.org)?
            .get(&actor.name)?
            .ok_or_else(|| WorkflowError::NotEnrolled {
                org: actor.org.clone(),
                name: actor.name.clone(),
            })?;
        let profile = self.profiles.load(&actor.org)?;
        let session = self
            .gateway
            .connect(&profile, &actor.name, &credential, self.settings.discovery)
            .await?;
        tracing::debug!(actor = %actor, "session opened");

        let result = op(session.as_ref()).await;

        if let Err(e) = session.disconnect().await {
            tracing::warn!(actor = %actor, "disconnect failed: {e}");
        }
        result
    }

    /// One evaluate in its own session.
    pub async fn evaluate(
        &self,
        actor: &Actor,
        target: ChaincodeTarget,
        function: &'static str,
        args: Vec<String>,
    ) -> Result<Vec<u8>, WorkflowError> {
        self.with_session(actor, move |session| {
            Box::pin(async move {
                let args = borrowed(&args);
                Ok(Contract::new(session, target).evaluate(function, &args).await?)
            })
        })
        .await
    }

    /// One submit in its own session.
    pub async fn submit(
        &self,
        actor: &Actor,
        target: ChaincodeTarget,
        function: &'static str,
        args: Vec<String>,
        transient: Option<TransientData>,
    ) -> Result<Vec<u8>, WorkflowError> {
        self.with_session(actor, move |session| {
            Box::pin(async move {
                let args = borrowed(&args);
                Ok(Contract::new(session, target)
                    .submit(function, &args, transient.as_ref())
                    .await?)
            })
        })
        .await
    }
}

pub(crate) fn borrowed(args: &[String]) -> Vec<&str> {
    args.iter().map(String::as_str).collect()
}
