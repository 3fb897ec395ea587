//! # Network Gateway
//!
//! A [`Gateway`] opens a [`Session`] for one stored identity against the
//! peers of its organization. Within a session, chaincode functions are
//! reached through a [`Contract`] handle that borrows the session, so it
//! cannot outlive it.
//!
//! ## Session lifetime
//!
//! Sessions are ephemeral: one per request, never pooled. The owner must
//! call [`Session::disconnect`] on every exit path. `disconnect` consumes
//! the session, so a disconnected session cannot be used again.
//!
//! ## Evaluate vs submit
//!
//! `evaluate` is a read-only query; transport failures are retried.
//! `submit` orders a transaction and waits for commit; it is never retried
//! and a rejection is reported verbatim.

use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use mlchain_core::{ConnectionProfile, Credential, DiscoverySettings, IdentityName};

use crate::error::GatewayError;

/// Channel and chaincode a call is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChaincodeTarget {
    /// Channel name.
    pub channel: String,
    /// Chaincode name.
    pub chaincode: String,
}

impl ChaincodeTarget {
    /// Address `chaincode` on `channel`.
    pub fn new(channel: impl Into<String>, chaincode: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            chaincode: chaincode.into(),
        }
    }
}

/// Private binary inputs passed alongside a submit. Not written to the ledger.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TransientData(BTreeMap<String, Vec<u8>>);

impl TransientData {
    /// Empty transient map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, builder-style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Base64-encoded form for the wire.
    pub fn encoded(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), B64.encode(v)))
            .collect()
    }
}

impl std::fmt::Debug for TransientData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sizes: BTreeMap<&str, usize> = self.0.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_tuple("TransientData").field(&sizes).finish()
    }
}

/// Opens sessions against the peers declared in a connection profile.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Open a session as `identity`, authenticated by `credential`.
    async fn connect(
        &self,
        profile: &ConnectionProfile,
        identity: &IdentityName,
        credential: &Credential,
        discovery: DiscoverySettings,
    ) -> Result<Box<dyn Session>, GatewayError>;
}

/// A live connection for one identity.
#[async_trait]
pub trait Session: Send + Sync {
    /// The identity this session acts as.
    fn identity(&self) -> &IdentityName;

    /// Run a read-only query.
    async fn evaluate(
        &self,
        target: &ChaincodeTarget,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>, GatewayError>;

    /// Submit a transaction and wait for it to commit.
    async fn submit(
        &self,
        target: &ChaincodeTarget,
        function: &str,
        args: &[String],
        transient: Option<&TransientData>,
    ) -> Result<Vec<u8>, GatewayError>;

    /// Close the session.
    async fn disconnect(self: Box<Self>) -> Result<(), GatewayError>;
}

impl dyn Session + '_ {
    /// Handle for `chaincode` on `channel`, borrowing this session.
    pub fn contract(&self, channel: &str, chaincode: &str) -> Contract<'_> {
        Contract {
            session: self,
            target: ChaincodeTarget::new(channel, chaincode),
        }
    }
}

/// A chaincode reached through a borrowed session.
pub struct Contract<'s> {
    session: &'s dyn Session,
    target: ChaincodeTarget,
}

impl<'s> Contract<'s> {
    /// Address `target` through `session`.
    pub fn new(session: &'s dyn Session, target: ChaincodeTarget) -> Self {
        Self { session, target }
    }

    /// The addressed channel and chaincode.
    pub fn target(&self) -> &ChaincodeTarget {
        &self.target
    }

    /// Evaluate `function` with string arguments.
    pub async fn evaluate(&self, function: &str, args: &[&str]) -> Result<Vec<u8>, GatewayError> {
        let args = owned(args);
        tracing::debug!(chaincode = %self.target.chaincode, function, "evaluate");
        self.session.evaluate(&self.target, function, &args).await
    }

    /// Submit `function` with string arguments and optional transient data.
    pub async fn submit(
        &self,
        function: &str,
        args: &[&str],
        transient: Option<&TransientData>,
    ) -> Result<Vec<u8>, GatewayError> {
        let args = owned(args);
        tracing::debug!(chaincode = %self.target.chaincode, function, "submit");
        self.session
            .submit(&self.target, function, &args, transient)
            .await
    }
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| (*a).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_values_are_base64_on_the_wire() {
        let t = TransientData::new().with("input", vec![0u8, 1, 2, 255]);
        assert_eq!(t.encoded()["input"], "AAEC/w==");
        assert_eq!(t.get("input"), Some(&[0u8, 1, 2, 255][..]));
        assert_eq!(t.keys().collect::<Vec<_>>(), vec!["input"]);
    }

    #[test]
    fn transient_debug_shows_sizes_only() {
        let t = TransientData::new().with("input", b"private".to_vec());
        let rendered = format!("{t:?}");
        assert!(rendered.contains("7"));
        assert!(!rendered.contains("private"));
    }
}
