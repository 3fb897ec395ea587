//! # In-process CA and Gateway
//!
//! Deterministic stand-ins for the remote services, enabled by the `mock`
//! feature. They enforce the same contract the real services do where the
//! workflow depends on it:
//!
//! - the CA knows a bootstrap admin, issues single-use secrets to new
//!   identities, and only lets admins register;
//! - the gateway counts connects and disconnects, records every call, and
//!   answers each function with a scripted payload or rejection.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mlchain_core::{
    CaEndpoint, ConnectionProfile, Credential, DiscoverySettings, EnrollmentSecret, IdentityName,
};
use parking_lot::Mutex;

use crate::ca::{CaConnector, CertificateAuthority, Enrollment, RegistrationRequest};
use crate::error::{CaError, GatewayError};
use crate::gateway::{ChaincodeTarget, Gateway, Session, TransientData};
use crate::signer::IdentityKey;

// -- Certificate authority ----------------------------------------------------

#[derive(Debug)]
struct MockCaIdentity {
    /// `None` once a single-use secret has been consumed.
    secret: Option<String>,
    admin: bool,
    affiliation: String,
}

#[derive(Debug, Default)]
struct MockCaState {
    identities: HashMap<String, MockCaIdentity>,
    /// Issued certificate -> identity name.
    certificates: HashMap<String, String>,
    serial: u64,
    enroll_calls: usize,
    register_calls: usize,
}

/// In-process certificate authority. Clones share state.
#[derive(Debug, Clone)]
pub struct MockCertificateAuthority {
    ca_name: String,
    state: Arc<Mutex<MockCaState>>,
}

impl MockCertificateAuthority {
    /// Create a CA whose bootstrap admin is `admin_id` / `admin_secret`.
    /// The admin secret may be used any number of times.
    pub fn new(ca_name: impl Into<String>, admin_id: &IdentityName, admin_secret: &EnrollmentSecret) -> Self {
        let mut state = MockCaState::default();
        state.identities.insert(
            admin_id.to_string(),
            MockCaIdentity {
                secret: Some(admin_secret.expose().to_string()),
                admin: true,
                affiliation: String::new(),
            },
        );
        Self {
            ca_name: ca_name.into(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Whether `name` is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.state.lock().identities.contains_key(name)
    }

    /// Affiliation recorded for `name`.
    pub fn affiliation_of(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .identities
            .get(name)
            .map(|i| i.affiliation.clone())
    }

    /// Number of enroll calls received, successful or not.
    pub fn enroll_calls(&self) -> usize {
        self.state.lock().enroll_calls
    }

    /// Number of register calls received, successful or not.
    pub fn register_calls(&self) -> usize {
        self.state.lock().register_calls
    }
}

#[async_trait]
impl CertificateAuthority for MockCertificateAuthority {
    async fn enroll(
        &self,
        name: &IdentityName,
        secret: &EnrollmentSecret,
    ) -> Result<Enrollment, CaError> {
        let mut state = self.state.lock();
        state.enroll_calls += 1;
        let denied = || CaError::AuthFailure {
            name: name.to_string(),
            message: "authentication failure".into(),
        };
        let identity = state.identities.get_mut(name.as_str()).ok_or_else(denied)?;
        if identity.secret.as_deref() != Some(secret.expose()) {
            return Err(denied());
        }
        if !identity.admin {
            identity.secret = None;
        }

        state.serial += 1;
        let certificate = format!(
            "-----BEGIN CERTIFICATE-----\n{}:{}:{}\n-----END CERTIFICATE-----\n",
            self.ca_name, name, state.serial
        );
        state.certificates.insert(certificate.clone(), name.to_string());
        let key = IdentityKey::generate();
        Ok(Enrollment {
            certificate,
            private_key: key.private_key_hex(),
        })
    }

    async fn register(
        &self,
        request: &RegistrationRequest,
        registrar: &Credential,
    ) -> Result<EnrollmentSecret, CaError> {
        let mut state = self.state.lock();
        state.register_calls += 1;
        let registrar_is_admin = state
            .certificates
            .get(registrar.certificate())
            .and_then(|name| state.identities.get(name))
            .is_some_and(|i| i.admin);
        if !registrar_is_admin {
            return Err(CaError::PermissionDenied {
                message: "registrar does not have the hf.Registrar attribute".into(),
            });
        }
        if state.identities.contains_key(request.name.as_str()) {
            return Err(CaError::AlreadyExists {
                name: request.name.to_string(),
            });
        }
        let secret = uuid::Uuid::new_v4().simple().to_string();
        state.identities.insert(
            request.name.to_string(),
            MockCaIdentity {
                secret: Some(secret.clone()),
                admin: false,
                affiliation: request.affiliation.clone(),
            },
        );
        Ok(EnrollmentSecret::new(secret))
    }
}

/// One [`MockCertificateAuthority`] per CA host, created on first use.
#[derive(Debug, Clone)]
pub struct MockCaConnector {
    admin_id: IdentityName,
    admin_secret: EnrollmentSecret,
    authorities: Arc<Mutex<HashMap<String, MockCertificateAuthority>>>,
}

impl MockCaConnector {
    /// Every CA created by this connector knows the same bootstrap admin.
    pub fn new(admin_id: IdentityName, admin_secret: EnrollmentSecret) -> Self {
        Self {
            admin_id,
            admin_secret,
            authorities: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The CA serving `host`.
    pub fn authority(&self, host: &str) -> MockCertificateAuthority {
        self.authorities
            .lock()
            .entry(host.to_string())
            .or_insert_with(|| MockCertificateAuthority::new(host, &self.admin_id, &self.admin_secret))
            .clone()
    }
}

impl CaConnector for MockCaConnector {
    fn connect(&self, endpoint: &CaEndpoint) -> Result<Box<dyn CertificateAuthority>, CaError> {
        Ok(Box::new(self.authority(&endpoint.host)))
    }
}

// -- Gateway ------------------------------------------------------------------

/// Whether a recorded call was a query or a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// `evaluate`
    Evaluate,
    /// `submit`
    Submit,
}

/// One recorded chaincode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Identity the session acted as.
    pub identity: String,
    /// Query or transaction.
    pub kind: CallKind,
    /// Addressed chaincode.
    pub chaincode: String,
    /// Function name.
    pub function: String,
    /// String arguments.
    pub args: Vec<String>,
    /// Transient data, if any.
    pub transient: Option<TransientData>,
}

#[derive(Debug, Default)]
struct MockLedgerState {
    connects: usize,
    disconnects: usize,
    calls: Vec<Invocation>,
    responses: HashMap<String, Result<Vec<u8>, String>>,
    connect_failure: Option<String>,
}

/// In-process gateway with scripted responses. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<MockLedgerState>>,
}

impl MockGateway {
    /// Gateway with no scripted responses; unscripted calls return an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `function` with `payload`.
    pub fn respond(&self, function: &str, payload: impl Into<Vec<u8>>) -> &Self {
        self.state
            .lock()
            .responses
            .insert(function.to_string(), Ok(payload.into()));
        self
    }

    /// Reject `function` with `message`.
    pub fn reject(&self, function: &str, message: &str) -> &Self {
        self.state
            .lock()
            .responses
            .insert(function.to_string(), Err(message.to_string()));
        self
    }

    /// Fail every subsequent connect with `reason`.
    pub fn fail_connects(&self, reason: &str) {
        self.state.lock().connect_failure = Some(reason.to_string());
    }

    /// Number of sessions opened.
    pub fn connects(&self) -> usize {
        self.state.lock().connects
    }

    /// Number of sessions closed.
    pub fn disconnects(&self) -> usize {
        self.state.lock().disconnects
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.state.lock().calls.clone()
    }

    /// Calls to `function`, in order.
    pub fn calls_to(&self, function: &str) -> Vec<Invocation> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.function == function)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn connect(
        &self,
        profile: &ConnectionProfile,
        identity: &IdentityName,
        _credential: &Credential,
        _discovery: DiscoverySettings,
    ) -> Result<Box<dyn Session>, GatewayError> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.connect_failure {
            return Err(GatewayError::Unreachable {
                org: profile.client_organization().to_string(),
                reason: reason.clone(),
            });
        }
        state.connects += 1;
        Ok(Box::new(MockSession {
            identity: identity.clone(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockSession {
    identity: IdentityName,
    state: Arc<Mutex<MockLedgerState>>,
}

impl MockSession {
    fn call(
        &self,
        kind: CallKind,
        target: &ChaincodeTarget,
        function: &str,
        args: &[String],
        transient: Option<&TransientData>,
    ) -> Result<Vec<u8>, GatewayError> {
        let mut state = self.state.lock();
        state.calls.push(Invocation {
            identity: self.identity.to_string(),
            kind,
            chaincode: target.chaincode.clone(),
            function: function.to_string(),
            args: args.to_vec(),
            transient: transient.cloned(),
        });
        match state.responses.get(function) {
            Some(Ok(payload)) => Ok(payload.clone()),
            Some(Err(message)) => Err(GatewayError::TransactionRejected {
                function: function.to_string(),
                message: message.clone(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl Session for MockSession {
    fn identity(&self) -> &IdentityName {
        &self.identity
    }

    async fn evaluate(
        &self,
        target: &ChaincodeTarget,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>, GatewayError> {
        self.call(CallKind::Evaluate, target, function, args, None)
    }

    async fn submit(
        &self,
        target: &ChaincodeTarget,
        function: &str,
        args: &[String],
        transient: Option<&TransientData>,
    ) -> Result<Vec<u8>, GatewayError> {
        self.call(CallKind::Submit, target, function, args, transient)
    }

    async fn disconnect(self: Box<Self>) -> Result<(), GatewayError> {
        self.state.lock().disconnects += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ca::RegistrationRequest;
    use mlchain_core::MspId;

    fn name(n: &str) -> IdentityName {
        IdentityName::new(n).unwrap()
    }

    fn ca() -> MockCertificateAuthority {
        MockCertificateAuthority::new("ca-org1", &name("admin"), &EnrollmentSecret::new("adminpw"))
    }

    #[tokio::test]
    async fn admin_can_enroll_repeatedly() {
        let ca = ca();
        let secret = EnrollmentSecret::new("adminpw");
        ca.enroll(&name("admin"), &secret).await.unwrap();
        ca.enroll(&name("admin"), &secret).await.unwrap();
        assert_eq!(ca.enroll_calls(), 2);
    }

    #[tokio::test]
    async fn user_secret_is_single_use() {
        let ca = ca();
        let admin = ca
            .enroll(&name("admin"), &EnrollmentSecret::new("adminpw"))
            .await
            .unwrap()
            .into_credential(MspId::new("Org1MSP").unwrap());
        let secret = ca
            .register(&RegistrationRequest::client(name("alice"), "org1.department1"), &admin)
            .await
            .unwrap();

        ca.enroll(&name("alice"), &secret).await.unwrap();
        let reuse = ca.enroll(&name("alice"), &secret).await.unwrap_err();
        assert!(matches!(reuse, CaError::AuthFailure { .. }));
        assert_eq!(ca.affiliation_of("alice").as_deref(), Some("org1.department1"));
    }

    #[tokio::test]
    async fn non_admin_cannot_register() {
        let ca = ca();
        let outsider = Credential::x509("unknown cert", "00", MspId::new("Org1MSP").unwrap());
        let err = ca
            .register(&RegistrationRequest::client(name("bob"), "org1.department1"), &outsider)
            .await
            .unwrap_err();
        assert!(matches!(err, CaError::PermissionDenied { .. }));
        assert!(!ca.is_registered("bob"));
    }

    #[tokio::test]
    async fn duplicate_registration_is_already_exists() {
        let ca = ca();
        let admin = ca
            .enroll(&name("admin"), &EnrollmentSecret::new("adminpw"))
            .await
            .unwrap()
            .into_credential(MspId::new("Org1MSP").unwrap());
        let req = RegistrationRequest::client(name("carol"), "org1.department1");
        ca.register(&req, &admin).await.unwrap();
        let err = ca.register(&req, &admin).await.unwrap_err();
        assert!(matches!(err, CaError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn connector_shares_authority_per_host() {
        let connector = MockCaConnector::new(name("admin"), EnrollmentSecret::new("adminpw"));
        assert!(!connector.authority("ca.org1.example.com").is_registered("dave"));
        let a = connector.authority("ca.org1.example.com");
        let b = connector.authority("ca.org1.example.com");
        let _ = a.enroll(&name("admin"), &EnrollmentSecret::new("adminpw")).await;
        assert_eq!(b.enroll_calls(), 1);
        assert_eq!(connector.authority("ca.org2.example.com").enroll_calls(), 0);
    }
}
