//! Contract tests for HttpCertificateAuthority against a simulated CA server.
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | POST | `/api/v1/enroll` | `enroll_*` |
//! | POST | `/api/v1/register` | `register_*` |

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use mlchain_core::{CaEndpoint, Credential, EnrollmentSecret, IdentityName, MspId};
use mlchain_fabric::{CaError, CertificateAuthority, HttpCertificateAuthority, IdentityKey, RegistrationRequest};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

fn client(server: &MockServer) -> HttpCertificateAuthority {
    let endpoint = CaEndpoint {
        host: "ca.org1.example.com".into(),
        url: format!("{}/", server.uri()).parse().unwrap(),
        ca_name: "ca-org1".into(),
        tls_ca_pems: Vec::new(),
        verify_tls: false,
    };
    HttpCertificateAuthority::new(&endpoint, Duration::from_secs(5)).unwrap()
}

fn registrar() -> Credential {
    let key = IdentityKey::generate();
    Credential::x509(PEM, key.private_key_hex().as_str(), MspId::new("Org1MSP").unwrap())
}

fn name(n: &str) -> IdentityName {
    IdentityName::new(n).unwrap()
}

// ── POST /api/v1/enroll ──────────────────────────────────────────────

#[tokio::test]
async fn enroll_sends_basic_auth_and_decodes_certificate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/enroll"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "success": true,
            "result": { "Cert": B64.encode(PEM) },
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let enrollment = client(&server)
        .enroll(&name("admin"), &EnrollmentSecret::new("adminpw"))
        .await
        .unwrap();
    assert_eq!(enrollment.certificate, PEM);
    assert!(IdentityKey::from_hex(&enrollment.private_key).is_ok());

    let requests = server.received_requests().await.unwrap();
    let auth = requests[0].headers.get("authorization").unwrap().to_str().unwrap();
    assert_eq!(auth, format!("Basic {}", B64.encode("admin:adminpw")));
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["caname"], "ca-org1");
    assert!(body["public_key"].as_str().is_some());
}

#[tokio::test]
async fn enroll_401_is_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/enroll"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "success": false,
            "result": null,
            "errors": [{ "code": 20, "message": "Authentication failure" }]
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .enroll(&name("alice"), &EnrollmentSecret::new("used"))
        .await
        .unwrap_err();
    match err {
        CaError::AuthFailure { name, message } => {
            assert_eq!(name, "alice");
            assert!(message.contains("Authentication failure"));
        }
        other => panic!("expected AuthFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn enroll_is_not_retried_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/enroll"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .enroll(&name("alice"), &EnrollmentSecret::new("s"))
        .await
        .unwrap_err();
    assert!(matches!(err, CaError::Rejected { status: 500, .. }));
}

// ── POST /api/v1/register ────────────────────────────────────────────

#[tokio::test]
async fn register_signs_request_and_returns_secret() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "success": true,
            "result": { "secret": "s3cr3t" },
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let secret = client(&server)
        .register(
            &RegistrationRequest::client(name("alice"), "org1.department1"),
            &registrar(),
        )
        .await
        .unwrap();
    assert_eq!(secret.expose(), "s3cr3t");

    let requests = server.received_requests().await.unwrap();
    let token = requests[0].headers.get("authorization").unwrap().to_str().unwrap();
    let (cert_b64, _sig) = token.split_once('.').unwrap();
    assert_eq!(B64.decode(cert_b64).unwrap(), PEM.as_bytes());
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["id"], "alice");
    assert_eq!(body["type"], "client");
    assert_eq!(body["affiliation"], "org1.department1");
}

#[tokio::test]
async fn register_403_is_permission_denied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/register"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "success": false,
            "result": null,
            "errors": [{ "code": 71, "message": "Authorization failure" }]
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .register(&RegistrationRequest::client(name("bob"), "org1.department1"), &registrar())
        .await
        .unwrap_err();
    assert!(matches!(err, CaError::PermissionDenied { .. }));
}

#[tokio::test]
async fn register_duplicate_is_already_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/register"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "success": false,
            "result": null,
            "errors": [{ "code": 74, "message": "Identity 'bob' is already registered" }]
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .register(&RegistrationRequest::client(name("bob"), "org1.department1"), &registrar())
        .await
        .unwrap_err();
    assert!(matches!(err, CaError::AlreadyExists { ref name } if name == "bob"));
}
