//! Dispatcher wired to in-memory wallets, a mock ledger and a mock CA.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mlchain_cli::{dispatch, ApiClient, Dispatcher};
use mlchain_core::{
    ConnectionProfile, Credential, CredentialStore, IdentityName, InMemoryWallets, MspId, OrgId, Settings,
    StaticProfiles,
};
use mlchain_fabric::mock::{MockCaConnector, MockGateway};
use mlchain_workflow::Services;
use url::Url;

pub struct Harness {
    pub dispatcher: Dispatcher,
    pub services: Services,
    pub wallets: InMemoryWallets,
    pub gateway: MockGateway,
    pub cas: MockCaConnector,
}

pub struct Outcome {
    pub code: u8,
    pub stdout: String,
}

pub fn org(id: &str) -> OrgId {
    OrgId::new(id).unwrap()
}

pub fn name(n: &str) -> IdentityName {
    IdentityName::new(n).unwrap()
}

fn profile(org_num: u16) -> ConnectionProfile {
    let org_name = format!("Org{org_num}");
    let peer = format!("peer0.org{org_num}.example.com");
    let ca = format!("ca.org{org_num}.example.com");
    let json = serde_json::json!({
        "name": format!("test-network-org{org_num}"),
        "client": { "organization": org_name },
        "organizations": {
            org_name.clone(): {
                "mspid": format!("Org{org_num}MSP"),
                "peers": [peer.clone()],
                "certificateAuthorities": [ca.clone()]
            }
        },
        "peers": {
            peer: { "url": format!("grpcs://localhost:{}", 7051 + 2000 * (org_num - 1)) }
        },
        "certificateAuthorities": {
            ca: {
                "url": format!("https://localhost:{}", 7054 + 1000 * (org_num - 1)),
                "caName": format!("ca-org{org_num}")
            }
        }
    });
    ConnectionProfile::from_json(Path::new("inline.json"), &json.to_string()).unwrap()
}

/// Harness whose REST client points at `api_base` (a wiremock server, or an
/// unroutable address for tests that never reach it).
pub fn harness_with_api(api_base: &str) -> Harness {
    let settings = Settings::default();
    let wallets = InMemoryWallets::new();
    let gateway = MockGateway::new();
    let cas = MockCaConnector::new(settings.admin_id.clone(), settings.admin_secret.clone());
    let profiles = StaticProfiles::new()
        .with(org("org1"), profile(1))
        .with(org("org2"), profile(2));
    let services = Services::new(
        Arc::new(settings),
        Arc::new(profiles),
        Arc::new(wallets.clone()),
        Arc::new(gateway.clone()),
        Arc::new(cas.clone()),
    );
    let api = ApiClient::new(Url::parse(api_base).unwrap(), Duration::from_secs(5)).unwrap();
    Harness {
        dispatcher: Dispatcher::new(services.clone(), api),
        services,
        wallets,
        gateway,
        cas,
    }
}

pub fn harness() -> Harness {
    harness_with_api("http://127.0.0.1:9/api/")
}

impl Harness {
    /// Store a throwaway credential for `who` in `org_id`'s wallet.
    pub fn seed(&self, org_id: &str, who: &str) {
        let msp = if org_id == "org2" { "Org2MSP" } else { "Org1MSP" };
        let credential = Credential::x509("CERT", "00".repeat(32), MspId::new(msp).unwrap());
        self.wallets.wallet(&org(org_id)).put(&name(who), &credential).unwrap();
    }

    pub async fn run(&self, argv: &[&str]) -> Outcome {
        let (verb, rest) = match argv.split_first() {
            Some((verb, rest)) => (Some(*verb), rest),
            None => (None, argv),
        };
        let args: Vec<String> = rest.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        let code = dispatch(&self.dispatcher, verb, &args, &mut out).await;
        Outcome {
            code,
            stdout: String::from_utf8(out).unwrap(),
        }
    }
}
