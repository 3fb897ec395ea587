//! Shared fixtures: default settings, in-memory wallets and profiles, mock CA and gateway.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use mlchain_core::{ConnectionProfile, IdentityName, InMemoryWallets, OrgId, Settings, StaticProfiles};
use mlchain_fabric::mock::{MockCaConnector, MockGateway};
use mlchain_workflow::Services;

pub struct Harness {
    pub services: Services,
    pub wallets: InMemoryWallets,
    pub gateway: MockGateway,
    pub cas: MockCaConnector,
}

pub fn org(id: &str) -> OrgId {
    OrgId::new(id).unwrap()
}

pub fn name(n: &str) -> IdentityName {
    IdentityName::new(n).unwrap()
}

pub fn profile(org_num: u8) -> ConnectionProfile {
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
            peer: { "url": format!("grpcs://localhost:{}", 7051 + 2000 * (u16::from(org_num) - 1)) }
        },
        "certificateAuthorities": {
            ca: {
                "url": format!("https://localhost:{}", 7054 + 1000 * (u16::from(org_num) - 1)),
                "caName": format!("ca-org{org_num}"),
                "httpOptions": { "verify": false }
            }
        }
    });
    ConnectionProfile::from_json(Path::new("inline.json"), &json.to_string()).unwrap()
}

pub fn harness() -> Harness {
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
    Harness {
        services,
        wallets,
        gateway,
        cas,
    }
}
