//! # Connection Profiles
//!
//! Per-organization network topology descriptors: which peers and which
//! certificate authorities the organization's clients talk to, and the TLS
//! trust roots for each. Profiles are read-only and loaded from
//! `connection-{org}.json` under the configured connection directory.
//!
//! ## Discovery
//!
//! Peer endpoints can be resolved "as localhost": the host part of each
//! declared URL is replaced by `localhost` while the port is kept. This is
//! how a network deployed in local containers is reached from the host; it
//! is not a general discovery mechanism.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::identity::{MspId, OrgId};

/// One or many PEM documents. Profiles use both shapes interchangeably.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PemBundle {
    One(String),
    Many(Vec<String>),
}

impl PemBundle {
    fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(pem) => vec![pem.clone()],
            Self::Many(pems) => pems.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TlsCaCerts {
    pem: PemBundle,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HttpOptions {
    #[serde(default = "default_verify")]
    verify: bool,
}

fn default_verify() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientSection {
    organization: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrganizationSection {
    mspid: String,
    #[serde(default)]
    peers: Vec<String>,
    #[serde(default)]
    certificate_authorities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeerSection {
    url: String,
    #[serde(default, rename = "tlsCACerts")]
    tls_ca_certs: Option<TlsCaCerts>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaSection {
    url: String,
    #[serde(default)]
    ca_name: Option<String>,
    #[serde(default, rename = "tlsCACerts")]
    tls_ca_certs: Option<TlsCaCerts>,
    #[serde(default)]
    http_options: Option<HttpOptions>,
}

/// Network topology for one organization, as declared in its connection profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProfile {
    /// Profile name, e.g. `test-network-org1`.
    pub name: String,
    client: ClientSection,
    organizations: BTreeMap<String, OrganizationSection>,
    #[serde(default)]
    peers: BTreeMap<String, PeerSection>,
    #[serde(default)]
    certificate_authorities: BTreeMap<String, CaSection>,
}

/// A resolved certificate authority endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaEndpoint {
    /// Host key under which the CA is declared (`ca.org1.example.com`).
    pub host: String,
    /// Base URL of the CA server.
    pub url: Url,
    /// CA instance name (`ca-org1`). Falls back to the host key.
    pub ca_name: String,
    /// PEM trust roots for the CA's TLS certificate.
    pub tls_ca_pems: Vec<String>,
    /// Whether the CA's TLS certificate is verified.
    pub verify_tls: bool,
}

/// A resolved peer endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEndpoint {
    /// Peer name as declared in the profile (`peer0.org1.example.com`).
    pub name: String,
    /// Endpoint URL after discovery rewriting.
    pub url: Url,
    /// PEM trust roots for the peer's TLS certificate.
    pub tls_ca_pems: Vec<String>,
}

impl ConnectionProfile {
    /// Parse a profile from its JSON text.
    pub fn from_json(path: &Path, json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::MalformedProfile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a profile from disk. A missing file is a [`ConfigError::MissingProfile`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingProfile(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let profile = Self::from_json(path, &contents)?;
        tracing::debug!(path = %path.display(), profile = %profile.name, "loaded network configuration");
        Ok(profile)
    }

    /// The organization name the client acts for (`Org1`).
    pub fn client_organization(&self) -> &str {
        &self.client.organization
    }

    fn client_org_section(&self) -> Result<&OrganizationSection, ConfigError> {
        self.organizations
            .get(&self.client.organization)
            .ok_or_else(|| ConfigError::UnknownOrganization(self.client.organization.clone()))
    }

    /// MSP tag of the client organization.
    pub fn msp_id(&self) -> Result<MspId, ConfigError> {
        let section = self.client_org_section()?;
        MspId::new(section.mspid.clone())
            .map_err(|e| ConfigError::Invalid("mspid".to_string(), e.to_string()))
    }

    /// Resolve the certificate authority declared under `host`.
    pub fn certificate_authority(&self, host: &str) -> Result<CaEndpoint, ConfigError> {
        let section = self
            .certificate_authorities
            .get(host)
            .ok_or_else(|| ConfigError::UnknownCertificateAuthority(host.to_string()))?;
        let url = Url::parse(&section.url)
            .map_err(|e| ConfigError::InvalidUrl(host.to_string(), e.to_string()))?;
        Ok(CaEndpoint {
            host: host.to_string(),
            url,
            ca_name: section.ca_name.clone().unwrap_or_else(|| host.to_string()),
            tls_ca_pems: section
                .tls_ca_certs
                .as_ref()
                .map(|t| t.pem.to_vec())
                .unwrap_or_default(),
            verify_tls: section.http_options.as_ref().map_or(true, |o| o.verify),
        })
    }

    /// Resolve the peers of the client organization.
    ///
    /// With `as_localhost`, each peer host is rewritten to `localhost`.
    /// Returns [`ConfigError::NoPeers`] when nothing is reachable.
    pub fn client_peers(&self, as_localhost: bool) -> Result<Vec<PeerEndpoint>, ConfigError> {
        let section = self.client_org_section()?;
        let mut endpoints = Vec::with_capacity(section.peers.len());
        for name in &section.peers {
            let Some(peer) = self.peers.get(name) else {
                tracing::warn!(peer = %name, "peer listed for organization but not declared");
                continue;
            };
            let mut url = Url::parse(&peer.url)
                .map_err(|e| ConfigError::InvalidUrl(name.clone(), e.to_string()))?;
            if as_localhost {
                url.set_host(Some("localhost"))
                    .map_err(|e| ConfigError::InvalidUrl(name.clone(), e.to_string()))?;
            }
            endpoints.push(PeerEndpoint {
                name: name.clone(),
                url,
                tls_ca_pems: peer
                    .tls_ca_certs
                    .as_ref()
                    .map(|t| t.pem.to_vec())
                    .unwrap_or_default(),
            });
        }
        if endpoints.is_empty() {
            return Err(ConfigError::NoPeers(self.client.organization.clone()));
        }
        Ok(endpoints)
    }
}

/// Source of connection profiles, keyed by organization.
pub trait ProfileSource: Send + Sync {
    /// Load the profile for `org`.
    fn load(&self, org: &OrgId) -> Result<ConnectionProfile, ConfigError>;
}

/// Profiles stored as `connection-{org}.json` in one directory.
#[derive(Debug, Clone)]
pub struct DirectoryProfiles {
    dir: PathBuf,
}

impl DirectoryProfiles {
    /// Read profiles from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the profile file for `org`.
    pub fn path_for(&self, org: &OrgId) -> PathBuf {
        self.dir.join(format!("connection-{org}.json"))
    }
}

impl ProfileSource for DirectoryProfiles {
    fn load(&self, org: &OrgId) -> Result<ConnectionProfile, ConfigError> {
        ConnectionProfile::load(&self.path_for(org))
    }
}

/// Profiles held in memory. Used by tests and embedded deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticProfiles {
    profiles: HashMap<OrgId, ConnectionProfile>,
}

impl StaticProfiles {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the profile for `org`.
    pub fn with(mut self, org: OrgId, profile: ConnectionProfile) -> Self {
        self.profiles.insert(org, profile);
        self
    }
}

impl ProfileSource for StaticProfiles {
    fn load(&self, org: &OrgId) -> Result<ConnectionProfile, ConfigError> {
        self.profiles
            .get(org)
            .cloned()
            .ok_or_else(|| ConfigError::MissingProfile(PathBuf::from(format!("connection-{org}.json"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"{
        "name": "test-network-org1",
        "version": "1.0.0",
        "client": { "organization": "Org1" },
        "organizations": {
            "Org1": {
                "mspid": "Org1MSP",
                "peers": ["peer0.org1.example.com"],
                "certificateAuthorities": ["ca.org1.example.com"]
            }
        },
        "peers": {
            "peer0.org1.example.com": {
                "url": "https://peer0.org1.example.com:7051",
                "tlsCACerts": { "pem": "-----BEGIN CERTIFICATE-----\npeer\n-----END CERTIFICATE-----\n" }
            }
        },
        "certificateAuthorities": {
            "ca.org1.example.com": {
                "url": "https://localhost:7054",
                "caName": "ca-org1",
                "tlsCACerts": { "pem": ["-----BEGIN CERTIFICATE-----\nca\n-----END CERTIFICATE-----\n"] },
                "httpOptions": { "verify": false }
            }
        }
    }"#;

    fn profile() -> ConnectionProfile {
        ConnectionProfile::from_json(Path::new("inline.json"), PROFILE).unwrap()
    }

    #[test]
    fn resolves_client_msp() {
        assert_eq!(profile().msp_id().unwrap().as_str(), "Org1MSP");
        assert_eq!(profile().client_organization(), "Org1");
    }

    #[test]
    fn resolves_certificate_authority() {
        let ca = profile().certificate_authority("ca.org1.example.com").unwrap();
        assert_eq!(ca.ca_name, "ca-org1");
        assert_eq!(ca.url.as_str(), "https://localhost:7054/");
        assert_eq!(ca.tls_ca_pems.len(), 1);
        assert!(!ca.verify_tls);
    }

    #[test]
    fn unknown_certificate_authority_is_config_error() {
        let err = profile().certificate_authority("ca.org9.example.com").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCertificateAuthority(_)));
    }

    #[test]
    fn peers_rewritten_as_localhost() {
        let peers = profile().client_peers(true).unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].url.host_str(), Some("localhost"));
        assert_eq!(peers[0].url.port(), Some(7051));
    }

    #[test]
    fn peer_tls_roots_are_loaded() {
        let peers = profile().client_peers(false).unwrap();
        assert_eq!(peers[0].tls_ca_pems.len(), 1);
        assert!(peers[0].tls_ca_pems[0].contains("peer"));
    }

    #[test]
    fn tls_roots_survive_a_serialize_round_trip() {
        let json = serde_json::to_string(&profile()).unwrap();
        assert!(json.contains("tlsCACerts"));
        let reparsed = ConnectionProfile::from_json(Path::new("again.json"), &json).unwrap();
        let ca = reparsed.certificate_authority("ca.org1.example.com").unwrap();
        assert_eq!(ca.tls_ca_pems.len(), 1);
    }

    #[test]
    fn peers_kept_verbatim_without_localhost() {
        let peers = profile().client_peers(false).unwrap();
        assert_eq!(peers[0].url.host_str(), Some("peer0.org1.example.com"));
    }

    #[test]
    fn missing_profile_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectoryProfiles::new(dir.path());
        let err = source.load(&OrgId::new("org1").unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingProfile(_)));
    }

    #[test]
    fn directory_profiles_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("connection-org1.json"), PROFILE).unwrap();
        let source = DirectoryProfiles::new(dir.path());
        let loaded = source.load(&OrgId::new("org1").unwrap()).unwrap();
        assert_eq!(loaded.name, "test-network-org1");
    }

    #[test]
    fn malformed_profile_is_reported() {
        let err = ConnectionProfile::from_json(Path::new("bad.json"), "{not json").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedProfile { .. }));
    }
}
