//! # Settings
//!
//! Explicit configuration passed to every component. Values come from three
//! layers, later layers overriding earlier ones:
//!
//! 1. Built-in defaults matching the two-organization local test network.
//! 2. An optional YAML file ([`Settings::from_yaml_file`]).
//! 3. `MLCHAIN_*` environment variables ([`Settings::apply_env`]).
//!
//! The admin bootstrap secret is held as an [`EnrollmentSecret`] and never
//! appears in `Debug` output.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::credential::EnrollmentSecret;
use crate::error::ConfigError;
use crate::identity::{IdentityName, MspId, OrgId};

const DEFAULT_CHANNEL: &str = "mychannel";
const DEFAULT_TOKEN_CHAINCODE: &str = "tokens";
const DEFAULT_MODEL_CHAINCODE: &str = "models";
const DEFAULT_ADMIN_ID: &str = "admin";
const DEFAULT_ADMIN_SECRET: &str = "adminpw";
const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api/";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_UPLOAD_PRICE: u64 = 100;
const DEFAULT_USAGE_PRICE: u64 = 5;

/// Per-organization identity and CA settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgSettings {
    /// Organization key (`org1`).
    pub id: OrgId,
    /// MSP tag stamped on credentials issued by this organization's CA.
    pub msp_id: MspId,
    /// Host key of the CA entry in the connection profile.
    pub ca_host: String,
    /// Affiliation given to users registered in this organization.
    pub affiliation: String,
}

impl OrgSettings {
    /// Settings following the test-network naming conventions for `id`.
    pub fn conventional(id: OrgId, msp_id: MspId) -> Self {
        Self {
            ca_host: id.default_ca_host(),
            affiliation: id.default_affiliation(),
            id,
            msp_id,
        }
    }
}

/// Peer discovery options applied when opening a gateway session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DiscoverySettings {
    /// Whether the gateway may use any declared peer of the organization.
    #[serde(default = "yes")]
    pub enabled: bool,
    /// Rewrite peer hosts to `localhost` (local container networks).
    #[serde(default = "yes")]
    pub as_localhost: bool,
}

fn yes() -> bool {
    true
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            as_localhost: true,
        }
    }
}

/// Prices installed on the token chaincode during admin bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PriceSettings {
    /// Tokens charged for registering a model.
    pub upload: u64,
    /// Tokens charged for one model execution.
    pub usage: u64,
}

impl Default for PriceSettings {
    fn default() -> Self {
        Self {
            upload: DEFAULT_UPLOAD_PRICE,
            usage: DEFAULT_USAGE_PRICE,
        }
    }
}

/// Complete runtime configuration.
#[derive(Clone)]
pub struct Settings {
    /// Ledger channel hosting both chaincodes.
    pub channel: String,
    /// Name of the token chaincode.
    pub token_chaincode: String,
    /// Name of the model-registry chaincode.
    pub model_chaincode: String,
    /// Identity name of each organization's CA bootstrap admin.
    pub admin_id: IdentityName,
    /// Enrollment secret of the CA bootstrap admin.
    pub admin_secret: EnrollmentSecret,
    /// Configured organizations.
    pub organizations: Vec<OrgSettings>,
    /// Directory holding `connection-{org}.json` profiles.
    pub connection_dir: PathBuf,
    /// Root of the per-organization wallet directories.
    pub wallet_dir: PathBuf,
    /// Peer discovery options.
    pub discovery: DiscoverySettings,
    /// Base URL of the REST gateway used by the CLI's read verbs.
    pub api_base_url: Url,
    /// Organization whose admin registers new users at the CA.
    pub registrar_org: OrgId,
    /// Organization whose admin operates the token chaincode.
    pub token_admin_org: OrgId,
    /// Organization whose admin reads the model registry.
    pub model_reader_org: OrgId,
    /// Organization of CLI users.
    pub client_org: OrgId,
    /// Prices installed at bootstrap.
    pub prices: PriceSettings,
    /// Transport timeout for CA and gateway requests.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("channel", &self.channel)
            .field("token_chaincode", &self.token_chaincode)
            .field("model_chaincode", &self.model_chaincode)
            .field("admin_id", &self.admin_id)
            .field("admin_secret", &"[REDACTED]")
            .field("organizations", &self.organizations)
            .field("connection_dir", &self.connection_dir)
            .field("wallet_dir", &self.wallet_dir)
            .field("discovery", &self.discovery)
            .field("api_base_url", &self.api_base_url.as_str())
            .field("registrar_org", &self.registrar_org)
            .field("token_admin_org", &self.token_admin_org)
            .field("model_reader_org", &self.model_reader_org)
            .field("client_org", &self.client_org)
            .field("prices", &self.prices)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// On-disk shape of the settings file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    channel: Option<String>,
    token_chaincode: Option<String>,
    model_chaincode: Option<String>,
    admin_id: Option<String>,
    admin_secret: Option<String>,
    organizations: Option<Vec<OrgEntry>>,
    connection_dir: Option<PathBuf>,
    wallet_dir: Option<PathBuf>,
    discovery: Option<DiscoverySettings>,
    api_base_url: Option<String>,
    registrar_org: Option<String>,
    token_admin_org: Option<String>,
    model_reader_org: Option<String>,
    client_org: Option<String>,
    prices: Option<PriceSettings>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OrgEntry {
    id: String,
    msp_id: String,
    ca_host: Option<String>,
    affiliation: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let org1 = OrgId::from_static("org1");
        let org2 = OrgId::from_static("org2");
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            token_chaincode: DEFAULT_TOKEN_CHAINCODE.to_string(),
            model_chaincode: DEFAULT_MODEL_CHAINCODE.to_string(),
            admin_id: IdentityName::from_static(DEFAULT_ADMIN_ID),
            admin_secret: EnrollmentSecret::new(DEFAULT_ADMIN_SECRET),
            organizations: vec![
                OrgSettings::conventional(org1.clone(), MspId::from_static("Org1MSP")),
                OrgSettings::conventional(org2.clone(), MspId::from_static("Org2MSP")),
            ],
            connection_dir: PathBuf::from("connection"),
            wallet_dir: PathBuf::from("wallet"),
            discovery: DiscoverySettings::default(),
            api_base_url: Url::parse(DEFAULT_API_BASE_URL)
                .expect("BUG: hardcoded DEFAULT_API_BASE_URL rejected by Url::parse"),
            registrar_org: org1.clone(),
            token_admin_org: org2,
            model_reader_org: org1.clone(),
            client_org: org1,
            prices: PriceSettings::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Load settings from a YAML file layered over the defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: SettingsFile =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::MalformedSettings {
                path: path.to_path_buf(),
                source,
            })?;
        let mut settings = Self::default();
        settings.merge(file)?;
        tracing::debug!(path = %path.display(), "loaded settings file");
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from an optional YAML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        settings.apply_env()?;
        Ok(settings)
    }

    /// Apply `MLCHAIN_*` environment variable overrides.
    ///
    /// Variables:
    /// - `MLCHAIN_CHANNEL`, `MLCHAIN_TOKEN_CHAINCODE`, `MLCHAIN_MODEL_CHAINCODE`
    /// - `MLCHAIN_ADMIN_ID`, `MLCHAIN_ADMIN_SECRET`
    /// - `MLCHAIN_CONNECTION_DIR`, `MLCHAIN_WALLET_DIR`
    /// - `MLCHAIN_API_URL`
    /// - `MLCHAIN_DISCOVERY_AS_LOCALHOST` (`true`/`false`)
    /// - `MLCHAIN_TIMEOUT_SECS`
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = var("MLCHAIN_CHANNEL") {
            self.channel = v;
        }
        if let Some(v) = var("MLCHAIN_TOKEN_CHAINCODE") {
            self.token_chaincode = v;
        }
        if let Some(v) = var("MLCHAIN_MODEL_CHAINCODE") {
            self.model_chaincode = v;
        }
        if let Some(v) = var("MLCHAIN_ADMIN_ID") {
            self.admin_id = IdentityName::new(v)
                .map_err(|e| ConfigError::Invalid("MLCHAIN_ADMIN_ID".to_string(), e.to_string()))?;
        }
        if let Some(v) = var("MLCHAIN_ADMIN_SECRET") {
            self.admin_secret = EnrollmentSecret::new(v);
        }
        if let Some(v) = var("MLCHAIN_CONNECTION_DIR") {
            self.connection_dir = PathBuf::from(v);
        }
        if let Some(v) = var("MLCHAIN_WALLET_DIR") {
            self.wallet_dir = PathBuf::from(v);
        }
        if let Some(v) = var("MLCHAIN_API_URL") {
            self.api_base_url = parse_base_url("MLCHAIN_API_URL", &v)?;
        }
        if let Some(v) = var("MLCHAIN_DISCOVERY_AS_LOCALHOST") {
            self.discovery.as_localhost = v.parse().map_err(|_| {
                ConfigError::Invalid("MLCHAIN_DISCOVERY_AS_LOCALHOST".to_string(), v.clone())
            })?;
        }
        if let Some(v) = var("MLCHAIN_TIMEOUT_SECS") {
            self.timeout_secs = v
                .parse()
                .map_err(|_| ConfigError::Invalid("MLCHAIN_TIMEOUT_SECS".to_string(), v.clone()))?;
        }
        self.validate()
    }

    fn merge(&mut self, file: SettingsFile) -> Result<(), ConfigError> {
        if let Some(v) = file.channel {
            self.channel = v;
        }
        if let Some(v) = file.token_chaincode {
            self.token_chaincode = v;
        }
        if let Some(v) = file.model_chaincode {
            self.model_chaincode = v;
        }
        if let Some(v) = file.admin_id {
            self.admin_id = IdentityName::new(v)
                .map_err(|e| ConfigError::Invalid("admin_id".to_string(), e.to_string()))?;
        }
        if let Some(v) = file.admin_secret {
            self.admin_secret = EnrollmentSecret::new(v);
        }
        if let Some(entries) = file.organizations {
            let mut orgs = Vec::with_capacity(entries.len());
            for entry in entries {
                let id = parse_org("organizations.id", &entry.id)?;
                let msp_id = MspId::new(entry.msp_id)
                    .map_err(|e| ConfigError::Invalid("organizations.msp_id".to_string(), e.to_string()))?;
                let mut org = OrgSettings::conventional(id, msp_id);
                if let Some(host) = entry.ca_host {
                    org.ca_host = host;
                }
                if let Some(affiliation) = entry.affiliation {
                    org.affiliation = affiliation;
                }
                orgs.push(org);
            }
            self.organizations = orgs;
        }
        if let Some(v) = file.connection_dir {
            self.connection_dir = v;
        }
        if let Some(v) = file.wallet_dir {
            self.wallet_dir = v;
        }
        if let Some(v) = file.discovery {
            self.discovery = v;
        }
        if let Some(v) = file.api_base_url {
            self.api_base_url = parse_base_url("api_base_url", &v)?;
        }
        if let Some(v) = file.registrar_org {
            self.registrar_org = parse_org("registrar_org", &v)?;
        }
        if let Some(v) = file.token_admin_org {
            self.token_admin_org = parse_org("token_admin_org", &v)?;
        }
        if let Some(v) = file.model_reader_org {
            self.model_reader_org = parse_org("model_reader_org", &v)?;
        }
        if let Some(v) = file.client_org {
            self.client_org = parse_org("client_org", &v)?;
        }
        if let Some(v) = file.prices {
            self.prices = v;
        }
        if let Some(v) = file.timeout_secs {
            self.timeout_secs = v;
        }
        Ok(())
    }

    /// Check cross-field consistency: every referenced organization is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel.is_empty() {
            return Err(ConfigError::Invalid("channel".to_string(), "empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs".to_string(), "0".to_string()));
        }
        for org in [
            &self.registrar_org,
            &self.token_admin_org,
            &self.model_reader_org,
            &self.client_org,
        ] {
            self.org(org)?;
        }
        Ok(())
    }

    /// Look up a configured organization.
    pub fn org(&self, id: &OrgId) -> Result<&OrgSettings, ConfigError> {
        self.organizations
            .iter()
            .find(|o| &o.id == id)
            .ok_or_else(|| ConfigError::UnknownOrganization(id.to_string()))
    }

    /// Transport timeout as a [`std::time::Duration`].
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

fn parse_org(field: &str, raw: &str) -> Result<OrgId, ConfigError> {
    OrgId::new(raw).map_err(|e| ConfigError::Invalid(field.to_string(), e.to_string()))
}

/// Parse a base URL, forcing a trailing slash so relative joins keep the path.
fn parse_base_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).map_err(|e| ConfigError::InvalidUrl(field.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_local_test_network() {
        let s = Settings::default();
        assert_eq!(s.channel, "mychannel");
        assert_eq!(s.token_chaincode, "tokens");
        assert_eq!(s.model_chaincode, "models");
        assert_eq!(s.admin_id.as_str(), "admin");
        assert_eq!(s.admin_secret.expose(), "adminpw");
        assert_eq!(s.api_base_url.as_str(), "http://localhost:5000/api/");
        assert_eq!(s.token_admin_org.as_str(), "org2");
        assert_eq!(s.registrar_org.as_str(), "org1");
        assert_eq!(s.prices, PriceSettings { upload: 100, usage: 5 });
        s.validate().unwrap();

        let org2 = s.org(&OrgId::new("org2").unwrap()).unwrap();
        assert_eq!(org2.msp_id.as_str(), "Org2MSP");
        assert_eq!(org2.ca_host, "ca.org2.example.com");
        assert_eq!(org2.affiliation, "org2.department1");
    }

    #[test]
    fn debug_redacts_admin_secret() {
        let rendered = format!("{:?}", Settings::default());
        assert!(!rendered.contains("adminpw"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn unknown_org_is_config_error() {
        let err = Settings::default()
            .org(&OrgId::new("org9").unwrap())
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOrganization(_)));
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mlchain.yaml");
        std::fs::write(
            &path,
            "channel: testchannel\n\
             api_base_url: http://gateway:8080/api\n\
             organizations:\n  - id: org1\n    msp_id: Org1MSP\n  - id: org2\n    msp_id: Org2MSP\n    ca_host: ca.custom\n\
             discovery:\n  enabled: true\n  as_localhost: false\n",
        )
        .unwrap();

        let s = Settings::from_yaml_file(&path).unwrap();
        assert_eq!(s.channel, "testchannel");
        assert_eq!(s.api_base_url.as_str(), "http://gateway:8080/api/");
        assert!(!s.discovery.as_localhost);
        assert_eq!(s.organizations[1].ca_host, "ca.custom");
        assert_eq!(s.organizations[1].affiliation, "org2.department1");
        assert_eq!(s.token_chaincode, "tokens");
    }

    #[test]
    fn yaml_file_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "chanel: typo\n").unwrap();
        let err = Settings::from_yaml_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedSettings { .. }));
    }

    #[test]
    fn yaml_referencing_missing_org_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one-org.yaml");
        std::fs::write(&path, "organizations:\n  - id: org1\n    msp_id: Org1MSP\n").unwrap();
        let err = Settings::from_yaml_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOrganization(ref o) if o == "org2"));
    }

    #[test]
    fn env_vars_override() {
        let vars: HashMap<&str, &str> = [
            ("MLCHAIN_CHANNEL", "envchannel"),
            ("MLCHAIN_ADMIN_SECRET", "s3cret"),
            ("MLCHAIN_TIMEOUT_SECS", "5"),
            ("MLCHAIN_DISCOVERY_AS_LOCALHOST", "false"),
        ]
        .into_iter()
        .collect();
        let mut s = Settings::default();
        s.apply_vars(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(s.channel, "envchannel");
        assert_eq!(s.admin_secret.expose(), "s3cret");
        assert_eq!(s.timeout_secs, 5);
        assert!(!s.discovery.as_localhost);
    }

    #[test]
    fn env_rejects_bad_timeout() {
        let mut s = Settings::default();
        let err = s
            .apply_vars(|k| (k == "MLCHAIN_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref k, _) if k == "MLCHAIN_TIMEOUT_SECS"));
    }
}
