//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the names that flow between the wallet,
//! the certificate authority and the ledger gateway. An [`OrgId`] cannot be
//! passed where an [`IdentityName`] is expected.
//!
//! ## Validation
//!
//! - [`IdentityName`]: 1-64 characters, no path separators, no control
//!   characters, not `.` or `..`. The name doubles as a wallet file stem.
//! - [`OrgId`]: 1-32 lowercase ASCII alphanumerics (`org1`, `org2`).
//! - [`MspId`]: non-empty, no whitespace (`Org1MSP`).

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MAX_IDENTITY_LEN: usize = 64;
const MAX_ORG_LEN: usize = 32;

/// Name of an identity, unique within one organization's wallet and CA.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityName(String);

impl IdentityName {
    /// Validate and wrap an identity name.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name.chars().count() <= MAX_IDENTITY_LEN
            && name != "."
            && name != ".."
            && !name
                .chars()
                .any(|c| c == '/' || c == '\\' || c.is_control());
        if valid {
            Ok(Self(name))
        } else {
            Err(ValidationError::InvalidIdentityName(name))
        }
    }

    /// Access the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl IdentityName {
    /// Wrap a built-in constant without validation. Callers guarantee validity.
    pub(crate) fn from_static(value: &'static str) -> Self {
        Self(value.to_string())
    }
}

impl TryFrom<String> for IdentityName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IdentityName> for String {
    fn from(value: IdentityName) -> Self {
        value.0
    }
}

impl std::fmt::Display for IdentityName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Organization key used to select wallets, profiles and CA hosts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrgId(String);

impl OrgId {
    /// Validate and wrap an organization key.
    ///
    /// Mixed-case input such as `Org1` is normalized to lowercase.
    pub fn new(org: impl Into<String>) -> Result<Self, ValidationError> {
        let org = org.into();
        let normalized = org.to_ascii_lowercase();
        let valid = !normalized.is_empty()
            && normalized.len() <= MAX_ORG_LEN
            && normalized
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if valid {
            Ok(Self(normalized))
        } else {
            Err(ValidationError::InvalidOrg(org))
        }
    }

    /// Access the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Default CA host name for this organization (`ca.{org}.example.com`).
    pub fn default_ca_host(&self) -> String {
        format!("ca.{}.example.com", self.0)
    }

    /// Default affiliation for users registered in this organization.
    pub fn default_affiliation(&self) -> String {
        format!("{}.department1", self.0)
    }
}

impl OrgId {
    /// Wrap a built-in constant without validation. Callers guarantee validity.
    pub(crate) fn from_static(value: &'static str) -> Self {
        Self(value.to_string())
    }
}

impl TryFrom<String> for OrgId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OrgId> for String {
    fn from(value: OrgId) -> Self {
        value.0
    }
}

impl std::fmt::Display for OrgId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Membership-service-provider identifier tagging the issuing organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MspId(String);

impl MspId {
    /// Validate and wrap an MSP identifier.
    pub fn new(msp: impl Into<String>) -> Result<Self, ValidationError> {
        let msp = msp.into();
        if msp.is_empty() || msp.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidMspId(msp));
        }
        Ok(Self(msp))
    }

    /// Access the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl MspId {
    /// Wrap a built-in constant without validation. Callers guarantee validity.
    pub(crate) fn from_static(value: &'static str) -> Self {
        Self(value.to_string())
    }
}

impl TryFrom<String> for MspId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MspId> for String {
    fn from(value: MspId) -> Self {
        value.0
    }
}

impl std::fmt::Display for MspId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identity_name_accepts_plain_names() {
        assert_eq!(IdentityName::new("admin").unwrap().as_str(), "admin");
        assert_eq!(IdentityName::new("alice.dev-01").unwrap().as_str(), "alice.dev-01");
    }

    #[test]
    fn identity_name_rejects_path_traversal() {
        assert!(IdentityName::new("..").is_err());
        assert!(IdentityName::new("../admin").is_err());
        assert!(IdentityName::new("a\\b").is_err());
        assert!(IdentityName::new("").is_err());
        assert!(IdentityName::new("line\nbreak").is_err());
    }

    #[test]
    fn identity_name_rejects_overlong() {
        assert!(IdentityName::new("x".repeat(64)).is_ok());
        assert!(IdentityName::new("x".repeat(65)).is_err());
    }

    #[test]
    fn org_id_normalizes_case() {
        assert_eq!(OrgId::new("Org1").unwrap().as_str(), "org1");
        assert!(OrgId::new("org-1").is_err());
        assert!(OrgId::new("").is_err());
    }

    #[test]
    fn org_id_derived_names() {
        let org = OrgId::new("org2").unwrap();
        assert_eq!(org.default_ca_host(), "ca.org2.example.com");
        assert_eq!(org.default_affiliation(), "org2.department1");
    }

    #[test]
    fn msp_id_rejects_whitespace() {
        assert!(MspId::new("Org1MSP").is_ok());
        assert!(MspId::new("Org1 MSP").is_err());
        assert!(MspId::new("").is_err());
    }

    #[test]
    fn serde_rejects_invalid_identity_name() {
        let ok: Result<IdentityName, _> = serde_json::from_str("\"bob\"");
        assert!(ok.is_ok());
        let bad: Result<IdentityName, _> = serde_json::from_str("\"a/b\"");
        assert!(bad.is_err());
    }

    proptest! {
        #[test]
        fn valid_identity_names_never_contain_separators(name in "\\PC{1,64}") {
            if let Ok(id) = IdentityName::new(name) {
                prop_assert!(!id.as_str().contains('/'));
                prop_assert!(!id.as_str().contains('\\'));
                prop_assert!(id.as_str() != "..");
            }
        }

        #[test]
        fn org_ids_are_always_lowercase(org in "[A-Za-z0-9]{1,32}") {
            let id = OrgId::new(org).unwrap();
            prop_assert_eq!(id.as_str(), id.as_str().to_ascii_lowercase());
        }
    }
}
