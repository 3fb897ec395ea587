//! # Credential Store (Wallet)
//!
//! Persistent mapping from identity name to [`Credential`], scoped per
//! organization. [`CredentialStore::get`] returns `Ok(None)` for an identity
//! that was never enrolled; that is a normal condition callers branch on.
//!
//! There is no concurrency control across processes: two writers to the
//! same identity race and the last write wins. Each write lands in a
//! temporary file beside the target and is renamed over it, so a reader
//! never sees a half-written identity.

use std::collections::HashMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::credential::Credential;
use crate::error::WalletError;
use crate::identity::{IdentityName, OrgId};

const IDENTITY_FILE_EXTENSION: &str = "id";

/// Storage of enrolled identities for one organization.
pub trait CredentialStore: Send + Sync {
    /// Look up the credential for `name`. `Ok(None)` means "not enrolled".
    fn get(&self, name: &IdentityName) -> Result<Option<Credential>, WalletError>;

    /// Store `credential` under `name`, replacing any previous entry.
    fn put(&self, name: &IdentityName, credential: &Credential) -> Result<(), WalletError>;

    /// Names of all stored identities, sorted.
    fn list(&self) -> Result<Vec<IdentityName>, WalletError>;

    /// Whether `name` has a stored credential.
    fn contains(&self, name: &IdentityName) -> Result<bool, WalletError> {
        Ok(self.get(name)?.is_some())
    }
}

/// Opens the credential store of an organization.
pub trait WalletProvider: Send + Sync {
    /// Open (creating if needed) the store for `org`.
    fn open(&self, org: &OrgId) -> Result<Arc<dyn CredentialStore>, WalletError>;
}

// -- Filesystem ---------------------------------------------------------------

/// One JSON identity document per file: `{dir}/{name}.id`.
#[derive(Debug, Clone)]
pub struct FileSystemWallet {
    dir: PathBuf,
}

impl FileSystemWallet {
    /// Use `dir` as the wallet directory. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The wallet directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &IdentityName) -> PathBuf {
        self.dir
            .join(format!("{}.{IDENTITY_FILE_EXTENSION}", name.as_str()))
    }
}

impl CredentialStore for FileSystemWallet {
    fn get(&self, name: &IdentityName) -> Result<Option<Credential>, WalletError> {
        let path = self.path_for(name);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(WalletError::Io { path, source }),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| WalletError::Corrupt { path, source })
    }

    fn put(&self, name: &IdentityName, credential: &Credential) -> Result<(), WalletError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| WalletError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(name);
        let json = serde_json::to_string(credential).map_err(|source| WalletError::Corrupt {
            path: path.clone(),
            source,
        })?;
        let io_err = |source: std::io::Error| WalletError::Io {
            path: path.clone(),
            source,
        };
        let mut staged = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        staged.write_all(json.as_bytes()).map_err(io_err)?;
        staged.as_file().sync_all().map_err(io_err)?;
        staged.persist(&path).map_err(|e| io_err(e.error))?;
        tracing::debug!(identity = %name, path = %path.display(), "identity written to wallet");
        Ok(())
    }

    fn list(&self) -> Result<Vec<IdentityName>, WalletError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(WalletError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| WalletError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(IDENTITY_FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                match IdentityName::new(stem) {
                    Ok(name) => names.push(name),
                    Err(e) => tracing::warn!(path = %path.display(), "skipping wallet entry: {e}"),
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Filesystem wallets rooted at one directory: `{root}/{org}/`.
#[derive(Debug, Clone)]
pub struct FileSystemWallets {
    root: PathBuf,
}

impl FileSystemWallets {
    /// Use `root` as the parent of all per-organization wallet directories.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl WalletProvider for FileSystemWallets {
    fn open(&self, org: &OrgId) -> Result<Arc<dyn CredentialStore>, WalletError> {
        Ok(Arc::new(FileSystemWallet::new(self.root.join(org.as_str()))))
    }
}

// -- In-memory ----------------------------------------------------------------

/// Thread-safe, cloneable in-memory wallet. All clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWallet {
    data: Arc<RwLock<HashMap<IdentityName, Credential>>>,
}

impl InMemoryWallet {
    /// Create an empty wallet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the wallet is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for InMemoryWallet {
    fn get(&self, name: &IdentityName) -> Result<Option<Credential>, WalletError> {
        Ok(self.data.read().get(name).cloned())
    }

    fn put(&self, name: &IdentityName, credential: &Credential) -> Result<(), WalletError> {
        self.data.write().insert(name.clone(), credential.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<IdentityName>, WalletError> {
        let mut names: Vec<_> = self.data.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// In-memory wallets keyed by organization, created on first open.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWallets {
    wallets: Arc<RwLock<HashMap<OrgId, InMemoryWallet>>>,
}

impl InMemoryWallets {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct access to one organization's wallet.
    pub fn wallet(&self, org: &OrgId) -> InMemoryWallet {
        self.wallets.write().entry(org.clone()).or_default().clone()
    }
}

impl WalletProvider for InMemoryWallets {
    fn open(&self, org: &OrgId) -> Result<Arc<dyn CredentialStore>, WalletError> {
        Ok(Arc::new(self.wallet(org)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MspId;

    fn credential(cert: &str) -> Credential {
        Credential::x509(cert, "00ff", MspId::new("Org1MSP").unwrap())
    }

    fn name(n: &str) -> IdentityName {
        IdentityName::new(n).unwrap()
    }

    #[test]
    fn filesystem_get_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = FileSystemWallet::new(dir.path().join("org1"));
        assert!(wallet.get(&name("admin")).unwrap().is_none());
        assert!(wallet.list().unwrap().is_empty());
    }

    #[test]
    fn filesystem_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = FileSystemWallet::new(dir.path().join("org1"));
        wallet.put(&name("alice"), &credential("cert-a")).unwrap();

        let loaded = wallet.get(&name("alice")).unwrap().unwrap();
        assert_eq!(loaded.certificate(), "cert-a");
        assert!(dir.path().join("org1").join("alice.id").exists());
        assert_eq!(wallet.list().unwrap(), vec![name("alice")]);
    }

    #[test]
    fn filesystem_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = FileSystemWallet::new(dir.path());
        wallet.put(&name("bob"), &credential("first")).unwrap();
        wallet.put(&name("bob"), &credential("second")).unwrap();
        assert_eq!(wallet.get(&name("bob")).unwrap().unwrap().certificate(), "second");
        assert_eq!(wallet.list().unwrap().len(), 1);
    }

    #[test]
    fn filesystem_put_leaves_only_the_identity_file() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = FileSystemWallet::new(dir.path());
        wallet.put(&name("carol"), &credential("one")).unwrap();
        wallet.put(&name("carol"), &credential("two")).unwrap();

        let files: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, ["carol.id"]);
        assert_eq!(wallet.get(&name("carol")).unwrap().unwrap().certificate(), "two");
    }

    #[test]
    fn filesystem_corrupt_entry_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.id"), "not json").unwrap();
        let wallet = FileSystemWallet::new(dir.path());
        let err = wallet.get(&name("broken")).unwrap_err();
        assert!(matches!(err, WalletError::Corrupt { .. }));
    }

    #[test]
    fn filesystem_wallets_are_scoped_per_org() {
        let dir = tempfile::tempdir().unwrap();
        let wallets = FileSystemWallets::new(dir.path());
        let org1 = wallets.open(&OrgId::new("org1").unwrap()).unwrap();
        let org2 = wallets.open(&OrgId::new("org2").unwrap()).unwrap();
        org1.put(&name("admin"), &credential("org1-admin")).unwrap();
        assert!(org1.contains(&name("admin")).unwrap());
        assert!(!org2.contains(&name("admin")).unwrap());
    }

    #[test]
    fn in_memory_wallets_share_state_across_opens() {
        let wallets = InMemoryWallets::new();
        let org = OrgId::new("org1").unwrap();
        wallets.open(&org).unwrap().put(&name("carol"), &credential("c")).unwrap();
        assert!(wallets.open(&org).unwrap().get(&name("carol")).unwrap().is_some());
        assert_eq!(wallets.wallet(&org).len(), 1);
    }
}
