//! Wallet session persistence and teardown
//!
//! The wallet layer owns a fixed list of storage keys. Remembering a wallet
//! writes some of them; forgetting removes all of them and runs the vendor
//! forget hooks, so the next start does not silently reconnect.

use crate::{error::SessionError, signing_service::{WalletConnection, WalletSigner}};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    io::ErrorKind,
    path::PathBuf,
    sync::Arc,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageScope {
    /// Survives restarts
    Local,
    /// Lives as long as the process
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionKey {
    pub scope: StorageScope,
    pub key: &'static str,
}

pub const WALLET_NAME_KEY: &str = "walletName";
pub const KEYPAIR_PATH_KEY: &str = "walletKeypairPath";
pub const PUBLIC_KEY_KEY: &str = "walletPublicKey";
pub const AUTO_CONNECT_KEY: &str = "walletAutoConnect";
pub const CONNECTED_KEY: &str = "walletConnected";

/// Every key the wallet layer may write
pub const KNOWN_SESSION_KEYS: &[SessionKey] = &[
    SessionKey { scope: StorageScope::Local, key: WALLET_NAME_KEY },
    SessionKey { scope: StorageScope::Local, key: KEYPAIR_PATH_KEY },
    SessionKey { scope: StorageScope::Local, key: PUBLIC_KEY_KEY },
    SessionKey { scope: StorageScope::Local, key: AUTO_CONNECT_KEY },
    SessionKey { scope: StorageScope::Session, key: CONNECTED_KEY },
];

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>, SessionError>;

    async fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<(), SessionError>;

    /// Remove a key, returning whether it was present
    async fn remove(&self, scope: StorageScope, key: &str) -> Result<bool, SessionError>;
}

/// Vendor specific "forget this connection" hook
#[async_trait]
pub trait ForgetConnection: Send + Sync {
    fn vendor(&self) -> &str;

    async fn forget(&self) -> Result<(), SessionError>;
}

/// Wallet remembered from an earlier run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RememberedWallet {
    pub name: String,
    pub keypair_path: Option<String>,
    pub pubkey: Option<String>,
    pub auto_connect: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub disconnected: bool,
    pub keys_removed: usize,
    /// Steps that failed; logged and otherwise ignored
    pub failures: Vec<String>,
}

pub struct WalletSession {
    store: Arc<dyn SessionStore>,
    connection: Arc<WalletConnection>,
    hooks: Vec<Arc<dyn ForgetConnection>>,
}

impl WalletSession {
    pub fn new(store: Arc<dyn SessionStore>, connection: Arc<WalletConnection>) -> Self {
        Self {
            store,
            connection,
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn ForgetConnection>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn connection(&self) -> &Arc<WalletConnection> {
        &self.connection
    }

    /// Persist the wallet so the next run can reconnect to it
    pub async fn remember(
        &self,
        signer: &dyn WalletSigner,
        keypair_path: Option<&str>,
    ) -> Result<(), SessionError> {
        self.store
            .set(StorageScope::Local, WALLET_NAME_KEY, signer.name())
            .await?;
        self.store
            .set(StorageScope::Local, PUBLIC_KEY_KEY, &signer.pubkey().to_string())
            .await?;
        if let Some(path) = keypair_path {
            self.store
                .set(StorageScope::Local, KEYPAIR_PATH_KEY, path)
                .await?;
        }
        self.store
            .set(StorageScope::Local, AUTO_CONNECT_KEY, "true")
            .await?;
        self.store
            .set(StorageScope::Session, CONNECTED_KEY, "true")
            .await?;

        info!("Remembered wallet {}", signer.name());
        Ok(())
    }

    pub async fn remembered(&self) -> Result<Option<RememberedWallet>, SessionError> {
        let Some(name) = self.store.get(StorageScope::Local, WALLET_NAME_KEY).await? else {
            return Ok(None);
        };

        Ok(Some(RememberedWallet {
            name,
            keypair_path: self.store.get(StorageScope::Local, KEYPAIR_PATH_KEY).await?,
            pubkey: self.store.get(StorageScope::Local, PUBLIC_KEY_KEY).await?,
            auto_connect: self
                .store
                .get(StorageScope::Local, AUTO_CONNECT_KEY)
                .await?
                .is_some_and(|value| value == "true"),
        }))
    }

    /// Disconnect and erase every trace of the wallet session. Never fails;
    /// problems are logged and listed in the report.
    pub async fn forget(&self) -> TeardownReport {
        let mut report = TeardownReport {
            disconnected: self.connection.disconnect().await,
            ..TeardownReport::default()
        };

        for entry in KNOWN_SESSION_KEYS {
            match self.store.remove(entry.scope, entry.key).await {
                Ok(true) => {
                    debug!("Removed session key {}", entry.key);
                    report.keys_removed += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("Failed to remove session key {}: {}", entry.key, e);
                    report.failures.push(format!("{}: {e}", entry.key));
                }
            }
        }

        for hook in &self.hooks {
            if let Err(e) = hook.forget().await {
                warn!("Forget hook {} failed: {}", hook.vendor(), e);
                report.failures.push(format!("{}: {e}", hook.vendor()));
            }
        }

        info!(
            "Wallet session forgotten ({} keys removed, {} failures)",
            report.keys_removed,
            report.failures.len()
        );
        report
    }
}

/// Session store kept in memory
#[derive(Default)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<(StorageScope, String), String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries.read().await.get(&(scope, key.to_string())).cloned())
    }

    async fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries
            .write()
            .await
            .insert((scope, key.to_string()), value.to_string());
        Ok(())
    }

    async fn remove(&self, scope: StorageScope, key: &str) -> Result<bool, SessionError> {
        Ok(self
            .entries
            .write()
            .await
            .remove(&(scope, key.to_string()))
            .is_some())
    }
}

/// Session store with local keys in a JSON file and session keys in memory
pub struct FileSessionStore {
    path: PathBuf,
    local: RwLock<()>,
    session: RwLock<HashMap<String, String>>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            local: RwLock::new(()),
            session: RwLock::new(HashMap::new()),
        }
    }

    async fn read_local(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_local(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if entries.is_empty() {
            return match tokio::fs::remove_file(&self.path).await {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(entries)?).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>, SessionError> {
        match scope {
            StorageScope::Local => {
                let _guard = self.local.read().await;
                Ok(self.read_local().await?.get(key).cloned())
            }
            StorageScope::Session => Ok(self.session.read().await.get(key).cloned()),
        }
    }

    async fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<(), SessionError> {
        match scope {
            StorageScope::Local => {
                let _guard = self.local.write().await;
                let mut entries = self.read_local().await?;
                entries.insert(key.to_string(), value.to_string());
                self.write_local(&entries).await
            }
            StorageScope::Session => {
                self.session
                    .write()
                    .await
                    .insert(key.to_string(), value.to_string());
                Ok(())
            }
        }
    }

    async fn remove(&self, scope: StorageScope, key: &str) -> Result<bool, SessionError> {
        match scope {
            StorageScope::Local => {
                let _guard = self.local.write().await;
                let mut entries = self.read_local().await?;
                let removed = entries.remove(key).is_some();
                if removed {
                    self.write_local(&entries).await?;
                }
                Ok(removed)
            }
            StorageScope::Session => Ok(self.session.write().await.remove(key).is_some()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing_service::KeypairSigner;
    use solana_sdk::signature::Keypair;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let store = FileSessionStore::new(&path);

        store
            .set(StorageScope::Local, WALLET_NAME_KEY, "local")
            .await
            .unwrap();
        assert!(path.exists());

        // A second store on the same file sees local keys only
        let reopened = FileSessionStore::new(&path);
        store
            .set(StorageScope::Session, CONNECTED_KEY, "true")
            .await
            .unwrap();
        assert_eq!(
            reopened.get(StorageScope::Local, WALLET_NAME_KEY).await.unwrap(),
            Some("local".to_string())
        );
        assert_eq!(
            reopened.get(StorageScope::Session, CONNECTED_KEY).await.unwrap(),
            None
        );

        assert!(store.remove(StorageScope::Local, WALLET_NAME_KEY).await.unwrap());
        assert!(!store.remove(StorageScope::Local, WALLET_NAME_KEY).await.unwrap());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = FileSessionStore::new(&path);
        let err = store.get(StorageScope::Local, WALLET_NAME_KEY).await.unwrap_err();
        assert!(matches!(err, SessionError::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_remember_and_recall() {
        let store = Arc::new(InMemorySessionStore::new());
        let session = WalletSession::new(store.clone(), Arc::new(WalletConnection::new()));
        let signer = KeypairSigner::new("local", Keypair::new());

        session
            .remember(&signer, Some("/tmp/id.json"))
            .await
            .unwrap();

        let remembered = session.remembered().await.unwrap().unwrap();
        assert_eq!(remembered.name, "local");
        assert_eq!(remembered.keypair_path.as_deref(), Some("/tmp/id.json"));
        assert_eq!(remembered.pubkey, Some(signer.pubkey().to_string()));
        assert!(remembered.auto_connect);
        assert_eq!(store.len().await, 5);
    }
}
