//! Wallet signing capability
//!
//! The game never holds keys directly: transactions go through a
//! [`WalletSigner`], and the currently connected signer lives in a
//! [`WalletConnection`] that can be emptied on disconnect.

use crate::error::WalletError;
use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// A connected wallet able to sign transactions
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Wallet name shown to the player and remembered across runs
    fn name(&self) -> &str;

    fn pubkey(&self) -> Pubkey;

    /// Sign `transaction` with the wallet key. Declining to sign is reported
    /// as `SignerError::UserCancel`.
    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, WalletError>;
}

/// Signer backed by a local keypair file
pub struct KeypairSigner {
    name: String,
    keypair: Keypair,
}

impl KeypairSigner {
    pub fn new(name: impl Into<String>, keypair: Keypair) -> Self {
        Self {
            name: name.into(),
            keypair,
        }
    }
}

#[async_trait]
impl WalletSigner for KeypairSigner {
    fn name(&self) -> &str {
        &self.name
    }

    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(
        &self,
        mut transaction: Transaction,
    ) -> Result<Transaction, WalletError> {
        let blockhash = transaction.message.recent_blockhash;
        transaction.try_sign(&[&self.keypair], blockhash)?;
        Ok(transaction)
    }
}

/// Holder of the currently connected signer
#[derive(Default)]
pub struct WalletConnection {
    signer: RwLock<Option<Arc<dyn WalletSigner>>>,
}

impl WalletConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connected(signer: Arc<dyn WalletSigner>) -> Self {
        Self {
            signer: RwLock::new(Some(signer)),
        }
    }

    pub async fn connect(&self, signer: Arc<dyn WalletSigner>) {
        info!("Wallet {} connected as {}", signer.name(), signer.pubkey());
        *self.signer.write().await = Some(signer);
    }

    /// Drop the signer. Returns whether one was connected.
    pub async fn disconnect(&self) -> bool {
        let previous = self.signer.write().await.take();
        if let Some(signer) = &previous {
            info!("Wallet {} disconnected", signer.name());
        }
        previous.is_some()
    }

    pub async fn signer(&self) -> Option<Arc<dyn WalletSigner>> {
        self.signer.read().await.clone()
    }

    pub async fn owner(&self) -> Option<Pubkey> {
        self.signer.read().await.as_ref().map(|signer| signer.pubkey())
    }
}
