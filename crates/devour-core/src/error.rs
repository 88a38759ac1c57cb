//! Error types for Devour Evolve

use solana_sdk::{signature::Signature, signer::SignerError, transaction::TransactionError};
use thiserror::Error;

/// Failures talking to the Solana RPC node
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("RPC error: {0}")]
    Client(Box<solana_client::client_error::ClientError>),

    #[error("Transaction failed: {0}")]
    Transaction(TransactionError),

    #[error("Invalid account data for {address}: {reason}")]
    InvalidAccountData { address: String, reason: String },

    #[error("Confirmation timed out for {0}")]
    Timeout(Signature),

    #[error("Transaction building failed: {0}")]
    TransactionBuildError(String),
}

impl From<solana_client::client_error::ClientError> for RpcError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        // Preflight and simulation failures carry a typed transaction error
        match err.get_transaction_error() {
            Some(tx_err) => Self::Transaction(tx_err),
            None => Self::Client(Box::new(err)),
        }
    }
}

/// Failures of the metadata enrichment step. Never fatal to discovery.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Metadata service credentials are not configured")]
    MissingCredentials,

    #[error("Metadata request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Metadata service returned status {0}")]
    Status(u16),

    #[error("Metadata service error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Malformed metadata response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures of a discovery pass
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Failures of the wallet session store
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Forget hook `{vendor}` failed: {reason}")]
    Hook { vendor: String, reason: String },
}

/// Failures of the wallet signing capability
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("Signing failed: {0}")]
    Signer(#[from] SignerError),
}

pub type Result<T> = std::result::Result<T, RpcError>;
