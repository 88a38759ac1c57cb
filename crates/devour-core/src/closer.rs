//! Token account closing lifecycle
//!
//! Each attempt walks `Idle -> Building -> Submitted -> Confirming` and ends
//! in `Closed` or `Failed`. Failures are classified into a small set of
//! player-facing reasons; nothing is retried automatically.

use crate::{
    error::{RpcError, WalletError},
    messages::{Language, Message},
    rpc::TokenRpc,
    signing_service::WalletConnection,
    transaction_builder::{close_account_instruction, TransactionBuilder},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::InstructionError,
    pubkey::Pubkey,
    signature::Signature,
    signer::SignerError,
    transaction::TransactionError,
};
use spl_token::error::TokenError;
use std::{fmt, str::FromStr, sync::Arc};
use tracing::{debug, error, info, warn};

/// Phase of a closing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosePhase {
    Idle,
    Building,
    Submitted,
    Confirming,
    Closed,
    Failed,
}

impl fmt::Display for ClosePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClosePhase::Idle => write!(f, "Idle"),
            ClosePhase::Building => write!(f, "Building"),
            ClosePhase::Submitted => write!(f, "Submitted"),
            ClosePhase::Confirming => write!(f, "Confirming"),
            ClosePhase::Closed => write!(f, "Closed"),
            ClosePhase::Failed => write!(f, "Failed"),
        }
    }
}

/// Why a closing attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseFailure {
    /// No signer or no RPC connection
    WalletUnavailable,
    /// The address is not a valid public key
    InvalidAccount,
    UserRejected,
    InsufficientFunds,
    /// The account still holds tokens
    AccountNotEmpty,
    Unknown(String),
}

impl CloseFailure {
    /// Classify an RPC failure, preferring the typed transaction error
    pub fn from_rpc_error(error: &RpcError) -> Self {
        match error {
            RpcError::Transaction(tx_err) => Self::from_transaction_error(tx_err),
            RpcError::Client(client_err) => Self::from_message(&client_err.to_string()),
            RpcError::Timeout(_)
            | RpcError::InvalidAccountData { .. }
            | RpcError::TransactionBuildError(_) => Self::Unknown(error.to_string()),
        }
    }

    pub fn from_transaction_error(error: &TransactionError) -> Self {
        match error {
            TransactionError::InsufficientFundsForFee
            | TransactionError::InsufficientFundsForRent { .. }
            | TransactionError::InstructionError(_, InstructionError::InsufficientFunds) => {
                Self::InsufficientFunds
            }
            TransactionError::InstructionError(_, InstructionError::Custom(code))
                if *code == TokenError::NonNativeHasBalance as u32 =>
            {
                Self::AccountNotEmpty
            }
            TransactionError::InstructionError(_, InstructionError::Custom(code))
                if *code == TokenError::InsufficientFunds as u32 =>
            {
                Self::InsufficientFunds
            }
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn from_wallet_error(error: &WalletError) -> Self {
        match error {
            WalletError::NotConnected => Self::WalletUnavailable,
            WalletError::Signer(SignerError::UserCancel(_)) => Self::UserRejected,
            WalletError::Signer(other) => Self::from_message(&other.to_string()),
        }
    }

    /// Fallback for opaque errors that only carry a message
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("insufficient") {
            Self::InsufficientFunds
        } else if lower.contains("non-native account")
            || lower.contains("not empty")
            || lower.contains("has balance")
            || lower.contains("custom program error: 0xb")
        {
            Self::AccountNotEmpty
        } else if lower.contains("rejected")
            || lower.contains("declined")
            || lower.contains("cancel")
        {
            Self::UserRejected
        } else {
            Self::Unknown(message.to_string())
        }
    }

    pub fn message(&self) -> Message {
        match self {
            CloseFailure::WalletUnavailable => Message::WalletNotConnected,
            CloseFailure::InvalidAccount => Message::InvalidAccount,
            CloseFailure::UserRejected => Message::UserRejected,
            CloseFailure::InsufficientFunds => Message::InsufficientFunds,
            CloseFailure::AccountNotEmpty => Message::AccountNotEmpty,
            CloseFailure::Unknown(detail) => Message::CloseFailed(detail.clone()),
        }
    }

    pub fn user_message(&self, language: Language) -> String {
        self.message().text(language)
    }
}

/// Result of one closing attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseReport {
    pub account: String,
    pub signature: Option<Signature>,
    /// Phases visited, in order
    pub phases: Vec<ClosePhase>,
    pub failure: Option<CloseFailure>,
    pub finished_at: DateTime<Utc>,
}

impl CloseReport {
    fn new(account: &str) -> Self {
        Self {
            account: account.to_string(),
            signature: None,
            phases: vec![ClosePhase::Idle],
            failure: None,
            finished_at: Utc::now(),
        }
    }

    pub fn closed(&self) -> bool {
        self.phase() == ClosePhase::Closed
    }

    pub fn phase(&self) -> ClosePhase {
        self.phases.last().copied().unwrap_or(ClosePhase::Idle)
    }

    fn enter(&mut self, phase: ClosePhase) {
        debug!("Close {}: {} -> {}", self.account, self.phase(), phase);
        self.phases.push(phase);
    }

    fn fail(mut self, failure: CloseFailure) -> Self {
        warn!("Close {} failed: {:?}", self.account, failure);
        self.enter(ClosePhase::Failed);
        self.failure = Some(failure);
        self.finished_at = Utc::now();
        self
    }

    fn succeed(mut self) -> Self {
        self.enter(ClosePhase::Closed);
        self.finished_at = Utc::now();
        self
    }
}

/// Closes token accounts owned by the connected wallet
pub struct AccountCloser {
    rpc: Option<Arc<dyn TokenRpc>>,
    wallet: Arc<WalletConnection>,
    commitment: CommitmentConfig,
}

impl AccountCloser {
    pub fn new(rpc: Option<Arc<dyn TokenRpc>>, wallet: Arc<WalletConnection>) -> Self {
        Self {
            rpc,
            wallet,
            commitment: CommitmentConfig::confirmed(),
        }
    }

    pub fn wallet(&self) -> &Arc<WalletConnection> {
        &self.wallet
    }

    /// Close one token account. Never returns an error: failures are
    /// reported in the [`CloseReport`].
    pub async fn close_token_account(&self, address: &str) -> CloseReport {
        let mut report = CloseReport::new(address);
        report.enter(ClosePhase::Building);

        let (Some(rpc), Some(signer)) = (self.rpc.as_ref(), self.wallet.signer().await) else {
            return report.fail(CloseFailure::WalletUnavailable);
        };

        let Ok(account) = Pubkey::from_str(address) else {
            return report.fail(CloseFailure::InvalidAccount);
        };

        let owner = signer.pubkey();
        info!("Closing token account {} for {}", account, owner);

        let unsigned = match close_account_instruction(&account, &owner) {
            Ok(instruction) => {
                TransactionBuilder::new(rpc.clone())
                    .add_instruction(instruction)
                    .with_fee_payer(owner)
                    .build("close token account")
                    .await
            }
            Err(e) => Err(e),
        };
        let unsigned = match unsigned {
            Ok(unsigned) => unsigned,
            Err(e) => return report.fail(CloseFailure::from_rpc_error(&e)),
        };
        debug!(
            "Built {} for {} with {} signer(s) at blockhash {}",
            unsigned.description,
            account,
            unsigned.signers.len(),
            unsigned.recent_blockhash
        );

        let signed = match signer.sign_transaction(unsigned.transaction).await {
            Ok(signed) => signed,
            Err(e) => return report.fail(CloseFailure::from_wallet_error(&e)),
        };

        let signature = match rpc.send_transaction(&signed).await {
            Ok(signature) => signature,
            Err(e) => {
                error!("Failed to submit close for {}: {}", account, e);
                return report.fail(CloseFailure::from_rpc_error(&e));
            }
        };
        report.signature = Some(signature);
        report.enter(ClosePhase::Submitted);

        report.enter(ClosePhase::Confirming);
        if let Err(e) = rpc.confirm_transaction(&signature, self.commitment).await {
            error!("Close {} not confirmed: {}", signature, e);
            return report.fail(CloseFailure::from_rpc_error(&e));
        }

        info!("Closed token account {} in {}", account, signature);
        report.succeed()
    }
}
