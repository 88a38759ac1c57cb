//! Transaction construction for wallet signing

use crate::{
    error::{Result, RpcError},
    rpc::TokenRpc,
};
use solana_sdk::{
    hash::Hash, instruction::Instruction, message::Message, pubkey::Pubkey,
    transaction::Transaction,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Unsigned transaction ready for the wallet
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    pub transaction: Transaction,

    /// Recent blockhash used
    pub recent_blockhash: Hash,

    /// Required signers, fee payer first
    pub signers: Vec<Pubkey>,

    pub description: String,
}

/// Builder for unsigned transactions
pub struct TransactionBuilder {
    rpc: Arc<dyn TokenRpc>,
    instructions: Vec<Instruction>,
    fee_payer: Option<Pubkey>,
    signers: Vec<Pubkey>,
}

impl TransactionBuilder {
    pub fn new(rpc: Arc<dyn TokenRpc>) -> Self {
        Self {
            rpc,
            instructions: Vec::new(),
            fee_payer: None,
            signers: Vec::new(),
        }
    }

    /// Add an instruction to the transaction
    pub fn add_instruction(mut self, instruction: Instruction) -> Self {
        for account in &instruction.accounts {
            if account.is_signer && !self.signers.contains(&account.pubkey) {
                self.signers.push(account.pubkey);
            }
        }

        self.instructions.push(instruction);
        self
    }

    pub fn with_fee_payer(mut self, payer: Pubkey) -> Self {
        self.fee_payer = Some(payer);
        self
    }

    /// Attach the latest blockhash and produce the unsigned transaction
    pub async fn build(mut self, description: &str) -> Result<UnsignedTransaction> {
        info!("Building unsigned transaction: {}", description);

        if self.instructions.is_empty() {
            return Err(RpcError::TransactionBuildError(
                "no instructions".to_string(),
            ));
        }

        let payer = self
            .fee_payer
            .or_else(|| self.signers.first().copied())
            .ok_or_else(|| RpcError::TransactionBuildError("no fee payer".to_string()))?;

        self.signers.retain(|signer| *signer != payer);
        self.signers.insert(0, payer);

        let recent_blockhash = self.rpc.latest_blockhash().await?;
        debug!("Using blockhash {}", recent_blockhash);

        let message = Message::new_with_blockhash(&self.instructions, Some(&payer), &recent_blockhash);

        Ok(UnsignedTransaction {
            transaction: Transaction::new_unsigned(message),
            recent_blockhash,
            signers: self.signers,
            description: description.to_string(),
        })
    }
}

/// Close `account`, returning its rent to `owner`, who is also the authority
pub fn close_account_instruction(account: &Pubkey, owner: &Pubkey) -> Result<Instruction> {
    spl_token::instruction::close_account(&spl_token::id(), account, owner, owner, &[])
        .map_err(|e| RpcError::TransactionBuildError(e.to_string()))
}
