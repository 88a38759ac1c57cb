//! Solana RPC access used by discovery and account closing

use crate::{
    error::{Result, RpcError},
    token::RawTokenAccount,
};
use async_trait::async_trait;
use serde::Deserialize;
use solana_account_decoder::UiAccountData;
use solana_client::{
    nonblocking::rpc_client::RpcClient, rpc_request::TokenAccountsFilter,
    rpc_response::RpcKeyedAccount,
};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Public mainnet endpoint used when no provider key is configured
pub const PUBLIC_MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";

/// Keyed mainnet endpoint of the metadata provider
pub const HELIUS_MAINNET_RPC: &str = "https://mainnet.helius-rpc.com";

const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// The RPC operations the game needs
#[async_trait]
pub trait TokenRpc: Send + Sync {
    /// All SPL token accounts owned by `owner`, zero balances included
    async fn token_accounts_by_owner(&self, owner: &Pubkey) -> Result<Vec<RawTokenAccount>>;

    async fn latest_blockhash(&self) -> Result<Hash>;

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature>;

    /// Wait until `signature` reaches `commitment`. An execution error is
    /// returned as [`RpcError::Transaction`].
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<()>;
}

/// Pick the RPC endpoint: explicit URL, then keyed provider, then public mainnet
pub fn resolve_rpc_endpoint(explicit: Option<&str>, api_key: Option<&str>) -> String {
    if let Some(url) = explicit.filter(|url| !url.is_empty()) {
        return url.to_string();
    }
    match api_key.filter(|key| !key.is_empty()) {
        Some(key) => format!("{HELIUS_MAINNET_RPC}/?api-key={key}"),
        None => {
            warn!("No RPC provider key configured, using public mainnet endpoint");
            PUBLIC_MAINNET_RPC.to_string()
        }
    }
}

/// [`TokenRpc`] backed by the nonblocking Solana RPC client
#[derive(Clone)]
pub struct SolanaRpc {
    client: Arc<RpcClient>,
    confirm_timeout: Duration,
}

impl SolanaRpc {
    pub fn new(rpc_url: String, confirm_timeout: Duration) -> Self {
        Self {
            client: Arc::new(RpcClient::new_with_commitment(
                rpc_url,
                CommitmentConfig::confirmed(),
            )),
            confirm_timeout,
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }

    async fn poll_status(&self, signature: &Signature, commitment: CommitmentConfig) -> Result<()> {
        loop {
            let statuses = self.client.get_signature_statuses(&[*signature]).await?;
            if let Some(Some(status)) = statuses.value.into_iter().next() {
                if let Some(err) = status.err {
                    return Err(RpcError::Transaction(err));
                }
                if status.satisfies_commitment(commitment) {
                    return Ok(());
                }
            }
            tokio::time::sleep(STATUS_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl TokenRpc for SolanaRpc {
    async fn token_accounts_by_owner(&self, owner: &Pubkey) -> Result<Vec<RawTokenAccount>> {
        debug!("Fetching token accounts for {}", owner);
        let keyed = self
            .client
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::ProgramId(spl_token::id()))
            .await?;

        keyed.iter().map(parse_keyed_account).collect()
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(self.client.get_latest_blockhash().await?)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        Ok(self.client.send_transaction(transaction).await?)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<()> {
        tokio::time::timeout(self.confirm_timeout, self.poll_status(signature, commitment))
            .await
            .map_err(|_| RpcError::Timeout(*signature))?
    }
}

#[derive(Debug, Deserialize)]
struct ParsedTokenAccount {
    info: ParsedTokenInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsedTokenInfo {
    mint: String,
    token_amount: ParsedTokenAmount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsedTokenAmount {
    amount: String,
    decimals: u8,
    ui_amount: Option<f64>,
}

fn parse_keyed_account(keyed: &RpcKeyedAccount) -> Result<RawTokenAccount> {
    match &keyed.account.data {
        UiAccountData::Json(parsed) => parse_token_account(&keyed.pubkey, &parsed.parsed),
        _ => Err(RpcError::InvalidAccountData {
            address: keyed.pubkey.clone(),
            reason: "expected jsonParsed encoding".to_string(),
        }),
    }
}

/// Decode the `parsed` object of a jsonParsed SPL token account
pub fn parse_token_account(address: &str, parsed: &serde_json::Value) -> Result<RawTokenAccount> {
    let account: ParsedTokenAccount =
        serde_json::from_value(parsed.clone()).map_err(|e| RpcError::InvalidAccountData {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

    Ok(RawTokenAccount {
        address: address.to_string(),
        mint: account.info.mint,
        amount: account.info.token_amount.amount,
        decimals: account.info.token_amount.decimals,
        ui_amount: account.info.token_amount.ui_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_token_account() {
        let parsed = json!({
            "info": {
                "isNative": false,
                "mint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                "owner": "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T",
                "state": "initialized",
                "tokenAmount": {
                    "amount": "2500000",
                    "decimals": 6,
                    "uiAmount": 2.5,
                    "uiAmountString": "2.5"
                }
            },
            "type": "account"
        });

        let raw = parse_token_account("Acct", &parsed).unwrap();
        assert_eq!(raw.address, "Acct");
        assert_eq!(raw.mint, "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
        assert_eq!(raw.amount, "2500000");
        assert_eq!(raw.decimals, 6);
        assert_eq!(raw.ui_amount, Some(2.5));
    }

    #[test]
    fn test_parse_token_account_null_ui_amount() {
        let parsed = json!({
            "info": {
                "mint": "Mint",
                "tokenAmount": { "amount": "0", "decimals": 9, "uiAmount": null }
            }
        });
        let raw = parse_token_account("Acct", &parsed).unwrap();
        assert_eq!(raw.ui_amount, None);
    }

    #[test]
    fn test_parse_token_account_rejects_garbage() {
        let err = parse_token_account("Acct", &json!({ "info": {} })).unwrap_err();
        assert!(matches!(err, RpcError::InvalidAccountData { .. }));
    }

    #[test]
    fn test_resolve_rpc_endpoint() {
        assert_eq!(
            resolve_rpc_endpoint(Some("http://localhost:8899"), Some("key")),
            "http://localhost:8899"
        );
        assert_eq!(
            resolve_rpc_endpoint(None, Some("abc")),
            "https://mainnet.helius-rpc.com/?api-key=abc"
        );
        assert_eq!(resolve_rpc_endpoint(None, None), PUBLIC_MAINNET_RPC);
        assert_eq!(resolve_rpc_endpoint(Some(""), Some("")), PUBLIC_MAINNET_RPC);
    }
}
