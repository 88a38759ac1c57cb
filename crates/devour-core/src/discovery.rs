//! Token discovery and normalization
//!
//! A discovery pass lists every SPL token account of an owner, then enriches
//! the records with display metadata from the batch asset service. Metadata
//! problems only degrade the result to placeholders; RPC problems make the
//! pass fail, which [`TokenDiscovery::discover_tokens`] turns into an empty
//! list.

use crate::{
    error::{DiscoveryError, MetadataError},
    metadata::AssetMetadataSource,
    rpc::TokenRpc,
    token::TokenAccountRecord,
};
use solana_sdk::pubkey::Pubkey;
use std::{collections::HashSet, sync::Arc};
use tracing::{error, info, warn};

pub struct TokenDiscovery {
    rpc: Arc<dyn TokenRpc>,
    metadata: Arc<dyn AssetMetadataSource>,
}

impl TokenDiscovery {
    pub fn new(rpc: Arc<dyn TokenRpc>, metadata: Arc<dyn AssetMetadataSource>) -> Self {
        Self { rpc, metadata }
    }

    /// Discover the owner's token accounts, returning an empty list on failure
    pub async fn discover_tokens(&self, owner: &Pubkey) -> Vec<TokenAccountRecord> {
        match self.try_discover(owner).await {
            Ok(records) => records,
            Err(e) => {
                error!("Failed to fetch token accounts for {}: {}", owner, e);
                Vec::new()
            }
        }
    }

    /// Discover the owner's token accounts, surfacing transport failures
    pub async fn try_discover(
        &self,
        owner: &Pubkey,
    ) -> Result<Vec<TokenAccountRecord>, DiscoveryError> {
        let raw = self.rpc.token_accounts_by_owner(owner).await?;
        let mut records: Vec<TokenAccountRecord> =
            raw.into_iter().map(TokenAccountRecord::from_raw).collect();

        info!("Found {} token accounts for {}", records.len(), owner);

        if records.is_empty() {
            return Ok(records);
        }

        self.enrich(&mut records).await;
        Ok(records)
    }

    async fn enrich(&self, records: &mut [TokenAccountRecord]) {
        let mints = distinct_mints(records);

        let assets = match self.metadata.fetch_assets(&mints).await {
            Ok(assets) => assets,
            Err(MetadataError::MissingCredentials) => {
                warn!("Metadata service not configured, using placeholder token metadata");
                return;
            }
            Err(e) => {
                warn!("Metadata lookup failed, using placeholder token metadata: {}", e);
                return;
            }
        };

        for record in records.iter_mut() {
            if let Some(metadata) = assets.get(&record.mint) {
                record.metadata = metadata.clone();
            }
        }
    }
}

/// Mints in first-seen order without duplicates
fn distinct_mints(records: &[TokenAccountRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| seen.insert(record.mint.as_str()))
        .map(|record| record.mint.clone())
        .collect()
}
