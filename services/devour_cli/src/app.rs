//! Wiring between configuration, the Solana services and the commands

use crate::config::{load_keypair, Config};
use anyhow::{Context, Result};
use devour_core::{
    token::abbreviate, AccountCloser, BoardController, FileSessionStore, HeliusAssetClient,
    KeypairSigner, Language, Message, SolanaRpc, TokenDiscovery, TokenRpc, WalletConnection,
    WalletSession, WalletSigner,
};
use futures::future::join_all;
use solana_sdk::pubkey::Pubkey;
use std::{str::FromStr, sync::Arc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

pub struct App {
    config: Config,
    language: Language,
    rpc: Arc<SolanaRpc>,
    discovery: Arc<TokenDiscovery>,
    session: WalletSession,
}

impl App {
    pub fn new(config: Config, language: Language) -> Self {
        let rpc = Arc::new(SolanaRpc::new(config.rpc_endpoint(), config.confirm_timeout()));
        info!("Using RPC endpoint {}", rpc.url());

        let metadata = Arc::new(HeliusAssetClient::new(
            config.helius_rpc_url.clone(),
            config.helius_api_key.clone(),
        ));
        let discovery = Arc::new(TokenDiscovery::new(rpc.clone(), metadata));

        let store = Arc::new(FileSessionStore::new(config.session_path()));
        let session = WalletSession::new(store, Arc::new(WalletConnection::new()));

        Self {
            config,
            language,
            rpc,
            discovery,
            session,
        }
    }

    fn wallet(&self) -> &Arc<WalletConnection> {
        self.session.connection()
    }

    fn text(&self, message: &Message) -> String {
        message.text(self.language)
    }

    /// Reconnect the remembered wallet, if any. A forgotten wallet stays
    /// disconnected.
    pub async fn restore_wallet(&self) -> Result<Option<Pubkey>> {
        let Some(remembered) = self.session.remembered().await? else {
            debug!("No remembered wallet");
            return Ok(None);
        };
        if !remembered.auto_connect {
            return Ok(None);
        }

        let path = remembered
            .keypair_path
            .unwrap_or_else(|| self.config.keypair_path.clone());
        let signer = Arc::new(KeypairSigner::new(remembered.name, load_keypair(&path)?));
        let pubkey = signer.pubkey();
        self.wallet().connect(signer).await;
        Ok(Some(pubkey))
    }

    fn closer(&self) -> Arc<AccountCloser> {
        Arc::new(AccountCloser::new(
            Some(self.rpc.clone() as Arc<dyn TokenRpc>),
            self.wallet().clone(),
        ))
    }

    pub fn board(&self) -> BoardController {
        BoardController::new(
            self.discovery.clone(),
            self.closer(),
            self.config.board_config(self.language),
        )
    }

    pub fn board_with_food_count(&self, food_count: usize) -> BoardController {
        let mut config = self.config.board_config(self.language);
        config.food_count = food_count;
        BoardController::new(self.discovery.clone(), self.closer(), config)
    }

    /// `devour tokens`
    pub async fn tokens(&self, owner: Option<&str>) -> Result<()> {
        let owner = match owner {
            Some(owner) => Pubkey::from_str(owner).context("Invalid owner address")?,
            None => match self.restore_wallet().await? {
                Some(pubkey) => pubkey,
                None => anyhow::bail!(self.text(&Message::WalletNotConnected)),
            },
        };

        let records = self
            .discovery
            .try_discover(&owner)
            .await
            .with_context(|| self.text(&Message::LoadFailed))?;

        if records.is_empty() {
            println!("{}", self.text(&Message::NoTokens));
            return Ok(());
        }

        for record in &records {
            let marker = if record.has_balance() { ' ' } else { '*' };
            println!(
                "{marker} {:<44} {:>20} {}",
                record.address, record.ui_amount, record.metadata.name
            );
        }
        println!(
            "{} accounts for {}, {} empty (*)",
            records.len(),
            abbreviate(&owner.to_string()),
            records.iter().filter(|record| !record.has_balance()).count()
        );
        Ok(())
    }

    /// `devour close`: closes are submitted concurrently
    pub async fn close(&self, addresses: &[String]) -> Result<()> {
        self.restore_wallet().await?;
        let closer = self.closer();

        let reports = join_all(
            addresses
                .iter()
                .map(|address| closer.close_token_account(address)),
        )
        .await;

        let mut failed = 0;
        for report in &reports {
            match (&report.failure, report.signature) {
                (None, Some(signature)) => println!("{} closed in {signature}", report.account),
                (None, None) => println!("{} closed", report.account),
                (Some(failure), _) => {
                    failed += 1;
                    println!("{}: {}", report.account, failure.user_message(self.language));
                }
            }
        }

        if failed > 0 {
            anyhow::bail!("{failed} of {} closes failed", reports.len());
        }
        Ok(())
    }

    /// `devour connect`
    pub async fn connect(&self, keypair: Option<&str>) -> Result<()> {
        let path = keypair.unwrap_or(&self.config.keypair_path);
        let signer = Arc::new(KeypairSigner::new("keypair", load_keypair(path)?));

        self.session
            .remember(signer.as_ref(), Some(path))
            .await
            .context("Failed to remember wallet")?;
        let pubkey = signer.pubkey();
        self.wallet().connect(signer).await;

        println!("Connected {pubkey}");
        Ok(())
    }

    /// `devour disconnect`
    pub async fn disconnect(&self, yes: bool) -> Result<()> {
        // A corrupt store is still worth clearing
        if let Ok(None) = self.session.remembered().await {
            println!("{}", self.text(&Message::WalletNotConnected));
            return Ok(());
        }

        if !yes && !confirm("Forget the remembered wallet? [y/N] ").await? {
            println!("Cancelled");
            return Ok(());
        }

        let report = self.session.forget().await;
        println!("Forgot wallet session ({} keys removed)", report.keys_removed);
        for failure in &report.failures {
            println!("  warning: {failure}");
        }
        Ok(())
    }
}

async fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}
