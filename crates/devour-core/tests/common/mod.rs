#![allow(dead_code)]

use async_trait::async_trait;
use devour_core::{
    error::{MetadataError, Result, RpcError, WalletError},
    AccountCloser, AssetMetadataSource, BoardConfig, BoardController, Language, RawTokenAccount,
    TokenDiscovery, TokenMetadata, TokenRpc, WalletConnection, WalletSigner,
};
use mockall::mock;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::SignerError,
    transaction::{Transaction, TransactionError},
};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

mock! {
    pub Metadata {}

    #[async_trait]
    impl AssetMetadataSource for Metadata {
        async fn fetch_assets(
            &self,
            mints: &[String],
        ) -> std::result::Result<HashMap<String, TokenMetadata>, MetadataError>;
    }
}

/// In-memory stand-in for the chain: a list of token accounts that closes
/// accounts when a signed close transaction is sent
#[derive(Default)]
pub struct FakeLedger {
    accounts: Mutex<Vec<RawTokenAccount>>,
    failed: Mutex<HashMap<Signature, TransactionError>>,
    next_failure: Mutex<Option<TransactionError>>,
    listing_down: AtomicBool,
    sends: AtomicUsize,
}

impl FakeLedger {
    pub fn with_accounts(accounts: Vec<RawTokenAccount>) -> Arc<Self> {
        Arc::new(Self {
            accounts: Mutex::new(accounts),
            ..Self::default()
        })
    }

    pub fn accounts(&self) -> Vec<RawTokenAccount> {
        self.accounts.lock().unwrap().clone()
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    /// The next sent transaction lands but fails on chain
    pub fn fail_next_with(&self, error: TransactionError) {
        *self.next_failure.lock().unwrap() = Some(error);
    }

    pub fn set_listing_down(&self, down: bool) {
        self.listing_down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl TokenRpc for FakeLedger {
    async fn token_accounts_by_owner(&self, _owner: &Pubkey) -> Result<Vec<RawTokenAccount>> {
        if self.listing_down.load(Ordering::SeqCst) {
            return Err(ClientError::from(ClientErrorKind::Custom(
                "connection refused".to_string(),
            ))
            .into());
        }
        Ok(self.accounts())
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(Hash::new_unique())
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        let signature = transaction.signatures[0];

        if let Some(error) = self.next_failure.lock().unwrap().take() {
            self.failed.lock().unwrap().insert(signature, error);
            return Ok(signature);
        }

        let message = &transaction.message;
        for instruction in &message.instructions {
            let closed = message.account_keys[instruction.accounts[0] as usize].to_string();
            self.accounts
                .lock()
                .unwrap()
                .retain(|account| account.address != closed);
        }
        Ok(signature)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        _commitment: CommitmentConfig,
    ) -> Result<()> {
        match self.failed.lock().unwrap().remove(signature) {
            Some(error) => Err(RpcError::Transaction(error)),
            None => Ok(()),
        }
    }
}

/// Signer whose user declines every request
pub struct RejectingSigner {
    pubkey: Pubkey,
}

impl RejectingSigner {
    pub fn new() -> Self {
        Self {
            pubkey: Pubkey::new_unique(),
        }
    }
}

#[async_trait]
impl WalletSigner for RejectingSigner {
    fn name(&self) -> &str {
        "rejecting"
    }

    fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    async fn sign_transaction(
        &self,
        _transaction: Transaction,
    ) -> std::result::Result<Transaction, WalletError> {
        Err(SignerError::UserCancel("User rejected the request.".to_string()).into())
    }
}

pub fn token_account(amount: u64) -> RawTokenAccount {
    RawTokenAccount {
        address: Pubkey::new_unique().to_string(),
        mint: Pubkey::new_unique().to_string(),
        amount: amount.to_string(),
        decimals: 0,
        ui_amount: Some(amount as f64),
    }
}

/// Metadata source that knows nothing and never fails
pub fn empty_metadata() -> MockMetadata {
    let mut metadata = MockMetadata::new();
    metadata
        .expect_fetch_assets()
        .returning(|_| Ok(HashMap::new()));
    metadata
}

pub fn test_config() -> BoardConfig {
    BoardConfig {
        food_count: 3,
        token_food_limit: 50,
        consumption_window: Duration::from_millis(20),
        outcome_ttl: Duration::from_secs(5),
        language: Language::En,
    }
}

pub struct TestContext {
    pub ledger: Arc<FakeLedger>,
    pub wallet: Arc<WalletConnection>,
    pub board: BoardController,
}

impl TestContext {
    pub fn new(
        ledger: Arc<FakeLedger>,
        metadata: MockMetadata,
        signer: Option<Arc<dyn WalletSigner>>,
        config: BoardConfig,
    ) -> Self {
        let wallet = Arc::new(match signer {
            Some(signer) => WalletConnection::connected(signer),
            None => WalletConnection::new(),
        });
        let discovery = Arc::new(TokenDiscovery::new(ledger.clone(), Arc::new(metadata)));
        let closer = Arc::new(AccountCloser::new(
            Some(ledger.clone() as Arc<dyn TokenRpc>),
            wallet.clone(),
        ));

        Self {
            ledger,
            wallet,
            board: BoardController::new(discovery, closer, config),
        }
    }

    /// Board with a connected keypair wallet and no metadata
    pub fn with_keypair(accounts: Vec<RawTokenAccount>) -> Self {
        let signer = Arc::new(devour_core::KeypairSigner::new("local", Keypair::new()));
        Self::new(
            FakeLedger::with_accounts(accounts),
            empty_metadata(),
            Some(signer),
            test_config(),
        )
    }
}
