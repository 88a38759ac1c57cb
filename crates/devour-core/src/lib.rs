//! Devour core
//!
//! Discovers the SPL token accounts of a Solana wallet, turns them into food
//! on a game board and closes the ones the player eats, returning the rent to
//! the owner. Keys never live here: transactions are built unsigned and handed
//! to a [`WalletSigner`].

pub mod board;
pub mod closer;
pub mod discovery;
pub mod error;
pub mod event_stream;
pub mod food;
pub mod image_uri;
pub mod messages;
pub mod metadata;
pub mod rpc;
pub mod session;
pub mod signing_service;
pub mod token;
pub mod transaction_builder;

pub use board::{
    BoardConfig, BoardController, BoardState, ClickResult, GameMode, LoadOutcome, OutcomeStatus,
    TransactionOutcome,
};
pub use closer::{AccountCloser, CloseFailure, ClosePhase, CloseReport};
pub use discovery::TokenDiscovery;
pub use error::{DiscoveryError, MetadataError, Result, RpcError, SessionError, WalletError};
pub use event_stream::{BoardEvent, EventStream};
pub use food::{FoodItem, FoodKind, FoodSource, Position};
pub use image_uri::resolve_image_uri;
pub use messages::{Language, Message};
pub use metadata::{AssetMetadataSource, HeliusAssetClient};
pub use rpc::{resolve_rpc_endpoint, SolanaRpc, TokenRpc};
pub use session::{
    FileSessionStore, ForgetConnection, InMemorySessionStore, RememberedWallet, SessionStore,
    StorageScope, TeardownReport, WalletSession, KNOWN_SESSION_KEYS,
};
pub use signing_service::{KeypairSigner, WalletConnection, WalletSigner};
pub use token::{RawTokenAccount, TokenAccountRecord, TokenMetadata};
pub use transaction_builder::{close_account_instruction, TransactionBuilder, UnsignedTransaction};
