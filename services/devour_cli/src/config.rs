//! Configuration for the `devour` binary

use anyhow::{Context, Result};
use devour_core::{resolve_rpc_endpoint, BoardConfig, Language};
use serde::Deserialize;
use solana_sdk::signature::Keypair;
use std::{fs, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Explicit Solana RPC URL; wins over the provider endpoint
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Metadata provider base URL
    #[serde(default)]
    pub helius_rpc_url: Option<String>,

    /// Metadata provider API key, also used for the keyed RPC endpoint
    #[serde(default)]
    pub helius_api_key: Option<String>,

    /// Keypair used by `connect` when none is given
    #[serde(default = "default_keypair_path")]
    pub keypair_path: String,

    /// Where the remembered wallet is stored
    #[serde(default = "default_session_path")]
    pub session_path: String,

    /// Upper bound on waiting for a close to confirm
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_secs: u64,

    #[serde(default)]
    pub game: GameConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    /// Number of foods in a decorative game
    #[serde(default = "default_food_count")]
    pub food_count: usize,

    /// Maximum number of token foods on the table
    #[serde(default = "default_token_food_limit")]
    pub token_food_limit: usize,

    /// Eating animation length in milliseconds
    #[serde(default = "default_consumption_window_ms")]
    pub consumption_window_ms: u64,

    /// Status message lifetime in milliseconds
    #[serde(default = "default_outcome_ttl_ms")]
    pub outcome_ttl_ms: u64,

    #[serde(default)]
    pub language: Language,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            food_count: default_food_count(),
            token_food_limit: default_token_food_limit(),
            consumption_window_ms: default_consumption_window_ms(),
            outcome_ttl_ms: default_outcome_ttl_ms(),
            language: Language::default(),
        }
    }
}

impl Config {
    /// Load configuration from file or environment variables
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("Could not load .env file: {}", e);
        }

        let config = if let Some(path) = config_path {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {path}"))?;

            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {path}"))?
        } else {
            Self::from_env()?
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let config = Config {
            rpc_url: non_empty_var("RPC_URL"),
            helius_rpc_url: non_empty_var("HELIUS_RPC_URL"),
            helius_api_key: non_empty_var("HELIUS_API_KEY"),
            keypair_path: std::env::var("KEYPAIR_PATH").unwrap_or_else(|_| default_keypair_path()),
            session_path: std::env::var("SESSION_PATH").unwrap_or_else(|_| default_session_path()),
            confirm_timeout_secs: std::env::var("CONFIRM_TIMEOUT_SECS")
                .unwrap_or_else(|_| default_confirm_timeout().to_string())
                .parse()
                .context("Invalid CONFIRM_TIMEOUT_SECS")?,
            game: GameConfig {
                food_count: std::env::var("FOOD_COUNT")
                    .unwrap_or_else(|_| default_food_count().to_string())
                    .parse()
                    .context("Invalid FOOD_COUNT")?,
                token_food_limit: std::env::var("TOKEN_FOOD_LIMIT")
                    .unwrap_or_else(|_| default_token_food_limit().to_string())
                    .parse()
                    .context("Invalid TOKEN_FOOD_LIMIT")?,
                consumption_window_ms: std::env::var("CONSUMPTION_WINDOW_MS")
                    .unwrap_or_else(|_| default_consumption_window_ms().to_string())
                    .parse()
                    .context("Invalid CONSUMPTION_WINDOW_MS")?,
                outcome_ttl_ms: std::env::var("OUTCOME_TTL_MS")
                    .unwrap_or_else(|_| default_outcome_ttl_ms().to_string())
                    .parse()
                    .context("Invalid OUTCOME_TTL_MS")?,
                language: match std::env::var("DEVOUR_LANG") {
                    Ok(lang) => lang.parse().map_err(anyhow::Error::msg)?,
                    Err(_) => Language::default(),
                },
            },
        };

        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        for url in [&self.rpc_url, &self.helius_rpc_url].into_iter().flatten() {
            if !url.starts_with("http") {
                anyhow::bail!("URL must start with http or https: {url}");
            }
        }

        if self.confirm_timeout_secs == 0 {
            anyhow::bail!("confirm_timeout_secs must be greater than zero");
        }

        if self.game.token_food_limit == 0 {
            anyhow::bail!("token_food_limit must be greater than zero");
        }

        Ok(())
    }

    /// RPC endpoint after applying the explicit, keyed and public fallbacks
    pub fn rpc_endpoint(&self) -> String {
        resolve_rpc_endpoint(self.rpc_url.as_deref(), self.helius_api_key.as_deref())
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    pub fn session_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.session_path).to_string())
    }

    pub fn board_config(&self, language: Language) -> BoardConfig {
        BoardConfig {
            food_count: self.game.food_count,
            token_food_limit: self.game.token_food_limit,
            consumption_window: Duration::from_millis(self.game.consumption_window_ms),
            outcome_ttl: Duration::from_millis(self.game.outcome_ttl_ms),
            language,
        }
    }
}

/// Load a keypair file, `~` expanded. Accepts raw secret key bytes or the
/// JSON byte array written by the Solana CLI.
pub fn load_keypair(path: &str) -> Result<Keypair> {
    let path = shellexpand::tilde(path).to_string();
    let keypair_data =
        fs::read(&path).with_context(|| format!("Failed to read keypair file: {path}"))?;

    let keypair = if keypair_data.len() == 64 {
        Keypair::from_bytes(&keypair_data)?
    } else {
        let json: Vec<u8> =
            serde_json::from_slice(&keypair_data).context("Failed to parse keypair JSON")?;
        Keypair::from_bytes(&json)?
    };

    Ok(keypair)
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

// Default values
fn default_keypair_path() -> String { "~/.config/solana/id.json".to_string() }
fn default_session_path() -> String { "~/.config/devour/session.json".to_string() }
fn default_confirm_timeout() -> u64 { 60 }
fn default_food_count() -> usize { 10 }
fn default_token_food_limit() -> usize { 50 }
fn default_consumption_window_ms() -> u64 { 1500 }
fn default_outcome_ttl_ms() -> u64 { 3000 }
