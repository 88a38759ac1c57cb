//! Devour Evolve
//!
//! Terminal front end: lists a wallet's token accounts, closes empty ones to
//! reclaim rent and runs the food board game on top of them.

use anyhow::Result;
use clap::{Parser, Subcommand};
use devour_core::Language;
use std::sync::Arc;
use tracing::info;

mod app;
mod config;
mod play;

use app::App;
use config::Config;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log level
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Message language (zh or en)
    #[arg(long, global = true)]
    lang: Option<Language>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the token accounts of a wallet
    Tokens {
        /// Owner address; defaults to the connected wallet
        #[arg(long)]
        owner: Option<String>,
    },

    /// Close token accounts and reclaim their rent
    Close {
        #[arg(required = true)]
        addresses: Vec<String>,
    },

    /// Play the board game
    Play {
        /// Plain food instead of the wallet's tokens
        #[arg(long)]
        decorative: bool,

        /// Number of decorative foods
        #[arg(long)]
        count: Option<usize>,
    },

    /// Connect and remember a keypair wallet
    Connect {
        #[arg(long)]
        keypair: Option<String>,
    },

    /// Forget the remembered wallet
    Disconnect {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(&args.log_level)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load(args.config.as_deref())?;
    let language = args.lang.unwrap_or(config.game.language);
    let app = App::new(config, language);

    match args.command {
        Command::Tokens { owner } => app.tokens(owner.as_deref()).await?,
        Command::Close { addresses } => app.close(&addresses).await?,
        Command::Play { decorative, count } => {
            app.restore_wallet().await?;
            let board = match count {
                Some(count) => app.board_with_food_count(count),
                None => app.board(),
            };
            play::run(Arc::new(board), decorative).await?;
        }
        Command::Connect { keypair } => app.connect(keypair.as_deref()).await?,
        Command::Disconnect { yes } => app.disconnect(yes).await?,
    }

    info!("Done");
    Ok(())
}
