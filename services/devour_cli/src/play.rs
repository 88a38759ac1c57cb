//! Interactive board in the terminal
//!
//! Each input line is a command: a food id eats that food, `r` refreshes the
//! table and `q` quits. Clicks run in their own tasks so several closes can
//! be in flight while the player keeps eating.

use anyhow::Result;
use devour_core::{
    BoardController, BoardEvent, GameMode, Language, LoadOutcome, Message, OutcomeStatus,
};
use std::sync::Arc;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    signal,
    sync::broadcast::error::RecvError,
};
use tracing::{debug, info, warn};

pub async fn run(board: Arc<BoardController>, decorative: bool) -> Result<()> {
    let language = board.language();
    let mut events = board.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event, language),
                Err(RecvError::Lagged(missed)) => warn!("Missed {} board events", missed),
                Err(RecvError::Closed) => break,
            }
        }
    });

    start(&board, decorative).await;
    render(&board).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "q" | "quit" => break,
                    "r" | "refresh" => {
                        let decorative = board.snapshot().await.mode == GameMode::Decorative;
                        start(&board, decorative).await;
                    }
                    "" => {}
                    input => match input.parse::<u64>() {
                        Ok(food_id) => {
                            let board = board.clone();
                            tokio::spawn(async move {
                                let result = board.click(food_id).await;
                                debug!("Click on {} finished: {:?}", food_id, result);
                            });
                        }
                        Err(_) => println!("<id> eat, r refresh, q quit"),
                    },
                }
                render(&board).await;
            }
            _ = signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    printer.abort();
    Ok(())
}

/// Load the wallet's tokens, or lay out a decorative table when asked to or
/// when no wallet is connected
async fn start(board: &BoardController, decorative: bool) {
    if decorative || board.load_tokens().await == LoadOutcome::WalletUnavailable {
        board.start_decorative().await;
    }
}

async fn render(board: &BoardController) {
    let state = board.snapshot().await;
    let language = board.language();

    println!("{}", Message::Score(state.score).text(language));
    for food in &state.foods {
        let eating = if food.is_being_consumed { " ..." } else { "" };
        println!(
            "  [{:>3}] {} ({}px @ {:.0},{:.0}){eating}",
            food.id, food.name, food.size, food.position.x, food.position.y
        );
    }
    if state.mode == GameMode::Tokens && !state.foods.is_empty() {
        println!("  {}", Message::ClickToClose.text(language));
    }
    if let Some(notice) = &state.notice {
        println!("{}", notice.text(language));
    }
    if let Some(outcome) = board.outcome().await {
        println!("{} {}", status_marker(outcome.status), outcome.message);
    }
}

fn print_event(event: &BoardEvent, language: Language) {
    match event {
        BoardEvent::Outcome { status, message } => {
            println!("{} {message}", status_marker(*status));
        }
        BoardEvent::GameOver { score } => println!("{}", Message::GameOver(*score).text(language)),
        BoardEvent::NoTokens => println!("{}", Message::NoTokens.text(language)),
        other => debug!("Board event: {:?}", other),
    }
}

fn status_marker(status: OutcomeStatus) -> &'static str {
    match status {
        OutcomeStatus::Success => "[ok]",
        OutcomeStatus::Error => "[error]",
        OutcomeStatus::Pending => "[..]",
    }
}
