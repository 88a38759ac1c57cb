//! Board controller
//!
//! Owns the whole game state: mode, the current token records, the food on
//! the table, the score and the transient status message. Collections are
//! only ever replaced under the write lock; the lock is never held across a
//! network call, so several closes for different foods can be in flight at
//! once while a second click on the same food is ignored.

use crate::{
    closer::{AccountCloser, CloseFailure, CloseReport},
    discovery::TokenDiscovery,
    event_stream::{BoardEvent, EventStream},
    food::{decorative_foods, edible_records, token_food, FoodItem, FoodSource},
    messages::{Language, Message},
    token::TokenAccountRecord,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info};

/// Board tuning
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Number of decorative foods per game
    pub food_count: usize,

    /// Maximum number of token foods on the table
    pub token_food_limit: usize,

    /// How long the eating animation lasts
    pub consumption_window: Duration,

    /// How long a status message stays visible
    pub outcome_ttl: Duration,

    pub language: Language,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            food_count: 10,
            token_food_limit: 50,
            consumption_window: Duration::from_millis(1500),
            outcome_ttl: Duration::from_secs(3),
            language: Language::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    Success,
    Error,
    Pending,
}

/// Transient status message, e.g. the result of a closing attempt
#[derive(Debug, Clone)]
pub struct TransactionOutcome {
    pub status: OutcomeStatus,
    pub message: String,
    created_at: Instant,
    ttl: Duration,
}

impl TransactionOutcome {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Idle,
    Decorative,
    Tokens,
}

#[derive(Debug, Clone)]
pub struct BoardState {
    pub mode: GameMode,
    pub records: Vec<TokenAccountRecord>,
    pub foods: Vec<FoodItem>,
    pub score: u32,
    /// A decorative game is running
    pub started: bool,
    /// Persistent notice such as "no tokens"
    pub notice: Option<Message>,
    outcome: Option<TransactionOutcome>,
    next_food_id: u64,
}

impl BoardState {
    fn new() -> Self {
        Self {
            mode: GameMode::Idle,
            records: Vec::new(),
            foods: Vec::new(),
            score: 0,
            started: false,
            notice: None,
            outcome: None,
            next_food_id: 0,
        }
    }

    pub fn outcome(&self) -> Option<&TransactionOutcome> {
        self.outcome.as_ref().filter(|outcome| !outcome.is_expired())
    }

    pub fn food(&self, id: u64) -> Option<&FoodItem> {
        self.foods.iter().find(|food| food.id == id)
    }
}

/// Result of a token load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Foods on the table after the pass
    Loaded(usize),
    NoTokens,
    /// The pass failed and the previous set was kept
    Failed,
    WalletUnavailable,
}

/// Result of clicking a food
#[derive(Debug, Clone)]
pub enum ClickResult {
    NotFound,
    /// Already being eaten
    Ignored,
    /// A decorative food was eaten
    Eaten,
    Closed(CloseReport),
    Failed(CloseReport),
}

pub struct BoardController {
    discovery: Arc<TokenDiscovery>,
    closer: Arc<AccountCloser>,
    state: RwLock<BoardState>,
    events: EventStream,
    config: BoardConfig,
}

impl BoardController {
    pub fn new(
        discovery: Arc<TokenDiscovery>,
        closer: Arc<AccountCloser>,
        config: BoardConfig,
    ) -> Self {
        Self {
            discovery,
            closer,
            state: RwLock::new(BoardState::new()),
            events: EventStream::new(),
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    pub fn language(&self) -> Language {
        self.config.language
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> BoardState {
        self.state.read().await.clone()
    }

    /// The current status message, if it has not expired yet
    pub async fn outcome(&self) -> Option<TransactionOutcome> {
        let mut state = self.state.write().await;
        if state.outcome.as_ref().is_some_and(TransactionOutcome::is_expired) {
            state.outcome = None;
        }
        state.outcome.clone()
    }

    /// Start a decorative game with fresh random foods. An empty table is
    /// over as soon as it starts.
    pub async fn start_decorative(&self) -> usize {
        let count = {
            let mut state = self.state.write().await;
            let mut next_id = state.next_food_id;
            state.foods = decorative_foods(
                &mut rand::thread_rng(),
                &mut next_id,
                self.config.food_count,
                self.config.language,
            );
            state.next_food_id = next_id;
            state.mode = GameMode::Decorative;
            state.records.clear();
            state.score = 0;
            state.started = !state.foods.is_empty();
            state.notice = None;
            state.foods.len()
        };

        info!("Started decorative game with {} foods", count);
        self.events.emit(BoardEvent::FoodsReplaced { count });
        self.events.emit(BoardEvent::ScoreChanged { score: 0 });
        if count == 0 {
            self.events.emit(BoardEvent::GameOver { score: 0 });
        }
        count
    }

    /// Run a discovery pass for the connected wallet and rebuild the table.
    ///
    /// A failed pass keeps the previous records and foods and shows a
    /// transient error.
    pub async fn load_tokens(&self) -> LoadOutcome {
        let Some(owner) = self.closer.wallet().owner().await else {
            self.set_outcome(OutcomeStatus::Error, &Message::WalletNotConnected)
                .await;
            return LoadOutcome::WalletUnavailable;
        };

        let records = match self.discovery.try_discover(&owner).await {
            Ok(records) => records,
            Err(e) => {
                error!("Token discovery failed for {}: {}", owner, e);
                self.set_outcome(OutcomeStatus::Error, &Message::LoadFailed).await;
                return LoadOutcome::Failed;
            }
        };

        let count = {
            let mut state = self.state.write().await;
            self.apply_records(&mut state, records);
            state.foods.len()
        };

        self.events.emit(BoardEvent::FoodsReplaced { count });
        if count == 0 {
            self.events.emit(BoardEvent::NoTokens);
            LoadOutcome::NoTokens
        } else {
            LoadOutcome::Loaded(count)
        }
    }

    /// Replace the records and rebuild the foods. Foods whose account is
    /// still present keep their id, layout and latch.
    fn apply_records(&self, state: &mut BoardState, records: Vec<TokenAccountRecord>) {
        let mut existing: HashMap<String, FoodItem> = std::mem::take(&mut state.foods)
            .into_iter()
            .filter_map(|food| {
                let address = food.token_address()?.to_string();
                Some((address, food))
            })
            .collect();

        let mut rng = rand::thread_rng();
        let mut foods = Vec::new();
        for record in edible_records(&records, self.config.token_food_limit) {
            let food = match existing.remove(&record.address) {
                Some(mut food) => {
                    food.update_from(record);
                    food
                }
                None => {
                    let food = token_food(&mut rng, state.next_food_id, record);
                    state.next_food_id += 1;
                    food
                }
            };
            foods.push(food);
        }

        debug!(
            "Applied {} records, {} foods displayed",
            records.len(),
            foods.len()
        );

        state.notice = foods.is_empty().then_some(Message::NoTokens);
        state.foods = foods;
        state.records = records;
        state.mode = GameMode::Tokens;
        state.started = false;
    }

    /// Click a food. The latch is set before anything asynchronous happens.
    pub async fn click(&self, food_id: u64) -> ClickResult {
        let (source, name) = {
            let mut state = self.state.write().await;
            let Some(food) = state.foods.iter_mut().find(|food| food.id == food_id) else {
                return ClickResult::NotFound;
            };
            if food.is_being_consumed {
                debug!("Food {} is already being eaten", food_id);
                return ClickResult::Ignored;
            }
            food.is_being_consumed = true;
            (food.source.clone(), food.name.clone())
        };

        self.events.emit(BoardEvent::ConsumptionStarted { food_id });

        match source {
            FoodSource::Decorative(_) => self.eat_decorative(food_id).await,
            FoodSource::Token { address, .. } => self.eat_token(food_id, &address, &name).await,
        }
    }

    async fn eat_decorative(&self, food_id: u64) -> ClickResult {
        tokio::time::sleep(self.config.consumption_window).await;

        let mut state = self.state.write().await;
        let Some(index) = state.foods.iter().position(|food| food.id == food_id) else {
            return ClickResult::NotFound;
        };
        let food = state.foods.remove(index);
        state.score += 1;
        let score = state.score;

        self.events.emit(BoardEvent::FoodConsumed {
            food_id,
            name: food.name,
        });
        self.events.emit(BoardEvent::ScoreChanged { score });

        if state.started && state.foods.is_empty() {
            state.started = false;
            info!("Game over with score {}", score);
            self.events.emit(BoardEvent::GameOver { score });
        }

        ClickResult::Eaten
    }

    async fn eat_token(&self, food_id: u64, address: &str, name: &str) -> ClickResult {
        self.set_outcome(OutcomeStatus::Pending, &Message::Closing(name.to_string()))
            .await;

        // The animation plays while the transaction is in flight
        let (report, ()) = tokio::join!(
            self.closer.close_token_account(address),
            tokio::time::sleep(self.config.consumption_window),
        );

        if report.closed() {
            let score = {
                let mut state = self.state.write().await;
                state.foods.retain(|food| food.token_address() != Some(address));
                state.records.retain(|record| record.address != address);
                state.score += 1;
                state.score
            };
            self.events.emit(BoardEvent::FoodConsumed {
                food_id,
                name: name.to_string(),
            });
            self.events.emit(BoardEvent::ScoreChanged { score });
            self.set_outcome(OutcomeStatus::Success, &Message::Closed(name.to_string()))
                .await;

            self.load_tokens().await;
            return ClickResult::Closed(report);
        }

        {
            let mut state = self.state.write().await;
            if let Some(food) = state
                .foods
                .iter_mut()
                .find(|food| food.token_address() == Some(address))
            {
                food.is_being_consumed = false;
            }
        }
        self.events.emit(BoardEvent::ConsumptionAborted { food_id });

        let failure = report
            .failure
            .clone()
            .unwrap_or_else(|| CloseFailure::Unknown(report.phase().to_string()));
        self.set_outcome(OutcomeStatus::Error, &failure.message()).await;

        ClickResult::Failed(report)
    }

    async fn set_outcome(&self, status: OutcomeStatus, message: &Message) {
        let text = message.text(self.config.language);
        self.state.write().await.outcome = Some(TransactionOutcome {
            status,
            message: text.clone(),
            created_at: Instant::now(),
            ttl: self.config.outcome_ttl,
        });
        self.events.emit(BoardEvent::Outcome {
            status,
            message: text,
        });
    }
}
