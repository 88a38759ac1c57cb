//! Board event broadcasting

use crate::board::OutcomeStatus;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Events emitted by the board controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoardEvent {
    /// The food list was rebuilt
    FoodsReplaced { count: usize },

    /// A food started being eaten
    ConsumptionStarted { food_id: u64 },

    /// A food was eaten and removed
    FoodConsumed { food_id: u64, name: String },

    /// A food was not eaten and is clickable again
    ConsumptionAborted { food_id: u64 },

    ScoreChanged { score: u32 },

    /// A transient status message
    Outcome { status: OutcomeStatus, message: String },

    /// Discovery found nothing to display
    NoTokens,

    /// Every decorative food was eaten
    GameOver { score: u32 },
}

/// Event stream for broadcasting board events
pub struct EventStream {
    sender: broadcast::Sender<BoardEvent>,
}

impl EventStream {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: BoardEvent) {
        debug!("Emitting event: {:?}", event);

        match self.sender.send(event) {
            Ok(count) => debug!("Event sent to {} receivers", count),
            // No receivers, event is dropped
            Err(e) => debug!("No receivers for event: {:?}", e),
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventStream {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_stream_multiple_subscribers() {
        let stream = EventStream::new();
        let mut first = stream.subscribe();
        let mut second = stream.subscribe();
        assert_eq!(stream.receiver_count(), 2);

        stream.emit(BoardEvent::ScoreChanged { score: 3 });

        assert_eq!(first.recv().await.unwrap(), BoardEvent::ScoreChanged { score: 3 });
        assert_eq!(second.recv().await.unwrap(), BoardEvent::ScoreChanged { score: 3 });
    }

    #[test]
    fn test_emit_without_receivers() {
        let stream = EventStream::default();
        stream.emit(BoardEvent::NoTokens);
        assert_eq!(stream.receiver_count(), 0);
    }
}
