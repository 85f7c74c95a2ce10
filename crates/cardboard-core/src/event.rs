//! Event bus for cardboard using tokio::broadcast
//!
//! Publishes dashboard changes so the web layer can push them over SSE.

use crate::models::CheckState;
use serde::Serialize;
use tokio::sync::broadcast;

/// Events emitted by the dashboard store
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// A fresh aggregation replaced the card snapshot
    CardsRefreshed { count: usize },
    /// Trello confirmed a card move
    CardMoved {
        card_id: String,
        list_id: String,
        list_name: String,
    },
    /// Trello confirmed a check item state change
    CheckItemChanged {
        card_id: String,
        check_item_id: String,
        state: CheckState,
    },
    /// A tentative check item change was rolled back
    CheckItemReverted {
        card_id: String,
        check_item_id: String,
        state: CheckState,
        message: String,
    },
}

impl DashboardEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            DashboardEvent::CardsRefreshed { .. } => "cards_refreshed",
            DashboardEvent::CardMoved { .. } => "card_moved",
            DashboardEvent::CheckItemChanged { .. } => "check_item_changed",
            DashboardEvent::CheckItemReverted { .. } => "check_item_reverted",
        }
    }
}

/// Event bus for broadcasting dashboard events
///
/// Cloning is cheap; every clone publishes into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DashboardEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (256 events)
    pub fn default_capacity() -> Self {
        Self::new(256)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: DashboardEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}
