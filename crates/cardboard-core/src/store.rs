//! Dashboard store
//!
//! Owns the aggregator, the shared lookup cache, the card snapshot and the
//! event bus. Both the web server and the CLI go through it.

use crate::aggregator::{CardAggregator, UNKNOWN_LIST};
use crate::cache::{CacheStats, LookupCache};
use crate::client::{validate_id, TrelloApi, TrelloClient};
use crate::clock::{Clock, SystemClock};
use crate::config::DashboardConfig;
use crate::error::{CoreError, CoreResult};
use crate::event::{DashboardEvent, EventBus};
use crate::models::{Card, CheckState, List};
use crate::mutation::{confirmed, optimistic, MoveCard, SetCheckItemState};
use crate::state::DashboardState;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Central store for cardboard
///
/// Thread-safe; share it behind an `Arc`.
pub struct DashboardStore {
    api: Arc<dyn TrelloApi>,
    aggregator: CardAggregator,
    cache: Arc<LookupCache>,
    clock: Arc<dyn Clock>,
    state: RwLock<DashboardState>,
    event_bus: EventBus,
}

impl DashboardStore {
    pub fn new(
        api: Arc<dyn TrelloApi>,
        cache: Arc<LookupCache>,
        clock: Arc<dyn Clock>,
        config: &DashboardConfig,
    ) -> Self {
        let aggregator = CardAggregator::new(
            Arc::clone(&api),
            Arc::clone(&cache),
            Arc::clone(&clock),
            config,
        );
        Self {
            api,
            aggregator,
            cache,
            clock,
            state: RwLock::new(DashboardState::default()),
            event_bus: EventBus::default_capacity(),
        }
    }

    /// Store backed by the real Trello API, a fresh cache and the wall clock
    pub fn from_config(config: DashboardConfig) -> CoreResult<Self> {
        let client = TrelloClient::new(config.clone())?;
        Ok(Self::new(
            Arc::new(client),
            Arc::new(LookupCache::new()),
            Arc::new(SystemClock),
            &config,
        ))
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Cards from the last successful aggregation
    pub fn snapshot(&self) -> Vec<Card> {
        self.state.read().cards().to_vec()
    }

    pub fn snapshot_len(&self) -> usize {
        self.state.read().cards().len()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().refreshed_at()
    }

    /// Aggregate the member's cards and make them the new snapshot
    pub async fn my_cards(&self) -> CoreResult<Vec<Card>> {
        let cards = self.aggregator.my_cards().await?;
        self.state.write().replace(cards.clone(), self.clock.now());
        self.event_bus.publish(DashboardEvent::CardsRefreshed { count: cards.len() });
        Ok(cards)
    }

    /// One of the member's recent cards, from a fresh aggregation
    pub async fn card(&self, card_id: &str) -> CoreResult<Card> {
        validate_id("cardId", card_id)?;
        self.my_cards()
            .await?
            .into_iter()
            .find(|card| card.id == card_id)
            .ok_or_else(|| CoreError::CardNotFound {
                card_id: card_id.to_string(),
            })
    }

    /// Lists of a board, in board order; their names are remembered for moves
    pub async fn board_lists(&self, board_id: &str) -> CoreResult<Vec<List>> {
        validate_id("board ID", board_id)?;
        let lists = self.api.board_lists(board_id).await?;
        self.cache.remember_lists(&lists);
        Ok(lists)
    }

    /// Move a card once Trello confirms it; the snapshot is untouched on failure
    pub async fn move_card(&self, card_id: &str, list_id: &str) -> CoreResult<Value> {
        validate_id("cardId", card_id)?;
        validate_id("newListId", list_id)?;

        let mutation = MoveCard {
            card_id: card_id.to_string(),
            list_id: list_id.to_string(),
            list_name: self
                .cache
                .list_name(list_id)
                .unwrap_or_else(|| UNKNOWN_LIST.to_string()),
        };

        let result = confirmed(&self.state, &mutation, || {
            self.api.move_card(card_id, list_id)
        })
        .await;

        match result {
            Ok(payload) => {
                info!(card_id, list_id, list = %mutation.list_name, "Card moved");
                self.event_bus.publish(DashboardEvent::CardMoved {
                    card_id: mutation.card_id,
                    list_id: mutation.list_id,
                    list_name: mutation.list_name,
                });
                Ok(payload)
            }
            Err(e) => {
                warn!(
                    card_id,
                    list_id,
                    status = ?e.upstream_status(),
                    error = %e,
                    "Failed to move card"
                );
                Err(e)
            }
        }
    }

    /// Check or uncheck an item, showing the change before Trello confirms it
    pub async fn toggle_check_item(
        &self,
        card_id: &str,
        checklist_id: Option<&str>,
        check_item_id: &str,
        checked: bool,
    ) -> CoreResult<Value> {
        self.set_check_item_state(
            card_id,
            checklist_id,
            check_item_id,
            CheckState::from_checked(checked),
        )
        .await
    }

    /// Set an item's state optimistically; rolled back if Trello refuses
    pub async fn set_check_item_state(
        &self,
        card_id: &str,
        checklist_id: Option<&str>,
        check_item_id: &str,
        state: CheckState,
    ) -> CoreResult<Value> {
        validate_id("cardId", card_id)?;
        validate_id("checkItemId", check_item_id)?;

        let checklist_id = checklist_id
            .map(str::to_string)
            .or_else(|| self.state.read().checklist_of(card_id, check_item_id));
        let mutation = SetCheckItemState {
            card_id: card_id.to_string(),
            checklist_id,
            check_item_id: check_item_id.to_string(),
            state,
        };

        let result = optimistic(&self.state, &mutation, || {
            self.api.update_check_item(card_id, check_item_id, state)
        })
        .await;

        match result {
            Ok(payload) => {
                self.cache.update_check_item(card_id, check_item_id, state);
                self.event_bus.publish(DashboardEvent::CheckItemChanged {
                    card_id: card_id.to_string(),
                    check_item_id: check_item_id.to_string(),
                    state,
                });
                Ok(payload)
            }
            Err(e) => {
                let restored = self
                    .state
                    .read()
                    .card(card_id)
                    .and_then(|card| {
                        card.checklists()
                            .iter()
                            .flat_map(|c| c.check_items.iter())
                            .find(|item| item.id == check_item_id)
                            .map(|item| item.state)
                    });
                warn!(
                    card_id,
                    check_item_id,
                    status = ?e.upstream_status(),
                    error = %e,
                    "Check item update rolled back"
                );
                if let Some(restored) = restored {
                    self.event_bus.publish(DashboardEvent::CheckItemReverted {
                        card_id: card_id.to_string(),
                        check_item_id: check_item_id.to_string(),
                        state: restored,
                        message: e.to_string(),
                    });
                }
                Err(e)
            }
        }
    }
}
