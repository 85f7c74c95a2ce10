//! Local view model: the last aggregated cards as the dashboard shows them

use crate::models::{Card, CheckItem};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    cards: Vec<Card>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl DashboardState {
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards,
            refreshed_at: None,
        }
    }

    /// Replace the snapshot with a fresh aggregation
    pub fn replace(&mut self, cards: Vec<Card>, at: DateTime<Utc>) {
        self.cards = cards;
        self.refreshed_at = Some(at);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == card_id)
    }

    pub fn card_mut(&mut self, card_id: &str) -> Option<&mut Card> {
        self.cards.iter_mut().find(|card| card.id == card_id)
    }

    /// Owning checklist id of a check item on a card
    pub fn checklist_of(&self, card_id: &str, check_item_id: &str) -> Option<String> {
        self.card(card_id)?
            .checklists()
            .iter()
            .find(|checklist| checklist.check_items.iter().any(|i| i.id == check_item_id))
            .map(|checklist| checklist.id.clone())
    }

    /// Mutable check item, optionally restricted to one checklist
    pub fn check_item_mut(
        &mut self,
        card_id: &str,
        checklist_id: Option<&str>,
        check_item_id: &str,
    ) -> Option<&mut CheckItem> {
        self.card_mut(card_id)?
            .checklists
            .as_mut()?
            .iter_mut()
            .filter(|checklist| checklist_id.is_none_or(|id| checklist.id == id))
            .find_map(|checklist| checklist.item_mut(check_item_id))
    }
}
