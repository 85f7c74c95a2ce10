//! Card aggregator
//!
//! Fetches the member's cards, drops the stale ones, resolves board names,
//! list names and checklists through the [`LookupCache`], and returns the
//! enriched cards most recent first.

use crate::batch::BatchFetcher;
use crate::cache::LookupCache;
use crate::client::TrelloApi;
use crate::clock::{recency_cutoff, Clock};
use crate::config::DashboardConfig;
use crate::error::CoreResult;
use crate::models::Card;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub const UNKNOWN_BOARD: &str = "Unknown Board";
pub const UNKNOWN_LIST: &str = "Unknown List";

/// Builds the enriched card view
#[derive(Clone)]
pub struct CardAggregator {
    api: Arc<dyn TrelloApi>,
    fetcher: BatchFetcher,
    cache: Arc<LookupCache>,
    clock: Arc<dyn Clock>,
    recent_months: u32,
}

impl CardAggregator {
    pub fn new(
        api: Arc<dyn TrelloApi>,
        cache: Arc<LookupCache>,
        clock: Arc<dyn Clock>,
        config: &DashboardConfig,
    ) -> Self {
        let fetcher = BatchFetcher::with_chunk_size(Arc::clone(&api), config.batch_size);
        Self {
            api,
            fetcher,
            cache,
            clock,
            recent_months: config.recent_months,
        }
    }

    pub fn cache(&self) -> &Arc<LookupCache> {
        &self.cache
    }

    /// The authenticated member's recent cards, enriched and sorted
    ///
    /// A failure of the card listing or of any batch call fails the whole
    /// aggregation; an individual lookup that fails falls back to a placeholder.
    pub async fn my_cards(&self) -> CoreResult<Vec<Card>> {
        let start = Instant::now();

        let cards = self.api.my_cards().await?;
        let fetched = cards.len();

        let cutoff = recency_cutoff(self.clock.now(), self.recent_months);
        let recent: Vec<Card> = cards
            .into_iter()
            .filter(|card| card.date_last_activity >= cutoff)
            .collect();
        debug!(fetched, recent = recent.len(), cutoff = %cutoff, "Filtered cards by activity");

        let board_ids = distinct(recent.iter().map(|card| card.id_board.as_str()));
        let list_ids = distinct(recent.iter().map(|card| card.id_list.as_str()));
        let card_ids = distinct(recent.iter().map(|card| card.id.as_str()));

        let board_names = self
            .cache
            .resolve_board_names(&self.fetcher, &board_ids)
            .await?;
        let list_names = self
            .cache
            .resolve_list_names(&self.fetcher, &list_ids)
            .await?;
        let checklists = self
            .cache
            .resolve_checklists(&self.fetcher, &card_ids)
            .await?;

        let mut enriched: Vec<Card> = recent
            .into_iter()
            .map(|mut card| {
                card.board_name = Some(name_or(&board_names, &card.id_board, UNKNOWN_BOARD));
                card.list_name = Some(name_or(&list_names, &card.id_list, UNKNOWN_LIST));
                card.checklists = Some(checklists.get(&card.id).cloned().unwrap_or_default());
                card
            })
            .collect();

        // Stable: equal timestamps keep their listing order
        enriched.sort_by(|a, b| b.date_last_activity.cmp(&a.date_last_activity));

        info!(
            fetched,
            shown = enriched.len(),
            boards = board_ids.len(),
            lists = list_ids.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Aggregated cards"
        );

        Ok(enriched)
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}

fn name_or(names: &HashMap<String, String>, id: &str, fallback: &str) -> String {
    names
        .get(id)
        .filter(|name| !name.is_empty())
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}
