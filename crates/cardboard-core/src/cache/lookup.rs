//! Lookup cache for board names, list names and per-card checklists
//!
//! Entries live for the whole process and are never invalidated. Each table
//! serializes its read-check / fetch / write sequence behind an async mutex so
//! two concurrent aggregations cannot fetch the same ids twice or overwrite
//! each other's results.

use crate::batch::{BatchFetcher, BatchItem};
use crate::error::CoreResult;
use crate::models::{Board, CheckState, Checklist, List, Named};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// Counters for one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Resolutions that had to go to the batch endpoint
    pub fetches: u64,
}

impl TableStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }
        self.hits as f64 / lookups as f64
    }
}

/// Snapshot of every table's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub boards: TableStats,
    pub lists: TableStats,
    pub checklists: TableStats,
}

impl CacheStats {
    pub fn total_entries(&self) -> usize {
        self.boards.entries + self.lists.entries + self.checklists.entries
    }
}

struct LookupTable<V> {
    kind: &'static str,
    entries: DashMap<String, V>,
    fetch_gate: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
}

impl<V: Clone> LookupTable<V> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: DashMap::new(),
            fetch_gate: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
        }
    }

    fn get(&self, id: &str) -> Option<V> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    fn stats(&self) -> TableStats {
        TableStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
        }
    }

    /// Resolve `ids`, fetching the uncached ones in a single batch call
    ///
    /// `extract` turns a fetched payload into the key/value to store, given
    /// the id that was requested for it. Failed or rejected items are left out
    /// of the result and are not cached.
    async fn resolve<T, P, E>(
        &self,
        fetcher: &BatchFetcher,
        ids: &[String],
        path_for: P,
        extract: E,
    ) -> CoreResult<HashMap<String, V>>
    where
        T: DeserializeOwned,
        P: Fn(&str) -> String,
        E: Fn(&str, T) -> Option<(String, V)>,
    {
        let _gate = self.fetch_gate.lock().await;

        let mut resolved = HashMap::with_capacity(ids.len());
        let mut to_fetch = Vec::new();
        let mut seen = HashSet::new();

        for id in ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            match self.get(id) {
                Some(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    resolved.insert(id.clone(), value);
                }
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    to_fetch.push(id.clone());
                }
            }
        }

        debug!(
            kind = self.kind,
            cached = resolved.len(),
            to_fetch = to_fetch.len(),
            "Resolving through lookup cache"
        );

        if to_fetch.is_empty() {
            return Ok(resolved);
        }

        self.fetches.fetch_add(1, Ordering::Relaxed);
        let paths: Vec<String> = to_fetch.iter().map(|id| path_for(id)).collect();
        let items: Vec<BatchItem<T>> = fetcher.fetch(&paths).await?;

        for (id, item) in to_fetch.iter().zip(items) {
            let Some(payload) = item.found() else {
                continue;
            };
            if let Some((key, value)) = extract(id, payload) {
                self.entries.insert(key.clone(), value.clone());
                resolved.insert(key, value);
            }
        }

        Ok(resolved)
    }
}

fn named_entry<T: Named>(_requested: &str, payload: T) -> Option<(String, String)> {
    if payload.id().is_empty() {
        return None;
    }
    Some((payload.id().to_string(), payload.name().to_string()))
}

/// Process-wide cache shared by every aggregation
pub struct LookupCache {
    boards: LookupTable<String>,
    lists: LookupTable<String>,
    checklists: LookupTable<Vec<Checklist>>,
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LookupCache {
    pub fn new() -> Self {
        Self {
            boards: LookupTable::new("boards"),
            lists: LookupTable::new("lists"),
            checklists: LookupTable::new("checklists"),
        }
    }

    /// Board id -> name for every id that resolves
    pub async fn resolve_board_names(
        &self,
        fetcher: &BatchFetcher,
        board_ids: &[String],
    ) -> CoreResult<HashMap<String, String>> {
        self.boards
            .resolve(
                fetcher,
                board_ids,
                |id| format!("/boards/{}?fields=name", id),
                named_entry::<Board>,
            )
            .await
    }

    /// List id -> name for every id that resolves
    pub async fn resolve_list_names(
        &self,
        fetcher: &BatchFetcher,
        list_ids: &[String],
    ) -> CoreResult<HashMap<String, String>> {
        self.lists
            .resolve(
                fetcher,
                list_ids,
                |id| format!("/lists/{}?fields=name", id),
                named_entry::<List>,
            )
            .await
    }

    /// Card id -> checklists for every card whose lookup succeeded
    pub async fn resolve_checklists(
        &self,
        fetcher: &BatchFetcher,
        card_ids: &[String],
    ) -> CoreResult<HashMap<String, Vec<Checklist>>> {
        self.checklists
            .resolve(
                fetcher,
                card_ids,
                |id| format!("/cards/{}/checklists", id),
                |requested: &str, checklists: Vec<Checklist>| {
                    Some((requested.to_string(), checklists))
                },
            )
            .await
    }

    pub fn board_name(&self, board_id: &str) -> Option<String> {
        self.boards.get(board_id)
    }

    pub fn list_name(&self, list_id: &str) -> Option<String> {
        self.lists.get(list_id)
    }

    pub fn checklists(&self, card_id: &str) -> Option<Vec<Checklist>> {
        self.checklists.get(card_id)
    }

    /// Register list names learned from a board's list listing
    pub fn remember_lists(&self, lists: &[List]) {
        for list in lists {
            self.lists.entries.insert(list.id.clone(), list.name.clone());
        }
    }

    /// Write a confirmed check item state into the cached checklists of a card
    ///
    /// Returns false when the card or item is not cached.
    pub fn update_check_item(&self, card_id: &str, check_item_id: &str, state: CheckState) -> bool {
        let Some(mut entry) = self.checklists.entries.get_mut(card_id) else {
            return false;
        };
        let mut updated = false;
        for checklist in entry.value_mut().iter_mut() {
            if let Some(item) = checklist.item_mut(check_item_id) {
                item.state = state;
                updated = true;
            }
        }
        updated
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            boards: self.boards.stats(),
            lists: self.lists.stats(),
            checklists: self.checklists.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeTrello;
    use crate::models::CheckItem;
    use std::sync::Arc;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn setup() -> (Arc<FakeTrello>, BatchFetcher) {
        let fake = Arc::new(FakeTrello::new());
        let fetcher = BatchFetcher::new(fake.clone());
        (fake, fetcher)
    }

    #[tokio::test]
    async fn test_second_resolution_issues_no_fetch() {
        let (fake, fetcher) = setup();
        fake.add_board("b1", "Work");
        fake.add_board("b2", "Home");
        let cache = LookupCache::new();

        let first = cache
            .resolve_board_names(&fetcher, &ids(&["b1", "b2"]))
            .await
            .unwrap();
        assert_eq!(first.get("b1").map(String::as_str), Some("Work"));
        assert_eq!(fake.batch_calls().len(), 1);

        let second = cache
            .resolve_board_names(&fetcher, &ids(&["b2", "b1"]))
            .await
            .unwrap();
        assert_eq!(second, first);
        assert_eq!(fake.batch_calls().len(), 1);

        let stats = cache.stats().boards;
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.fetches, 1);
    }

    #[tokio::test]
    async fn test_only_missing_ids_are_fetched() {
        let (fake, fetcher) = setup();
        fake.add_list("l1", "Doing");
        fake.add_list("l2", "Done");
        let cache = LookupCache::new();

        cache
            .resolve_list_names(&fetcher, &ids(&["l1"]))
            .await
            .unwrap();
        let names = cache
            .resolve_list_names(&fetcher, &ids(&["l1", "l2", "l2"]))
            .await
            .unwrap();

        assert_eq!(names.len(), 2);
        assert_eq!(
            fake.batch_calls(),
            vec![
                vec!["/lists/l1?fields=name".to_string()],
                vec!["/lists/l2?fields=name".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_lookup_is_not_cached() {
        let (fake, fetcher) = setup();
        let cache = LookupCache::new();

        let names = cache
            .resolve_board_names(&fetcher, &ids(&["gone"]))
            .await
            .unwrap();
        assert!(names.is_empty());
        assert!(cache.board_name("gone").is_none());

        fake.add_board("gone", "Back again");
        let names = cache
            .resolve_board_names(&fetcher, &ids(&["gone"]))
            .await
            .unwrap();
        assert_eq!(names.get("gone").map(String::as_str), Some("Back again"));
        assert_eq!(fake.batch_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_outer_failure_propagates_and_caches_nothing() {
        let (fake, fetcher) = setup();
        fake.add_board("b1", "Work");
        fake.fail_batches(true);
        let cache = LookupCache::new();

        assert!(cache
            .resolve_board_names(&fetcher, &ids(&["b1"]))
            .await
            .is_err());
        assert_eq!(cache.stats().boards.entries, 0);
    }

    #[tokio::test]
    async fn test_checklists_keyed_by_requested_card() {
        let (fake, fetcher) = setup();
        fake.set_checklists(
            "c1",
            vec![Checklist {
                id: "cl1".to_string(),
                name: "Steps".to_string(),
                check_items: vec![CheckItem {
                    id: "i1".to_string(),
                    name: "one".to_string(),
                    state: CheckState::Incomplete,
                    due: None,
                }],
            }],
        );
        fake.fail_checklists_for("c2");
        let cache = LookupCache::new();

        let resolved = cache
            .resolve_checklists(&fetcher, &ids(&["c1", "c2", "c3"]))
            .await
            .unwrap();

        assert_eq!(resolved["c1"].len(), 1);
        assert!(!resolved.contains_key("c2"));
        assert!(resolved["c3"].is_empty());

        assert!(cache.update_check_item("c1", "i1", CheckState::Complete));
        assert_eq!(
            cache.checklists("c1").unwrap()[0].check_items[0].state,
            CheckState::Complete
        );
        assert!(!cache.update_check_item("c1", "missing", CheckState::Complete));
        assert!(!cache.update_check_item("c9", "i1", CheckState::Complete));
    }

    #[tokio::test]
    async fn test_concurrent_resolutions_fetch_once() {
        let (fake, fetcher) = setup();
        fake.add_board("b1", "Work");
        let cache = Arc::new(LookupCache::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let fetcher = fetcher.clone();
                tokio::spawn(async move {
                    cache
                        .resolve_board_names(&fetcher, &["b1".to_string()])
                        .await
                })
            })
            .collect();

        for handle in handles {
            let names = handle.await.unwrap().unwrap();
            assert_eq!(names["b1"], "Work");
        }
        assert_eq!(fake.batch_calls().len(), 1);
    }

    #[test]
    fn test_remember_lists() {
        let cache = LookupCache::new();
        cache.remember_lists(&[List {
            id: "l9".to_string(),
            name: "Blocked".to_string(),
        }]);
        assert_eq!(cache.list_name("l9").as_deref(), Some("Blocked"));
    }
}
