//! In-memory [`TrelloApi`] for tests
//!
//! Answers batch paths from its own tables the way Trello does (`{"200": ..}`
//! or `{"404": ..}` per entry) and records every call it receives.

use crate::client::{BatchEntry, TrelloApi};
use crate::error::{CoreError, CoreResult};
use crate::models::{Card, CheckState, Checklist, List};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

#[derive(Default)]
struct FakeState {
    cards: Vec<Card>,
    boards: HashMap<String, String>,
    lists: HashMap<String, String>,
    checklists: HashMap<String, Vec<Checklist>>,
    failing_checklists: HashSet<String>,
    board_lists: HashMap<String, Vec<List>>,

    fail_cards: bool,
    fail_batches: bool,
    fail_mutations: Option<String>,
    truncate_batches_to: Option<usize>,

    card_calls: usize,
    batch_calls: Vec<Vec<String>>,
    move_calls: Vec<(String, String)>,
    check_item_calls: Vec<(String, String, CheckState)>,
}

/// Scriptable stand-in for the Trello API
#[derive(Default)]
pub struct FakeTrello {
    state: Mutex<FakeState>,
}

/// Build a card the way `/members/me/cards` returns it
pub fn sample_card(id: &str, board: &str, list: &str, last_activity: DateTime<Utc>) -> Card {
    Card {
        id: id.to_string(),
        name: format!("Card {}", id),
        url: format!("https://trello.com/c/{}", id),
        id_board: board.to_string(),
        id_list: list.to_string(),
        date_last_activity: last_activity,
        desc: None,
        due: None,
        board_name: None,
        list_name: None,
        checklists: None,
    }
}

fn upstream_failure(operation: &str, message: &str) -> CoreError {
    CoreError::UpstreamStatus {
        operation: operation.to_string(),
        status: 500,
        message: message.to_string(),
    }
}

impl FakeTrello {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cards(&self, cards: Vec<Card>) {
        self.state.lock().cards = cards;
    }

    pub fn add_board(&self, id: &str, name: &str) {
        self.state
            .lock()
            .boards
            .insert(id.to_string(), name.to_string());
    }

    pub fn add_list(&self, id: &str, name: &str) {
        self.state
            .lock()
            .lists
            .insert(id.to_string(), name.to_string());
    }

    pub fn set_checklists(&self, card_id: &str, checklists: Vec<Checklist>) {
        self.state
            .lock()
            .checklists
            .insert(card_id.to_string(), checklists);
    }

    /// Checklist lookups for this card answer 404
    pub fn fail_checklists_for(&self, card_id: &str) {
        self.state
            .lock()
            .failing_checklists
            .insert(card_id.to_string());
    }

    pub fn set_board_lists(&self, board_id: &str, lists: Vec<List>) {
        self.state
            .lock()
            .board_lists
            .insert(board_id.to_string(), lists);
    }

    pub fn fail_cards(&self, fail: bool) {
        self.state.lock().fail_cards = fail;
    }

    pub fn fail_batches(&self, fail: bool) {
        self.state.lock().fail_batches = fail;
    }

    /// Make mutations answer an upstream error with this message
    pub fn fail_mutations(&self, message: Option<&str>) {
        self.state.lock().fail_mutations = message.map(str::to_string);
    }

    /// Drop batch entries beyond this many per call
    pub fn truncate_batches_to(&self, len: Option<usize>) {
        self.state.lock().truncate_batches_to = len;
    }

    pub fn card_calls(&self) -> usize {
        self.state.lock().card_calls
    }

    pub fn batch_calls(&self) -> Vec<Vec<String>> {
        self.state.lock().batch_calls.clone()
    }

    /// Every path requested through the batch endpoint, flattened
    pub fn batched_paths(&self) -> Vec<String> {
        self.state.lock().batch_calls.concat()
    }

    pub fn move_calls(&self) -> Vec<(String, String)> {
        self.state.lock().move_calls.clone()
    }

    pub fn check_item_calls(&self) -> Vec<(String, String, CheckState)> {
        self.state.lock().check_item_calls.clone()
    }

    fn answer(state: &FakeState, path: &str) -> BatchEntry {
        let (resource, _query) = path.split_once('?').unwrap_or((path, ""));
        let segments: Vec<&str> = resource.trim_start_matches('/').split('/').collect();

        let found = match segments.as_slice() {
            ["boards", id] => state
                .boards
                .get(*id)
                .map(|name| json!({ "id": id, "name": name })),
            ["lists", id] => state
                .lists
                .get(*id)
                .map(|name| json!({ "id": id, "name": name })),
            ["cards", id, "checklists"] if !state.failing_checklists.contains(*id) => Some(
                serde_json::to_value(state.checklists.get(*id).cloned().unwrap_or_default())
                    .unwrap_or(Value::Null),
            ),
            _ => None,
        };

        let mut entry = BatchEntry::new();
        match found {
            Some(payload) => entry.insert("200".to_string(), payload),
            None => entry.insert(
                "404".to_string(),
                json!("The requested resource was not found."),
            ),
        };
        entry
    }
}

#[async_trait]
impl TrelloApi for FakeTrello {
    async fn my_cards(&self) -> CoreResult<Vec<Card>> {
        let mut state = self.state.lock();
        state.card_calls += 1;
        if state.fail_cards {
            return Err(upstream_failure("fetch cards", "Network response was not ok"));
        }
        Ok(state.cards.clone())
    }

    async fn batch(&self, urls: &[String]) -> CoreResult<Vec<BatchEntry>> {
        let mut state = self.state.lock();
        state.batch_calls.push(urls.to_vec());
        if state.fail_batches {
            return Err(upstream_failure("run batch request", "Batch request failed"));
        }
        let mut entries: Vec<BatchEntry> =
            urls.iter().map(|url| Self::answer(&state, url)).collect();
        if let Some(len) = state.truncate_batches_to {
            entries.truncate(len);
        }
        Ok(entries)
    }

    async fn board_lists(&self, board_id: &str) -> CoreResult<Vec<List>> {
        let state = self.state.lock();
        state
            .board_lists
            .get(board_id)
            .cloned()
            .ok_or_else(|| CoreError::UpstreamStatus {
                operation: "fetch board lists".to_string(),
                status: 404,
                message: "Failed to fetch lists".to_string(),
            })
    }

    async fn move_card(&self, card_id: &str, list_id: &str) -> CoreResult<Value> {
        let mut state = self.state.lock();
        state
            .move_calls
            .push((card_id.to_string(), list_id.to_string()));
        if let Some(message) = &state.fail_mutations {
            return Err(upstream_failure("move card", message));
        }
        Ok(json!({ "id": card_id, "idList": list_id }))
    }

    async fn update_check_item(
        &self,
        card_id: &str,
        check_item_id: &str,
        state_value: CheckState,
    ) -> CoreResult<Value> {
        let mut state = self.state.lock();
        state.check_item_calls.push((
            card_id.to_string(),
            check_item_id.to_string(),
            state_value,
        ));
        if let Some(message) = &state.fail_mutations {
            return Err(upstream_failure("update check item", message));
        }
        if let Some(checklists) = state.checklists.get_mut(card_id) {
            for checklist in checklists.iter_mut() {
                if let Some(item) = checklist.item_mut(check_item_id) {
                    item.state = state_value;
                }
            }
        }
        Ok(json!({ "id": check_item_id, "state": state_value }))
    }
}
