//! Card model, as returned by Trello and as enriched by the aggregator

use super::Checklist;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields requested from `/members/me/cards`
pub const CARD_FIELDS: &str = "name,url,idBoard,idList,dateLastActivity,desc,due";

/// Days remaining at or below which a due date is flagged
pub const DUE_SOON_DAYS: i64 = 5;

/// A Trello card assigned to the authenticated member
///
/// The `board_name`, `list_name` and `checklists` fields are empty on cards
/// straight from the API and filled in by [`crate::CardAggregator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    pub url: String,
    pub id_board: String,
    pub id_list: String,
    pub date_last_activity: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklists: Option<Vec<Checklist>>,
}

/// How close a card is to its due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    /// Due within [`DUE_SOON_DAYS`] days, or already overdue
    Urgent,
    Upcoming,
}

impl Card {
    /// Whole days until due, rounded up; negative when overdue
    pub fn days_until_due(&self, now: DateTime<Utc>) -> Option<i64> {
        let due = self.due?;
        let millis = due.signed_duration_since(now).num_milliseconds() as f64;
        Some((millis / 86_400_000.0).ceil() as i64)
    }

    pub fn due_status(&self, now: DateTime<Utc>) -> Option<DueStatus> {
        self.days_until_due(now).map(|days| {
            if days <= DUE_SOON_DAYS {
                DueStatus::Urgent
            } else {
                DueStatus::Upcoming
            }
        })
    }

    /// Description cut to `limit` characters, with `...` when truncated
    pub fn description_preview(&self, limit: usize) -> Option<String> {
        let desc = self.desc.as_deref().filter(|d| !d.trim().is_empty())?;
        if desc.chars().count() <= limit {
            return Some(desc.to_string());
        }
        let cut: String = desc.chars().take(limit).collect();
        Some(format!("{}...", cut))
    }

    /// Checklists attached by the aggregator (empty before enrichment)
    pub fn checklists(&self) -> &[Checklist] {
        self.checklists.as_deref().unwrap_or(&[])
    }

    /// Complete and total check items across every checklist
    pub fn check_progress(&self) -> (usize, usize) {
        self.checklists()
            .iter()
            .flat_map(|c| c.check_items.iter())
            .fold((0, 0), |(done, total), item| {
                (done + usize::from(item.state.is_complete()), total + 1)
            })
    }
}
