//! Checklist models
//!
//! Checklists are fetched per card and carry the only state a user can change
//! from the dashboard: the completion flag of each check item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Completion state of a check item, as Trello spells it on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Complete,
    Incomplete,
}

impl CheckState {
    /// Map a checkbox value onto a state
    pub fn from_checked(checked: bool) -> Self {
        if checked {
            CheckState::Complete
        } else {
            CheckState::Incomplete
        }
    }

    pub fn is_complete(self) -> bool {
        self == CheckState::Complete
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckState::Complete => "complete",
            CheckState::Incomplete => "incomplete",
        }
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complete" => Ok(CheckState::Complete),
            "incomplete" => Ok(CheckState::Incomplete),
            other => Err(format!(
                "invalid check item state '{}' (expected complete or incomplete)",
                other
            )),
        }
    }
}

/// Individual togglable entry of a checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckItem {
    pub id: String,
    pub name: String,
    pub state: CheckState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
}

/// Named group of check items attached to a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub check_items: Vec<CheckItem>,
}

/// `done` out of `total` as a rounded percentage; 0 when `total` is 0
pub fn completion_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((done as f64 / total as f64) * 100.0).round() as u8
}

impl Checklist {
    /// Percentage of complete items, rounded; 0 for an empty checklist
    pub fn completion_percent(&self) -> u8 {
        let done = self
            .check_items
            .iter()
            .filter(|item| item.state.is_complete())
            .count();
        completion_percent(done, self.check_items.len())
    }

    /// Items with incomplete ones first, relative order otherwise kept
    pub fn items_incomplete_first(&self) -> Vec<&CheckItem> {
        let mut items: Vec<&CheckItem> = self.check_items.iter().collect();
        items.sort_by_key(|item| item.state.is_complete());
        items
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut CheckItem> {
        self.check_items.iter_mut().find(|item| item.id == item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, state: CheckState) -> CheckItem {
        CheckItem {
            id: id.to_string(),
            name: format!("item {}", id),
            state,
            due: None,
        }
    }

    #[test]
    fn test_completion_percent() {
        let mut checklist = Checklist {
            id: "cl1".to_string(),
            name: "Todo".to_string(),
            check_items: vec![],
        };
        assert_eq!(checklist.completion_percent(), 0);

        checklist.check_items = vec![
            item("a", CheckState::Complete),
            item("b", CheckState::Incomplete),
            item("c", CheckState::Incomplete),
        ];
        assert_eq!(checklist.completion_percent(), 33);

        checklist.check_items[1].state = CheckState::Complete;
        assert_eq!(checklist.completion_percent(), 67);
    }

    #[test]
    fn test_items_incomplete_first_is_stable() {
        let checklist = Checklist {
            id: "cl1".to_string(),
            name: "Todo".to_string(),
            check_items: vec![
                item("a", CheckState::Complete),
                item("b", CheckState::Incomplete),
                item("c", CheckState::Complete),
                item("d", CheckState::Incomplete),
            ],
        };

        let ids: Vec<&str> = checklist
            .items_incomplete_first()
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_check_state_wire_format() {
        let parsed: CheckItem =
            serde_json::from_str(r#"{"id":"i1","name":"Ship","state":"complete","pos":16384}"#)
                .unwrap();
        assert_eq!(parsed.state, CheckState::Complete);
        assert_eq!(
            serde_json::to_value(CheckState::Incomplete).unwrap(),
            serde_json::json!("incomplete")
        );
        assert!("done".parse::<CheckState>().is_err());
        assert_eq!(CheckState::from_checked(true), CheckState::Complete);
    }
}
