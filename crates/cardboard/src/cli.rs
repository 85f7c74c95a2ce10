//! Terminal output for the card and list commands

use cardboard_core::models::{completion_percent, Card, DueStatus, List};
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

// ============================================================================
// Formatters
// ============================================================================

/// Format cards as table (human) or JSON
pub fn format_card_table(cards: &[Card], now: DateTime<Utc>, json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(cards).unwrap_or_else(|_| "[]".to_string());
    }

    if cards.is_empty() {
        return "No recently active cards.".to_string();
    }

    let headers = ["Board", "List", "Card", "Last activity", "Due", "Checklist"];
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if no_color {
        table.set_header(headers.to_vec());
    } else {
        table.set_header(headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
    }

    for card in cards {
        let board = card.board_name.as_deref().unwrap_or("-");
        let list = card.list_name.as_deref().unwrap_or("-");
        let name = truncate(&card.name, 40);
        let activity = card.date_last_activity.format("%Y-%m-%d %H:%M").to_string();
        let checklist = format_progress(card.check_progress());
        let due = format_due(card, now);

        let due_cell = match (no_color, card.due_status(now)) {
            (false, Some(DueStatus::Urgent)) => Cell::new(&due).fg(Color::Red),
            _ => Cell::new(&due),
        };

        table.add_row(Row::from(vec![
            Cell::new(board),
            Cell::new(list),
            Cell::new(&name),
            Cell::new(&activity),
            due_cell,
            Cell::new(&checklist),
        ]));
    }

    table.to_string()
}

/// Characters of description shown in the card detail view
pub const DESCRIPTION_PREVIEW_CHARS: usize = 200;

/// Format one card with its description and checklists (human) or JSON
pub fn format_card_detail(card: &Card, now: DateTime<Utc>, json: bool) -> String {
    if json {
        return serde_json::to_string_pretty(card).unwrap_or_else(|_| "{}".to_string());
    }

    let mut due = format_due(card, now);
    if card.due_status(now) == Some(DueStatus::Urgent) {
        due.push_str(" (urgent)");
    }

    let mut lines = vec![card.name.clone()];
    lines.push(format!(
        "  Board:          {}",
        card.board_name.as_deref().unwrap_or("-")
    ));
    lines.push(format!(
        "  List:           {}",
        card.list_name.as_deref().unwrap_or("-")
    ));
    lines.push(format!(
        "  Last activity:  {}",
        card.date_last_activity.format("%Y-%m-%d %H:%M")
    ));
    lines.push(format!("  Due:            {}", due));
    lines.push(format!("  URL:            {}", card.url));
    if let Some(preview) = card.description_preview(DESCRIPTION_PREVIEW_CHARS) {
        lines.push(format!("  Description:    {}", preview));
    }

    if card.checklists().is_empty() {
        lines.push(String::new());
        lines.push("No checklists.".to_string());
    }
    for checklist in card.checklists() {
        lines.push(String::new());
        lines.push(format!(
            "{}  {}%",
            checklist.name,
            checklist.completion_percent()
        ));
        for item in checklist.items_incomplete_first() {
            let mark = if item.state.is_complete() { 'x' } else { ' ' };
            lines.push(format!("  [{}] {}", mark, item.name));
        }
    }

    lines.join("\n")
}

/// Format board lists, one per line, or as JSON
pub fn format_lists(lists: &[List], json: bool) -> String {
    if json {
        return serde_json::to_string_pretty(lists).unwrap_or_else(|_| "[]".to_string());
    }

    if lists.is_empty() {
        return "Board has no lists.".to_string();
    }

    lists
        .iter()
        .map(|list| format!("{}  {}", list.id, list.name))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Utilities
// ============================================================================

fn format_due(card: &Card, now: DateTime<Utc>) -> String {
    match card.days_until_due(now) {
        None => "-".to_string(),
        Some(0) => "today".to_string(),
        Some(days) if days < 0 => format!("overdue {}d", -days),
        Some(days) => format!("in {}d", days),
    }
}

fn format_progress((done, total): (usize, usize)) -> String {
    if total == 0 {
        return "-".to_string();
    }
    format!("{}/{} ({}%)", done, total, completion_percent(done, total))
}

fn truncate(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        s.to_string()
    } else {
        // Char-based so multi-byte names never split mid-character
        s.chars().take(max - 1).collect::<String>() + "…"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cardboard_core::fake::sample_card;
    use cardboard_core::models::{CheckItem, CheckState, Checklist};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn enriched_card() -> Card {
        let mut card = sample_card("c1", "b1", "l1", now());
        card.name = "Write release notes".to_string();
        card.board_name = Some("Work".to_string());
        card.list_name = Some("Doing".to_string());
        card.due = Some(now() + Duration::days(2));
        card.checklists = Some(vec![Checklist {
            id: "cl1".to_string(),
            name: "Steps".to_string(),
            check_items: vec![
                CheckItem {
                    id: "i1".to_string(),
                    name: "draft".to_string(),
                    state: CheckState::Complete,
                    due: None,
                },
                CheckItem {
                    id: "i2".to_string(),
                    name: "review".to_string(),
                    state: CheckState::Incomplete,
                    due: None,
                },
            ],
        }]);
        card
    }

    #[test]
    fn test_card_table_plain() {
        let table = format_card_table(&[enriched_card()], now(), false, true);

        assert!(table.contains("Work"));
        assert!(table.contains("Doing"));
        assert!(table.contains("Write release notes"));
        assert!(table.contains("in 2d"));
        assert!(table.contains("1/2 (50%)"));
        assert!(!table.contains('\u{1b}'));
    }

    #[test]
    fn test_card_table_json() {
        let output = format_card_table(&[enriched_card()], now(), true, false);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["boardName"], "Work");
    }

    #[test]
    fn test_card_table_empty() {
        assert_eq!(
            format_card_table(&[], now(), false, true),
            "No recently active cards."
        );
    }

    #[test]
    fn test_progress_agrees_with_checklist_percent() {
        let mut card = enriched_card();
        if let Some(checklists) = card.checklists.as_mut() {
            checklists[0].check_items.push(CheckItem {
                id: "i3".to_string(),
                name: "publish".to_string(),
                state: CheckState::Complete,
                due: None,
            });
        }
        let checklist = &card.checklists()[0];
        assert_eq!(checklist.completion_percent(), 67);

        let expected = format!("({}%)", checklist.completion_percent());
        assert!(format_progress(card.check_progress()).contains(&expected));
    }

    #[test]
    fn test_card_detail() {
        let mut card = enriched_card();
        card.desc = Some("x".repeat(250));

        let detail = format_card_detail(&card, now(), false);
        let lines: Vec<&str> = detail.lines().collect();

        assert_eq!(lines[0], "Write release notes");
        assert!(detail.contains("Board:          Work"));
        assert!(detail.contains("Due:            in 2d (urgent)"));
        assert!(detail.contains(&format!("Description:    {}...", "x".repeat(200))));
        assert!(!detail.contains(&"x".repeat(201)));

        let heading = lines.iter().position(|l| *l == "Steps  50%").unwrap();
        assert_eq!(lines[heading + 1], "  [ ] review");
        assert_eq!(lines[heading + 2], "  [x] draft");
    }

    #[test]
    fn test_card_detail_without_checklists() {
        let mut card = sample_card("c1", "b1", "l1", now());
        card.due = Some(now() + Duration::days(30));

        let detail = format_card_detail(&card, now(), false);

        assert!(detail.contains("Due:            in 30d"));
        assert!(!detail.contains("urgent"));
        assert!(!detail.contains("Description"));
        assert!(detail.ends_with("No checklists."));
    }

    #[test]
    fn test_card_detail_json() {
        let output = format_card_detail(&enriched_card(), now(), true);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["listName"], "Doing");
    }

    #[test]
    fn test_format_lists() {
        let lists = vec![
            List {
                id: "l1".to_string(),
                name: "Doing".to_string(),
            },
            List {
                id: "l2".to_string(),
                name: "Done".to_string(),
            },
        ];
        assert_eq!(format_lists(&lists, false), "l1  Doing\nl2  Done");
        assert_eq!(format_lists(&[], false), "Board has no lists.");
    }

    #[test]
    fn test_format_due() {
        let mut card = sample_card("c1", "b1", "l1", now());
        assert_eq!(format_due(&card, now()), "-");

        card.due = Some(now() - Duration::days(3));
        assert_eq!(format_due(&card, now()), "overdue 3d");

        card.due = Some(now());
        assert_eq!(format_due(&card, now()), "today");
    }

    #[test]
    fn test_format_progress() {
        assert_eq!(format_progress((0, 0)), "-");
        assert_eq!(format_progress((2, 3)), "2/3 (67%)");
        assert_eq!(format_progress((1, 3)), "1/3 (33%)");
    }

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate("hello world", 20), "hello world");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("日本語テスト", 4), "日本語…");
    }
}
