//! End-to-end properties of the card view, driven through the in-memory Trello fake

use cardboard_core::clock::recency_cutoff;
use cardboard_core::fake::{sample_card, FakeTrello};
use cardboard_core::{
    CardAggregator, DashboardConfig, FixedClock, LookupCache, UNKNOWN_BOARD, UNKNOWN_LIST,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
}

/// Deterministic spread of activity timestamps, with deliberate ties
fn activity(i: u64) -> DateTime<Utc> {
    let hours = (i * 7919 % 4000) as i64;
    now() - Duration::hours(hours - hours % 24)
}

fn build(fake: &Arc<FakeTrello>) -> CardAggregator {
    CardAggregator::new(
        fake.clone(),
        Arc::new(LookupCache::new()),
        Arc::new(FixedClock::new(now())),
        &DashboardConfig::new("key", "token"),
    )
}

#[tokio::test]
async fn test_output_is_recent_sorted_and_stable() {
    let fake = Arc::new(FakeTrello::new());
    let cards: Vec<_> = (0..57)
        .map(|i| {
            sample_card(
                &format!("c{}", i),
                &format!("b{}", i % 5),
                &format!("l{}", i % 13),
                activity(i),
            )
        })
        .collect();
    fake.set_cards(cards.clone());
    for b in 0..4 {
        fake.add_board(&format!("b{}", b), &format!("Board {}", b));
    }
    for l in 0..13 {
        fake.add_list(&format!("l{}", l), &format!("List {}", l));
    }

    let output = build(&fake).my_cards().await.unwrap();
    let cutoff = recency_cutoff(now(), 3);

    assert!(output.len() <= cards.len());
    assert_eq!(
        output.len(),
        cards
            .iter()
            .filter(|c| c.date_last_activity >= cutoff)
            .count()
    );
    assert!(output.iter().all(|c| c.date_last_activity >= cutoff));

    for pair in output.windows(2) {
        assert!(pair[0].date_last_activity >= pair[1].date_last_activity);
        if pair[0].date_last_activity == pair[1].date_last_activity {
            let pos = |id: &str| cards.iter().position(|c| c.id == id).unwrap();
            assert!(pos(&pair[0].id) < pos(&pair[1].id));
        }
    }

    for card in &output {
        let expected_board = if card.id_board == "b4" {
            UNKNOWN_BOARD.to_string()
        } else {
            format!("Board {}", &card.id_board[1..])
        };
        assert_eq!(card.board_name.as_deref(), Some(expected_board.as_str()));
        assert_ne!(card.list_name.as_deref(), Some(UNKNOWN_LIST));
        assert!(card.checklists.is_some());
    }

    for call in fake.batch_calls() {
        assert!(call.len() <= 10);
    }
}

#[tokio::test]
async fn test_second_pass_issues_no_batch_calls() {
    let fake = Arc::new(FakeTrello::new());
    fake.set_cards(
        (0..25)
            .map(|i| sample_card(&format!("c{}", i), "b1", &format!("l{}", i % 3), now()))
            .collect(),
    );
    fake.add_board("b1", "Work");
    for l in 0..3 {
        fake.add_list(&format!("l{}", l), "Column");
    }
    let aggregator = build(&fake);

    aggregator.my_cards().await.unwrap();
    let first_pass = fake.batch_calls().len();
    // one board, one list chunk, three checklist chunks
    assert_eq!(first_pass, 5);

    aggregator.my_cards().await.unwrap();
    assert_eq!(fake.batch_calls().len(), first_pass);

    let stats = aggregator.cache().stats();
    assert_eq!(stats.boards.entries, 1);
    assert_eq!(stats.lists.entries, 3);
    assert_eq!(stats.checklists.entries, 25);
}
