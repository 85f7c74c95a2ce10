//! Data models for cardboard

pub mod board;
pub mod card;
pub mod checklist;

pub use board::{Board, List, Named};
pub use card::{Card, DueStatus, CARD_FIELDS, DUE_SOON_DAYS};
pub use checklist::{completion_percent, CheckItem, CheckState, Checklist};
