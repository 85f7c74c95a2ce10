//! cardboard-core - Core library for cardboard
//!
//! Trello client, batch fetcher, lookup cache, card aggregator and the
//! optimistic mutation machinery behind the dashboard.

pub mod aggregator;
pub mod batch;
pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod models;
pub mod mutation;
pub mod state;
pub mod store;

pub use aggregator::{CardAggregator, UNKNOWN_BOARD, UNKNOWN_LIST};
pub use batch::{BatchFetcher, BatchItem};
pub use cache::{CacheStats, LookupCache};
pub use client::{TrelloApi, TrelloClient};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::DashboardConfig;
pub use error::{CoreError, CoreResult};
pub use event::{DashboardEvent, EventBus};
pub use store::DashboardStore;
