//! Caching layer for cardboard-core
//!
//! Process-lifetime lookup tables that spare repeated batch requests for
//! boards, lists and checklists.

pub mod lookup;

pub use lookup::{CacheStats, LookupCache, TableStats};
