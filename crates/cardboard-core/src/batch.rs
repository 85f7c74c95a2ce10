//! Batch fetcher
//!
//! Splits relative resource paths into chunks the batch endpoint accepts,
//! issues the chunks one after another, and decodes each entry into a
//! [`BatchItem`]. A failed entry never fails the batch; only a failed batch
//! call does.

use crate::client::{BatchEntry, TrelloApi};
use crate::config::MAX_BATCH_SIZE;
use crate::error::CoreResult;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

const OK_STATUS: &str = "200";

/// Outcome of one path in a batch request
#[derive(Debug, Clone, PartialEq)]
pub enum BatchItem<T> {
    /// The entry answered 200 and its payload decoded
    Found(T),
    /// Any other outcome; `status` is the status key Trello reported, or why decoding failed
    Failed { status: String },
}

impl<T> BatchItem<T> {
    pub fn found(self) -> Option<T> {
        match self {
            BatchItem::Found(value) => Some(value),
            BatchItem::Failed { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, BatchItem::Found(_))
    }
}

/// Issues chunked batch requests against the remote API
#[derive(Clone)]
pub struct BatchFetcher {
    api: Arc<dyn TrelloApi>,
    chunk_size: usize,
}

impl BatchFetcher {
    pub fn new(api: Arc<dyn TrelloApi>) -> Self {
        Self::with_chunk_size(api, MAX_BATCH_SIZE)
    }

    /// Chunk size is clamped to 1..=10
    pub fn with_chunk_size(api: Arc<dyn TrelloApi>, chunk_size: usize) -> Self {
        Self {
            api,
            chunk_size: chunk_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fetch every path; the result has one item per path, in input order
    pub async fn fetch<T: DeserializeOwned>(&self, paths: &[String]) -> CoreResult<Vec<BatchItem<T>>> {
        let mut items = Vec::with_capacity(paths.len());

        for (index, chunk) in paths.chunks(self.chunk_size).enumerate() {
            debug!(chunk = index, size = chunk.len(), "Fetching batch chunk");
            let entries = self.api.batch(chunk).await?;

            if entries.len() != chunk.len() {
                warn!(
                    expected = chunk.len(),
                    received = entries.len(),
                    "Batch response length mismatch"
                );
            }

            let mut entries = entries.into_iter();
            for path in chunk {
                let item = match entries.next() {
                    Some(entry) => decode_entry(entry),
                    None => BatchItem::Failed {
                        status: "missing".to_string(),
                    },
                };
                if let BatchItem::Failed { status } = &item {
                    debug!(path = %path, status = %status, "Batch item failed");
                }
                items.push(item);
            }
        }

        Ok(items)
    }
}

fn decode_entry<T: DeserializeOwned>(mut entry: BatchEntry) -> BatchItem<T> {
    if let Some(payload) = entry.remove(OK_STATUS) {
        return match serde_json::from_value(payload) {
            Ok(value) => BatchItem::Found(value),
            Err(e) => BatchItem::Failed {
                status: format!("{} (undecodable: {})", OK_STATUS, e),
            },
        };
    }

    BatchItem::Failed {
        status: failure_status(&entry),
    }
}

/// Lowest key that reads as an HTTP status; error objects carry other keys too
fn failure_status(entry: &BatchEntry) -> String {
    entry
        .keys()
        .filter(|key| key.parse::<u16>().is_ok())
        .min()
        .cloned()
        .unwrap_or_else(|| "error".to_string())
}
