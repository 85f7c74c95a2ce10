//! Trello REST client
//!
//! [`TrelloApi`] is the seam every remote call goes through; [`TrelloClient`]
//! is the reqwest implementation. Every request carries the `key` and `token`
//! query parameters.

use crate::config::DashboardConfig;
use crate::error::{CoreError, CoreResult};
use crate::models::{Card, CheckState, List, CARD_FIELDS};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// One entry of a batch response: a single key, the HTTP status, mapped to its payload
pub type BatchEntry = HashMap<String, Value>;

/// Remote operations used by the dashboard
#[async_trait]
pub trait TrelloApi: Send + Sync {
    /// Cards assigned to the authenticated member, with the dashboard's field projection
    async fn my_cards(&self) -> CoreResult<Vec<Card>>;

    /// A single call to the batch endpoint; callers keep `urls` within the batch limit
    async fn batch(&self, urls: &[String]) -> CoreResult<Vec<BatchEntry>>;

    async fn board_lists(&self, board_id: &str) -> CoreResult<Vec<List>>;

    /// Move a card to another list; returns the updated card payload
    async fn move_card(&self, card_id: &str, list_id: &str) -> CoreResult<Value>;

    /// Set a check item's state; returns the updated item payload
    async fn update_check_item(
        &self,
        card_id: &str,
        check_item_id: &str,
        state: CheckState,
    ) -> CoreResult<Value>;
}

/// Reject ids that are blank or would escape their path segment
pub fn validate_id(kind: &str, id: &str) -> CoreResult<()> {
    if id.trim().is_empty() {
        return Err(CoreError::invalid_input(format!("Missing {}", kind)));
    }
    if id.contains(['/', '?', '#', '&', '%']) || id.chars().any(char::is_whitespace) {
        return Err(CoreError::invalid_input(format!("Invalid {}: {}", kind, id)));
    }
    Ok(())
}

/// reqwest-backed Trello client
#[derive(Clone)]
pub struct TrelloClient {
    config: DashboardConfig,
    client: Client,
}

impl TrelloClient {
    pub fn new(config: DashboardConfig) -> CoreResult<Self> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            CoreError::invalid_config(format!("failed to build HTTP client: {}", e))
        })?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.config.endpoint(path))
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("token", self.config.token.as_str()),
            ])
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> CoreResult<T> {
        let response = request.send().await.map_err(|source| CoreError::Transport {
            operation: operation.to_string(),
            source,
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| CoreError::Transport {
            operation: operation.to_string(),
            source,
        })?;

        if !status.is_success() {
            debug!(operation, status = status.as_u16(), "Trello returned error status");
            return Err(CoreError::UpstreamStatus {
                operation: operation.to_string(),
                status: status.as_u16(),
                message: upstream_message(operation, status.as_u16(), &body),
            });
        }

        serde_json::from_str(&body).map_err(|source| CoreError::Decode {
            operation: operation.to_string(),
            source,
        })
    }
}

/// Best human-readable message from an error body
///
/// Trello answers JSON `{"message": ...}` for most errors and plain text for
/// some (e.g. "invalid id").
pub fn upstream_message(operation: &str, status: u16, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::String(message)) = map.get("message") {
            if !message.is_empty() {
                return message.clone();
            }
        }
    }
    let text = body.trim();
    if !text.is_empty() {
        return text.to_string();
    }
    format!("Failed to {} (HTTP {})", operation, status)
}

#[async_trait]
impl TrelloApi for TrelloClient {
    async fn my_cards(&self) -> CoreResult<Vec<Card>> {
        let request = self
            .request(Method::GET, "/members/me/cards")
            .query(&[("fields", CARD_FIELDS)]);
        self.send_json("fetch cards", request).await
    }

    async fn batch(&self, urls: &[String]) -> CoreResult<Vec<BatchEntry>> {
        let joined = urls.join(",");
        debug!(count = urls.len(), "Issuing batch request");
        let request = self
            .request(Method::GET, "/batch")
            .query(&[("urls", joined.as_str())]);
        self.send_json("run batch request", request).await
    }

    async fn board_lists(&self, board_id: &str) -> CoreResult<Vec<List>> {
        validate_id("board ID", board_id)?;
        let request = self.request(Method::GET, &format!("/boards/{}/lists", board_id));
        self.send_json("fetch board lists", request).await
    }

    async fn move_card(&self, card_id: &str, list_id: &str) -> CoreResult<Value> {
        validate_id("cardId", card_id)?;
        validate_id("newListId", list_id)?;
        let request = self
            .request(Method::PUT, &format!("/cards/{}", card_id))
            .json(&serde_json::json!({ "idList": list_id }));
        self.send_json("move card", request).await
    }

    async fn update_check_item(
        &self,
        card_id: &str,
        check_item_id: &str,
        state: CheckState,
    ) -> CoreResult<Value> {
        validate_id("cardId", card_id)?;
        validate_id("checkItemId", check_item_id)?;
        let request = self
            .request(
                Method::PUT,
                &format!("/cards/{}/checkItem/{}", card_id, check_item_id),
            )
            .query(&[("state", state.as_str())]);
        self.send_json("update check item", request).await
    }
}
