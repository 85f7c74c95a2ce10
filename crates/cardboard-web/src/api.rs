//! Card and board handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use cardboard_core::models::{Card, CheckState, List};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::error::ApiError;
use crate::router::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCardRequest {
    pub card_id: Option<String>,
    pub new_list_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckItemRequest {
    pub state: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// GET /api/cards
pub async fn get_cards(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Card>>, ApiError> {
    state.store.my_cards().await.map(Json).map_err(|e| {
        error!(error = %e, "Failed to fetch cards");
        ApiError::Fetch("Failed to fetch cards".to_string())
    })
}

/// PUT /api/cards/move and PUT /api/moveCard
pub async fn move_card(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MoveCardRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    const MISSING: &str = "Missing cardId or newListId";

    let Json(body) = payload.map_err(|_| ApiError::BadRequest(MISSING.to_string()))?;
    let (Some(card_id), Some(list_id)) = (non_blank(body.card_id), non_blank(body.new_list_id))
    else {
        return Err(ApiError::BadRequest(MISSING.to_string()));
    };

    let moved = state.store.move_card(&card_id, &list_id).await?;
    Ok(Json(moved))
}

/// PUT /api/cards/{card_id}/checkItem/{check_item_id}
pub async fn update_check_item(
    State(state): State<Arc<AppState>>,
    Path((card_id, check_item_id)): Path<(String, String)>,
    payload: Result<Json<CheckItemRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let check_state = payload
        .ok()
        .and_then(|Json(body)| body.state)
        .and_then(|s| s.parse::<CheckState>().ok())
        .ok_or_else(|| ApiError::BadRequest("Invalid state".to_string()))?;

    let updated = state
        .store
        .set_check_item_state(&card_id, None, &check_item_id, check_state)
        .await?;
    Ok(Json(updated))
}

/// GET /api/boards/{board_id}/lists
pub async fn board_lists(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<String>,
) -> Result<Json<Vec<List>>, ApiError> {
    if board_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing board ID".to_string()));
    }

    state.store.board_lists(&board_id).await.map(Json).map_err(|e| {
        if e.is_client_error() {
            return ApiError::from(e);
        }
        error!(board_id = %board_id, error = %e, "Failed to fetch board lists");
        ApiError::Internal("Failed to fetch board lists".to_string())
    })
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let store = &state.store;
    let cache = store.cache_stats();
    Json(json!({
        "status": "healthy",
        "cards": store.snapshot_len(),
        "refreshed_at": store.refreshed_at(),
        "cache": cache,
        "cache_entries": cache.total_entries(),
        "cache_hit_rate": {
            "boards": cache.boards.hit_rate(),
            "lists": cache.lists.hit_rate(),
            "checklists": cache.checklists.hit_rate(),
        },
        "subscribers": store.event_bus().subscriber_count(),
    }))
}
