//! Web router using Axum

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::response::Html;
use axum::routing::{get, post, put};
use axum::{middleware, Router};
use cardboard_core::DashboardStore;
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{self, AuthConfig};
use crate::{api, sse};

/// Shared handler state
pub struct AppState {
    pub store: Arc<DashboardStore>,
    pub auth: AuthConfig,
}

/// Create the web router
pub fn create_router(store: Arc<DashboardStore>, auth: AuthConfig) -> Router {
    let state = Arc::new(AppState { store, auth });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let dashboard = Router::new()
        .route("/cards", get(api::get_cards))
        .route("/cards/move", put(api::move_card))
        .route("/moveCard", put(api::move_card))
        .route(
            "/cards/{card_id}/checkItem/{check_item_id}",
            put(api::update_check_item),
        )
        .route("/boards/{board_id}/lists", get(api::board_lists))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    let api_routes = Router::new()
        .merge(dashboard)
        .route("/authenticate", post(auth::authenticate))
        .route("/check-auth", get(auth::check_auth))
        .route("/logout", post(auth::logout))
        .route("/health", get(api::health))
        .route("/events", get(sse_handler));

    Router::new()
        .route("/", get(index_handler))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn index_handler() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>cardboard - Trello Dashboard</title>
    <style>
        body {
            font-family: system-ui, -apple-system, sans-serif;
            background: #f5f5f5;
            display: flex;
            justify-content: center;
            padding-top: 4rem;
        }
        .panel {
            max-width: 600px;
            background: white;
            padding: 2rem;
            border-radius: 8px;
            box-shadow: 0 2px 8px rgba(0,0,0,0.1);
        }
        h1 { font-size: 2rem; margin-bottom: 1rem; }
        li { margin: 0.4rem 0; }
        code { background: #f0f0f0; padding: 0.1rem 0.4rem; border-radius: 4px; }
        a { color: #0066cc; text-decoration: none; }
    </style>
</head>
<body>
    <div class="panel">
        <h1>cardboard</h1>
        <p>Your recently active Trello cards, with board and list names and checklists.</p>
        <ul>
            <li><a href="/api/cards">GET /api/cards</a> - cards active in the last 3 months</li>
            <li><code>PUT /api/cards/move</code> - body <code>{"cardId", "newListId"}</code></li>
            <li><code>PUT /api/cards/{cardId}/checkItem/{checkItemId}</code> - body <code>{"state"}</code></li>
            <li><code>GET /api/boards/{boardId}/lists</code> - lists of a board</li>
            <li><code>POST /api/authenticate</code>, <a href="/api/check-auth">GET /api/check-auth</a>, <code>POST /api/logout</code></li>
            <li><a href="/api/health">GET /api/health</a> - health and cache counters</li>
            <li><code>GET /api/events</code> - live updates (SSE)</li>
        </ul>
    </div>
</body>
</html>"#,
    )
}

/// SSE endpoint for live updates
async fn sse_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sse::create_sse_stream(state.store.event_bus())
}
