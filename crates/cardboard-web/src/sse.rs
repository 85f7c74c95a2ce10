//! Server-Sent Events for live updates

use axum::response::sse::{Event, KeepAlive, Sse};
use cardboard_core::{DashboardEvent, EventBus};
use futures::stream::Stream;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::debug;

/// Create an SSE stream from the event bus
///
/// Lagged receivers skip the events they missed.
pub fn create_sse_stream(event_bus: &EventBus) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = event_bus.subscribe();
    let stream = BroadcastStream::new(rx);

    let sse_stream = stream.filter_map(|result: Result<DashboardEvent, _>| match result {
        Ok(event) => Some(Ok(to_sse_event(&event))),
        Err(e) => {
            debug!(error = %e, "SSE subscriber lagged");
            None
        }
    });

    Sse::new(sse_stream).keep_alive(KeepAlive::default())
}

fn to_sse_event(event: &DashboardEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(event.name()).data(data)
}
