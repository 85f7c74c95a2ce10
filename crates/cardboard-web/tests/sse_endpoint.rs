//! Integration test for SSE endpoint

use axum::body::Body;
use axum::http::{Request, StatusCode};
use cardboard_core::fake::FakeTrello;
use cardboard_core::{DashboardConfig, DashboardStore, FixedClock, LookupCache};
use cardboard_web::AuthConfig;
use chrono::Utc;
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test]
async fn test_sse_endpoint_exists() {
    let store = Arc::new(DashboardStore::new(
        Arc::new(FakeTrello::new()),
        Arc::new(LookupCache::new()),
        Arc::new(FixedClock::new(Utc::now())),
        &DashboardConfig::new("key", "token"),
    ));

    let router = cardboard_web::create_router(store.clone(), AuthConfig::default());

    let request = Request::builder()
        .uri("/api/events")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok());

    assert!(content_type.is_some());
    assert!(content_type.unwrap().contains("text/event-stream"));

    // The open stream holds a subscription
    assert_eq!(store.event_bus().subscriber_count(), 1);
}
