//! cardboard-web - JSON API and live updates for the cardboard dashboard

pub mod api;
pub mod auth;
pub mod error;
pub mod router;
pub mod sse;

pub use auth::AuthConfig;
pub use error::ApiError;
pub use router::{create_router, AppState};

use anyhow::Result;
use cardboard_core::DashboardStore;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Run the web server until Ctrl-C
pub async fn run(
    store: Arc<DashboardStore>,
    auth: AuthConfig,
    host: IpAddr,
    port: u16,
) -> Result<()> {
    let router = create_router(store, auth);

    let addr = SocketAddr::new(host, port);
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Web server listening");
    println!("Web server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
