mod pages;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::admission::AdmissionGate;
use crate::archiver::Archiver;
use crate::config::Config;
use crate::db::Database;
use crate::reddit::ContentFetcher;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub archiver: Arc<Archiver>,
    pub gate: Arc<AdmissionGate>,
    pub fetcher: Arc<dyn ContentFetcher>,
    pub config: Arc<Config>,
}

/// Start the web server and run until `shutdown` fires.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn serve(state: AppState, shutdown: CancellationToken) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", state.config.web_host, state.config.web_port)
        .parse()
        .context("Invalid web server address")?;

    let app = create_app(state);

    info!(addr = %addr, "Starting HTTP web server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind web server")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.cancelled_owned())
    .await
    .context("Web server error")?;

    Ok(())
}

/// Create the main application router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
