//! HTTP server for fluorided

use crate::routes;
use anyhow::{Context, Result};
use axum::Router;
use fluoride_common::Dashboard;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            dashboard: Arc::new(dashboard),
            start_time: Instant::now(),
        }
    }
}

/// Build the API router
///
/// `request_timeout` caps a whole request, including every feedback attempt.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::dataset_routes())
        .merge(routes::selection_routes())
        .with_state(Arc::new(state))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server
pub async fn run(state: AppState, bind: &str, request_timeout: Duration) -> Result<()> {
    let app = router(state, request_timeout);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down gracefully");
        })
        .await?;
    Ok(())
}
