//! API routes for fluorided
//!
//! The dashboard front-end fills its dropdowns from /v1/years and /v1/states
//! and re-queries /v1/selection whenever either value changes.

use crate::server::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use fluoride_common::{states, SelectionError, SelectionView};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

type AppStateArc = Arc<AppState>;

// ============================================================================
// Health Routes
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub records: usize,
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        records: state.dashboard.dataset().len(),
    })
}

// ============================================================================
// Dataset Routes
// ============================================================================

/// Dropdown entry for a state
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StateOption {
    pub abbreviation: String,
    pub name: String,
}

pub fn dataset_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/years", get(list_years))
        .route("/v1/states", get(list_states))
}

async fn list_years(State(state): State<AppStateArc>) -> Json<Vec<i32>> {
    Json(state.dashboard.dataset().years())
}

async fn list_states(State(state): State<AppStateArc>) -> Json<Vec<StateOption>> {
    let options = state
        .dashboard
        .dataset()
        .states()
        .into_iter()
        .filter_map(|abbr| match states::state_name(abbr) {
            Some(name) => Some(StateOption {
                abbreviation: abbr.to_string(),
                name: name.to_string(),
            }),
            None => {
                warn!("Skipping unknown state abbreviation '{}'", abbr);
                None
            }
        })
        .collect();
    Json(options)
}

// ============================================================================
// Selection Routes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SelectionQuery {
    pub year: Option<i32>,
    pub state: Option<String>,
}

pub fn selection_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/selection", get(selection))
}

async fn selection(
    State(state): State<AppStateArc>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<SelectionView>, (StatusCode, String)> {
    let dashboard = Arc::clone(&state.dashboard);

    // Feedback generation blocks for up to max_retries HTTP round trips
    let view = tokio::task::spawn_blocking(move || {
        dashboard.select(query.year, query.state.as_deref())
    })
    .await
    .map_err(|e| {
        error!("Selection task failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    view.map(Json).map_err(|e| match e {
        SelectionError::UnknownState(_) => (StatusCode::NOT_FOUND, e.to_string()),
    })
}
