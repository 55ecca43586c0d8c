//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};

use crate::models::{HealthResponse, StatsResponse};
use crate::tasks::CoordinatorHandle;

/// Application state shared across all handlers.
///
/// Holds a coordinator handle; statistics are read from the coordinator's
/// published snapshot, so the admin API never touches the cache itself.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: CoordinatorHandle,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates a new AppState for the given coordinator.
    pub fn new(coordinator: CoordinatorHandle) -> Self {
        Self {
            coordinator,
            started_at: Utc::now(),
        }
    }
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.coordinator.stats()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.started_at))
}
