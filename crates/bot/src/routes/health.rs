use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable. Always `true` on the in-memory
    /// store.
    pub db_healthy: bool,
    /// `"postgres"` or `"memory"`.
    pub store: &'static str,
    /// Sessions with a live worker.
    pub sessions: usize,
}

/// GET /health -- returns service and database health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (db_healthy, store) = match &state.pool {
        Some(pool) => (dinebot_db::health_check(pool).await.is_ok(), "postgres"),
        None => (true, "memory"),
    };

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        store,
        sessions: state.dispatcher.session_count(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
