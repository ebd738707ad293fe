use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` once drafts are only kept in memory.
    pub status: &'static str,
    pub version: &'static str,
    pub drafts_durable: bool,
    pub active_sessions: usize,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let drafts_durable = !state.drafts.is_degraded();
    Json(HealthResponse {
        status: if drafts_durable { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        drafts_durable,
        active_sessions: state.sessions.len().await,
    })
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
