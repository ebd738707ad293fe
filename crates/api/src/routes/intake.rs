//! Route definitions for intake wizard sessions.
//!
//! Mounted at `/intake` by `api_routes()`.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::intake;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{form}/sessions", post(intake::create_session))
        .route("/sessions/{id}", get(intake::get_session))
        .route("/sessions/{id}/fields", put(intake::update_field))
        .route("/sessions/{id}/advance", post(intake::advance_step))
        .route("/sessions/{id}/go-back", post(intake::go_back))
        .route("/sessions/{id}/consent/scroll", post(intake::report_scroll))
        .route("/sessions/{id}/consent/fit", post(intake::report_fit))
        .route("/sessions/{id}/consent/{checkbox}", put(intake::set_consent))
        .route("/sessions/{id}/signature", delete(intake::clear_signature))
        .route("/sessions/{id}/signature/resize", post(intake::resize_signature))
        .route("/sessions/{id}/signature/events", post(intake::pointer_events))
        .route("/sessions/{id}/submit", post(intake::submit))
}
