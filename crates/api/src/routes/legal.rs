//! Route definitions for legal consent records.

use axum::routing::post;
use axum::Router;

use crate::handlers::legal;
use crate::state::AppState;

/// ```text
/// POST   /legal-consents      -> record_consent
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/legal-consents", post(legal::record_consent))
}
