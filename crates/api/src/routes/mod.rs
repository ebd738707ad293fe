pub mod health;
pub mod intake;
pub mod legal;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /intake/{form}/sessions                         create (POST)
/// /intake/sessions/{id}                           snapshot (GET)
/// /intake/sessions/{id}/fields                    update field (PUT)
/// /intake/sessions/{id}/advance                   next step (POST)
/// /intake/sessions/{id}/go-back                   previous step (POST)
/// /intake/sessions/{id}/consent/scroll            scroll report (POST)
/// /intake/sessions/{id}/consent/fit               initial fit report (POST)
/// /intake/sessions/{id}/consent/{checkbox}        set checkbox (PUT)
/// /intake/sessions/{id}/signature                 clear (DELETE)
/// /intake/sessions/{id}/signature/resize          resize surface (POST)
/// /intake/sessions/{id}/signature/events          pointer events (POST)
/// /intake/sessions/{id}/submit                    submit (POST)
///
/// /legal-consents                                 record consent (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/intake", intake::router())
        .merge(legal::router())
}
