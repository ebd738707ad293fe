//! Handler for recording acceptance of the portal's legal terms.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use intake_core::error::CoreError;
use intake_core::legal::LegalGate;

use crate::error::{AppError, AppResult};
use crate::handlers::intake::ScrollReport;
use crate::response::DataResponse;
use crate::state::AppState;

const UNKNOWN_USER_AGENT: &str = "unknown";

#[derive(Debug, Deserialize)]
pub struct RecordConsentRequest {
    pub user_id: String,
    /// Furthest position the user reached in the legal text.
    pub scroll: ScrollReport,
    pub agreed: bool,
}

/// First hop of `X-Forwarded-For`, if the proxy supplied one.
fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .filter(|ua| !ua.is_empty())
        .unwrap_or(UNKNOWN_USER_AGENT)
        .to_string()
}

// ---------------------------------------------------------------------------
// POST /legal-consents
// ---------------------------------------------------------------------------

/// Replay the reader's scroll position through the legal gate and, if the
/// terms were read and accepted, store an audited consent record.
pub async fn record_consent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RecordConsentRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = body.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::BadRequest("user_id is required".to_string()));
    }

    let mut gate = LegalGate::new();
    gate.check_initial_fit(body.scroll.scroll_height, body.scroll.viewport_height);
    gate.on_scroll(
        body.scroll.scroll_top,
        body.scroll.scroll_height,
        body.scroll.viewport_height,
    );
    gate.set_agreed(body.agreed).map_err(CoreError::from)?;

    let ip_address = match forwarded_ip(&headers) {
        Some(ip) => ip,
        None => state.ip_lookup.public_ip().await,
    };

    let consent = gate
        .consent(user_id, ip_address, user_agent(&headers), chrono::Utc::now())
        .map_err(CoreError::from)?;

    state.consent_sink.record(&consent).await?;

    tracing::info!(user_id = %consent.user_id, version = %consent.version, "Legal terms accepted");

    Ok((StatusCode::CREATED, Json(DataResponse { data: consent })))
}
