//! Handlers for intake wizard sessions.
//!
//! A session wraps one patient or therapist wizard. Every mutating endpoint
//! locks only its own session; submission releases the lock while the
//! record is out with the backend, and the delivery runs as its own task so
//! it completes even if the client goes away.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use intake_core::consent::ConsentView;
use intake_core::draft::DraftStore;
use intake_core::error::CoreError;
use intake_core::signature::{PointerEvent, SignatureView};
use intake_core::submission::submit_with_timeout;
use intake_core::types::FormKind;
use intake_core::wizard::Navigation;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::sessions::{parse_draft_id, SessionView, SharedSession};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Resume the draft saved under this id, as returned by an earlier
    /// session. A fresh id is issued if absent.
    #[serde(default)]
    pub draft_id: Option<String>,
}

/// Scroll position of a terms container, in pixels.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScrollReport {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub viewport_height: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FitReport {
    pub scroll_height: f64,
    pub viewport_height: f64,
}

#[derive(Debug, Deserialize)]
pub struct SetConsentRequest {
    pub checked: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResizeRequest {
    pub width: u32,
    pub height: u32,
}

/// One pointer event or a batch of them, applied in order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PointerEvents {
    One(PointerEvent),
    Many(Vec<PointerEvent>),
}

#[derive(Debug, Serialize)]
pub struct NavigationResponse {
    pub navigation: Navigation,
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
pub struct ResizeResponse {
    pub ink_lost: bool,
    pub signature: Option<SignatureView>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Look up a live session, returning 404 if it does not exist.
async fn ensure_session_exists(state: &AppState, id: Uuid) -> AppResult<SharedSession> {
    state.sessions.get(id).await.ok_or_else(|| {
        CoreError::NotFound {
            entity: "IntakeSession",
            id: id.to_string(),
        }
        .into()
    })
}

// ---------------------------------------------------------------------------
// POST /intake/{form}/sessions
// ---------------------------------------------------------------------------

/// Open a wizard for `form`, rehydrating any draft saved under `draft_id`.
pub async fn create_session(
    State(state): State<AppState>,
    Path(form): Path<String>,
    Json(body): Json<CreateSessionRequest>,
) -> AppResult<impl IntoResponse> {
    let form = FormKind::from_str_path(&form)?;
    let draft_id = match body.draft_id.as_deref() {
        Some(id) => parse_draft_id(id)?,
        None => Uuid::new_v4(),
    };

    let store: Arc<dyn DraftStore> = state.drafts.clone();
    let shared = state.sessions.create(form, draft_id, store).await;
    let session = shared.lock().await;

    tracing::info!(
        session_id = %session.id,
        form = %form,
        draft_id = %session.draft_id,
        "Intake session created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: session.view() })))
}

// ---------------------------------------------------------------------------
// GET /intake/sessions/{id}
// ---------------------------------------------------------------------------

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let shared = ensure_session_exists(&state, id).await?;
    let session = shared.lock().await;
    Ok(Json(DataResponse { data: session.view() }))
}

// ---------------------------------------------------------------------------
// PUT /intake/sessions/{id}/fields
// ---------------------------------------------------------------------------

/// Apply one `{ "field": ..., "value": ... }` update and mirror the draft.
pub async fn update_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> AppResult<impl IntoResponse> {
    let shared = ensure_session_exists(&state, id).await?;
    let mut session = shared.lock().await;
    session.wizard.update_field(body)?;
    Ok(Json(DataResponse { data: session.view() }))
}

// ---------------------------------------------------------------------------
// POST /intake/sessions/{id}/advance
// ---------------------------------------------------------------------------

/// Validate the current step and move forward.
pub async fn advance_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let shared = ensure_session_exists(&state, id).await?;
    let mut session = shared.lock().await;

    let navigation = session.wizard.go_to_next_step().inspect_err(|e| {
        tracing::debug!(session_id = %id, error = %e, "Step did not validate");
    })?;

    Ok(Json(DataResponse {
        data: NavigationResponse {
            navigation,
            session: session.view(),
        },
    }))
}

// ---------------------------------------------------------------------------
// POST /intake/sessions/{id}/go-back
// ---------------------------------------------------------------------------

pub async fn go_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let shared = ensure_session_exists(&state, id).await?;
    let mut session = shared.lock().await;
    let navigation = session.wizard.go_to_previous_step()?;

    Ok(Json(DataResponse {
        data: NavigationResponse {
            navigation,
            session: session.view(),
        },
    }))
}

// ---------------------------------------------------------------------------
// Consent
// ---------------------------------------------------------------------------

/// POST /intake/sessions/{id}/consent/scroll
pub async fn report_scroll(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ScrollReport>,
) -> AppResult<Json<DataResponse<ConsentView>>> {
    let shared = ensure_session_exists(&state, id).await?;
    let mut session = shared.lock().await;
    session
        .wizard
        .on_scroll(body.scroll_top, body.scroll_height, body.viewport_height)?;
    Ok(Json(DataResponse {
        data: session.wizard.consent_view(),
    }))
}

/// POST /intake/sessions/{id}/consent/fit
pub async fn report_fit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<FitReport>,
) -> AppResult<Json<DataResponse<ConsentView>>> {
    let shared = ensure_session_exists(&state, id).await?;
    let mut session = shared.lock().await;
    session
        .wizard
        .check_initial_fit(body.scroll_height, body.viewport_height)?;
    Ok(Json(DataResponse {
        data: session.wizard.consent_view(),
    }))
}

/// PUT /intake/sessions/{id}/consent/{checkbox}
pub async fn set_consent(
    State(state): State<AppState>,
    Path((id, checkbox)): Path<(Uuid, String)>,
    Json(body): Json<SetConsentRequest>,
) -> AppResult<Json<DataResponse<ConsentView>>> {
    let shared = ensure_session_exists(&state, id).await?;
    let mut session = shared.lock().await;
    session.wizard.set_consent(&checkbox, body.checked)?;
    Ok(Json(DataResponse {
        data: session.wizard.consent_view(),
    }))
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// POST /intake/sessions/{id}/signature/resize
pub async fn resize_signature(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ResizeRequest>,
) -> AppResult<impl IntoResponse> {
    let shared = ensure_session_exists(&state, id).await?;
    let mut session = shared.lock().await;
    let ink_lost = session.wizard.resize_signature(body.width, body.height)?;
    Ok(Json(DataResponse {
        data: ResizeResponse {
            ink_lost,
            signature: session.wizard.signature_view(),
        },
    }))
}

/// POST /intake/sessions/{id}/signature/events
pub async fn pointer_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PointerEvents>,
) -> AppResult<Json<DataResponse<Option<SignatureView>>>> {
    let shared = ensure_session_exists(&state, id).await?;
    let mut session = shared.lock().await;
    let events = match body {
        PointerEvents::One(event) => vec![event],
        PointerEvents::Many(events) => events,
    };
    for event in events {
        session.wizard.handle_pointer(event)?;
    }
    Ok(Json(DataResponse {
        data: session.wizard.signature_view(),
    }))
}

/// DELETE /intake/sessions/{id}/signature
pub async fn clear_signature(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<Option<SignatureView>>>> {
    let shared = ensure_session_exists(&state, id).await?;
    let mut session = shared.lock().await;
    session.wizard.clear_signature()?;
    Ok(Json(DataResponse {
        data: session.wizard.signature_view(),
    }))
}

// ---------------------------------------------------------------------------
// POST /intake/sessions/{id}/submit
// ---------------------------------------------------------------------------

/// Deliver the application to the backend.
///
/// The session lock is released during the backend call; the wizard's own
/// `Submitting` phase rejects concurrent edits and duplicate submits. The
/// delivery and its outcome run in a spawned task, so a dropped request
/// cannot leave the wizard in `Submitting`. A submitted session is removed
/// from the registry.
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let shared = ensure_session_exists(&state, id).await?;

    let record = shared
        .lock()
        .await
        .wizard
        .begin_submission(chrono::Utc::now())?;

    tracing::info!(session_id = %id, table = record.table(), "Submitting application");

    let gateway = Arc::clone(&state.gateway);
    let sessions = Arc::clone(&state.sessions);
    let timeout = state.submit_timeout();
    let delivery = tokio::spawn(async move {
        let result = submit_with_timeout(gateway.as_ref(), &record, timeout).await;

        let view = {
            let mut session = shared.lock().await;
            session.wizard.finish_submission(result)?;
            session.view()
        };

        sessions.remove(id).await;
        tracing::info!(session_id = %id, form = %record.form(), "Application submitted");
        Ok::<_, CoreError>(view)
    });

    let view = delivery
        .await
        .map_err(|e| AppError::InternalError(format!("Submission task failed: {e}")))??;
    Ok(Json(DataResponse { data: view }))
}
