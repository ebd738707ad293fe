//! In-memory registry of live wizard sessions.
//!
//! Each session owns one [`Wizard`] behind its own async mutex so that
//! independent sessions never contend. Sessions do not survive a restart;
//! their drafts do, through the draft store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

use intake_core::consent::ConsentView;
use intake_core::draft::DraftStore;
use intake_core::error::{CoreError, SubmissionError};
use intake_core::patient::{PatientDraft, PatientIntake};
use intake_core::signature::{PointerEvent, SignaturePad, SignatureView};
use intake_core::submission::SubmissionRecord;
use intake_core::therapist::{TherapistDraft, TherapistIntake};
use intake_core::types::{FormKind, Timestamp};
use intake_core::wizard::{Navigation, Phase, Wizard, WizardOptions, WizardSnapshot};

use crate::error::{AppError, AppResult};

pub type SharedSession = Arc<Mutex<IntakeSession>>;

/// Parse a draft id sent back by a client to resume its draft.
///
/// Only ids of the shape the server issues (random v4 UUIDs) are accepted,
/// so a draft cannot be reached by guessing a short name.
pub fn parse_draft_id(draft_id: &str) -> AppResult<Uuid> {
    match Uuid::parse_str(draft_id) {
        Ok(id) if id.get_version_num() == 4 => Ok(id),
        _ => Err(AppError::BadRequest(
            "draft_id must be an id previously issued by this server".to_string(),
        )),
    }
}

/// Draft key under which a form's draft is mirrored.
pub fn draft_key(form: FormKind, draft_id: Uuid) -> String {
    format!("{}:{}", form.storage_key(), draft_id)
}

// ---------------------------------------------------------------------------
// Wizard dispatch
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum IntakeWizard {
    Patient(Wizard<PatientIntake>),
    Therapist(Wizard<TherapistIntake>),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum IntakeSnapshot {
    Patient(WizardSnapshot<PatientDraft>),
    Therapist(WizardSnapshot<TherapistDraft>),
}

macro_rules! with_wizard {
    ($self:expr, $w:ident => $body:expr) => {
        match $self {
            IntakeWizard::Patient($w) => $body,
            IntakeWizard::Therapist($w) => $body,
        }
    };
}

impl IntakeWizard {
    pub fn open(form: FormKind, store: Arc<dyn DraftStore>, key: String) -> Self {
        let options = WizardOptions::default();
        match form {
            FormKind::Patient => Self::Patient(Wizard::open(store, key, options)),
            FormKind::Therapist => Self::Therapist(Wizard::open(store, key, options)),
        }
    }

    pub fn form(&self) -> FormKind {
        match self {
            Self::Patient(_) => FormKind::Patient,
            Self::Therapist(_) => FormKind::Therapist,
        }
    }

    pub fn phase(&self) -> Phase {
        with_wizard!(self, w => w.phase())
    }

    pub fn snapshot(&self) -> IntakeSnapshot {
        match self {
            Self::Patient(w) => IntakeSnapshot::Patient(w.snapshot()),
            Self::Therapist(w) => IntakeSnapshot::Therapist(w.snapshot()),
        }
    }

    /// Decode `{ "field": ..., "value": ... }` for this form and apply it.
    pub fn update_field(&mut self, body: Value) -> AppResult<()> {
        let bad_field = |e: serde_json::Error| AppError::BadRequest(format!("Invalid field update: {e}"));
        match self {
            Self::Patient(w) => w.update_field(serde_json::from_value(body).map_err(bad_field)?)?,
            Self::Therapist(w) => w.update_field(serde_json::from_value(body).map_err(bad_field)?)?,
        }
        Ok(())
    }

    pub fn go_to_next_step(&mut self) -> Result<Navigation, CoreError> {
        with_wizard!(self, w => w.go_to_next_step())
    }

    pub fn go_to_previous_step(&mut self) -> Result<Navigation, CoreError> {
        with_wizard!(self, w => w.go_to_previous_step())
    }

    pub fn on_scroll(&mut self, top: f64, height: f64, viewport: f64) -> Result<bool, CoreError> {
        with_wizard!(self, w => w.on_scroll(top, height, viewport))
    }

    pub fn check_initial_fit(&mut self, height: f64, viewport: f64) -> Result<bool, CoreError> {
        with_wizard!(self, w => w.check_initial_fit(height, viewport))
    }

    pub fn set_consent(&mut self, id: &str, checked: bool) -> Result<(), CoreError> {
        with_wizard!(self, w => w.set_consent(id, checked))
    }

    pub fn consent_view(&self) -> ConsentView {
        with_wizard!(self, w => w.consent().view())
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<(), CoreError> {
        with_wizard!(self, w => w.handle_pointer(event))
    }

    pub fn resize_signature(&mut self, width: u32, height: u32) -> Result<bool, CoreError> {
        with_wizard!(self, w => w.resize_signature(width, height))
    }

    pub fn clear_signature(&mut self) -> Result<(), CoreError> {
        with_wizard!(self, w => w.clear_signature())
    }

    pub fn signature_view(&self) -> Option<SignatureView> {
        with_wizard!(self, w => w.signature().map(SignaturePad::view))
    }

    pub fn begin_submission(&mut self, now: Timestamp) -> Result<SubmissionRecord, CoreError> {
        with_wizard!(self, w => w.begin_submission(now))
    }

    pub fn finish_submission(&mut self, result: Result<(), SubmissionError>) -> Result<(), CoreError> {
        with_wizard!(self, w => w.finish_submission(result))
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct IntakeSession {
    pub id: Uuid,
    pub draft_id: Uuid,
    pub wizard: IntakeWizard,
}

/// What the API returns for a session.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub draft_id: Uuid,
    #[serde(flatten)]
    pub wizard: IntakeSnapshot,
}

impl IntakeSession {
    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            draft_id: self.draft_id,
            wizard: self.wizard.snapshot(),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Entry {
    session: SharedSession,
    last_seen: Instant,
}

/// Live sessions. A session leaves the registry once its application is
/// submitted, or after sitting idle past the sweep's limit.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Entry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a wizard for `form` over the draft `draft_id` and register it.
    pub async fn create(
        &self,
        form: FormKind,
        draft_id: Uuid,
        store: Arc<dyn DraftStore>,
    ) -> SharedSession {
        let session = IntakeSession {
            id: Uuid::new_v4(),
            wizard: IntakeWizard::open(form, store, draft_key(form, draft_id)),
            draft_id,
        };
        let id = session.id;
        let shared = Arc::new(Mutex::new(session));
        let entry = Entry {
            session: Arc::clone(&shared),
            last_seen: Instant::now(),
        };
        self.sessions.write().await.insert(id, entry);
        shared
    }

    /// Look up a session and mark it as used.
    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.session))
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Drop every session unused for at least `max_idle`. Returns how many
    /// were dropped. Drafts stay in the draft store.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() < max_idle);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
