//! The per-form definition a [`Wizard`](crate::wizard::Wizard) is generic over.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::consent::{ConsentGate, ConsentItem};
use crate::error::ValidationFailure;
use crate::signature::SignatureSurface;
use crate::submission::SubmissionRecord;
use crate::types::{FormKind, Timestamp};

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Informational page, never validated.
    Intro,
    /// Question page with its own required fields.
    Questions,
    /// Legal text, consent boxes and signature; continuing means submitting.
    Final,
}

/// Static descriptor of one wizard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepDefinition {
    pub index: usize,
    pub label: &'static str,
    pub kind: StepKind,
    /// Draft fields this page reads and writes.
    pub fields: &'static [&'static str],
}

/// Inputs to record construction that live outside the draft.
#[derive(Debug, Clone, Copy)]
pub struct RecordContext<'a> {
    pub signature_data: &'a str,
    pub consent: &'a ConsentGate,
    pub now: Timestamp,
}

// ---------------------------------------------------------------------------
// Questionnaire
// ---------------------------------------------------------------------------

pub trait Questionnaire: Send + Sync + 'static {
    /// Working state. `Default` is the empty draft.
    type Draft: Debug + Clone + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync;

    /// One typed field update.
    type Field: Debug + DeserializeOwned + Send;

    type Record: Serialize + Into<SubmissionRecord>;

    const FORM: FormKind;

    /// Totally ordered; index 0 is the intro and the last entry is final.
    fn steps() -> &'static [StepDefinition];

    /// Check one step's required fields. Never mutates the draft.
    fn validate_step(
        draft: &Self::Draft,
        step: usize,
        now: Timestamp,
    ) -> Result<(), ValidationFailure>;

    /// Write a field and recompute whatever depends on it.
    fn apply(draft: &mut Self::Draft, field: Self::Field);

    fn consent_items() -> &'static [ConsentItem];

    /// Distance from the bottom of the legal text, in pixels, that counts as
    /// read. Inclusive: a remaining distance equal to the threshold latches.
    fn scroll_threshold_px() -> f64;

    fn signature_surface() -> SignatureSurface;

    fn build_record(draft: &Self::Draft, ctx: RecordContext<'_>) -> Self::Record;

    fn final_step() -> usize {
        Self::steps().len().saturating_sub(1)
    }
}
