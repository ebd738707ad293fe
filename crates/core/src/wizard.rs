//! Wizard controller: step sequencing over one draft.
//!
//! States are `Intro -> Step1 .. StepN(final) -> Submitted`. Moving forward
//! requires the current step to validate; moving back never does. Every field
//! update is mirrored to the [`DraftStore`] as a full snapshot, and the
//! mirror is only cleared after a confirmed submission.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::consent::{ConsentGate, ConsentMissing, ConsentView};
use crate::draft::{load_or_default, save_draft, DraftStore};
use crate::error::{CoreError, SubmissionError};
use crate::questionnaire::{Questionnaire, RecordContext, StepDefinition};
use crate::signature::{PointerEvent, SignaturePad, SignatureView};
use crate::submission::{submit_with_timeout, SubmissionGateway, SubmissionRecord};
use crate::types::{FormKind, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WizardOptions {
    /// Forget the scroll latch and checkboxes whenever the final step is
    /// re-entered. Off by default: returning users are not made to re-read.
    pub reset_consent_on_reentry: bool,
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Navigation {
    /// The step changed; the host scrolls the view to the top.
    Moved { from: usize, to: usize },
    /// Nothing happened.
    Stayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Editing,
    /// A record is out with the gateway; submit is disabled.
    Submitting,
    /// Terminal.
    Submitted,
}

/// Serializable view of a wizard for hosts.
#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot<D: Serialize> {
    pub form: FormKind,
    pub step: usize,
    pub total_steps: usize,
    pub step_label: &'static str,
    pub is_final_step: bool,
    pub steps: &'static [StepDefinition],
    pub phase: Phase,
    pub draft: D,
    pub consent: ConsentView,
    pub signature: Option<SignatureView>,
}

pub struct Wizard<Q: Questionnaire> {
    draft: Q::Draft,
    step: usize,
    phase: Phase,
    consent: ConsentGate,
    signature: Option<SignaturePad>,
    store: Arc<dyn DraftStore>,
    draft_key: String,
    options: WizardOptions,
}

impl<Q: Questionnaire> std::fmt::Debug for Wizard<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wizard")
            .field("form", &Q::FORM)
            .field("step", &self.step)
            .field("phase", &self.phase)
            .field("draft_key", &self.draft_key)
            .finish_non_exhaustive()
    }
}

impl<Q: Questionnaire> Wizard<Q> {
    /// Start at the intro step with the draft rehydrated from `store`.
    pub fn open(store: Arc<dyn DraftStore>, draft_key: impl Into<String>, options: WizardOptions) -> Self {
        let draft_key = draft_key.into();
        let draft: Q::Draft = load_or_default(store.as_ref(), &draft_key);

        tracing::debug!(form = %Q::FORM, draft_key = %draft_key, "Wizard opened");

        Self {
            draft,
            step: 0,
            phase: Phase::Editing,
            consent: ConsentGate::new(Q::consent_items(), Q::scroll_threshold_px()),
            signature: None,
            store,
            draft_key,
            options,
        }
    }

    // -- accessors --------------------------------------------------------

    pub fn draft(&self) -> &Q::Draft {
        &self.draft
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn draft_key(&self) -> &str {
        &self.draft_key
    }

    pub fn consent(&self) -> &ConsentGate {
        &self.consent
    }

    /// Present only while the final step is showing.
    pub fn signature(&self) -> Option<&SignaturePad> {
        self.signature.as_ref()
    }

    pub fn is_final_step(&self) -> bool {
        self.step == Q::final_step()
    }

    fn ensure_editing(&self) -> Result<(), CoreError> {
        match self.phase {
            Phase::Editing => Ok(()),
            Phase::Submitting => Err(CoreError::InvalidState(
                "A submission is already in progress".to_string(),
            )),
            Phase::Submitted => Err(CoreError::InvalidState(
                "This application was already submitted".to_string(),
            )),
        }
    }

    fn ensure_final_step(&self) -> Result<(), CoreError> {
        if !self.is_final_step() {
            return Err(CoreError::InvalidState(
                "Only available on the final step".to_string(),
            ));
        }
        Ok(())
    }

    // -- navigation -------------------------------------------------------

    /// Validate the current step and advance. A no-op on the final step,
    /// whose forward action is submission.
    pub fn go_to_next_step(&mut self) -> Result<Navigation, CoreError> {
        self.ensure_editing()?;
        if self.is_final_step() {
            return Ok(Navigation::Stayed);
        }

        let from = self.step;
        Q::validate_step(&self.draft, from, chrono::Utc::now())?;

        self.step = from + 1;
        if self.is_final_step() {
            self.enter_final_step();
        }

        tracing::info!(form = %Q::FORM, from_step = from, to_step = self.step, "Wizard advanced");
        Ok(Navigation::Moved {
            from,
            to: self.step,
        })
    }

    /// Step back without validation. A no-op at the intro.
    pub fn go_to_previous_step(&mut self) -> Result<Navigation, CoreError> {
        self.ensure_editing()?;
        if self.step == 0 {
            return Ok(Navigation::Stayed);
        }

        let from = self.step;
        if self.is_final_step() {
            self.signature = None;
        }
        self.step = from - 1;

        tracing::info!(form = %Q::FORM, from_step = from, to_step = self.step, "Wizard went back");
        Ok(Navigation::Moved {
            from,
            to: self.step,
        })
    }

    fn enter_final_step(&mut self) {
        self.signature = Some(SignaturePad::new(Q::signature_surface()));
        if self.options.reset_consent_on_reentry {
            self.consent.reset();
        }
    }

    // -- fields -----------------------------------------------------------

    /// Apply a field update (and its derived updates), then mirror the draft.
    pub fn update_field(&mut self, field: Q::Field) -> Result<(), CoreError> {
        self.ensure_editing()?;
        Q::apply(&mut self.draft, field);
        self.persist();
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = save_draft(self.store.as_ref(), &self.draft_key, &self.draft) {
            tracing::warn!(draft_key = %self.draft_key, error = %e, "Draft save failed, continuing in memory");
        }
    }

    // -- consent ----------------------------------------------------------

    pub fn on_scroll(
        &mut self,
        scroll_top: f64,
        scroll_height: f64,
        viewport_height: f64,
    ) -> Result<bool, CoreError> {
        self.ensure_editing()?;
        self.ensure_final_step()?;
        Ok(self.consent.on_scroll(scroll_top, scroll_height, viewport_height))
    }

    pub fn check_initial_fit(
        &mut self,
        scroll_height: f64,
        viewport_height: f64,
    ) -> Result<bool, CoreError> {
        self.ensure_editing()?;
        self.ensure_final_step()?;
        Ok(self.consent.check_initial_fit(scroll_height, viewport_height))
    }

    pub fn set_consent(&mut self, id: &str, checked: bool) -> Result<(), CoreError> {
        self.ensure_editing()?;
        self.ensure_final_step()?;
        self.consent.set_checked(id, checked)
    }

    // -- signature --------------------------------------------------------

    fn pad_mut(&mut self) -> Result<&mut SignaturePad, CoreError> {
        self.ensure_editing()?;
        self.signature.as_mut().ok_or_else(|| {
            CoreError::InvalidState("The signature box is only shown on the final step".to_string())
        })
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<(), CoreError> {
        self.pad_mut()?.handle(event);
        Ok(())
    }

    /// Returns whether existing ink was lost.
    pub fn resize_signature(&mut self, width: u32, height: u32) -> Result<bool, CoreError> {
        Ok(self.pad_mut()?.resize(width, height))
    }

    pub fn clear_signature(&mut self) -> Result<(), CoreError> {
        self.pad_mut()?.clear();
        Ok(())
    }

    // -- submission -------------------------------------------------------

    /// Check every precondition and build the record, entering `Submitting`.
    ///
    /// Fails without side effects if any earlier step no longer validates,
    /// consent is incomplete or the signature box is empty.
    pub fn begin_submission(&mut self, now: Timestamp) -> Result<SubmissionRecord, CoreError> {
        self.ensure_editing()?;
        self.ensure_final_step()?;

        for step in 0..Q::final_step() {
            Q::validate_step(&self.draft, step, now)?;
        }
        self.consent.ensure_satisfied()?;

        let pad = self
            .signature
            .as_ref()
            .filter(|pad| pad.has_ink())
            .ok_or(ConsentMissing::SignatureMissing)?;
        let signature_data = pad.to_data_url()?;

        let record: SubmissionRecord = Q::build_record(
            &self.draft,
            RecordContext {
                signature_data: &signature_data,
                consent: &self.consent,
                now,
            },
        )
        .into();

        self.phase = Phase::Submitting;
        tracing::info!(form = %Q::FORM, draft_key = %self.draft_key, "Submission started");
        Ok(record)
    }

    /// Settle an outstanding submission. Success clears the stored draft
    /// and ends the wizard; failure keeps the draft and re-enables submit.
    pub fn finish_submission(&mut self, result: Result<(), SubmissionError>) -> Result<(), CoreError> {
        if self.phase != Phase::Submitting {
            return Err(CoreError::InvalidState(
                "No submission is in progress".to_string(),
            ));
        }

        match result {
            Ok(()) => {
                if let Err(e) = self.store.clear(&self.draft_key) {
                    tracing::warn!(draft_key = %self.draft_key, error = %e, "Draft clear failed");
                }
                self.phase = Phase::Submitted;
                self.signature = None;
                tracing::info!(form = %Q::FORM, draft_key = %self.draft_key, "Application submitted");
                Ok(())
            }
            Err(e) => {
                self.phase = Phase::Editing;
                tracing::warn!(
                    form = %Q::FORM,
                    retryable = e.is_retryable(),
                    error = %e,
                    "Submission failed, draft kept"
                );
                Err(CoreError::Submission(e))
            }
        }
    }

    /// `begin_submission`, one bounded delivery attempt, `finish_submission`.
    pub async fn submit(
        &mut self,
        gateway: &dyn SubmissionGateway,
        timeout: Duration,
    ) -> Result<(), CoreError> {
        let record = self.begin_submission(chrono::Utc::now())?;
        let result = submit_with_timeout(gateway, &record, timeout).await;
        self.finish_submission(result)
    }

    // -- view -------------------------------------------------------------

    pub fn snapshot(&self) -> WizardSnapshot<Q::Draft> {
        let steps = Q::steps();
        WizardSnapshot {
            form: Q::FORM,
            step: self.step,
            total_steps: steps.len(),
            step_label: steps.get(self.step).map(|s| s.label).unwrap_or_default(),
            is_final_step: self.is_final_step(),
            steps,
            phase: self.phase,
            draft: self.draft.clone(),
            consent: self.consent.view(),
            signature: self.signature.as_ref().map(SignaturePad::view),
        }
    }
}
