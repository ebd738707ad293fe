use serde::Serialize;

use crate::consent::ConsentMissing;

/// A failed step validation: which step, which field, and what to tell the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub step: usize,
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of delivering a submission record to the external store.
///
/// Both variants are presented to the user as a generic retry prompt today;
/// the split is kept so callers can tell transport trouble from a refusal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// Network failure, timeout or a transient server error.
    #[error("Submission failed, please try again: {0}")]
    Retryable(String),

    /// The store refused the record.
    #[error("Submission was rejected: {0}")]
    Rejected(String),
}

impl SubmissionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }
}

/// Draft persistence failure. Never shown to the user; the wizard keeps
/// working from memory.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Draft storage unavailable: {0}")]
    Unavailable(String),

    #[error("Draft serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Draft I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Validation(ValidationFailure),

    #[error("{0}")]
    ConsentIncomplete(ConsentMissing),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationFailure> for CoreError {
    fn from(failure: ValidationFailure) -> Self {
        CoreError::Validation(failure)
    }
}

impl From<ConsentMissing> for CoreError {
    fn from(missing: ConsentMissing) -> Self {
        CoreError::ConsentIncomplete(missing)
    }
}

impl CoreError {
    /// The single human-readable line a user should see for this error.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Validation(failure) => failure.message.clone(),
            CoreError::ConsentIncomplete(missing) => missing.to_string(),
            CoreError::Submission(_) => "Sending the form failed. Please try again.".to_string(),
            CoreError::NotFound { entity, .. } => format!("{entity} not found"),
            CoreError::InvalidState(msg) => msg.clone(),
            CoreError::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}
