use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use intake_core::error::{CoreError, SubmissionError};

/// Error returned by every handler; renders as `{ "error", "code" }` JSON.
///
/// Messages come from [`CoreError::user_message`], so transport and storage
/// details stay in the logs.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Malformed input the extractors accepted but the domain cannot use.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        AppError::Core(CoreError::Submission(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", core.user_message())
                }
                CoreError::ConsentIncomplete(_) => {
                    (StatusCode::BAD_REQUEST, "CONSENT_INCOMPLETE", core.user_message())
                }
                CoreError::InvalidState(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Submission(err) => {
                    tracing::warn!(error = %err, "Submission failed");
                    match err {
                        SubmissionError::Retryable(_) => (
                            StatusCode::SERVICE_UNAVAILABLE,
                            "SUBMISSION_RETRYABLE",
                            core.user_message(),
                        ),
                        SubmissionError::Rejected(_) => (
                            StatusCode::UNPROCESSABLE_ENTITY,
                            "SUBMISSION_REJECTED",
                            core.user_message(),
                        ),
                    }
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
