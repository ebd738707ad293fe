use intake_core::error::SubmissionError;

/// Errors from the backend REST layer.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    ApiError {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl BackendError {
    /// Whether trying the same request again later could succeed.
    ///
    /// Transport failures, request timeouts, rate limiting and server errors
    /// are transient; any other status means the row itself was refused.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Request(_) => true,
            BackendError::ApiError { status, .. } => {
                matches!(*status, 408 | 429) || (500..600).contains(status)
            }
        }
    }
}

impl From<BackendError> for SubmissionError {
    fn from(err: BackendError) -> Self {
        if err.is_retryable() {
            SubmissionError::Retryable(err.to_string())
        } else {
            SubmissionError::Rejected(err.to_string())
        }
    }
}
