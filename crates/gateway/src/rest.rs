//! Row insertion against the backend's REST endpoint.

use async_trait::async_trait;
use serde::Serialize;

use intake_core::error::SubmissionError;
use intake_core::legal::{ConsentSink, LegalConsent};
use intake_core::submission::{SubmissionGateway, SubmissionRecord};

use crate::error::BackendError;

/// Table that holds legal consent records.
pub const LEGAL_CONSENTS_TABLE: &str = "legal_consents";

/// HTTP client for one backend project.
#[derive(Debug, Clone)]
pub struct RestGateway {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl RestGateway {
    /// * `base_url` - Project URL, e.g. `https://xyz.example.co`.
    /// * `anon_key` - Public API key; row access is enforced server-side.
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, anon_key)
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling.
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            anon_key: anon_key.into(),
        }
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Insert one row. The backend is asked not to echo it back.
    pub async fn insert<T>(&self, table: &str, row: &T) -> Result<(), BackendError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let response = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    // ---- private helpers ----

    /// Return the response unchanged on 2xx, or an [`BackendError::ApiError`]
    /// carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(BackendError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl SubmissionGateway for RestGateway {
    async fn submit(&self, record: &SubmissionRecord) -> Result<(), SubmissionError> {
        let table = record.table();
        match self.insert(table, record).await {
            Ok(()) => {
                tracing::info!(table, "Submission record stored");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(table, retryable = e.is_retryable(), error = %e, "Submission insert failed");
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl ConsentSink for RestGateway {
    async fn record(&self, consent: &LegalConsent) -> Result<(), SubmissionError> {
        self.insert(LEGAL_CONSENTS_TABLE, consent).await.map_err(|e| {
            tracing::warn!(user_id = %consent.user_id, error = %e, "Legal consent insert failed");
            SubmissionError::from(e)
        })?;
        tracing::info!(user_id = %consent.user_id, version = %consent.version, "Legal consent recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_url_ignores_trailing_slash() {
        let gw = RestGateway::new("https://backend.example/", "anon");
        assert_eq!(
            gw.table_url("patients"),
            "https://backend.example/rest/v1/patients"
        );
    }
}
