//! Submission records and the gateway that delivers them.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::SubmissionError;
use crate::patient::PatientRecord;
use crate::therapist::TherapistRecord;
use crate::types::FormKind;

/// Bound on one delivery attempt before it is reported as retryable.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(20);

/// A complete, validated application ready for the external store.
///
/// Serializes to exactly the row inserted, with no wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SubmissionRecord {
    Patient(PatientRecord),
    Therapist(TherapistRecord),
}

impl SubmissionRecord {
    pub fn form(&self) -> FormKind {
        match self {
            Self::Patient(_) => FormKind::Patient,
            Self::Therapist(_) => FormKind::Therapist,
        }
    }

    /// Destination table.
    pub fn table(&self) -> &'static str {
        self.form().table()
    }
}

impl From<PatientRecord> for SubmissionRecord {
    fn from(record: PatientRecord) -> Self {
        Self::Patient(record)
    }
}

impl From<TherapistRecord> for SubmissionRecord {
    fn from(record: TherapistRecord) -> Self {
        Self::Therapist(record)
    }
}

/// Delivers a record atomically. Implementations classify every failure as
/// retryable or rejected; raw transport errors never escape.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn submit(&self, record: &SubmissionRecord) -> Result<(), SubmissionError>;
}

/// Run one delivery attempt, turning an elapsed `timeout` into a retryable error.
pub async fn submit_with_timeout(
    gateway: &dyn SubmissionGateway,
    record: &SubmissionRecord,
    timeout: Duration,
) -> Result<(), SubmissionError> {
    match tokio::time::timeout(timeout, gateway.submit(record)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                table = record.table(),
                timeout_secs = timeout.as_secs(),
                "Submission timed out"
            );
            Err(SubmissionError::Retryable(format!(
                "no response within {} seconds",
                timeout.as_secs()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::patient::tests::sample_record;

    struct Hanging;

    #[async_trait]
    impl SubmissionGateway for Hanging {
        async fn submit(&self, _record: &SubmissionRecord) -> Result<(), SubmissionError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    struct Refusing;

    #[async_trait]
    impl SubmissionGateway for Refusing {
        async fn submit(&self, _record: &SubmissionRecord) -> Result<(), SubmissionError> {
            Err(SubmissionError::Rejected("column does not exist".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_gateway_becomes_retryable() {
        let record = SubmissionRecord::from(sample_record());
        let result = submit_with_timeout(&Hanging, &record, Duration::from_secs(20)).await;
        assert_matches!(result, Err(SubmissionError::Retryable(_)));
    }

    #[tokio::test]
    async fn rejection_passes_through() {
        let record = SubmissionRecord::from(sample_record());
        let result = submit_with_timeout(&Refusing, &record, DEFAULT_SUBMIT_TIMEOUT).await;
        assert_matches!(result, Err(SubmissionError::Rejected(_)));
    }

    #[test]
    fn record_routes_to_form_table() {
        let record = SubmissionRecord::from(sample_record());
        assert_eq!(record.form(), FormKind::Patient);
        assert_eq!(record.table(), "patients");
    }

    #[test]
    fn record_serializes_without_wrapper() {
        let record = SubmissionRecord::from(sample_record());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "new");
        assert!(json.get("Patient").is_none());
    }
}
