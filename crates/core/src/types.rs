use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Which application a wizard collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Patient,
    Therapist,
}

impl FormKind {
    /// Parse a form kind from a path segment.
    pub fn from_str_path(s: &str) -> Result<Self, CoreError> {
        match s {
            "patient" => Ok(Self::Patient),
            "therapist" => Ok(Self::Therapist),
            _ => Err(CoreError::NotFound {
                entity: "Form",
                id: s.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Therapist => "therapist",
        }
    }

    /// Well-known draft persistence key for this form.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Patient => "patientForm",
            Self::Therapist => "therapist_form_data",
        }
    }

    /// Table the submission record is inserted into.
    pub fn table(self) -> &'static str {
        match self {
            Self::Patient => "patients",
            Self::Therapist => "therapists",
        }
    }

    /// Workflow status a fresh record starts in.
    pub fn initial_status(self) -> &'static str {
        match self {
            Self::Patient => "new",
            Self::Therapist => "pending",
        }
    }
}

impl std::fmt::Display for FormKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
