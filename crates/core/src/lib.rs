//! Domain logic for the patient and therapist intake wizards.
//!
//! Everything here is synchronous and free of I/O apart from the
//! [`draft::DraftStore`] and [`submission::SubmissionGateway`] seams, which
//! adapters in sibling crates implement.

pub mod choices;
pub mod consent;
pub mod draft;
pub mod error;
pub mod legal;
pub mod patient;
pub mod questionnaire;
pub mod signature;
pub mod submission;
pub mod therapist;
pub mod types;
pub mod validation;
pub mod wizard;
