//! Durable [`DraftStore`](intake_core::draft::DraftStore) implementations.
//!
//! - [`FileDraftStore`]: one JSON file per draft key, replaced atomically.
//! - [`BestEffortDraftStore`]: wraps any store and falls back to memory when
//!   it fails, so the wizard never sees a persistence error.

pub mod best_effort;
pub mod file_store;

pub use best_effort::BestEffortDraftStore;
pub use file_store::FileDraftStore;
