//! Intake API server library.
//!
//! Hosts patient and therapist intake wizards over HTTP. Exposes config,
//! state, error handling and routes so integration tests and the binary
//! entrypoint share them.

pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod sessions;
pub mod state;

pub use router::build_app_router;
