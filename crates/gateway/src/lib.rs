//! HTTP adapters to the hosted backend.
//!
//! The backend exposes a PostgREST-style API: rows are inserted with
//! `POST {base}/rest/v1/{table}` and authenticated with the project's anon
//! key. Access rules live in the backend, not here.

pub mod error;
pub mod ip_lookup;
pub mod rest;

pub use error::BackendError;
pub use ip_lookup::HttpIpLookup;
pub use rest::RestGateway;
