//! Background tasks.
//!
//! Each submodule provides a long-running async function intended to be
//! spawned via `tokio::spawn` from the binary entrypoint.

pub mod session_expiry;
