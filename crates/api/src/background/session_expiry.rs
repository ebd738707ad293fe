//! Periodic expiry of idle intake sessions.
//!
//! A session holds a wizard and its signature surface in memory; clients
//! that walk away never tell us. Drafts are untouched, so an expired
//! session can be resumed with its `draft_id`.

use std::sync::Arc;
use std::time::Duration;

use crate::sessions::SessionRegistry;

/// How often idle sessions are swept.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Sweep `sessions` every `every`, dropping those idle for `max_idle`.
/// Runs until the task is aborted.
pub async fn run(sessions: Arc<SessionRegistry>, max_idle: Duration, every: Duration) {
    tracing::info!(
        max_idle_secs = max_idle.as_secs(),
        interval_secs = every.as_secs(),
        "Session expiry job started"
    );

    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let expired = sessions.sweep_idle(max_idle).await;
        if expired > 0 {
            let remaining = sessions.len().await;
            tracing::info!(expired, remaining, "Expired idle sessions");
        } else {
            tracing::debug!("No idle sessions to expire");
        }
    }
}
