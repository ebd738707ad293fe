use std::sync::Arc;
use std::time::Duration;

use intake_core::legal::{ConsentSink, IpLookup};
use intake_core::submission::SubmissionGateway;
use intake_db::BestEffortDraftStore;

use crate::config::ServerConfig;
use crate::sessions::SessionRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything shared sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Live wizard sessions, keyed by session id.
    pub sessions: Arc<SessionRegistry>,
    /// Draft mirror shared by every wizard.
    pub drafts: Arc<BestEffortDraftStore>,
    pub gateway: Arc<dyn SubmissionGateway>,
    pub consent_sink: Arc<dyn ConsentSink>,
    pub ip_lookup: Arc<dyn IpLookup>,
}

impl AppState {
    pub fn submit_timeout(&self) -> Duration {
        self.config.submit_timeout()
    }
}
