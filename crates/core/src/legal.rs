//! Portal legal gate: read the terms, tick "agree", record an audited consent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::consent::{ConsentMissing, ScrollGate};
use crate::error::SubmissionError;
use crate::types::Timestamp;

/// Version of the legal text users agree to.
pub const LEGAL_VERSION: &str = "1.0";

pub const LEGAL_SCROLL_THRESHOLD_PX: f64 = 30.0;

/// Recorded when the caller's address cannot be determined.
pub const UNKNOWN_IP: &str = "unknown";

/// Audited confirmation that a user accepted the legal terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalConsent {
    pub user_id: String,
    pub version: String,
    pub ip_address: String,
    pub user_agent: String,
    pub signed_at: Timestamp,
}

/// Resolves the caller's public address for the audit trail. Never fails;
/// implementations fall back to [`UNKNOWN_IP`].
#[async_trait]
pub trait IpLookup: Send + Sync {
    async fn public_ip(&self) -> String;
}

/// Persists consent records.
#[async_trait]
pub trait ConsentSink: Send + Sync {
    async fn record(&self, consent: &LegalConsent) -> Result<(), SubmissionError>;
}

#[derive(Debug, Clone)]
pub struct LegalGate {
    scroll: ScrollGate,
    agreed: bool,
}

impl Default for LegalGate {
    fn default() -> Self {
        Self::new()
    }
}

impl LegalGate {
    pub fn new() -> Self {
        Self {
            scroll: ScrollGate::new(LEGAL_SCROLL_THRESHOLD_PX),
            agreed: false,
        }
    }

    pub fn on_scroll(&mut self, scroll_top: f64, scroll_height: f64, viewport_height: f64) -> bool {
        self.scroll.on_scroll(scroll_top, scroll_height, viewport_height)
    }

    pub fn check_initial_fit(&mut self, scroll_height: f64, viewport_height: f64) -> bool {
        self.scroll.check_initial_fit(scroll_height, viewport_height)
    }

    pub fn has_read(&self) -> bool {
        self.scroll.has_reached_bottom()
    }

    pub fn agreed(&self) -> bool {
        self.agreed
    }

    /// The checkbox stays disabled until the text was read.
    pub fn set_agreed(&mut self, agreed: bool) -> Result<(), ConsentMissing> {
        if !self.has_read() {
            return Err(ConsentMissing::TermsNotRead);
        }
        self.agreed = agreed;
        Ok(())
    }

    /// Build the consent record for the current version.
    pub fn consent(
        &self,
        user_id: impl Into<String>,
        ip_address: impl Into<String>,
        user_agent: impl Into<String>,
        now: Timestamp,
    ) -> Result<LegalConsent, ConsentMissing> {
        if !self.has_read() {
            return Err(ConsentMissing::TermsNotRead);
        }
        if !self.agreed {
            return Err(ConsentMissing::Unchecked {
                item: "agreed",
                label: "I have read and agree to the terms",
            });
        }
        Ok(LegalConsent {
            user_id: user_id.into(),
            version: LEGAL_VERSION.to_string(),
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
            signed_at: now,
        })
    }
}
