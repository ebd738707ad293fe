use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use intake_core::draft::{DraftStore, MemoryDraftStore};
use intake_core::error::PersistenceError;

/// A store that never fails.
///
/// Saves go to the durable `inner` store; when it refuses (disk full,
/// permissions, unreadable directory) the draft is kept in memory instead and
/// served from there until a durable save succeeds again.
pub struct BestEffortDraftStore {
    inner: Arc<dyn DraftStore>,
    fallback: MemoryDraftStore,
    degraded: AtomicBool,
}

impl BestEffortDraftStore {
    pub fn new(inner: Arc<dyn DraftStore>) -> Self {
        Self {
            inner,
            fallback: MemoryDraftStore::new(),
            degraded: AtomicBool::new(false),
        }
    }

    /// Whether the last durable save failed.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }
}

impl DraftStore for BestEffortDraftStore {
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>, PersistenceError> {
        if let Ok(Some(value)) = self.fallback.load(key) {
            return Ok(Some(value));
        }
        match self.inner.load(key) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(draft_key = key, error = %e, "Durable draft load failed");
                Ok(None)
            }
        }
    }

    fn save(&self, key: &str, draft: &serde_json::Value) -> Result<(), PersistenceError> {
        match self.inner.save(key, draft) {
            Ok(()) => {
                if self.degraded.swap(false, Ordering::Relaxed) {
                    tracing::info!(draft_key = key, "Durable draft storage recovered");
                }
                let _ = self.fallback.clear(key);
            }
            Err(e) => {
                if !self.degraded.swap(true, Ordering::Relaxed) {
                    tracing::warn!(draft_key = key, error = %e, "Durable draft save failed, keeping draft in memory");
                }
                let _ = self.fallback.save(key, draft);
            }
        }
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), PersistenceError> {
        let _ = self.fallback.clear(key);
        if let Err(e) = self.inner.clear(key) {
            tracing::warn!(draft_key = key, error = %e, "Durable draft clear failed");
        }
        Ok(())
    }
}
