//! Draft persistence seam.
//!
//! A [`DraftStore`] is a passive, best-effort mirror of the wizard's draft.
//! Implementations write the full snapshot on every save, so concurrent saves
//! resolve as last-writer-wins and never need a read-modify-write.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::PersistenceError;

pub trait DraftStore: Send + Sync {
    /// The last saved draft under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>, PersistenceError>;

    /// Replace whatever is stored under `key`.
    fn save(&self, key: &str, draft: &serde_json::Value) -> Result<(), PersistenceError>;

    /// Remove the draft under `key`. Clearing a missing key is not an error.
    fn clear(&self, key: &str) -> Result<(), PersistenceError>;
}

// ---------------------------------------------------------------------------
// Typed helpers
// ---------------------------------------------------------------------------

/// Load a draft, falling back to the default on a miss, a storage failure or
/// a value that no longer parses. Never fails.
pub fn load_or_default<D>(store: &dyn DraftStore, key: &str) -> D
where
    D: DeserializeOwned + Default,
{
    match store.load(key) {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(draft) => draft,
            Err(e) => {
                tracing::warn!(draft_key = key, error = %e, "Discarding unparseable draft");
                D::default()
            }
        },
        Ok(None) => D::default(),
        Err(e) => {
            tracing::warn!(draft_key = key, error = %e, "Draft load failed, starting empty");
            D::default()
        }
    }
}

/// Serialize and save a draft.
pub fn save_draft<D>(store: &dyn DraftStore, key: &str, draft: &D) -> Result<(), PersistenceError>
where
    D: Serialize,
{
    let value = serde_json::to_value(draft)?;
    store.save(key, &value)
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local store. Also the degraded mode of the durable stores.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, serde_json::Value>>, PersistenceError>
    {
        self.entries
            .lock()
            .map_err(|_| PersistenceError::Unavailable("draft map lock poisoned".to_string()))
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>, PersistenceError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn save(&self, key: &str, draft: &serde_json::Value) -> Result<(), PersistenceError> {
        self.entries()?.insert(key.to_string(), draft.clone());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), PersistenceError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Sample {
        name: String,
        count: u8,
    }

    struct BrokenStore;

    impl DraftStore for BrokenStore {
        fn load(&self, _key: &str) -> Result<Option<serde_json::Value>, PersistenceError> {
            Err(PersistenceError::Unavailable("disabled".into()))
        }
        fn save(&self, _key: &str, _draft: &serde_json::Value) -> Result<(), PersistenceError> {
            Err(PersistenceError::Unavailable("quota exceeded".into()))
        }
        fn clear(&self, _key: &str) -> Result<(), PersistenceError> {
            Err(PersistenceError::Unavailable("disabled".into()))
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MemoryDraftStore::new();
        let draft = Sample {
            name: "Dana".into(),
            count: 3,
        };
        save_draft(&store, "k", &draft).unwrap();
        assert_eq!(load_or_default::<Sample>(&store, "k"), draft);
    }

    #[test]
    fn missing_key_loads_default() {
        let store = MemoryDraftStore::new();
        assert_eq!(load_or_default::<Sample>(&store, "absent"), Sample::default());
    }

    #[test]
    fn corrupt_value_loads_default() {
        let store = MemoryDraftStore::new();
        store.save("k", &json!({ "count": "many" })).unwrap();
        assert_eq!(load_or_default::<Sample>(&store, "k"), Sample::default());
    }

    #[test]
    fn partial_value_fills_defaults() {
        let store = MemoryDraftStore::new();
        store.save("k", &json!({ "name": "Dana" })).unwrap();
        let loaded: Sample = load_or_default(&store, "k");
        assert_eq!(loaded.name, "Dana");
        assert_eq!(loaded.count, 0);
    }

    #[test]
    fn failing_store_loads_default() {
        assert_eq!(load_or_default::<Sample>(&BrokenStore, "k"), Sample::default());
    }

    #[test]
    fn clear_removes_entry_and_tolerates_missing() {
        let store = MemoryDraftStore::new();
        store.save("k", &json!({})).unwrap();
        store.clear("k").unwrap();
        store.clear("k").unwrap();
        assert!(store.load("k").unwrap().is_none());
    }

    #[test]
    fn keys_are_independent() {
        let store = MemoryDraftStore::new();
        store.save("patientForm", &json!({ "name": "a" })).unwrap();
        store.save("therapist_form_data", &json!({ "name": "b" })).unwrap();
        store.clear("patientForm").unwrap();
        assert!(store.load("therapist_form_data").unwrap().is_some());
    }
}
