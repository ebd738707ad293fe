//! Integration tests for the file-backed draft store.
//!
//! Each test gets its own temporary directory.

use std::sync::Arc;

use intake_core::draft::{load_or_default, DraftStore};
use intake_core::patient::PatientDraft;
use intake_db::{BestEffortDraftStore, FileDraftStore};
use serde_json::json;

fn store() -> (tempfile::TempDir, FileDraftStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileDraftStore::open(dir.path().join("drafts")).expect("open store");
    (dir, store)
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn saved_draft_survives_a_new_store_instance() {
    let (dir, store) = store();
    store
        .save("patientForm:1", &json!({ "full_name": "Dana Cohen" }))
        .unwrap();

    let reopened = FileDraftStore::open(dir.path().join("drafts")).unwrap();
    assert_eq!(
        reopened.load("patientForm:1").unwrap(),
        Some(json!({ "full_name": "Dana Cohen" }))
    );
}

#[test]
fn save_overwrites_previous_value() {
    let (_dir, store) = store();
    store.save("k", &json!({ "step": 1 })).unwrap();
    store.save("k", &json!({ "step": 2 })).unwrap();
    assert_eq!(store.load("k").unwrap(), Some(json!({ "step": 2 })));
}

#[test]
fn missing_key_loads_none() {
    let (_dir, store) = store();
    assert_eq!(store.load("never-saved").unwrap(), None);
}

#[test]
fn clear_is_idempotent() {
    let (_dir, store) = store();
    store.save("k", &json!({})).unwrap();
    store.clear("k").unwrap();
    store.clear("k").unwrap();
    assert_eq!(store.load("k").unwrap(), None);
}

#[test]
fn no_temp_files_left_behind() {
    let (_dir, store) = store();
    for i in 0..5 {
        store.save("k", &json!({ "i": i })).unwrap();
    }
    let names: Vec<String> = std::fs::read_dir(store.dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["k.json".to_string()]);
}

// ---------------------------------------------------------------------------
// Corruption
// ---------------------------------------------------------------------------

#[test]
fn corrupt_file_is_an_error_for_the_raw_store() {
    let (_dir, store) = store();
    std::fs::write(store.path_for("patientForm").unwrap(), "{not json").unwrap();
    assert!(store.load("patientForm").is_err());
}

#[test]
fn corrupt_file_loads_as_empty_draft() {
    let (_dir, store) = store();
    std::fs::write(store.path_for("patientForm").unwrap(), "{not json").unwrap();
    let draft: PatientDraft = load_or_default(&store, "patientForm");
    assert_eq!(draft, PatientDraft::default());
}

// ---------------------------------------------------------------------------
// Degraded operation
// ---------------------------------------------------------------------------

#[test]
fn best_effort_store_survives_a_removed_directory() {
    let (_dir, durable) = store();
    let dir = durable.dir().to_path_buf();
    let store = BestEffortDraftStore::new(Arc::new(durable));

    std::fs::remove_dir_all(&dir).unwrap();
    store.save("k", &json!({ "full_name": "Dana" })).unwrap();

    assert!(store.is_degraded());
    assert_eq!(store.load("k").unwrap(), Some(json!({ "full_name": "Dana" })));
}
