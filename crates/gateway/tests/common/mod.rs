//! Shared helpers for gateway integration tests.
//!
//! Spins up a tiny axum server on an ephemeral port that records every
//! inserted row and answers with a configurable status.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use intake_core::consent::ConsentGate;
use intake_core::patient::{PatientDraft, PatientIntake};
use intake_core::questionnaire::{Questionnaire, RecordContext};
use intake_core::choices::TherapyType;
use intake_core::submission::SubmissionRecord;

/// One request seen by the mock backend.
#[derive(Debug, Clone)]
pub struct CapturedInsert {
    pub table: String,
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    delay: Duration,
    inserts: Arc<Mutex<Vec<CapturedInsert>>>,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    inserts: Arc<Mutex<Vec<CapturedInsert>>>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn inserts(&self) -> Vec<CapturedInsert> {
        self.inserts.lock().expect("inserts lock").clone()
    }
}

async fn insert_row(
    State(state): State<MockState>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    tokio::time::sleep(state.delay).await;
    state.inserts.lock().expect("inserts lock").push(CapturedInsert {
        table,
        headers,
        body,
    });
    if state.status.is_success() {
        (state.status, Json(Value::Null))
    } else {
        (state.status, Json(json!({ "message": "mock failure" })))
    }
}

async fn ip() -> Json<Value> {
    Json(json!({ "ip": "203.0.113.7" }))
}

async fn slow_ip() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({ "ip": "203.0.113.8" }))
}

async fn broken_ip() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "nope")
}

/// Start a mock backend answering inserts with `status` after `delay`.
pub async fn spawn_backend(status: StatusCode, delay: Duration) -> MockBackend {
    let inserts = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        delay,
        inserts: Arc::clone(&inserts),
    };

    let app = Router::new()
        .route("/rest/v1/{table}", post(insert_row))
        .route("/ip", get(ip))
        .route("/slow-ip", get(slow_ip))
        .route("/broken-ip", get(broken_ip))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock backend");
    });

    MockBackend { addr, inserts }
}

/// A complete patient record, as the wizard would build it.
pub fn patient_record() -> SubmissionRecord {
    let draft = PatientDraft {
        full_name: "Dana Cohen".into(),
        phone: "0501234567".into(),
        email: "dana@example.com".into(),
        main_reason: "I have been feeling persistent anxiety for months".into(),
        mother_relationship: "Warm but distant".into(),
        father_relationship: "Complicated".into(),
        therapy_type: Some(TherapyType::Online),
        ..Default::default()
    };
    let consent = ConsentGate::new(
        PatientIntake::consent_items(),
        PatientIntake::scroll_threshold_px(),
    );
    PatientIntake::build_record(
        &draft,
        RecordContext {
            signature_data: "data:image/png;base64,AAAA",
            consent: &consent,
            now: Utc::now(),
        },
    )
    .into()
}
