//! Shared helpers for API integration tests.
//!
//! The app is built with the production router and middleware, a draft
//! store in a temporary directory, and in-process fakes for the backend.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use intake_api::config::ServerConfig;
use intake_api::sessions::SessionRegistry;
use intake_api::state::AppState;
use intake_core::error::SubmissionError;
use intake_core::legal::{ConsentSink, IpLookup, LegalConsent};
use intake_core::submission::{SubmissionGateway, SubmissionRecord};
use intake_db::{BestEffortDraftStore, FileDraftStore};

pub const LOOKUP_IP: &str = "203.0.113.9";

/// Records every submission; answers with queued outcomes, then `Ok`.
/// A record is only kept once the (optional) delay has passed.
#[derive(Default)]
pub struct FakeGateway {
    outcomes: Mutex<VecDeque<Result<(), SubmissionError>>>,
    records: Mutex<Vec<SubmissionRecord>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeGateway {
    pub fn fail_next(&self, err: SubmissionError) {
        self.outcomes.lock().unwrap().push_back(Err(err));
    }

    /// Make every later submission take `delay` before answering.
    pub fn delay_by(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn records(&self) -> Vec<SubmissionRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmissionGateway for FakeGateway {
    async fn submit(&self, record: &SubmissionRecord) -> Result<(), SubmissionError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.records.lock().unwrap().push(record.clone());
        self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    consents: Mutex<Vec<LegalConsent>>,
}

impl RecordingSink {
    pub fn consents(&self) -> Vec<LegalConsent> {
        self.consents.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConsentSink for RecordingSink {
    async fn record(&self, consent: &LegalConsent) -> Result<(), SubmissionError> {
        self.consents.lock().unwrap().push(consent.clone());
        Ok(())
    }
}

pub struct FixedIp;

#[async_trait]
impl IpLookup for FixedIp {
    async fn public_ip(&self) -> String {
        LOOKUP_IP.to_string()
    }
}

pub struct TestApp {
    pub router: Router,
    pub sessions: Arc<SessionRegistry>,
    pub gateway: Arc<FakeGateway>,
    pub consents: Arc<RecordingSink>,
    pub drafts_dir: PathBuf,
    _dir: tempfile::TempDir,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(drafts_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        drafts_dir,
        backend_url: "http://backend.invalid".to_string(),
        backend_anon_key: "test-key".to_string(),
        submit_timeout_secs: 5,
        session_idle_secs: 1800,
        ip_lookup_url: "http://ip.invalid".to_string(),
    }
}

/// Build the full application router over a fresh temporary draft directory.
pub fn build_test_app() -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let drafts_dir = dir.path().join("drafts");
    build_test_app_in(dir, drafts_dir)
}

pub fn build_test_app_in(dir: tempfile::TempDir, drafts_dir: PathBuf) -> TestApp {
    build_test_app_with(dir, drafts_dir, |_| {})
}

/// Like [`build_test_app_in`], with a chance to adjust the config first.
pub fn build_test_app_with(
    dir: tempfile::TempDir,
    drafts_dir: PathBuf,
    configure: impl FnOnce(&mut ServerConfig),
) -> TestApp {
    let mut config = test_config(drafts_dir.clone());
    configure(&mut config);
    let file_store = FileDraftStore::open(drafts_dir.clone()).expect("open draft store");
    let gateway = Arc::new(FakeGateway::default());
    let consents = Arc::new(RecordingSink::default());

    let sessions = Arc::new(SessionRegistry::new());

    let state = AppState {
        config: Arc::new(config.clone()),
        sessions: sessions.clone(),
        drafts: Arc::new(BestEffortDraftStore::new(Arc::new(file_store))),
        gateway: gateway.clone(),
        consent_sink: consents.clone(),
        ip_lookup: Arc::new(FixedIp),
    };

    TestApp {
        router: intake_api::build_app_router(state, &config),
        sessions,
        gateway,
        consents,
        drafts_dir,
        _dir: dir,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("request failed")
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    send(app, request).await
}

pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    send(app, request).await
}

async fn with_json(app: &Router, method: Method, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    with_json(app, Method::POST, uri, body).await
}

pub async fn put_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    with_json(app, Method::PUT, uri, body).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("JSON body")
}

/// POST without a body.
pub async fn post(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    send(app, request).await
}
