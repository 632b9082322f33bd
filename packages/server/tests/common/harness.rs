//! In-process test harness: the full router over mock dependencies.
//!
//! Requests go through `tower::ServiceExt::oneshot`, so no socket is bound.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use server_core::kernel::TestDependencies;
use server_core::server::{build_app, AppState};
use std::time::Duration;
use tower::ServiceExt;

use super::multipart::{multipart_body, Part, BOUNDARY};

pub struct TestHarness {
    pub app: Router,
    pub state: AppState,
}

impl TestHarness {
    pub fn new(deps: &TestDependencies) -> Self {
        Self::from_state(AppState::new(deps.server_deps()))
    }

    /// Harness over state built by the test, e.g. with a custom sink.
    pub fn from_state(state: AppState) -> Self {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let app = build_app(state.clone(), &[]);
        Self { app, state }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.send(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(Method::DELETE)
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_empty(&self, path: &str) -> (StatusCode, Value) {
        self.send(Request::post(path).body(Body::empty()).unwrap())
            .await
    }

    pub async fn put_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::put(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_multipart(&self, path: &str, parts: &[Part<'_>]) -> (StatusCode, Value) {
        self.send(
            Request::post(path)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(parts)))
                .unwrap(),
        )
        .await
    }

    pub async fn post_raw(&self, path: &str, content_type: &str, body: Vec<u8>) -> (StatusCode, Value) {
        self.send(
            Request::post(path)
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Poll a lane until nothing is processing.
    pub async fn settled_lane(&self, document_type: &str) -> Value {
        for _ in 0..100 {
            let (_, lane) = self.get(&format!("/workspace/{}", document_type)).await;
            if lane["is_processing"] == Value::Bool(false) {
                return lane;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("lane {} still processing", document_type);
    }
}
