//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock collaborators injected, so cycles can be triggered and observed
//! without a portal or storage service.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use casemirror_core::{
    testing::{MockPortal, MockRenderer, MockStorage},
    Collaborators, CycleCoordinator, CycleRunner,
};
use casemirror_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use casemirror_core::testing::fixtures;

/// Test fixture for API testing with mock collaborators.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_trigger() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/v1/cycles/trigger").await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock portal - configure cases and inspect the key/value store
    pub portal: Arc<MockPortal>,
    /// Mock storage - configure folders and file contents
    pub storage: Arc<MockStorage>,
    /// The runner behind the cycle endpoints
    pub runner: Arc<CycleRunner>,
    /// Temporary base folder for mirrored cases
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with an idle runner.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = fixtures::config(temp_dir.path());

        let portal = Arc::new(MockPortal::new());
        let storage = Arc::new(MockStorage::new());

        let coordinator = Arc::new(CycleCoordinator::new(
            &config,
            Collaborators {
                storage: storage.clone(),
                cases: portal.clone(),
                redesigns: None,
                reporter: portal.clone(),
                kv: portal.clone(),
                renderer: Arc::new(MockRenderer::new()),
            },
        ));
        let runner = Arc::new(CycleRunner::new(coordinator, Duration::from_secs(3600)));

        let state = Arc::new(AppState::new(config, Arc::clone(&runner)));
        let router = create_router(state);

        Self {
            router,
            portal,
            storage,
            runner,
            temp_dir,
        }
    }

    /// Send a GET request and parse the JSON body.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Send a POST request without a body and parse the JSON body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.send(Request::post(path).body(Body::empty()).unwrap())
            .await
    }

    /// Send a GET request and return the raw text body.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let response = self
            .router
            .clone()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse { status, body }
    }

    /// Poll the status endpoint until `check` passes or the timeout elapses.
    pub async fn wait_for_status<F>(&self, timeout: Duration, check: F) -> Option<Value>
    where
        F: Fn(&Value) -> bool,
    {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout {
            let response = self.get("/api/v1/cycles/status").await;
            if check(&response.body) {
                return Some(response.body);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        None
    }
}
