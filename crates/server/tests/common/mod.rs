//! Common test utilities for in-process API testing with mocks.
//!
//! This module provides a test fixture that builds the full router with a
//! running archive processor and a mock fetcher, so the whole add-item to
//! archive flow can be exercised without network access.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use archiver_core::{
    testing::MockFetcher, ArchiveProcessor, Config, MemoryTaskStore, ProcessorConfig, TaskStore,
};
use archiver_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use archiver_core::testing::fixtures;

/// Test fixture for API testing with a mock fetcher.
///
/// Clones of `fetcher` share state with the one inside the processor, so
/// tests can configure failures and inspect recorded fetches.
pub struct TestFixture {
    pub router: Router,
    pub fetcher: MockFetcher,
    pub store: Arc<MemoryTaskStore>,
    pub processor: Arc<ArchiveProcessor>,
    pub temp_dir: TempDir,
}

/// Response from the test server.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a fixture with default configuration and a started processor.
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Create a fixture with a custom processor configuration.
    pub async fn with_processor_config(processor: ProcessorConfig) -> Self {
        Self::with_config(Config {
            processor,
            ..Config::default()
        })
        .await
    }

    pub async fn with_config(config: Config) -> Self {
        Self::build(config, true)
    }

    /// Create a fixture whose processor is never started, so ready tasks stay
    /// queued and pending.
    pub async fn idle(processor: ProcessorConfig) -> Self {
        Self::build(
            Config {
                processor,
                ..Config::default()
            },
            false,
        )
    }

    fn build(mut config: Config, start: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        config.processor.temp_dir = temp_dir.path().to_path_buf();

        let store = Arc::new(MemoryTaskStore::new());
        let fetcher = MockFetcher::new();
        let processor = Arc::new(ArchiveProcessor::new(
            config.processor.clone(),
            Arc::clone(&store) as Arc<dyn TaskStore>,
            fetcher.clone(),
        ));
        if start {
            processor.start();
        }

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&store) as Arc<dyn TaskStore>,
            Arc::clone(&processor),
        ));
        let router = create_router(state);

        Self {
            router,
            fetcher,
            store,
            processor,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with no body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request_raw("POST", path, body, "application/json").await
    }

    /// Create a task and return its ID.
    pub async fn create_task(&self) -> String {
        let response = self.post_empty("/tasks").await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.body["id"]
            .as_str()
            .expect("task id missing")
            .to_string()
    }

    /// Add an item through the API.
    pub async fn add_item(&self, task_id: &str, url: &str) -> TestResponse {
        self.post(&format!("/tasks/{}/items", task_id), json!({ "url": url }))
            .await
    }

    /// Poll the task through the API until its status is terminal.
    pub async fn wait_terminal(&self, task_id: &str, timeout: Duration) -> Value {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let response = self.get(&format!("/tasks/{}", task_id)).await;
            let status = response.body["status"].as_str().unwrap_or_default();
            if status == "done" || status == "error" {
                return response.body;
            }
            if tokio::time::Instant::now() >= deadline {
                panic!("task {} stuck in {:?}", task_id, status);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Send a request with raw string body and custom content type.
    async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
