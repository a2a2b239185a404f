//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the full router in
//! process, with mock stage providers behind the real queue and an
//! in-memory result sink. No external services are contacted.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use reeldigest_core::{load_config_from_str, testing::MockProviders, JobQueue};
use reeldigest_server::state::AppState;

/// Re-export fixtures for test convenience
pub use reeldigest_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_ingest() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/v1/reels/ingest", json!({
///         "url": "https://www.instagram.com/reel/abc/"
///     })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock stage providers and the stores the queue writes to
    pub mocks: MockProviders,
    /// Queue shared with the router
    pub queue: JobQueue,
    /// Temporary directory for mock media files
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
    pub text: String,
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Ingest requests allowed per minute for the single test client
    pub ingest_requests_per_minute: u32,
    /// Key the rate limit on forwarded client headers
    pub trust_forwarded_headers: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            ingest_requests_per_minute: 1_000,
            trust_forwarded_headers: false,
        }
    }
}

impl TestConfig {
    pub fn with_rate_limit(ingest_requests_per_minute: u32) -> Self {
        Self {
            ingest_requests_per_minute,
            ..Self::default()
        }
    }

    pub fn trusting_forwarded_headers(mut self) -> Self {
        self.trust_forwarded_headers = true;
        self
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    /// Create a test fixture with custom configuration.
    pub fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let config = load_config_from_str(&format!(
            r#"
[server]
host = "127.0.0.1"
port = 3001
cors_origin = "http://localhost:5173"
trust_forwarded_headers = {trust}

[storage]
database_path = "{db}"
temp_dir = "{media}"

[resolver]
api_token = "test-token"

[openai]
api_key = "test-key"

[rate_limit]
ingest_requests_per_minute = {rpm}
"#,
            db = temp_dir.path().join("test.db").display(),
            media = temp_dir.path().join("media").display(),
            rpm = test_config.ingest_requests_per_minute,
            trust = test_config.trust_forwarded_headers,
        ))
        .expect("Failed to parse test config");

        let mocks = MockProviders::with_media_dir(temp_dir.path().join("media"));
        let queue = mocks.queue();

        let state = Arc::new(AppState::new(config, queue.clone()));
        let router = reeldigest_server::api::create_router(state);

        Self {
            router,
            mocks,
            queue,
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

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// POST an ingest request that claims to come from `forwarded_for`.
    pub async fn ingest_forwarded(&self, url: &str, forwarded_for: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/reels/ingest")
            .header("Content-Type", "application/json")
            .header("X-Forwarded-For", forwarded_for)
            .body(Body::from(serde_json::json!({ "url": url }).to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Ingest a URL and return the new job id.
    pub async fn ingest(&self, url: &str) -> String {
        let response = self
            .post("/api/v1/reels/ingest", serde_json::json!({ "url": url }))
            .await;
        assert_eq!(
            response.status,
            StatusCode::ACCEPTED,
            "ingest failed: {}",
            response.text
        );
        response.body["id"]
            .as_str()
            .expect("ingest response has an id")
            .to_string()
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    /// Send a prepared request to the test server.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
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

        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
