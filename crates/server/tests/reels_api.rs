//! API tests for reel ingestion, results and the queue, using mock providers.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestConfig, TestFixture};
use reeldigest_core::JobState;

const WAIT: Duration = Duration::from_secs(5);

// =============================================================================
// Health and config
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/health").await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("ok"));
}

#[tokio::test]
async fn test_config_hides_secrets() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["resolver"]["api_token_configured"], json!(true));
    assert_eq!(response.body["openai"]["api_key_configured"], json!(true));
    assert!(!response.text.contains("test-token"));
    assert!(!response.text.contains("test-key"));
}

// =============================================================================
// Ingest
// =============================================================================

#[tokio::test]
async fn test_ingest_runs_to_completion() {
    let fixture = TestFixture::new();
    let url = fixtures::reel_url("focaccia");

    let response = fixture
        .post("/api/v1/reels/ingest", json!({ "url": url }))
        .await;

    assert_status!(response, StatusCode::ACCEPTED);
    assert_json_path!(response.body, "status", json!("queued"));
    let id = response.body["id"].as_str().unwrap().to_string();

    let status = fixtures::wait_for_terminal(&fixture.queue, &id, WAIT).await;
    assert_eq!(status.status, JobState::Completed);

    let response = fixture.get(&format!("/api/v1/reels/{}/status", id)).await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("completed"));
    assert_json_path!(response.body, "progress", json!(100));

    let response = fixture.get(&format!("/api/v1/reels/{}", id)).await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("completed"));
    assert_json_path!(response.body, "source_url", json!(url));
    assert_eq!(response.body["summary"]["title"], json!("Mock summary"));
    assert!(response.body["transcript"]["text"].is_string());
    assert!(response.body.get("error").is_none());
}

#[tokio::test]
async fn test_ingest_requires_url() {
    let fixture = TestFixture::new();

    let response = fixture.post("/api/v1/reels/ingest", json!({})).await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());

    let response = fixture
        .post("/api/v1/reels/ingest", json!({ "url": "   " }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ingest_rejects_unsupported_url() {
    let fixture = TestFixture::new();

    let response = fixture
        .post(
            "/api/v1/reels/ingest",
            json!({ "url": "https://example.com/reel/abc/" }),
        )
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_json_path!(response.body, "error", json!("Invalid Instagram URL"));
    assert!(fixture.queue.snapshot().pending.is_empty());
}

#[tokio::test]
async fn test_ingest_malformed_json() {
    let fixture = TestFixture::new();

    let response = fixture
        .post_raw("/api/v1/reels/ingest", "{\"url\": ")
        .await;

    assert!(
        response.status.is_client_error(),
        "expected 4xx, got {}",
        response.status
    );
}

#[tokio::test]
async fn test_ingest_unavailable_content_fails() {
    let fixture = TestFixture::new();
    let url = fixtures::reel_url("private");
    fixture
        .mocks
        .resolver
        .set_metadata(&url, fixtures::unavailable_metadata())
        .await;

    let id = fixture.ingest(&url).await;
    fixtures::wait_for_terminal(&fixture.queue, &id, WAIT).await;

    let response = fixture.get(&format!("/api/v1/reels/{}/status", id)).await;
    assert_json_path!(response.body, "status", json!("failed"));
    assert_json_path!(
        response.body,
        "error_message",
        json!(reeldigest_core::pipeline::MEDIA_UNAVAILABLE)
    );

    let response = fixture.get(&format!("/api/v1/reels/{}", id)).await;
    assert_json_path!(response.body, "status", json!("failed"));
    assert!(response.body.get("transcript").is_none());
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn test_ingest_rate_limited() {
    let fixture = TestFixture::with_config(TestConfig::with_rate_limit(2));

    fixture.ingest(&fixtures::reel_url("one")).await;
    fixture.ingest(&fixtures::reel_url("two")).await;

    let response = fixture
        .post(
            "/api/v1/reels/ingest",
            json!({ "url": fixtures::reel_url("three") }),
        )
        .await;

    assert_status!(response, StatusCode::TOO_MANY_REQUESTS);
    assert!(response.body["retry_after_secs"].as_u64().unwrap() >= 1);
    assert!(response.headers.contains_key("retry-after"));

    // Other routes are not limited
    let response = fixture.get("/api/v1/reels").await;
    assert_status!(response, StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_header_does_not_reset_rate_limit() {
    let fixture = TestFixture::with_config(TestConfig::with_rate_limit(1));

    let first = fixture
        .ingest_forwarded(&fixtures::reel_url("one"), "203.0.113.1")
        .await;
    assert_status!(first, StatusCode::ACCEPTED);

    for i in 2..=5 {
        let response = fixture
            .ingest_forwarded(&fixtures::reel_url("again"), &format!("203.0.113.{}", i))
            .await;
        assert_status!(response, StatusCode::TOO_MANY_REQUESTS);
    }
}

#[tokio::test]
async fn test_trusted_forwarded_header_limits_per_client() {
    let fixture = TestFixture::with_config(
        TestConfig::with_rate_limit(1).trusting_forwarded_headers(),
    );

    let response = fixture
        .ingest_forwarded(&fixtures::reel_url("one"), "203.0.113.1")
        .await;
    assert_status!(response, StatusCode::ACCEPTED);

    let response = fixture
        .ingest_forwarded(&fixtures::reel_url("two"), "203.0.113.1")
        .await;
    assert_status!(response, StatusCode::TOO_MANY_REQUESTS);

    let response = fixture
        .ingest_forwarded(&fixtures::reel_url("three"), "203.0.113.2")
        .await;
    assert_status!(response, StatusCode::ACCEPTED);
}

// =============================================================================
// Status and results
// =============================================================================

#[tokio::test]
async fn test_unknown_job_is_404() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/reels/does-not-exist/status").await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert_json_path!(response.body, "error", json!("Job not found"));

    let response = fixture.get("/api/v1/reels/does-not-exist").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_reels_with_filters() {
    let fixture = TestFixture::new();
    let private = fixtures::reel_url("private");
    fixture
        .mocks
        .resolver
        .set_metadata(&private, fixtures::unavailable_metadata())
        .await;

    fixture.ingest(&fixtures::reel_url("pasta")).await;
    fixture.ingest(&fixtures::reel_url("bread")).await;
    fixture.ingest(&private).await;
    fixtures::wait_for_idle(&fixture.queue, WAIT).await;

    let response = fixture.get("/api/v1/reels").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "total", json!(3));
    assert_json_path!(response.body, "limit", json!(20));
    assert_json_path!(response.body, "offset", json!(0));

    let response = fixture.get("/api/v1/reels?status=failed").await;
    assert_json_path!(response.body, "total", json!(1));
    assert_eq!(response.body["results"][0]["source_url"], json!(private));

    let response = fixture.get("/api/v1/reels?status=completed&limit=1").await;
    assert_json_path!(response.body, "total", json!(2));
    assert_eq!(response.body["results"].as_array().unwrap().len(), 1);

    let response = fixture.get("/api/v1/reels?search=PASTA").await;
    assert_json_path!(response.body, "total", json!(1));

    let response = fixture.get("/api/v1/reels?status=running").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_reels_clamps_limit() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/reels?limit=5000&offset=-3").await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "limit", json!(100));
    assert_json_path!(response.body, "offset", json!(0));
}

// =============================================================================
// Retry and delete
// =============================================================================

#[tokio::test]
async fn test_retry_reruns_failed_job() {
    let fixture = TestFixture::new();
    let url = fixtures::reel_url("flaky");
    fixture
        .mocks
        .fetcher
        .set_next_error(reeldigest_core::ProviderError::Status {
            context: "Failed to download media".to_string(),
            status: 503,
        })
        .await;

    let id = fixture.ingest(&url).await;
    let status = fixtures::wait_for_terminal(&fixture.queue, &id, WAIT).await;
    assert_eq!(status.status, JobState::Failed);

    let response = fixture
        .post_empty(&format!("/api/v1/reels/{}/retry", id))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "id", json!(id));
    assert_json_path!(response.body, "status", json!("queued"));
    assert!(response.body["message"].is_string());

    let status = fixtures::wait_for_terminal(&fixture.queue, &id, WAIT).await;
    assert_eq!(status.status, JobState::Completed);

    let response = fixture.get(&format!("/api/v1/reels/{}", id)).await;
    assert_json_path!(response.body, "status", json!("completed"));
    assert!(response.body.get("error").is_none());

    let response = fixture.get("/api/v1/reels").await;
    assert_json_path!(response.body, "total", json!(1));
}

#[tokio::test]
async fn test_retry_unknown_job_is_404() {
    let fixture = TestFixture::new();

    let response = fixture.post_empty("/api/v1/reels/nope/retry").await;

    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_reel() {
    let fixture = TestFixture::new();
    let id = fixture.ingest(&fixtures::reel_url("gone")).await;
    fixtures::wait_for_terminal(&fixture.queue, &id, WAIT).await;

    let response = fixture.delete(&format!("/api/v1/reels/{}", id)).await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "id", json!(id));

    let response = fixture.get(&format!("/api/v1/reels/{}", id)).await;
    assert_status!(response, StatusCode::NOT_FOUND);
    let response = fixture.get(&format!("/api/v1/reels/{}/status", id)).await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let response = fixture.delete(&format!("/api/v1/reels/{}", id)).await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

// =============================================================================
// Queue and metrics
// =============================================================================

#[tokio::test]
async fn test_queue_snapshot_while_busy() {
    let fixture = TestFixture::new();
    fixture.mocks.resolver.gate().close();

    let first = fixture.ingest(&fixtures::reel_url("first")).await;
    let second = fixture.ingest(&fixtures::reel_url("second")).await;
    fixtures::wait_for_state(&fixture.queue, &first, JobState::ResolvingVideo, WAIT).await;

    let response = fixture.get("/api/v1/queue").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "busy", json!(true));
    assert_json_path!(response.body, "pending", json!([second.clone()]));

    let response = fixture.get(&format!("/api/v1/reels/{}/status", second)).await;
    assert_json_path!(response.body, "status", json!("queued"));

    fixture.mocks.resolver.gate().open();
    fixtures::wait_for_idle(&fixture.queue, WAIT).await;

    let response = fixture.get("/api/v1/queue").await;
    assert_json_path!(response.body, "busy", json!(false));
    assert_json_path!(response.body, "pending", json!([]));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;

    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("reeldigest_queue_pending"));
    assert!(response.text.contains("reeldigest_http_requests_total"));
}
