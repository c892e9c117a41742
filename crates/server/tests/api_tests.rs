//! API integration tests using mock providers and a mock stock catalog.
//!
//! These tests exercise the control API in-process with no network access.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestConfig, TestFixture};

// ============================================================================
// Health / Config / Metrics
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert!(response.body["version"].is_string());
    assert!(response.body["uptime_secs"].is_u64());
}

#[tokio::test]
async fn test_config_hides_secrets() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.body.to_string();
    assert!(!body.contains("test-secret"));
    assert_eq!(
        response.body["providers"]["gemini"]["api_key_configured"],
        true
    );
    assert_eq!(response.body["autopilot"]["target_per_topic"], 2);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;

    fixture.get("/api/v1/health").await;
    let (status, body) = fixture.get_text("/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("mirage_http_requests_total"));
    assert!(body.contains("mirage_library_assets"));
}

// ============================================================================
// Topics
// ============================================================================

#[tokio::test]
async fn test_topics_list_includes_builtins() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/topics").await;

    assert_eq!(response.status, StatusCode::OK);
    let topics = response.body["topics"].as_array().unwrap();
    assert!(topics.len() > 10);
    let burj = topics
        .iter()
        .find(|t| t["name"] == "Burj Khalifa")
        .expect("built-in topic listed");
    assert_eq!(burj["custom"], false);
    assert_eq!(burj["count"], 0);
    assert_eq!(burj["completed"], false);
}

#[tokio::test]
async fn test_custom_topic_lifecycle() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/topics",
            json!({
                "name": "Hatta Dam",
                "category": "Nature",
                "keywords": ["hatta", "kayak"]
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["priority"], 5);

    // Same name in another case is a duplicate
    let response = fixture
        .post(
            "/api/v1/topics",
            json!({ "name": "hatta dam", "category": "Nature" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let listed = fixture.get("/api/v1/topics").await;
    let hatta = listed.body["topics"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == "Hatta Dam")
        .cloned()
        .expect("custom topic listed");
    assert_eq!(hatta["custom"], true);

    let response = fixture.delete("/api/v1/topics/Hatta%20Dam").await;
    assert_eq!(response.status, StatusCode::OK);

    let response = fixture.delete("/api/v1/topics/Hatta%20Dam").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_custom_topic_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/topics", json!({ "name": "  ", "category": "Nature" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = fixture
        .post(
            "/api/v1/topics",
            json!({ "name": "Al Qudra", "category": "Nature", "priority": 11 }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Autopilot
// ============================================================================

#[tokio::test]
async fn test_autopilot_run_fills_first_topic() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_empty("/api/v1/autopilot/start").await;
    assert_eq!(response.status, StatusCode::ACCEPTED);

    fixture.wait_until_idle("/api/v1/autopilot", "/running").await;

    let status = fixture.get("/api/v1/autopilot").await;
    assert_eq!(status.body["available"], true);
    assert_eq!(status.body["completed_topics"], 1);
    assert_eq!(status.body["status"]["state"], "completed");
    assert_eq!(status.body["status"]["last_report"]["images_created"], 2);
    assert_eq!(
        fixture.gemini.call_count().await + fixture.openai.call_count().await,
        2
    );

    let assets = fixture.get("/api/v1/library?source=generated").await;
    assert_eq!(assets.body["total"], 2);
    let asset = &assets.body["assets"][0];
    assert_eq!(asset["topic"], "Burj Khalifa");

    let id = asset["id"].as_str().unwrap();
    let single = fixture.get(&format!("/api/v1/library/{}", id)).await;
    assert_eq!(single.status, StatusCode::OK);
    assert_eq!(single.body["id"], id);
}

#[tokio::test]
async fn test_autopilot_second_start_conflicts() {
    let fixture = TestFixture::new().await;
    fixture
        .gemini
        .set_delay(std::time::Duration::from_millis(200))
        .await;
    fixture
        .openai
        .set_delay(std::time::Duration::from_millis(200))
        .await;

    let first = fixture.post_empty("/api/v1/autopilot/start").await;
    assert_eq!(first.status, StatusCode::ACCEPTED);

    let second = fixture.post_empty("/api/v1/autopilot/start").await;
    assert_eq!(second.status, StatusCode::CONFLICT);

    let reset = fixture.post_empty("/api/v1/autopilot/reset").await;
    assert_eq!(reset.status, StatusCode::CONFLICT);

    fixture.wait_until_idle("/api/v1/autopilot", "/running").await;
}

#[tokio::test]
async fn test_autopilot_stop_when_idle_conflicts() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_empty("/api/v1/autopilot/stop").await;

    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_autopilot_rejects_bad_parallelism() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/autopilot/start", json!({ "parallelism": 8 }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = fixture
        .post("/api/v1/autopilot/start", json!({ "target_per_topic": 0 }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_autopilot_reset_clears_completed_topics() {
    let fixture = TestFixture::new().await;

    fixture.post_empty("/api/v1/autopilot/start").await;
    fixture.wait_until_idle("/api/v1/autopilot", "/running").await;

    let response = fixture.post_empty("/api/v1/autopilot/reset").await;
    assert_eq!(response.status, StatusCode::OK);

    let status = fixture.get("/api/v1/autopilot").await;
    assert_eq!(status.body["completed_topics"], 0);
}

// ============================================================================
// Acquisition / Library
// ============================================================================

#[tokio::test]
async fn test_acquisition_delete_is_never_redownloaded() {
    let fixture = TestFixture::new().await;
    fixture.catalog.set_page(1, fixtures::stock_page(1, 3)).await;

    let response = fixture.post_empty("/api/v1/acquisition/run").await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    fixture
        .wait_until_idle("/api/v1/acquisition", "/status/running")
        .await;

    let status = fixture.get("/api/v1/acquisition").await;
    assert_eq!(status.body["status"]["acquired"], 3);
    assert_eq!(status.body["status"]["last_report"]["downloaded"], 3);

    let assets = fixture.get("/api/v1/library?source=stock").await;
    assert_eq!(assets.body["total"], 3);
    let id = assets.body["assets"][0]["id"].as_str().unwrap().to_string();

    let response = fixture.delete(&format!("/api/v1/library/{}", id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["source"], "stock");

    let status = fixture.get("/api/v1/acquisition").await;
    assert_eq!(status.body["status"]["forgotten"], 1);

    // Rescan from page one
    let response = fixture.post_empty("/api/v1/acquisition/reset").await;
    assert_eq!(response.status, StatusCode::OK);
    fixture.post_empty("/api/v1/acquisition/run").await;
    fixture
        .wait_until_idle("/api/v1/acquisition", "/status/running")
        .await;

    let status = fixture.get("/api/v1/acquisition").await;
    assert_eq!(status.body["status"]["last_report"]["downloaded"], 0);
    assert_eq!(status.body["status"]["last_report"]["skipped"], 3);

    let assets = fixture.get("/api/v1/library?source=stock").await;
    assert_eq!(assets.body["total"], 2);
}

#[tokio::test]
async fn test_acquisition_rejects_bad_page_limit() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/acquisition/run", json!({ "per_page_limit": 500 }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_library_missing_asset() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/library/does-not-exist").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = fixture.delete("/api/v1/library/does-not-exist").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_library_stats() {
    let fixture = TestFixture::new().await;
    fixture.catalog.set_page(1, fixtures::stock_page(1, 2)).await;

    fixture.post_empty("/api/v1/acquisition/run").await;
    fixture
        .wait_until_idle("/api/v1/acquisition", "/status/running")
        .await;

    let response = fixture.get("/api/v1/library/stats").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 2);
    assert_eq!(response.body["by_source"]["stock"], 2);
}

// ============================================================================
// Unavailable loops
// ============================================================================

#[tokio::test]
async fn test_loops_unavailable_without_credentials() {
    let fixture = TestFixture::with_config(TestConfig::bare()).await;

    let status = fixture.get("/api/v1/autopilot").await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.body["available"], false);

    let response = fixture.post_empty("/api/v1/autopilot/start").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);

    let response = fixture.post_empty("/api/v1/acquisition/run").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);

    let status = fixture.get("/api/v1/acquisition").await;
    assert_eq!(status.body["available"], false);
}
