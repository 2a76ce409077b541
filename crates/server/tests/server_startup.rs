//! Basic server surface tests: health, config, metrics.

mod common;

use axum::http::StatusCode;
use common::TestFixture;

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_endpoint_is_sanitized_shape() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/config").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["server"]["port"], 8080);
    assert!(response.body["feed"]["full_url"]
        .as_str()
        .unwrap()
        .starts_with("https://"));
    assert_eq!(response.body["ingest"]["batch_size"], 4000);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();

    // A request so the counter exists
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    let text = response.body.as_str().unwrap_or_default().to_string();
    assert!(text.contains("kuckmal_http_requests_total"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/nope").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
