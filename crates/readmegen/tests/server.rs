//! HTTP surface tests: admission control, validation, and stream setup.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use readmegen::serve::{build_router, App, AppState};
use tower::ServiceExt;

fn test_router(rate_burst: u32, max_body_bytes: usize) -> Router {
    let config = App {
        port: 0,
        host: "127.0.0.1".to_string(),
        model: "gemini-2.5-flash".to_string(),
        gemini_api_key: String::new(),
        store_url: String::new(),
        store_api_key: String::new(),
        max_body_bytes,
        rate_burst,
        rate_refill_secs: 60,
    };
    build_router(AppState::new(config).expect("state"))
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .expect("request")
}

fn post_json(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn test_health_reports_status_uptime_and_memory() {
    let router = test_router(10, 1024 * 1024);

    for path in ["/api/health", "/health"] {
        let response = router.clone().oneshot(get(path)).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "Ok");
        assert!(body["uptime"].is_number());
        assert!(body["memoryUsage"]["rss"].is_number());
        assert!(body["memoryUsage"]["vms"].is_number());
    }
}

#[tokio::test]
async fn test_invalid_json_body_is_rejected() {
    let router = test_router(10, 1024 * 1024);

    let response = router
        .oneshot(post_json("/api/generate-readme", "{not json"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn test_missing_required_fields_are_rejected() {
    let router = test_router(10, 1024 * 1024);

    let response = router
        .oneshot(post_json(
            "/api/generate-readme",
            r#"{"projectType": "cli", "projectFiles": []}"#,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn test_rate_limit_rejects_beyond_burst_but_spares_health() {
    let router = test_router(2, 1024 * 1024);

    // Invalid bodies still consume tokens: admission happens first.
    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(post_json("/api/generate-readme", "{}"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = router
        .clone()
        .oneshot(post_json("/api/generate-readme", "{}"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Too many requests, try again later.");

    // The health check is exempt no matter how dry the bucket is.
    let response = router
        .clone()
        .oneshot(get("/api/health"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_oversized_body_is_rejected_before_parsing() {
    let router = test_router(10, 1024);

    let huge = format!(
        r#"{{"projectType": "cli", "projectFiles": ["main.go"], "fullCode": "{}"}}"#,
        "x".repeat(4096)
    );
    let response = router
        .oneshot(post_json("/api/generate-readme", &huge))
        .await
        .expect("response");

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_generate_opens_event_stream_with_security_headers() {
    let router = test_router(10, 1024 * 1024);

    let response = router
        .oneshot(post_json(
            "/api/generate-readme",
            r#"{"projectType": "cli", "projectFiles": ["main.go"], "fullCode": "package main"}"#,
        ))
        .await
        .expect("response");

    // Headers are committed before the generation outcome is known; backend
    // failures are reported inside the stream, not via the status line.
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE]
        .to_str()
        .expect("content type");
    assert!(content_type.starts_with("text/event-stream"));
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(
        response.headers()[header::CONTENT_SECURITY_POLICY],
        "default-src 'self'; script-src 'self'; object-src 'none'"
    );
}
