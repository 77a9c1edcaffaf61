//! Server Startup Tests
//!
//! Tests for router construction, configuration loading, and startup behavior.

use std::net::TcpListener;
use std::time::Duration;

use axum::{body::Body, http::Request};
use tokio::time::timeout;
use tower::util::ServiceExt;

use realtime_relay::{
    DEFAULT_REALTIME_MODEL, OPENAI_REALTIME_URL, ServerConfig, handlers::api::HealthResponse,
    routes, state::AppState,
};

/// Helper function to create a minimal test configuration
fn create_minimal_config(port: u16) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port,
        tls: None,
        openai_api_key: None,
        realtime_url: OPENAI_REALTIME_URL.to_string(),
        realtime_model: DEFAULT_REALTIME_MODEL.to_string(),
        response_instructions: None,
    }
}

/// Find an available port for testing
fn find_available_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn upgrade_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("upgrade", "websocket")
        .header("connection", "upgrade")
        .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
        .header("sec-websocket-version", "13")
        .body(Body::empty())
        .unwrap()
}

/// Test that the server can start with minimal configuration (no API keys)
#[tokio::test]
async fn test_minimal_config_boot() {
    let config = create_minimal_config(find_available_port());

    // Create app state - this should succeed even without API keys
    let app_state = AppState::new(config);
    assert!(!app_state.credentials.has_api_key());

    let app = routes::create_app(app_state);

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::OK);
}

/// Test the health check body
#[tokio::test]
async fn test_health_check_reports_sessions() {
    let app_state = AppState::new(create_minimal_config(find_available_port()));
    let _session = app_state.track_session();

    let app = routes::api::create_api_router().with_state(app_state);
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        health,
        HealthResponse {
            status: "OK".to_string(),
            active_sessions: 1,
        }
    );
}

/// Test that the server correctly handles Realtime route setup
#[tokio::test]
async fn test_realtime_route_setup() {
    let app_state = AppState::new(create_minimal_config(find_available_port()));

    let realtime_routes = routes::realtime::create_realtime_router().with_state(app_state);

    let response = realtime_routes
        .oneshot(upgrade_request("/app/chat/realtime"))
        .await
        .unwrap();

    // Should get a response (either upgrade or bad request, not 404)
    assert_ne!(response.status(), axum::http::StatusCode::NOT_FOUND);
}

/// Test that unknown paths are not routed
#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = routes::create_app(AppState::new(create_minimal_config(
        find_available_port(),
    )));

    let response = app.oneshot(upgrade_request("/realtime")).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
}

/// Test that the configured upstream endpoint flows into the credentials
#[tokio::test]
async fn test_credentials_from_config() {
    let mut config = create_minimal_config(find_available_port());
    config.openai_api_key = Some("sk-test".to_string());
    config.realtime_url = "ws://127.0.0.1:9/v1/realtime".to_string();
    config.realtime_model = "gpt-4o-mini-realtime-preview".to_string();

    let app_state = AppState::new(config);
    assert!(app_state.credentials.has_api_key());
    assert_eq!(
        app_state.credentials.endpoint(),
        "ws://127.0.0.1:9/v1/realtime?model=gpt-4o-mini-realtime-preview"
    );
}

/// Test address parsing
#[tokio::test]
async fn test_address_parsing() {
    let config = create_minimal_config(8080);
    let address = config.address();
    assert_eq!(address, "127.0.0.1:8080");
    assert!(address.parse::<std::net::SocketAddr>().is_ok());
}

/// Test that the shutdown token reaches session tokens
#[tokio::test]
async fn test_shutdown_token_propagates() {
    let app_state = AppState::new(create_minimal_config(find_available_port()));
    let session_token = app_state.shutdown.child_token();

    let task = tokio::spawn(async move { session_token.cancelled().await });
    app_state.shutdown.cancel();

    let result = timeout(Duration::from_secs(1), task).await;
    assert!(result.is_ok());
}

/// Test concurrent request handling capability
#[tokio::test]
async fn test_concurrent_request_handling() {
    let app = routes::create_app(AppState::new(create_minimal_config(
        find_available_port(),
    )));

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                let request = Request::builder().uri("/").body(Body::empty()).unwrap();
                let response = app.oneshot(request).await.unwrap();
                response.status()
            })
        })
        .collect();

    for task in tasks {
        let status = task.await.expect("Task should complete");
        assert_eq!(status, axum::http::StatusCode::OK);
    }
}
