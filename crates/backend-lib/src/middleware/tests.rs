use super::*;
use crate::config::Settings;
use crate::storage::FlatFileStorage;
use crate::AppState;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

async fn test_handler() -> &'static str {
    "Hello, World!"
}

fn request_from(ip: &str) -> Request<Body> {
    Request::builder()
        .uri("/")
        .header("x-real-ip", ip)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_rate_limit() {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.rate_limit.max_requests = 3;

    let state = Arc::new(AppState::new(
        FlatFileStorage::new(temp_dir.path()).unwrap(),
        &settings,
    ));

    let app = Router::new()
        .route("/", get(test_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit::<FlatFileStorage>,
        ))
        .with_state(state);

    for _ in 0..3 {
        let response = app.clone().oneshot(request_from("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(request_from("10.0.0.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // other clients have their own window
    let response = app.oneshot(request_from("10.0.0.2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn test_window_resets() {
    let limiter = rate_limit::RateLimiter::new(Duration::from_millis(20), 1);
    assert!(limiter.check("a"));
    assert!(!limiter.check("a"));

    std::thread::sleep(Duration::from_millis(30));
    assert!(limiter.check("a"));
}

#[test]
fn test_cleanup_drops_stale_clients() {
    let limiter = rate_limit::RateLimiter::new(Duration::from_millis(10), 5);
    limiter.check("a");
    limiter.check("b");
    assert_eq!(limiter.tracked_clients(), 2);

    std::thread::sleep(Duration::from_millis(20));
    limiter.cleanup();
    assert_eq!(limiter.tracked_clients(), 0);
}
