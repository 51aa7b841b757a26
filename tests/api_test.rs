//! HTTP API tests driving the router in-process

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use form_intake::{
    api::{build_router, AppState},
    collector::{Delivery, FormTransport, TransportError},
    forms::FormIntake,
    middleware::RateLimiter,
    observability::MetricsCollector,
    Config,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use url::Url;

/// Counts posts and always reports a delivered request
#[derive(Default)]
struct CountingTransport {
    posts: AtomicUsize,
}

#[async_trait]
impl FormTransport for CountingTransport {
    async fn post_form(
        &self,
        _endpoint: &Url,
        _payload: &[(String, String)],
    ) -> Result<Delivery, TransportError> {
        self.posts.fetch_add(1, Ordering::SeqCst);
        Ok(Delivery::Opaque)
    }
}

fn create_app(per_client_rate_limit: bool) -> (Router, Arc<CountingTransport>) {
    let config = Config::default_config();
    let transport = Arc::new(CountingTransport::default());
    let metrics = Arc::new(MetricsCollector::new());
    let intake = FormIntake::from_config(
        &config,
        transport.clone(),
        Arc::new(RateLimiter::new()),
        Some(metrics.clone()),
    )
    .unwrap();

    let state = AppState {
        intake: Arc::new(intake),
        metrics,
        per_client_rate_limit,
    };
    (build_router(state, 1024), transport)
}

fn submit_request(kind: &str, body: Value, client: Option<&str>) -> Request<Body> {
    let body = body.to_string();
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/api/v1/forms/{}", kind))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len());
    if let Some(client) = client {
        builder = builder.header("x-forwarded-for", client);
    }
    builder.body(Body::from(body)).unwrap()
}

fn valid_contact() -> Value {
    json!({
        "name": "Ann",
        "email": "ann@x.com",
        "subject": "Hi",
        "message": "Hello there friend"
    })
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = tokio_test::assert_ok!(to_bytes(response.into_body(), usize::MAX).await);
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_valid_submission_is_accepted() {
    let (app, transport) = create_app(false);

    let response = app
        .oneshot(submit_request("contact", valid_contact(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = json_body(response).await;
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["title"], "Message sent successfully!");
    assert!(body.get("errors").is_none());
    assert_eq!(transport.posts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_submission_lists_every_field() {
    let (app, transport) = create_app(false);
    let body = json!({
        "name": "Ann",
        "email": "not-an-email",
        "subject": "Hi",
        "message": "short"
    });

    let response = app
        .oneshot(submit_request("contact", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["status"], "validation_failed");
    let errors = body["errors"].as_object().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors["email"], "Please enter a valid email address");
    assert_eq!(errors["message"], "Message must be at least 10 characters");
    assert_eq!(transport.posts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fourth_attempt_is_rate_limited() {
    let (app, transport) = create_app(false);

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(submit_request("contact", valid_contact(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let response = app
        .oneshot(submit_request("contact", valid_contact(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0 && retry_after <= 300);

    let body = json_body(response).await;
    assert_eq!(body["status"], "rate_limited");
    assert_eq!(body["retry_after_secs"], retry_after);
    assert_eq!(transport.posts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_per_client_limits_use_forwarded_address() {
    let (app, _) = create_app(true);

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(submit_request("contact", valid_contact(), Some("203.0.113.7")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let blocked = app
        .clone()
        .oneshot(submit_request("contact", valid_contact(), Some("203.0.113.7")))
        .await
        .unwrap();
    assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);

    let other = app
        .oneshot(submit_request("contact", valid_contact(), Some("198.51.100.2")))
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_form_kind_aliases() {
    let (app, _) = create_app(false);
    let body = json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@engine.org",
        "current_role": "Analyst",
        "experience": "senior",
        "interests": "Computation",
        "background": "Twenty years of engines and looms"
    });

    for kind in ["member-registration", "join"] {
        let response = app
            .clone()
            .oneshot(submit_request(kind, body.clone(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED, "kind {}", kind);
    }
}

#[tokio::test]
async fn test_unknown_form_kind_is_not_found() {
    let (app, transport) = create_app(false);

    let response = app
        .oneshot(submit_request("newsletter", valid_contact(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Unknown form kind: newsletter");
    assert_eq!(transport.posts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (app, transport) = create_app(false);
    let body = json!({ "message": "x".repeat(4096) });

    let response = app
        .oneshot(submit_request("contact", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(transport.posts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_metrics_endpoint_reports_outcomes() {
    let (app, _) = create_app(false);

    app.clone()
        .oneshot(submit_request("contact", valid_contact(), None))
        .await
        .unwrap();

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("form_intake_submissions_total 1"));
    assert!(text.contains("form_intake_outcomes_total{outcome=\"accepted\"} 1"));
    assert!(text.contains("form_intake_rate_limit_tracked_identifiers 1"));
}

#[tokio::test]
async fn test_liveness() {
    let (app, _) = create_app(false);

    let response = app
        .oneshot(Request::builder().uri("/health/live").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "alive");
}
