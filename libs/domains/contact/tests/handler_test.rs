//! Handler tests for the contact domain
//!
//! These tests drive the contact router end to end with the in-memory email
//! provider:
//! - Request deserialization and sanitization
//! - Validation responses
//! - Rate limiting
//! - Delivery failures

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_contact::handlers::{self, contact_rate_limit};
use domain_contact::ContactService;
use domain_notifications::{EmailService, MockConfig, Outbox, ProviderRegistry, ProviderSpec};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // For oneshot()

async fn email_service(config: MockConfig, initialize: bool) -> Arc<EmailService> {
    let mut registry = ProviderRegistry::new(Duration::from_secs(1));
    registry.register("mock", ProviderSpec::Mock(config));
    let service = EmailService::with_registry(
        registry,
        "mock",
        None,
        Some("owner@example.com".to_string()),
    );
    if initialize {
        assert!(service.initialize().await);
    }
    Arc::new(service)
}

async fn app_with(config: MockConfig, per_hour: u32) -> Router {
    let email = email_service(config, true).await;
    handlers::router(
        ContactService::new(email),
        contact_rate_limit(NonZeroU32::new(per_hour).unwrap()),
    )
}

fn submission(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn valid_body() -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "company": "Engines Ltd",
        "service": "AI Strategy",
        "message": "We would like to discuss an automation project."
    })
}

// Helper to parse JSON response body
async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_valid_submission_returns_200() {
    let outbox = Outbox::default();
    let app = app_with(
        MockConfig {
            outbox: outbox.clone(),
            ..Default::default()
        },
        5,
    )
    .await;

    let response = app.oneshot(submission(valid_body())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({
            "success": true,
            "message": "Thank you for your message! We will get back to you soon."
        })
    );

    let sent = outbox.last().unwrap();
    assert_eq!(sent.to, "owner@example.com");
    assert!(sent.subject.contains("Ada Lovelace"));
    assert!(sent.text.as_deref().unwrap().contains("Engines Ltd"));
}

#[tokio::test]
async fn test_missing_fields_return_400() {
    let outbox = Outbox::default();
    let app = app_with(
        MockConfig {
            outbox: outbox.clone(),
            ..Default::default()
        },
        5,
    )
    .await;

    let response = app
        .oneshot(submission(json!({"email": "ada@example.com"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Missing required fields");
    assert_eq!(body["message"], "Name, email, and message are required");
    assert!(outbox.is_empty());
}

#[tokio::test]
async fn test_invalid_email_returns_400() {
    let app = app_with(MockConfig::default(), 5).await;
    let mut body = valid_body();
    body["email"] = json!("ada.example.com");

    let response = app.oneshot(submission(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Invalid email");
    assert_eq!(body["message"], "Please provide a valid email address");
}

#[tokio::test]
async fn test_message_length_is_checked_after_sanitizing() {
    let app = app_with(MockConfig::default(), 5).await;
    let mut body = valid_body();
    body["message"] = json!("Hi<script>alert('long enough payload')</script>");

    let response = app.oneshot(submission(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Message too short");
    assert_eq!(
        body["message"],
        "Please provide a more detailed message (at least 10 characters)"
    );
}

#[tokio::test]
async fn test_too_long_message_returns_400() {
    let app = app_with(MockConfig::default(), 5).await;
    let mut body = valid_body();
    body["message"] = json!("a".repeat(5001));

    let response = app.oneshot(submission(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["message"], "Message cannot exceed 5000 characters");
}

#[tokio::test]
async fn test_markup_is_stripped_before_sending() {
    let outbox = Outbox::default();
    let app = app_with(
        MockConfig {
            outbox: outbox.clone(),
            ..Default::default()
        },
        5,
    )
    .await;
    let mut body = valid_body();
    body["name"] = json!("Ada<script>steal()</script>");

    let response = app.oneshot(submission(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let sent = outbox.last().unwrap();
    assert!(!sent.html.as_deref().unwrap().contains("steal()"));
    assert!(sent.subject.contains("Ada"));
}

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let app = app_with(MockConfig::default(), 5).await;
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn test_sixth_submission_is_rate_limited() {
    let app = app_with(MockConfig::default(), 5).await;

    for _ in 0..5 {
        let response = app.clone().oneshot(submission(valid_body())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(submission(valid_body())).await.unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
    let body = json_body(response).await;
    assert_eq!(body["error"], "Too many submissions");
    assert_eq!(
        body["message"],
        "You can only submit the contact form 5 times per hour. Please try again later."
    );
}

#[tokio::test]
async fn test_rotating_forwarded_prefix_still_rate_limited() {
    let outbox = Outbox::default();
    let app = app_with(
        MockConfig {
            outbox: outbox.clone(),
            ..Default::default()
        },
        5,
    )
    .await;

    let mut accepted = 0;
    for i in 0..20 {
        let mut request = submission(valid_body());
        request.headers_mut().insert(
            "x-forwarded-for",
            format!("10.0.0.{}, 198.51.100.50", i).parse().unwrap(),
        );
        let response = app.clone().oneshot(request).await.unwrap();
        if response.status() == StatusCode::OK {
            accepted += 1;
        } else {
            assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        }
    }

    assert_eq!(accepted, 5);
    assert_eq!(outbox.len(), 5);
}

#[tokio::test]
async fn test_delivery_failure_returns_500() {
    let app = app_with(
        MockConfig::default().with_failing_recipient("owner@example.com"),
        5,
    )
    .await;

    let response = app.oneshot(submission(valid_body())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Email sending failed");
    assert_eq!(
        body["message"],
        "We could not send your message. Please try again later or contact us directly."
    );
}

#[tokio::test]
async fn test_uninitialized_email_service_returns_500() {
    let email = email_service(MockConfig::default(), false).await;
    let app = handlers::router(
        ContactService::new(email),
        contact_rate_limit(NonZeroU32::new(5).unwrap()),
    );

    let response = app.oneshot(submission(valid_body())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
