// Parent gate verification and reveal-unlock tests
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

async fn verify_pin(app: &Router, user: &str, body: String) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/parent/verify-pin")
                .header("content-type", "application/json")
                .header("x-user", user)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let payload = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, payload)
}

#[tokio::test]
async fn test_dev_pin_opens_gate() {
    let app = common::create_test_app().await;

    let (status, payload) = verify_pin(&app, "parent-1", json!({ "pin": "1234" }).to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["ok"], true);
}

#[tokio::test]
async fn test_open_gate_unlocks_kid_reveal() {
    let app = common::create_test_app().await;

    let (_, payload) = verify_pin(&app, "family-1", json!({ "pin": "1234" }).to_string()).await;
    assert_eq!(payload["ok"], true);

    // Same user, zero attempts: the gate alone must allow the reveal.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/tutor")
                .header("content-type", "application/json")
                .header("x-user", "family-1")
                .header("x-role", "kid")
                .body(Body::from(
                    json!({ "userText": "daj hotové", "policy": { "attempts": 0 } }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let payload: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(payload["response_type"], "reveal");
    assert!(payload.get("need_gate").is_none());
}

#[tokio::test]
async fn test_gate_is_per_user() {
    let app = common::create_test_app().await;

    let (_, payload) = verify_pin(&app, "parent-a", json!({ "pin": "1234" }).to_string()).await;
    assert_eq!(payload["ok"], true);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/tutor")
                .header("content-type", "application/json")
                .header("x-user", "someone-else")
                .header("x-role", "kid")
                .body(Body::from(json!({ "userText": "daj hotové" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let payload: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(payload["response_type"], "hint");
    assert_eq!(payload["need_gate"], true);
}

#[tokio::test]
async fn test_too_short_pin_is_rejected_softly() {
    let app = common::create_test_app().await;

    let (status, payload) = verify_pin(&app, "parent-2", json!({ "pin": "12" }).to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["ok"], false);
}

#[tokio::test]
async fn test_malformed_body_is_rejected_softly() {
    let app = common::create_test_app().await;

    let (status, payload) = verify_pin(&app, "parent-3", "{broken".to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["ok"], false);
}

#[tokio::test]
async fn test_wrong_pin_without_configured_hash_is_500() {
    let app = common::create_test_app().await;

    // No PARENT_PIN_HASH in the test config: anything but the dev PIN is a
    // configuration error, not a bad credential.
    let (status, _) = verify_pin(&app, "parent-4", json!({ "pin": "9999" }).to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
