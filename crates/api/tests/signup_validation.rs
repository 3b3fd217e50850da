//! Public signup input validation fails fast, before any event lookup.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn post_signup(body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let app = common::build_test_app();

    let response = app
        .oneshot(
            Request::post("/api/v1/events/1/signups")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn blank_names_are_rejected() {
    let (status, json) = post_signup(serde_json::json!({
        "firstName": "  ",
        "lastName": "Soto",
        "email": "jamie@example.com"
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn malformed_email_is_rejected() {
    let (status, json) = post_signup(serde_json::json!({
        "firstName": "Jamie",
        "lastName": "Soto",
        "email": "not-an-email"
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}
