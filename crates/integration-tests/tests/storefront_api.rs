//! Storefront router tests that need no database.

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use amazon_clone_integration_tests::{json_request, send, storefront_app};

#[tokio::test]
async fn test_health() {
    let response = storefront_app()
        .oneshot(json_request("GET", "/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_register_reports_every_invalid_field() {
    let body = json!({
        "name": "",
        "number": "12345",
        "email": "not-an-email",
        "password": "abc",
        "confirmPassword": "",
    });
    let (status, body) = send(
        storefront_app(),
        json_request("POST", "/api/register", Some(&body)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], false);
    let messages: Vec<&str> = body["message"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["msg"].as_str().unwrap())
        .collect();
    assert!(messages.contains(&"Name can't be empty"));
    assert!(messages.contains(&"Number must consist of 10 digits"));
    assert!(messages.contains(&"Email format is invalid"));
    assert!(messages.contains(&"Confirm Password can't be empty"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/register")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, body) = send(storefront_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], false);
}

#[tokio::test]
async fn test_login_validation() {
    let (status, body) = send(
        storefront_app(),
        json_request("POST", "/api/login", Some(&json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"][0]["msg"], "Email can't be empty");
    assert_eq!(body["message"][1]["msg"], "Password can't be empty");
}

#[tokio::test]
async fn test_login_rate_limit_answers_json_429() {
    let app = storefront_app();
    let mut last = None;
    for _ in 0..6 {
        last = Some(
            send(
                app.clone(),
                json_request("POST", "/api/login", Some(&json!({}))),
            )
            .await,
        );
    }
    let (status, body) = last.unwrap();
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["status"], false);
    assert_eq!(
        body["message"],
        "Too many login attempts. Please try again after 15 minutes."
    );
}

#[tokio::test]
async fn test_session_routes_require_token() {
    for (method, uri) in [
        ("GET", "/api/logout"),
        ("GET", "/api/getAuthUser"),
        ("POST", "/api/addtocart/3"),
        ("DELETE", "/api/delete/3"),
        ("POST", "/api/create-order"),
        ("POST", "/api/place-order-cod"),
    ] {
        let (status, body) = send(storefront_app(), json_request(method, uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["message"], "No token provided", "{method} {uri}");
    }
}

#[tokio::test]
async fn test_forged_session_cookie_is_rejected() {
    let mut request = json_request("GET", "/api/getAuthUser", None);
    request
        .headers_mut()
        .insert("cookie", "AmazonClone=not.a.jwt".parse().unwrap());
    let (status, body) = send(storefront_app(), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token is invalid or logged out");
}
