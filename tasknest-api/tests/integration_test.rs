/// Integration tests for the TaskNest API
///
/// These run without a live database: the pool is lazy, so they cover
/// the layers that decide before any query executes. Credential
/// rejection, payload validation, routing, and the error envelope all
/// happen there.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use serde_json::json;
use tower::Service as _;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_without_database() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_connection"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let ctx = TestContext::new();

    for uri in ["/api/v1/tasks", "/api/v1/categories", "/api/v1/tags", "/api/v1/users/me"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = ctx.app.clone().call(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        let json = body_json(response).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Missing credentials");
    }
}

#[tokio::test]
async fn test_non_bearer_scheme_rejected() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .uri("/api/v1/tasks")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["message"], "Expected Bearer token");
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .uri("/api/v1/tasks")
        .header("authorization", "Bearer not.a.token")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["status"], "error");
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .uri("/api/v1/tasks")
        .header("authorization", format!("Bearer {}", ctx.expired_token()))
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_token_rejected() {
    let ctx = TestContext::new();

    let mut token = ctx.token();
    token.push('x');

    let request = Request::builder()
        .uri("/api/v1/tasks")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_behind_auth_gate() {
    let ctx = TestContext::new();

    // The auth gate runs before the role check
    let request = Request::builder()
        .uri("/api/v1/users")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation() {
    let ctx = TestContext::new();

    // Bad email
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "username": "alice",
                "email": "not-an-email",
                "password": "long-enough-password",
                "confirm_password": "long-enough-password"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().contains("email"));

    // Short password
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "short",
                "confirm_password": "short"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Short username
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "username": "ab",
                "email": "alice@example.com",
                "password": "long-enough-password",
                "confirm_password": "long-enough-password"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_password_mismatch() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "long-enough-password",
                "confirm_password": "a-different-password"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().contains("match"));
}

#[tokio::test]
async fn test_login_validation() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "username": "", "password": "whatever" }).to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["status"], "error");
}

#[tokio::test]
async fn test_unknown_route() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .uri("/api/v1/projects")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
