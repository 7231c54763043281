//! API Integration Tests
//!
//! Every test drives the full router over in-memory stores.

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use lingua_api::create_router_for_testing;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Helper to create a test request
fn create_json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn cookie_request(uri: &str, secret: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, format!("refreshToken={secret}"))
        .body(Body::empty())
        .unwrap()
}

fn bearer_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, headers, json)
}

fn set_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string())
}

/// Raw refresh secret from a `Set-Cookie` header
fn refresh_secret(headers: &HeaderMap) -> String {
    let cookie = set_cookie(headers).expect("Set-Cookie header");
    cookie
        .strip_prefix("refreshToken=")
        .and_then(|rest| rest.split(';').next())
        .expect("refreshToken cookie")
        .to_string()
}

async fn register(app: &Router, email: &str, role: Option<&str>) -> (StatusCode, HeaderMap, Value) {
    let mut body = json!({
        "name": "Alice",
        "email": email,
        "password": "pw12345678",
    });
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    send(app, create_json_request("POST", "/api/auth/register", Some(body))).await
}

async fn login(
    app: &Router,
    email: &str,
    password: &str,
    remember_me: bool,
) -> (StatusCode, HeaderMap, Value) {
    send(
        app,
        create_json_request(
            "POST",
            "/api/auth/login",
            Some(json!({
                "email": email,
                "password": password,
                "rememberMe": remember_me,
            })),
        ),
    )
    .await
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_router_for_testing();

    let (status, _, json) = send(
        &app,
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_garbage_bearer_token_does_not_block_public_routes() {
    let app = create_router_for_testing();

    let (status, _, json) = send(&app, bearer_request("/health", "definitely.not.a-jwt")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

// =============================================================================
// Registration Tests
// =============================================================================

#[tokio::test]
async fn test_register_sets_cookie_and_downgrades_role() {
    let app = create_router_for_testing();

    let (status, headers, json) = register(&app, "alice@example.com", Some("ADMIN")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["role"], "STUDENT");
    assert_eq!(json["email"], "alice@example.com");
    assert_eq!(json["name"], "Alice");
    assert!(json["accessToken"].is_string());
    assert!(json["userId"].is_string());
    assert!(json.get("refreshToken").is_none());

    let cookie = set_cookie(&headers).unwrap();
    assert!(cookie.starts_with("refreshToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=604800"));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = create_router_for_testing();
    register(&app, "alice@example.com", None).await;

    let (status, headers, json) = register(&app, "alice@example.com", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(set_cookie(&headers).is_none());
    assert_eq!(json["message"], "This email already exists!");
}

#[tokio::test]
async fn test_register_validation_failure() {
    let app = create_router_for_testing();

    let (status, _, json) = send(
        &app,
        create_json_request(
            "POST",
            "/api/auth/register",
            Some(json!({
                "name": "",
                "email": "not-an-email",
                "password": "short",
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    let details = json["details"].as_str().unwrap();
    assert!(details.contains("email"));
    assert!(details.contains("password"));
}

#[tokio::test]
async fn test_missing_field_is_validation_error() {
    let app = create_router_for_testing();

    let (status, headers, json) = send(
        &app,
        create_json_request(
            "POST",
            "/api/auth/register",
            Some(json!({
                "email": "a@example.com",
                "password": "pw12345678",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(set_cookie(&headers).is_none());
    assert!(!json.to_string().contains("deserialize"));

    let (status, _, json) = send(
        &app,
        create_json_request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "a@example.com" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_json_is_validation_error() {
    let app = create_router_for_testing();

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("Content-Type", "application/json")
        .body(Body::from("{\"email\":"))
        .unwrap();
    let (status, _, json) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

// =============================================================================
// Login Tests
// =============================================================================

#[tokio::test]
async fn test_login_wrong_password_or_unknown_email() {
    let app = create_router_for_testing();
    register(&app, "alice@example.com", None).await;

    let (status, headers, wrong_password) =
        login(&app, "alice@example.com", "wrong-password", false).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&headers).is_none());

    let (status, _, unknown_email) = login(&app, "bob@example.com", "pw12345678", false).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password["message"], "Invalid email and/or password!");
}

#[tokio::test]
async fn test_login_cookie_lifetime_follows_remember_me() {
    let app = create_router_for_testing();
    register(&app, "alice@example.com", None).await;

    let (status, headers, _) = login(&app, "alice@example.com", "pw12345678", true).await;
    assert_eq!(status, StatusCode::OK);
    assert!(set_cookie(&headers).unwrap().contains("Max-Age=604800"));

    let (status, headers, _) = login(&app, "alice@example.com", "pw12345678", false).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!set_cookie(&headers).unwrap().contains("Max-Age"));
}

#[tokio::test]
async fn test_second_login_invalidates_first_session() {
    let app = create_router_for_testing();
    register(&app, "alice@example.com", None).await;

    let (_, first_headers, _) = login(&app, "alice@example.com", "pw12345678", false).await;
    let (_, second_headers, _) = login(&app, "alice@example.com", "pw12345678", false).await;

    let (status, _, _) = send(
        &app,
        cookie_request("/api/auth/refresh", &refresh_secret(&first_headers)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &app,
        cookie_request("/api/auth/refresh", &refresh_secret(&second_headers)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Refresh / Logout Tests
// =============================================================================

#[tokio::test]
async fn test_refresh_issues_distinct_access_token() {
    let app = create_router_for_testing();
    let (_, headers, registered) = register(&app, "alice@example.com", None).await;

    let (status, refresh_headers, refreshed) = send(
        &app,
        cookie_request("/api/auth/refresh", &refresh_secret(&headers)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["userId"], registered["userId"]);
    assert_ne!(refreshed["accessToken"], registered["accessToken"]);
    assert!(set_cookie(&refresh_headers).is_none());
}

#[tokio::test]
async fn test_refresh_without_cookie() {
    let app = create_router_for_testing();

    let (status, _, json) = send(&app, create_json_request("POST", "/api/auth/refresh", None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Missing refresh token, please login again.");
}

#[tokio::test]
async fn test_logout_then_refresh_fails() {
    let app = create_router_for_testing();
    let (_, headers, _) = register(&app, "alice@example.com", None).await;
    let secret = refresh_secret(&headers);

    let (status, logout_headers, _) = send(&app, cookie_request("/api/auth/logout", &secret)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(set_cookie(&logout_headers).unwrap().contains("Max-Age=0"));

    let (status, _, json) = send(&app, cookie_request("/api/auth/refresh", &secret)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid session, please log in again.");

    // Logging out again, or without any cookie, still succeeds
    let (status, _, _) = send(&app, cookie_request("/api/auth/logout", &secret)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&app, create_json_request("POST", "/api/auth/logout", None)).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Principal Tests
// =============================================================================

#[tokio::test]
async fn test_me_requires_authentication() {
    let app = create_router_for_testing();

    let (status, _, json) = send(
        &app,
        Request::builder()
            .uri("/api/auth/me")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_me_returns_principal() {
    let app = create_router_for_testing();
    let (_, _, registered) = register(&app, "alice@example.com", None).await;
    let token = registered["accessToken"].as_str().unwrap();

    let (status, _, json) = send(&app, bearer_request("/api/auth/me", token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["email"], "alice@example.com");
    assert_eq!(json["role"], "STUDENT");
    assert_eq!(json["userId"], registered["userId"]);
}

#[tokio::test]
async fn test_me_with_tampered_token_is_anonymous() {
    let app = create_router_for_testing();
    let (_, _, registered) = register(&app, "alice@example.com", None).await;
    let mut token = registered["accessToken"].as_str().unwrap().to_string();
    let last = token.pop().unwrap();
    token.push(if last == 'A' { 'B' } else { 'A' });

    let (status, _, _) = send(&app, bearer_request("/api/auth/me", &token)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
