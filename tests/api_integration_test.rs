//! REST API integration tests for Petfolio.
//!
//! These tests drive the real router (auth middleware included) against an
//! in-memory SQLite database.

mod common;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use petfolio::auth::{AuthService, AuthState, TokenCodec};
use petfolio::infra::{ListingCache, SqliteCredentialStore, SqlitePetStore};
use petfolio::server::{build_router, seed_initial_data, AppState};

use common::*;

// ============================================================================
// Test Helpers
// ============================================================================

/// Create full application state over a fresh in-memory database.
async fn create_test_state() -> AppState {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    petfolio::migrations::run(&pool).await.unwrap();

    let credentials = Arc::new(SqliteCredentialStore::new(pool.clone()));
    seed_initial_data(credentials.as_ref(), ADMIN_PASSWORD)
        .await
        .unwrap();

    let codec = Arc::new(TokenCodec::new(TEST_JWT_SECRET));
    AppState {
        auth: Arc::new(AuthService::new(credentials.clone(), codec)),
        credentials,
        pets: Arc::new(SqlitePetStore::new(pool.clone())),
        pet_listings: Arc::new(ListingCache::new(256, StdDuration::from_secs(30))),
        user_listings: Arc::new(ListingCache::new(16, StdDuration::from_secs(30))),
        pool,
    }
}

/// Create a test router over the given state.
fn create_test_router(state: AppState) -> axum::Router {
    let auth_state = AuthState {
        codec: Arc::new(TokenCodec::new(TEST_JWT_SECRET)),
    };
    build_router(auth_state).unwrap().with_state(state)
}

async fn create_test_app() -> axum::Router {
    create_test_router(create_test_state().await)
}

/// Send a request to the test router.
async fn send_request(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let body = body
        .map(|v| Body::from(serde_json::to_vec(&v).unwrap()))
        .unwrap_or_else(|| Body::from(Vec::new()));

    let response = app
        .clone()
        .into_service::<Body>()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec();

    let json = if bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| json!({ "raw": String::from_utf8_lossy(&bytes) }))
    };

    (status, json)
}

/// Register an account and return its token.
async fn register(app: &axum::Router, username: &str) -> String {
    let (status, body) = send_request(
        app,
        Method::POST,
        "/auth/register",
        Some(credentials_payload(username, TEST_PASSWORD)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

/// Log in and return the token.
async fn login(app: &axum::Router, username: &str, password: &str) -> String {
    let (status, body) = send_request(
        app,
        Method::POST,
        "/auth/login",
        Some(credentials_payload(username, password)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

/// Create a pet and return its id.
async fn create_pet(app: &axum::Router, token: &str, name: &str) -> i64 {
    let (status, body) = send_request(
        app,
        Method::POST,
        "/pets",
        Some(pet_payload(name, "dog", 3)),
        Some(token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create pet failed: {body}");
    body["id"].as_i64().unwrap()
}

// ============================================================================
// Health & Public Endpoints
// ============================================================================

#[tokio::test]
async fn test_health_and_ready_without_auth() {
    let app = create_test_app().await;

    let (status, body) = send_request(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send_request(&app, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");
}

// ============================================================================
// Registration & Login
// ============================================================================

#[tokio::test]
async fn test_register_assigns_default_role() {
    let app = create_test_app().await;

    let (status, body) = send_request(
        &app,
        Method::POST,
        "/auth/register",
        Some(credentials_payload("alice", TEST_PASSWORD)),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["roles"], json!(["ROLE_USER"]));

    // The token is verifiable and carries the same identity
    let codec = TokenCodec::new(TEST_JWT_SECRET);
    let claims = codec
        .verify(body["token"].as_str().unwrap(), Utc::now())
        .unwrap();
    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.roles, vec!["ROLE_USER".to_string()]);
}

#[tokio::test]
async fn test_register_duplicate_username_conflict() {
    let app = create_test_app().await;
    register(&app, "alice").await;

    let (status, body) = send_request(
        &app,
        Method::POST,
        "/auth/register",
        Some(credentials_payload("alice", "another-password")),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "USERNAME_TAKEN");

    // The original credentials still work
    login(&app, "alice", TEST_PASSWORD).await;
}

#[tokio::test]
async fn test_register_blank_fields_rejected() {
    let app = create_test_app().await;

    let (status, body) = send_request(
        &app,
        Method::POST,
        "/auth/register",
        Some(credentials_payload("  ", TEST_PASSWORD)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_FIELD_VALUE");

    let (status, _) = send_request(
        &app,
        Method::POST,
        "/auth/register",
        Some(credentials_payload("alice", "")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_failure_modes_are_identical() {
    let app = create_test_app().await;
    register(&app, "alice").await;

    let (unknown_status, unknown_body) = send_request(
        &app,
        Method::POST,
        "/auth/login",
        Some(credentials_payload("ghost", "whatever")),
        None,
    )
    .await;

    let (wrong_status, wrong_body) = send_request(
        &app,
        Method::POST,
        "/auth/login",
        Some(credentials_payload("alice", "wrong-password")),
        None,
    )
    .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    // Whole response bodies must be indistinguishable
    assert_eq!(unknown_body, wrong_body);
    assert_eq!(unknown_body["error"]["code"], "INVALID_CREDENTIALS");
    assert_eq!(
        unknown_body["error"]["message"],
        "Invalid username or password"
    );
}

#[tokio::test]
async fn test_seeded_admin_can_login() {
    let app = create_test_app().await;

    let (status, body) = send_request(
        &app,
        Method::POST,
        "/auth/login",
        Some(credentials_payload(ADMIN_USERNAME, ADMIN_PASSWORD)),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let roles: Vec<&str> = body["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_str().unwrap())
        .collect();
    assert!(roles.contains(&"ROLE_ADMIN"));
    assert!(roles.contains(&"ROLE_USER"));
}

// ============================================================================
// Token Enforcement
// ============================================================================

#[tokio::test]
async fn test_missing_token_unauthorized() {
    let app = create_test_app().await;

    let (status, body) = send_request(&app, Method::GET, "/pets", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_malformed_token_unauthorized() {
    let app = create_test_app().await;

    let (status, body) =
        send_request(&app, Method::GET, "/pets", None, Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_tampered_token_unauthorized() {
    let app = create_test_app().await;
    let token = register(&app, "alice").await;

    let parts: Vec<&str> = token.split('.').collect();
    let sig = parts[2];
    let flipped = if sig.starts_with('A') { "B" } else { "A" };
    let tampered = format!("{}.{}.{}{}", parts[0], parts[1], flipped, &sig[1..]);

    let (status, body) = send_request(&app, Method::GET, "/pets", None, Some(&tampered)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_expired_token_unauthorized() {
    let app = create_test_app().await;
    register(&app, "alice").await;

    // Same secret, zero lifetime: expired the moment it is issued
    let codec = TokenCodec::with_ttl(TEST_JWT_SECRET, Duration::seconds(0));
    let token = codec
        .issue("alice", &["ROLE_USER".to_string()], Utc::now())
        .unwrap();

    let (status, body) = send_request(&app, Method::GET, "/pets", None, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "TOKEN_EXPIRED");
}

// ============================================================================
// Pet CRUD & Ownership
// ============================================================================

#[tokio::test]
async fn test_pet_lifecycle_with_ownership() {
    let app = create_test_app().await;
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let pet_id = create_pet(&app, &alice, "Rex").await;

    // Owner sees the pet; another user does not
    let (status, body) = send_request(&app, Method::GET, "/pets", None, Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Rex");
    assert_eq!(body[0]["owner_username"], "alice");

    let (status, body) = send_request(&app, Method::GET, "/pets", None, Some(&bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    // A non-owner may not modify or delete
    let uri = format!("/pets/{pet_id}");
    let (status, body) = send_request(
        &app,
        Method::PUT,
        &uri,
        Some(pet_payload("Stolen", "dog", 3)),
        Some(&bob),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "OWNERSHIP_REQUIRED");

    let (status, _) = send_request(&app, Method::DELETE, &uri, None, Some(&bob)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An admin may update anyone's pet
    let (status, body) = send_request(
        &app,
        Method::PUT,
        &uri,
        Some(pet_payload("Rexy", "dog", 4)),
        Some(&admin),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Rexy");
    assert_eq!(body["owner_username"], "alice");

    // Cached listings were invalidated by the write
    let (status, body) = send_request(&app, Method::GET, "/pets", None, Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Rexy");

    // The owner deletes their pet
    let (status, _) = send_request(&app, Method::DELETE, &uri, None, Some(&alice)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send_request(&app, Method::GET, "/pets/all", None, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_all_pets_is_admin_only() {
    let app = create_test_app().await;
    let alice = register(&app, "alice").await;
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    create_pet(&app, &alice, "Rex").await;

    let (status, body) = send_request(&app, Method::GET, "/pets/all", None, Some(&alice)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_ROLE");

    let (status, body) = send_request(&app, Method::GET, "/pets/all", None, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_sees_all_pets_in_own_listing() {
    let app = create_test_app().await;
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    create_pet(&app, &alice, "Rex").await;
    create_pet(&app, &bob, "Whiskers").await;

    let (status, body) = send_request(&app, Method::GET, "/pets", None, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_unknown_pet_not_found() {
    let app = create_test_app().await;
    let alice = register(&app, "alice").await;

    let (status, body) = send_request(
        &app,
        Method::PUT,
        "/pets/9999",
        Some(pet_payload("Ghost", "cat", 1)),
        Some(&alice),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "PET_NOT_FOUND");
}

#[tokio::test]
async fn test_pet_validation() {
    let app = create_test_app().await;
    let alice = register(&app, "alice").await;

    let (status, body) = send_request(
        &app,
        Method::POST,
        "/pets",
        Some(pet_payload("", "dog", 3)),
        Some(&alice),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_FIELD_VALUE");

    let (status, _) = send_request(
        &app,
        Method::POST,
        "/pets",
        Some(pet_payload("Rex", "dog", -1)),
        Some(&alice),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// User Endpoints
// ============================================================================

#[tokio::test]
async fn test_list_users_is_admin_only() {
    let app = create_test_app().await;
    let alice = register(&app, "alice").await;
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let (status, body) = send_request(&app, Method::GET, "/users/all", None, Some(&alice)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_ROLE");

    let (status, body) = send_request(&app, Method::GET, "/users/all", None, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let usernames: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert!(usernames.contains(&"admin"));
    assert!(usernames.contains(&"alice"));
}

#[tokio::test]
async fn test_get_user_self_or_admin() {
    let app = create_test_app().await;
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let (status, body) = send_request(&app, Method::GET, "/users/alice", None, Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["roles"], json!(["ROLE_USER"]));
    assert!(body.get("password_hash").is_none());

    let (status, body) = send_request(&app, Method::GET, "/users/alice", None, Some(&bob)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "OWNERSHIP_REQUIRED");

    let (status, _) = send_request(&app, Method::GET, "/users/alice", None, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_request(&app, Method::GET, "/users/ghost", None, Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "USER_NOT_FOUND");
}
