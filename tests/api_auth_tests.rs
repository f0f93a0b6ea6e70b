// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Sign-up validates the form before touching the store
//! 2. Protected routes reject requests without a live session
//! 3. Sign-out revokes the token and drops the favorites store
//! 4. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use sport_spots::middleware::auth::create_jwt;
use sport_spots::services::AuthEvent;
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app, register, send};

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _, _) = create_test_app();

    let response = send(&app, "GET", "/api/favorites", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "unauthorized");
}

#[tokio::test]
async fn test_protected_route_with_garbage_token() {
    let (app, _, _) = create_test_app();

    let response = send(&app, "GET", "/api/favorites", Some("not.a.jwt"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "invalid_token");
}

#[tokio::test]
async fn test_signed_token_for_unknown_session_is_rejected() {
    let (app, state, _) = create_test_app();
    let expires_at = chrono::Utc::now().timestamp() + 3600;
    let token = create_jwt(
        "user-1",
        "no-such-session",
        expires_at,
        &state.config.jwt_signing_key,
    )
    .unwrap();

    let response = send(&app, "GET", "/auth/session", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "invalid_token");
}

#[tokio::test]
async fn test_register_opens_session_and_sets_cookie() {
    let (app, state, _) = create_test_app();

    let response = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "Camille@Example.com",
            "password": "password123",
            "confirm_password": "password123"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("sport_spots_token="));
    assert!(cookie.contains("HttpOnly"));

    let body = body_json(response).await;
    assert_eq!(body["email"], "camille@example.com");
    assert_eq!(state.sessions.len(), 1);

    // The cookie alone authenticates.
    let token = cookie
        .trim_start_matches("sport_spots_token=")
        .split(';')
        .next()
        .unwrap();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/session")
                .header(header::COOKIE, format!("sport_spots_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["email"], "camille@example.com");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let (app, state, db) = create_test_app();

    for (email, password, confirm) in [
        ("not-an-email", "password123", "password123"),
        ("a@example.com", "short", "short"),
        ("a@example.com", "password123", "password124"),
    ] {
        let response = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "email": email, "password": password, "confirm_password": confirm })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"], "validation_error");
    }

    assert!(state.sessions.is_empty());
    assert!(db.get_account("a@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_register_conflicts() {
    let (app, _, _) = create_test_app();
    register(&app, "dup@example.com").await;

    let response = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": "DUP@example.com",
            "password": "password123",
            "confirm_password": "password123"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let (app, _, _) = create_test_app();
    register(&app, "a@example.com").await;

    let response = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "a@example.com", "password": "password999" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let (app, state, _) = create_test_app();
    let mut events = state.sessions.subscribe();

    let token = register(&app, "a@example.com").await;
    assert!(matches!(events.recv().await.unwrap(), AuthEvent::SignedIn { .. }));

    let response = send(&app, "GET", "/api/favorites", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(matches!(events.recv().await.unwrap(), AuthEvent::SignedOut { .. }));
    assert!(state.sessions.is_empty());

    let response = send(&app, "GET", "/api/favorites", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Signing out again is harmless.
    let response = send(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_login_after_logout_sees_favorites() {
    let (app, _, _) = create_test_app();
    let token = register(&app, "a@example.com").await;

    let response = send(
        &app,
        "POST",
        "/api/favorites",
        Some(&token),
        Some(json!({ "nom": "Piscine Jean Bouin" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    send(&app, "POST", "/auth/logout", Some(&token), None).await;

    let response = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "a@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    // The new session fetched the rows on sign-in.
    let response = send(&app, "GET", "/api/favorites", Some(&token), None).await;
    let items = body_json(response).await;
    assert_eq!(items[0]["id"], "Piscine Jean Bouin");
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/favorites")
                .header(header::ORIGIN, "http://localhost:8081")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:8081"
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _, _) = create_test_app();

    let response = send(&app, "GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}
