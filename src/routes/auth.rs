// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! E-mail/password authentication routes.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{decode_jwt, token_from_request, AuthUser, SESSION_COOKIE};
use crate::services::auth::{LoginRequest, RegisterRequest, SignedIn};
use crate::AppState;

/// Routes reachable without a session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Routes that need a session (auth middleware applied by the caller).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/session", get(current_session))
}

/// Session details returned after sign-in.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct SessionResponse {
    pub user_id: String,
    pub email: String,
    /// Only present right after sign-in; also set as an HttpOnly cookie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

fn signed_in_response(jar: CookieJar, signed_in: SignedIn) -> (CookieJar, Json<SessionResponse>) {
    let jar = jar.add(session_cookie(signed_in.token.clone()));
    (
        jar,
        Json(SessionResponse {
            user_id: signed_in.session.user_id.clone(),
            email: signed_in.session.email.clone(),
            token: Some(signed_in.token),
        }),
    )
}

/// Create an account and sign in.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>)> {
    let signed_in = state
        .auth_service
        .sign_up(request, &state.config.jwt_signing_key)
        .await?;

    let (jar, body) = signed_in_response(jar, signed_in);
    Ok((StatusCode::CREATED, jar, body))
}

/// Sign in with e-mail and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let signed_in = state
        .auth_service
        .sign_in(request, &state.config.jwt_signing_key)
        .await?;

    Ok(signed_in_response(jar, signed_in))
}

/// Close the session named by the token, if any, and clear the cookie.
///
/// Always succeeds: signing out twice, or without a session, is harmless.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> (StatusCode, CookieJar) {
    if let Some(claims) = token_from_request(&jar, &headers)
        .and_then(|token| decode_jwt(&token, &state.config.jwt_signing_key))
    {
        state.auth_service.sign_out(&claims.sid);
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (StatusCode::NO_CONTENT, jar)
}

/// The signed-in user.
async fn current_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SessionResponse>> {
    let session = state
        .auth_service
        .session(&user.session_id)
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(SessionResponse {
        user_id: session.user_id.clone(),
        email: session.email.clone(),
        token: None,
    }))
}
