// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sport_spots_token";

/// Session lifetime in seconds (30 days).
pub const SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Session ID; the token is only valid while this session is open
    pub sid: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub session_id: String,
}

/// Extract the raw token from the session cookie or the Authorization header.
pub fn token_from_request(jar: &CookieJar, headers: &header::HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Decode and verify a token's signature and expiry.
pub fn decode_jwt(token: &str, signing_key: &[u8]) -> Option<Claims> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// Middleware that requires valid JWT authentication.
///
/// No token at all is `Unauthorized`. A token that fails verification, or
/// whose session has been signed out or has expired, is `InvalidToken`.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = token_from_request(&jar, request.headers()).ok_or(AppError::Unauthorized)?;

    let claims =
        decode_jwt(&token, &state.config.jwt_signing_key).ok_or(AppError::InvalidToken)?;

    match state.sessions.get(&claims.sid) {
        Some(session) if session.user_id == claims.sub => {}
        _ => {
            tracing::debug!(session_id = %claims.sid, "Token for a closed session");
            return Err(AppError::InvalidToken);
        }
    }

    let auth_user = AuthUser {
        user_id: claims.sub,
        session_id: claims.sid,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Create a JWT for a user session, expiring with the session.
pub fn create_jwt(
    user_id: &str,
    session_id: &str,
    expires_at: i64,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    let claims = Claims {
        sub: user_id.to_string(),
        sid: session_id.to_string(),
        iat: now as usize,
        exp: usize::try_from(expires_at)?,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
