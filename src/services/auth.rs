// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! E-mail/password accounts and sign-in.
//!
//! Handles:
//! - Form validation before anything reaches the store
//! - PBKDF2 password hashing and verification
//! - Opening and closing sessions, and issuing their JWTs

use crate::db::{new_document_id, Db};
use crate::error::AppError;
use crate::middleware::auth::create_jwt;
use crate::models::{Account, Profile, TransportMode};
use crate::services::sessions::{Session, SessionRegistry};
use crate::time_utils::now_rfc3339;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::digest::SHA256_OUTPUT_LEN;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use validator::Validate;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LEN: u64 = 8;

static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

const PBKDF2_ITERATIONS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(n) => n,
    None => panic!("iteration count must be non-zero"),
};

const SALT_LEN: usize = 16;

/// Sign-up form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Veuillez entrer une adresse email valide."))]
    pub email: String,
    #[validate(length(
        min = 8,
        message = "Le mot de passe doit contenir au moins 8 caractères."
    ))]
    pub password: String,
    #[validate(must_match(
        other = "password",
        message = "Les mots de passe ne correspondent pas."
    ))]
    pub confirm_password: String,
}

/// Sign-in form.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A freshly opened session and the token that identifies it.
pub struct SignedIn {
    pub session: Arc<Session>,
    pub token: String,
}

/// Trim and lowercase an e-mail so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> Result<(String, String), AppError> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;

    let mut hash = [0u8; SHA256_OUTPUT_LEN];
    pbkdf2::derive(
        PBKDF2_ALG,
        PBKDF2_ITERATIONS,
        &salt,
        password.as_bytes(),
        &mut hash,
    );

    Ok((STANDARD.encode(salt), STANDARD.encode(hash)))
}

fn verify_password(account: &Account, password: &str) -> bool {
    let (Ok(salt), Ok(hash)) = (
        STANDARD.decode(&account.password_salt),
        STANDARD.decode(&account.password_hash),
    ) else {
        tracing::warn!(user_id = %account.user_id, "Stored credentials are not valid base64");
        return false;
    };

    pbkdf2::verify(
        PBKDF2_ALG,
        PBKDF2_ITERATIONS,
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok()
}

/// Account and session management.
#[derive(Clone)]
pub struct AuthService {
    db: Db,
    sessions: SessionRegistry,
}

impl AuthService {
    pub fn new(db: Db, sessions: SessionRegistry) -> Self {
        Self { db, sessions }
    }

    /// Create an account and its profile, then sign the new user in.
    pub async fn sign_up(
        &self,
        request: RegisterRequest,
        signing_key: &[u8],
    ) -> Result<SignedIn, AppError> {
        let request = RegisterRequest {
            email: normalize_email(&request.email),
            ..request
        };
        request.validate()?;

        let (password_salt, password_hash) = hash_password(&request.password)?;
        let account = Account {
            user_id: new_document_id()?,
            email: request.email.clone(),
            password_salt,
            password_hash,
            created_at: now_rfc3339(),
        };
        self.db.insert_account(&account).await?;

        let profile = Profile {
            id: account.user_id.clone(),
            email: Some(account.email.clone()),
            username: None,
            preferred_transport_mode: TransportMode::default(),
            created_at: account.created_at.clone(),
        };
        self.db.upsert_profile(&profile).await?;

        tracing::info!(user_id = %account.user_id, "Account created");
        self.open_session(&account, signing_key).await
    }

    /// Check credentials and open a session.
    ///
    /// Unknown e-mails and wrong passwords are reported the same way.
    pub async fn sign_in(
        &self,
        request: LoginRequest,
        signing_key: &[u8],
    ) -> Result<SignedIn, AppError> {
        let email = normalize_email(&request.email);
        if email.is_empty() || request.password.is_empty() {
            return Err(AppError::Validation(
                "E-mail and password are required".to_string(),
            ));
        }

        let account = self.db.get_account(&email).await?;
        let Some(account) = account.filter(|a| verify_password(a, &request.password)) else {
            tracing::info!("Sign-in rejected");
            return Err(AppError::Unauthorized);
        };

        self.open_session(&account, signing_key).await
    }

    /// Close a session. Closing an unknown session is not an error.
    pub fn sign_out(&self, session_id: &str) {
        if self.sessions.close(session_id).is_none() {
            tracing::debug!(session_id, "Sign-out for a session that was not open");
        }
    }

    /// The open session with this ID, if any.
    pub fn session(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.get(session_id)
    }

    async fn open_session(
        &self,
        account: &Account,
        signing_key: &[u8],
    ) -> Result<SignedIn, AppError> {
        let session = self.sessions.open(&account.user_id, &account.email).await?;

        let token = match create_jwt(
            &session.user_id,
            &session.id,
            session.expires_at,
            signing_key,
        ) {
            Ok(token) => token,
            Err(e) => {
                self.sessions.close(&session.id);
                return Err(AppError::Internal(anyhow::anyhow!(
                    "JWT creation failed: {}",
                    e
                )));
            }
        };

        Ok(SignedIn { session, token })
    }
}
