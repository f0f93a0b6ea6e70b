// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and profile models for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Credentials record stored in the `accounts` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Opaque user ID (also the profile document ID)
    pub user_id: String,
    /// Normalised (trimmed, lowercase) e-mail; also the document ID
    pub email: String,
    /// PBKDF2 salt (base64)
    pub password_salt: String,
    /// PBKDF2-HMAC-SHA256 hash (base64)
    pub password_hash: String,
    /// When the account was created (RFC3339)
    pub created_at: String,
}

/// How the user prefers to travel to a facility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Bike,
    Car,
    #[default]
    Walk,
}

/// User profile stored in the `profiles` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct Profile {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub preferred_transport_mode: TransportMode,
    pub created_at: String,
}
