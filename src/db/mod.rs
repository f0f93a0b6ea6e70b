// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: the remote tabular store.
//!
//! Production uses Firestore; [`MemoryDb`] keeps the same tables in process
//! for local development and tests. Both are reached through [`Db`].

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Account, FavoriteRow, Profile};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};

/// Collection names as constants.
pub mod collections {
    /// One document per (user, facility, optional parking link)
    pub const FAVORITE_SPOTS: &str = "favorite_spots";
    pub const PROFILES: &str = "profiles";
    /// Credentials, keyed by URL-encoded e-mail
    pub const ACCOUNTS: &str = "accounts";
}

/// Equality filter for deleting favorite rows.
#[derive(Debug, Clone, Copy)]
pub struct FavoriteFilter<'a> {
    pub user_id: &'a str,
    pub sport_facility_id: &'a str,
    /// When set, only rows linking this parking match.
    pub preferred_parking_id: Option<&'a str>,
}

impl FavoriteFilter<'_> {
    pub fn matches(&self, row: &FavoriteRow) -> bool {
        row.user_id == self.user_id
            && row.sport_facility_id == self.sport_facility_id
            && self
                .preferred_parking_id
                .map_or(true, |p| row.preferred_parking_id.as_deref() == Some(p))
    }
}

/// Generate a random document ID (96 bits, URL-safe base64).
pub fn new_document_id() -> Result<String, AppError> {
    let mut bytes = [0u8; 12];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// The store backing favorites, profiles and accounts.
#[derive(Clone)]
pub enum Db {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl Db {
    // ─── Favorite Rows ───────────────────────────────────────────

    /// All favorite rows of a user, oldest first.
    pub async fn get_favorite_rows(&self, user_id: &str) -> Result<Vec<FavoriteRow>, AppError> {
        match self {
            Db::Firestore(db) => db.get_favorite_rows(user_id).await,
            Db::Memory(db) => db.get_favorite_rows(user_id).await,
        }
    }

    pub async fn insert_favorite_row(&self, row: &FavoriteRow) -> Result<(), AppError> {
        match self {
            Db::Firestore(db) => db.insert_favorite_row(row).await,
            Db::Memory(db) => db.insert_favorite_row(row).await,
        }
    }

    /// Delete every row matching the filter. Returns the number deleted.
    pub async fn delete_favorite_rows(
        &self,
        filter: FavoriteFilter<'_>,
    ) -> Result<usize, AppError> {
        match self {
            Db::Firestore(db) => db.delete_favorite_rows(filter).await,
            Db::Memory(db) => db.delete_favorite_rows(filter).await,
        }
    }

    // ─── Profiles ────────────────────────────────────────────────

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        match self {
            Db::Firestore(db) => db.get_profile(user_id).await,
            Db::Memory(db) => db.get_profile(user_id).await,
        }
    }

    pub async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        match self {
            Db::Firestore(db) => db.upsert_profile(profile).await,
            Db::Memory(db) => db.upsert_profile(profile).await,
        }
    }

    // ─── Accounts ────────────────────────────────────────────────

    pub async fn get_account(&self, email: &str) -> Result<Option<Account>, AppError> {
        match self {
            Db::Firestore(db) => db.get_account(email).await,
            Db::Memory(db) => db.get_account(email).await,
        }
    }

    /// Create an account. Fails with `Conflict` if the e-mail is taken.
    pub async fn insert_account(&self, account: &Account) -> Result<(), AppError> {
        match self {
            Db::Firestore(db) => db.insert_account(account).await,
            Db::Memory(db) => db.insert_account(account).await,
        }
    }
}

impl From<FirestoreDb> for Db {
    fn from(db: FirestoreDb) -> Self {
        Db::Firestore(db)
    }
}

impl From<MemoryDb> for Db {
    fn from(db: MemoryDb) -> Self {
        Db::Memory(db)
    }
}
