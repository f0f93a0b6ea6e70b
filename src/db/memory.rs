// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process tables with the same semantics as the Firestore backend.

use crate::db::FavoriteFilter;
use crate::error::AppError;
use crate::models::{Account, FavoriteRow, Profile};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    favorite_spots: Vec<FavoriteRow>,
    profiles: HashMap<String, Profile>,
    /// Keyed by normalised e-mail
    accounts: HashMap<String, Account>,
}

/// In-memory store.
///
/// Clones share the same tables. [`MemoryDb::set_offline`] makes every
/// operation fail the way an unreachable remote store would.
#[derive(Clone, Default)]
pub struct MemoryDb {
    tables: Arc<Mutex<Tables>>,
    offline: Arc<AtomicBool>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) the connection to the store.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Database(
                "Database not connected (offline mode)".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn get_favorite_rows(&self, user_id: &str) -> Result<Vec<FavoriteRow>, AppError> {
        self.check_online()?;
        let tables = self.tables.lock().await;

        // Stable sort keeps insertion order for equal timestamps.
        let mut rows: Vec<FavoriteRow> = tables
            .favorite_spots
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    pub async fn insert_favorite_row(&self, row: &FavoriteRow) -> Result<(), AppError> {
        self.check_online()?;
        self.tables.lock().await.favorite_spots.push(row.clone());
        Ok(())
    }

    pub async fn delete_favorite_rows(
        &self,
        filter: FavoriteFilter<'_>,
    ) -> Result<usize, AppError> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;

        let before = tables.favorite_spots.len();
        tables.favorite_spots.retain(|row| !filter.matches(row));
        Ok(before - tables.favorite_spots.len())
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        self.check_online()?;
        Ok(self.tables.lock().await.profiles.get(user_id).cloned())
    }

    pub async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        self.check_online()?;
        self.tables
            .lock()
            .await
            .profiles
            .insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    pub async fn get_account(&self, email: &str) -> Result<Option<Account>, AppError> {
        self.check_online()?;
        Ok(self.tables.lock().await.accounts.get(email).cloned())
    }

    pub async fn insert_account(&self, account: &Account) -> Result<(), AppError> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;

        if tables.accounts.contains_key(&account.email) {
            return Err(AppError::Conflict(format!(
                "An account already exists for {}",
                account.email
            )));
        }
        tables
            .accounts
            .insert(account.email.clone(), account.clone());
        Ok(())
    }
}
