// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Favorite spots (one document per facility/parking link)
//! - Profiles (onboarding data)
//! - Accounts (hashed credentials)

use crate::db::{collections, FavoriteFilter};
use crate::error::AppError;
use crate::models::{Account, FavoriteRow, Profile};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. All database operations return an error.
    pub fn new_offline() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Favorite Spot Operations ────────────────────────────────

    /// Get all favorite rows for a user, oldest first.
    pub async fn get_favorite_rows(&self, user_id: &str) -> Result<Vec<FavoriteRow>, AppError> {
        let user_id = user_id.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::FAVORITE_SPOTS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a favorite row under its own document ID.
    pub async fn insert_favorite_row(&self, row: &FavoriteRow) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::FAVORITE_SPOTS)
            .document_id(&row.id)
            .object(row)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete every favorite row matching the filter.
    ///
    /// Firestore has no delete-by-query, so matching rows are read first
    /// and removed in batched transactions.
    pub async fn delete_favorite_rows(
        &self,
        filter: FavoriteFilter<'_>,
    ) -> Result<usize, AppError> {
        let user_id = filter.user_id.to_string();
        let facility_id = filter.sport_facility_id.to_string();
        let parking_id = filter.preferred_parking_id.map(str::to_string);

        let rows: Vec<FavoriteRow> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::FAVORITE_SPOTS)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("sport_facility_id").eq(facility_id.clone()),
                    parking_id
                        .clone()
                        .and_then(|p| q.field("preferred_parking_id").eq(p)),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = rows.len();
        self.batch_delete(&rows, collections::FAVORITE_SPOTS, |row: &FavoriteRow| {
            row.id.clone()
        })
        .await?;

        tracing::debug!(
            user_id = filter.user_id,
            facility = filter.sport_facility_id,
            count,
            "Deleted favorite rows"
        );
        Ok(count)
    }

    // ─── Profile Operations ──────────────────────────────────────

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROFILES)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a profile.
    pub async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PROFILES)
            .document_id(&profile.id)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Account Operations ──────────────────────────────────────

    pub async fn get_account(&self, email: &str) -> Result<Option<Account>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACCOUNTS)
            .obj()
            .one(account_doc_id(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create an account document. Insert (not update) so a taken e-mail
    /// is never overwritten.
    pub async fn insert_account(&self, account: &Account) -> Result<(), AppError> {
        if self.get_account(&account.email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "An account already exists for {}",
                account.email
            )));
        }

        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::ACCOUNTS)
            .document_id(account_doc_id(&account.email))
            .object(account)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

/// Document ID for an account: e-mails may contain characters Firestore
/// rejects in IDs.
fn account_doc_id(email: &str) -> String {
    urlencoding::encode(email).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_doc_id_escapes_separators() {
        assert_eq!(account_doc_id("a/b@example.com"), "a%2Fb%40example.com");
    }

    #[tokio::test]
    async fn test_offline_client_reports_database_error() {
        let db = FirestoreDb::new_offline();
        let err = db.get_favorite_rows("u1").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
