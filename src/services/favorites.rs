// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Favorites aggregation and synchronisation.
//!
//! The remote `favorite_spots` rows are the only source of truth. A
//! [`FavoritesStore`] keeps a read-only projection of one user's rows
//! grouped by facility, and rebuilds it from scratch after every write.

use crate::db::{new_document_id, Db, FavoriteFilter};
use crate::error::AppError;
use crate::models::favorite::FavoriteFacility;
use crate::models::{
    FacilityRef, FavoriteItem, FavoriteRow, FavoriteType, GeoPoint, LinkedParking, ParkingRef,
};
use crate::time_utils::now_rfc3339;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Group flat rows into one item per facility key.
///
/// Items appear in the order their key is first seen; linked parkings in
/// row order. The first row of a facility supplies its name and position.
pub fn group_rows(rows: &[FavoriteRow]) -> Vec<FavoriteItem> {
    let mut items: Vec<FavoriteItem> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        let key = row.facility_key();

        let slot = *index.entry(key).or_insert_with(|| {
            items.push(FavoriteItem {
                id: key.to_string(),
                kind: FavoriteType::Stadium,
                data: FavoriteFacility {
                    name: row.sport_facility_name.clone(),
                    geo_point_2d: GeoPoint::new(row.sport_facility_lat, row.sport_facility_lng),
                },
                linked_parkings: Vec::new(),
            });
            items.len() - 1
        });

        if let Some(parking) = row.linked_parking() {
            items[slot].linked_parkings.push(parking);
        }
    }

    items
}

/// An immutable view of a user's favorites at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesSnapshot {
    items: Vec<FavoriteItem>,
}

impl FavoritesSnapshot {
    pub fn from_rows(rows: &[FavoriteRow]) -> Self {
        Self {
            items: group_rows(rows),
        }
    }

    pub fn items(&self) -> &[FavoriteItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&FavoriteItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Parkings linked to a facility; empty if the facility is unknown.
    pub fn linked_parkings(&self, parent_id: &str) -> &[LinkedParking] {
        self.get(parent_id)
            .map(|item| item.linked_parkings.as_slice())
            .unwrap_or(&[])
    }
}

/// One signed-in user's favorites.
///
/// Created empty when a session starts and dropped when it ends. Reads are
/// served from the last snapshot; every mutation writes to the store and
/// then refetches, returning the fresh snapshot.
///
/// Mutations and fetches of one store run one at a time under `writes`,
/// from the snapshot check to the snapshot replacement.
pub struct FavoritesStore {
    db: Db,
    user_id: String,
    snapshot: RwLock<Arc<FavoritesSnapshot>>,
    writes: Mutex<()>,
}

impl FavoritesStore {
    pub fn new(db: Db, user_id: impl Into<String>) -> Self {
        Self {
            db,
            user_id: user_id.into(),
            snapshot: RwLock::new(Arc::new(FavoritesSnapshot::default())),
            writes: Mutex::new(()),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The last fetched snapshot.
    pub async fn snapshot(&self) -> Arc<FavoritesSnapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn is_favorite(&self, id: &str) -> bool {
        self.snapshot().await.is_favorite(id)
    }

    pub async fn linked_parkings(&self, parent_id: &str) -> Vec<LinkedParking> {
        self.snapshot().await.linked_parkings(parent_id).to_vec()
    }

    /// Re-read every row of the user and replace the snapshot.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn fetch(&self) -> Result<Arc<FavoritesSnapshot>, AppError> {
        let _guard = self.writes.lock().await;
        self.refetch().await
    }

    /// [`fetch`](Self::fetch) for callers already holding `writes`.
    async fn refetch(&self) -> Result<Arc<FavoritesSnapshot>, AppError> {
        let rows = self
            .db
            .get_favorite_rows(&self.user_id)
            .await
            .inspect_err(|e| {
                tracing::error!(user_id = %self.user_id, error = %e, "Error fetching favorites");
            })?;

        let fresh = Arc::new(FavoritesSnapshot::from_rows(&rows));
        *self.snapshot.write().await = fresh.clone();

        tracing::debug!(
            user_id = %self.user_id,
            rows = rows.len(),
            favorites = fresh.items().len(),
            "Favorites refreshed"
        );
        Ok(fresh)
    }

    /// Favorite a facility. Already-favorited keys are a no-op.
    pub async fn add_favorite(
        &self,
        facility: &FacilityRef,
    ) -> Result<Arc<FavoritesSnapshot>, AppError> {
        let _guard = self.writes.lock().await;
        let current = self.snapshot().await;
        if current.is_favorite(&facility.key) {
            tracing::debug!(user_id = %self.user_id, key = %facility.key, "Already a favorite");
            return Ok(current);
        }

        let row = FavoriteRow {
            id: new_document_id()?,
            user_id: self.user_id.clone(),
            sport_facility_id: facility.key.clone(),
            sport_facility_name: facility.name.clone(),
            sport_facility_lat: facility.location.lat,
            sport_facility_lng: facility.location.lon,
            preferred_parking_id: None,
            preferred_parking_name: None,
            preferred_parking_type: None,
            created_at: now_rfc3339(),
        };
        self.db.insert_favorite_row(&row).await?;

        tracing::info!(user_id = %self.user_id, key = %facility.key, "Favorite added");
        self.refetch().await
    }

    /// Remove a facility and every parking linked to it.
    pub async fn remove_favorite(&self, id: &str) -> Result<Arc<FavoritesSnapshot>, AppError> {
        let _guard = self.writes.lock().await;
        let deleted = self
            .db
            .delete_favorite_rows(FavoriteFilter {
                user_id: &self.user_id,
                sport_facility_id: id,
                preferred_parking_id: None,
            })
            .await?;

        tracing::info!(user_id = %self.user_id, key = id, deleted, "Favorite removed");
        self.refetch().await
    }

    /// Link a parking to a favorited facility.
    ///
    /// The parent is looked up in the last snapshot, not in the store: a
    /// facility favorited from another device is unknown here until the
    /// next fetch. Linking the same parking twice stores two links.
    pub async fn link_parking(
        &self,
        parent_id: &str,
        parking: &ParkingRef,
    ) -> Result<Arc<FavoritesSnapshot>, AppError> {
        let _guard = self.writes.lock().await;
        let current = self.snapshot().await;
        let parent = current
            .get(parent_id)
            .ok_or_else(|| AppError::NotFound(format!("Favorite {} not found", parent_id)))?;

        let row = FavoriteRow {
            id: new_document_id()?,
            user_id: self.user_id.clone(),
            sport_facility_id: parent.id.clone(),
            sport_facility_name: parent.data.name.clone(),
            sport_facility_lat: parent.data.geo_point_2d.lat,
            sport_facility_lng: parent.data.geo_point_2d.lon,
            preferred_parking_id: Some(parking.id.clone()),
            preferred_parking_name: Some(parking.name.clone()),
            preferred_parking_type: Some(parking.kind),
            created_at: now_rfc3339(),
        };
        self.db.insert_favorite_row(&row).await?;

        tracing::info!(
            user_id = %self.user_id,
            parent = parent_id,
            parking = %parking.id,
            kind = ?parking.kind,
            "Parking linked"
        );
        self.refetch().await
    }

    /// Remove every link between a facility and a parking.
    pub async fn unlink_parking(
        &self,
        parent_id: &str,
        parking_id: &str,
    ) -> Result<Arc<FavoritesSnapshot>, AppError> {
        let _guard = self.writes.lock().await;
        let deleted = self
            .db
            .delete_favorite_rows(FavoriteFilter {
                user_id: &self.user_id,
                sport_facility_id: parent_id,
                preferred_parking_id: Some(parking_id),
            })
            .await?;

        tracing::info!(
            user_id = %self.user_id,
            parent = parent_id,
            parking = parking_id,
            deleted,
            "Parking unlinked"
        );
        self.refetch().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParkingKind;

    fn row(facility_id: &str, name: &str, parking: Option<(&str, &str)>) -> FavoriteRow {
        FavoriteRow {
            id: format!("{}-{:?}", facility_id, parking),
            user_id: "u1".to_string(),
            sport_facility_id: facility_id.to_string(),
            sport_facility_name: name.to_string(),
            sport_facility_lat: 47.4736,
            sport_facility_lng: -0.5542,
            preferred_parking_id: parking.map(|(id, _)| id.to_string()),
            preferred_parking_name: parking.map(|(_, n)| n.to_string()),
            preferred_parking_type: parking.map(|_| ParkingKind::Bike),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_group_rows_one_item_per_key_in_first_seen_order() {
        let rows = vec![
            row("Piscine", "Piscine", None),
            row("Stade", "Stade", Some(("B1", "Abri 1"))),
            row("Piscine", "Piscine", Some(("P1", "Parking 1"))),
            row("Stade", "Stade", None),
            row("Stade", "Stade", Some(("B2", "Abri 2"))),
        ];

        let items = group_rows(&rows);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["Piscine", "Stade"]);

        let stade: Vec<&str> = items[1]
            .linked_parkings
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(stade, vec!["B1", "B2"]);
        assert_eq!(items[0].linked_parkings.len(), 1);
    }

    #[test]
    fn test_group_rows_falls_back_to_name_key() {
        let rows = vec![row("", "Gymnase Nord", Some(("B1", "Abri")))];
        let items = group_rows(&rows);

        assert_eq!(items[0].id, "Gymnase Nord");
        assert_eq!(items[0].data.name, "Gymnase Nord");
        assert_eq!(items[0].linked_parkings.len(), 1);
    }

    #[test]
    fn test_snapshot_lookups() {
        let snapshot = FavoritesSnapshot::from_rows(&[row("Stade", "Stade", None)]);
        assert!(snapshot.is_favorite("Stade"));
        assert!(!snapshot.is_favorite("Piscine"));
        assert!(snapshot.linked_parkings("Stade").is_empty());
        assert!(snapshot.linked_parkings("Piscine").is_empty());
    }
}
