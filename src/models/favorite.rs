// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Favorite rows (remote, flat) and the grouped view built from them.

use crate::error::AppError;
use crate::models::facility::{BikeParking, CarParking, GeoPoint, SportFacility};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kind of parking linked to a favorite facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ParkingKind {
    Car,
    Bike,
}

/// What a favorite points at. Only facilities can be favorited today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteType {
    Stadium,
}

/// One persisted favorite record, stored in `favorite_spots`.
///
/// A facility with `n` linked parkings is stored as the row created when
/// it was favorited (parking fields empty) plus one row per link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteRow {
    /// Document ID
    pub id: String,
    pub user_id: String,
    pub sport_facility_id: String,
    pub sport_facility_name: String,
    pub sport_facility_lat: f64,
    pub sport_facility_lng: f64,
    pub preferred_parking_id: Option<String>,
    pub preferred_parking_name: Option<String>,
    pub preferred_parking_type: Option<ParkingKind>,
    /// Creation time (RFC3339, UTC); rows are fetched in this order
    pub created_at: String,
}

impl FavoriteRow {
    /// Facility key: the explicit ID, or the name for rows written without one.
    pub fn facility_key(&self) -> &str {
        if self.sport_facility_id.is_empty() {
            &self.sport_facility_name
        } else {
            &self.sport_facility_id
        }
    }

    /// The linked parking carried by this row, if both ID and name are set.
    pub fn linked_parking(&self) -> Option<LinkedParking> {
        let id = self.preferred_parking_id.as_deref().filter(|s| !s.is_empty())?;
        let name = self
            .preferred_parking_name
            .as_deref()
            .filter(|s| !s.is_empty())?;

        Some(LinkedParking {
            id: id.to_string(),
            name: name.to_string(),
            // Rows written before types were recorded are shown as car parks.
            kind: self.preferred_parking_type.unwrap_or(ParkingKind::Car),
        })
    }
}

/// Facility data reconstructed from the denormalised row fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct FavoriteFacility {
    #[serde(rename = "nom")]
    pub name: String,
    pub geo_point_2d: GeoPoint,
}

/// Parking summary attached to a favorite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct LinkedParking {
    pub id: String,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParkingKind,
}

/// A favorited facility with its linked parkings (derived, never stored).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct FavoriteItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FavoriteType,
    pub data: FavoriteFacility,
    pub linked_parkings: Vec<LinkedParking>,
}

/// A validated reference to a facility about to be favorited.
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityRef {
    /// Key under which the favorite is stored
    pub key: String,
    pub name: String,
    /// Unknown positions are stored as (0, 0), as the app always did.
    pub location: GeoPoint,
}

impl FacilityRef {
    /// Resolve the key from a name and an optional ID: the name wins,
    /// the ID is the fallback.
    pub fn from_parts(
        name: Option<&str>,
        id: Option<&str>,
        location: Option<GeoPoint>,
    ) -> Result<Self, AppError> {
        let name = name.map(str::trim).filter(|s| !s.is_empty());
        let id = id.map(str::trim).filter(|s| !s.is_empty());

        let key = name.or(id).ok_or_else(|| {
            AppError::BadRequest("Facility must have a name or an id".to_string())
        })?;

        Ok(Self {
            key: key.to_string(),
            name: name.unwrap_or(key).to_string(),
            location: location.unwrap_or(GeoPoint::new(0.0, 0.0)),
        })
    }

    pub fn from_facility(facility: &SportFacility) -> Result<Self, AppError> {
        Self::from_parts(Some(&facility.name), None, facility.coordinates())
    }
}

/// A validated reference to a parking about to be linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkingRef {
    pub kind: ParkingKind,
    pub id: String,
    pub name: String,
}

impl ParkingRef {
    /// Pick the first non-empty ID and name from ordered candidates.
    ///
    /// ID candidates are expected in `id`, `id_parking`, `id_box`,
    /// `nom_parkng` order; name candidates in `nom`, `nom_parkng` order.
    /// A missing name falls back to the resolved ID.
    pub fn resolve<'a>(
        kind: ParkingKind,
        ids: impl IntoIterator<Item = Option<&'a str>>,
        names: impl IntoIterator<Item = Option<&'a str>>,
    ) -> Result<Self, AppError> {
        let id = first_non_empty(ids).ok_or_else(|| {
            AppError::BadRequest("Parking has no usable identifier".to_string())
        })?;
        let name = first_non_empty(names).unwrap_or_else(|| id.clone());

        Ok(Self { kind, id, name })
    }

    pub fn from_car(parking: &CarParking) -> Result<Self, AppError> {
        Self::resolve(
            ParkingKind::Car,
            [parking.id.as_deref(), parking.id_parking.as_deref()],
            [Some(parking.name.as_str())],
        )
    }

    pub fn from_bike(parking: &BikeParking) -> Result<Self, AppError> {
        Self::resolve(
            ParkingKind::Bike,
            [parking.id_box.as_deref(), Some(parking.name.as_str())],
            [Some(parking.name.as_str())],
        )
    }
}

fn first_non_empty<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
