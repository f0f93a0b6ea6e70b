// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Open-data records: sports facilities, bike parkings and car parkings.
//!
//! Field names on the wire follow the Angers datasets (French); the Rust
//! side uses English names with serde renames.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A WGS84 coordinate as published by the open-data API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build a point only if both components are usable.
    ///
    /// Zero and non-finite components are treated as missing: the
    /// datasets use `0` as a placeholder for unknown positions.
    pub fn resolved(lat: f64, lon: f64) -> Option<Self> {
        let usable = |v: f64| v.is_finite() && v != 0.0;
        (usable(lat) && usable(lon)).then_some(Self { lat, lon })
    }

    /// Convert to a `geo` point (x = longitude, y = latitude).
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}

/// `geo_point_2d` as found in the car-parking dataset: usually an object,
/// sometimes a `"lat, lon"` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeoField {
    Point(GeoPoint),
    Text(String),
}

impl GeoField {
    pub fn resolve(&self) -> Option<GeoPoint> {
        match self {
            GeoField::Point(p) => GeoPoint::resolved(p.lat, p.lon),
            GeoField::Text(text) => {
                let (lat, lon) = text.split_once(',')?;
                GeoPoint::resolved(lat.trim().parse().ok()?, lon.trim().parse().ok()?)
            }
        }
    }
}

/// A numeric field the datasets publish either as a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrText::Number(n) => Some(*n),
            NumberOrText::Text(s) => s.trim().replace(',', ".").parse().ok(),
        }
    }
}

/// One page of a dataset, as returned by the `records` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetPage<T> {
    pub results: Vec<T>,
    pub total_count: u64,
}

/// A sports venue (`angers_stadium`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct SportFacility {
    #[serde(rename = "nom", default)]
    pub name: String,
    /// Sport or venue type (e.g. "FOOTBALL", "GYMNASE")
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "adresse", default)]
    pub address: String,
    #[serde(default)]
    pub geo_point_2d: Option<GeoPoint>,
    #[serde(rename = "quartier", default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(
        rename = "acces_handicap",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub disabled_access: Option<String>,
    #[serde(rename = "sol", default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<String>,
    #[serde(rename = "eclairage", default, skip_serializing_if = "Option::is_none")]
    pub lighting: Option<String>,
}

impl SportFacility {
    pub fn coordinates(&self) -> Option<GeoPoint> {
        self.geo_point_2d
            .and_then(|p| GeoPoint::resolved(p.lat, p.lon))
    }
}

/// A bike box or shelter (`parking-velo-angers`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeParking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_box: Option<String>,
    #[serde(rename = "nom_parkng", default)]
    pub name: String,
    /// Capacity, published as text
    #[serde(rename = "capacite", default)]
    pub capacity: Option<NumberOrText>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "acces", default)]
    pub access: String,
    #[serde(default)]
    pub geo_point_2d: Option<GeoPoint>,
    #[serde(rename = "voie", default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(rename = "gestion", default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(rename = "contexte", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(rename = "date_maj", default, skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<String>,
}

impl BikeParking {
    pub fn coordinates(&self) -> Option<GeoPoint> {
        self.geo_point_2d
            .and_then(|p| GeoPoint::resolved(p.lat, p.lon))
    }
}

/// A car park (`angers_stationnement`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarParking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_parking: Option<String>,
    #[serde(rename = "nom", default)]
    pub name: String,
    #[serde(rename = "adresse", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type_usagers", default)]
    pub user_type: Option<String>,
    /// `"VRAI"` when free of charge, `"FAUX"` otherwise
    #[serde(rename = "gratuit", default)]
    pub free: Option<String>,
    #[serde(rename = "nb_places", default)]
    pub spaces: Option<u32>,
    #[serde(rename = "nb_pmr", default, skip_serializing_if = "Option::is_none")]
    pub disabled_spaces: Option<u32>,
    #[serde(
        rename = "nb_voitures_electriques",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ev_spaces: Option<u32>,
    #[serde(rename = "tarif_1h", default, skip_serializing_if = "Option::is_none")]
    pub rate_1h: Option<f64>,
    #[serde(rename = "tarif_24h", default, skip_serializing_if = "Option::is_none")]
    pub rate_24h: Option<f64>,
    #[serde(
        rename = "horaires_ouverture",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub opens_at: Option<String>,
    #[serde(
        rename = "horaires_fermeture",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub closes_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_point_2d: Option<GeoField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ylat: Option<NumberOrText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xlong: Option<NumberOrText>,
}

impl CarParking {
    pub fn is_free(&self) -> bool {
        self.free.as_deref() == Some("VRAI")
    }

    /// Resolve the car park's position: the structured point first, then
    /// the separate `ylat` / `xlong` fields.
    pub fn coordinates(&self) -> Option<GeoPoint> {
        if let Some(point) = self.geo_point_2d.as_ref().and_then(GeoField::resolve) {
            return Some(point);
        }

        let lat = self.ylat.as_ref().and_then(NumberOrText::as_f64)?;
        let lon = self.xlong.as_ref().and_then(NumberOrText::as_f64)?;
        GeoPoint::resolved(lat, lon)
    }
}
