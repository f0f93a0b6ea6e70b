// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map search and filtering over the open-data catalog.

use crate::models::{BikeParking, CarParking, GeoPoint, ParkingKind, SportFacility};
use crate::services::open_data::CityCatalog;
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde::Deserialize;
use std::collections::BTreeSet;

/// Which layers the map shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Sports,
    Parking,
}

/// Car park pricing filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostFilter {
    #[default]
    Any,
    Free,
    Paid,
}

/// Map filter as sent in the query string.
///
/// `sports` is a comma-separated list of facility types.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapQuery {
    #[serde(default, rename = "q")]
    pub query: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub sports: Option<String>,
    #[serde(default)]
    pub parking_kind: Option<ParkingKind>,
    #[serde(default)]
    pub cost: CostFilter,
}

/// Criteria applied to the catalog before it is drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapFilter {
    pub query: String,
    pub category: Category,
    /// Only honoured in the `sports` category; empty means every type.
    pub sports: Vec<String>,
    /// Restricts parkings to one kind; `None` shows both.
    pub parking_kind: Option<ParkingKind>,
    /// Only honoured in the `parking` category with car parks selected.
    pub cost: CostFilter,
}

impl From<MapQuery> for MapFilter {
    fn from(q: MapQuery) -> Self {
        let sports = q
            .sports
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            query: q.query.trim().to_string(),
            category: q.category,
            sports,
            parking_kind: q.parking_kind,
            cost: q.cost,
        }
    }
}

impl MapFilter {
    /// Case-insensitive substring match. Missing or empty text never
    /// matches, even with an empty query. Whitespace counts as text.
    fn matches_text(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.query.is_empty() || text.to_lowercase().contains(&self.query.to_lowercase())
    }

    fn shows_sports(&self) -> bool {
        matches!(self.category, Category::All | Category::Sports)
    }

    fn shows_parking(&self, kind: ParkingKind) -> bool {
        matches!(self.category, Category::All | Category::Parking)
            && self.parking_kind.map_or(true, |k| k == kind)
    }

    pub fn accepts_facility(&self, facility: &SportFacility) -> bool {
        if !self.shows_sports() {
            return false;
        }
        if !self.matches_text(&format!("{} {}", facility.name, facility.kind)) {
            return false;
        }
        if self.category == Category::Sports && !self.sports.is_empty() {
            return self.sports.iter().any(|s| *s == facility.kind);
        }
        true
    }

    pub fn accepts_bike(&self, parking: &BikeParking) -> bool {
        self.shows_parking(ParkingKind::Bike) && self.matches_text(&parking.name)
    }

    pub fn accepts_car(&self, parking: &CarParking) -> bool {
        if !self.shows_parking(ParkingKind::Car) || !self.matches_text(&parking.name) {
            return false;
        }
        if self.category == Category::Parking && self.parking_kind == Some(ParkingKind::Car) {
            return match self.cost {
                CostFilter::Any => true,
                CostFilter::Free => parking.is_free(),
                CostFilter::Paid => !parking.is_free(),
            };
        }
        true
    }
}

/// Apply a filter to every dataset of the catalog.
pub fn filter_catalog(catalog: &CityCatalog, filter: &MapFilter) -> CityCatalog {
    CityCatalog {
        facilities: catalog
            .facilities
            .iter()
            .filter(|f| filter.accepts_facility(f))
            .cloned()
            .collect(),
        bike_parkings: catalog
            .bike_parkings
            .iter()
            .filter(|p| filter.accepts_bike(p))
            .cloned()
            .collect(),
        car_parkings: catalog
            .car_parkings
            .iter()
            .filter(|p| filter.accepts_car(p))
            .cloned()
            .collect(),
    }
}

/// Distinct non-empty facility types, sorted.
pub fn sport_types(facilities: &[SportFacility]) -> Vec<String> {
    facilities
        .iter()
        .map(|f| f.kind.as_str())
        .filter(|k| !k.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn point_feature(location: GeoPoint, properties: serde_json::Value) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![location.lon, location.lat]))),
        id: None,
        properties: properties.as_object().cloned(),
        foreign_members: None,
    }
}

/// Render a catalog as one GeoJSON point layer.
///
/// Records whose position cannot be resolved are left out.
pub fn to_feature_collection(catalog: &CityCatalog) -> FeatureCollection {
    let facilities = catalog.facilities.iter().filter_map(|f| {
        let location = f.coordinates()?;
        Some(point_feature(
            location,
            serde_json::json!({
                "layer": "sport",
                "nom": f.name,
                "type": f.kind,
                "adresse": f.address,
            }),
        ))
    });

    let bikes = catalog.bike_parkings.iter().filter_map(|p| {
        let location = p.coordinates()?;
        Some(point_feature(
            location,
            serde_json::json!({
                "layer": ParkingKind::Bike,
                "nom": p.name,
                "capacite": p.capacity.as_ref().and_then(|c| c.as_f64()),
            }),
        ))
    });

    let cars = catalog.car_parkings.iter().filter_map(|p| {
        let location = p.coordinates()?;
        Some(point_feature(
            location,
            serde_json::json!({
                "layer": ParkingKind::Car,
                "nom": p.name,
                "gratuit": p.is_free(),
                "nb_places": p.spaces,
            }),
        ))
    });

    FeatureCollection {
        bbox: None,
        features: facilities.chain(bikes).chain(cars).collect(),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> CityCatalog {
        CityCatalog {
            facilities: vec![
                serde_json::from_value(json!({ "nom": "Stade du Lac", "type": "FOOTBALL",
                    "geo_point_2d": { "lat": 47.47, "lon": -0.55 } }))
                .unwrap(),
                serde_json::from_value(json!({ "nom": "Piscine Jean Bouin", "type": "NATATION" }))
                    .unwrap(),
                serde_json::from_value(json!({ "nom": "Halle", "type": "" })).unwrap(),
            ],
            bike_parkings: vec![
                serde_json::from_value(json!({ "nom_parkng": "Abri Lac" })).unwrap(),
                serde_json::from_value(json!({ "nom_parkng": "" })).unwrap(),
            ],
            car_parkings: vec![
                serde_json::from_value(json!({ "nom": "Parking du Lac", "gratuit": "VRAI" }))
                    .unwrap(),
                serde_json::from_value(json!({ "nom": "Parking Mail", "gratuit": "FAUX" }))
                    .unwrap(),
            ],
        }
    }

    #[test]
    fn test_query_is_case_insensitive_and_skips_blank_names() {
        let filter = MapFilter {
            query: "lac".to_string(),
            ..Default::default()
        };
        let out = filter_catalog(&catalog(), &filter);
        assert_eq!(out.facilities.len(), 1);
        assert_eq!(out.bike_parkings.len(), 1);
        assert_eq!(out.car_parkings.len(), 1);

        // Empty query still drops records without a name.
        let out = filter_catalog(&catalog(), &MapFilter::default());
        assert_eq!(out.bike_parkings.len(), 1);
    }

    #[test]
    fn test_facility_without_name_or_type_still_shows() {
        // Name and type are joined with a space, so the text is never empty.
        let unnamed: SportFacility =
            serde_json::from_value(json!({ "nom": "", "type": "" })).unwrap();
        assert!(MapFilter::default().accepts_facility(&unnamed));

        let filter = MapFilter {
            query: "lac".to_string(),
            ..Default::default()
        };
        assert!(!filter.accepts_facility(&unnamed));
    }

    #[test]
    fn test_query_matches_facility_type() {
        let filter = MapFilter {
            query: "natation".to_string(),
            ..Default::default()
        };
        let out = filter_catalog(&catalog(), &filter);
        assert_eq!(out.facilities[0].name, "Piscine Jean Bouin");
    }

    #[test]
    fn test_sports_selection_only_in_sports_category() {
        let mut filter = MapFilter {
            category: Category::Sports,
            sports: vec!["FOOTBALL".to_string()],
            ..Default::default()
        };
        let out = filter_catalog(&catalog(), &filter);
        assert_eq!(out.facilities.len(), 1);
        assert!(out.car_parkings.is_empty());

        filter.category = Category::All;
        assert_eq!(filter_catalog(&catalog(), &filter).facilities.len(), 3);
    }

    #[test]
    fn test_cost_filter_needs_parking_category_and_car_kind() {
        let mut filter = MapFilter {
            category: Category::Parking,
            parking_kind: Some(ParkingKind::Car),
            cost: CostFilter::Free,
            ..Default::default()
        };
        let out = filter_catalog(&catalog(), &filter);
        assert!(out.facilities.is_empty());
        assert!(out.bike_parkings.is_empty());
        assert_eq!(out.car_parkings.len(), 1);
        assert_eq!(out.car_parkings[0].name, "Parking du Lac");

        filter.parking_kind = None;
        assert_eq!(filter_catalog(&catalog(), &filter).car_parkings.len(), 2);
    }

    #[test]
    fn test_map_query_splits_sports() {
        let q: MapQuery = serde_json::from_value(json!({
            "q": "  Lac ",
            "category": "sports",
            "sports": "FOOTBALL, ,TENNIS"
        }))
        .unwrap();
        let filter = MapFilter::from(q);
        assert_eq!(filter.query, "Lac");
        assert_eq!(filter.sports, vec!["FOOTBALL", "TENNIS"]);
    }

    #[test]
    fn test_sport_types_distinct_sorted() {
        assert_eq!(sport_types(&catalog().facilities), vec!["FOOTBALL", "NATATION"]);
    }

    #[test]
    fn test_feature_collection_skips_unlocated() {
        let fc = to_feature_collection(&catalog());
        assert_eq!(fc.features.len(), 1);
        let props = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(props["layer"], "sport");
    }
}
