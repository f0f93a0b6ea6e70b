// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod facility;
pub mod favorite;
pub mod user;

pub use facility::{BikeParking, CarParking, DatasetPage, GeoPoint, SportFacility};
pub use favorite::{
    FacilityRef, FavoriteItem, FavoriteRow, FavoriteType, LinkedParking, ParkingKind, ParkingRef,
};
pub use user::{Account, Profile, TransportMode};
