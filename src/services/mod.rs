// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod favorites;
pub mod open_data;
pub mod proximity;
pub mod search;
pub mod sessions;
pub mod weather;

pub use auth::AuthService;
pub use favorites::{FavoritesSnapshot, FavoritesStore};
pub use open_data::{CityCatalog, OpenDataClient};
pub use proximity::{rank_nearby_parkings, ParkingCandidate};
pub use search::MapFilter;
pub use sessions::{AuthEvent, Session, SessionRegistry};
pub use weather::WeatherClient;
