// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sport Spots: find sports facilities and nearby parking in Angers
//!
//! This crate provides the backend API for the mobile app: it drains the
//! Angers open-data datasets, ranks parkings around a facility, and keeps
//! each signed-in user's favorites in sync with the remote store.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::{AuthService, OpenDataClient, SessionRegistry, WeatherClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub open_data: OpenDataClient,
    pub weather: WeatherClient,
    pub sessions: SessionRegistry,
    pub auth_service: AuthService,
}

impl AppState {
    /// Wire up the services that share the store and session registry.
    pub fn new(config: Config, db: Db) -> Self {
        let open_data = OpenDataClient::new(&config.open_data_base_url);
        let weather = WeatherClient::new(&config.weather_base_url);
        let sessions = SessionRegistry::new(db.clone());
        let auth_service = AuthService::new(db.clone(), sessions.clone());

        Self {
            config,
            db,
            open_data,
            weather,
            sessions,
            auth_service,
        }
    }
}
