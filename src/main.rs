// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sport Spots API Server
//!
//! Serves the Angers sports-facility and parking datasets to the mobile
//! app, with per-user favorites and nearby-parking suggestions.

use sport_spots::{
    config::{Config, StoreBackend},
    db::{Db, FirestoreDb, MemoryDb},
    services::AuthEvent,
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.store_backend,
        "Starting Sport Spots API"
    );

    let db: Db = match config.store_backend {
        StoreBackend::Firestore => FirestoreDb::new(&config.gcp_project_id).await?.into(),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            MemoryDb::new().into()
        }
    };

    let state = Arc::new(AppState::new(config.clone(), db));
    spawn_auth_event_logger(&state);
    spawn_session_pruner(&state);

    // Build router
    let app = sport_spots::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Log every sign-in and sign-out as it happens.
fn spawn_auth_event_logger(state: &AppState) {
    let mut events = state.sessions.subscribe();

    tokio::spawn(async move {
        use tokio::sync::broadcast::error::RecvError;

        loop {
            match events.recv().await {
                Ok(AuthEvent::SignedIn {
                    user_id,
                    session_id,
                }) => {
                    tracing::info!(%user_id, %session_id, "Auth state: signed in");
                }
                Ok(AuthEvent::SignedOut {
                    user_id,
                    session_id,
                }) => {
                    tracing::info!(%user_id, %session_id, "Auth state: signed out");
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Auth event logger fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// How often expired sessions are swept from the registry.
const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Close sessions whose token expired without a sign-out.
fn spawn_session_pruner(state: &AppState) {
    let sessions = state.sessions.clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            sessions.prune_expired();
        }
    });
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sport_spots=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
