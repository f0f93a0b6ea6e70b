// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, Request, Response, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use sport_spots::config::Config;
use sport_spots::db::{FirestoreDb, MemoryDb};
use sport_spots::routes::create_router;
use sport_spots::AppState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app over an in-memory store.
/// Returns the router, the shared state and the store handle.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>, MemoryDb) {
    create_test_app_with(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (Router, Arc<AppState>, MemoryDb) {
    let db = MemoryDb::new();
    let state = Arc::new(AppState::new(config, db.clone().into()));
    (create_router(state.clone()), state, db)
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

/// Send a JSON request, optionally with a bearer token.
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// Register a user and return the session token.
#[allow(dead_code)]
pub async fn register(app: &Router, email: &str) -> String {
    let response = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": "password123",
            "confirm_password": "password123"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

// ─── Fake open-data API ──────────────────────────────────────

/// Requests seen by the fake API, as (dataset, offset, limit).
#[allow(dead_code)]
pub type RequestLog = Arc<Mutex<Vec<(String, u64, u64)>>>;

#[derive(Clone)]
struct FakeApi {
    datasets: Arc<HashMap<String, Vec<Value>>>,
    failing: Arc<Vec<String>>,
    log: RequestLog,
}

#[derive(Deserialize)]
struct PageParams {
    limit: u64,
    offset: u64,
}

async fn fake_records(
    State(api): State<FakeApi>,
    Path(dataset): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, StatusCode> {
    api.log
        .lock()
        .unwrap()
        .push((dataset.clone(), params.offset, params.limit));

    if api.failing.contains(&dataset) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let records = api.datasets.get(&dataset).cloned().unwrap_or_default();
    let page: Vec<Value> = records
        .iter()
        .skip(params.offset as usize)
        .take(params.limit as usize)
        .cloned()
        .collect();

    Ok(Json(json!({ "total_count": records.len(), "results": page })))
}

/// Serve the given datasets on a local port, paginated like the real
/// `records` endpoint. Datasets named in `failing` answer 503.
#[allow(dead_code)]
pub async fn spawn_fake_open_data(
    datasets: HashMap<String, Vec<Value>>,
    failing: Vec<String>,
) -> (String, RequestLog) {
    let log: RequestLog = Arc::default();
    let api = FakeApi {
        datasets: Arc::new(datasets),
        failing: Arc::new(failing),
        log: log.clone(),
    };

    let app = Router::new()
        .route("/{dataset}/records", get(fake_records))
        .with_state(api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), log)
}

/// A config pointing the open-data client at a fake API.
#[allow(dead_code)]
pub fn config_with_open_data(base_url: &str) -> Config {
    Config {
        open_data_base_url: base_url.to_string(),
        ..Config::test_default()
    }
}
