// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    FacilityRef, FavoriteItem, GeoPoint, LinkedParking, ParkingKind, ParkingRef, Profile,
    TransportMode,
};
use crate::services::open_data::CityCatalog;
use crate::services::proximity::{rank_nearby_parkings, ParkingCandidate, NEARBY_PARKINGS_LIMIT};
use crate::services::search::{filter_catalog, sport_types, to_feature_collection, MapQuery};
use crate::services::weather::WeatherReport;
use crate::services::{MapFilter, Session};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/catalog", get(get_catalog))
        .route("/api/map", get(get_map))
        .route("/api/sport-types", get(get_sport_types))
        .route("/api/parkings/nearby", get(get_nearby_parkings))
        .route("/api/favorites", get(get_favorites).post(add_favorite))
        .route("/api/favorites/{id}", delete(remove_favorite))
        .route(
            "/api/favorites/{id}/parkings",
            get(get_linked_parkings).post(link_parking),
        )
        .route(
            "/api/favorites/{id}/parkings/{parking_id}",
            delete(unlink_parking),
        )
        .route("/api/profile", get(get_profile).put(update_profile))
        .route("/api/weather", get(get_weather))
}

/// The open session behind an authenticated request.
fn session_for(state: &AppState, user: &AuthUser) -> Result<Arc<Session>> {
    state
        .sessions
        .get(&user.session_id)
        .ok_or(AppError::Unauthorized)
}

// ─── Open Data ───────────────────────────────────────────────

async fn get_catalog(State(state): State<Arc<AppState>>) -> Result<Json<CityCatalog>> {
    Ok(Json(state.open_data.catalog().await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum MapFormat {
    #[default]
    Json,
    GeoJson,
}

#[derive(Deserialize)]
struct MapOutput {
    #[serde(default)]
    format: MapFormat,
}

/// Catalog filtered for the map, as dataset lists or a GeoJSON layer.
async fn get_map(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MapQuery>,
    Query(output): Query<MapOutput>,
) -> Result<Response> {
    let filter = MapFilter::from(query);
    let catalog = state.open_data.catalog().await?;
    let filtered = filter_catalog(&catalog, &filter);

    tracing::debug!(
        query = %filter.query,
        category = ?filter.category,
        facilities = filtered.facilities.len(),
        bike_parkings = filtered.bike_parkings.len(),
        car_parkings = filtered.car_parkings.len(),
        "Map filtered"
    );

    Ok(match output.format {
        MapFormat::Json => Json(filtered).into_response(),
        MapFormat::GeoJson => Json(to_feature_collection(&filtered)).into_response(),
    })
}

async fn get_sport_types(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>> {
    let facilities = state.open_data.facilities().await?;
    Ok(Json(sport_types(&facilities)))
}

#[derive(Deserialize)]
struct NearbyQuery {
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Parkings nearest to a point, for the linking preview.
///
/// Without a usable point the parkings come back unranked, cars first.
async fn get_nearby_parkings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<ParkingCandidate>>> {
    let target = match (query.lat, query.lon) {
        (Some(lat), Some(lon)) => GeoPoint::resolved(lat, lon),
        _ => None,
    };

    let (cars, bikes) = tokio::try_join!(
        state.open_data.car_parkings(),
        state.open_data.bike_parkings()
    )?;

    Ok(Json(rank_nearby_parkings(
        target,
        cars,
        bikes,
        NEARBY_PARKINGS_LIMIT,
    )))
}

// ─── Favorites ───────────────────────────────────────────────

#[derive(Deserialize)]
struct FavoritesQuery {
    /// Re-read the store before answering
    #[serde(default)]
    refresh: bool,
}

async fn get_favorites(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<FavoritesQuery>,
) -> Result<Json<Vec<FavoriteItem>>> {
    let session = session_for(&state, &user)?;
    let snapshot = if query.refresh {
        session.favorites.fetch().await?
    } else {
        session.favorites.snapshot().await
    };
    Ok(Json(snapshot.items().to_vec()))
}

/// A facility to favorite, as the app holds it.
#[derive(Deserialize)]
struct AddFavoriteRequest {
    #[serde(default)]
    nom: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    geo_point_2d: Option<GeoPoint>,
}

async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<Vec<FavoriteItem>>)> {
    let facility = FacilityRef::from_parts(
        request.nom.as_deref(),
        request.id.as_deref(),
        request.geo_point_2d,
    )?;
    let session = session_for(&state, &user)?;

    let snapshot = session.favorites.add_favorite(&facility).await?;
    Ok((StatusCode::CREATED, Json(snapshot.items().to_vec())))
}

async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<FavoriteItem>>> {
    let session = session_for(&state, &user)?;
    let snapshot = session.favorites.remove_favorite(&id).await?;
    Ok(Json(snapshot.items().to_vec()))
}

async fn get_linked_parkings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LinkedParking>>> {
    let session = session_for(&state, &user)?;
    Ok(Json(session.favorites.linked_parkings(&id).await))
}

/// A parking record to link, in either dataset's field names.
#[derive(Deserialize)]
struct LinkParkingRequest {
    #[serde(rename = "type")]
    kind: ParkingKind,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    id_parking: Option<String>,
    #[serde(default)]
    id_box: Option<String>,
    #[serde(default)]
    nom: Option<String>,
    #[serde(default)]
    nom_parkng: Option<String>,
}

impl LinkParkingRequest {
    fn to_parking_ref(&self) -> Result<ParkingRef> {
        ParkingRef::resolve(
            self.kind,
            [
                self.id.as_deref(),
                self.id_parking.as_deref(),
                self.id_box.as_deref(),
                self.nom_parkng.as_deref(),
            ],
            [self.nom.as_deref(), self.nom_parkng.as_deref()],
        )
    }
}

async fn link_parking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<LinkParkingRequest>,
) -> Result<(StatusCode, Json<Vec<FavoriteItem>>)> {
    let parking = request.to_parking_ref()?;
    let session = session_for(&state, &user)?;

    let snapshot = session.favorites.link_parking(&id, &parking).await?;
    Ok((StatusCode::CREATED, Json(snapshot.items().to_vec())))
}

async fn unlink_parking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((id, parking_id)): Path<(String, String)>,
) -> Result<Json<Vec<FavoriteItem>>> {
    let session = session_for(&state, &user)?;
    let snapshot = session.favorites.unlink_parking(&id, &parking_id).await?;
    Ok(Json(snapshot.items().to_vec()))
}

// ─── Profile ─────────────────────────────────────────────────

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Profile>> {
    let profile = state
        .db
        .get_profile(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user.user_id)))?;
    Ok(Json(profile))
}

/// Onboarding / profile form.
#[derive(Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Merci de choisir un pseudo !"))]
    pub username: String,
    #[serde(default)]
    pub preferred_transport_mode: TransportMode,
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>> {
    let request = UpdateProfileRequest {
        username: request.username.trim().to_string(),
        ..request
    };
    request.validate()?;

    let session = session_for(&state, &user)?;

    // Read-modify-write keeps fields the form does not carry.
    let profile = match state.db.get_profile(&user.user_id).await? {
        Some(existing) => Profile {
            username: Some(request.username),
            preferred_transport_mode: request.preferred_transport_mode,
            ..existing
        },
        None => Profile {
            id: user.user_id.clone(),
            email: Some(session.email.clone()),
            username: Some(request.username),
            preferred_transport_mode: request.preferred_transport_mode,
            created_at: now_rfc3339(),
        },
    };
    state.db.upsert_profile(&profile).await?;

    tracing::info!(
        user_id = %user.user_id,
        mode = ?profile.preferred_transport_mode,
        "Profile updated"
    );
    Ok(Json(profile))
}

// ─── Weather ─────────────────────────────────────────────────

#[derive(Serialize)]
struct WeatherResponse {
    weather: Option<WeatherReport>,
}

async fn get_weather(State(state): State<Arc<AppState>>) -> Result<Json<WeatherResponse>> {
    let weather = state.weather.current().await?;
    Ok(Json(WeatherResponse { weather }))
}
