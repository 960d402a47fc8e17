// src/handlers/geofence_handler.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    errors::{FleetError, FleetResult},
    models::{Coordinates, Geofence, GeofenceRequest, GeofenceStatus},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct PointQuery {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: GeofenceStatus,
}

pub async fn create_geofence(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GeofenceRequest>,
) -> FleetResult<(StatusCode, Json<Geofence>)> {
    let geofence = state.geofence_service.create_geofence(request).await?;
    Ok((StatusCode::CREATED, Json(geofence)))
}

pub async fn list_geofences(State(state): State<Arc<AppState>>) -> FleetResult<Json<Vec<Geofence>>> {
    Ok(Json(state.geofence_service.list_geofences().await?))
}

pub async fn get_geofence(
    State(state): State<Arc<AppState>>,
    Path(geofence_id): Path<String>,
) -> FleetResult<Json<Geofence>> {
    state
        .geofence_service
        .get_geofence(&geofence_id)
        .await?
        .map(Json)
        .ok_or_else(|| FleetError::geofence_not_found(geofence_id))
}

pub async fn update_geofence(
    State(state): State<Arc<AppState>>,
    Path(geofence_id): Path<String>,
    Json(request): Json<GeofenceRequest>,
) -> FleetResult<Json<Geofence>> {
    Ok(Json(state.geofence_service.update_geofence(&geofence_id, request).await?))
}

pub async fn set_geofence_status(
    State(state): State<Arc<AppState>>,
    Path(geofence_id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> FleetResult<Json<Geofence>> {
    Ok(Json(
        state
            .geofence_service
            .set_geofence_status(&geofence_id, update.status)
            .await?,
    ))
}

pub async fn delete_geofence(
    State(state): State<Arc<AppState>>,
    Path(geofence_id): Path<String>,
) -> FleetResult<StatusCode> {
    state.geofence_service.delete_geofence(&geofence_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn geofences_containing(
    State(state): State<Arc<AppState>>,
    Query(point): Query<PointQuery>,
) -> FleetResult<Json<Vec<Geofence>>> {
    let point = Coordinates::new(point.lat, point.lng);
    Ok(Json(state.geofence_service.geofences_containing(point).await?))
}
