// src/handlers/violation_handler.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    errors::{FleetError, FleetResult},
    models::{AcknowledgeRequest, GroupKey, ViolationEvent, ViolationEventRequest, ViolationFilter, ViolationReport},
    services::violation_service::RecordedViolation,
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub group_by: String,
    pub vehicle_id: Option<String>,
    pub driver_id: Option<String>,
    pub geofence_id: Option<String>,
    #[serde(default)]
    pub unacknowledged: bool,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl ReportQuery {
    fn into_parts(self) -> FleetResult<(GroupKey, ViolationFilter)> {
        let group_by = self.group_by.parse()?;
        let filter = ViolationFilter {
            vehicle_id: self.vehicle_id,
            driver_id: self.driver_id,
            geofence_id: self.geofence_id,
            unacknowledged: self.unacknowledged,
            from: self.from,
            to: self.to,
        };
        Ok((group_by, filter))
    }
}

pub async fn record_event(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ViolationEventRequest>,
) -> FleetResult<(StatusCode, Json<RecordedViolation>)> {
    let recorded = state.violation_service.record_event(request).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ViolationFilter>,
) -> FleetResult<Json<Vec<ViolationEvent>>> {
    Ok(Json(state.violation_service.list_events(&filter).await?))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> FleetResult<Json<ViolationEvent>> {
    state
        .violation_service
        .get_event(&event_id)
        .await?
        .map(Json)
        .ok_or_else(|| FleetError::event_not_found(event_id))
}

pub async fn acknowledge_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(request): Json<AcknowledgeRequest>,
) -> FleetResult<Json<ViolationEvent>> {
    Ok(Json(
        state
            .violation_service
            .acknowledge_event(&event_id, &request.acknowledged_by)
            .await?,
    ))
}

pub async fn violation_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> FleetResult<Json<ViolationReport>> {
    let (group_by, filter) = query.into_parts()?;
    Ok(Json(state.violation_service.generate_report(group_by, &filter).await?))
}
