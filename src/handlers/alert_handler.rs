// src/handlers/alert_handler.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    errors::{FleetError, FleetResult},
    models::{AlertRule, AlertRuleRequest, RuleStatus},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleListQuery {
    pub geofence_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: RuleStatus,
}

pub async fn create_rule(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AlertRuleRequest>,
) -> FleetResult<(StatusCode, Json<AlertRule>)> {
    let rule = state.alert_service.create_rule(request).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn list_rules(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RuleListQuery>,
) -> FleetResult<Json<Vec<AlertRule>>> {
    Ok(Json(state.alert_service.list_rules(query.geofence_id.as_deref()).await?))
}

pub async fn get_rule(
    State(state): State<Arc<AppState>>,
    Path(rule_id): Path<String>,
) -> FleetResult<Json<AlertRule>> {
    state
        .alert_service
        .get_rule(&rule_id)
        .await?
        .map(Json)
        .ok_or_else(|| FleetError::rule_not_found(rule_id))
}

pub async fn set_rule_status(
    State(state): State<Arc<AppState>>,
    Path(rule_id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> FleetResult<Json<AlertRule>> {
    Ok(Json(state.alert_service.set_rule_status(&rule_id, update.status).await?))
}

pub async fn delete_rule(
    State(state): State<Arc<AppState>>,
    Path(rule_id): Path<String>,
) -> FleetResult<StatusCode> {
    state.alert_service.delete_rule(&rule_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
