// src/handlers/document_handler.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    errors::{FleetError, FleetResult},
    models::{DocumentRequest, DocumentResponse},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    /// Defaults to today in the configured timezone.
    pub today: Option<NaiveDate>,
}

pub async fn register_document(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DocumentRequest>,
) -> FleetResult<(StatusCode, Json<DocumentResponse>)> {
    let document = state.document_service.register_document(request).await?;
    Ok((StatusCode::CREATED, Json(DocumentResponse::new(document, state.today()))))
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> FleetResult<Json<DocumentResponse>> {
    let document = state
        .document_service
        .get_document(&document_id)
        .await?
        .ok_or_else(|| FleetError::document_not_found(document_id))?;
    Ok(Json(DocumentResponse::new(document, state.today())))
}

pub async fn list_driver_documents(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> FleetResult<Json<Vec<DocumentResponse>>> {
    let today = query.today.unwrap_or_else(|| state.today());
    Ok(Json(state.document_service.list_driver_documents(&driver_id, today).await?))
}

pub async fn expiring_documents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AsOfQuery>,
) -> FleetResult<Json<Vec<DocumentResponse>>> {
    let today = query.today.unwrap_or_else(|| state.today());
    Ok(Json(state.document_service.expiring_documents(today).await?))
}
