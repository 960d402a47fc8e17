// src/services/geofence_service.rs
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::{
    errors::FleetError as AppError,
    models::{
        alert::AlertRule,
        geofence::{Coordinates, Geofence, GeofenceRequest, GeofenceStatus},
    },
    services::store_service::StoreOperations,
    utils::id_generator::WithGeneratedId,
};

#[async_trait]
pub trait GeofenceOperations: Send + Sync {
    async fn create_geofence(&self, request: GeofenceRequest) -> Result<Geofence, AppError>;
    async fn get_geofence(&self, geofence_id: &str) -> Result<Option<Geofence>, AppError>;
    async fn list_geofences(&self) -> Result<Vec<Geofence>, AppError>;
    async fn update_geofence(&self, geofence_id: &str, request: GeofenceRequest) -> Result<Geofence, AppError>;
    async fn set_geofence_status(&self, geofence_id: &str, status: GeofenceStatus) -> Result<Geofence, AppError>;
    /// Also deletes every alert rule attached to the geofence.
    async fn delete_geofence(&self, geofence_id: &str) -> Result<(), AppError>;
    async fn geofences_containing(&self, point: Coordinates) -> Result<Vec<Geofence>, AppError>;
}

pub struct GeofenceService {
    store: Arc<dyn StoreOperations<Geofence>>,
    rules: Arc<dyn StoreOperations<AlertRule>>,
}

impl GeofenceService {
    pub fn new(store: Arc<dyn StoreOperations<Geofence>>, rules: Arc<dyn StoreOperations<AlertRule>>) -> Self {
        Self { store, rules }
    }

    async fn require(&self, geofence_id: &str) -> Result<Geofence, AppError> {
        self.store
            .get(geofence_id)
            .await?
            .ok_or_else(|| AppError::geofence_not_found(geofence_id))
    }
}

#[async_trait]
impl GeofenceOperations for GeofenceService {
    async fn create_geofence(&self, request: GeofenceRequest) -> Result<Geofence, AppError> {
        tracing::info!("Creating geofence: {}", request.name);
        request.validate()?;

        let now = Utc::now();
        let geofence = Geofence {
            id: String::new(),
            name: request.name,
            description: request.description,
            geometry: request.geometry,
            category: request.category,
            status: request.status,
            schedule: request.schedule,
            metadata: request.metadata,
            created_at: now,
            updated_at: now,
        }
        .with_generated_id();

        self.store.put(&geofence).await?;

        tracing::info!("Geofence created: {} ({:?})", geofence.id, geofence.category);
        Ok(geofence)
    }

    async fn get_geofence(&self, geofence_id: &str) -> Result<Option<Geofence>, AppError> {
        tracing::debug!("Getting geofence: {}", geofence_id);
        Ok(self.store.get(geofence_id).await?)
    }

    async fn list_geofences(&self) -> Result<Vec<Geofence>, AppError> {
        let mut geofences = self.store.list().await?;
        geofences.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(geofences)
    }

    async fn update_geofence(&self, geofence_id: &str, request: GeofenceRequest) -> Result<Geofence, AppError> {
        request.validate()?;
        let mut geofence = self.require(geofence_id).await?;

        tracing::info!("Updating geofence: {}", geofence_id);

        geofence.name = request.name;
        geofence.description = request.description;
        geofence.geometry = request.geometry;
        geofence.category = request.category;
        geofence.status = request.status;
        geofence.schedule = request.schedule;
        geofence.metadata = request.metadata;
        geofence.updated_at = Utc::now();

        self.store.put(&geofence).await?;
        Ok(geofence)
    }

    async fn set_geofence_status(&self, geofence_id: &str, status: GeofenceStatus) -> Result<Geofence, AppError> {
        let mut geofence = self.require(geofence_id).await?;
        tracing::info!("Geofence {} status {:?} -> {:?}", geofence_id, geofence.status, status);

        geofence.status = status;
        geofence.updated_at = Utc::now();
        self.store.put(&geofence).await?;
        Ok(geofence)
    }

    async fn delete_geofence(&self, geofence_id: &str) -> Result<(), AppError> {
        if !self.store.delete(geofence_id).await? {
            return Err(AppError::geofence_not_found(geofence_id));
        }

        let mut removed = 0;
        for rule in self.rules.list().await? {
            if rule.geofence_id == geofence_id && self.rules.delete(&rule.id).await? {
                removed += 1;
            }
        }

        tracing::info!("Geofence deleted: {} ({} alert rules removed)", geofence_id, removed);
        Ok(())
    }

    async fn geofences_containing(&self, point: Coordinates) -> Result<Vec<Geofence>, AppError> {
        if !point.is_valid() {
            return Err(AppError::validation_error("coordinates", "Coordinates out of range"));
        }

        let mut hits: Vec<Geofence> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|geofence| geofence.is_active() && geofence.contains(&point))
            .collect();
        hits.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(hits)
    }
}
