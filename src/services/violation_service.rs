// src/services/violation_service.rs
use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    errors::FleetError as AppError,
    models::{
        alert::AlertMatch,
        report::{build_report, GroupKey, ViolationReport},
        violation::{ViolationEvent, ViolationEventRequest, ViolationFilter},
    },
    services::{alert_service::AlertOperations, store_service::StoreOperations},
    utils::id_generator::WithGeneratedId,
};

/// A stored event and the rules it tripped. `alert_error` is set when the
/// event was stored but rule evaluation failed.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecordedViolation {
    pub event: ViolationEvent,
    pub alerts: Vec<AlertMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_error: Option<String>,
}

#[async_trait]
pub trait ViolationOperations: Send + Sync {
    async fn record_event(&self, request: ViolationEventRequest) -> Result<RecordedViolation, AppError>;
    async fn get_event(&self, event_id: &str) -> Result<Option<ViolationEvent>, AppError>;
    async fn list_events(&self, filter: &ViolationFilter) -> Result<Vec<ViolationEvent>, AppError>;
    async fn acknowledge_event(&self, event_id: &str, acknowledged_by: &str) -> Result<ViolationEvent, AppError>;
    async fn generate_report(&self, group_by: GroupKey, filter: &ViolationFilter) -> Result<ViolationReport, AppError>;
}

pub struct ViolationService {
    events: Arc<dyn StoreOperations<ViolationEvent>>,
    alert_service: Arc<dyn AlertOperations>,
    timezone: FixedOffset,
    // Serializes acknowledgement read-modify-write within this process
    ack_lock: Mutex<()>,
}

impl ViolationService {
    pub fn new(
        events: Arc<dyn StoreOperations<ViolationEvent>>,
        alert_service: Arc<dyn AlertOperations>,
        timezone: FixedOffset,
    ) -> Self {
        Self {
            events,
            alert_service,
            timezone,
            ack_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ViolationOperations for ViolationService {
    async fn record_event(&self, request: ViolationEventRequest) -> Result<RecordedViolation, AppError> {
        let event = ViolationEvent::from(request);
        event.validate().inspect_err(|e| {
            tracing::warn!("Rejected {:?} event for vehicle {}: {}", event.event_type, event.vehicle_id, e);
        })?;

        let event = event.with_generated_id();
        self.events.put(&event).await?;
        tracing::info!(
            "Recorded {:?} event {} (vehicle {}, geofence {})",
            event.event_type,
            event.id,
            event.vehicle_id,
            event.geofence_id
        );

        match self.alert_service.evaluate_event(&event).await {
            Ok(alerts) => Ok(RecordedViolation {
                event,
                alerts,
                alert_error: None,
            }),
            Err(e) => {
                tracing::warn!("Event {} stored but rule evaluation failed: {}", event.id, e);
                Ok(RecordedViolation {
                    event,
                    alerts: vec![],
                    alert_error: Some(e.to_string()),
                })
            }
        }
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<ViolationEvent>, AppError> {
        tracing::debug!("Getting violation event: {}", event_id);
        Ok(self.events.get(event_id).await?)
    }

    async fn list_events(&self, filter: &ViolationFilter) -> Result<Vec<ViolationEvent>, AppError> {
        let mut events: Vec<ViolationEvent> = self
            .events
            .list()
            .await?
            .into_iter()
            .filter(|event| filter.matches(event))
            .collect();
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn acknowledge_event(&self, event_id: &str, acknowledged_by: &str) -> Result<ViolationEvent, AppError> {
        if acknowledged_by.trim().is_empty() {
            return Err(AppError::validation_error("acknowledgedBy", "Acknowledger is required"));
        }

        let _guard = self.ack_lock.lock().await;
        let mut event = self
            .events
            .get(event_id)
            .await?
            .ok_or_else(|| AppError::event_not_found(event_id))?;

        event.acknowledge(acknowledged_by, Utc::now())?;
        self.events.put(&event).await?;

        tracing::info!("Event {} acknowledged by {}", event_id, acknowledged_by);
        Ok(event)
    }

    async fn generate_report(&self, group_by: GroupKey, filter: &ViolationFilter) -> Result<ViolationReport, AppError> {
        let events = self.list_events(filter).await?;
        tracing::debug!("Building {} report over {} events", group_by, events.len());
        Ok(build_report(&events, group_by, &self.timezone))
    }
}
