// src/models/violation.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{FleetError, FleetResult, ValidationError};
use crate::models::geofence::Coordinates;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ViolationType {
    Entry,
    Exit,
    Dwell,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViolationEvent {
    pub id: String,
    pub geofence_id: String,
    pub vehicle_id: String,
    pub driver_id: String,
    #[serde(rename = "type")]
    pub event_type: ViolationType,
    pub timestamp: DateTime<Utc>,
    pub coordinates: Coordinates,
    /// Seconds inside the zone; only dwell events carry it.
    pub dwell_time: Option<u64>,
    #[serde(default)]
    pub acknowledged: bool,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl ViolationEvent {
    /// Dwell events need a dwell time, entry and exit events must not have one.
    pub fn validate(&self) -> FleetResult<()> {
        let mut errors = Vec::new();
        for (field, value) in [
            ("geofenceId", &self.geofence_id),
            ("vehicleId", &self.vehicle_id),
            ("driverId", &self.driver_id),
        ] {
            if value.trim().is_empty() {
                errors.push(ValidationError::new(field, format!("{} is required", field)));
            }
        }
        match (self.event_type, self.dwell_time) {
            (ViolationType::Dwell, None) => {
                errors.push(ValidationError::new("dwellTime", "Dwell events require a dwell time"));
            }
            (ViolationType::Entry | ViolationType::Exit, Some(_)) => {
                errors.push(ValidationError::new("dwellTime", "Only dwell events carry a dwell time"));
            }
            _ => {}
        }
        if !self.coordinates.is_valid() {
            errors.push(ValidationError::new("coordinates", "Coordinates out of range"));
        }
        FleetError::from_validation(errors)
    }

    pub fn acknowledge(&mut self, by: impl Into<String>, at: DateTime<Utc>) -> FleetResult<()> {
        if self.acknowledged {
            return Err(FleetError::AlreadyAcknowledged(self.id.clone()));
        }
        self.acknowledged = true;
        self.acknowledged_by = Some(by.into());
        self.acknowledged_at = Some(at);
        Ok(())
    }
}

/// Incoming event before it is assigned an id.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ViolationEventRequest {
    pub geofence_id: String,
    pub vehicle_id: String,
    pub driver_id: String,
    #[serde(rename = "type")]
    pub event_type: ViolationType,
    pub timestamp: DateTime<Utc>,
    pub coordinates: Coordinates,
    pub dwell_time: Option<u64>,
}

impl From<ViolationEventRequest> for ViolationEvent {
    fn from(request: ViolationEventRequest) -> Self {
        Self {
            id: String::new(),
            geofence_id: request.geofence_id,
            vehicle_id: request.vehicle_id,
            driver_id: request.driver_id,
            event_type: request.event_type,
            timestamp: request.timestamp,
            coordinates: request.coordinates,
            dwell_time: request.dwell_time,
            acknowledged: false,
            acknowledged_by: None,
            acknowledged_at: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgeRequest {
    pub acknowledged_by: String,
}

/// Optional filters for listing events; all set fields must match.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ViolationFilter {
    pub vehicle_id: Option<String>,
    pub driver_id: Option<String>,
    pub geofence_id: Option<String>,
    #[serde(default)]
    pub unacknowledged: bool,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl ViolationFilter {
    pub fn matches(&self, event: &ViolationEvent) -> bool {
        self.vehicle_id.as_ref().is_none_or(|id| *id == event.vehicle_id)
            && self.driver_id.as_ref().is_none_or(|id| *id == event.driver_id)
            && self.geofence_id.as_ref().is_none_or(|id| *id == event.geofence_id)
            && (!self.unacknowledged || !event.acknowledged)
            && self.from.is_none_or(|from| event.timestamp >= from)
            && self.to.is_none_or(|to| event.timestamp < to)
    }
}
