// src/models/geofence.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{FleetError, FleetResult, ValidationError};
use crate::models::schedule::ScheduleWindow;
use crate::utils::geo::{haversine_distance_m, point_in_polygon};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng")]
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Zone shape. A polygon ring is implicitly closed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Geometry {
    Polygon {
        vertices: Vec<Coordinates>,
    },
    #[serde(rename_all = "camelCase")]
    Circle {
        center: Coordinates,
        radius_meters: f64,
    },
}

impl Geometry {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        match self {
            Geometry::Polygon { vertices } => {
                if vertices.len() < 3 {
                    errors.push(ValidationError::new(
                        "geometry.vertices",
                        format!("Polygon needs at least 3 vertices, got {}", vertices.len()),
                    ));
                }
                if vertices.iter().any(|v| !v.is_valid()) {
                    errors.push(ValidationError::new("geometry.vertices", "Vertex out of range"));
                }
            }
            Geometry::Circle { center, radius_meters } => {
                if !center.is_valid() {
                    errors.push(ValidationError::new("geometry.center", "Center out of range"));
                }
                if !(radius_meters.is_finite() && *radius_meters > 0.0) {
                    errors.push(ValidationError::new("geometry.radiusMeters", "Radius must be positive"));
                }
            }
        }
        errors
    }

    pub fn contains(&self, point: &Coordinates) -> bool {
        match self {
            Geometry::Polygon { vertices } => point_in_polygon(point, vertices),
            Geometry::Circle { center, radius_meters } => haversine_distance_m(center, point) <= *radius_meters,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GeofenceCategory {
    Warehouse,
    Customer,
    Restricted,
    Hazardous,
    Corridor,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeofenceStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub geometry: Geometry,
    pub category: GeofenceCategory,
    pub status: GeofenceStatus,
    pub schedule: Option<ScheduleWindow>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Geofence {
    pub fn is_active(&self) -> bool {
        self.status == GeofenceStatus::Active
    }

    pub fn contains(&self, point: &Coordinates) -> bool {
        self.geometry.contains(point)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceRequest {
    pub name: String,
    pub description: Option<String>,
    pub geometry: Geometry,
    pub category: GeofenceCategory,
    #[serde(default)]
    pub status: GeofenceStatus,
    pub schedule: Option<ScheduleWindow>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl GeofenceRequest {
    /// Checks name, geometry and schedule. Schedule time errors surface as
    /// `ConfigurationError`, everything else as `ValidationFailed`.
    pub fn validate(&self) -> FleetResult<()> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(ValidationError::new("name", "Name is required"));
        }
        if self.name.len() > 100 {
            errors.push(ValidationError::new("name", "Name must be 100 characters or less"));
        }
        errors.extend(self.geometry.validate());
        FleetError::from_validation(errors)?;

        if let Some(schedule) = &self.schedule {
            schedule.compile()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warehouse_circle() -> Geometry {
        Geometry::Circle {
            center: Coordinates::new(5.6037, -0.1870),
            radius_meters: 500.0,
        }
    }

    #[test]
    fn test_circle_contains() {
        let geometry = warehouse_circle();
        assert!(geometry.contains(&Coordinates::new(5.6037, -0.1870)));
        // ~0.003 deg latitude is ~333 m
        assert!(geometry.contains(&Coordinates::new(5.6067, -0.1870)));
        // ~0.01 deg latitude is ~1.1 km
        assert!(!geometry.contains(&Coordinates::new(5.6137, -0.1870)));
    }

    #[test]
    fn test_geometry_validation() {
        assert!(warehouse_circle().validate().is_empty());

        let bad_circle = Geometry::Circle {
            center: Coordinates::new(5.0, 0.0),
            radius_meters: 0.0,
        };
        assert_eq!(bad_circle.validate().len(), 1);

        let two_points = Geometry::Polygon {
            vertices: vec![Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 1.0)],
        };
        assert_eq!(two_points.validate()[0].field, "geometry.vertices");

        let out_of_range = Geometry::Polygon {
            vertices: vec![
                Coordinates::new(0.0, 0.0),
                Coordinates::new(95.0, 1.0),
                Coordinates::new(1.0, 0.0),
            ],
        };
        assert_eq!(out_of_range.validate().len(), 1);
    }

    #[test]
    fn test_geometry_serialization() {
        let json = serde_json::to_value(warehouse_circle()).unwrap();
        assert_eq!(json["type"], "circle");
        assert_eq!(json["radiusMeters"], 500.0);

        let polygon: Geometry = serde_json::from_str(
            r#"{"type":"polygon","vertices":[{"lat":0.0,"lng":0.0},{"lat":0.0,"lng":1.0},{"lat":1.0,"lng":1.0}]}"#,
        )
        .unwrap();
        assert!(matches!(polygon, Geometry::Polygon { ref vertices } if vertices.len() == 3));
    }

    #[test]
    fn test_request_validation() {
        let request = GeofenceRequest {
            name: "  ".to_string(),
            description: None,
            geometry: warehouse_circle(),
            category: GeofenceCategory::Warehouse,
            status: GeofenceStatus::Active,
            schedule: None,
            metadata: HashMap::new(),
        };
        assert!(matches!(request.validate(), Err(FleetError::ValidationFailed(_))));

        let request = GeofenceRequest {
            name: "Tema Depot".to_string(),
            schedule: Some(ScheduleWindow::every_day("8am", "18:00")),
            ..request
        };
        assert!(matches!(request.validate(), Err(FleetError::ConfigurationError(_))));
    }
}
