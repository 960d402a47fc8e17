// src/services/mod.rs
pub mod alert_service;
pub mod document_service;
pub mod geofence_service;
pub mod messaging_service;
pub mod store_service;
pub mod violation_service;
