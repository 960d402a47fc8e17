pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use errors::{FleetError, FleetResult, ValidationError};
pub use models::{aggregate_report, classify_document_status, is_schedule_active, is_violation};
