use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for the fleet-sentinel service
#[derive(Debug)]
pub enum FleetError {
    // Storage errors
    StoreUnavailable(String),
    StoreSerialization(String),

    // Outbound notification errors
    WebhookDelivery(String),

    // Business logic errors
    GeofenceNotFound(String),
    RuleNotFound(String),
    EventNotFound(String),
    DocumentNotFound(String),
    AlreadyAcknowledged(String),
    InvalidArgument(String),

    // Validation errors
    ValidationFailed(Vec<ValidationError>),

    // Configuration and setup errors
    ConfigurationError(String),
    InvalidConfiguration(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl fmt::Display for FleetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FleetError::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
            FleetError::StoreSerialization(msg) => write!(f, "Store serialization error: {}", msg),

            FleetError::WebhookDelivery(msg) => write!(f, "Webhook delivery failed: {}", msg),

            FleetError::GeofenceNotFound(id) => write!(f, "Geofence not found: {}", id),
            FleetError::RuleNotFound(id) => write!(f, "Alert rule not found: {}", id),
            FleetError::EventNotFound(id) => write!(f, "Violation event not found: {}", id),
            FleetError::DocumentNotFound(id) => write!(f, "Document not found: {}", id),
            FleetError::AlreadyAcknowledged(id) => write!(f, "Violation event already acknowledged: {}", id),
            FleetError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),

            FleetError::ValidationFailed(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }

            FleetError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            FleetError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for FleetError {}

impl IntoResponse for FleetError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            FleetError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, "invalid_argument", msg, None),
            FleetError::ConfigurationError(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "configuration_error", msg, None)
            }

            FleetError::ValidationFailed(errors) => {
                let details = serde_json::to_value(&errors).ok();
                (StatusCode::BAD_REQUEST, "validation_failed", "Validation errors occurred".to_string(), details)
            }

            FleetError::GeofenceNotFound(id) => {
                (StatusCode::NOT_FOUND, "geofence_not_found", format!("Geofence not found: {}", id), None)
            }
            FleetError::RuleNotFound(id) => {
                (StatusCode::NOT_FOUND, "rule_not_found", format!("Alert rule not found: {}", id), None)
            }
            FleetError::EventNotFound(id) => {
                (StatusCode::NOT_FOUND, "event_not_found", format!("Violation event not found: {}", id), None)
            }
            FleetError::DocumentNotFound(id) => {
                (StatusCode::NOT_FOUND, "document_not_found", format!("Document not found: {}", id), None)
            }
            FleetError::AlreadyAcknowledged(id) => (
                StatusCode::CONFLICT,
                "already_acknowledged",
                format!("Violation event already acknowledged: {}", id),
                None,
            ),

            FleetError::StoreUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg, None),

            // Store decoding, webhook and startup configuration failures
            other => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", other.to_string(), None),
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, axum::Json(error_response)).into_response()
    }
}

// Convenience type alias for Results
pub type FleetResult<T> = Result<T, FleetError>;

impl From<redis::RedisError> for FleetError {
    fn from(err: redis::RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::IoError => FleetError::StoreUnavailable(err.to_string()),
            redis::ErrorKind::AuthenticationFailed => FleetError::StoreUnavailable("Authentication failed".to_string()),
            _ => FleetError::StoreUnavailable(err.to_string()),
        }
    }
}

// Helper functions for creating common errors
impl FleetError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        FleetError::ConfigurationError(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        FleetError::InvalidArgument(msg.into())
    }

    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        FleetError::ValidationFailed(vec![ValidationError {
            field: field.into(),
            message: message.into(),
        }])
    }

    /// Turns collected field errors into `Ok(())` when empty, `ValidationFailed` otherwise.
    pub fn from_validation(errors: Vec<ValidationError>) -> FleetResult<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FleetError::ValidationFailed(errors))
        }
    }

    pub fn geofence_not_found(geofence_id: impl Into<String>) -> Self {
        FleetError::GeofenceNotFound(geofence_id.into())
    }

    pub fn rule_not_found(rule_id: impl Into<String>) -> Self {
        FleetError::RuleNotFound(rule_id.into())
    }

    pub fn event_not_found(event_id: impl Into<String>) -> Self {
        FleetError::EventNotFound(event_id.into())
    }

    pub fn document_not_found(document_id: impl Into<String>) -> Self {
        FleetError::DocumentNotFound(document_id.into())
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
