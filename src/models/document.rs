// src/models/document.rs
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{FleetError, FleetResult, ValidationError};

/// Documents expiring within this many days are flagged as expiring.
pub const EXPIRING_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Valid,
    Expiring,
    Expired,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    DriversLicense,
    MedicalCertificate,
    VehicleRegistration,
    Insurance,
    HazmatEndorsement,
    Other,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub driver_id: String,
    pub document_type: DocumentType,
    pub number: String,
    pub issued_date: NaiveDate,
    pub expiry_date: NaiveDate,
    /// Explicit override; derived from `expiry_date` when absent.
    pub status: Option<DocumentStatus>,
}

impl Document {
    pub fn effective_status(&self, today: NaiveDate) -> DocumentStatus {
        self.status
            .unwrap_or_else(|| classify_document_status(self.expiry_date, today))
    }
}

/// Classifies a document by its expiry date.
///
/// Same-day expiry counts as `Valid`: only a strictly positive number of days
/// left falls in the expiring window.
pub fn classify_document_status(expiry_date: NaiveDate, today: NaiveDate) -> DocumentStatus {
    let days_left = expiry_date.signed_duration_since(today).num_days();
    if days_left < 0 {
        DocumentStatus::Expired
    } else if days_left > 0 && days_left <= EXPIRING_WINDOW_DAYS {
        DocumentStatus::Expiring
    } else {
        DocumentStatus::Valid
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    pub driver_id: String,
    pub document_type: DocumentType,
    pub number: String,
    pub issued_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub status: Option<DocumentStatus>,
}

impl DocumentRequest {
    pub fn validate(&self) -> FleetResult<()> {
        let mut errors = Vec::new();
        if self.driver_id.trim().is_empty() {
            errors.push(ValidationError::new("driverId", "Driver ID is required"));
        }
        if self.number.trim().is_empty() {
            errors.push(ValidationError::new("number", "Document number is required"));
        }
        if self.expiry_date < self.issued_date {
            errors.push(ValidationError::new("expiryDate", "Expiry date precedes issue date"));
        }
        FleetError::from_validation(errors)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    #[serde(flatten)]
    pub document: Document,
    pub effective_status: DocumentStatus,
    pub days_until_expiry: i64,
}

impl DocumentResponse {
    pub fn new(document: Document, today: NaiveDate) -> Self {
        let effective_status = document.effective_status(today);
        let days_until_expiry = document.expiry_date.signed_duration_since(today).num_days();
        Self {
            document,
            effective_status,
            days_until_expiry,
        }
    }

    pub fn today(document: Document) -> Self {
        Self::new(document, Utc::now().date_naive())
    }
}
