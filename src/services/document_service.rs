// src/services/document_service.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::{
    errors::FleetError as AppError,
    models::document::{Document, DocumentRequest, DocumentResponse, DocumentStatus},
    services::store_service::StoreOperations,
    utils::id_generator::WithGeneratedId,
};

#[async_trait]
pub trait DocumentOperations: Send + Sync {
    async fn register_document(&self, request: DocumentRequest) -> Result<Document, AppError>;
    async fn get_document(&self, document_id: &str) -> Result<Option<Document>, AppError>;
    async fn list_driver_documents(&self, driver_id: &str, today: NaiveDate) -> Result<Vec<DocumentResponse>, AppError>;
    async fn expiring_documents(&self, today: NaiveDate) -> Result<Vec<DocumentResponse>, AppError>;
}

pub struct DocumentService {
    store: Arc<dyn StoreOperations<Document>>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn StoreOperations<Document>>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DocumentOperations for DocumentService {
    async fn register_document(&self, request: DocumentRequest) -> Result<Document, AppError> {
        request.validate()?;

        let document = Document {
            id: String::new(),
            driver_id: request.driver_id,
            document_type: request.document_type,
            number: request.number,
            issued_date: request.issued_date,
            expiry_date: request.expiry_date,
            status: request.status,
        }
        .with_generated_id();

        self.store.put(&document).await?;
        tracing::info!(
            "Registered {:?} {} for driver {} (expires {})",
            document.document_type,
            document.id,
            document.driver_id,
            document.expiry_date
        );
        Ok(document)
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Document>, AppError> {
        Ok(self.store.get(document_id).await?)
    }

    async fn list_driver_documents(&self, driver_id: &str, today: NaiveDate) -> Result<Vec<DocumentResponse>, AppError> {
        tracing::debug!("Listing documents for driver {}", driver_id);
        let mut documents: Vec<Document> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|document| document.driver_id == driver_id)
            .collect();
        documents.sort_by_key(|document| document.expiry_date);

        Ok(documents
            .into_iter()
            .map(|document| DocumentResponse::new(document, today))
            .collect())
    }

    async fn expiring_documents(&self, today: NaiveDate) -> Result<Vec<DocumentResponse>, AppError> {
        let mut flagged: Vec<DocumentResponse> = self
            .store
            .list()
            .await?
            .into_iter()
            .map(|document| DocumentResponse::new(document, today))
            .filter(|response| response.effective_status != DocumentStatus::Valid)
            .collect();
        flagged.sort_by_key(|response| response.days_until_expiry);
        Ok(flagged)
    }
}
