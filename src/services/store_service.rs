// src/services/store_service.rs
use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::marker::PhantomData;
use tokio::sync::RwLock;

use crate::errors::FleetError;
use crate::models::{AlertRule, Document, Geofence, ViolationEvent};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Operation error: {0}")]
    OperationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<StoreError> for FleetError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::SerializationError(msg) => FleetError::StoreSerialization(msg),
            other => FleetError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Anything the stores can hold: serializable and addressable by id.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: &'static str;

    fn id(&self) -> &str;
}

impl Record for Geofence {
    const KIND: &'static str = "geofence";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for AlertRule {
    const KIND: &'static str = "alert_rule";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for ViolationEvent {
    const KIND: &'static str = "violation";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Document {
    const KIND: &'static str = "document";

    fn id(&self) -> &str {
        &self.id
    }
}

#[async_trait]
pub trait StoreOperations<T: Record>: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<T>, StoreError>;
    async fn list(&self) -> Result<Vec<T>, StoreError>;
    /// Inserts or replaces the record under its id.
    async fn put(&self, record: &T) -> Result<(), StoreError>;
    /// Returns whether a record was removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// Process-local store, used when no Redis URL is configured and in tests.
pub struct MemoryStore<T: Record> {
    records: RwLock<HashMap<String, T>>,
}

impl<T: Record> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Record> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> StoreOperations<T> for MemoryStore<T> {
    async fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn put(&self, record: &T) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.id().to_string(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(id).is_some())
    }
}

/// Redis-backed store. Each record kind lives in one hash, `fleet:{kind}`,
/// field = record id, value = JSON.
pub struct RedisStore<T: Record> {
    connection: redis::aio::MultiplexedConnection,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> RedisStore<T> {
    pub async fn connect(client: &redis::Client) -> Result<Self, StoreError> {
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;
        Ok(Self::with_connection(connection))
    }

    pub fn with_connection(connection: redis::aio::MultiplexedConnection) -> Self {
        Self {
            connection,
            _record: PhantomData,
        }
    }

    fn hash_key() -> String {
        format!("fleet:{}", T::KIND)
    }

    fn decode(json: &str) -> Result<T, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::SerializationError(e.to_string()))
    }
}

#[async_trait]
impl<T: Record> StoreOperations<T> for RedisStore<T> {
    async fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        let mut conn = self.connection.clone();
        let data: Option<String> = conn
            .hget(Self::hash_key(), id)
            .await
            .map_err(|e| StoreError::OperationError(e.to_string()))?;

        data.as_deref().map(Self::decode).transpose()
    }

    async fn list(&self) -> Result<Vec<T>, StoreError> {
        let mut conn = self.connection.clone();
        let values: Vec<String> = conn
            .hvals(Self::hash_key())
            .await
            .map_err(|e| StoreError::OperationError(e.to_string()))?;

        values.iter().map(|json| Self::decode(json)).collect()
    }

    async fn put(&self, record: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(record).map_err(|e| StoreError::SerializationError(e.to_string()))?;
        let mut conn = self.connection.clone();
        let _: () = conn
            .hset(Self::hash_key(), record.id(), json)
            .await
            .map_err(|e| StoreError::OperationError(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        let removed: u64 = conn
            .hdel(Self::hash_key(), id)
            .await
            .map_err(|e| StoreError::OperationError(e.to_string()))?;
        Ok(removed > 0)
    }
}
