// src/state.rs
use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{FleetError, FleetResult};
use crate::models::{AlertRule, Document, Geofence, ViolationEvent};
use crate::services::{
    alert_service::{AlertOperations, AlertService},
    document_service::{DocumentOperations, DocumentService},
    geofence_service::{GeofenceOperations, GeofenceService},
    messaging_service::{HttpNotificationService, MockNotificationService, NotificationService, WebhookConfig},
    store_service::{MemoryStore, RedisStore, StoreOperations},
    violation_service::{ViolationOperations, ViolationService},
};

pub struct AppState {
    pub geofence_service: Arc<dyn GeofenceOperations>,
    pub alert_service: Arc<dyn AlertOperations>,
    pub violation_service: Arc<dyn ViolationOperations>,
    pub document_service: Arc<dyn DocumentOperations>,
    pub config: AppConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Http,
    Mock,
}

impl FromStr for NotifierKind {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(NotifierKind::Http),
            "mock" => Ok(NotifierKind::Mock),
            other => Err(FleetError::InvalidConfiguration(format!(
                "FLEET_NOTIFICATIONS must be 'http' or 'mock', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// In-memory stores when unset.
    pub redis_url: Option<String>,
    pub timezone: FixedOffset,
    pub webhook_timeout: Duration,
    pub notifications: NotifierKind,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            redis_url: None,
            timezone: Utc.fix(),
            webhook_timeout: WebhookConfig::default().timeout,
            notifications: NotifierKind::Mock,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> FleetResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or blank keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> FleetResult<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(addr) = get("FLEET_BIND_ADDR") {
            config.bind_addr = addr;
        }
        config.redis_url = get("FLEET_REDIS_URL");

        if let Some(raw) = get("FLEET_TZ_OFFSET_MINUTES") {
            let minutes: i32 = raw.parse().map_err(|_| {
                FleetError::InvalidConfiguration(format!("FLEET_TZ_OFFSET_MINUTES is not an integer: '{}'", raw))
            })?;
            config.timezone = minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| {
                    FleetError::InvalidConfiguration(format!("FLEET_TZ_OFFSET_MINUTES out of range: {}", minutes))
                })?;
        }

        if let Some(raw) = get("FLEET_WEBHOOK_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                FleetError::InvalidConfiguration(format!("FLEET_WEBHOOK_TIMEOUT_SECS is not a number: '{}'", raw))
            })?;
            config.webhook_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = get("FLEET_NOTIFICATIONS") {
            config.notifications = raw.parse()?;
        }

        Ok(config)
    }
}

struct Stores {
    geofences: Arc<dyn StoreOperations<Geofence>>,
    rules: Arc<dyn StoreOperations<AlertRule>>,
    events: Arc<dyn StoreOperations<ViolationEvent>>,
    documents: Arc<dyn StoreOperations<Document>>,
}

impl Stores {
    fn memory() -> Self {
        Self {
            geofences: Arc::new(MemoryStore::new()),
            rules: Arc::new(MemoryStore::new()),
            events: Arc::new(MemoryStore::new()),
            documents: Arc::new(MemoryStore::new()),
        }
    }

    async fn redis(url: &str) -> FleetResult<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            geofences: Arc::new(RedisStore::connect(&client).await?),
            rules: Arc::new(RedisStore::connect(&client).await?),
            events: Arc::new(RedisStore::connect(&client).await?),
            documents: Arc::new(RedisStore::connect(&client).await?),
        })
    }
}

impl AppState {
    pub async fn new(config: AppConfig) -> FleetResult<Self> {
        let stores = match &config.redis_url {
            Some(url) => {
                tracing::info!("Using Redis stores");
                Stores::redis(url).await?
            }
            None => {
                tracing::warn!("FLEET_REDIS_URL not set, using in-memory stores");
                Stores::memory()
            }
        };

        let notification_service: Arc<dyn NotificationService> = match config.notifications {
            NotifierKind::Http => Arc::new(HttpNotificationService::new(WebhookConfig {
                timeout: config.webhook_timeout,
            })?),
            NotifierKind::Mock => {
                tracing::warn!("FLEET_NOTIFICATIONS not set to http, using mock notification service");
                Arc::new(MockNotificationService::new())
            }
        };

        Ok(Self::assemble(stores, notification_service, config))
    }

    /// In-memory state with the given notifier, for tests and local runs.
    pub fn in_memory(notification_service: Arc<dyn NotificationService>, config: AppConfig) -> Self {
        Self::assemble(Stores::memory(), notification_service, config)
    }

    fn assemble(stores: Stores, notification_service: Arc<dyn NotificationService>, config: AppConfig) -> Self {
        let geofence_service = Arc::new(GeofenceService::new(stores.geofences.clone(), stores.rules.clone()));
        let alert_service = Arc::new(AlertService::new(
            stores.rules,
            stores.geofences,
            notification_service,
            config.timezone,
        ));
        let violation_service = Arc::new(ViolationService::new(
            stores.events,
            alert_service.clone(),
            config.timezone,
        ));
        let document_service = Arc::new(DocumentService::new(stores.documents));

        Self {
            geofence_service,
            alert_service,
            violation_service,
            document_service,
            config,
        }
    }

    /// Current date in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.config.timezone).date_naive()
    }
}
