// src/services/messaging_service.rs
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    errors::{FleetError, FleetResult},
    models::{AlertPriority, AlertRule, Recipient, ViolationEvent},
};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Webhook {url} answered {status}")]
    WebhookRejected { url: String, status: u16 },

    #[error("Webhook request failed: {0}")]
    Transport(String),
}

impl From<NotificationError> for FleetError {
    fn from(error: NotificationError) -> Self {
        FleetError::WebhookDelivery(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
    pub priority: NotificationPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum NotificationPriority {
    Normal,
    #[default]
    High,
}

impl From<AlertPriority> for NotificationPriority {
    fn from(priority: AlertPriority) -> Self {
        match priority {
            AlertPriority::Low | AlertPriority::Medium => NotificationPriority::Normal,
            AlertPriority::High | AlertPriority::Critical => NotificationPriority::High,
        }
    }
}

impl NotificationMessage {
    pub fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            data: None,
            priority: NotificationPriority::default(),
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Message announcing that `event` tripped `rule`.
    pub fn for_violation(rule: &AlertRule, event: &ViolationEvent) -> Self {
        let body = match event.dwell_time {
            Some(dwell) => format!(
                "Vehicle {} (driver {}) dwelled {}s in geofence {}",
                event.vehicle_id, event.driver_id, dwell, event.geofence_id
            ),
            None => format!(
                "Vehicle {} (driver {}) {:?} at geofence {}",
                event.vehicle_id, event.driver_id, event.event_type, event.geofence_id
            ),
        };

        Self::new(&format!("[{:?}] {}", rule.priority, rule.name), &body)
            .with_data(json!({
                "type": "geofence_violation",
                "ruleId": rule.id,
                "eventId": event.id,
                "geofenceId": event.geofence_id,
                "vehicleId": event.vehicle_id,
                "driverId": event.driver_id,
                "eventType": event.event_type,
                "dwellTime": event.dwell_time,
                "timestamp": event.timestamp.to_rfc3339(),
                "coordinates": event.coordinates,
            }))
            .with_priority(rule.priority.into())
    }
}

/// Outcome of one recipient send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No channel is configured for this recipient kind.
    Skipped,
}

/// Per-rule fan-out tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryReport {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send_to_recipient(&self, recipient: &Recipient, message: &NotificationMessage) -> FleetResult<Delivery>;

    /// Fans the violation out to every recipient of the rule. Failed
    /// deliveries are logged and counted, never returned as errors.
    async fn notify_violation(&self, rule: &AlertRule, event: &ViolationEvent) -> DeliveryReport {
        let message = NotificationMessage::for_violation(rule, event);
        let results = join_all(
            rule.recipients
                .iter()
                .map(|recipient| self.send_to_recipient(recipient, &message)),
        )
        .await;

        let mut report = DeliveryReport::default();
        for (result, recipient) in results.into_iter().zip(&rule.recipients) {
            match result {
                Ok(Delivery::Sent) => report.sent += 1,
                Ok(Delivery::Skipped) => report.skipped += 1,
                Err(e) => {
                    tracing::error!("Alert {} to {:?} failed: {}", rule.id, recipient, e);
                    report.failed += 1;
                }
            }
        }
        report
    }
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub timeout: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

/// Posts webhooks over HTTP. Email and SMS have no gateway and come back as
/// `Delivery::Skipped`.
pub struct HttpNotificationService {
    client: reqwest::Client,
}

impl HttpNotificationService {
    pub fn new(config: WebhookConfig) -> FleetResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FleetError::InvalidConfiguration(format!("webhook client: {}", e)))?;
        Ok(Self { client })
    }

    async fn post_webhook(&self, url: &str, message: &NotificationMessage) -> Result<(), NotificationError> {
        let payload = json!({
            "deliveryId": uuid::Uuid::new_v4().to_string(),
            "sentAt": Utc::now().to_rfc3339(),
            "title": message.title,
            "body": message.body,
            "priority": match message.priority {
                NotificationPriority::High => "high",
                NotificationPriority::Normal => "normal",
            },
            "data": message.data,
        });

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotificationError::WebhookRejected {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        tracing::debug!("Webhook delivered to {}", url);
        Ok(())
    }
}

#[async_trait]
impl NotificationService for HttpNotificationService {
    async fn send_to_recipient(&self, recipient: &Recipient, message: &NotificationMessage) -> FleetResult<Delivery> {
        match recipient {
            Recipient::Webhook { url } => {
                tracing::info!("Posting alert webhook to {}", url);
                self.post_webhook(url, message).await?;
                Ok(Delivery::Sent)
            }
            Recipient::Email { address } => {
                tracing::debug!("No email gateway configured, skipping alert to {}: {}", address, message.title);
                Ok(Delivery::Skipped)
            }
            Recipient::Sms { phone } => {
                tracing::debug!("No SMS gateway configured, skipping alert to {}: {}", phone, message.title);
                Ok(Delivery::Skipped)
            }
        }
    }
}

// Mock service for development and testing
#[derive(Debug, Default)]
pub struct MockNotificationService {
    sent: Mutex<Vec<(Recipient, NotificationMessage)>>,
}

impl MockNotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<(Recipient, NotificationMessage)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationService for MockNotificationService {
    async fn send_to_recipient(&self, recipient: &Recipient, message: &NotificationMessage) -> FleetResult<Delivery> {
        tracing::info!("[MOCK] Would send to {:?}: {} - {}", recipient, message.title, message.body);
        self.sent.lock().await.push((recipient.clone(), message.clone()));
        Ok(Delivery::Sent)
    }
}
