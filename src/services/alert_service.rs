// src/services/alert_service.rs
use async_trait::async_trait;
use chrono::FixedOffset;
use std::sync::Arc;

use crate::{
    errors::FleetError as AppError,
    models::{
        alert::{is_violation_in, AlertMatch, AlertRule, AlertRuleRequest, ArmedRule, RuleStatus},
        geofence::Geofence,
        schedule::is_schedule_active,
        violation::ViolationEvent,
    },
    services::{messaging_service::NotificationService, store_service::StoreOperations},
    utils::id_generator::WithGeneratedId,
};

#[async_trait]
pub trait AlertOperations: Send + Sync {
    async fn create_rule(&self, request: AlertRuleRequest) -> Result<AlertRule, AppError>;
    async fn get_rule(&self, rule_id: &str) -> Result<Option<AlertRule>, AppError>;
    async fn list_rules(&self, geofence_id: Option<&str>) -> Result<Vec<AlertRule>, AppError>;
    async fn set_rule_status(&self, rule_id: &str, status: RuleStatus) -> Result<AlertRule, AppError>;
    async fn delete_rule(&self, rule_id: &str) -> Result<(), AppError>;
    /// Rules tripped by `event`; their recipients are notified before returning.
    async fn evaluate_event(&self, event: &ViolationEvent) -> Result<Vec<AlertMatch>, AppError>;
}

pub struct AlertService {
    rules: Arc<dyn StoreOperations<AlertRule>>,
    geofences: Arc<dyn StoreOperations<Geofence>>,
    notification_service: Arc<dyn NotificationService>,
    timezone: FixedOffset,
}

impl AlertService {
    pub fn new(
        rules: Arc<dyn StoreOperations<AlertRule>>,
        geofences: Arc<dyn StoreOperations<Geofence>>,
        notification_service: Arc<dyn NotificationService>,
        timezone: FixedOffset,
    ) -> Self {
        Self {
            rules,
            geofences,
            notification_service,
            timezone,
        }
    }

    async fn armed_rules_for(&self, geofence_id: &str) -> Result<Vec<ArmedRule>, AppError> {
        let rules = self.list_rules(Some(geofence_id)).await?;
        let mut armed = Vec::with_capacity(rules.len());
        for rule in rules {
            // Stored rules were validated on the way in; anything that fails
            // now was written by another process.
            match rule.validate() {
                Ok(rule) => armed.push(rule),
                Err(e) => tracing::warn!("Skipping rule {}: {}", rule.id, e),
            }
        }
        Ok(armed)
    }

    /// Whether the event's geofence exists, is active, and is inside its own
    /// schedule at the event time.
    async fn geofence_is_watching(&self, event: &ViolationEvent) -> Result<bool, AppError> {
        let Some(geofence) = self.geofences.get(&event.geofence_id).await? else {
            tracing::debug!("Event {} names unknown geofence {}", event.id, event.geofence_id);
            return Ok(false);
        };
        if !geofence.is_active() {
            tracing::debug!("Geofence {} is inactive, skipping event {}", geofence.id, event.id);
            return Ok(false);
        }

        let Some(window) = &geofence.schedule else {
            return Ok(true);
        };
        match is_schedule_active(window, &event.timestamp.with_timezone(&self.timezone)) {
            Ok(true) => Ok(true),
            Ok(false) => {
                tracing::debug!("Geofence {} is off schedule at {}", geofence.id, event.timestamp);
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("Geofence {} has an unusable schedule: {}", geofence.id, e);
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl AlertOperations for AlertService {
    async fn create_rule(&self, request: AlertRuleRequest) -> Result<AlertRule, AppError> {
        tracing::info!("Creating alert rule '{}' for geofence {}", request.name, request.geofence_id);

        let armed = AlertRule::from(request).validate().inspect_err(|e| {
            tracing::warn!("Rejected alert rule: {}", e);
        })?;

        if self.geofences.get(&armed.rule().geofence_id).await?.is_none() {
            return Err(AppError::geofence_not_found(&armed.rule().geofence_id));
        }

        let rule = armed.into_rule().with_generated_id();
        self.rules.put(&rule).await?;

        tracing::info!("Alert rule created: {} ({:?} on {:?})", rule.id, rule.priority, rule.trigger_on);
        Ok(rule)
    }

    async fn get_rule(&self, rule_id: &str) -> Result<Option<AlertRule>, AppError> {
        tracing::debug!("Getting alert rule: {}", rule_id);
        Ok(self.rules.get(rule_id).await?)
    }

    async fn list_rules(&self, geofence_id: Option<&str>) -> Result<Vec<AlertRule>, AppError> {
        let mut rules: Vec<AlertRule> = self
            .rules
            .list()
            .await?
            .into_iter()
            .filter(|rule| geofence_id.is_none_or(|id| rule.geofence_id == id))
            .collect();
        rules.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rules)
    }

    async fn set_rule_status(&self, rule_id: &str, status: RuleStatus) -> Result<AlertRule, AppError> {
        let mut rule = self
            .rules
            .get(rule_id)
            .await?
            .ok_or_else(|| AppError::rule_not_found(rule_id))?;

        tracing::info!("Alert rule {} status {:?} -> {:?}", rule_id, rule.status, status);
        rule.status = status;
        self.rules.put(&rule).await?;
        Ok(rule)
    }

    async fn delete_rule(&self, rule_id: &str) -> Result<(), AppError> {
        if !self.rules.delete(rule_id).await? {
            return Err(AppError::rule_not_found(rule_id));
        }
        tracing::info!("Alert rule deleted: {}", rule_id);
        Ok(())
    }

    async fn evaluate_event(&self, event: &ViolationEvent) -> Result<Vec<AlertMatch>, AppError> {
        if !self.geofence_is_watching(event).await? {
            return Ok(vec![]);
        }

        let rules = self.armed_rules_for(&event.geofence_id).await?;
        let mut matches = Vec::new();

        for armed in rules.iter().filter(|armed| is_violation_in(armed, event, &self.timezone)) {
            let rule = armed.rule();
            tracing::info!("Event {} tripped rule {} ({:?})", event.id, rule.id, rule.priority);

            let report = self.notification_service.notify_violation(rule, event).await;
            if report.failed > 0 {
                tracing::warn!(
                    "Rule {}: {}/{} notifications failed",
                    rule.id,
                    report.failed,
                    rule.recipients.len()
                );
            }
            if report.skipped > 0 {
                tracing::debug!("Rule {}: {} recipients had no delivery channel", rule.id, report.skipped);
            }

            matches.push(AlertMatch {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                priority: rule.priority,
                event_id: event.id.clone(),
            });
        }

        // Most urgent first
        matches.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(matches)
    }
}
