// src/models/alert.rs
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{FleetError, FleetResult};
use crate::models::schedule::{CompiledSchedule, RuleSchedule};
use crate::models::violation::{ViolationEvent, ViolationType};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
}

/// Who gets told when a rule fires.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Recipient {
    Email { address: String },
    Sms { phone: String },
    Webhook { url: String },
}

impl Recipient {
    fn validate(&self) -> FleetResult<()> {
        match self {
            Recipient::Email { address } => {
                let valid = address
                    .split_once('@')
                    .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
                if !valid {
                    return Err(FleetError::configuration(format!("invalid email recipient '{}'", address)));
                }
            }
            Recipient::Sms { phone } => {
                let digits = phone.chars().filter(char::is_ascii_digit).count();
                let allowed = phone.chars().all(|c| c.is_ascii_digit() || "+- ()".contains(c));
                if digits < 7 || !allowed {
                    return Err(FleetError::configuration(format!("invalid sms recipient '{}'", phone)));
                }
            }
            Recipient::Webhook { url } => {
                let parsed = reqwest::Url::parse(url)
                    .map_err(|e| FleetError::configuration(format!("invalid webhook url '{}': {}", url, e)))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(FleetError::configuration(format!("webhook url '{}' must be http or https", url)));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    pub geofence_id: String,
    pub trigger_on: ViolationType,
    /// Seconds; required for dwell rules.
    pub dwell_threshold: Option<u64>,
    /// `None` means the rule is always in effect.
    pub schedule: Option<RuleSchedule>,
    #[serde(default)]
    pub recipients: Vec<Recipient>,
    pub priority: AlertPriority,
    #[serde(default)]
    pub status: RuleStatus,
    pub created_at: DateTime<Utc>,
}

impl AlertRule {
    /// Checks the rule's configuration and returns it ready for evaluation.
    pub fn validate(&self) -> FleetResult<ArmedRule> {
        if self.name.trim().is_empty() {
            return Err(FleetError::validation_error("name", "Rule name is required"));
        }
        if self.geofence_id.trim().is_empty() {
            return Err(FleetError::validation_error("geofenceId", "Geofence reference is required"));
        }

        let dwell_threshold = match (self.trigger_on, self.dwell_threshold) {
            (ViolationType::Dwell, None) => {
                return Err(FleetError::configuration(format!(
                    "dwell rule '{}' has no dwell threshold",
                    self.name
                )));
            }
            (ViolationType::Dwell, Some(threshold)) => Some(threshold),
            // Thresholds mean nothing on entry/exit rules
            _ => None,
        };

        let schedule = self.schedule.as_ref().map(RuleSchedule::compile).transpose()?;

        for recipient in &self.recipients {
            recipient.validate()?;
        }

        Ok(ArmedRule {
            rule: self.clone(),
            schedule,
            dwell_threshold,
        })
    }
}

/// A rule that passed validation, with its schedule parsed.
#[derive(Debug, Clone)]
pub struct ArmedRule {
    rule: AlertRule,
    schedule: Option<CompiledSchedule>,
    dwell_threshold: Option<u64>,
}

impl ArmedRule {
    pub fn rule(&self) -> &AlertRule {
        &self.rule
    }

    pub fn into_rule(self) -> AlertRule {
        self.rule
    }

    pub fn is_schedule_active<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        self.schedule.as_ref().is_none_or(|schedule| schedule.is_active(at))
    }
}

/// Whether `event` trips `rule`, with the schedule read in UTC.
pub fn is_violation(rule: &ArmedRule, event: &ViolationEvent) -> bool {
    is_violation_in(rule, event, &Utc)
}

/// Whether `event` trips `rule`, with the schedule read in `tz`.
pub fn is_violation_in<Tz: TimeZone>(rule: &ArmedRule, event: &ViolationEvent, tz: &Tz) -> bool {
    let config = rule.rule();
    if config.status != RuleStatus::Active
        || config.geofence_id != event.geofence_id
        || config.trigger_on != event.event_type
    {
        return false;
    }

    if !rule.is_schedule_active(&event.timestamp.with_timezone(tz)) {
        return false;
    }

    match event.event_type {
        ViolationType::Entry | ViolationType::Exit => true,
        ViolationType::Dwell => match (event.dwell_time, rule.dwell_threshold) {
            (Some(dwell), Some(threshold)) => dwell >= threshold,
            _ => false,
        },
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AlertRuleRequest {
    pub name: String,
    pub geofence_id: String,
    pub trigger_on: ViolationType,
    pub dwell_threshold: Option<u64>,
    pub schedule: Option<RuleSchedule>,
    #[serde(default)]
    pub recipients: Vec<Recipient>,
    pub priority: AlertPriority,
    #[serde(default)]
    pub status: RuleStatus,
}

impl From<AlertRuleRequest> for AlertRule {
    fn from(request: AlertRuleRequest) -> Self {
        Self {
            id: String::new(),
            name: request.name,
            geofence_id: request.geofence_id,
            trigger_on: request.trigger_on,
            dwell_threshold: request.dwell_threshold,
            schedule: request.schedule,
            recipients: request.recipients,
            priority: request.priority,
            status: request.status,
            created_at: Utc::now(),
        }
    }
}

/// A rule that fired for an event.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AlertMatch {
    pub rule_id: String,
    pub rule_name: String,
    pub priority: AlertPriority,
    pub event_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geofence::Coordinates;
    use crate::models::schedule::ScheduleWindow;
    use chrono::{FixedOffset, Weekday};

    fn ts(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    fn rule(trigger_on: ViolationType, dwell_threshold: Option<u64>) -> AlertRule {
        AlertRule {
            id: "rule-002".to_string(),
            name: "Restricted zone entry".to_string(),
            geofence_id: "geo-003".to_string(),
            trigger_on,
            dwell_threshold,
            schedule: Some(RuleSchedule::every_day("00:00", "23:59")),
            recipients: vec![Recipient::Email {
                address: "ops@fleet.example".to_string(),
            }],
            priority: AlertPriority::High,
            status: RuleStatus::Active,
            created_at: ts("2025-04-01T00:00:00Z"),
        }
    }

    fn event(event_type: ViolationType, dwell_time: Option<u64>) -> ViolationEvent {
        ViolationEvent {
            id: "vio-250415-abc12".to_string(),
            geofence_id: "geo-003".to_string(),
            vehicle_id: "veh-001".to_string(),
            driver_id: "drv-001".to_string(),
            event_type,
            timestamp: ts("2025-04-15T14:30:00Z"),
            coordinates: Coordinates::new(5.6037, -0.1870),
            dwell_time,
            acknowledged: false,
            acknowledged_by: None,
            acknowledged_at: None,
        }
    }

    #[test]
    fn test_restricted_entry_scenario() {
        let armed = rule(ViolationType::Entry, None).validate().unwrap();
        assert!(is_violation(&armed, &event(ViolationType::Entry, None)));
    }

    #[test]
    fn test_restricted_entry_scenario_from_json() {
        let rule: AlertRule = serde_json::from_str(
            r#"{
                "id": "rule-002",
                "name": "Restricted zone entry",
                "geofenceId": "geo-003",
                "triggerOn": "entry",
                "schedule": {
                    "days": ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"],
                    "startTime": "00:00",
                    "endTime": "23:59"
                },
                "recipients": [{ "type": "email", "address": "ops@fleet.example" }],
                "priority": "high",
                "status": "active",
                "createdAt": "2025-04-01T00:00:00Z"
            }"#,
        )
        .unwrap();
        assert!(matches!(rule.schedule, Some(RuleSchedule::Days(_))));

        let armed = rule.validate().unwrap();
        assert!(is_violation(&armed, &event(ViolationType::Entry, None)));
    }

    #[test]
    fn test_rule_schedule_shape_is_checked() {
        let weekly = r#"{
            "name": "Depot hours",
            "geofenceId": "geo-003",
            "triggerOn": "exit",
            "schedule": { "tuesday": { "start": "08:00", "end": "18:00" } },
            "priority": "low"
        }"#;
        let request: AlertRuleRequest = serde_json::from_str(weekly).unwrap();
        assert_eq!(
            request.schedule,
            Some(RuleSchedule::Weekly(ScheduleWindow::on_days(&[Weekday::Tue], "08:00", "18:00")))
        );

        let unknown = r#"{
            "name": "Depot hours",
            "geofenceId": "geo-003",
            "triggerOn": "exit",
            "schedule": { "weekdays": "mon-fri", "from": "08:00" },
            "priority": "low"
        }"#;
        assert!(serde_json::from_str::<AlertRuleRequest>(unknown).is_err());
    }

    #[test]
    fn test_trigger_type_must_match() {
        let armed = rule(ViolationType::Entry, None).validate().unwrap();
        assert!(!is_violation(&armed, &event(ViolationType::Exit, None)));
    }

    #[test]
    fn test_other_geofence_does_not_match() {
        let armed = rule(ViolationType::Entry, None).validate().unwrap();
        let mut other = event(ViolationType::Entry, None);
        other.geofence_id = "geo-004".to_string();
        assert!(!is_violation(&armed, &other));
    }

    #[test]
    fn test_dwell_threshold_inclusive() {
        let armed = rule(ViolationType::Dwell, Some(900)).validate().unwrap();
        assert!(is_violation(&armed, &event(ViolationType::Dwell, Some(900))));
        assert!(is_violation(&armed, &event(ViolationType::Dwell, Some(3600))));
        assert!(!is_violation(&armed, &event(ViolationType::Dwell, Some(899))));
        assert!(!is_violation(&armed, &event(ViolationType::Dwell, None)));
    }

    #[test]
    fn test_dwell_rule_without_threshold_fails_validation() {
        assert!(matches!(
            rule(ViolationType::Dwell, None).validate(),
            Err(FleetError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_malformed_schedule_fails_validation() {
        let mut bad = rule(ViolationType::Entry, None);
        bad.schedule = Some(RuleSchedule::every_day("25:00", "23:59"));
        assert!(matches!(bad.validate(), Err(FleetError::ConfigurationError(_))));
    }

    #[test]
    fn test_outside_schedule_does_not_match() {
        let mut night_only = rule(ViolationType::Entry, None);
        night_only.schedule = Some(RuleSchedule::every_day("22:00", "23:59"));
        let armed = night_only.validate().unwrap();
        assert!(!is_violation(&armed, &event(ViolationType::Entry, None)));

        // 14:30 UTC is 22:30 at UTC+8
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        assert!(is_violation_in(&armed, &event(ViolationType::Entry, None), &tz));
    }

    #[test]
    fn test_no_schedule_is_always_active() {
        let mut always = rule(ViolationType::Exit, None);
        always.schedule = None;
        let armed = always.validate().unwrap();
        assert!(is_violation(&armed, &event(ViolationType::Exit, None)));
    }

    #[test]
    fn test_inactive_rule_never_fires() {
        let mut inactive = rule(ViolationType::Entry, None);
        inactive.status = RuleStatus::Inactive;
        let armed = inactive.validate().unwrap();
        assert!(!is_violation(&armed, &event(ViolationType::Entry, None)));
    }

    #[test]
    fn test_recipient_validation() {
        let mut bad = rule(ViolationType::Entry, None);
        bad.recipients = vec![Recipient::Webhook {
            url: "ftp://hooks.example/alerts".to_string(),
        }];
        assert!(matches!(bad.validate(), Err(FleetError::ConfigurationError(_))));

        bad.recipients = vec![Recipient::Email {
            address: "not-an-email".to_string(),
        }];
        assert!(bad.validate().is_err());

        bad.recipients = vec![
            Recipient::Sms {
                phone: "+233 24 555 0100".to_string(),
            },
            Recipient::Webhook {
                url: "https://hooks.example/alerts".to_string(),
            },
        ];
        assert!(bad.validate().is_ok());
    }

    #[test]
    fn test_recipient_wire_format() {
        let recipient: Recipient =
            serde_json::from_str(r#"{"type":"sms","phone":"+233245550100"}"#).unwrap();
        assert_eq!(
            recipient,
            Recipient::Sms {
                phone: "+233245550100".to_string()
            }
        );
    }
}
