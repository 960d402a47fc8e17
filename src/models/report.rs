// src/models/report.rs
use chrono::{Datelike, Duration, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::FleetError;
use crate::models::violation::{ViolationEvent, ViolationType};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GroupKey {
    Vehicle,
    Driver,
    Geofence,
    Day,
    Week,
    Month,
}

impl GroupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::Vehicle => "vehicle",
            GroupKey::Driver => "driver",
            GroupKey::Geofence => "geofence",
            GroupKey::Day => "day",
            GroupKey::Week => "week",
            GroupKey::Month => "month",
        }
    }

    /// Row key for `event`. Time buckets are cut in `tz`; weeks start on Monday
    /// and are keyed by that Monday's date.
    fn key_for<Tz: TimeZone>(&self, event: &ViolationEvent, tz: &Tz) -> String {
        match self {
            GroupKey::Vehicle => event.vehicle_id.clone(),
            GroupKey::Driver => event.driver_id.clone(),
            GroupKey::Geofence => event.geofence_id.clone(),
            GroupKey::Day => event.timestamp.with_timezone(tz).date_naive().format("%Y-%m-%d").to_string(),
            GroupKey::Week => {
                let date = event.timestamp.with_timezone(tz).date_naive();
                let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
                monday.format("%Y-%m-%d").to_string()
            }
            GroupKey::Month => event.timestamp.with_timezone(tz).date_naive().format("%Y-%m").to_string(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GroupKey {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vehicle" => Ok(GroupKey::Vehicle),
            "driver" => Ok(GroupKey::Driver),
            "geofence" => Ok(GroupKey::Geofence),
            "day" => Ok(GroupKey::Day),
            "week" => Ok(GroupKey::Week),
            "month" => Ok(GroupKey::Month),
            other => Err(FleetError::invalid_argument(format!(
                "unknown groupBy key '{}', expected one of vehicle, driver, geofence, day, week, month",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub key: String,
    pub entries: u64,
    pub exits: u64,
    pub dwell_events: u64,
    pub total_events: u64,
    pub total_dwell_seconds: u64,
    pub average_dwell_seconds: f64,
}

impl ReportRow {
    fn new(key: String) -> Self {
        Self {
            key,
            entries: 0,
            exits: 0,
            dwell_events: 0,
            total_events: 0,
            total_dwell_seconds: 0,
            average_dwell_seconds: 0.0,
        }
    }

    fn record(&mut self, event: &ViolationEvent) {
        self.total_events += 1;
        match event.event_type {
            ViolationType::Entry => self.entries += 1,
            ViolationType::Exit => self.exits += 1,
            ViolationType::Dwell => {
                self.dwell_events += 1;
                // Caps at u64::MAX rather than wrapping
                self.total_dwell_seconds = self.total_dwell_seconds.saturating_add(event.dwell_time.unwrap_or(0));
            }
        }
    }

    fn finish(&mut self) {
        self.average_dwell_seconds = if self.dwell_events == 0 {
            0.0
        } else {
            self.total_dwell_seconds as f64 / self.dwell_events as f64
        };
    }
}

/// Violation report with a summary header, as served to the dashboard.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ViolationReport {
    pub group_by: GroupKey,
    pub utc_offset_minutes: i32,
    pub total_events: u64,
    pub rows: Vec<ReportRow>,
}

/// Groups events by `group_by`, cutting time buckets in UTC.
pub fn aggregate_report(events: &[ViolationEvent], group_by: GroupKey) -> Vec<ReportRow> {
    aggregate_report_in(events, group_by, &Utc)
}

/// Groups events by `group_by`. Rows come out in first-seen key order.
pub fn aggregate_report_in<Tz: TimeZone>(events: &[ViolationEvent], group_by: GroupKey, tz: &Tz) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for event in events {
        let key = group_by.key_for(event, tz);
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                index.insert(key.clone(), rows.len());
                rows.push(ReportRow::new(key));
                rows.len() - 1
            }
        };
        rows[slot].record(event);
    }

    rows.iter_mut().for_each(ReportRow::finish);
    rows
}

pub fn build_report(events: &[ViolationEvent], group_by: GroupKey, tz: &FixedOffset) -> ViolationReport {
    let rows = aggregate_report_in(events, group_by, tz);
    ViolationReport {
        group_by,
        utc_offset_minutes: tz.local_minus_utc() / 60,
        total_events: rows.iter().map(|row| row.total_events).sum(),
        rows,
    }
}
