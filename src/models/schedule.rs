// src/models/schedule.rs
use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Weekday};
use serde::{Deserialize, Serialize, Serializer};

use crate::errors::{FleetError, FleetResult};

/// One day's active range as `"HH:MM"` strings. Either side missing means the
/// day is off.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DayWindow {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DayWindow {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }
}

/// Weekly schedule keyed by weekday.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase", deny_unknown_fields)]
pub struct ScheduleWindow {
    #[serde(default)]
    pub monday: Option<DayWindow>,
    #[serde(default)]
    pub tuesday: Option<DayWindow>,
    #[serde(default)]
    pub wednesday: Option<DayWindow>,
    #[serde(default)]
    pub thursday: Option<DayWindow>,
    #[serde(default)]
    pub friday: Option<DayWindow>,
    #[serde(default)]
    pub saturday: Option<DayWindow>,
    #[serde(default)]
    pub sunday: Option<DayWindow>,
}

impl ScheduleWindow {
    /// Same window on the given days, nothing on the others.
    pub fn on_days(days: &[Weekday], start: &str, end: &str) -> Self {
        let mut schedule = Self::default();
        for day in days {
            *schedule.day_mut(*day) = Some(DayWindow::new(start, end));
        }
        schedule
    }

    pub fn every_day(start: &str, end: &str) -> Self {
        Self::on_days(&ALL_WEEKDAYS, start, end)
    }

    pub fn day(&self, weekday: Weekday) -> Option<&DayWindow> {
        match weekday {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }

    fn day_mut(&mut self, weekday: Weekday) -> &mut Option<DayWindow> {
        match weekday {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        }
    }

    /// Parses every present window. Fails on malformed times or on a window
    /// whose start is not before its end.
    pub fn compile(&self) -> FleetResult<CompiledSchedule> {
        let mut days = [None; 7];
        for weekday in ALL_WEEKDAYS {
            let Some(window) = self.day(weekday) else {
                continue;
            };
            let (Some(start), Some(end)) = (&window.start, &window.end) else {
                continue;
            };

            let start = parse_clock_time(start)?;
            let end = parse_clock_time(end)?;
            if start >= end {
                return Err(FleetError::configuration(format!(
                    "schedule window for {} starts at {} but ends at {}",
                    weekday,
                    start.format("%H:%M"),
                    end.format("%H:%M")
                )));
            }
            days[weekday.num_days_from_monday() as usize] = Some((start, end));
        }
        Ok(CompiledSchedule { days })
    }
}

/// A weekday in a rule's `days` list. Accepts names (`"monday"`, `"Mon"`)
/// or day numbers with 0 = Sunday (7 is also Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawDay")]
pub struct ScheduleDay(pub Weekday);

const SUNDAY_FIRST: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDay {
    Index(u8),
    Name(String),
}

impl TryFrom<RawDay> for ScheduleDay {
    type Error = String;

    fn try_from(raw: RawDay) -> Result<Self, Self::Error> {
        let weekday = match raw {
            RawDay::Index(n @ 0..=7) => SUNDAY_FIRST[usize::from(n % 7)],
            RawDay::Index(n) => return Err(format!("day number {} is out of range 0-7", n)),
            RawDay::Name(name) => name
                .parse::<Weekday>()
                .map_err(|_| format!("unknown weekday '{}'", name))?,
        };
        Ok(ScheduleDay(weekday))
    }
}

impl Serialize for ScheduleDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(weekday_name(self.0))
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// One clock window shared by a set of weekdays, the alert-rule form:
/// `{"days": [...], "startTime": "00:00", "endTime": "23:59"}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DaysSchedule {
    pub days: Vec<ScheduleDay>,
    pub start_time: String,
    pub end_time: String,
}

impl DaysSchedule {
    pub fn to_weekly(&self) -> ScheduleWindow {
        let days: Vec<Weekday> = self.days.iter().map(|day| day.0).collect();
        ScheduleWindow::on_days(&days, &self.start_time, &self.end_time)
    }
}

/// Schedule attached to an alert rule, in either the shared-window or the
/// per-weekday form. Unknown shapes are rejected at deserialization.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RuleSchedule {
    Days(DaysSchedule),
    Weekly(ScheduleWindow),
}

impl RuleSchedule {
    pub fn every_day(start: &str, end: &str) -> Self {
        RuleSchedule::Days(DaysSchedule {
            days: ALL_WEEKDAYS.iter().copied().map(ScheduleDay).collect(),
            start_time: start.to_string(),
            end_time: end.to_string(),
        })
    }

    pub fn compile(&self) -> FleetResult<CompiledSchedule> {
        match self {
            RuleSchedule::Days(days) => days.to_weekly().compile(),
            RuleSchedule::Weekly(weekly) => weekly.compile(),
        }
    }
}

impl From<ScheduleWindow> for RuleSchedule {
    fn from(weekly: ScheduleWindow) -> Self {
        RuleSchedule::Weekly(weekly)
    }
}

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A schedule with its clock times parsed, indexed Monday first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompiledSchedule {
    days: [Option<(NaiveTime, NaiveTime)>; 7],
}

impl CompiledSchedule {
    /// Weekday and clock time are read in `at`'s own timezone.
    pub fn is_active<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        let Some((start, end)) = self.days[at.weekday().num_days_from_monday() as usize] else {
            return false;
        };
        let time_of_day = at.time();
        start <= time_of_day && time_of_day < end
    }

    pub fn is_never_active(&self) -> bool {
        self.days.iter().all(Option::is_none)
    }
}

/// Parses strict `HH:MM` (two digits each, 24h clock).
pub fn parse_clock_time(value: &str) -> FleetResult<NaiveTime> {
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 5
        && bytes[2] == b':'
        && bytes[..2].iter().chain(&bytes[3..]).all(u8::is_ascii_digit);
    if !well_formed {
        return Err(FleetError::configuration(format!(
            "malformed schedule time '{}', expected HH:MM",
            value
        )));
    }

    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| FleetError::configuration(format!("schedule time '{}' is out of range", value)))
}

/// Whether `schedule` is active at `at`. Malformed windows are an error, not
/// an inactive day.
pub fn is_schedule_active<Tz: TimeZone>(schedule: &ScheduleWindow, at: &DateTime<Tz>) -> FleetResult<bool> {
    Ok(schedule.compile()?.is_active(at))
}
