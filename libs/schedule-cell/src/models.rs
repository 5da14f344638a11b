// libs/schedule-cell/src/models.rs
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

// ==============================================================================
// WEEKDAYS AND SLOT TIMES
// ==============================================================================

/// Canonical weekday names, independent of any locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn from_date(date: NaiveDate) -> Self {
        date.weekday().into()
    }

    /// Weekday of the calendar date the timestamp was written in; the
    /// time-of-day component never shifts the result.
    pub fn from_datetime<Tz: TimeZone>(moment: &DateTime<Tz>) -> Self {
        Self::from_date(moment.date_naive())
    }

    fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bookable start time with minute precision, written `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotTime(NaiveTime);

impl SlotTime {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(SlotTime)
    }
}

impl From<NaiveTime> for SlotTime {
    fn from(time: NaiveTime) -> Self {
        // seconds and below are dropped
        SlotTime(NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time))
    }
}

impl FromStr for SlotTime {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f"))
            .map(SlotTime::from)
            .map_err(|_| format!("invalid time {:?}, expected HH:MM", value))
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Clinic-wide start times offered when a specialist has no template for a specialty.
pub const BASE_SCHEDULE_HOURS: [(u32, u32); 7] = [
    (8, 0),
    (9, 0),
    (10, 0),
    (11, 0),
    (14, 0),
    (15, 0),
    (16, 0),
];

pub fn base_schedule() -> Vec<SlotTime> {
    BASE_SCHEDULE_HOURS
        .iter()
        .filter_map(|&(h, m)| SlotTime::from_hm(h, m))
        .collect()
}

/// Parse a calendar date, accepting `YYYY-MM-DD` or a full timestamp. Timestamps
/// keep the date they were written in; the time-of-day is discarded.
pub fn parse_calendar_date(value: &str) -> Result<NaiveDate, String> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .map_err(|_| format!("invalid date {:?}, expected YYYY-MM-DD", value))
}

// ==============================================================================
// WEEKLY AVAILABILITY TEMPLATE
// ==============================================================================

/// Per-weekday bookable start times. All seven days are always present;
/// each day's times are unique and ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WeekDays", into = "WeekDays")]
pub struct WeeklyAvailability {
    days: [BTreeSet<SlotTime>; 7],
}

impl WeeklyAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn times(&self, day: DayOfWeek) -> &BTreeSet<SlotTime> {
        &self.days[day.index()]
    }

    pub fn set_times<I>(&mut self, day: DayOfWeek, times: I)
    where
        I: IntoIterator<Item = SlotTime>,
    {
        self.days[day.index()] = times.into_iter().collect();
    }

    pub fn with_times<I>(mut self, day: DayOfWeek, times: I) -> Self
    where
        I: IntoIterator<Item = SlotTime>,
    {
        self.set_times(day, times);
        self
    }
}

/// Wire/storage shape: every weekday key, missing ones read as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct WeekDays {
    monday: Vec<SlotTime>,
    tuesday: Vec<SlotTime>,
    wednesday: Vec<SlotTime>,
    thursday: Vec<SlotTime>,
    friday: Vec<SlotTime>,
    saturday: Vec<SlotTime>,
    sunday: Vec<SlotTime>,
}

impl From<WeekDays> for WeeklyAvailability {
    fn from(w: WeekDays) -> Self {
        WeeklyAvailability::new()
            .with_times(DayOfWeek::Monday, w.monday)
            .with_times(DayOfWeek::Tuesday, w.tuesday)
            .with_times(DayOfWeek::Wednesday, w.wednesday)
            .with_times(DayOfWeek::Thursday, w.thursday)
            .with_times(DayOfWeek::Friday, w.friday)
            .with_times(DayOfWeek::Saturday, w.saturday)
            .with_times(DayOfWeek::Sunday, w.sunday)
    }
}

impl From<WeeklyAvailability> for WeekDays {
    fn from(a: WeeklyAvailability) -> Self {
        let day = |d: DayOfWeek| a.times(d).iter().copied().collect::<Vec<_>>();
        WeekDays {
            monday: day(DayOfWeek::Monday),
            tuesday: day(DayOfWeek::Tuesday),
            wednesday: day(DayOfWeek::Wednesday),
            thursday: day(DayOfWeek::Thursday),
            friday: day(DayOfWeek::Friday),
            saturday: day(DayOfWeek::Saturday),
            sunday: day(DayOfWeek::Sunday),
        }
    }
}

/// A specialist's template for one specialty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialtyAvailability {
    pub specialty: String,
    pub days: WeeklyAvailability,
}

impl SpecialtyAvailability {
    pub fn new(specialty: impl Into<String>, days: WeeklyAvailability) -> Self {
        Self { specialty: specialty.into(), days }
    }
}

/// Row shape of `availability_templates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityTemplateRow {
    pub specialist_id: Uuid,
    pub specialty: String,
    pub days: WeeklyAvailability,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTemplateRequest {
    pub templates: Vec<SpecialtyAvailability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateResponse {
    pub specialist_id: Uuid,
    pub templates: Vec<SpecialtyAvailability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSpecialtyRequest {
    pub name: String,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<anyhow::Error> for AvailabilityError {
    fn from(err: anyhow::Error) -> Self {
        AvailabilityError::Store(err.to_string())
    }
}
