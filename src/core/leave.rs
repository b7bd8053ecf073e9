//! Leave records - the core record type, leave categories and date handling.
//!
//! Dates are calendar dates (`NaiveDate`); time-of-day never takes part in any
//! comparison. Stored values may carry a full ISO-8601 timestamp; those are reduced to
//! the calendar day they fall on in the local time zone.

use crate::errors::{Error, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Storage format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The closed set of leave categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeaveType {
    /// Local (casual) leave
    Local,
    /// Sick leave
    Sick,
    /// Vacation leave
    Vacation,
    /// Half-day local leave
    HalfLocal,
    /// Half-day sick leave
    HalfSick,
}

impl LeaveType {
    /// All categories, in configuration order.
    pub const ALL: [Self; 5] = [
        Self::Local,
        Self::Sick,
        Self::Vacation,
        Self::HalfLocal,
        Self::HalfSick,
    ];

    /// Whether this category consumes half a day per calendar day.
    #[must_use]
    pub const fn is_half_day(self) -> bool {
        matches!(self, Self::HalfLocal | Self::HalfSick)
    }

    /// Days consumed per calendar day spanned.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        if self.is_half_day() { 0.5 } else { 1.0 }
    }

    /// The full-day category a half-day type belongs to.
    #[must_use]
    pub const fn base_category(self) -> Self {
        match self {
            Self::Local | Self::HalfLocal => Self::Local,
            Self::Sick | Self::HalfSick => Self::Sick,
            Self::Vacation => Self::Vacation,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Local => "Local Leave",
            Self::Sick => "Sick Leave",
            Self::Vacation => "Vacation",
            Self::HalfLocal => "½ Local Leave",
            Self::HalfSick => "½ Sick Leave",
        }
    }

    /// Stored name, identical to the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Sick => "sick",
            Self::Vacation => "vacation",
            Self::HalfLocal => "halfLocal",
            Self::HalfSick => "halfSick",
        }
    }
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaveType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Validation {
                message: format!("Unknown leave type: {s}"),
            })
    }
}

/// Opaque, immutable record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeaveId(String);

impl LeaveId {
    /// A fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LeaveId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LeaveId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One leave request covering the inclusive range `[start_date, end_date]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRecord {
    /// Assigned at creation, never changes
    pub id: LeaveId,
    /// First day of leave
    #[serde(with = "iso_date")]
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive)
    #[serde(with = "iso_date")]
    pub end_date: NaiveDate,
    /// Leave category
    #[serde(rename = "type")]
    pub leave_type: LeaveType,
    /// Free text, may be empty
    #[serde(default)]
    pub reason: String,
    /// Name of an attached file; the file itself is not tracked
    #[serde(default)]
    pub attachment_name: Option<String>,
    /// Set once when the record is created
    pub created_at: DateTime<Utc>,
}

impl LeaveRecord {
    /// Number of calendar days spanned, counting both endpoints.
    #[must_use]
    pub fn inclusive_day_count(&self) -> i64 {
        inclusive_day_count(self.start_date, self.end_date)
    }

    /// Days this record consumes from its quota.
    #[must_use]
    pub fn consumed_days(&self) -> f64 {
        // Day counts stay far below f64's exact integer range.
        #[allow(clippy::cast_precision_loss)]
        let days = self.inclusive_day_count() as f64;
        days * self.leave_type.multiplier()
    }

    /// Whether `date` falls within the record's range, both ends inclusive.
    #[must_use]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Whether the record shares at least one day with `[from, to]`.
    #[must_use]
    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.start_date <= to && from <= self.end_date
    }

    /// Where the record sits relative to `today`.
    #[must_use]
    pub fn status_on(&self, today: NaiveDate) -> LeaveStatus {
        if today < self.start_date {
            LeaveStatus::Upcoming
        } else if today > self.end_date {
            LeaveStatus::Past
        } else {
            LeaveStatus::Active
        }
    }
}

/// Number of calendar days in `[start, end]`.
///
/// A reversed range counts the same days as its forward counterpart, so a malformed
/// record never contributes a negative amount.
#[must_use]
pub fn inclusive_day_count(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days().abs() + 1
}

/// Timeline position of a leave record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveStatus {
    /// Starts after the reference day
    Upcoming,
    /// Covers the reference day
    Active,
    /// Ended before the reference day
    Past,
}

/// User input for a new or edited record, validated before it reaches the store.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveDraft {
    /// First day of leave
    pub start_date: NaiveDate,
    /// Last day of leave
    pub end_date: NaiveDate,
    /// Leave category
    pub leave_type: LeaveType,
    /// Free text
    pub reason: String,
    /// Optional attachment file name
    pub attachment_name: Option<String>,
}

impl LeaveDraft {
    /// A single-day draft with no reason or attachment.
    #[must_use]
    pub const fn single_day(leave_type: LeaveType, date: NaiveDate) -> Self {
        Self {
            start_date: date,
            end_date: date,
            leave_type,
            reason: String::new(),
            attachment_name: None,
        }
    }

    /// Checks the draft's preconditions.
    pub fn validate(&self) -> Result<()> {
        if self.start_date > self.end_date {
            return Err(Error::Validation {
                message: format!(
                    "start date {} is after end date {}",
                    self.start_date, self.end_date
                ),
            });
        }

        if self
            .attachment_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(Error::Validation {
                message: "attachment name cannot be blank".to_string(),
            });
        }

        Ok(())
    }

    /// Validates the draft and turns it into a record with the given identity.
    pub fn into_record(self, id: LeaveId, created_at: DateTime<Utc>) -> Result<LeaveRecord> {
        self.validate()?;

        Ok(LeaveRecord {
            id,
            start_date: self.start_date,
            end_date: self.end_date,
            leave_type: self.leave_type,
            reason: self.reason.trim().to_string(),
            attachment_name: self.attachment_name.map(|name| name.trim().to_string()),
            created_at,
        })
    }
}

/// Groups records by the `YYYY-MM` month of their start date, keeping input order
/// inside each group.
#[must_use]
pub fn group_by_month(records: &[LeaveRecord]) -> BTreeMap<String, Vec<&LeaveRecord>> {
    let mut groups: BTreeMap<String, Vec<&LeaveRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.start_date.format("%Y-%m").to_string())
            .or_default()
            .push(record);
    }
    groups
}

/// Parses a calendar date from either `YYYY-MM-DD` or a full ISO-8601 timestamp.
///
/// Timestamps with an offset name an instant, typically local midnight written in
/// UTC, and are read back as the calendar day in the local time zone.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate> {
    parse_calendar_date_in(raw, &Local)
}

/// Like [`parse_calendar_date`], reading offset timestamps in `zone`.
///
/// Plain dates and timestamps without an offset keep the date as written.
pub fn parse_calendar_date_in<Tz: TimeZone>(raw: &str, zone: &Tz) -> Result<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(zone).date_naive());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(timestamp.date());
    }

    Err(Error::Validation {
        message: format!("Unrecognised date: {raw}"),
    })
}

/// Serde adapter for calendar dates stored as ISO-8601 strings.
pub mod iso_date {
    use super::{DATE_FORMAT, parse_calendar_date};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de};

    /// Writes `YYYY-MM-DD`.
    pub fn serialize<S: Serializer>(
        date: &NaiveDate,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    /// Reads a plain date or a timestamp.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_calendar_date(&raw).map_err(de::Error::custom)
    }
}
