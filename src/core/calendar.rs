//! Day and range queries used by the month, week and day views.
//!
//! All matching is on calendar dates with both ends inclusive. Overlapping records
//! are allowed and all of them are returned, in store order.

use crate::core::{
    holidays::{HolidayCalendar, PublicHoliday},
    leave::LeaveRecord,
};
use chrono::NaiveDate;

/// Records whose `[start_date, end_date]` contains `date`.
#[must_use]
pub fn leaves_on(records: &[LeaveRecord], date: NaiveDate) -> Vec<&LeaveRecord> {
    records.iter().filter(|r| r.covers(date)).collect()
}

/// Records sharing at least one day with `[from, to]`.
#[must_use]
pub fn leaves_between(records: &[LeaveRecord], from: NaiveDate, to: NaiveDate) -> Vec<&LeaveRecord> {
    records.iter().filter(|r| r.overlaps(from, to)).collect()
}

/// Everything a calendar cell shows for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary<'a> {
    /// The day
    pub date: NaiveDate,
    /// Records covering the day
    pub leaves: Vec<&'a LeaveRecord>,
    /// Public holiday on the day
    pub holiday: Option<&'a PublicHoliday>,
}

impl DaySummary<'_> {
    /// Whether nothing is scheduled.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.leaves.is_empty() && self.holiday.is_none()
    }
}

/// Summary of a single day.
#[must_use]
pub fn day_summary<'a>(
    records: &'a [LeaveRecord],
    holidays: &'a HolidayCalendar,
    date: NaiveDate,
) -> DaySummary<'a> {
    DaySummary {
        date,
        leaves: leaves_on(records, date),
        holiday: holidays.holiday_on(date),
    }
}

/// One summary per day of `[from, to]`. Empty when `from > to`.
#[must_use]
pub fn range_summary<'a>(
    records: &'a [LeaveRecord],
    holidays: &'a HolidayCalendar,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<DaySummary<'a>> {
    from.iter_days()
        .take_while(|day| *day <= to)
        .map(|day| day_summary(records, holidays, day))
        .collect()
}
