//! Report generation - quota progress and leave analytics.
//!
//! All functions are framework-agnostic and return structured data that the
//! command layer formats for display.

use crate::core::{
    leave::{LeaveRecord, LeaveType},
    quota::LeaveQuota,
};
use chrono::{Datelike, Month};

/// Days consumed per leave type, in `LeaveType::ALL` order, omitting unused types.
#[must_use]
pub fn days_by_type(records: &[LeaveRecord]) -> Vec<(LeaveType, f64)> {
    LeaveType::ALL
        .into_iter()
        .filter_map(|leave_type| {
            let matching: Vec<&LeaveRecord> = records
                .iter()
                .filter(|r| r.leave_type == leave_type)
                .collect();
            if matching.is_empty() {
                return None;
            }
            Some((leave_type, matching.iter().map(|r| r.consumed_days()).sum()))
        })
        .collect()
}

/// Leave taken in one calendar month, folded into the three base categories.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    /// The month
    pub month: Month,
    /// Local days, half-day local included at 0.5 per day
    pub local: f64,
    /// Sick days, half-day sick included at 0.5 per day
    pub sick: f64,
    /// Vacation days
    pub vacation: f64,
}

impl MonthSummary {
    const fn empty(month: Month) -> Self {
        Self {
            month,
            local: 0.0,
            sick: 0.0,
            vacation: 0.0,
        }
    }

    /// All categories together.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.local + self.sick + self.vacation
    }
}

/// Twelve month buckets for `year`. A record is attributed entirely to the month it
/// starts in; records starting in other years are ignored.
#[must_use]
pub fn monthly_breakdown(records: &[LeaveRecord], year: i32) -> Vec<MonthSummary> {
    let mut months: Vec<MonthSummary> = (1..=12u8)
        .filter_map(|m| Month::try_from(m).ok())
        .map(MonthSummary::empty)
        .collect();

    for record in records.iter().filter(|r| r.start_date.year() == year) {
        let Some(bucket) = months.get_mut(record.start_date.month0() as usize) else {
            continue;
        };
        let days = record.consumed_days();
        match record.leave_type.base_category() {
            LeaveType::Sick => bucket.sick += days,
            LeaveType::Vacation => bucket.vacation += days,
            _ => bucket.local += days,
        }
    }

    months
}

/// Average number of leave requests per month over a year.
#[must_use]
pub fn requests_per_month(records: &[LeaveRecord]) -> f64 {
    // Record counts are small, precision loss negligible
    #[allow(clippy::cast_precision_loss)]
    let count = records.len() as f64;
    count / 12.0
}

/// Generates a progress bar string for a quota's consumption.
///
/// Creates a text-based progress bar like: `[████████░░] 80.0%`
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // Cast safety: clamped_progress ∈ [0, 100], length is small (10-20).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    let filled_str = "█".repeat(filled);
    let empty_str = "░".repeat(empty);

    format!("[{filled_str}{empty_str}] {progress_percent:.1}%")
}

/// One display line for a quota: label, used/total, remaining and a progress bar.
#[must_use]
pub fn format_quota_line(quota: &LeaveQuota) -> String {
    let marker = if quota.is_exceeded() { " ⚠" } else { "" };
    format!(
        "{:<14} {:>5.1}/{:<5.1} left {:>5.1} {}{marker}",
        quota.leave_type.label(),
        quota.used,
        quota.total,
        quota.remaining(),
        format_progress_bar(quota.percent_used(), Some(10)),
    )
}

/// Formats a day count without a trailing `.0` for whole days.
#[must_use]
pub fn format_days(days: f64) -> String {
    if days.fract() == 0.0 {
        format!("{days:.0}")
    } else {
        format!("{days:.1}")
    }
}
