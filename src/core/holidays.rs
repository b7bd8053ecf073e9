//! Public holiday calendar.
//!
//! Holidays are fixed month/day pairs repeated every year.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A recurring public holiday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicHoliday {
    /// Month, 1-12
    pub month: u32,
    /// Day of month, 1-31
    pub day: u32,
    /// Display name
    pub name: String,
}

impl PublicHoliday {
    /// Whether the holiday falls on `date`, in any year.
    #[must_use]
    pub fn falls_on(&self, date: NaiveDate) -> bool {
        self.month == date.month() && self.day == date.day()
    }
}

/// The set of public holidays used by calendar views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayCalendar {
    holidays: Vec<PublicHoliday>,
}

impl HolidayCalendar {
    /// Builds a calendar from an explicit list.
    #[must_use]
    pub const fn new(holidays: Vec<PublicHoliday>) -> Self {
        Self { holidays }
    }

    /// The holiday on `date`, if any.
    #[must_use]
    pub fn holiday_on(&self, date: NaiveDate) -> Option<&PublicHoliday> {
        self.holidays.iter().find(|h| h.falls_on(date))
    }

    /// Holidays in a given year, in calendar order. Impossible dates (Feb 30) are skipped.
    #[must_use]
    pub fn in_year(&self, year: i32) -> Vec<(NaiveDate, &PublicHoliday)> {
        let mut dated: Vec<(NaiveDate, &PublicHoliday)> = self
            .holidays
            .iter()
            .filter_map(|h| NaiveDate::from_ymd_opt(year, h.month, h.day).map(|d| (d, h)))
            .collect();
        dated.sort_by_key(|(d, _)| *d);
        dated
    }

    /// All configured holidays.
    #[must_use]
    pub fn holidays(&self) -> &[PublicHoliday] {
        &self.holidays
    }
}

impl Default for HolidayCalendar {
    /// Mauritian public holidays (movable feasts at their 2025 dates).
    fn default() -> Self {
        let fixed = [
            (1, 1, "New Year's Day"),
            (1, 2, "New Year's Day (2nd Day)"),
            (2, 1, "Thaipoosam Cavadee"),
            (2, 20, "Maha Shivaratree"),
            (3, 12, "Independence Day"),
            (3, 31, "Ougadi"),
            (4, 18, "Eid-Ul-Fitr"),
            (5, 1, "Labour Day"),
            (7, 25, "Eid-Ul-Adha"),
            (8, 15, "Ganesh Chaturthi"),
            (10, 24, "All Saints Day"),
            (11, 2, "Arrival of Indentured Labourers"),
            (11, 4, "Divali"),
            (12, 25, "Christmas Day"),
        ];

        Self::new(
            fixed
                .into_iter()
                .map(|(month, day, name)| PublicHoliday {
                    month,
                    day,
                    name: name.to_string(),
                })
                .collect(),
        )
    }
}
