//! Default quota and holiday configuration from config.toml
//!
//! The quotas defined here seed the `leave-quotas` key on first run and are what
//! "reset quotas" restores. Every section is optional; missing sections fall back
//! to the built-in defaults.

use crate::{
    core::{
        holidays::{HolidayCalendar, PublicHoliday},
        leave::LeaveType,
        quota::{LeaveQuota, default_quotas},
    },
    errors::{Error, Result},
};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Default allowance per leave type
    #[serde(default)]
    pub quotas: Vec<QuotaConfig>,
    /// Public holiday calendar
    #[serde(default)]
    pub holidays: Vec<PublicHoliday>,
}

/// Configured allowance for a single leave type
#[derive(Debug, Deserialize, Clone)]
pub struct QuotaConfig {
    /// Leave type this allowance applies to
    #[serde(rename = "type")]
    pub leave_type: LeaveType,
    /// Allowance in days; may be fractional
    pub total: f64,
}

impl Config {
    /// Quotas to seed with, or the built-in set when none are configured.
    pub fn default_quotas(&self) -> Result<Vec<LeaveQuota>> {
        if self.quotas.is_empty() {
            return Ok(default_quotas());
        }

        let mut quotas: Vec<LeaveQuota> = Vec::with_capacity(self.quotas.len());
        for entry in &self.quotas {
            if !entry.total.is_finite() || entry.total < 0.0 {
                return Err(Error::Config {
                    message: format!(
                        "quota total for '{}' must be a non-negative number, got {}",
                        entry.leave_type, entry.total
                    ),
                });
            }
            if quotas.iter().any(|q| q.leave_type == entry.leave_type) {
                return Err(Error::Config {
                    message: format!("quota for '{}' is configured twice", entry.leave_type),
                });
            }
            quotas.push(LeaveQuota::new(entry.leave_type, entry.total));
        }
        Ok(quotas)
    }

    /// Holiday calendar, or the built-in one when none is configured.
    #[must_use]
    pub fn holiday_calendar(&self) -> HolidayCalendar {
        if self.holidays.is_empty() {
            HolidayCalendar::default()
        } else {
            HolidayCalendar::new(self.holidays.clone())
        }
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from `path`, or the built-in defaults if the file does not exist.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config> {
    if path.as_ref().exists() {
        return load_config(path);
    }

    info!(
        "No config file at {:?}; using built-in defaults",
        path.as_ref()
    );
    Ok(Config {
        quotas: Vec::new(),
        holidays: Vec::new(),
    })
}
