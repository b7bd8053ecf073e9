//! Quota reconciliation - derives each category's `used` days from the record list.
//!
//! `used` is never set by a user. It is recomputed from scratch after every change,
//! so it can never drift from the records regardless of how `total` is edited.

use crate::core::leave::{LeaveRecord, LeaveType};
use serde::{Deserialize, Serialize};

/// Allowance and consumption for one leave category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveQuota {
    /// Category this quota applies to
    #[serde(rename = "type")]
    pub leave_type: LeaveType,
    /// Configured allowance in days
    pub total: f64,
    /// Days consumed, derived from records
    #[serde(default)]
    pub used: f64,
}

impl LeaveQuota {
    /// A quota with nothing used yet.
    #[must_use]
    pub const fn new(leave_type: LeaveType, total: f64) -> Self {
        Self {
            leave_type,
            total,
            used: 0.0,
        }
    }

    /// Days left; negative once the allowance is exceeded.
    #[must_use]
    pub fn remaining(&self) -> f64 {
        self.total - self.used
    }

    /// Share of the allowance consumed, as a percentage.
    #[must_use]
    pub fn percent_used(&self) -> f64 {
        if self.total == 0.0 {
            return 0.0;
        }

        (self.used / self.total) * 100.0
    }

    /// Whether more days were taken than allowed.
    #[must_use]
    pub fn is_exceeded(&self) -> bool {
        self.used > self.total
    }
}

/// The built-in allowance set.
#[must_use]
pub fn default_quotas() -> Vec<LeaveQuota> {
    vec![
        LeaveQuota::new(LeaveType::Local, 12.0),
        LeaveQuota::new(LeaveType::Sick, 15.0),
        LeaveQuota::new(LeaveType::Vacation, 20.0),
        LeaveQuota::new(LeaveType::HalfLocal, 6.0),
        LeaveQuota::new(LeaveType::HalfSick, 6.0),
    ]
}

/// Recomputes `used` for every quota from `records`.
///
/// Inputs are not modified and quota order is preserved. Records whose type has no
/// quota entry contribute nothing.
#[must_use]
pub fn reconcile(records: &[LeaveRecord], quotas: &[LeaveQuota]) -> Vec<LeaveQuota> {
    let mut updated: Vec<LeaveQuota> = quotas
        .iter()
        .map(|q| LeaveQuota { used: 0.0, ..q.clone() })
        .collect();

    for record in records {
        if let Some(quota) = updated
            .iter_mut()
            .find(|q| q.leave_type == record.leave_type)
        {
            quota.used += record.consumed_days();
        }
    }

    updated
}

/// Looks up the quota for a category.
#[must_use]
pub fn find_quota(quotas: &[LeaveQuota], leave_type: LeaveType) -> Option<&LeaveQuota> {
    quotas.iter().find(|q| q.leave_type == leave_type)
}
