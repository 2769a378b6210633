//! Budget and usage-counter records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A daily foreground-time budget for one monitored app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredAppBudget {
    pub package_name: String,
    pub daily_budget_minutes: i64,
    pub enabled: bool,
}

impl MonitoredAppBudget {
    pub fn new(package_name: impl Into<String>, daily_budget_minutes: i64) -> Self {
        Self {
            package_name: package_name.into(),
            daily_budget_minutes,
            enabled: true,
        }
    }

    /// Reject budgets that can never be satisfied or name no app.
    ///
    /// Called by repositories when a budget is stored; the aggregator
    /// assumes stored budgets are valid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.package_name.trim().is_empty() {
            return Err(ValidationError::EmptyPackageName);
        }
        if self.daily_budget_minutes <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "daily_budget_minutes".to_string(),
                message: format!(
                    "must be a positive number of minutes, got {}",
                    self.daily_budget_minutes
                ),
            });
        }
        Ok(())
    }

    /// True when `minutes_used` strictly exceeds the budget.
    pub fn is_exceeded_by(&self, minutes_used: i64) -> bool {
        minutes_used > self.daily_budget_minutes
    }
}

/// Measured usage of one package on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub package_name: String,
    pub date: NaiveDate,
    pub minutes_used: i64,
    /// Maintained by the launch tracker; the aggregator only carries it forward.
    pub launch_count: i64,
}

impl UsageRecord {
    pub fn new(package_name: impl Into<String>, date: NaiveDate, minutes_used: i64) -> Self {
        Self {
            package_name: package_name.into(),
            date,
            minutes_used,
            launch_count: 0,
        }
    }
}
