use chrono::NaiveDate;

use crate::budget::{MonitoredAppBudget, UsageRecord};
use crate::error::Result;

/// Persistence contract for budgets and usage counters.
///
/// Implementations validate budgets on write so readers can trust
/// `daily_budget_minutes > 0`.
pub trait BudgetRepository: Send + Sync {
    /// All stored budgets, enabled or not.
    fn get_monitored_budgets(&self) -> Result<Vec<MonitoredAppBudget>>;

    fn get_usage_record(&self, package_name: &str, date: NaiveDate) -> Result<Option<UsageRecord>>;

    /// Insert or replace the record keyed by (package, date).
    fn upsert_usage_record(&self, record: &UsageRecord) -> Result<()>;

    /// Create or update a budget. Rejects invalid budgets.
    fn set_budget(&self, budget: &MonitoredAppBudget) -> Result<()>;

    /// Returns true if a budget was removed.
    fn remove_budget(&self, package_name: &str) -> Result<bool>;

    fn usage_records_for(&self, date: NaiveDate) -> Result<Vec<UsageRecord>>;
}
