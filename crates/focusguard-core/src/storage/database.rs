//! SQLite-based budget and usage storage.
//!
//! Provides persistent storage for:
//! - Monitored app budgets
//! - Per-day usage counters written by the aggregator

use std::path::Path;

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use super::migrations;
use super::repository::BudgetRepository;
use crate::budget::{MonitoredAppBudget, UsageRecord};
use crate::error::{DatabaseError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite database backing [`BudgetRepository`].
///
/// The connection sits behind a mutex so one handle can be shared between the
/// aggregator loop and UI-facing callers.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `<data_dir>/focusguard.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("focusguard.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Budget for one package, if stored.
    pub fn get_budget(&self, package_name: &str) -> Result<Option<MonitoredAppBudget>> {
        let conn = self.conn.lock();
        let budget = conn
            .query_row(
                "SELECT package_name, daily_budget_minutes, enabled
                 FROM monitored_budgets WHERE package_name = ?1",
                params![package_name],
                row_to_budget,
            )
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(budget)
    }
}

fn row_to_budget(row: &rusqlite::Row<'_>) -> rusqlite::Result<MonitoredAppBudget> {
    Ok(MonitoredAppBudget {
        package_name: row.get(0)?,
        daily_budget_minutes: row.get(1)?,
        enabled: row.get(2)?,
    })
}

fn row_to_usage(row: &rusqlite::Row<'_>) -> rusqlite::Result<UsageRecord> {
    let date: String = row.get(1)?;
    let date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(UsageRecord {
        package_name: row.get(0)?,
        date,
        minutes_used: row.get(2)?,
        launch_count: row.get(3)?,
    })
}

impl BudgetRepository for Database {
    fn get_monitored_budgets(&self) -> Result<Vec<MonitoredAppBudget>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT package_name, daily_budget_minutes, enabled
                 FROM monitored_budgets ORDER BY package_name",
            )
            .map_err(DatabaseError::from)?;
        let budgets = stmt
            .query_map([], row_to_budget)
            .map_err(DatabaseError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::from)?;
        Ok(budgets)
    }

    fn get_usage_record(&self, package_name: &str, date: NaiveDate) -> Result<Option<UsageRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                "SELECT package_name, date, minutes_used, launch_count
                 FROM usage_records WHERE package_name = ?1 AND date = ?2",
                params![package_name, date.format(DATE_FORMAT).to_string()],
                row_to_usage,
            )
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(record)
    }

    fn upsert_usage_record(&self, record: &UsageRecord) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO usage_records (package_name, date, minutes_used, launch_count)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(package_name, date) DO UPDATE SET
                minutes_used = excluded.minutes_used,
                launch_count = excluded.launch_count",
            params![
                record.package_name,
                record.date.format(DATE_FORMAT).to_string(),
                record.minutes_used,
                record.launch_count,
            ],
        )
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    fn set_budget(&self, budget: &MonitoredAppBudget) -> Result<()> {
        budget.validate()?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO monitored_budgets (package_name, daily_budget_minutes, enabled, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(package_name) DO UPDATE SET
                daily_budget_minutes = excluded.daily_budget_minutes,
                enabled = excluded.enabled,
                updated_at = excluded.updated_at",
            params![
                budget.package_name,
                budget.daily_budget_minutes,
                budget.enabled,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    fn remove_budget(&self, package_name: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let removed = conn
            .execute(
                "DELETE FROM monitored_budgets WHERE package_name = ?1",
                params![package_name],
            )
            .map_err(DatabaseError::from)?;
        Ok(removed > 0)
    }

    fn usage_records_for(&self, date: NaiveDate) -> Result<Vec<UsageRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT package_name, date, minutes_used, launch_count
                 FROM usage_records WHERE date = ?1
                 ORDER BY minutes_used DESC, package_name",
            )
            .map_err(DatabaseError::from)?;
        let records = stmt
            .query_map(params![date.format(DATE_FORMAT).to_string()], row_to_usage)
            .map_err(DatabaseError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::from)?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ValidationError};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn set_and_list_budgets() {
        let db = Database::open_memory().unwrap();
        db.set_budget(&MonitoredAppBudget::new("com.example.video", 60)).unwrap();
        db.set_budget(&MonitoredAppBudget::new("com.example.feed", 30)).unwrap();

        let budgets = db.get_monitored_budgets().unwrap();
        assert_eq!(budgets.len(), 2);
        assert_eq!(budgets[0].package_name, "com.example.feed");
        assert!(budgets[0].enabled);
    }

    #[test]
    fn set_budget_updates_existing() {
        let db = Database::open_memory().unwrap();
        db.set_budget(&MonitoredAppBudget::new("com.example.feed", 30)).unwrap();
        let mut updated = MonitoredAppBudget::new("com.example.feed", 45);
        updated.enabled = false;
        db.set_budget(&updated).unwrap();

        assert_eq!(db.get_budget("com.example.feed").unwrap(), Some(updated));
        assert_eq!(db.get_monitored_budgets().unwrap().len(), 1);
    }

    #[test]
    fn set_budget_rejects_non_positive_minutes() {
        let db = Database::open_memory().unwrap();
        let err = db
            .set_budget(&MonitoredAppBudget::new("com.example.feed", 0))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidValue { .. })
        ));
        assert!(db.get_monitored_budgets().unwrap().is_empty());
    }

    #[test]
    fn remove_budget_reports_whether_anything_was_removed() {
        let db = Database::open_memory().unwrap();
        db.set_budget(&MonitoredAppBudget::new("com.example.feed", 30)).unwrap();
        assert!(db.remove_budget("com.example.feed").unwrap());
        assert!(!db.remove_budget("com.example.feed").unwrap());
    }

    #[test]
    fn upsert_usage_record_replaces_by_package_and_date() {
        let db = Database::open_memory().unwrap();
        let mut record = UsageRecord::new("com.example.feed", day(1), 10);
        record.launch_count = 4;
        db.upsert_usage_record(&record).unwrap();

        record.minutes_used = 25;
        db.upsert_usage_record(&record).unwrap();
        db.upsert_usage_record(&UsageRecord::new("com.example.feed", day(2), 5))
            .unwrap();

        let stored = db.get_usage_record("com.example.feed", day(1)).unwrap().unwrap();
        assert_eq!(stored.minutes_used, 25);
        assert_eq!(stored.launch_count, 4);
        assert_eq!(db.usage_records_for(day(1)).unwrap().len(), 1);
        assert_eq!(db.usage_records_for(day(2)).unwrap().len(), 1);
    }

    #[test]
    fn unknown_usage_record_is_none() {
        let db = Database::open_memory().unwrap();
        assert!(db.get_usage_record("com.unknown", day(1)).unwrap().is_none());
    }

    #[test]
    fn open_at_persists_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focusguard.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.set_budget(&MonitoredAppBudget::new("com.example.feed", 30)).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.get_monitored_budgets().unwrap().len(), 1);
    }
}
