//! Usage aggregation.
//!
//! Each cycle reads today's foreground time from the usage source, compares it
//! with every enabled budget, publishes the recomputed over-budget set in one
//! step and then upserts one usage record per monitored app. The aggregator is
//! the only writer of the block state.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::block_state::{BlockState, BlockStateWriter};
use crate::budget::UsageRecord;
use crate::clock::{local_day_bounds, Clock};
use crate::storage::BudgetRepository;
use crate::usage::{IntervalKind, UsageSource};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Why a cycle left all state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "message")]
pub enum SkipReason {
    /// Another cycle was still running.
    AlreadyRunning,
    /// The budgets list could not be read.
    BudgetsUnavailable(String),
    /// The usage-data query failed.
    UsageUnavailable(String),
}

/// Summary of a completed cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub date: NaiveDate,
    /// Enabled budgets evaluated.
    pub evaluated: usize,
    /// Packages over budget after this cycle, sorted.
    pub over_budget: Vec<String>,
    /// Usage records written.
    pub persisted: usize,
    /// Apps whose usage record could not be read or written.
    pub persistence_failures: usize,
    /// Whether the published over-budget set changed.
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum CycleOutcome {
    Completed(CycleReport),
    Skipped { reason: SkipReason },
}

impl CycleOutcome {
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            CycleOutcome::Completed(report) => Some(report),
            CycleOutcome::Skipped { .. } => None,
        }
    }
}

/// Clears the in-flight flag when a cycle ends, including on unwind.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct UsageAggregator {
    source: Arc<dyn UsageSource>,
    repository: Arc<dyn BudgetRepository>,
    writer: BlockStateWriter,
    clock: Arc<dyn Clock>,
    in_flight: AtomicBool,
}

impl UsageAggregator {
    pub(crate) fn new(
        source: Arc<dyn UsageSource>,
        repository: Arc<dyn BudgetRepository>,
        writer: BlockStateWriter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            repository,
            writer,
            clock,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Read-only handle to the set this aggregator publishes.
    pub fn block_state(&self) -> BlockState {
        self.writer.reader()
    }

    /// Run one aggregation cycle.
    ///
    /// Never fails: collaborator errors skip the cycle (usage/budgets) or the
    /// affected app's record (persistence) and are logged.
    pub fn run_cycle(&self) -> CycleOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            tracing::warn!("aggregation cycle requested while another is running; skipping");
            return CycleOutcome::Skipped {
                reason: SkipReason::AlreadyRunning,
            };
        }
        let _guard = InFlight(&self.in_flight);

        let now = self.clock.now();
        let (date, day_start) = local_day_bounds(now);

        let budgets = match self.repository.get_monitored_budgets() {
            Ok(budgets) => budgets,
            Err(e) => {
                tracing::warn!(error = %e, "could not read budgets; skipping aggregation cycle");
                return CycleOutcome::Skipped {
                    reason: SkipReason::BudgetsUnavailable(e.to_string()),
                };
            }
        };

        let start_millis = day_start.timestamp_millis();
        let end_millis = now.timestamp_millis().max(start_millis + 1);
        let rows = match self.source.query(IntervalKind::Daily, start_millis, end_millis) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "usage query failed; keeping previous block state");
                return CycleOutcome::Skipped {
                    reason: SkipReason::UsageUnavailable(e.to_string()),
                };
            }
        };

        let mut millis_by_package: HashMap<&str, i64> = HashMap::new();
        for row in &rows {
            let total = millis_by_package.entry(row.package_name.as_str()).or_default();
            *total = total.saturating_add(row.total_foreground_millis.max(0));
        }

        let mut over_budget = BTreeSet::new();
        let mut monitored = Vec::new();
        for budget in budgets.iter().filter(|b| b.enabled) {
            let package = budget.package_name.as_str();
            let minutes_used = millis_by_package.get(package).copied().unwrap_or(0) / MILLIS_PER_MINUTE;
            if budget.is_exceeded_by(minutes_used) {
                over_budget.insert(budget.package_name.clone());
            }
            monitored.push((package, minutes_used));
        }

        // Removed and disabled budgets drop out because the set is rebuilt.
        let over_budget: Vec<String> = over_budget.into_iter().collect();
        let changed = self.writer.replace(over_budget.iter().cloned().collect());

        let mut persisted = 0;
        let mut persistence_failures = 0;
        for (package, minutes_used) in &monitored {
            match self.persist_usage(package, date, *minutes_used) {
                Ok(()) => persisted += 1,
                Err(e) => {
                    persistence_failures += 1;
                    tracing::warn!(package = %package, error = %e, "failed to persist usage record");
                }
            }
        }

        let report = CycleReport {
            date,
            evaluated: monitored.len(),
            over_budget,
            persisted,
            persistence_failures,
            changed,
        };

        if changed {
            tracing::info!(over_budget = ?report.over_budget, "over-budget set changed");
        }
        tracing::debug!(
            evaluated = report.evaluated,
            persisted = report.persisted,
            failures = report.persistence_failures,
            "aggregation cycle complete"
        );

        CycleOutcome::Completed(report)
    }

    /// Upsert today's record, carrying the stored launch count forward.
    fn persist_usage(&self, package: &str, date: NaiveDate, minutes_used: i64) -> crate::error::Result<()> {
        let launch_count = self
            .repository
            .get_usage_record(package, date)?
            .map(|existing| existing.launch_count)
            .unwrap_or(0);

        self.repository.upsert_usage_record(&UsageRecord {
            package_name: package.to_string(),
            date,
            minutes_used,
            launch_count,
        })
    }

    /// Run a cycle immediately and then every `every` until `cancel` fires.
    ///
    /// Cancellation is observed between cycles only; a running cycle always
    /// finishes.
    pub fn spawn_loop(self: &Arc<Self>, every: StdDuration, cancel: CancellationToken) -> JoinHandle<()> {
        let aggregator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let cycle = Arc::clone(&aggregator);
                        if let Err(e) = tokio::task::spawn_blocking(move || cycle.run_cycle()).await {
                            tracing::error!(error = %e, "aggregation cycle panicked");
                        }
                    }
                }
            }
            tracing::debug!("aggregation loop stopped");
        })
    }
}
