//! Grace periods: short-lived exemptions from blocking.
//!
//! One entry per package holding its expiry instant. A new grant overwrites
//! the previous expiry. Expired entries are evicted lazily when queried and
//! proactively by a background sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;

/// Default length of a grace grant.
pub const DEFAULT_GRACE_PERIOD_MINUTES: u32 = 5;

/// Default interval between background sweeps.
pub const DEFAULT_SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(60);

/// Why a grace period was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EscapeHatch {
    /// The user spent in-app points.
    SpendPoints { cost: u32 },
    /// The user waited out the unlock timer.
    WaitTimer,
    /// The user completed a task.
    CompleteTask,
}

impl std::fmt::Display for EscapeHatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscapeHatch::SpendPoints { cost } => write!(f, "spend_points({cost})"),
            EscapeHatch::WaitTimer => f.write_str("wait_timer"),
            EscapeHatch::CompleteTask => f.write_str("complete_task"),
        }
    }
}

/// Thread-safe store of grace expiries.
///
/// All operations are total and never block on I/O; the internal lock is
/// held only for the duration of a map operation.
pub struct GraceStore {
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
    grace_period: Duration,
    clock: Arc<dyn Clock>,
}

impl GraceStore {
    pub fn new(grace_period: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            grace_period,
            clock,
        }
    }

    pub fn with_default_period(clock: Arc<dyn Clock>) -> Self {
        Self::new(Duration::minutes(i64::from(DEFAULT_GRACE_PERIOD_MINUTES)), clock)
    }

    /// Exempt `package_name` until now + grace period, replacing any earlier expiry.
    pub fn grant(&self, package_name: &str) -> DateTime<Utc> {
        let expires_at = self.clock.now() + self.grace_period;
        self.entries
            .lock()
            .insert(package_name.to_string(), expires_at);
        expires_at
    }

    /// True iff an entry exists and has not expired. Evicts an expired entry.
    pub fn is_active(&self, package_name: &str) -> bool {
        self.remaining(package_name).is_some()
    }

    /// Time left on an active grant. Evicts an expired entry.
    pub fn remaining(&self, package_name: &str) -> Option<Duration> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let expires_at = *entries.get(package_name)?;
        if now < expires_at {
            Some(expires_at - now)
        } else {
            entries.remove(package_name);
            None
        }
    }

    /// Drop a grant early. Returns true if an entry existed.
    pub fn revoke(&self, package_name: &str) -> bool {
        self.entries.lock().remove(package_name).is_some()
    }

    /// Evict every entry with `expires_at < now`. Returns the number evicted.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at >= now);
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Run [`GraceStore::sweep`] every `every` until `cancel` fires.
    ///
    /// The first sweep happens one interval after spawning.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        every: StdDuration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = store.sweep();
                        if evicted > 0 {
                            tracing::debug!(evicted, "swept expired grace entries");
                        }
                    }
                }
            }
            tracing::debug!("grace sweeper stopped");
        })
    }
}
