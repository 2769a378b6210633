//! Time source abstraction.
//!
//! Every time-dependent component takes an `Arc<dyn Clock>` so tests can
//! drive grace expiry and day boundaries without sleeping.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use parking_lot::Mutex;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward (or backward for negative durations).
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Local calendar date of `now` and the UTC instant of that day's local midnight.
///
/// Midnight that does not exist locally (DST gap) falls back to the earliest
/// valid local time, then to UTC midnight.
pub fn local_day_bounds(now: DateTime<Utc>) -> (NaiveDate, DateTime<Utc>) {
    let date = now.with_timezone(&Local).date_naive();
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let start = Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight));
    (date, start)
}
