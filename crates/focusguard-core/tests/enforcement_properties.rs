//! Property tests for budget verdicts and grace expiry.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use focusguard_core::{
    BudgetRepository, Clock, Database, EnforcementConfig, FocusEngine, GraceStore, IntervalKind,
    LoggingSink, ManualClock, MonitoredAppBudget, PackageUsage, UsageSource, UsageSourceError,
};

struct FixedSource(Vec<PackageUsage>);

impl UsageSource for FixedSource {
    fn query(&self, _: IntervalKind, _: i64, _: i64) -> Result<Vec<PackageUsage>, UsageSourceError> {
        Ok(self.0.clone())
    }
}

fn base_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()))
}

/// (budget minutes, enabled, used minutes) per package.
fn apps() -> impl Strategy<Value = BTreeMap<String, (i64, bool, i64)>> {
    prop::collection::btree_map("com\\.app\\.[a-e]{1,3}", (1i64..240, any::<bool>(), 0i64..480), 0..8)
}

proptest! {
    #[test]
    fn blocked_iff_usage_exceeds_budget(apps in apps(), unmonitored in 0i64..600) {
        let db = Arc::new(Database::open_memory().unwrap());
        let mut rows = vec![PackageUsage::from_minutes("com.unmonitored.x", unmonitored)];
        for (package, (budget, enabled, used)) in &apps {
            let mut b = MonitoredAppBudget::new(package.clone(), *budget);
            b.enabled = *enabled;
            db.set_budget(&b).unwrap();
            rows.push(PackageUsage::from_minutes(package.clone(), *used));
        }

        let engine = FocusEngine::new(
            EnforcementConfig::default(),
            Arc::new(FixedSource(rows)),
            db,
            Arc::new(LoggingSink),
            base_clock(),
        ).unwrap();
        engine.run_cycle();

        let state = engine.block_state();
        for (package, (budget, enabled, used)) in &apps {
            let expected = *enabled && used > budget;
            prop_assert_eq!(state.contains(package), expected, "package {}", package);
        }
        prop_assert!(!state.contains("com.unmonitored.x"));
    }

    #[test]
    fn regrant_leaves_one_entry_expiring_from_latest_grant(gap_secs in 0i64..600) {
        let clock = base_clock();
        let store = GraceStore::with_default_period(clock.clone());

        store.grant("com.app.a");
        clock.advance(Duration::seconds(gap_secs));
        let t2 = clock.now();
        let expires_at = store.grant("com.app.a");

        prop_assert_eq!(store.len(), 1);
        prop_assert_eq!(expires_at, t2 + Duration::minutes(5));
    }

    #[test]
    fn grace_active_exactly_within_window(offset_secs in 0i64..900) {
        let clock = base_clock();
        let store = GraceStore::with_default_period(clock.clone());
        store.grant("com.app.a");

        clock.advance(Duration::seconds(offset_secs));
        prop_assert_eq!(store.is_active("com.app.a"), offset_secs < 300);
    }

    #[test]
    fn sweep_removes_exactly_expired_entries(
        grants in prop::collection::vec(0i64..1200, 1..20),
        sweep_at in 0i64..1800,
    ) {
        let clock = base_clock();
        let start = clock.now();
        let store = GraceStore::with_default_period(clock.clone());

        // Grant package i at start + grants[i] seconds.
        let mut expiries = Vec::new();
        let mut order: Vec<(usize, i64)> = grants.iter().copied().enumerate().collect();
        order.sort_by_key(|(_, at)| *at);
        for (i, at) in order {
            clock.set(start + Duration::seconds(at));
            let expires_at = store.grant(&format!("com.app.{i}"));
            expiries.push((i, expires_at));
        }

        let sweep_instant = start + Duration::seconds(sweep_at);
        clock.set(sweep_instant);
        store.sweep();

        let survivors = expiries.iter().filter(|(_, e)| *e >= sweep_instant).count();
        prop_assert_eq!(store.len(), survivors);
    }
}
