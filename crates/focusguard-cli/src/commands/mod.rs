pub mod budget;
pub mod check;
pub mod config;
pub mod cycle;
pub mod usage;

use std::path::Path;
use std::sync::Arc;

use focusguard_core::{
    Config, CycleOutcome, Database, FocusEngine, JsonFileUsageSource, LoggingSink, SkipReason,
    SystemClock,
};

/// Engine over the on-disk database and config, reading usage from `usage_file`.
pub fn open_engine(usage_file: &Path) -> Result<FocusEngine, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Arc::new(Database::open()?);
    let engine = FocusEngine::new(
        config.enforcement,
        Arc::new(JsonFileUsageSource::new(usage_file)),
        db,
        Arc::new(LoggingSink),
        Arc::new(SystemClock),
    )?;
    tracing::debug!(usage_file = %usage_file.display(), "engine ready");
    Ok(engine)
}

/// Turn a skipped cycle into a command error.
pub fn require_completed(outcome: &CycleOutcome) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        CycleOutcome::Completed(_) => Ok(()),
        CycleOutcome::Skipped { reason } => {
            let message = match reason {
                SkipReason::AlreadyRunning => "another cycle is running".to_string(),
                SkipReason::BudgetsUnavailable(e) => format!("budgets unavailable: {e}"),
                SkipReason::UsageUnavailable(e) => format!("usage unavailable: {e}"),
            };
            Err(format!("cycle skipped: {message}").into())
        }
    }
}
