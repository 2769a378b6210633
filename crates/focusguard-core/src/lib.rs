//! # FocusGuard Core Library
//!
//! This library provides the focus enforcement engine behind FocusGuard: users
//! set daily time budgets for apps, and once a budget is exceeded the next
//! attempt to open that app is intercepted with a blocking overlay until an
//! escape hatch grants a short grace period.
//!
//! ## Architecture
//!
//! - **Usage Aggregator**: periodically compares measured foreground time with
//!   budgets, publishes the over-budget set and persists usage counters
//! - **Block State**: the over-budget set as an observable stream of snapshots
//! - **Grace Store**: short-lived exemptions with lazy and swept expiry
//! - **Decision Protocol**: turns a foreground change into allow/block with
//!   de-duplication
//! - **Storage**: SQLite budgets/usage repository and TOML configuration
//!
//! ## Key Components
//!
//! - [`FocusEngine`]: Composition root and background task lifecycle
//! - [`BudgetRepository`]: Budget and usage persistence contract
//! - [`UsageSource`]: Platform usage-statistics contract
//! - [`Config`]: Application configuration management

pub mod budget;
pub mod clock;
pub mod enforcement;
pub mod error;
pub mod storage;
pub mod usage;

pub use budget::{MonitoredAppBudget, UsageRecord};
pub use clock::{Clock, ManualClock, SystemClock};
pub use enforcement::{
    BlockSnapshot, BlockState, BlockStateWriter, BlockingEffectSink, CycleOutcome, CycleReport,
    DecisionOutcome, EngineHandle, EscapeHatch, FocusEngine, ForegroundPolicy, GraceStore,
    LoggingSink, SkipReason,
};
pub use error::{ConfigError, CoreError, DatabaseError, UsageSourceError, ValidationError};
pub use storage::{BudgetRepository, Config, Database, EnforcementConfig};
pub use usage::{IntervalKind, JsonFileUsageSource, PackageUsage, UsageSource};
