//! Composition root for the enforcement components.
//!
//! [`FocusEngine`] builds the block state, grace store, aggregator and
//! decision protocol from injected collaborators, and owns the background
//! task lifecycle through [`FocusEngine::start`] / [`EngineHandle::shutdown`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::aggregator::{CycleOutcome, UsageAggregator};
use super::block_state::BlockState;
use super::decision::{DecisionOutcome, DecisionProtocol, ForegroundPolicy};
use super::grace::{EscapeHatch, GraceStore};
use crate::clock::Clock;
use crate::error::Result;
use crate::storage::{BudgetRepository, EnforcementConfig};
use crate::usage::UsageSource;

/// Presents and removes the full-screen blocking UI.
pub trait BlockingEffectSink: Send + Sync {
    fn show_block(&self, package_name: &str);

    /// Called when a grace grant lifts a block whose overlay is showing.
    fn dismiss_block(&self, _package_name: &str) {}
}

/// Sink that only logs; used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl BlockingEffectSink for LoggingSink {
    fn show_block(&self, package_name: &str) {
        tracing::info!(package = %package_name, "block overlay requested");
    }

    fn dismiss_block(&self, package_name: &str) {
        tracing::info!(package = %package_name, "block overlay dismissed");
    }
}

pub struct FocusEngine {
    config: EnforcementConfig,
    aggregator: Arc<UsageAggregator>,
    grace: Arc<GraceStore>,
    decision: DecisionProtocol,
    sink: Arc<dyn BlockingEffectSink>,
}

impl FocusEngine {
    /// Wire up a fresh engine.
    ///
    /// # Errors
    /// Returns an error if `config` does not validate.
    pub fn new(
        config: EnforcementConfig,
        usage_source: Arc<dyn UsageSource>,
        repository: Arc<dyn BudgetRepository>,
        sink: Arc<dyn BlockingEffectSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let (writer, reader) = BlockState::channel();
        let grace = Arc::new(GraceStore::new(config.grace_period(), Arc::clone(&clock)));
        let policy = ForegroundPolicy::new(config.host_package.clone(), &config.system_allowlist);
        let decision = DecisionProtocol::new(reader, Arc::clone(&grace), policy);
        let aggregator = Arc::new(UsageAggregator::new(usage_source, repository, writer, clock));

        Ok(Self {
            config,
            aggregator,
            grace,
            decision,
            sink,
        })
    }

    pub fn config(&self) -> &EnforcementConfig {
        &self.config
    }

    /// Read-only handle to the over-budget set.
    pub fn block_state(&self) -> BlockState {
        self.aggregator.block_state()
    }

    pub fn grace_store(&self) -> &Arc<GraceStore> {
        &self.grace
    }

    /// Decide on a foreground change without triggering effects.
    pub fn evaluate(&self, package_name: &str) -> DecisionOutcome {
        self.decision.evaluate(package_name)
    }

    /// Entry point for the foreground-event source.
    ///
    /// Shows the overlay on `Block`. Never performs I/O or waits on the
    /// aggregator.
    pub fn on_foreground_change(&self, package_name: &str) -> DecisionOutcome {
        let outcome = self.decision.evaluate(package_name);
        if let DecisionOutcome::Block(package) = &outcome {
            self.sink.show_block(package);
        }
        outcome
    }

    /// Escape-hatch entry point: exempt `package_name` for one grace period.
    ///
    /// If the overlay for this package is showing it is dismissed right away,
    /// and the protocol returns to `Neutral` so the block re-triggers once
    /// the grace period ends.
    pub fn grant_temporary_unblock(&self, package_name: &str, hatch: EscapeHatch) -> DateTime<Utc> {
        let expires_at = self.grace.grant(package_name);
        tracing::info!(
            package = %package_name,
            hatch = %hatch,
            expires_at = %expires_at,
            "grace period granted"
        );
        if self.decision.release(package_name) {
            self.sink.dismiss_block(package_name);
        }
        expires_at
    }

    /// Run one aggregation cycle on the calling thread.
    pub fn run_cycle(&self) -> CycleOutcome {
        self.aggregator.run_cycle()
    }

    /// Package whose overlay is currently believed to be showing.
    pub fn blocking(&self) -> Option<String> {
        self.decision.last_blocked()
    }

    /// Spawn the grace sweeper and the aggregation loop.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(&self) -> EngineHandle {
        let cancel = CancellationToken::new();
        let sweeper = self
            .grace
            .spawn_sweeper(self.config.cleanup_interval(), cancel.child_token());
        let aggregation = self
            .aggregator
            .spawn_loop(self.config.aggregation_interval(), cancel.child_token());
        tracing::info!(
            sweep_every = ?self.config.cleanup_interval(),
            aggregate_every = ?self.config.aggregation_interval(),
            "focus engine started"
        );
        EngineHandle {
            cancel,
            tasks: vec![sweeper, aggregation],
        }
    }
}

/// Running background tasks of a started engine.
#[must_use = "dropping the handle leaves the background tasks running"]
pub struct EngineHandle {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl EngineHandle {
    /// Token observed by every background task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the background tasks and wait for them to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "background task failed during shutdown");
            }
        }
        tracing::info!("focus engine stopped");
    }
}
