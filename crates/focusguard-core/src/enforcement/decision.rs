//! Foreground-change decision protocol.
//!
//! Turns "foreground app changed to P" into an [`DecisionOutcome`] while
//! de-duplicating repeated signals for an app whose overlay is already up.
//!
//! ## States
//!
//! ```text
//! Neutral --(P blocked, no grace)--> Blocking(P)
//! Blocking(P) --(P again)--> Blocking(P)        [NoOpAlreadyBlocking]
//! Blocking(P) --(host/system UI or allowed app)--> Neutral
//! Blocking(P) --(Q blocked, Q != P)--> Blocking(Q)
//! ```
//!
//! Grace-exempt apps are allowed without leaving the current state. The
//! protocol has no timers; expiry belongs to the grace store.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::block_state::BlockState;
use super::grace::GraceStore;

/// Result of evaluating one foreground change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "package")]
pub enum DecisionOutcome {
    Allow,
    /// Show the blocking overlay for this package.
    Block(String),
    /// The overlay for this package is already showing.
    NoOpAlreadyBlocking(String),
}

impl DecisionOutcome {
    pub fn is_block(&self) -> bool {
        matches!(self, DecisionOutcome::Block(_))
    }
}

/// One entry of the never-block allowlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowPattern {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

impl AllowPattern {
    /// Parse `name`, `prefix*`, `*suffix` or `*infix*`.
    ///
    /// Returns `None` when nothing is left besides wildcards, since such a
    /// pattern would match every package.
    pub fn parse(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim();
        let inner = pattern.trim_matches('*');
        if inner.is_empty() {
            return None;
        }
        let inner = inner.to_string();
        Some(match (pattern.starts_with('*'), pattern.ends_with('*')) {
            (true, true) => AllowPattern::Contains(inner),
            (true, false) => AllowPattern::Suffix(inner),
            (false, true) => AllowPattern::Prefix(inner),
            (false, false) => AllowPattern::Exact(inner),
        })
    }

    pub fn matches(&self, package_name: &str) -> bool {
        match self {
            AllowPattern::Exact(p) => package_name == p,
            AllowPattern::Prefix(p) => package_name.starts_with(p.as_str()),
            AllowPattern::Suffix(p) => package_name.ends_with(p.as_str()),
            AllowPattern::Contains(p) => package_name.contains(p.as_str()),
        }
    }
}

/// Packages that are always allowed: the host app and system UI.
#[derive(Debug, Clone)]
pub struct ForegroundPolicy {
    host_package: String,
    allowlist: Vec<AllowPattern>,
}

impl ForegroundPolicy {
    pub fn new<I, S>(host_package: impl Into<String>, allowlist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            host_package: host_package.into(),
            allowlist: allowlist
                .into_iter()
                .filter_map(|p| AllowPattern::parse(p.as_ref()))
                .collect(),
        }
    }

    pub fn is_exempt(&self, package_name: &str) -> bool {
        package_name == self.host_package || self.allowlist.iter().any(|p| p.matches(package_name))
    }
}

/// Per-event decision state machine.
///
/// Reads block state and grace entries; never writes either.
pub struct DecisionProtocol {
    block_state: BlockState,
    grace: Arc<GraceStore>,
    policy: ForegroundPolicy,
    last_blocked: Mutex<Option<String>>,
}

impl DecisionProtocol {
    pub fn new(block_state: BlockState, grace: Arc<GraceStore>, policy: ForegroundPolicy) -> Self {
        Self {
            block_state,
            grace,
            policy,
            last_blocked: Mutex::new(None),
        }
    }

    /// Shared state is read before `last_blocked` is locked; that lock only
    /// guards the compare-and-set.
    pub fn evaluate(&self, package_name: &str) -> DecisionOutcome {
        if self.policy.is_exempt(package_name) {
            *self.last_blocked.lock() = None;
            tracing::trace!(package = %package_name, "exempt package in foreground");
            return DecisionOutcome::Allow;
        }

        if self.grace.is_active(package_name) {
            tracing::debug!(package = %package_name, "allowed by grace period");
            return DecisionOutcome::Allow;
        }

        let over_budget = self.block_state.contains(package_name);
        let mut last_blocked = self.last_blocked.lock();
        if !over_budget {
            *last_blocked = None;
            return DecisionOutcome::Allow;
        }
        if last_blocked.as_deref() == Some(package_name) {
            return DecisionOutcome::NoOpAlreadyBlocking(package_name.to_string());
        }
        *last_blocked = Some(package_name.to_string());
        drop(last_blocked);

        tracing::info!(package = %package_name, "blocking over-budget app");
        DecisionOutcome::Block(package_name.to_string())
    }

    /// Package whose overlay is believed to be showing, if any.
    pub fn last_blocked(&self) -> Option<String> {
        self.last_blocked.lock().clone()
    }

    /// Return to `Neutral` if `package_name` is the one being blocked.
    ///
    /// Returns true if the state changed.
    pub fn release(&self, package_name: &str) -> bool {
        let mut last_blocked = self.last_blocked.lock();
        if last_blocked.as_deref() == Some(package_name) {
            *last_blocked = None;
            true
        } else {
            false
        }
    }
}
