//! The over-budget set.
//!
//! Backed by a `watch` channel of copy-on-write snapshots. A reader holding a
//! snapshot keeps it unchanged; each mutation publishes a complete new set.
//! Whoever owns the [`BlockStateWriter`] is the single writer. Inside a
//! [`FocusEngine`](super::FocusEngine) that is the usage aggregator, which
//! publishes each cycle's result with one [`BlockStateWriter::replace`]; the
//! rest of the world gets the read-only [`BlockState`] handle.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::watch;

/// Immutable view of the over-budget packages at one point in time.
pub type BlockSnapshot = Arc<BTreeSet<String>>;

/// Read-only handle to the over-budget set. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BlockState {
    rx: watch::Receiver<BlockSnapshot>,
}

impl BlockState {
    /// Create an empty set, returning its writer and a reader.
    pub fn channel() -> (BlockStateWriter, BlockState) {
        let (tx, rx) = watch::channel(Arc::new(BTreeSet::new()));
        (BlockStateWriter { tx }, BlockState { rx })
    }

    /// The complete current set.
    pub fn current(&self) -> BlockSnapshot {
        self.rx.borrow().clone()
    }

    pub fn contains(&self, package_name: &str) -> bool {
        self.rx.borrow().contains(package_name)
    }

    pub fn len(&self) -> usize {
        self.rx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.borrow().is_empty()
    }

    /// A receiver that is notified whenever the set actually changes.
    pub fn subscribe(&self) -> watch::Receiver<BlockSnapshot> {
        let mut rx = self.rx.clone();
        rx.mark_unchanged();
        rx
    }
}

/// Mutating half of the over-budget set. Not cloneable.
#[derive(Debug)]
pub struct BlockStateWriter {
    tx: watch::Sender<BlockSnapshot>,
}

impl BlockStateWriter {
    /// Publish `packages` as the whole set in one step.
    ///
    /// Subscribers are notified only if membership changed. Returns true in
    /// that case.
    pub fn replace(&self, packages: BTreeSet<String>) -> bool {
        self.tx.send_if_modified(|set| {
            if **set == packages {
                return false;
            }
            *set = Arc::new(packages);
            true
        })
    }

    /// Returns true if the package was not already blocked.
    pub fn add_app(&self, package_name: &str) -> bool {
        self.tx.send_if_modified(|set| {
            if set.contains(package_name) {
                return false;
            }
            Arc::make_mut(set).insert(package_name.to_string())
        })
    }

    /// Returns true if the package was blocked.
    pub fn remove_app(&self, package_name: &str) -> bool {
        self.tx.send_if_modified(|set| {
            if !set.contains(package_name) {
                return false;
            }
            Arc::make_mut(set).remove(package_name)
        })
    }

    /// Returns true if the set was not already empty.
    pub fn clear_all(&self) -> bool {
        self.tx.send_if_modified(|set| {
            if set.is_empty() {
                return false;
            }
            *set = Arc::new(BTreeSet::new());
            true
        })
    }

    pub fn current(&self) -> BlockSnapshot {
        self.tx.borrow().clone()
    }

    pub fn reader(&self) -> BlockState {
        BlockState {
            rx: self.tx.subscribe(),
        }
    }
}
