//! Cluster role capability deciding which node runs maintenance sweeps.

use std::sync::atomic::{AtomicBool, Ordering};

/// Answers whether this node is the elected coordinator of its cluster.
pub trait ClusterRole: Send + Sync {
    fn is_coordinator(&self) -> bool;
}

/// A standalone node, always its own coordinator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleNode;

impl ClusterRole for SingleNode {
    fn is_coordinator(&self) -> bool {
        true
    }
}

/// Role assigned from outside, e.g. by configuration or an election callback.
#[derive(Debug, Default)]
pub struct StaticRole {
    coordinator: AtomicBool,
}

impl StaticRole {
    pub fn new(coordinator: bool) -> Self {
        Self {
            coordinator: AtomicBool::new(coordinator),
        }
    }

    pub fn set_coordinator(&self, coordinator: bool) {
        self.coordinator.store(coordinator, Ordering::SeqCst);
    }
}

impl ClusterRole for StaticRole {
    fn is_coordinator(&self) -> bool {
        self.coordinator.load(Ordering::SeqCst)
    }
}
