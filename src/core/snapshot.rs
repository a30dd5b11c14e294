//! Point-in-time view of scheduler state.
//!
//! Taken through the actor ([`TaskManager::snapshot`](super::TaskManager::snapshot)),
//! so the numbers are consistent with command order: every enqueue and
//! terminal signal sent before the snapshot request is reflected in it.

use std::collections::BTreeMap;

/// Counters for one task identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LaneSnapshot {
    /// Requests queued and waiting (delay, network, rate limit, or just
    /// behind the running execution).
    pub queued: usize,
    /// Whether an execution is in flight.
    pub running: bool,
}

/// Scheduler state at one instant.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    /// Total queued requests across identities.
    pub pending: usize,
    /// Total in-flight executions.
    pub running: usize,
    /// Per-identity counters. Identities with nothing queued and nothing
    /// running are omitted.
    pub lanes: BTreeMap<String, LaneSnapshot>,
    /// Whether the work lease is held.
    pub work_lease_held: bool,
    /// Whether the rate-limit-wait lease is held.
    pub rate_limit_lease_held: bool,
    /// Whether dispatch is parked after a refused or revoked work lease.
    pub parked: bool,
}

impl Snapshot {
    /// True when nothing is queued or running anywhere.
    pub fn is_idle(&self) -> bool {
        self.pending == 0 && self.running == 0
    }
}
