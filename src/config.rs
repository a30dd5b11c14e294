//! # Global runtime configuration.
//!
//! Provides [`Config`], the settings consumed by
//! [`TaskManagerBuilder`](crate::TaskManagerBuilder) when wiring a manager.
//!
//! Config covers three concerns:
//! 1. **Event system**: bus capacity for event delivery.
//! 2. **Retry behavior**: the backoff policy applied after a failed attempt.
//! 3. **Background wait budget**: how long the manager is willing to hold the
//!    rate-limit-wait lease when the app backgrounds with rate-limited work
//!    still queued.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskgate::Config;
//!
//! let mut cfg = Config::default();
//! cfg.bus_capacity = 256;
//! cfg.max_background_wait = Duration::from_secs(30);
//! ```

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Global configuration for the task manager runtime.
///
/// ## Field semantics
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by the bus)
/// - `backoff`: retry delay policy applied when an execution reports failure
/// - `background_wait_margin`: safety margin added on top of the shortest
///   rate-limit wait when sizing the rate-limit-wait lease
/// - `max_background_wait`: upper bound on how long the rate-limit-wait
///   lease may be held; waits that would exceed it are not waited for at all
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors over
/// repeating clamp logic at call sites.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events will
    /// receive `Lagged` and skip older items. Minimum value is 1 (enforced
    /// by the bus).
    pub bus_capacity: usize,

    /// Backoff policy for retrying failed executions.
    ///
    /// The default ladder is 30s after the first failure, 60s after the
    /// second, then 120s for every failure after that, with no jitter.
    pub backoff: BackoffPolicy,

    /// Safety margin added to the shortest rate-limit wait when the manager
    /// sizes the rate-limit-wait lease on an entering-background transition.
    pub background_wait_margin: Duration,

    /// Maximum time the rate-limit-wait lease may be held.
    ///
    /// If the shortest rate-limit wait plus [`Config::background_wait_margin`]
    /// exceeds this budget, the manager does not wait at all: it requests and
    /// immediately releases the lease, and the blocked requests resume on the
    /// next foreground transition.
    pub max_background_wait: Duration,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    ///
    /// The bus should use this value to avoid constructing an invalid
    /// channel.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the total rate-limit-wait lease duration for the given
    /// shortest wait, or `None` when the wait exceeds the background budget
    /// (meaning: do not hold the lease at all).
    #[inline]
    pub fn background_hold(&self, shortest_wait: Duration) -> Option<Duration> {
        let total = shortest_wait.checked_add(self.background_wait_margin)?;
        if total <= self.max_background_wait {
            Some(total)
        } else {
            None
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024` (good baseline)
    /// - `backoff = BackoffPolicy::default()` (30s, 60s, then 120s capped)
    /// - `background_wait_margin = 5s`
    /// - `max_background_wait = 20s`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            backoff: BackoffPolicy::default(),
            background_wait_margin: Duration::from_secs(5),
            max_background_wait: Duration::from_secs(20),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_capacity_clamps_to_one() {
        let mut cfg = Config::default();
        cfg.bus_capacity = 0;
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn test_background_hold_within_budget() {
        let cfg = Config::default();
        // 14s + 5s margin = 19s, inside the 20s budget.
        assert_eq!(
            cfg.background_hold(Duration::from_secs(14)),
            Some(Duration::from_secs(19))
        );
        // 15s + 5s = 20s lands exactly on the boundary.
        assert_eq!(
            cfg.background_hold(Duration::from_secs(15)),
            Some(Duration::from_secs(20))
        );
    }

    #[test]
    fn test_background_hold_beyond_budget_is_none() {
        let cfg = Config::default();
        // 16s + 5s margin = 21s, over the 20s budget.
        assert_eq!(cfg.background_hold(Duration::from_secs(16)), None);
        // An overflowing total is over any budget.
        assert_eq!(cfg.background_hold(Duration::MAX), None);
    }
}
