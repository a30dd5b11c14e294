//! # Sliding-window rate limiter.
//!
//! [`RateLimiter`] tracks named consumption buckets. Each bucket has a rule
//! (`rate` events per `window`) and a pruned list of consumption timestamps.
//! The scheduler consults [`RateLimiter::wait_time`] before dispatching a
//! request and records one consumption per key, at dispatch time only, via
//! [`RateLimiter::track`].
//!
//! ## Rules
//! - A key without a configured rule never blocks (`wait_time` is zero) and
//!   records nothing.
//! - Reconfiguring a rule keeps the already-recorded timestamps; they are
//!   re-evaluated against the new window.
//! - `track` is public: hosts may record consumptions that happen outside
//!   the scheduler (the scheduler then respects them).
//! - Timestamps older than the window are pruned lazily on access.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskgate::RateLimiter;
//!
//! # async fn demo() {
//! let limiter = RateLimiter::default();
//! limiter.set_rule("uploads", 10, Duration::from_secs(60)).unwrap();
//! limiter.track("uploads");
//! assert_eq!(limiter.wait_time("uploads"), Duration::ZERO); // 1 of 10 used
//! # }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::clock::{Clock, SystemClock};
use crate::error::RateLimitError;

/// One named bucket: the rule plus recorded consumptions.
struct Bucket {
    rate: u32,
    window: Duration,
    hits: VecDeque<Instant>,
}

impl Bucket {
    /// Drops timestamps that have aged out of the window.
    fn prune(&mut self, now: Instant) {
        while let Some(hit) = self.hits.front() {
            if now.duration_since(*hit) >= self.window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }

    /// Time until one more consumption would fit, zero if it fits now.
    fn wait(&mut self, now: Instant) -> Duration {
        self.prune(now);
        let n = self.hits.len();
        let rate = self.rate as usize;
        if n < rate {
            return Duration::ZERO;
        }
        // The (n - rate)-th oldest hit is the last one that must age out
        // before the count drops below the rate.
        let gate = self.hits[n - rate];
        match gate.checked_add(self.window) {
            Some(deadline) => deadline.duration_since(now),
            // A window too large to represent never frees up.
            None => Duration::MAX,
        }
    }
}

/// Named sliding-window rate limits, shareable across threads.
///
/// Interior mutability behind a `Mutex`; all operations are synchronous and
/// callable from non-async code. Shared between the manager actor and the
/// host as `Arc<RateLimiter>`.
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    /// Creates a limiter reading time from the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Sets or replaces the rule for `key`: at most `rate` consumptions per
    /// `window`.
    ///
    /// Rejects `rate < 1` and zero windows with
    /// [`RateLimitError::InvalidConfig`]; nothing is mutated on rejection.
    /// Replacing a rule keeps the consumptions already recorded for the key.
    pub fn set_rule(
        &self,
        key: impl Into<String>,
        rate: u32,
        window: Duration,
    ) -> Result<(), RateLimitError> {
        let key = key.into();
        if rate < 1 || window.is_zero() {
            return Err(RateLimitError::InvalidConfig { key, rate, window });
        }

        let mut buckets = self.lock();
        let bucket = buckets.entry(key).or_insert_with(|| Bucket {
            rate,
            window,
            hits: VecDeque::new(),
        });
        bucket.rate = rate;
        bucket.window = window;
        Ok(())
    }

    /// Records one consumption for `key` at the current instant.
    ///
    /// No-op for keys without a rule.
    pub fn track(&self, key: &str) {
        let now = self.clock.now();
        let mut buckets = self.lock();
        if let Some(bucket) = buckets.get_mut(key) {
            bucket.prune(now);
            bucket.hits.push_back(now);
        }
    }

    /// Returns how long until one more consumption for `key` would fit
    /// within its rule. Zero for unconfigured keys and for keys under their
    /// rate.
    pub fn wait_time(&self, key: &str) -> Duration {
        let now = self.clock.now();
        let mut buckets = self.lock();
        match buckets.get_mut(key) {
            Some(bucket) => bucket.wait(now),
            None => Duration::ZERO,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Bucket>> {
        match self.buckets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for RateLimiter {
    /// Returns a limiter over the tokio-backed [`SystemClock`].
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn test_unconfigured_key_never_blocks() {
        let limiter = RateLimiter::default();
        limiter.track("ghost");
        assert_eq!(limiter.wait_time("ghost"), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_rules_are_rejected() {
        let limiter = RateLimiter::default();

        let err = limiter
            .set_rule("a", 0, Duration::from_secs(1))
            .unwrap_err();
        assert_eq!(err.as_label(), "rate_limit_invalid_config");

        assert!(limiter.set_rule("b", 1, Duration::ZERO).is_err());

        // Nothing was stored for either key.
        limiter.track("a");
        assert_eq!(limiter.wait_time("a"), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_under_rate_has_zero_wait() {
        let limiter = RateLimiter::default();
        limiter.set_rule("k", 3, Duration::from_secs(10)).unwrap();

        limiter.track("k");
        limiter.track("k");
        assert_eq!(limiter.wait_time("k"), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_counts_down_to_oldest_expiry() {
        let limiter = RateLimiter::default();
        limiter.set_rule("k", 1, Duration::from_secs(10)).unwrap();

        limiter.track("k");
        assert_eq!(limiter.wait_time("k"), Duration::from_secs(10));

        advance(Duration::from_secs(4)).await;
        assert_eq!(limiter.wait_time("k"), Duration::from_secs(6));

        advance(Duration::from_secs(6)).await;
        assert_eq!(limiter.wait_time("k"), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_multi_rate_waits_on_the_gating_hit() {
        let limiter = RateLimiter::default();
        limiter.set_rule("k", 2, Duration::from_secs(10)).unwrap();

        limiter.track("k");
        advance(Duration::from_secs(3)).await;
        limiter.track("k");

        // Both hits are in the window; the first one gates and expires at
        // t=10, so at t=3 the wait is 7s.
        assert_eq!(limiter.wait_time("k"), Duration::from_secs(7));

        advance(Duration::from_secs(7)).await;
        assert_eq!(limiter.wait_time("k"), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconfigure_keeps_recorded_hits() {
        let limiter = RateLimiter::default();
        limiter.set_rule("k", 1, Duration::from_secs(100)).unwrap();
        limiter.track("k");
        assert_eq!(limiter.wait_time("k"), Duration::from_secs(100));

        // Shrinking the window re-evaluates the same hit.
        limiter.set_rule("k", 1, Duration::from_secs(2)).unwrap();
        assert_eq!(limiter.wait_time("k"), Duration::from_secs(2));

        advance(Duration::from_secs(2)).await;
        assert_eq!(limiter.wait_time("k"), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hits_prune_as_the_window_slides() {
        let limiter = RateLimiter::default();
        limiter.set_rule("k", 2, Duration::from_secs(10)).unwrap();

        limiter.track("k");
        advance(Duration::from_secs(9)).await;
        limiter.track("k");
        assert!(limiter.wait_time("k") > Duration::ZERO);

        // First hit ages out at t=10; one slot frees up.
        advance(Duration::from_secs(1)).await;
        assert_eq!(limiter.wait_time("k"), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_window_saturates_the_wait() {
        let limiter = RateLimiter::default();
        limiter.set_rule("k", 1, Duration::MAX).unwrap();

        limiter.track("k");
        assert_eq!(limiter.wait_time("k"), Duration::MAX);
    }
}
