//! Logical clock abstraction.
//!
//! All scheduling math (initial delays, backoff, rate-limit windows) reads
//! time through [`Clock`] rather than calling `Instant::now()` directly.
//! The instants are [`tokio::time::Instant`]s, so tests running under
//! `#[tokio::test(start_paused = true)]` drive every timer and every
//! readiness decision deterministically with `tokio::time::advance`.

use std::fmt;
use tokio::time::Instant;

/// Source of the scheduler's notion of "now".
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Default clock backed by the tokio runtime.
///
/// Under a paused runtime this follows the virtual clock, which is what the
/// test suite relies on.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl fmt::Debug for SystemClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SystemClock")
    }
}
