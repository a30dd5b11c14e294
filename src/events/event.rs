//! # Runtime events emitted by the task manager.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Request events**: enqueue outcomes (accepted, dropped, no handler)
//! - **Execution events**: run flow (starting, completed, failed, retry)
//! - **Gating events**: requests deferred by rate limits or connectivity
//! - **Lease events**: host execution-lease transitions
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! task identity, reasons, attempt numbers, and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskgate::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RetryScheduled)
//!     .with_task("upload")
//!     .with_attempt(2)
//!     .with_delay(Duration::from_secs(60));
//!
//! assert_eq!(ev.kind, EventKind::RetryScheduled);
//! assert_eq!(ev.task.as_deref(), Some("upload"));
//! assert_eq!(ev.delay_ms, Some(60_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Request events ===
    /// A request was accepted into its identity's queue.
    ///
    /// Sets:
    /// - `task`: task identity
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskEnqueued,

    /// A request was discarded by a conflict policy.
    ///
    /// Emitted for the *new* request under `Keep`, and once per *evicted*
    /// queued request under `Replace`.
    ///
    /// Sets:
    /// - `task`: task identity
    /// - `reason`: `"keep"` or `"replace"`
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskDropped,

    /// A request arrived for an identity with no registered handler and was
    /// discarded.
    ///
    /// Sets:
    /// - `task`: task identity
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    HandlerMissing,

    // === Execution events ===
    /// An execution is starting an attempt.
    ///
    /// Sets:
    /// - `task`: task identity
    /// - `attempt`: attempt number (1-based, per request)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskStarting,

    /// An execution reported success; the request is finished.
    ///
    /// Sets:
    /// - `task`: task identity
    /// - `attempt`: attempt number that succeeded
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskCompleted,

    /// An execution reported failure for this attempt.
    ///
    /// Sets:
    /// - `task`: task identity
    /// - `attempt`: attempt number that failed
    /// - `reason`: failure note (set when the handle was dropped without a
    ///   terminal signal)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskFailed,

    /// A failed request was requeued with a backoff delay.
    ///
    /// Sets:
    /// - `task`: task identity
    /// - `attempt`: attempt number that failed
    /// - `delay_ms`: delay before the next attempt (ms)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RetryScheduled,

    // === Gating events ===
    /// The front request is blocked by one or more rate-limit keys.
    ///
    /// Sets:
    /// - `task`: task identity
    /// - `delay_ms`: wait until the limits clear (ms)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RateLimitDeferred,

    /// The front request requires network connectivity and none is available.
    /// The request stays queued and is re-evaluated on the next
    /// connectivity change.
    ///
    /// Sets:
    /// - `task`: task identity
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    NetworkDeferred,

    // === Lease events ===
    /// An execution lease was granted by the host.
    ///
    /// Sets:
    /// - `lease`: lease name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    LeaseAcquired,

    /// A held lease was returned to the host.
    ///
    /// Sets:
    /// - `lease`: lease name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    LeaseReleased,

    /// The host refused a lease request; dispatch is parked until the next
    /// foreground/active transition.
    ///
    /// Sets:
    /// - `lease`: lease name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    LeaseUnavailable,

    /// The host revoked a held lease. Expiration handlers of running
    /// executions were notified; the manager itself completes or fails
    /// nothing.
    ///
    /// Sets:
    /// - `lease`: lease name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    LeaseExpired,

    // === Diagnostics ===
    /// A terminal signal arrived for an execution that already finished.
    /// The signal was ignored; queue state is unaffected.
    ///
    /// Sets:
    /// - `task`: task identity
    /// - `reason`: which signal was ignored
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TerminalSignalIgnored,

    /// The manager stopped processing (explicit shutdown or host
    /// termination). Pending requests are discarded, not persisted.
    ///
    /// Sets:
    /// - `reason`: `"shutdown"` or `"terminate"`
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ManagerStopped,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    /// Delay associated with the event in milliseconds (retry backoff or
    /// rate-limit wait).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (drop cause, ignored signal, stop cause).
    pub reason: Option<Arc<str>>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Task identity, if applicable.
    pub task: Option<Arc<str>>,
    /// Lease name, for lease events.
    pub lease: Option<&'static str>,
    /// Event classification.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            kind,
            at: SystemTime::now(),
            attempt: None,
            reason: None,
            delay_ms: None,
            task: None,
            lease: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task identity.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a lease name.
    #[inline]
    pub fn with_lease(mut self, lease: &'static str) -> Self {
        self.lease = Some(lease);
        self
    }
}
