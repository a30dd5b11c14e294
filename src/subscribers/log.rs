//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [enqueued] task=upload
//! [starting] task=upload attempt=1
//! [failed] task=upload attempt=1
//! [retry] task=upload after_attempt=1 delay_ms=30000
//! [rate-limit-deferred] task=upload wait_ms=12000
//! [lease-acquired] lease=taskgate.work
//! [completed] task=upload attempt=2
//! [lease-released] lease=taskgate.work
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use - implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::TaskEnqueued => {
                if let Some(task) = &e.task {
                    println!("[enqueued] task={task}");
                }
            }
            EventKind::TaskDropped => {
                println!("[dropped] task={:?} reason={:?}", e.task, e.reason);
            }
            EventKind::HandlerMissing => {
                println!("[handler-missing] task={:?}", e.task);
            }
            EventKind::TaskStarting => {
                if let (Some(task), Some(att)) = (&e.task, e.attempt) {
                    println!("[starting] task={task} attempt={att}");
                }
            }
            EventKind::TaskCompleted => {
                println!("[completed] task={:?} attempt={:?}", e.task, e.attempt);
            }
            EventKind::TaskFailed => {
                println!(
                    "[failed] task={:?} attempt={:?} reason={:?}",
                    e.task, e.attempt, e.reason
                );
            }
            EventKind::RetryScheduled => {
                println!(
                    "[retry] task={:?} after_attempt={:?} delay_ms={:?}",
                    e.task, e.attempt, e.delay_ms
                );
            }
            EventKind::RateLimitDeferred => {
                println!(
                    "[rate-limit-deferred] task={:?} wait_ms={:?}",
                    e.task, e.delay_ms
                );
            }
            EventKind::NetworkDeferred => {
                println!("[network-deferred] task={:?}", e.task);
            }
            EventKind::LeaseAcquired => {
                println!("[lease-acquired] lease={:?}", e.lease);
            }
            EventKind::LeaseReleased => {
                println!("[lease-released] lease={:?}", e.lease);
            }
            EventKind::LeaseUnavailable => {
                println!("[lease-unavailable] lease={:?}", e.lease);
            }
            EventKind::LeaseExpired => {
                println!("[lease-expired] lease={:?}", e.lease);
            }
            EventKind::TerminalSignalIgnored => {
                println!(
                    "[terminal-signal-ignored] task={:?} signal={:?}",
                    e.task, e.reason
                );
            }
            EventKind::ManagerStopped => {
                println!("[manager-stopped] reason={:?}", e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
