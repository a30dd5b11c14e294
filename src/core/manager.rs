//! # TaskManager: the public handle for deferred, condition-gated work.
//!
//! A [`TaskManager`] accepts named [`TaskRequest`]s and runs each identity's
//! registered handler once every dispatch condition passes: conflict policy
//! applied, initial delay elapsed, connectivity present if required,
//! rate-limit keys under budget, execution lease granted. Failures retry
//! with backoff; at most one execution per identity is ever in flight.
//!
//! The handle is cheap to share (`Arc`); all methods are non-blocking sends
//! into the actor loop except [`TaskManager::snapshot`], which round-trips.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskgate::{Config, ConflictPolicy, HandlerFn, RunningTask, TaskManager, TaskRequest};
//!
//! # async fn demo() {
//! let manager = TaskManager::builder(Config::default()).build();
//!
//! manager.set_rate_limit("uploads", 10, Duration::from_secs(60)).unwrap();
//! manager.register(
//!     "upload",
//!     HandlerFn::arc(|task: RunningTask| async move {
//!         // do the work, then report how it went
//!         task.task_completed();
//!     }),
//! );
//!
//! manager.enqueue(
//!     TaskRequest::new("upload")
//!         .with_conflict_policy(ConflictPolicy::Replace)
//!         .with_requires_network(true)
//!         .with_rate_limit("uploads"),
//! );
//! # }
//! ```
//!
//! ## Shutdown
//! [`TaskManager::shutdown`] (or dropping the last handle) stops the actor:
//! pending requests are discarded, held leases are returned, and a final
//! [`EventKind::ManagerStopped`](crate::EventKind::ManagerStopped) event is
//! published. Requests enqueued after shutdown are silently ignored.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::dispatch::Dispatch;
use crate::error::RateLimitError;
use crate::events::{Bus, Event};
use crate::rate_limit::RateLimiter;
use crate::tasks::{HandlerRef, TaskRequest};

use super::actor::Command;
use super::builder::TaskManagerBuilder;
use super::snapshot::Snapshot;

/// Handle to a running task-manager actor.
///
/// Created by [`TaskManager::builder`]. Clones of the returned `Arc` all
/// drive the same actor; the actor stops when [`TaskManager::shutdown`] is
/// called, the host announces termination, or the last handle drops.
pub struct TaskManager {
    tx: mpsc::UnboundedSender<Command>,
    bus: Bus,
    limiter: Arc<RateLimiter>,
    cancel: CancellationToken,
}

impl TaskManager {
    /// Lease requested while any request is queued or running, returned when
    /// the last one drains.
    pub const WORK_LEASE_NAME: &'static str = "taskgate.work";

    /// Lease requested on an entering-background transition to cover the
    /// shortest rate-limit wait (plus margin) among blocked requests.
    pub const RATE_LIMIT_LEASE_NAME: &'static str = "taskgate.rate_limit_wait";

    /// Starts building a manager with the given configuration.
    pub fn builder(cfg: Config) -> TaskManagerBuilder {
        TaskManagerBuilder::new(cfg)
    }

    pub(super) fn new(
        tx: mpsc::UnboundedSender<Command>,
        bus: Bus,
        limiter: Arc<RateLimiter>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            tx,
            bus,
            limiter,
            cancel,
        }
    }

    /// Binds `handler` to a task identity, running on the default
    /// dispatcher. Registering the same identity again replaces the handler;
    /// already-queued requests run against the new one.
    pub fn register(&self, task_id: impl Into<Arc<str>>, handler: HandlerRef) {
        let _ = self.tx.send(Command::Register {
            task_id: task_id.into(),
            dispatcher: None,
            handler,
        });
    }

    /// Like [`TaskManager::register`], with a dedicated execution context
    /// for this identity's handler runs and re-check timers.
    pub fn register_on(
        &self,
        task_id: impl Into<Arc<str>>,
        dispatcher: Arc<dyn Dispatch>,
        handler: HandlerRef,
    ) {
        let _ = self.tx.send(Command::Register {
            task_id: task_id.into(),
            dispatcher: Some(dispatcher),
            handler,
        });
    }

    /// Submits a request. Returns immediately; admission, gating, and
    /// execution happen on the actor. Requests for identities without a
    /// registered handler are dropped with a diagnostic event.
    pub fn enqueue(&self, request: TaskRequest) {
        let _ = self.tx.send(Command::Enqueue { request });
    }

    /// Sets or replaces the sliding-window rule for a rate-limit key: at
    /// most `rate` dispatches per `window`.
    pub fn set_rate_limit(
        &self,
        key: impl Into<String>,
        rate: u32,
        window: Duration,
    ) -> Result<(), RateLimitError> {
        self.limiter.set_rule(key, rate, window)
    }

    /// The shared rate limiter. Hosts can record consumptions that happen
    /// outside the scheduler; dispatch decisions respect them.
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// A receiver observing subsequent runtime events. Lossy under lag; see
    /// [`Bus`](crate::Bus).
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Current scheduler state, consistent with everything sent on this
    /// handle before the call. Returns an empty snapshot after shutdown.
    pub async fn snapshot(&self) -> Snapshot {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(Command::Snapshot { reply })
            .is_err()
        {
            return Snapshot::default();
        }
        rx.await.unwrap_or_default()
    }

    /// Stops the actor. Pending requests are discarded; held leases are
    /// returned to the host.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
