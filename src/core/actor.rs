//! # Manager actor: the single-writer orchestration loop.
//!
//! All mutable scheduler state (lanes, leases, registrations) lives inside
//! one actor task. Public [`TaskManager`] handles send [`Command`]s over an
//! unbounded channel; host signals join the same loop through their own
//! channels. No locks, no partial views.
//!
//! ## Architecture
//! ```text
//! TaskManager handles ──commands───► ┌──────────────────────────────┐
//! RunningTask handles ──finished───► │          actor loop          │──► Bus
//! re-check timers ──────recheck────► │   lanes: id → queue + slot   │
//! LifecycleSource ───transitions───► │   leases: work / rate-wait   │──► Dispatch
//! NetworkMonitor ───────edges──────► │   registrations: handlers    │
//!                                    └──────────────────────────────┘
//! ```
//!
//! ## Dispatch conditions
//! The head of a lane dispatches only when every condition passes, checked
//! in order: no running execution for the identity, initial/retry delay
//! elapsed, network present if required, every rate-limit key reports zero
//! wait, and an execution lease is held. Rate-limit budget is consumed at
//! dispatch, never at enqueue.
//!
//! ## Re-checks
//! Time-based gates (delays, rate limits) arm at most one cancelable
//! re-check per lane, keyed by a timer id. A newer gate replaces the pending
//! re-check only when it fires earlier; stale timer wake-ups are discarded
//! by id.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::config::Config;
use crate::dispatch::{DelayHandle, Dispatch};
use crate::events::{Bus, Event, EventKind};
use crate::hosts::{Lease, LeaseProvider, LifecycleEvent, LifecycleSource, NetworkMonitor};
use crate::rate_limit::RateLimiter;
use crate::tasks::{HandlerRef, RunningTask, TaskRequest};

use super::lane::{Admission, Lane, PendingRecheck, QueuedRequest, RunningRecord};
use super::manager::TaskManager;
use super::snapshot::{LaneSnapshot, Snapshot};

/// Terminal outcome reported for one dispatched execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The handler reported success.
    Completed,
    /// The handler reported failure; the request is retried with backoff.
    Failed,
    /// Every handle clone was dropped without a terminal signal. Treated as
    /// a failure.
    Abandoned,
}

/// Control messages processed by the actor.
///
/// Everything that mutates scheduler state arrives as a command, in channel
/// order. Commands are never dropped; the channel is unbounded.
pub(crate) enum Command {
    /// Binds (or replaces) the handler and dispatcher for an identity.
    Register {
        task_id: Arc<str>,
        dispatcher: Option<Arc<dyn Dispatch>>,
        handler: HandlerRef,
    },
    /// Admits a request into its identity's lane.
    Enqueue { request: TaskRequest },
    /// Terminal signal from a [`RunningTask`] handle.
    Finished {
        task_id: Arc<str>,
        run_id: u64,
        outcome: Outcome,
    },
    /// A lane's readiness re-check timer fired.
    Recheck { task_id: Arc<str>, timer_id: u64 },
    /// The rate-limit-wait lease hold elapsed.
    RateLimitLeaseElapsed { timer_id: u64 },
    /// The host revoked a held lease.
    LeaseExpired { name: &'static str },
    /// State introspection request.
    Snapshot { reply: oneshot::Sender<Snapshot> },
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Register { task_id, .. } => f
                .debug_struct("Register")
                .field("task_id", task_id)
                .finish_non_exhaustive(),
            Command::Enqueue { request } => {
                f.debug_struct("Enqueue").field("request", request).finish()
            }
            Command::Finished {
                task_id,
                run_id,
                outcome,
            } => f
                .debug_struct("Finished")
                .field("task_id", task_id)
                .field("run_id", run_id)
                .field("outcome", outcome)
                .finish(),
            Command::Recheck { task_id, timer_id } => f
                .debug_struct("Recheck")
                .field("task_id", task_id)
                .field("timer_id", timer_id)
                .finish(),
            Command::RateLimitLeaseElapsed { timer_id } => f
                .debug_struct("RateLimitLeaseElapsed")
                .field("timer_id", timer_id)
                .finish(),
            Command::LeaseExpired { name } => {
                f.debug_struct("LeaseExpired").field("name", name).finish()
            }
            Command::Snapshot { .. } => f.write_str("Snapshot"),
        }
    }
}

/// Handler and execution context bound to one identity.
pub(super) struct Registration {
    handler: HandlerRef,
    dispatcher: Arc<dyn Dispatch>,
}

/// Why a lane's head cannot dispatch right now, or [`Readiness::Ready`].
enum Readiness {
    /// Nothing queued.
    Idle,
    /// An execution is in flight; the queue waits for it.
    Running,
    /// The head's initial/retry delay has this much left.
    Delayed(Duration),
    /// The head requires connectivity and none is present.
    AwaitingNetwork,
    /// A rate-limit key blocks the head for this long.
    RateLimited(Duration),
    /// Every condition but the lease passes.
    Ready,
}

/// Saturation horizon for deadline math, roughly thirty years.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + wait`, saturating far in the future instead of panicking when the
/// sum is not representable.
fn deadline_after(now: Instant, wait: Duration) -> Instant {
    now.checked_add(wait).unwrap_or_else(|| now + FAR_FUTURE)
}

/// The orchestration actor. Owned by the task spawned in
/// [`TaskManagerBuilder::build`](super::TaskManagerBuilder::build); all
/// methods run on that task.
pub(crate) struct Actor {
    pub(super) cfg: Config,
    pub(super) bus: Bus,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) limiter: Arc<RateLimiter>,
    pub(super) leases: Arc<dyn LeaseProvider>,
    pub(super) network: Arc<dyn NetworkMonitor>,
    pub(super) lifecycle: Arc<dyn LifecycleSource>,
    pub(super) default_dispatcher: Arc<dyn Dispatch>,
    /// Loopback sender cloned into timers and running-task handles.
    pub(super) tx: mpsc::UnboundedSender<Command>,

    pub(super) registrations: HashMap<Arc<str>, Registration>,
    pub(super) lanes: HashMap<Arc<str>, Lane>,
    pub(super) work_lease: Option<Box<dyn Lease>>,
    pub(super) rate_lease: Option<Box<dyn Lease>>,
    pub(super) rate_lease_timer: Option<(u64, DelayHandle)>,
    /// Set when the host refused or revoked the work lease; cleared on the
    /// next foreground/active transition.
    pub(super) parked: bool,
    pub(super) next_run_id: u64,
    pub(super) next_timer_id: u64,
}

impl Actor {
    /// Runs the loop until cancellation or host termination.
    pub(crate) async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Command>,
        cancel: CancellationToken,
    ) {
        let mut lifecycle_rx = self.lifecycle.subscribe();
        let mut network_rx = self.network.watch();
        let mut lifecycle_open = true;
        let mut network_open = true;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.stop("shutdown");
                    break;
                }
                Some(cmd) = rx.recv() => self.on_command(cmd),
                event = lifecycle_rx.recv(), if lifecycle_open => match event {
                    Ok(LifecycleEvent::WillTerminate) => {
                        self.stop("terminate");
                        break;
                    }
                    Ok(event) => self.on_lifecycle(event),
                    // Transitions are latest-wins; a gap is survivable.
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => lifecycle_open = false,
                },
                changed = network_rx.changed(), if network_open => match changed {
                    Ok(()) => {
                        let connected = *network_rx.borrow_and_update();
                        self.on_network_changed(connected);
                    }
                    Err(_) => network_open = false,
                },
            }
        }
    }

    fn on_command(&mut self, cmd: Command) {
        match cmd {
            Command::Register {
                task_id,
                dispatcher,
                handler,
            } => self.on_register(task_id, dispatcher, handler),
            Command::Enqueue { request } => self.on_enqueue(request),
            Command::Finished {
                task_id,
                run_id,
                outcome,
            } => self.on_finished(task_id, run_id, outcome),
            Command::Recheck { task_id, timer_id } => self.on_recheck(task_id, timer_id),
            Command::RateLimitLeaseElapsed { timer_id } => self.on_rate_lease_elapsed(timer_id),
            Command::LeaseExpired { name } => self.on_lease_expired(name),
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    /// Last registration wins; already-queued requests keep waiting and run
    /// against the new handler.
    fn on_register(
        &mut self,
        task_id: Arc<str>,
        dispatcher: Option<Arc<dyn Dispatch>>,
        handler: HandlerRef,
    ) {
        let dispatcher = dispatcher.unwrap_or_else(|| Arc::clone(&self.default_dispatcher));
        self.registrations
            .insert(task_id, Registration { handler, dispatcher });
    }

    fn on_enqueue(&mut self, request: TaskRequest) {
        let Some((task_id, _)) = self.registrations.get_key_value(request.task_id()) else {
            self.bus
                .publish(Event::new(EventKind::HandlerMissing).with_task(request.task_id()));
            return;
        };
        let task_id = Arc::clone(task_id);

        let delay = request.initial_delay();
        let not_before = if delay.is_zero() {
            None
        } else {
            Some(deadline_after(self.clock.now(), delay))
        };

        let lane = self
            .lanes
            .entry(Arc::clone(&task_id))
            .or_insert_with(Lane::new);
        match lane.admit(QueuedRequest {
            request,
            not_before,
            attempts: 0,
        }) {
            Admission::Rejected => {
                self.bus.publish(
                    Event::new(EventKind::TaskDropped)
                        .with_task(Arc::clone(&task_id))
                        .with_reason("keep"),
                );
                return;
            }
            Admission::Accepted { evicted } => {
                for _ in 0..evicted {
                    self.bus.publish(
                        Event::new(EventKind::TaskDropped)
                            .with_task(Arc::clone(&task_id))
                            .with_reason("replace"),
                    );
                }
                self.bus
                    .publish(Event::new(EventKind::TaskEnqueued).with_task(Arc::clone(&task_id)));
            }
        }

        // The lease is held for the whole pending window, delay included.
        self.ensure_work_lease();
        self.evaluate_lane(&task_id);
    }

    fn on_finished(&mut self, task_id: Arc<str>, run_id: u64, outcome: Outcome) {
        let record = {
            let Some(lane) = self.lanes.get_mut(&task_id) else {
                return;
            };
            match lane.finish(run_id) {
                Some(record) => record,
                // Stale signal from an already-finished run; lane state stands.
                None => return,
            }
        };
        let attempt = record.attempts + 1;

        match outcome {
            Outcome::Completed => {
                self.bus.publish(
                    Event::new(EventKind::TaskCompleted)
                        .with_task(Arc::clone(&task_id))
                        .with_attempt(attempt),
                );
                self.evaluate_lane(&task_id);
            }
            Outcome::Failed | Outcome::Abandoned => {
                let mut failed = Event::new(EventKind::TaskFailed)
                    .with_task(Arc::clone(&task_id))
                    .with_attempt(attempt);
                if outcome == Outcome::Abandoned {
                    failed = failed.with_reason("abandoned");
                }
                self.bus.publish(failed);

                let delay = self.cfg.backoff.next(record.attempts);
                self.bus.publish(
                    Event::new(EventKind::RetryScheduled)
                        .with_task(Arc::clone(&task_id))
                        .with_attempt(attempt)
                        .with_delay(delay),
                );

                let not_before = Some(deadline_after(self.clock.now(), delay));
                if let Some(lane) = self.lanes.get_mut(&task_id) {
                    lane.requeue_front(QueuedRequest {
                        request: record.request,
                        not_before,
                        attempts: attempt,
                    });
                }
                self.evaluate_lane(&task_id);
            }
        }
    }

    fn on_recheck(&mut self, task_id: Arc<str>, timer_id: u64) {
        let Some(lane) = self.lanes.get_mut(&task_id) else {
            return;
        };
        if !lane.clear_recheck_if(timer_id) {
            // A newer timer superseded this one after it fired.
            return;
        }
        self.evaluate_lane(&task_id);
    }

    fn on_network_changed(&mut self, connected: bool) {
        // Loss of connectivity stops nothing: queued requests stay queued
        // and running executions are the handler's business. Only the
        // connected edge unblocks work.
        if connected {
            self.evaluate_all();
        }
    }

    fn on_lifecycle(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::EnteredForeground | LifecycleEvent::BecameActive => {
                self.parked = false;
                if self.total_outstanding() > 0 {
                    self.ensure_work_lease();
                }
                self.evaluate_all();
            }
            LifecycleEvent::EnteredBackground => self.on_entered_background(),
            // Handled by the run loop.
            LifecycleEvent::WillTerminate => {}
        }
    }

    /// Backgrounding is a best-effort flush: pending delays are bypassed so
    /// work completes before the host suspends the process, and a short
    /// lease covers rate-limited stragglers.
    fn on_entered_background(&mut self) {
        self.fast_forward_delays();
        self.evaluate_all();
        self.request_rate_limit_lease();
    }

    /// Clears `not_before` on every queued request that is waiting purely on
    /// its timer. Requests also blocked by network or a rate limit keep
    /// their delay.
    fn fast_forward_delays(&mut self) {
        let connected = self.network.is_connected();
        for lane in self.lanes.values_mut() {
            let mut changed = false;
            for record in lane.queued_mut() {
                if record.not_before.is_none() {
                    continue;
                }
                if record.request.options().requires_network && !connected {
                    continue;
                }
                let wait = record
                    .request
                    .rate_limit_keys()
                    .iter()
                    .map(|key| self.limiter.wait_time(key))
                    .max()
                    .unwrap_or(Duration::ZERO);
                if !wait.is_zero() {
                    continue;
                }
                record.not_before = None;
                changed = true;
            }
            if changed {
                lane.cancel_recheck();
            }
        }
    }

    /// Requests the rate-limit-wait lease and holds it for the shortest
    /// blocked wait plus the configured margin, or releases it immediately
    /// when no wait fits the budget.
    fn request_rate_limit_lease(&mut self) {
        let now = self.clock.now();
        let connected = self.network.is_connected();
        let mut shortest: Option<Duration> = None;
        for lane in self.lanes.values() {
            if lane.is_running() {
                continue;
            }
            let Some(head) = lane.front() else {
                continue;
            };
            if head.not_before.is_some_and(|not_before| not_before > now) {
                continue;
            }
            if head.request.options().requires_network && !connected {
                continue;
            }
            let wait = self.max_rate_wait(head.request.rate_limit_keys());
            if wait.is_zero() {
                continue;
            }
            shortest = Some(shortest.map_or(wait, |s| s.min(wait)));
        }

        // A lease from a previous background transition is superseded.
        self.drop_rate_lease();

        let Some(mut lease) = self.leases.request(TaskManager::RATE_LIMIT_LEASE_NAME) else {
            self.bus.publish(
                Event::new(EventKind::LeaseUnavailable)
                    .with_lease(TaskManager::RATE_LIMIT_LEASE_NAME),
            );
            return;
        };
        let tx = self.tx.clone();
        lease.set_expiration_handler(Box::new(move || {
            let _ = tx.send(Command::LeaseExpired {
                name: TaskManager::RATE_LIMIT_LEASE_NAME,
            });
        }));
        self.bus.publish(
            Event::new(EventKind::LeaseAcquired).with_lease(TaskManager::RATE_LIMIT_LEASE_NAME),
        );

        match shortest.and_then(|wait| self.cfg.background_hold(wait)) {
            Some(hold) => {
                let timer_id = self.next_timer_id;
                self.next_timer_id += 1;
                let tx = self.tx.clone();
                let handle = self.default_dispatcher.dispatch_after(
                    hold,
                    Box::pin(async move {
                        let _ = tx.send(Command::RateLimitLeaseElapsed { timer_id });
                    }),
                );
                self.rate_lease = Some(lease);
                self.rate_lease_timer = Some((timer_id, handle));
            }
            // No wait worth covering: return the grant right away.
            None => {
                lease.dispose();
                self.bus.publish(
                    Event::new(EventKind::LeaseReleased)
                        .with_lease(TaskManager::RATE_LIMIT_LEASE_NAME),
                );
            }
        }
    }

    fn on_rate_lease_elapsed(&mut self, timer_id: u64) {
        match &self.rate_lease_timer {
            Some((armed, _)) if *armed == timer_id => {}
            _ => return,
        }
        self.rate_lease_timer = None;
        if let Some(lease) = self.rate_lease.take() {
            lease.dispose();
            self.bus.publish(
                Event::new(EventKind::LeaseReleased)
                    .with_lease(TaskManager::RATE_LIMIT_LEASE_NAME),
            );
        }
    }

    fn on_lease_expired(&mut self, name: &'static str) {
        self.bus
            .publish(Event::new(EventKind::LeaseExpired).with_lease(name));

        if name == TaskManager::WORK_LEASE_NAME {
            // Advisory only: running handlers are notified and decide for
            // themselves; the manager completes or fails nothing.
            for lane in self.lanes.values() {
                if let Some(handle) = lane.running_handle() {
                    if let Some(inner) = handle.upgrade() {
                        inner.fire_expiration();
                    }
                }
            }
            if let Some(lease) = self.work_lease.take() {
                lease.dispose();
            }
            self.parked = true;
        } else if name == TaskManager::RATE_LIMIT_LEASE_NAME {
            if let Some((_, handle)) = self.rate_lease_timer.take() {
                handle.cancel();
            }
            if let Some(lease) = self.rate_lease.take() {
                lease.dispose();
            }
        }
    }

    fn stop(&mut self, reason: &'static str) {
        for lane in self.lanes.values_mut() {
            lane.cancel_recheck();
        }
        if let Some((_, handle)) = self.rate_lease_timer.take() {
            handle.cancel();
        }
        if let Some(lease) = self.rate_lease.take() {
            lease.dispose();
        }
        if let Some(lease) = self.work_lease.take() {
            lease.dispose();
        }
        self.bus
            .publish(Event::new(EventKind::ManagerStopped).with_reason(reason));
    }

    // === Lane evaluation ===

    fn evaluate_all(&mut self) {
        let ids: Vec<Arc<str>> = self.lanes.keys().cloned().collect();
        for id in &ids {
            self.evaluate_lane(id);
        }
    }

    fn evaluate_lane(&mut self, task_id: &Arc<str>) {
        let Some(lane) = self.lanes.get(task_id) else {
            return;
        };
        match self.peek_readiness(lane) {
            Readiness::Running => {}
            Readiness::Idle => self.maybe_release_work_lease(),
            Readiness::Delayed(wait) => self.schedule_recheck(task_id, wait),
            Readiness::AwaitingNetwork => {
                // No timer: the connected edge re-evaluates the lane.
                self.bus.publish(
                    Event::new(EventKind::NetworkDeferred).with_task(Arc::clone(task_id)),
                );
            }
            Readiness::RateLimited(wait) => {
                self.bus.publish(
                    Event::new(EventKind::RateLimitDeferred)
                        .with_task(Arc::clone(task_id))
                        .with_delay(wait),
                );
                self.schedule_recheck(task_id, wait);
            }
            Readiness::Ready => {
                if self.ensure_work_lease() {
                    self.dispatch_head(task_id);
                }
            }
        }
    }

    fn peek_readiness(&self, lane: &Lane) -> Readiness {
        if lane.is_running() {
            return Readiness::Running;
        }
        let Some(head) = lane.front() else {
            return Readiness::Idle;
        };
        if let Some(not_before) = head.not_before {
            let now = self.clock.now();
            if not_before > now {
                return Readiness::Delayed(not_before - now);
            }
        }
        if head.request.options().requires_network && !self.network.is_connected() {
            return Readiness::AwaitingNetwork;
        }
        let wait = self.max_rate_wait(head.request.rate_limit_keys());
        if !wait.is_zero() {
            return Readiness::RateLimited(wait);
        }
        Readiness::Ready
    }

    fn max_rate_wait(&self, keys: &[String]) -> Duration {
        keys.iter()
            .map(|key| self.limiter.wait_time(key))
            .max()
            .unwrap_or(Duration::ZERO)
    }

    fn schedule_recheck(&mut self, task_id: &Arc<str>, wait: Duration) {
        let now = self.clock.now();
        let due = deadline_after(now, wait);
        // Clamped together with the saturated deadline.
        let wait = due.duration_since(now);
        let Some(lane) = self.lanes.get_mut(task_id) else {
            return;
        };
        if let Some(pending) = lane.recheck() {
            // The armed timer already fires at or before the new deadline.
            if pending.due <= due {
                return;
            }
        }
        let timer_id = self.next_timer_id;
        self.next_timer_id += 1;
        let tx = self.tx.clone();
        let id = Arc::clone(task_id);
        let dispatcher = match self.registrations.get(task_id) {
            Some(registration) => Arc::clone(&registration.dispatcher),
            None => Arc::clone(&self.default_dispatcher),
        };
        let handle = dispatcher.dispatch_after(
            wait,
            Box::pin(async move {
                let _ = tx.send(Command::Recheck { task_id: id, timer_id });
            }),
        );
        lane.set_recheck(PendingRecheck { timer_id, due, handle });
    }

    fn dispatch_head(&mut self, task_id: &Arc<str>) {
        let (handler, dispatcher) = match self.registrations.get(task_id) {
            Some(registration) => (
                Arc::clone(&registration.handler),
                Arc::clone(&registration.dispatcher),
            ),
            None => return,
        };
        let Some(lane) = self.lanes.get_mut(task_id) else {
            return;
        };
        let Some(queued) = lane.pop_front() else {
            return;
        };
        lane.cancel_recheck();

        // Budget is consumed here and only here.
        for key in queued.request.rate_limit_keys() {
            self.limiter.track(key);
        }

        let run_id = self.next_run_id;
        self.next_run_id += 1;
        let running = RunningTask::new(
            Arc::clone(task_id),
            queued.request.options().clone(),
            run_id,
            self.tx.clone(),
            self.bus.clone(),
        );
        let attempt = queued.attempts + 1;
        lane.start(RunningRecord {
            run_id,
            request: queued.request,
            attempts: queued.attempts,
            handle: running.downgrade(),
        });
        self.bus.publish(
            Event::new(EventKind::TaskStarting)
                .with_task(Arc::clone(task_id))
                .with_attempt(attempt),
        );
        dispatcher.dispatch(Box::pin(async move {
            handler.run(running).await;
        }));
    }

    // === Lease upkeep ===

    /// Acquires the work lease if not held. Returns whether dispatch may
    /// proceed.
    fn ensure_work_lease(&mut self) -> bool {
        if self.work_lease.is_some() {
            return true;
        }
        if self.parked {
            return false;
        }
        match self.leases.request(TaskManager::WORK_LEASE_NAME) {
            Some(mut lease) => {
                let tx = self.tx.clone();
                lease.set_expiration_handler(Box::new(move || {
                    let _ = tx.send(Command::LeaseExpired {
                        name: TaskManager::WORK_LEASE_NAME,
                    });
                }));
                self.work_lease = Some(lease);
                self.bus.publish(
                    Event::new(EventKind::LeaseAcquired).with_lease(TaskManager::WORK_LEASE_NAME),
                );
                true
            }
            None => {
                self.parked = true;
                self.bus.publish(
                    Event::new(EventKind::LeaseUnavailable)
                        .with_lease(TaskManager::WORK_LEASE_NAME),
                );
                false
            }
        }
    }

    /// Returns the work lease once nothing is queued or running anywhere.
    fn maybe_release_work_lease(&mut self) {
        if self.total_outstanding() > 0 {
            return;
        }
        if let Some(lease) = self.work_lease.take() {
            lease.dispose();
            self.bus.publish(
                Event::new(EventKind::LeaseReleased).with_lease(TaskManager::WORK_LEASE_NAME),
            );
        }
    }

    fn drop_rate_lease(&mut self) {
        if let Some((_, handle)) = self.rate_lease_timer.take() {
            handle.cancel();
        }
        if let Some(lease) = self.rate_lease.take() {
            lease.dispose();
            self.bus.publish(
                Event::new(EventKind::LeaseReleased)
                    .with_lease(TaskManager::RATE_LIMIT_LEASE_NAME),
            );
        }
    }

    fn total_outstanding(&self) -> usize {
        self.lanes
            .values()
            .map(|lane| lane.pending() + usize::from(lane.is_running()))
            .sum()
    }

    fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot {
            work_lease_held: self.work_lease.is_some(),
            rate_limit_lease_held: self.rate_lease.is_some(),
            parked: self.parked,
            ..Snapshot::default()
        };
        for (id, lane) in &self.lanes {
            if lane.pending() == 0 && !lane.is_running() {
                continue;
            }
            snapshot.pending += lane.pending();
            snapshot.running += usize::from(lane.is_running());
            snapshot.lanes.insert(
                id.to_string(),
                LaneSnapshot {
                    queued: lane.pending(),
                    running: lane.is_running(),
                },
            );
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::dispatch::RuntimeDispatcher;
    use crate::hosts::{LifecycleHub, NetworkSwitch, NoopLeaseProvider};
    use crate::policies::ConflictPolicy;
    use crate::tasks::HandlerFn;

    fn test_actor(connected: bool) -> (Actor, mpsc::UnboundedReceiver<Command>, Bus) {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let bus = Bus::new(64);
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = Actor {
            cfg: Config::default(),
            bus: bus.clone(),
            clock: Arc::clone(&clock),
            limiter: Arc::new(RateLimiter::new(clock)),
            leases: Arc::new(NoopLeaseProvider),
            network: Arc::new(NetworkSwitch::new(connected)),
            lifecycle: Arc::new(LifecycleHub::new()),
            default_dispatcher: RuntimeDispatcher::shared(),
            tx,
            registrations: HashMap::new(),
            lanes: HashMap::new(),
            work_lease: None,
            rate_lease: None,
            rate_lease_timer: None,
            parked: false,
            next_run_id: 0,
            next_timer_id: 0,
        };
        (actor, rx, bus)
    }

    fn register_noop(actor: &mut Actor, task_id: &str) {
        actor.on_command(Command::Register {
            task_id: Arc::from(task_id),
            dispatcher: None,
            handler: HandlerFn::arc(|task: RunningTask| async move {
                task.task_completed();
            }),
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_enqueue_without_handler_is_dropped() {
        let (mut actor, _rx, bus) = test_actor(true);
        let mut events = bus.subscribe();

        actor.on_command(Command::Enqueue {
            request: TaskRequest::new("ghost"),
        });

        let event = events.try_recv().expect("diagnostic event");
        assert_eq!(event.kind, EventKind::HandlerMissing);
        assert_eq!(event.task.as_deref(), Some("ghost"));
        assert!(actor.lanes.is_empty());
        assert!(actor.work_lease.is_none(), "no lease for dropped requests");
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnected_request_consumes_no_rate_budget() {
        let (mut actor, _rx, bus) = test_actor(false);
        actor
            .limiter
            .set_rule("k", 1, Duration::from_secs(60))
            .unwrap();
        register_noop(&mut actor, "sync");
        let mut events = bus.subscribe();

        actor.on_command(Command::Enqueue {
            request: TaskRequest::new("sync")
                .with_requires_network(true)
                .with_rate_limit("k"),
        });

        // Connectivity gates before the rate limiter is even consulted.
        assert_eq!(actor.limiter.wait_time("k"), Duration::ZERO);
        let lane = actor.lanes.get("sync").unwrap();
        assert!(lane.recheck().is_none(), "network waits arm no timer");
        let kinds: Vec<EventKind> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|event| event.kind)
            .collect();
        assert!(kinds.contains(&EventKind::NetworkDeferred));
        assert!(!kinds.contains(&EventKind::RateLimitDeferred));
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_outcomes_are_reported_per_request() {
        let (mut actor, _rx, bus) = test_actor(true);
        register_noop(&mut actor, "sync");

        // Delay keeps the queue from dispatching during the test.
        let delayed = || TaskRequest::new("sync").with_initial_delay(Duration::from_secs(60));
        actor.on_command(Command::Enqueue { request: delayed() });
        actor.on_command(Command::Enqueue { request: delayed() });

        let mut events = bus.subscribe();
        actor.on_command(Command::Enqueue {
            request: delayed().with_conflict_policy(ConflictPolicy::Replace),
        });

        let after_replace: Vec<Event> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        let dropped: Vec<&Event> = after_replace
            .iter()
            .filter(|event| event.kind == EventKind::TaskDropped)
            .collect();
        assert_eq!(dropped.len(), 2, "one drop event per evicted request");
        assert!(dropped
            .iter()
            .all(|event| event.reason.as_deref() == Some("replace")));
        assert!(after_replace
            .iter()
            .any(|event| event.kind == EventKind::TaskEnqueued));

        actor.on_command(Command::Enqueue {
            request: delayed().with_conflict_policy(ConflictPolicy::Keep),
        });

        let after_keep: Vec<Event> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert_eq!(after_keep.len(), 1);
        assert_eq!(after_keep[0].kind, EventKind::TaskDropped);
        assert_eq!(after_keep[0].reason.as_deref(), Some("keep"));
        assert_eq!(actor.lanes.get("sync").unwrap().pending(), 1);
    }
}
