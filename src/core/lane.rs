//! # Lane: per-identity queue, running slot, and re-check timer.
//!
//! One [`Lane`] exists per registered task identity that has seen at least
//! one request. A lane owns:
//! - the FIFO queue of pending requests (ordering modified only by conflict
//!   resolution and retry reinsertion);
//! - the single running slot (at most one execution per identity, ever);
//! - the coalesced re-check timer (at most one pending readiness re-check
//!   per identity).
//!
//! Lanes are plain data; all decisions are made by the actor that owns them.

use std::collections::VecDeque;
use std::sync::Weak;

use tokio::time::Instant;

use crate::dispatch::DelayHandle;
use crate::policies::ConflictPolicy;
use crate::tasks::{RunningInner, TaskRequest};

/// A request waiting in a lane, together with its scheduling state.
pub(crate) struct QueuedRequest {
    /// The enqueue value, options and extras included.
    pub request: TaskRequest,
    /// Earliest instant the request may dispatch; `None` means no delay
    /// gate (either never set, or bypassed by a background fast-forward).
    pub not_before: Option<Instant>,
    /// Failed attempts so far; the next attempt is `attempts + 1`.
    pub attempts: u32,
}

/// The one in-flight execution of a lane.
pub(crate) struct RunningRecord {
    /// Matches the run id baked into the handed-out [`RunningTask`]
    /// (crate::RunningTask) handle; terminal signals with any other id are
    /// stale and ignored.
    pub run_id: u64,
    /// The original request, kept for retry reinsertion.
    pub request: TaskRequest,
    /// Failed attempts before this run.
    pub attempts: u32,
    /// Weak handle used to forward lease expiration to the handler.
    pub handle: Weak<RunningInner>,
}

/// The lane's single pending readiness re-check.
pub(crate) struct PendingRecheck {
    pub timer_id: u64,
    pub due: Instant,
    pub handle: DelayHandle,
}

/// Outcome of conflict resolution for one enqueue.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Admission {
    /// The request was queued; `evicted` requests were discarded to make
    /// room (non-zero only under `Replace`).
    Accepted { evicted: usize },
    /// The request was discarded (`Keep` with a sibling already queued).
    Rejected,
}

/// Per-identity scheduling state.
pub(crate) struct Lane {
    queue: VecDeque<QueuedRequest>,
    running: Option<RunningRecord>,
    recheck: Option<PendingRecheck>,
}

impl Lane {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            running: None,
            recheck: None,
        }
    }

    /// Applies the incoming request's conflict policy against the queued
    /// (never the running) requests, inserting it when accepted.
    pub fn admit(&mut self, incoming: QueuedRequest) -> Admission {
        match incoming.request.options().conflict_policy {
            ConflictPolicy::Append => {
                self.queue.push_back(incoming);
                Admission::Accepted { evicted: 0 }
            }
            ConflictPolicy::Replace => {
                let evicted = self.queue.len();
                self.queue.clear();
                self.queue.push_back(incoming);
                Admission::Accepted { evicted }
            }
            ConflictPolicy::Keep => {
                if self.queue.is_empty() {
                    self.queue.push_back(incoming);
                    Admission::Accepted { evicted: 0 }
                } else {
                    Admission::Rejected
                }
            }
        }
    }

    pub fn front(&self) -> Option<&QueuedRequest> {
        self.queue.front()
    }

    pub fn pop_front(&mut self) -> Option<QueuedRequest> {
        self.queue.pop_front()
    }

    /// Reinserts a failed request at the head: its retry preempts
    /// later-queued siblings.
    pub fn requeue_front(&mut self, record: QueuedRequest) {
        self.queue.push_front(record);
    }

    pub fn queued_mut(&mut self) -> impl Iterator<Item = &mut QueuedRequest> {
        self.queue.iter_mut()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn running_handle(&self) -> Option<&Weak<RunningInner>> {
        self.running.as_ref().map(|rec| &rec.handle)
    }

    /// Occupies the running slot. The caller guarantees the slot is free;
    /// the invariant is asserted here.
    pub fn start(&mut self, record: RunningRecord) {
        debug_assert!(self.running.is_none(), "one running execution per lane");
        self.running = Some(record);
    }

    /// Frees the running slot if `run_id` matches the in-flight execution.
    /// Stale ids (from already-finished runs) leave the lane untouched.
    pub fn finish(&mut self, run_id: u64) -> Option<RunningRecord> {
        match &self.running {
            Some(record) if record.run_id == run_id => self.running.take(),
            _ => None,
        }
    }

    pub fn recheck(&self) -> Option<&PendingRecheck> {
        self.recheck.as_ref()
    }

    /// Installs the pending re-check, cancelling any previous one.
    pub fn set_recheck(&mut self, pending: PendingRecheck) {
        if let Some(old) = self.recheck.replace(pending) {
            old.handle.cancel();
        }
    }

    /// Consumes the pending re-check if `timer_id` matches. A mismatch means
    /// the timer was superseded after it fired; its wake-up is ignored.
    pub fn clear_recheck_if(&mut self, timer_id: u64) -> bool {
        match &self.recheck {
            Some(pending) if pending.timer_id == timer_id => {
                self.recheck = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel_recheck(&mut self) {
        if let Some(pending) = self.recheck.take() {
            pending.handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::ConflictPolicy;
    use tokio_util::sync::CancellationToken;

    fn queued(policy: ConflictPolicy, tag: &str) -> QueuedRequest {
        QueuedRequest {
            request: TaskRequest::new("demo")
                .with_conflict_policy(policy)
                .with_extra("subtask", tag),
            not_before: None,
            attempts: 0,
        }
    }

    fn tag(record: &QueuedRequest) -> &str {
        record
            .request
            .options()
            .extras
            .get("subtask")
            .and_then(|v| v.as_str())
            .unwrap()
    }

    fn running_record(run_id: u64) -> RunningRecord {
        RunningRecord {
            run_id,
            request: TaskRequest::new("demo"),
            attempts: 0,
            handle: Weak::new(),
        }
    }

    #[test]
    fn test_append_keeps_fifo_order() {
        let mut lane = Lane::new();
        assert_eq!(
            lane.admit(queued(ConflictPolicy::Append, "first")),
            Admission::Accepted { evicted: 0 }
        );
        assert_eq!(
            lane.admit(queued(ConflictPolicy::Append, "second")),
            Admission::Accepted { evicted: 0 }
        );

        assert_eq!(tag(&lane.pop_front().unwrap()), "first");
        assert_eq!(tag(&lane.pop_front().unwrap()), "second");
    }

    #[test]
    fn test_replace_evicts_queued_only() {
        let mut lane = Lane::new();
        lane.start(running_record(1));
        lane.admit(queued(ConflictPolicy::Append, "a"));
        lane.admit(queued(ConflictPolicy::Append, "b"));

        assert_eq!(
            lane.admit(queued(ConflictPolicy::Replace, "winner")),
            Admission::Accepted { evicted: 2 }
        );

        // The running execution is unaffected; only the queue was replaced.
        assert!(lane.is_running());
        assert_eq!(lane.pending(), 1);
        assert_eq!(tag(lane.front().unwrap()), "winner");
    }

    #[test]
    fn test_keep_rejects_when_a_sibling_is_queued() {
        let mut lane = Lane::new();
        lane.admit(queued(ConflictPolicy::Keep, "first"));

        assert_eq!(
            lane.admit(queued(ConflictPolicy::Keep, "second")),
            Admission::Rejected
        );
        assert_eq!(lane.pending(), 1);
        assert_eq!(tag(lane.front().unwrap()), "first");
    }

    #[test]
    fn test_keep_accepts_when_only_a_run_is_in_flight() {
        let mut lane = Lane::new();
        lane.start(running_record(1));

        // Conflict policies consult the queue, not the running slot.
        assert_eq!(
            lane.admit(queued(ConflictPolicy::Keep, "first")),
            Admission::Accepted { evicted: 0 }
        );
    }

    #[test]
    fn test_requeue_front_preempts_siblings() {
        let mut lane = Lane::new();
        lane.admit(queued(ConflictPolicy::Append, "later"));
        lane.requeue_front(queued(ConflictPolicy::Append, "retry"));

        assert_eq!(tag(&lane.pop_front().unwrap()), "retry");
        assert_eq!(tag(&lane.pop_front().unwrap()), "later");
    }

    #[test]
    fn test_finish_ignores_stale_run_ids() {
        let mut lane = Lane::new();
        lane.start(running_record(7));

        assert!(lane.finish(3).is_none());
        assert!(lane.is_running());

        assert!(lane.finish(7).is_some());
        assert!(!lane.is_running());
        assert!(lane.finish(7).is_none());
    }

    #[tokio::test]
    async fn test_recheck_clear_requires_matching_timer_id() {
        let mut lane = Lane::new();
        lane.set_recheck(PendingRecheck {
            timer_id: 1,
            due: Instant::now(),
            handle: DelayHandle::new(CancellationToken::new()),
        });

        assert!(!lane.clear_recheck_if(9));
        assert!(lane.recheck().is_some());
        assert!(lane.clear_recheck_if(1));
        assert!(lane.recheck().is_none());
    }

    #[tokio::test]
    async fn test_replacing_a_recheck_cancels_the_old_timer() {
        let mut lane = Lane::new();
        let first = DelayHandle::new(CancellationToken::new());
        lane.set_recheck(PendingRecheck {
            timer_id: 1,
            due: Instant::now(),
            handle: first.clone(),
        });
        lane.set_recheck(PendingRecheck {
            timer_id: 2,
            due: Instant::now(),
            handle: DelayHandle::new(CancellationToken::new()),
        });

        assert!(first.is_cancelled());
        assert_eq!(lane.recheck().unwrap().timer_id, 2);
    }
}
