//! # RunningTask: the handle a handler drives to its terminal state.
//!
//! A [`RunningTask`] is created by the manager when a request dispatches and
//! is handed to the identity's handler. The handle is cheap to clone and may
//! outlive the handler's `run` future; the attempt ends only when a terminal
//! signal is sent.
//!
//! ## Rules
//! - At most one terminal signal wins, across all clones. Later calls are
//!   no-ops reported as [`EventKind::TerminalSignalIgnored`].
//! - Dropping every clone without a terminal signal counts as a failure
//!   (the request is retried with backoff).
//! - The expiration handler is advisory: it tells the handler the host is
//!   revoking execution time. The manager never completes or fails an
//!   execution on the handler's behalf.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::core::actor::{Command, Outcome};
use crate::events::{Bus, Event, EventKind};
use crate::tasks::request::RequestOptions;

type ExpirationHandler = Box<dyn FnOnce() + Send>;

/// Handle for one dispatched execution.
///
/// Cheap to clone (inner `Arc`); every clone refers to the same execution
/// and shares its terminal-once guarantee.
#[derive(Clone)]
pub struct RunningTask {
    inner: Arc<RunningInner>,
}

pub(crate) struct RunningInner {
    task_id: Arc<str>,
    options: RequestOptions,
    run_id: u64,
    tx: mpsc::UnboundedSender<Command>,
    bus: Bus,
    finished: AtomicBool,
    expiration: Mutex<Option<ExpirationHandler>>,
}

impl RunningTask {
    pub(crate) fn new(
        task_id: Arc<str>,
        options: RequestOptions,
        run_id: u64,
        tx: mpsc::UnboundedSender<Command>,
        bus: Bus,
    ) -> Self {
        Self {
            inner: Arc::new(RunningInner {
                task_id,
                options,
                run_id,
                tx,
                bus,
                finished: AtomicBool::new(false),
                expiration: Mutex::new(None),
            }),
        }
    }

    /// The identity this execution belongs to.
    pub fn task_id(&self) -> &str {
        &self.inner.task_id
    }

    /// The conditions the originating request carried, extras included.
    pub fn options(&self) -> &RequestOptions {
        &self.inner.options
    }

    /// Installs the callback invoked when the host revokes execution time.
    ///
    /// Keep it brief; it runs inline on the manager's turn. Installing a
    /// handler after the lease already expired has no effect, and a second
    /// install replaces the first.
    pub fn set_expiration_handler(&self, handler: impl FnOnce() + Send + 'static) {
        *self.inner.lock_expiration() = Some(Box::new(handler));
    }

    /// Reports success. The request is finished and leaves its queue.
    pub fn task_completed(&self) {
        self.inner.finish(Outcome::Completed, "task_completed");
    }

    /// Reports failure. The request is requeued at the front of its lane
    /// with a backoff delay.
    pub fn task_failed(&self) {
        self.inner.finish(Outcome::Failed, "task_failed");
    }

    pub(crate) fn downgrade(&self) -> std::sync::Weak<RunningInner> {
        Arc::downgrade(&self.inner)
    }
}

impl RunningInner {
    /// First terminal signal wins; later ones are diagnosed and dropped.
    fn finish(&self, outcome: Outcome, signal: &'static str) {
        if self.finished.swap(true, Ordering::SeqCst) {
            self.bus.publish(
                Event::new(EventKind::TerminalSignalIgnored)
                    .with_task(Arc::clone(&self.task_id))
                    .with_reason(signal),
            );
            return;
        }
        let _ = self.tx.send(Command::Finished {
            task_id: Arc::clone(&self.task_id),
            run_id: self.run_id,
            outcome,
        });
    }

    /// Invokes the expiration handler, if one was installed.
    pub(crate) fn fire_expiration(&self) {
        let handler = self.lock_expiration().take();
        if let Some(handler) = handler {
            handler();
        }
    }

    fn lock_expiration(&self) -> std::sync::MutexGuard<'_, Option<ExpirationHandler>> {
        match self.expiration.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for RunningInner {
    fn drop(&mut self) {
        // All clones are gone. Without a terminal signal the execution could
        // never finish, so it is reported as abandoned and retried.
        if !self.finished.load(Ordering::SeqCst) {
            let _ = self.tx.send(Command::Finished {
                task_id: Arc::clone(&self.task_id),
                run_id: self.run_id,
                outcome: Outcome::Abandoned,
            });
        }
    }
}
