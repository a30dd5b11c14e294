//! # Dispatch: execution contexts for handlers and scheduled re-checks.
//!
//! Every registered task identity is bound to a [`Dispatch`] implementation.
//! The scheduler uses it for two things:
//! - running the identity's handler when a request becomes eligible;
//! - scheduling cancelable delayed work (readiness re-checks, lease timers).
//!
//! ## Rules
//! - `dispatch` must not block the caller; work starts asynchronously.
//! - `dispatch_after` returns a [`DelayHandle`]; cancelling it before the
//!   delay elapses prevents the work from ever starting. Cancelling after it
//!   fired is a no-op.
//! - Dropping a `DelayHandle` does **not** cancel the work. The scheduler's
//!   delayed work is idempotent, so a handle lost without cancellation costs
//!   one spurious wake-up at worst.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskgate::{Dispatch, RuntimeDispatcher};
//!
//! # async fn demo() {
//! let dispatcher = RuntimeDispatcher::shared();
//! let handle = dispatcher.dispatch_after(
//!     Duration::from_secs(30),
//!     Box::pin(async { /* re-check readiness */ }),
//! );
//! handle.cancel(); // the re-check never runs
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

/// Execution context for handler runs and delayed re-checks.
pub trait Dispatch: Send + Sync + 'static {
    /// Starts `work` as soon as possible, without blocking the caller.
    fn dispatch(&self, work: BoxFuture<'static, ()>);

    /// Starts `work` after `delay`, unless the returned handle is cancelled
    /// first.
    fn dispatch_after(&self, delay: Duration, work: BoxFuture<'static, ()>) -> DelayHandle;
}

/// Cancellation handle for work scheduled via [`Dispatch::dispatch_after`].
///
/// Cheap to clone; any clone can cancel. Dropping all handles leaves the
/// delayed work armed.
#[derive(Clone, Debug)]
pub struct DelayHandle {
    token: CancellationToken,
}

impl DelayHandle {
    /// Creates a handle wrapping the given token.
    ///
    /// Custom [`Dispatch`] implementations use this to tie their own timer
    /// mechanism to the handle contract.
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Cancels the pending work. No-op if it already ran or was cancelled.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True if [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Default dispatcher backed by the tokio runtime.
///
/// `dispatch` maps to `tokio::spawn`; `dispatch_after` races a sleep against
/// the handle's token.
#[derive(Clone, Copy, Debug, Default)]
pub struct RuntimeDispatcher;

impl RuntimeDispatcher {
    /// Creates a new dispatcher.
    pub fn new() -> Self {
        Self
    }

    /// Creates the dispatcher behind a shared handle (`Arc<dyn Dispatch>`
    /// ready).
    pub fn shared() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl Dispatch for RuntimeDispatcher {
    fn dispatch(&self, work: BoxFuture<'static, ()>) {
        tokio::spawn(work);
    }

    fn dispatch_after(&self, delay: Duration, work: BoxFuture<'static, ()>) -> DelayHandle {
        let token = CancellationToken::new();
        let armed = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = armed.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    work.await;
                }
            }
        });
        DelayHandle::new(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_after_fires_once_delay_elapses() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let dispatcher = RuntimeDispatcher::new();
        let _handle = dispatcher.dispatch_after(
            Duration::from_secs(5),
            Box::pin(async move {
                flag.store(true, Ordering::SeqCst);
            }),
        );

        tokio::time::advance(Duration::from_secs(4)).await;
        tokio::task::yield_now().await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_delayed_work() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let dispatcher = RuntimeDispatcher::new();
        let handle = dispatcher.dispatch_after(
            Duration::from_secs(5),
            Box::pin(async move {
                flag.store(true, Ordering::SeqCst);
            }),
        );

        handle.cancel();
        assert!(handle.is_cancelled());

        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_is_noop() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let dispatcher = RuntimeDispatcher::new();
        let handle = dispatcher.dispatch_after(
            Duration::from_millis(10),
            Box::pin(async move {
                flag.store(true, Ordering::SeqCst);
            }),
        );

        tokio::time::advance(Duration::from_millis(10)).await;
        tokio::task::yield_now().await;
        assert!(fired.load(Ordering::SeqCst));

        handle.cancel();
        assert!(fired.load(Ordering::SeqCst));
    }
}
