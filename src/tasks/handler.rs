//! # Task handler abstraction and function-backed implementation.
//!
//! This module defines the [`TaskHandler`] trait and a convenient
//! function-backed implementation [`HandlerFn`]. The common handle type is
//! [`HandlerRef`], an `Arc<dyn TaskHandler>` suitable for registration.
//!
//! A handler receives a [`RunningTask`] and **owns its terminal signal**: it
//! must eventually call [`RunningTask::task_completed`] or
//! [`RunningTask::task_failed`], possibly long after its `run` future
//! returned (the handle can be stashed for a callback). A handle dropped
//! without a terminal signal counts as a failure.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::tasks::running::RunningTask;

/// # Asynchronous work bound to a task identity.
///
/// Registered once per identity via
/// [`TaskManager::register`](crate::TaskManager::register); invoked with a
/// fresh [`RunningTask`] handle for every dispatched request.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use taskgate::{RunningTask, TaskHandler};
///
/// struct Uploader;
///
/// #[async_trait]
/// impl TaskHandler for Uploader {
///     async fn run(&self, task: RunningTask) {
///         // do work...
///         task.task_completed();
///     }
/// }
/// ```
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    /// Executes one attempt for the given running task.
    ///
    /// The attempt finishes when a terminal signal is sent on `task`, not
    /// when this future returns.
    async fn run(&self, task: RunningTask);
}

/// Shared handler reference used at registration sites.
pub type HandlerRef = Arc<dyn TaskHandler>;

/// Function-backed handler implementation.
///
/// Wraps a closure that creates a new future per attempt, so attempts never
/// share hidden mutable state. Share state explicitly with `Arc` inside the
/// closure if needed.
///
/// ## Example
/// ```rust
/// use taskgate::{HandlerFn, HandlerRef, RunningTask};
///
/// let handler: HandlerRef = HandlerFn::arc(|task: RunningTask| async move {
///     // do work...
///     task.task_completed();
/// });
/// ```
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it as a shared reference.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> TaskHandler for HandlerFn<F>
where
    F: Fn(RunningTask) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn run(&self, task: RunningTask) {
        (self.f)(task).await;
    }
}
