//! # Task abstractions: requests, handlers, running executions.
//!
//! This module provides the core task-related types:
//! - [`TaskRequest`], [`RequestOptions`] - what to run and under which conditions
//! - [`TaskHandler`] - trait for implementing the work bound to an identity
//! - [`HandlerFn`], [`HandlerRef`] - function-backed handler and shared reference
//! - [`RunningTask`] - the handle a dispatched execution is driven through

mod handler;
mod request;
mod running;

pub use handler::{HandlerFn, HandlerRef, TaskHandler};
pub use request::{Extras, RequestOptions, TaskRequest};
pub use running::RunningTask;

pub(crate) use running::RunningInner;
