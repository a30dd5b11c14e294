//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the manager actor and
//! running-task handles.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the manager actor (enqueue/dispatch/lease transitions),
//!   `RunningTask` handles (duplicate-terminal diagnostics).
//! - **Consumers**: the subscriber listener (fans out to `SubscriberSet`),
//!   receivers obtained from `TaskManager::events()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
