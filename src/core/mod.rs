//! Scheduler core: admission, gating, and dispatch.
//!
//! This module contains the embedded implementation of the taskgate runtime.
//! The public API from this module is [`TaskManager`] (plus its builder and
//! the [`Snapshot`] it reports); everything else is the single-writer actor
//! behind it.
//!
//! Internal modules:
//! - [`actor`]: owns all scheduler state and applies every transition;
//! - [`lane`]: per-identity queue, running slot, and re-check bookkeeping;
//! - [`builder`]: wires host integrations and spawns the actor;
//! - [`snapshot`]: the point-in-time view handed out for introspection.

pub(crate) mod actor;
mod builder;
mod lane;
mod manager;
mod snapshot;

pub use builder::TaskManagerBuilder;
pub use manager::TaskManager;
pub use snapshot::{LaneSnapshot, Snapshot};
