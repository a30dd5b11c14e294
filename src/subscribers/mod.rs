//! # Event subscribers for the taskgate runtime.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out used to deliver runtime events published on the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   manager actor ── publish(Event) ──► Bus ──► subscriber listener
//!   RunningTask handles ──┘                          │
//!                                                    ▼
//!                                          SubscriberSet::emit(&Event)
//!                                         ┌─────────┬─────────┐
//!                                         ▼         ▼         ▼
//!                                    [queue S1] [queue S2] [queue SN]
//!                                         ▼         ▼         ▼
//!                                    worker S1  worker S2  worker SN
//!                                         ▼         ▼         ▼
//!                                    sub.on_event(&Event)  (per subscriber)
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use taskgate::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct MetricsSubscriber;
//!
//! #[async_trait]
//! impl Subscribe for MetricsSubscriber {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::TaskFailed {
//!             // increment failure counter
//!         }
//!     }
//! }
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
