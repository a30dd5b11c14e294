//! # taskgate
//!
//! **Taskgate** is a deferred-work scheduler for Rust.
//!
//! It accepts named task requests and holds each one until its dispatch
//! conditions pass: conflict policy against queued siblings, an optional
//! initial delay, network connectivity, and per-key sliding-window rate
//! limits. Failed attempts retry with capped exponential backoff, at most
//! one execution per identity is ever in flight, and all execution happens
//! under host-granted revocable leases, which makes the crate a building
//! block for schedulers embedded in lifecycle-constrained hosts.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ TaskRequest  │   │ TaskRequest  │   │ TaskRequest  │
//!     │   ("sync")   │   │  ("upload")  │   │   ("sync")   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  TaskManager (cloneable handle)                                   │
//! │  - register / enqueue / set_rate_limit / snapshot / shutdown      │
//! │  - every call becomes a command sent into the actor               │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Actor (owns all scheduler state, applies one command at a time)  │
//! │  - Lane per identity: FIFO queue + at most one running execution  │
//! │  - RateLimiter (sliding windows) + Clock (virtual under tests)    │
//! │  - host signals: LeaseProvider, NetworkMonitor, LifecycleSource   │
//! └──────┬─────────────────┬─────────────────┬───────────────┬────────┘
//!        ▼                 ▼                 ▼               │
//!   ┌──────────┐      ┌──────────┐      ┌──────────┐         │
//!   │ handler  │      │ handler  │      │ handler  │         │ publishes
//!   │ run (a)  │      │ run (b)  │      │ run (c)  │         │ Events
//!   └────┬─────┘      └────┬─────┘      └────┬─────┘         │
//!        │   terminal signals via RunningTask │              │
//!        └────────────────┴───────────────────┘              ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                    (capacity: Config::bus_capacity)               │
//! └──────────────────┬─────────────────────────────┬──────────────────┘
//!                    ▼                             ▼
//!        ┌────────────────────────┐    TaskManager::events()
//!        │  subscriber listener   │    (plain broadcast receivers)
//!        └───────────┬────────────┘
//!                    ▼
//!              SubscriberSet
//!         (per-subscriber queues)
//!          ▼         ▼         ▼
//!     sub1.on    sub2.on    subN.on
//!      _event()   _event()   _event()
//! ```
//!
//! ### Request lifecycle
//! ```text
//! enqueue(TaskRequest) ──► conflict policy vs queued siblings
//!   ├─ Append  ─► push to the back of the identity's lane
//!   ├─ Replace ─► evict queued siblings (running is untouched), push
//!   └─ Keep    ─► drop the new request if a sibling is already queued
//!
//! per lane, for the head request:
//!   ├─► a run is in flight?        ─► wait for its terminal signal
//!   ├─► initial delay / retry due? ─► timer re-check at not_before
//!   ├─► needs network, offline?    ─► wait for the connected edge
//!   ├─► rate-limit keys blocked?   ─► timer re-check after the max wait
//!   └─► ready:
//!        ├─ ensure the work lease (a refusal parks dispatch until the
//!        │  host reports active/foreground again)
//!        ├─ consume one budget unit per rate-limit key
//!        ├─ publish TaskStarting, hand a RunningTask to the handler
//!        └─ terminal signal decides what happens next:
//!             ├─ task_completed() ─► TaskCompleted, next in lane
//!             ├─ task_failed()    ─► retry at the FRONT of the lane
//!             │                      after backoff (30s, 60s, 120s cap)
//!             └─ handle dropped   ─► failure with reason "abandoned"
//! ```
//!
//! ## Features
//! | Area              | Description                                                              | Key types / traits                        |
//! |-------------------|--------------------------------------------------------------------------|-------------------------------------------|
//! | **Requests**      | Describe deferred work: identity, conflict policy, delay, gating, extras.| [`TaskRequest`], [`RequestOptions`]        |
//! | **Handlers**      | Bind async work to an identity; report outcomes explicitly.             | [`TaskHandler`], [`HandlerFn`], [`RunningTask`] |
//! | **Gating**        | Hold dispatch on connectivity and sliding-window rate limits.            | [`NetworkMonitor`], [`RateLimiter`]        |
//! | **Leases**        | Tie execution to host-granted, revocable time budgets.                   | [`LeaseProvider`], [`Lease`]               |
//! | **Lifecycle**     | React to host transitions (background fast-forward, termination).        | [`LifecycleSource`], [`LifecycleEvent`]    |
//! | **Policies**      | Conflict handling and retry backoff.                                     | [`ConflictPolicy`], [`BackoffPolicy`]      |
//! | **Subscriber API**| Hook into runtime events (logging, metrics, custom subscribers).         | [`Subscribe`], [`SubscriberSet`]           |
//! | **Configuration** | Centralize runtime settings.                                             | [`Config`]                                 |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use taskgate::{Config, ConflictPolicy, HandlerFn, RunningTask, TaskManager, TaskRequest};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.max_background_wait = Duration::from_secs(30);
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskgate::Subscribe>> = {
//!         use taskgate::LogWriter;
//!         vec![Arc::new(LogWriter::default())]
//!     };
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskgate::Subscribe>> = Vec::new();
//!
//!     // Create the manager with default host integrations
//!     let manager = TaskManager::builder(cfg)
//!         .with_subscribers(subs)
//!         .build();
//!
//!     // Budget: at most 10 dispatches per minute across "uploads" work
//!     manager.set_rate_limit("uploads", 10, Duration::from_secs(60))?;
//!
//!     // Bind the work to an identity
//!     manager.register(
//!         "upload",
//!         HandlerFn::arc(|task: RunningTask| async move {
//!             // do the actual work here, then report how it went
//!             task.task_completed();
//!         }),
//!     );
//!
//!     // Ask for a run; duplicates queued behind it would be superseded
//!     manager.enqueue(
//!         TaskRequest::new("upload")
//!             .with_conflict_policy(ConflictPolicy::Replace)
//!             .with_rate_limit("uploads"),
//!     );
//!
//!     // Wait for the queue to drain, then stop the actor
//!     while !manager.snapshot().await.is_idle() {
//!         tokio::task::yield_now().await;
//!     }
//!     manager.shutdown();
//!     Ok(())
//! }
//! ```
mod clock;
mod config;
mod core;
mod dispatch;
mod error;
mod events;
mod hosts;
mod policies;
mod rate_limit;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use core::{LaneSnapshot, Snapshot, TaskManager, TaskManagerBuilder};
pub use dispatch::{DelayHandle, Dispatch, RuntimeDispatcher};
pub use error::RateLimitError;
pub use events::{Bus, Event, EventKind};
pub use hosts::{
    Lease, LeaseProvider, LifecycleEvent, LifecycleHub, LifecycleSource, NetworkMonitor,
    NetworkSwitch, NoopLeaseProvider,
};
pub use policies::{BackoffPolicy, ConflictPolicy, JitterPolicy};
pub use rate_limit::RateLimiter;
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{
    Extras, HandlerFn, HandlerRef, RequestOptions, RunningTask, TaskHandler, TaskRequest,
};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
