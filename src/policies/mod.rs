//! Scheduling policies.
//!
//! This module groups the knobs that control **what happens on conflict**
//! when requests pile up for one identity and **how long** to wait between
//! retry attempts.
//!
//! ## Contents
//! - [`ConflictPolicy`] how an enqueue treats already-queued requests
//!   (append / replace / keep)
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid thundering herd
//!
//! ## Quick wiring
//! ```text
//! TaskRequest { options.conflict_policy } ──► consulted at enqueue time
//! Config { backoff } ──► consulted when a running execution reports failure:
//!      delay = backoff.next(prior_failure_count)
//! ```
//!
//! ## Defaults
//! - `ConflictPolicy::Append` (every request eventually runs).
//! - `BackoffPolicy::default()` → 30s, 60s, then 120s capped, jitter=None.

mod backoff;
mod conflict;
mod jitter;

pub use backoff::BackoffPolicy;
pub use conflict::ConflictPolicy;
pub use jitter::JitterPolicy;
