//! # Per-identity conflict policy
//!
//! The scheduler keeps one FIFO queue per task identity, and at any given
//! time at most **one** execution runs per identity. When a new request
//! arrives for an identity that already has queued requests, the request's
//! conflict policy decides what happens.
//!
//! ## Variants
//! - `Append`: enqueue behind the existing requests (FIFO).
//! - `Replace`: **discard** every queued request for the identity, then enqueue.
//! - `Keep`: if any request is already queued, **drop** the new one.
//!
//! ## Invariants
//! - The policy is consulted against *queued* requests only; a running
//!   execution is never cancelled by an enqueue.
//! - Surviving requests execute strictly in submission order.

use serde::{Deserialize, Serialize};

/// Policy controlling how an enqueue interacts with requests already queued
/// for the same identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Enqueue behind existing requests (FIFO order).
    ///
    /// Use when:
    /// - Every submission must eventually execute
    /// - Order matters
    /// - Example: sequential upload batches
    #[default]
    Append,

    /// Discard queued requests and enqueue the new one.
    ///
    /// Use when:
    /// - A new request invalidates the old ones
    /// - Only the latest state matters
    /// - Example: refreshing a remote config snapshot
    Replace,

    /// Drop the new request if one is already queued.
    ///
    /// Use when:
    /// - Redundant work should be avoided
    /// - Example: periodic maintenance kicks
    Keep,
}
