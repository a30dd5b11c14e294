//! # Task request: what to run and under which conditions.
//!
//! Defines [`RequestOptions`] (conflict policy, network requirement, opaque
//! extras) and [`TaskRequest`], the value handed to
//! [`TaskManager::enqueue`](crate::TaskManager::enqueue).
//!
//! A request names a task identity; the handler registered for that identity
//! does the work. The request itself only carries *conditions*: how to treat
//! already-queued requests, whether connectivity is required, which
//! rate-limit keys gate dispatch, and a minimum delay before the first
//! attempt.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskgate::{ConflictPolicy, TaskRequest};
//!
//! let request = TaskRequest::new("sync")
//!     .with_conflict_policy(ConflictPolicy::Replace)
//!     .with_requires_network(true)
//!     .with_rate_limit("sync.batches")
//!     .with_initial_delay(Duration::from_secs(5))
//!     .with_extra("cursor", "abc123");
//!
//! assert_eq!(request.task_id(), "sync");
//! assert_eq!(request.rate_limit_keys(), ["sync.batches"]);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policies::ConflictPolicy;

/// Opaque payload attached to a request, passed through to the handler
/// unchanged.
pub type Extras = serde_json::Map<String, serde_json::Value>;

/// Per-request execution conditions.
///
/// Immutable value type; defaults to `Append` conflict handling, no network
/// requirement, and empty extras.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// How to treat requests already queued for the same identity.
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
    /// If true, dispatch waits for network connectivity.
    #[serde(default)]
    pub requires_network: bool,
    /// Opaque payload for the handler.
    #[serde(default)]
    pub extras: Extras,
}

/// A request to run the handler registered for a task identity.
///
/// Built with chained `with_*` methods; enqueue as many as needed, they are
/// cheap values. Serializable so hosts can marshal requests across process
/// boundaries (push payloads, IPC).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    task_id: String,
    #[serde(default)]
    options: RequestOptions,
    #[serde(default)]
    rate_limit_keys: Vec<String>,
    #[serde(default)]
    initial_delay: Duration,
}

impl TaskRequest {
    /// Creates a request for `task_id` with default options, no rate-limit
    /// keys, and no initial delay.
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            options: RequestOptions::default(),
            rate_limit_keys: Vec::new(),
            initial_delay: Duration::ZERO,
        }
    }

    /// Replaces the full option set.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the conflict policy.
    #[inline]
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.options.conflict_policy = policy;
        self
    }

    /// Requires (or waives) network connectivity for dispatch.
    #[inline]
    pub fn with_requires_network(mut self, required: bool) -> Self {
        self.options.requires_network = required;
        self
    }

    /// Adds a rate-limit key; dispatch waits until **every** key reports a
    /// zero wait, and consumes one slot per key when it happens.
    #[inline]
    pub fn with_rate_limit(mut self, key: impl Into<String>) -> Self {
        self.rate_limit_keys.push(key.into());
        self
    }

    /// Sets the minimum delay before the first attempt.
    #[inline]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Replaces the opaque extras payload.
    pub fn with_extras(mut self, extras: Extras) -> Self {
        self.options.extras = extras;
        self
    }

    /// Inserts one extras entry.
    #[inline]
    pub fn with_extra(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.options.extras.insert(key.into(), value.into());
        self
    }

    /// The task identity this request targets.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// The request's execution conditions.
    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Rate-limit keys gating dispatch.
    pub fn rate_limit_keys(&self) -> &[String] {
        &self.rate_limit_keys
    }

    /// Minimum delay before the first attempt.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }
}
