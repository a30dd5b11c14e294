//! Error types surfaced by the taskgate runtime.
//!
//! The scheduler is deliberately quiet on its hot paths: enqueueing for an
//! unregistered identity, duplicate terminal signals, and lease refusals are
//! diagnosable no-ops reported as [`Event`](crate::Event)s, never as errors.
//! The only operation that can fail synchronously is rate-limit rule
//! configuration, via [`RateLimitError`].

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by rate-limit rule configuration.
///
/// Returned by [`RateLimiter::set_rule`](crate::RateLimiter::set_rule) and
/// [`TaskManager::set_rate_limit`](crate::TaskManager::set_rate_limit).
/// A rejected rule mutates no state; existing rules and recorded consumptions
/// are untouched.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// The rule parameters are unusable: `rate` must be at least 1 and
    /// `window` must be non-zero.
    #[error("invalid rate limit for key {key:?}: rate={rate} window={window:?}")]
    InvalidConfig {
        /// The rate-limit key the rule was meant for.
        key: String,
        /// The rejected rate (events per window).
        rate: u32,
        /// The rejected window length.
        window: Duration,
    },
}

impl RateLimitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskgate::RateLimitError;
    /// use std::time::Duration;
    ///
    /// let err = RateLimitError::InvalidConfig {
    ///     key: "uploads".into(),
    ///     rate: 0,
    ///     window: Duration::from_secs(10),
    /// };
    /// assert_eq!(err.as_label(), "rate_limit_invalid_config");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RateLimitError::InvalidConfig { .. } => "rate_limit_invalid_config",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RateLimitError::InvalidConfig { key, rate, window } => {
                format!("invalid rule for {key:?}: rate={rate} window={window:?}")
            }
        }
    }
}
