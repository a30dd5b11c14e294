//! # Application lifecycle signal.
//!
//! The scheduler reacts to four host transitions:
//! - `EnteredBackground`: delay-blocked requests run immediately, and a
//!   short rate-limit-wait lease may be requested (see
//!   [`Config`](crate::Config) tunables);
//! - `BecameActive` / `EnteredForeground`: parked lease acquisition is
//!   retried and every lane is re-evaluated;
//! - `WillTerminate`: held leases are disposed and the manager stops.
//!
//! Hosts drive a [`LifecycleHub`]; the scheduler subscribes through the
//! [`LifecycleSource`] trait. The default hub built by
//! [`TaskManagerBuilder`](crate::TaskManagerBuilder) is never driven, which
//! suits hosts without a lifecycle.

use tokio::sync::broadcast;

/// Lifecycle capacity is small: transitions are rare and latest-wins.
const LIFECYCLE_CAPACITY: usize = 16;

/// Host application lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The app moved to the foreground.
    EnteredForeground,
    /// The app moved to the background.
    EnteredBackground,
    /// The app became active (foreground, receiving input).
    BecameActive,
    /// The host is about to terminate the process.
    WillTerminate,
}

/// Source of lifecycle events. Implemented by the host.
pub trait LifecycleSource: Send + Sync + 'static {
    /// A receiver observing subsequent lifecycle transitions.
    fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent>;
}

/// Broadcast hub the host pushes lifecycle transitions into.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use taskgate::{LifecycleEvent, LifecycleHub};
///
/// let hub = Arc::new(LifecycleHub::new());
/// hub.emit(LifecycleEvent::EnteredBackground);
/// ```
#[derive(Debug)]
pub struct LifecycleHub {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl LifecycleHub {
    /// Creates a hub with nothing subscribed yet.
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(LIFECYCLE_CAPACITY);
        Self { tx }
    }

    /// Publishes a transition to every subscriber. Dropped silently when no
    /// one listens.
    pub fn emit(&self, event: LifecycleEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for LifecycleHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleSource for LifecycleHub {
    fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }
}
