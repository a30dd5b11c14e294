//! # Network connectivity signal.
//!
//! Requests built with
//! [`with_requires_network(true)`](crate::TaskRequest::with_requires_network)
//! stay queued while the host reports no connectivity and wake on the
//! disconnected→connected edge, without being re-enqueued.
//!
//! The scheduler consumes the signal through [`NetworkMonitor`]: a current
//! value plus a [`tokio::sync::watch`] change stream. [`NetworkSwitch`] is
//! the in-process implementation; it doubles as the default ("always
//! connected") and as the test double.

use tokio::sync::watch;

/// Connectivity source. Implemented by the host.
pub trait NetworkMonitor: Send + Sync + 'static {
    /// Current connectivity.
    fn is_connected(&self) -> bool;

    /// A receiver that yields on every connectivity change.
    fn watch(&self) -> watch::Receiver<bool>;
}

/// Settable connectivity switch over a watch channel.
///
/// ## Example
/// ```rust
/// use taskgate::{NetworkMonitor, NetworkSwitch};
///
/// let switch = NetworkSwitch::new(false);
/// assert!(!switch.is_connected());
/// switch.set_connected(true); // wakes the scheduler's watch arm
/// ```
#[derive(Debug)]
pub struct NetworkSwitch {
    tx: watch::Sender<bool>,
}

impl NetworkSwitch {
    /// Creates a switch with the given initial state.
    pub fn new(connected: bool) -> Self {
        let (tx, _rx) = watch::channel(connected);
        Self { tx }
    }

    /// Flips connectivity. Receivers only wake on actual changes.
    pub fn set_connected(&self, connected: bool) {
        self.tx.send_if_modified(|state| {
            let changed = *state != connected;
            *state = connected;
            changed
        });
    }
}

impl Default for NetworkSwitch {
    /// Returns a switch that starts connected.
    fn default() -> Self {
        Self::new(true)
    }
}

impl NetworkMonitor for NetworkSwitch {
    fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
