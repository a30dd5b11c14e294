//! Host integration surface.
//!
//! The scheduler never talks to a platform directly; everything it needs
//! from its environment comes through three consumed traits, each shipped
//! with a default implementation good enough for unconstrained hosts and
//! for tests:
//!
//! - [`LeaseProvider`] / [`Lease`] — bounded revocable execution time
//!   ([`NoopLeaseProvider`] always grants)
//! - [`NetworkMonitor`] — connectivity signal ([`NetworkSwitch`] is settable)
//! - [`LifecycleSource`] — app transitions ([`LifecycleHub`] is host-driven)

mod lease;
mod lifecycle;
mod network;

pub use lease::{Lease, LeaseProvider, NoopLeaseProvider};
pub use lifecycle::{LifecycleEvent, LifecycleHub, LifecycleSource};
pub use network::{NetworkMonitor, NetworkSwitch};
