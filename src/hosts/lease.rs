//! # Execution leases: bounded, revocable background time.
//!
//! Hosts that restrict background execution (mobile platforms, managed
//! runtimes) grant work time through leases. The scheduler requests a named
//! lease before dispatching outside the foreground, keeps it while work is
//! outstanding, and disposes it when the last request drains.
//!
//! ## Contract
//! - [`LeaseProvider::request`] returns `None` when the host refuses; the
//!   scheduler parks dispatch and retries on the next foreground/active
//!   transition.
//! - The expiration handler tells the scheduler the host is revoking the
//!   grant early. After it runs, the lease is spent; [`Lease::dispose`] is
//!   still safe to call.
//! - Lease names are stable identifiers
//!   ([`TaskManager::WORK_LEASE_NAME`](crate::TaskManager::WORK_LEASE_NAME),
//!   [`TaskManager::RATE_LIMIT_LEASE_NAME`](crate::TaskManager::RATE_LIMIT_LEASE_NAME)),
//!   so providers can deduplicate or budget per name.
//!
//! Hosts without execution limits plug in [`NoopLeaseProvider`], which
//! always grants and never expires.

/// Source of execution leases. Implemented by the host.
pub trait LeaseProvider: Send + Sync + 'static {
    /// Requests a named lease. `None` means the host refuses right now.
    fn request(&self, name: &str) -> Option<Box<dyn Lease>>;
}

/// One granted execution window.
pub trait Lease: Send {
    /// Installs the callback the host invokes when it revokes the grant
    /// early. Called at most once per lease, before any work relies on it.
    fn set_expiration_handler(&mut self, handler: Box<dyn FnOnce() + Send>);

    /// Returns the grant to the host. Safe to call after expiration.
    fn dispose(self: Box<Self>);
}

/// Lease provider for hosts without background-execution limits.
///
/// Every request is granted; leases never expire and disposal is a no-op.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLeaseProvider;

impl LeaseProvider for NoopLeaseProvider {
    fn request(&self, _name: &str) -> Option<Box<dyn Lease>> {
        Some(Box::new(NoopLease))
    }
}

struct NoopLease;

impl Lease for NoopLease {
    fn set_expiration_handler(&mut self, _handler: Box<dyn FnOnce() + Send>) {}

    fn dispose(self: Box<Self>) {}
}
