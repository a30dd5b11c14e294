//! # TaskManagerBuilder: wires hosts, policies, and subscribers into a manager.
//!
//! Every host integration is optional; the defaults suit unconstrained hosts
//! and tests. `build()` spawns the actor loop and, when subscribers are
//! present, the listener that bridges the event bus to the
//! [`SubscriberSet`].
//!
//! ## Example
//! ```rust
//! use taskgate::{Config, HandlerFn, RunningTask, TaskManager, TaskRequest};
//!
//! # async fn demo() {
//! let manager = TaskManager::builder(Config::default()).build();
//! manager.register(
//!     "sync",
//!     HandlerFn::arc(|task: RunningTask| async move {
//!         task.task_completed();
//!     }),
//! );
//! manager.enqueue(TaskRequest::new("sync"));
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::dispatch::{Dispatch, RuntimeDispatcher};
use crate::events::Bus;
use crate::hosts::{
    LeaseProvider, LifecycleHub, LifecycleSource, NetworkMonitor, NetworkSwitch, NoopLeaseProvider,
};
use crate::rate_limit::RateLimiter;
use crate::subscribers::{Subscribe, SubscriberSet};

use super::actor::Actor;
use super::manager::TaskManager;

/// Builder for a [`TaskManager`] with optional host integrations.
///
/// ### Defaults
/// - clock: [`SystemClock`]
/// - rate limiter: fresh [`RateLimiter`] over the same clock
/// - lease provider: [`NoopLeaseProvider`] (always grants)
/// - network monitor: [`NetworkSwitch`] starting connected
/// - lifecycle: a [`LifecycleHub`] nobody drives
/// - dispatcher: [`RuntimeDispatcher`] (`tokio::spawn`)
pub struct TaskManagerBuilder {
    cfg: Config,
    clock: Option<Arc<dyn Clock>>,
    limiter: Option<Arc<RateLimiter>>,
    leases: Option<Arc<dyn LeaseProvider>>,
    network: Option<Arc<dyn NetworkMonitor>>,
    lifecycle: Option<Arc<dyn LifecycleSource>>,
    dispatcher: Option<Arc<dyn Dispatch>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl TaskManagerBuilder {
    /// Creates a builder with the given configuration and all defaults.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            clock: None,
            limiter: None,
            leases: None,
            network: None,
            lifecycle: None,
            dispatcher: None,
            subscribers: Vec::new(),
        }
    }

    /// Sets the clock scheduling math reads time from.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Shares an existing rate limiter (for example one the host also tracks
    /// external consumptions on).
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Sets the execution-lease provider.
    pub fn with_lease_provider(mut self, provider: Arc<dyn LeaseProvider>) -> Self {
        self.leases = Some(provider);
        self
    }

    /// Sets the connectivity source.
    pub fn with_network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network = Some(monitor);
        self
    }

    /// Sets the lifecycle source the host drives.
    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn LifecycleSource>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// Sets the default dispatcher for handlers registered without one.
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn Dispatch>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events through dedicated workers with
    /// bounded queues; a slow subscriber never stalls the scheduler.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the manager and spawns its actor loop.
    ///
    /// Must be called within a tokio runtime.
    pub fn build(self) -> Arc<TaskManager> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let limiter = self
            .limiter
            .unwrap_or_else(|| Arc::new(RateLimiter::new(Arc::clone(&clock))));
        let leases = self.leases.unwrap_or_else(|| Arc::new(NoopLeaseProvider));
        let network = self
            .network
            .unwrap_or_else(|| Arc::new(NetworkSwitch::default()));
        let lifecycle = self
            .lifecycle
            .unwrap_or_else(|| Arc::new(LifecycleHub::new()));
        let dispatcher = self
            .dispatcher
            .unwrap_or_else(|| RuntimeDispatcher::shared());

        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers);
            let mut events = bus.subscribe();
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) => set.emit(&event),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        // Closed: the actor and every manager handle are gone.
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let actor = Actor {
            cfg: self.cfg,
            bus: bus.clone(),
            clock,
            limiter: Arc::clone(&limiter),
            leases,
            network,
            lifecycle,
            default_dispatcher: dispatcher,
            tx: tx.clone(),
            registrations: HashMap::new(),
            lanes: HashMap::new(),
            work_lease: None,
            rate_lease: None,
            rate_lease_timer: None,
            parked: false,
            next_run_id: 0,
            next_timer_id: 0,
        };
        tokio::spawn(actor.run(rx, cancel.clone()));

        Arc::new(TaskManager::new(tx, bus, limiter, cancel))
    }
}
