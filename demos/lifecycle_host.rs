//! # Example: lifecycle_host
//!
//! Demonstrates the host integration surface: a settable [`NetworkSwitch`],
//! and a [`LifecycleHub`] feeding app transitions into the manager.
//!
//! Three behaviors are visible in the event log:
//! - a request that requires connectivity waits for the connected edge;
//! - entering background fast-forwards pending timer waits, so a delayed
//!   request runs immediately instead of after its full delay;
//! - `WillTerminate` stops the manager and returns any held lease.
//!
//! ## Flow
//! ```text
//! (offline) enqueue("sync", requires_network)
//!            ─► [network-deferred]
//! t+0.5s    network.set_connected(true)
//!            ─► [starting] ─► [completed]
//!
//! enqueue("report", initial_delay=60s)    (would run a minute from now)
//! t+1.0s    lifecycle.emit(EnteredBackground)
//!            ─► delay fast-forwarded ─► [starting] ─► [completed]
//!
//! t+1.5s    lifecycle.emit(WillTerminate)
//!            ─► [manager-stopped reason=terminate]
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example lifecycle_host --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use taskgate::{
    Config, HandlerFn, HandlerRef, LifecycleEvent, LifecycleHub, LifecycleSource, LogWriter,
    NetworkMonitor, NetworkSwitch, RunningTask, Subscribe, TaskManager, TaskRequest,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Host-controlled integrations: start offline
    let network = Arc::new(NetworkSwitch::new(false));
    let lifecycle = Arc::new(LifecycleHub::new());

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];
    let manager = TaskManager::builder(Config::default())
        .with_network_monitor(Arc::clone(&network) as Arc<dyn NetworkMonitor>)
        .with_lifecycle(Arc::clone(&lifecycle) as Arc<dyn LifecycleSource>)
        .with_subscribers(subs)
        .build();

    let done: HandlerRef = HandlerFn::arc(|task: RunningTask| async move {
        println!("[work] running {}", task.task_id());
        task.task_completed();
    });
    manager.register("sync", Arc::clone(&done));
    manager.register("report", done);

    // 2. Offline: the request parks on the connectivity gate
    manager.enqueue(TaskRequest::new("sync").with_requires_network(true));
    tokio::time::sleep(Duration::from_millis(500)).await;

    // 3. Connectivity returns; the parked request dispatches
    println!("[host] network is back");
    network.set_connected(true);
    tokio::time::sleep(Duration::from_millis(500)).await;

    // 4. A long initial delay, cut short by the background transition
    manager.enqueue(TaskRequest::new("report").with_initial_delay(Duration::from_secs(60)));
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("[host] entering background");
    lifecycle.emit(LifecycleEvent::EnteredBackground);
    tokio::time::sleep(Duration::from_millis(500)).await;

    // 5. The host is shutting down for good
    println!("[host] terminating");
    lifecycle.emit(LifecycleEvent::WillTerminate);
    tokio::time::sleep(Duration::from_millis(300)).await;

    println!("[main] done.");
    Ok(())
}
