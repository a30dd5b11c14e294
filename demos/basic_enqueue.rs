//! # Example: basic_enqueue
//!
//! Demonstrates the smallest useful [`TaskManager`] setup: register a
//! handler for an identity, enqueue requests for it, and watch the runtime
//! events with the built-in [`LogWriter`] subscriber.
//!
//! Two requests for the same identity never overlap: the second waits in
//! the lane until the first reports its terminal signal. A `Replace`
//! request supersedes anything still queued (the running one is untouched).
//!
//! ## Flow
//! ```text
//! enqueue("greet")            ─► [enqueued] ─► [lease-acquired] ─► [starting]
//! enqueue("greet")            ─► [enqueued]            (queued behind run #1)
//! enqueue("greet", Replace)   ─► [dropped reason=replace] + [enqueued]
//!
//! run #1 → task_completed()   ─► [completed] ─► [starting]  (the Replace one)
//! run #2 → task_completed()   ─► [completed] ─► [lease-released]
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_enqueue --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use taskgate::{
    Config, ConflictPolicy, HandlerFn, LogWriter, RunningTask, Subscribe, TaskManager, TaskRequest,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Default configuration (bus capacity 1024, 30s/60s/120s retry ladder)
    let cfg = Config::default();

    // 2. Attach the stdout logger so every runtime event is visible
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];

    // 3. Create the manager with default host integrations (always-granted
    //    leases, always-connected network)
    let manager = TaskManager::builder(cfg).with_subscribers(subs).build();

    // 4. Bind work to the "greet" identity
    manager.register(
        "greet",
        HandlerFn::arc(|task: RunningTask| async move {
            let who = task
                .options()
                .extras
                .get("who")
                .and_then(|v| v.as_str())
                .unwrap_or("world")
                .to_owned();
            println!("[greet] hello, {who}!");
            tokio::time::sleep(Duration::from_millis(300)).await;
            task.task_completed();
        }),
    );

    // 5. Three requests: the Replace one evicts the still-queued second
    manager.enqueue(TaskRequest::new("greet").with_extra("who", "first"));
    manager.enqueue(TaskRequest::new("greet").with_extra("who", "second"));
    manager.enqueue(
        TaskRequest::new("greet")
            .with_extra("who", "replacement")
            .with_conflict_policy(ConflictPolicy::Replace),
    );

    // 6. Wait until the lane drains, then stop the actor
    while !manager.snapshot().await.is_idle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    manager.shutdown();

    println!("[main] done.");
    Ok(())
}
