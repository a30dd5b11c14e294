//! # Example: retry_backoff
//!
//! Demonstrates how a failed attempt is retried according to
//! [`BackoffPolicy`]: the request goes back to the *front* of its lane with
//! a delay derived from the number of prior failures, so a flaky request
//! finishes before anything queued behind it gets a turn.
//!
//! The default ladder is 30s/60s/120s; this demo shortens it to
//! 500ms/1s/2s so the retries are watchable.
//!
//! ## Flow
//! ```text
//! enqueue("flaky")
//!   ├─► [starting attempt=1] → task_failed()
//!   ├─► [failed] + [retry delay_ms=500]
//!   ├─► (500ms) [starting attempt=2] → task_failed()
//!   ├─► [failed] + [retry delay_ms=1000]
//!   ├─► (1s) [starting attempt=3] → task_completed()
//!   └─► [completed] ─► [lease-released]
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example retry_backoff --features logging
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use taskgate::{
    BackoffPolicy, Config, HandlerFn, JitterPolicy, LogWriter, RunningTask, Subscribe,
    TaskManager, TaskRequest,
};

static ATTEMPTS: AtomicU64 = AtomicU64::new(0);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Shrink the retry ladder so the demo runs in a couple of seconds
    let mut cfg = Config::default();
    cfg.backoff = BackoffPolicy {
        first: Duration::from_millis(500),
        max: Duration::from_secs(2),
        factor: 2.0,
        jitter: JitterPolicy::None,
    };

    // 2. Log every event, retries included
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];
    let manager = TaskManager::builder(cfg).with_subscribers(subs).build();

    // 3. A handler that fails twice before succeeding
    manager.register(
        "flaky",
        HandlerFn::arc(|task: RunningTask| async move {
            let attempt = ATTEMPTS.fetch_add(1, Ordering::Relaxed) + 1;
            if attempt <= 2 {
                println!("[flaky] attempt {attempt}: simulated failure");
                task.task_failed();
            } else {
                println!("[flaky] attempt {attempt}: success");
                task.task_completed();
            }
        }),
    );

    // 4. One request is enough; the manager drives the retries
    manager.enqueue(TaskRequest::new("flaky"));

    // 5. Wait for the final success, then stop
    while !manager.snapshot().await.is_idle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    manager.shutdown();

    println!("[main] done.");
    Ok(())
}
