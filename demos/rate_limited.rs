//! # Example: rate_limited
//!
//! Demonstrates sliding-window rate limiting. A rule of "2 per 3 seconds"
//! is configured for the `pings` key; five requests tagged with that key
//! are enqueued at once. The first two dispatch immediately, the rest are
//! deferred until the window frees a slot.
//!
//! Budget is consumed at dispatch time only: a request that sits queued
//! costs nothing until the moment it actually starts.
//!
//! ## Flow
//! ```text
//! t=0.0s  ping #1 runs, ping #2 runs       (2 of 2 used)
//!         pings #3..#5 ─► [rate-limit-deferred wait_ms≈3000]
//! t=3.0s  ping #3 runs, ping #4 runs       (window freed 2 slots)
//! t=6.0s  ping #5 runs
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example rate_limited --features logging
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use taskgate::{Config, HandlerFn, LogWriter, RunningTask, Subscribe, TaskManager, TaskRequest};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];
    let manager = TaskManager::builder(Config::default())
        .with_subscribers(subs)
        .build();

    // 1. At most 2 dispatches per rolling 3-second window
    manager.set_rate_limit("pings", 2, Duration::from_secs(3))?;

    // 2. The handler prints when it actually got to run
    let started = Instant::now();
    manager.register(
        "ping",
        HandlerFn::arc(move |task: RunningTask| {
            let elapsed = started.elapsed();
            async move {
                let n = task
                    .options()
                    .extras
                    .get("n")
                    .and_then(|v| v.as_i64())
                    .unwrap_or(0);
                println!("[ping] #{n} ran at t={:.1}s", elapsed.as_secs_f64());
                task.task_completed();
            }
        }),
    );

    // 3. Five requests, one budget unit each
    for n in 1..=5 {
        manager.enqueue(
            TaskRequest::new("ping")
                .with_extra("n", n)
                .with_rate_limit("pings"),
        );
    }

    // 4. Drain: roughly two dispatches every 3 seconds
    while !manager.snapshot().await.is_idle() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    manager.shutdown();

    println!("[main] done.");
    Ok(())
}
