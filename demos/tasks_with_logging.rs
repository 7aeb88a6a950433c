//! # Example: tasks_with_logging
//!
//! Resolves tokio tasks in completion order from a synchronous caller while a
//! [`LogWriter`] and a [`PendingTracker`] observe the iteration.
//!
//! Shows how to:
//! - Build [`TaskOperation`]s from closures bound to a runtime handle.
//! - Attach subscribers through [`Bus`] + [`spawn_listener`].
//! - Flush subscribers with [`SubscriberSet::shutdown`].
//!
//! ## Flow
//! ```text
//! Completions ── publish ──► Bus ──► spawn_listener ──► SubscriberSet
//!      │                                                   ├─► LogWriter
//!      └─ drain_all() (blocks main thread)                 └─► PendingTracker
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example tasks_with_logging --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use waitvisor::{
    Bus, Completions, LogWriter, PendingTracker, Subscribe, SubscriberSet, TaskError,
    TaskOperation, spawn_listener,
};

fn job(handle: &Handle, name: &'static str, ms: u64, fail: bool) -> TaskOperation {
    TaskOperation::from_fn(name, handle.clone(), move |ctx: CancellationToken| async move {
        tokio::select! {
            _ = ctx.cancelled() => return Err(TaskError::Canceled),
            _ = tokio::time::sleep(Duration::from_millis(ms)) => {}
        }
        if fail {
            return Err(TaskError::Fail {
                error: format!("{name} gave up"),
            });
        }
        Ok(())
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let bus = Bus::new(256);

    let tracker = Arc::new(PendingTracker::new());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new()), tracker.clone()];
    let token = CancellationToken::new();
    let listener = rt.block_on(async {
        let set = SubscriberSet::new(subs, bus.clone());
        spawn_listener(&bus, set, token.clone())
    });

    let handle = rt.handle().clone();
    let ops = [
        ("fetch", job(&handle, "fetch", 300, false)),
        ("index", job(&handle, "index", 100, false)),
        ("upload", job(&handle, "upload", 200, true)),
        ("notify", job(&handle, "notify", 50, false)),
    ];

    let mut done = Completions::builder(ops)
        .limit(3)
        .update_interval(Duration::from_millis(150))
        .with_bus(bus)
        .build()?;

    let resolved = done.drain_all();
    println!("resolved {resolved} tasks");
    for (key, op) in done.into_entries() {
        println!("  {key}: {:?}", op.result());
    }

    rt.block_on(async {
        token.cancel();
        if let Ok(set) = listener.await {
            set.shutdown().await;
        }
        println!("still pending: {:?}", tracker.snapshot().await);
    });
    Ok(())
}
