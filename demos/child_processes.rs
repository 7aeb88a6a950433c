//! # Example: child_processes
//!
//! Runs a handful of shell commands and reports them as they finish.
//!
//! Shows how to:
//! - Wrap [`Command`]s in [`ChildOperation`]s (spawned only once admitted).
//! - Bound concurrency with [`CompletionsBuilder::limit`](waitvisor::CompletionsBuilder::limit).
//! - Use the update interval to print progress while nothing finishes.
//!
//! ## Flow
//! ```text
//! build ──► reset()
//!   ├─► admit "sleep-3", "sleep-1"         (window = 2)
//!   ├─► poll(2) on their stdout pipes
//!   ├─► "sleep-1" finishes ──► yield, admit "fail"
//!   ├─► nothing for 500ms  ──► timeout yield (progress line)
//!   └─► ... until every key was yielded once
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example child_processes
//! ```

use std::process::Command;
use std::time::{Duration, Instant};

use waitvisor::{ChildOperation, Completions};

fn sh(script: &str) -> ChildOperation {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", script]);
    ChildOperation::new(cmd)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let jobs = vec![
        ("sleep-3", sh("sleep 3; echo slept 3")),
        ("sleep-1", sh("sleep 1; echo slept 1")),
        ("fail", sh("echo about to fail; exit 3")),
        ("sleep-2", sh("sleep 2; echo slept 2")),
    ];

    let mut done = Completions::builder(jobs)
        .limit(2)
        .update_interval(Duration::from_millis(500))
        .build()?;

    let started = Instant::now();
    done.reset();
    while done.is_valid() {
        let elapsed = started.elapsed().as_secs_f32();
        if done.timed_out() {
            let running: Vec<_> = done.admitted_keys().copied().collect();
            println!("[{elapsed:>5.2}s] waiting on {running:?} ({} pending)", done.pending());
        } else if let Some((key, op)) = done.current() {
            match op.result() {
                Some(Ok(out)) => println!(
                    "[{elapsed:>5.2}s] {key}: ok, stdout={:?}",
                    String::from_utf8_lossy(&out.stdout).trim_end()
                ),
                Some(Err(e)) => println!("[{elapsed:>5.2}s] {key}: {}", e.as_message()),
                None => println!("[{elapsed:>5.2}s] {key}: no result"),
            }
        }
        done.advance();
    }

    println!("all done in {:.2}s", started.elapsed().as_secs_f32());
    Ok(())
}
