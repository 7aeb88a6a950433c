//! # waitvisor
//!
//! **Waitvisor** resolves many independent asynchronous operations in the order
//! they **complete**, not the order they were submitted.
//!
//! It drives a keyed set of [`Operation`]s from a synchronous caller: each step
//! yields exactly one finished entry, bounds how many entries are actively
//! driven (admission window), and can hand control back on a fixed interval
//! even if nothing finished.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ (key, op #1) │   │ (key, op #2) │   │ (key, op #3) │
//!     │ ChildOp/Task │   │   PollFn     │   │   custom     │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Completions (iteration protocol)                                 │
//! │  - WaitSet (unresolved entries + admission window)                │
//! │  - Cursor (current key / timeout yield)                           │
//! │  - Multiplexer (scan ─► descriptor wait ─► busy-poll fallback)    │
//! │  - DescriptorWait (PollWaiter over poll(2))                       │
//! └──────┬───────────────────────────────────────────────────┬────────┘
//!        │ Publishes (optional):                             │
//!        │ - IterationStarted / IterationExhausted           │
//!        │ - EntryAdmitted / EntryResolved / EntryFailed     │
//!        │ - IntervalElapsed / BusyPollFallback / WaitFailed │
//!        ▼                                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                  (capacity: Config::bus_capacity)                 │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │     spawn_listener     │
//!                       │   (tokio task, async)  │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                    LogWriter  PendingTr.   custom
//! ```
//!
//! ### Iteration
//! ```text
//! reset() ──► admit ──► step ──► advance() ──► step ──► ... ──► is_valid() == false
//!
//! step {
//!   ├─► admit: refill window (limit), poll newly admitted entries once
//!   ├─► scan window in order
//!   │     ├─ ready / captured failure ─► Resolved(first in window order)
//!   │     └─ poll raised              ─► capture, Resolved(that entry)
//!   ├─► interval elapsed?             ─► TimedOut (current = None, timed_out = true)
//!   ├─► all pending entries expose descriptors?
//!   │     ├─ yes ─► poll(2) on them, bounded by the remaining interval
//!   │     └─ no  ─► sleep ~1ms (busy-poll)
//!   └─► repeat scan
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                         | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------------|---------------------------------------------|
//! | **Iteration**     | Completion-order protocol with window and interval.                 | [`Completions`], [`CompletionsBuilder`]     |
//! | **Operations**    | Pollable units; closures, tokio tasks, subprocesses.                | [`Operation`], [`PollFn`], [`TaskOperation`], [`ChildOperation`] |
//! | **Waiting**       | Blocking primitive over OS descriptors.                             | [`DescriptorWait`], [`PollWaiter`]          |
//! | **Subscriber API**| Observe iteration events (logging, progress).                       | [`Subscribe`], [`SubscriberSet`]            |
//! | **Errors**        | Typed errors for configuration and captured failures.               | [`MultiplexError`], [`OperationError`], [`TaskError`] |
//! | **Configuration** | Centralize interval, window and busy-poll settings.                 | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use waitvisor::{BoxOperation, Completions, PollFn};
//!
//! let mut polls = 0;
//! let entries: Vec<(&str, BoxOperation)> = vec![
//!     ("a", Box::new(PollFn::new(move || { polls += 1; Ok(polls > 3) }))),
//!     ("b", Box::new(PollFn::new(|| Ok(true)))),
//! ];
//!
//! let mut done = Completions::builder(entries)
//!     .limit(2)
//!     .update_interval(Duration::from_millis(100))
//!     .build()
//!     .unwrap();
//!
//! done.reset();
//! while done.is_valid() {
//!     match done.current_key() {
//!         Some(key) => println!("{key} finished"),
//!         None => println!("still waiting..."),
//!     }
//!     done.advance();
//! }
//! ```
mod core;
mod error;
mod events;
mod operations;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{Completions, CompletionsBuilder, Config, DescriptorWait, PollWaiter};
pub use error::{MultiplexError, OperationError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use operations::{
    BoxOperation, ChildOperation, ChildOutput, FailureSlot, Operation, PollFn, TaskOperation,
};
pub use subscribers::{PendingTracker, Subscribe, SubscriberSet, spawn_listener};
pub use tasks::{BoxTaskFuture, Task, TaskRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
