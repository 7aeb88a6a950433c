//! # Readiness multiplexer: resolve one entry per step.
//!
//! ## Step algorithm
//! ```text
//! step start (budget = update interval, clock taken by the caller
//!             before admission polls)
//! loop {
//!   scan window in order:
//!     ├─ captured failure      → candidate (first found), no descriptors
//!     ├─ is_ready() == true    → candidate (first found), keep scanning
//!     ├─ is_ready() == false   → collect readable/writable descriptors
//!     │                          (none exposed → descriptor wait impossible)
//!     └─ is_ready() raised     → capture failure, candidate, stop scanning
//!   candidate?                 → Resolved(id)
//!   budget exhausted?          → TimedOut
//!   descriptor wait possible?  → waiter.wait(readable, writable, remaining)
//!   otherwise                  → waiter.sleep(min(busy_poll, remaining))
//! }
//! ```
//!
//! ## Rules
//! - Among entries found ready in the same scan, window order wins (not
//!   completion time). A raising poll overrides that order.
//! - One entry without descriptors forces the busy-poll mode for the whole window.
//! - A failed descriptor wait degrades to one busy-poll sleep; it never escapes
//!   the step.
//! - The budget is per step; it is not carried over between steps.

use std::fmt::Debug;
use std::os::fd::RawFd;
use std::time::{Duration, Instant};

use crate::core::waiter::DescriptorWait;
use crate::events::{Bus, Event, EventKind};
use crate::operations::Operation;

/// Result of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    /// Entry `id` was selected for resolution.
    Resolved(usize),
    /// The update interval elapsed first.
    TimedOut,
}

/// Result of one pass over the admission window.
#[derive(Debug)]
pub(crate) struct Scan {
    candidate: Option<usize>,
    readable: Vec<RawFd>,
    writable: Vec<RawFd>,
    waitable: bool,
}

/// Publishes the event built by `make` if somebody listens on `bus`.
pub(crate) fn publish_with(bus: Option<&Bus>, make: impl FnOnce() -> Event) {
    if let Some(bus) = bus.filter(|b| b.has_receivers()) {
        bus.publish(make());
    }
}

/// Polls `op` once and captures a raised failure on it.
///
/// Returns `Some(ready)` or `None` when the poll failed.
pub(crate) fn poll_capturing<K: Debug, O: Operation>(
    key: &K,
    op: &mut O,
    bus: Option<&Bus>,
) -> Option<bool> {
    match op.is_ready() {
        Ok(ready) => Some(ready),
        Err(err) => {
            publish_with(bus, || {
                Event::new(EventKind::EntryFailed)
                    .with_key(format!("{key:?}"))
                    .with_reason(err.to_string())
            });
            op.capture_failure(err);
            None
        }
    }
}

/// Drives a window until one entry resolves or the interval elapses.
pub(crate) struct Multiplexer<'a, W> {
    pub(crate) waiter: &'a mut W,
    pub(crate) interval: Option<Duration>,
    pub(crate) busy_poll: Duration,
    pub(crate) bus: Option<&'a Bus>,
    /// Start of the step; admission polls made before the scan count against the budget.
    pub(crate) started: Instant,
}

impl<W: DescriptorWait> Multiplexer<'_, W> {
    /// Runs one step over `window` (ids into `entries`).
    ///
    /// `window` must not be empty unless an interval is configured.
    pub(crate) fn step<K: Debug, O: Operation>(
        &mut self,
        entries: &mut [(K, O)],
        window: &[usize],
    ) -> StepOutcome {
        let started = self.started;
        let mut fallback_reported = false;

        loop {
            let scan = self.scan(entries, window);
            if let Some(id) = scan.candidate {
                return StepOutcome::Resolved(id);
            }

            let remaining = match self.interval {
                Some(interval) => {
                    let elapsed = started.elapsed();
                    if elapsed >= interval {
                        return StepOutcome::TimedOut;
                    }
                    Some(interval - elapsed)
                }
                None => None,
            };

            if scan.waitable {
                match self.waiter.wait(&scan.readable, &scan.writable, remaining) {
                    Ok(()) => continue,
                    Err(err) => publish_with(self.bus, || {
                        Event::new(EventKind::WaitFailed).with_reason(err.to_string())
                    }),
                }
            } else if !fallback_reported {
                fallback_reported = true;
                publish_with(self.bus, || {
                    Event::new(EventKind::BusyPollFallback).with_count(window.len())
                });
            }

            let quantum = remaining.map_or(self.busy_poll, |r| r.min(self.busy_poll));
            self.waiter.sleep(quantum);
        }
    }

    fn scan<K: Debug, O: Operation>(&self, entries: &mut [(K, O)], window: &[usize]) -> Scan {
        let mut scan = Scan {
            candidate: None,
            readable: Vec::new(),
            writable: Vec::new(),
            waitable: true,
        };

        for &id in window {
            let (key, op) = &mut entries[id];

            if op.captured_failure().is_some() {
                scan.candidate.get_or_insert(id);
                continue;
            }

            match poll_capturing(key, op, self.bus) {
                None => {
                    scan.candidate = Some(id);
                    break;
                }
                Some(true) => {
                    scan.candidate.get_or_insert(id);
                }
                Some(false) => {
                    let readable = op.readable_descriptors();
                    let writable = op.writable_descriptors();
                    if readable.is_empty() && writable.is_empty() {
                        scan.waitable = false;
                    }
                    scan.readable.extend(readable);
                    scan.writable.extend(writable);
                }
            }
        }
        scan
    }
}
