//! # Events emitted by the multiplexer and the subscriber workers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Iteration events**: reset and exhaustion of a [`Completions`](crate::Completions)
//! - **Entry events**: admission, resolution and captured failures
//! - **Wait events**: interval yields and degraded waiting modes
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! entry key (its `Debug` rendering), reasons and counters.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use waitvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::EntryFailed)
//!     .with_key("\"build\"")
//!     .with_reason("spawn failed");
//!
//! assert_eq!(ev.kind, EventKind::EntryFailed);
//! assert_eq!(ev.key.as_deref(), Some("\"build\""));
//! assert_eq!(ev.reason.as_deref(), Some("spawn failed"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `key`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `key`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Iteration events ===
    /// Iteration (re)started by `reset()`.
    ///
    /// Sets:
    /// - `count`: number of entries in the wait set
    IterationStarted,

    /// Wait set exhausted; the cursor is unset.
    ///
    /// Sets:
    /// - `count`: number of entries resolved since the last reset
    IterationExhausted,

    // === Entry events ===
    /// Entry entered the admission window and was polled for the first time.
    ///
    /// Sets:
    /// - `key`: entry key
    /// - `count`: admission window size after the refill
    EntryAdmitted,

    /// Entry was selected for resolution and left the wait set.
    ///
    /// Sets:
    /// - `key`: entry key
    /// - `elapsed_ms`: time spent in the step that resolved it
    /// - `reason`: captured failure message, if the entry failed
    EntryResolved,

    /// Readiness poll of an entry failed; the failure was captured on the entry.
    ///
    /// Sets:
    /// - `key`: entry key
    /// - `reason`: failure message
    EntryFailed,

    // === Wait events ===
    /// Update interval elapsed without any entry resolving.
    ///
    /// Sets:
    /// - `elapsed_ms`: configured interval
    /// - `count`: number of entries still pending
    IntervalElapsed,

    /// At least one admitted entry exposes no descriptors; the step busy-polls.
    ///
    /// Sets:
    /// - `count`: admission window size
    BusyPollFallback,

    /// The descriptor wait failed; the scan degraded to a busy-poll sleep.
    ///
    /// Sets:
    /// - `reason`: OS error message
    WaitFailed,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Entry key (`Debug` rendering) or subscriber name.
    pub key: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Counter whose meaning depends on the kind (window size, pending entries, ...).
    pub count: Option<usize>,
    /// Duration in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            key: None,
            reason: None,
            count: None,
            elapsed_ms: None,
        }
    }

    /// Attaches an entry key (or subscriber name).
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a counter.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n);
        self
    }

    /// Attaches a duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.elapsed_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_key(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_key(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::IterationStarted);
        let b = Event::new(EventKind::IterationExhausted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn elapsed_is_clamped() {
        let ev = Event::new(EventKind::IntervalElapsed).with_elapsed(Duration::from_secs(u64::MAX));
        assert_eq!(ev.elapsed_ms, Some(u32::MAX));
    }
}
