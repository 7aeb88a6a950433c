//! # Multiplexer configuration.
//!
//! Provides [`Config`], centralized settings for a [`Completions`](crate::Completions).
//!
//! Config is used in two ways:
//! 1. **Construction**: `Completions::builder(entries).config(cfg)`
//! 2. **Live tuning**: [`Completions::limit`](crate::Completions::limit) and
//!    [`Completions::set_update_interval`](crate::Completions::set_update_interval)
//!    mutate the same settings on a running instance.
//!
//! ## Sentinel values
//! - `max_in_flight = 0` → unlimited (admission window == wait set)
//!
//! The update interval has no sentinel: `None` blocks until an entry resolves,
//! `Some(Duration::ZERO)` makes every step a single non-blocking scan.

use std::time::Duration;

/// Configuration for the readiness multiplexer.
///
/// ## Field semantics
/// - `update_interval`: Per-step budget before a timeout yield (`None` = unbounded)
/// - `max_in_flight`: Admission window size (`0` = unlimited)
/// - `busy_poll`: Sleep quantum of the degraded busy-poll mode
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum time a single step may wait before yielding with the timeout flag.
    ///
    /// - `None` = a step blocks until an entry resolves
    /// - `Some(d)` = budget restarted at the beginning of every step
    ///   (`Some(Duration::ZERO)` = one scan, then a timeout yield)
    pub update_interval: Option<Duration>,

    /// Maximum number of entries actively driven at the same time.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = only the first `n` unresolved entries are polled
    pub max_in_flight: usize,

    /// Sleep between scans when some admitted entry exposes no descriptors.
    pub busy_poll: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Only used when the bus is created by the builder.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the update interval as an `Option`.
    ///
    /// - `None` → steps block until an entry resolves
    /// - `Some(d)` → per-step budget
    #[inline]
    pub fn interval(&self) -> Option<Duration> {
        self.update_interval
    }

    /// Returns the admission limit as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` entries in the window
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_in_flight == 0 {
            None
        } else {
            Some(self.max_in_flight)
        }
    }

    /// Returns the busy-poll quantum clamped to at least 1µs.
    #[inline]
    pub fn busy_poll_clamped(&self) -> Duration {
        self.busy_poll.max(Duration::from_micros(1))
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `update_interval = None` (no interval)
    /// - `max_in_flight = 0` (unlimited)
    /// - `busy_poll = 1ms`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            update_interval: None,
            max_in_flight: 0,
            busy_poll: Duration::from_millis(1),
            bus_capacity: 1024,
        }
    }
}
