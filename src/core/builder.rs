use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use crate::{
    core::{Config, completions::Completions, waiter::{DescriptorWait, PollWaiter}},
    error::MultiplexError,
    events::Bus,
    operations::Operation,
};

/// Builder for constructing a [`Completions`] with optional features.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use waitvisor::{Completions, PollFn};
///
/// let entries = (0..4).map(|i| (i, PollFn::new(|| Ok(true))));
/// let done = Completions::builder(entries)
///     .limit(2)
///     .update_interval(Duration::from_millis(500))
///     .build()
///     .unwrap();
/// assert_eq!(done.len(), 4);
/// ```
pub struct CompletionsBuilder<K, O, W = PollWaiter> {
    entries: Vec<(K, O)>,
    cfg: Config,
    waiter: W,
    bus: Option<Bus>,
}

impl<K, O> CompletionsBuilder<K, O, PollWaiter> {
    /// Creates a new builder over `entries` (order is preserved) with default configuration.
    pub fn new(entries: impl IntoIterator<Item = (K, O)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            cfg: Config::default(),
            waiter: PollWaiter::new(),
            bus: None,
        }
    }
}

impl<K, O, W> CompletionsBuilder<K, O, W> {
    /// Replaces the whole configuration.
    pub fn config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Bounds the admission window (`0` = unlimited).
    pub fn limit(mut self, max_in_flight: usize) -> Self {
        self.cfg.max_in_flight = max_in_flight;
        self
    }

    /// Sets the per-step update interval.
    ///
    /// `Duration::ZERO` makes every step a single non-blocking scan.
    pub fn update_interval(mut self, interval: Duration) -> Self {
        self.cfg.update_interval = Some(interval);
        self
    }

    /// Sets the busy-poll sleep quantum.
    pub fn busy_poll(mut self, quantum: Duration) -> Self {
        self.cfg.busy_poll = quantum;
        self
    }

    /// Publishes events on an existing bus.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Publishes events on a new bus sized by [`Config::bus_capacity`].
    ///
    /// Retrieve it with [`Completions::bus`] to subscribe.
    pub fn with_event_bus(mut self) -> Self {
        self.bus = Some(Bus::new(self.cfg.bus_capacity_clamped()));
        self
    }

    /// Replaces the blocking primitive.
    pub fn waiter<W2: DescriptorWait>(self, waiter: W2) -> CompletionsBuilder<K, O, W2> {
        CompletionsBuilder {
            entries: self.entries,
            cfg: self.cfg,
            waiter,
            bus: self.bus,
        }
    }

    /// Validates the entries and builds the multiplexer.
    ///
    /// # Errors
    /// [`MultiplexError::DuplicateKey`] if a key appears more than once.
    pub fn build(self) -> Result<Completions<K, O, W>, MultiplexError>
    where
        K: Eq + Hash + Debug,
        O: Operation,
        W: DescriptorWait,
    {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for (key, _) in &self.entries {
            if !seen.insert(key) {
                return Err(MultiplexError::DuplicateKey {
                    key: format!("{key:?}"),
                });
            }
        }
        Ok(Completions::from_parts(
            self.entries,
            self.cfg,
            self.waiter,
            self.bus,
        ))
    }
}
