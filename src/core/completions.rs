//! # Completion-order iteration over many operations.
//!
//! [`Completions`] owns an ordered set of `(key, operation)` entries and hands
//! them back in the order they **complete**, one per step, while bounding how
//! many are actively driven and optionally yielding on a fixed interval.
//!
//! ## Protocol
//! ```text
//! build ──► reset() ──► [step] ──► advance() ──► [step] ──► ... ──► is_valid() == false
//!               │                      │
//!               │                      └─ no-op once the wait set is empty
//!               └─ rebuild wait set, re-prime window (restartable)
//!
//! step:
//!   ├─ admit: refill window, poll newly admitted entries once
//!   ├─ multiplex: scan / wait / busy-poll until a candidate or the interval
//!   ├─ Resolved(id) ─► cursor = id, id leaves the wait set, admit again
//!   └─ TimedOut     ─► cursor unset, timed_out = true (entries kept)
//! ```
//!
//! ## Rules
//! - Each key is yielded exactly once per reset.
//! - Among entries found ready in the same scan, construction order wins.
//! - A failing readiness poll never aborts the iteration: the failure is
//!   captured on the operation and its key is yielded like any other.
//! - The update interval is a per-step budget.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::core::builder::CompletionsBuilder;
use crate::core::config::Config;
use crate::core::cursor::Cursor;
use crate::core::multiplexer::{Multiplexer, StepOutcome, poll_capturing, publish_with};
use crate::core::wait_set::WaitSet;
use crate::core::waiter::{DescriptorWait, PollWaiter};
use crate::error::MultiplexError;
use crate::events::{Bus, Event, EventKind};
use crate::operations::Operation;

/// Completion-order multiplexer over keyed operations.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use waitvisor::{BoxOperation, Completions, PollFn};
///
/// let mut countdown = 3;
/// let entries: Vec<(&str, BoxOperation)> = vec![
///     ("slow", Box::new(PollFn::new(move || { countdown -= 1; Ok(countdown == 0) }))),
///     ("fast", Box::new(PollFn::new(|| Ok(true)))),
/// ];
///
/// let mut it = Completions::new(entries).unwrap();
/// it.set_update_interval(Some(Duration::from_millis(50)));
///
/// let mut order = Vec::new();
/// it.reset();
/// while it.is_valid() {
///     if let Some(key) = it.current_key() {
///         order.push(*key);
///     }
///     it.advance();
/// }
/// assert_eq!(order, vec!["fast", "slow"]);
/// ```
pub struct Completions<K, O, W = PollWaiter> {
    entries: Vec<(K, O)>,
    wait_set: WaitSet,
    cursor: Cursor,
    config: Config,
    waiter: W,
    bus: Option<Bus>,
    started: bool,
    exhausted: bool,
    resolved: usize,
}

impl<K, O> Completions<K, O, PollWaiter>
where
    K: Eq + Hash + Debug,
    O: Operation,
{
    /// Creates a multiplexer with default configuration.
    ///
    /// # Errors
    /// [`MultiplexError::DuplicateKey`] if a key appears more than once.
    pub fn new(entries: impl IntoIterator<Item = (K, O)>) -> Result<Self, MultiplexError> {
        CompletionsBuilder::new(entries).build()
    }

    /// Starts a builder over `entries`.
    pub fn builder(entries: impl IntoIterator<Item = (K, O)>) -> CompletionsBuilder<K, O> {
        CompletionsBuilder::new(entries)
    }
}

impl<K, O, W> Completions<K, O, W>
where
    K: Debug,
    O: Operation,
    W: DescriptorWait,
{
    pub(crate) fn from_parts(
        entries: Vec<(K, O)>,
        config: Config,
        waiter: W,
        bus: Option<Bus>,
    ) -> Self {
        Self {
            entries,
            wait_set: WaitSet::default(),
            cursor: Cursor::default(),
            config,
            waiter,
            bus,
            started: false,
            exhausted: false,
            resolved: 0,
        }
    }

    /// (Re)starts the iteration over all entries and performs the first step.
    ///
    /// Calling it again after exhaustion replays the whole set with the same
    /// ordering guarantees.
    pub fn reset(&mut self) {
        let step_start = Instant::now();
        self.started = true;
        self.exhausted = false;
        self.resolved = 0;
        self.cursor = Cursor::default();
        self.wait_set.fill(self.entries.len());

        let count = self.entries.len();
        publish_with(self.bus.as_ref(), || {
            Event::new(EventKind::IterationStarted).with_count(count)
        });

        self.admit();
        self.step_from(step_start);
    }

    /// Resolves exactly one more entry, or ends with a timeout yield.
    ///
    /// No-op (apart from unsetting the cursor) once the wait set is empty.
    pub fn advance(&mut self) {
        self.step_from(Instant::now());
    }

    /// One step; the interval budget runs from `step_start`, so admission
    /// polls (which may spawn work) are charged to it.
    fn step_from(&mut self, step_start: Instant) {
        self.cursor.begin_step();

        if self.wait_set.is_empty() {
            if self.started && !self.exhausted {
                self.exhausted = true;
                let resolved = self.resolved;
                publish_with(self.bus.as_ref(), || {
                    Event::new(EventKind::IterationExhausted).with_count(resolved)
                });
            }
            return;
        }

        // Picks up limit changes made since the previous step.
        self.admit();

        let interval = self.config.interval();
        let outcome = Multiplexer {
            waiter: &mut self.waiter,
            interval,
            busy_poll: self.config.busy_poll_clamped(),
            bus: self.bus.as_ref(),
            started: step_start,
        }
        .step(&mut self.entries, self.wait_set.window());

        match outcome {
            StepOutcome::Resolved(id) => {
                self.wait_set.resolve(id);
                self.cursor.resolve(id);
                self.resolved += 1;

                let (key, op) = &self.entries[id];
                publish_with(self.bus.as_ref(), || {
                    let ev = Event::new(EventKind::EntryResolved)
                        .with_key(format!("{key:?}"))
                        .with_elapsed(step_start.elapsed());
                    match op.captured_failure() {
                        Some(err) => ev.with_reason(err.to_string()),
                        None => ev,
                    }
                });

                self.admit();
            }
            StepOutcome::TimedOut => {
                self.cursor.time_out();
                let pending = self.wait_set.len();
                publish_with(self.bus.as_ref(), || {
                    Event::new(EventKind::IntervalElapsed)
                        .with_elapsed(interval.unwrap_or_default())
                        .with_count(pending)
                });
            }
        }
    }

    /// Recomputes the window and polls every newly admitted entry once.
    fn admit(&mut self) {
        let admitted = self.wait_set.refill(self.config.concurrency_limit());
        let window = self.wait_set.window().len();
        let bus = self.bus.as_ref();

        for id in admitted {
            let (key, op) = &mut self.entries[id];
            publish_with(bus, || {
                Event::new(EventKind::EntryAdmitted)
                    .with_key(format!("{key:?}"))
                    .with_count(window)
            });
            if op.captured_failure().is_none() {
                let _ = poll_capturing(key, op, bus);
            }
        }
    }

    /// True while an entry is held by the cursor or the last step timed out.
    pub fn is_valid(&self) -> bool {
        self.cursor.is_valid()
    }

    /// True if the last step ended because the update interval elapsed.
    pub fn timed_out(&self) -> bool {
        self.cursor.timed_out()
    }

    /// Key resolved by the last step (`None` on timeout yields and after exhaustion).
    pub fn current_key(&self) -> Option<&K> {
        self.cursor.current().map(|id| &self.entries[id].0)
    }

    /// Operation resolved by the last step.
    pub fn current_value(&self) -> Option<&O> {
        self.cursor.current().map(|id| &self.entries[id].1)
    }

    /// Mutable access to the operation resolved by the last step.
    pub fn current_value_mut(&mut self) -> Option<&mut O> {
        self.cursor.current().map(|id| &mut self.entries[id].1)
    }

    /// Key and operation resolved by the last step.
    pub fn current(&mut self) -> Option<(&K, &mut O)> {
        let id = self.cursor.current()?;
        let (key, op) = &mut self.entries[id];
        Some((&*key, op))
    }

    /// Sets the per-step update interval (`None` = block until an entry resolves).
    ///
    /// `Some(Duration::ZERO)` makes every step a single non-blocking scan.
    pub fn set_update_interval(&mut self, interval: Option<Duration>) -> &mut Self {
        self.config.update_interval = interval;
        self
    }

    /// Sets the per-step update interval in seconds.
    ///
    /// `0.0` is a zero budget (one scan per step); use
    /// [`set_update_interval(None)`](Self::set_update_interval) to block instead.
    ///
    /// # Errors
    /// [`MultiplexError::InvalidInterval`] for negative, non-finite or
    /// out-of-range values.
    pub fn set_update_interval_secs(&mut self, secs: f64) -> Result<&mut Self, MultiplexError> {
        let interval = Duration::try_from_secs_f64(secs).map_err(|_| {
            MultiplexError::InvalidInterval {
                value: secs.to_string(),
            }
        })?;
        self.config.update_interval = Some(interval);
        Ok(self)
    }

    /// Current per-step update interval.
    pub fn update_interval(&self) -> Option<Duration> {
        self.config.interval()
    }

    /// Bounds the admission window (`0` = unlimited).
    ///
    /// Set it before [`reset`](Self::reset) to apply from the first step;
    /// later changes apply from the next step.
    pub fn limit(&mut self, max_in_flight: usize) -> &mut Self {
        self.config.max_in_flight = max_in_flight;
        self
    }

    /// Advances until the wait set is exhausted, skipping timeout yields.
    ///
    /// Starts the iteration first if [`reset`](Self::reset) was never called.
    /// Returns the number of entries resolved by this call.
    pub fn drain_all(&mut self) -> usize {
        if self.started {
            self.advance();
        } else {
            self.reset();
        }

        let mut drained = 0;
        while self.is_valid() {
            if self.cursor.current().is_some() {
                drained += 1;
            }
            self.advance();
        }
        drained
    }

    /// Steps to the next resolved entry, skipping timeout yields.
    ///
    /// Starts the iteration if [`reset`](Self::reset) was never called;
    /// returns `None` once exhausted.
    pub fn next_resolved(&mut self) -> Option<(&K, &mut O)> {
        if self.started {
            self.advance();
        } else {
            self.reset();
        }
        while self.cursor.timed_out() {
            self.advance();
        }
        self.current()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if constructed without entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries not resolved yet in the current iteration.
    pub fn pending(&self) -> usize {
        self.wait_set.len()
    }

    /// Keys currently in the admission window, in window order.
    pub fn admitted_keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.wait_set.window().iter().map(|&id| &self.entries[id].0)
    }

    /// Looks up an operation by key.
    pub fn get(&self, key: &K) -> Option<&O>
    where
        K: PartialEq,
    {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, op)| op)
    }

    /// Looks up an operation by key, mutably (e.g. to cancel it).
    pub fn get_mut(&mut self, key: &K) -> Option<&mut O>
    where
        K: PartialEq,
    {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, op)| op)
    }

    /// Effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Event bus, if one was configured.
    pub fn bus(&self) -> Option<&Bus> {
        self.bus.as_ref()
    }

    /// Consumes the multiplexer and returns the entries in construction order.
    pub fn into_entries(self) -> Vec<(K, O)> {
        self.entries
    }
}

impl<K: Debug, O, W> std::fmt::Debug for Completions<K, O, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completions")
            .field("entries", &self.entries.len())
            .field("pending", &self.wait_set.len())
            .field("cursor", &self.cursor)
            .field("config", &self.config)
            .finish()
    }
}
