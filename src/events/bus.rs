//! # Event bus for broadcasting multiplexer events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. Publishing is a
//! plain synchronous call, so the multiplexer publishes from its own thread
//! without needing a runtime; receivers live on a tokio runtime.
//!
//! ## Architecture
//! ```text
//! Publishers:                         Consumer:
//!   Completions ────┐
//!   (scan / wait)   ├──► Bus ───► spawn_listener() ───► SubscriberSet
//!   SubscriberSet ──┘  (broadcast)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active receivers at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for multiplexer events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    ///
    /// The minimum capacity is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Returns `true` if at least one receiver is attached.
    ///
    /// Publishers use it to skip building events nobody will see.
    pub fn has_receivers(&self) -> bool {
        self.tx.receiver_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn publish_without_receivers_is_dropped() {
        let bus = Bus::new(0);
        assert!(!bus.has_receivers());
        bus.publish(Event::new(EventKind::IterationStarted));
    }

    #[test]
    fn receivers_observe_later_events() {
        let bus = Bus::new(4);
        let mut rx = bus.subscribe();
        assert!(bus.has_receivers());

        bus.publish(Event::new(EventKind::EntryAdmitted).with_key("a"));
        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::EntryAdmitted);
        assert_eq!(ev.key.as_deref(), Some("a"));
    }
}
