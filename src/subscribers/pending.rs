//! # In-flight entry tracker with sequence-based ordering.
//!
//! Maintains which entries are admitted but not yet resolved, from the event
//! stream, using event sequence numbers to handle out-of-order delivery.
//! Useful to report what is still running when an update interval elapses.
//!
//! ## Architecture
//! ```text
//! Completions ──► Bus ──► spawn_listener() ──► SubscriberSet ──► PendingTracker::update()
//!                                                                     │
//!                                                                     ▼
//!                                                       HashMap<String, KeyState>
//!                                                        (key → {seq, pending})
//! ```
//!
//! ## Rules
//! - `EntryAdmitted` marks a key pending, `EntryResolved` clears it
//! - `IterationStarted` forgets everything seen before it
//! - Events with `seq <= last_seq` for their key are **rejected** (stale)

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

#[derive(Debug, Clone)]
struct KeyState {
    last_seq: u64,
    pending: bool,
}

#[derive(Debug, Default)]
struct State {
    started_seq: u64,
    keys: HashMap<String, KeyState>,
}

/// Thread-safe tracker of admitted, unresolved entries.
#[derive(Debug, Default)]
pub struct PendingTracker {
    state: RwLock<State>,
}

impl PendingTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an event; returns `true` if it changed the pending state.
    ///
    /// ```text
    /// update(EntryResolved, seq=100)  → pending=false, last_seq=100
    /// update(EntryAdmitted, seq=99)   → rejected (stale)
    /// ```
    pub async fn update(&self, ev: &Event) -> bool {
        let mut state = self.state.write().await;

        if ev.kind == EventKind::IterationStarted {
            if ev.seq <= state.started_seq {
                return false;
            }
            state.started_seq = ev.seq;
            state.keys.clear();
            return true;
        }

        let pending = match ev.kind {
            EventKind::EntryAdmitted => true,
            EventKind::EntryResolved => false,
            _ => return false,
        };
        let Some(key) = ev.key.as_deref() else {
            return false;
        };
        if ev.seq <= state.started_seq {
            return false;
        }

        let entry = state.keys.entry(key.to_string()).or_insert(KeyState {
            last_seq: 0,
            pending: false,
        });
        if ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;
        entry.pending = pending;
        true
    }

    /// Returns sorted list of currently pending keys.
    pub async fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut pending: Vec<String> = state
            .keys
            .iter()
            .filter(|(_, ks)| ks.pending)
            .map(|(key, _)| key.clone())
            .collect();
        pending.sort_unstable();
        pending
    }

    /// Returns true if the key is admitted and unresolved.
    pub async fn is_pending(&self, key: &str) -> bool {
        self.state
            .read()
            .await
            .keys
            .get(key)
            .map(|ks| ks.pending)
            .unwrap_or(false)
    }
}

#[async_trait]
impl Subscribe for PendingTracker {
    async fn on_event(&self, ev: &Event) {
        self.update(ev).await;
    }

    fn name(&self) -> &'static str {
        "PendingTracker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracks_admission_and_resolution() {
        let tracker = PendingTracker::new();
        tracker.update(&Event::new(EventKind::IterationStarted)).await;
        tracker.update(&Event::new(EventKind::EntryAdmitted).with_key("b")).await;
        tracker.update(&Event::new(EventKind::EntryAdmitted).with_key("a")).await;
        assert_eq!(tracker.snapshot().await, vec!["a", "b"]);

        tracker.update(&Event::new(EventKind::EntryResolved).with_key("a")).await;
        assert!(!tracker.is_pending("a").await);
        assert!(tracker.is_pending("b").await);
    }

    #[tokio::test]
    async fn rejects_stale_events() {
        let tracker = PendingTracker::new();
        let admitted = Event::new(EventKind::EntryAdmitted).with_key("a");
        let resolved = Event::new(EventKind::EntryResolved).with_key("a");

        assert!(tracker.update(&resolved).await);
        assert!(!tracker.update(&admitted).await);
        assert!(!tracker.is_pending("a").await);
    }

    #[tokio::test]
    async fn restart_forgets_previous_iteration() {
        let tracker = PendingTracker::new();
        let old = Event::new(EventKind::EntryAdmitted).with_key("a");
        tracker.update(&Event::new(EventKind::IterationStarted)).await;
        tracker.update(&Event::new(EventKind::IterationStarted)).await;

        assert!(!tracker.update(&old).await);
        assert!(tracker.snapshot().await.is_empty());
    }
}
