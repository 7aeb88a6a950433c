//! # Wait set and admission window.
//!
//! The wait set holds the sequence ids of every unresolved entry (ids are entry
//! positions in construction order). The admission window is its bounded
//! prefix: the entries actively polled and driven.
//!
//! ## Invariants
//! - An id enters the wait set once per [`WaitSet::fill`] and leaves it exactly
//!   once, when its entry is selected for resolution.
//! - The window holds the first `limit` ids of the wait set (all of them when
//!   unlimited), in wait-set order.
//! - [`WaitSet::refill`] reports the ids newly present in the window; the caller
//!   polls each of them before the next blocking wait.

use std::collections::BTreeSet;

/// Ordered set of unresolved entry ids with its admission window.
#[derive(Debug, Default)]
pub(crate) struct WaitSet {
    pending: BTreeSet<usize>,
    window: Vec<usize>,
}

impl WaitSet {
    /// Resets to ids `0..len` with an empty window.
    pub(crate) fn fill(&mut self, len: usize) {
        self.pending = (0..len).collect();
        self.window.clear();
    }

    /// Recomputes the window for `limit` (`None` = unlimited).
    ///
    /// Returns the ids that were not in the previous window.
    pub(crate) fn refill(&mut self, limit: Option<usize>) -> Vec<usize> {
        let cap = limit.unwrap_or(usize::MAX);
        let next: Vec<usize> = self.pending.iter().take(cap).copied().collect();
        let admitted = next
            .iter()
            .filter(|&&id| self.window.binary_search(&id).is_err())
            .copied()
            .collect();
        self.window = next;
        admitted
    }

    /// Removes a resolved id from the wait set.
    ///
    /// The window is left untouched until the next [`WaitSet::refill`].
    pub(crate) fn resolve(&mut self, id: usize) -> bool {
        self.pending.remove(&id)
    }

    /// Current admission window, in wait-set order.
    pub(crate) fn window(&self) -> &[usize] {
        &self.window
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_window_is_the_whole_set() {
        let mut ws = WaitSet::default();
        ws.fill(3);
        assert_eq!(ws.refill(None), vec![0, 1, 2]);
        assert_eq!(ws.window(), &[0, 1, 2]);

        assert!(ws.resolve(1));
        assert!(ws.refill(None).is_empty());
        assert_eq!(ws.window(), &[0, 2]);
    }

    #[test]
    fn limited_window_slides_in_order() {
        let mut ws = WaitSet::default();
        ws.fill(5);
        assert_eq!(ws.refill(Some(2)), vec![0, 1]);

        ws.resolve(1);
        assert_eq!(ws.refill(Some(2)), vec![2]);
        assert_eq!(ws.window(), &[0, 2]);

        ws.resolve(0);
        ws.resolve(2);
        assert_eq!(ws.refill(Some(2)), vec![3, 4]);
        assert_eq!(ws.len(), 2);
    }

    #[test]
    fn resolve_happens_once() {
        let mut ws = WaitSet::default();
        ws.fill(1);
        ws.refill(None);
        assert!(ws.resolve(0));
        assert!(!ws.resolve(0));
        assert!(ws.is_empty());
    }

    #[test]
    fn growing_the_limit_admits_more() {
        let mut ws = WaitSet::default();
        ws.fill(4);
        ws.refill(Some(1));
        assert_eq!(ws.refill(Some(3)), vec![1, 2]);
        assert_eq!(ws.refill(None), vec![3]);
    }

    #[test]
    fn fill_restarts_admission() {
        let mut ws = WaitSet::default();
        ws.fill(2);
        ws.refill(None);
        ws.resolve(0);
        ws.resolve(1);

        ws.fill(2);
        assert!(ws.window().is_empty());
        assert_eq!(ws.refill(None), vec![0, 1]);
    }
}
