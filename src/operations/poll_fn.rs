//! # Closure-backed operation (`PollFn`)
//!
//! [`PollFn`] wraps a readiness check `F: FnMut() -> Result<bool, OperationError>`.
//! It exposes no descriptors, so a window containing a `PollFn` is driven by the
//! busy-poll mode.
//!
//! ## Example
//! ```rust
//! use waitvisor::{Completions, PollFn};
//!
//! let entries = ["a", "b"].map(|key| (key, PollFn::new(|| Ok(true))));
//! let mut it = Completions::new(entries).unwrap();
//! it.reset();
//! assert_eq!(it.current_key(), Some(&"a"));
//! it.advance();
//! assert_eq!(it.current_key(), Some(&"b"));
//! it.advance();
//! assert!(!it.is_valid());
//! ```

use crate::error::OperationError;

use super::operation::{FailureSlot, Operation};

/// Function-backed operation.
///
/// The closure is called once per readiness poll; the first poll happens when
/// the entry is admitted into the window.
pub struct PollFn<F> {
    check: F,
    polls: u64,
    failure: FailureSlot,
}

impl<F> PollFn<F>
where
    F: FnMut() -> Result<bool, OperationError>,
{
    /// Creates a new closure-backed operation.
    pub fn new(check: F) -> Self {
        Self {
            check,
            polls: 0,
            failure: FailureSlot::new(),
        }
    }

    /// Number of readiness polls performed so far.
    pub fn polls(&self) -> u64 {
        self.polls
    }

    /// Returns the captured failure as `Err`, or `Ok(())`.
    ///
    /// Models "fetching the result" of a check that has no value of its own.
    pub fn result(&self) -> Result<(), OperationError> {
        self.failure.check()
    }
}

impl<F> std::fmt::Debug for PollFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollFn")
            .field("polls", &self.polls)
            .field("failure", &self.failure)
            .finish()
    }
}

impl<F> Operation for PollFn<F>
where
    F: FnMut() -> Result<bool, OperationError>,
{
    fn is_ready(&mut self) -> Result<bool, OperationError> {
        self.polls += 1;
        (self.check)()
    }

    fn captured_failure(&self) -> Option<&OperationError> {
        self.failure.get()
    }

    fn capture_failure(&mut self, err: OperationError) {
        self.failure.set(err);
    }
}
