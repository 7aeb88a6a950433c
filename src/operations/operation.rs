//! # Operation capability consumed by the multiplexer.
//!
//! An [`Operation`] is one unit of asynchronous work that progresses on its own
//! (a subprocess, a spawned task, a remote call) and can be **polled** for
//! completion without blocking.
//!
//! ## Contract
//! - [`is_ready`](Operation::is_ready) is non-blocking. It is also the hook that
//!   starts deferred work: the multiplexer calls it for the first time only when
//!   the entry enters the admission window.
//! - [`readable_descriptors`](Operation::readable_descriptors) /
//!   [`writable_descriptors`](Operation::writable_descriptors) expose waitable OS
//!   handles that become ready when the operation may have progressed. An
//!   operation exposing none forces the busy-poll mode for its whole window.
//! - A failing readiness poll is **captured** on the operation through
//!   [`capture_failure`](Operation::capture_failure); the entry is still
//!   resolved and the caller decides when to surface the error.

use std::os::fd::RawFd;

use crate::error::OperationError;

/// # Pollable asynchronous unit.
///
/// # Example
/// ```
/// use std::os::fd::RawFd;
/// use waitvisor::{FailureSlot, Operation, OperationError};
///
/// struct Countdown {
///     left: u32,
///     failure: FailureSlot,
/// }
///
/// impl Operation for Countdown {
///     fn is_ready(&mut self) -> Result<bool, OperationError> {
///         self.left = self.left.saturating_sub(1);
///         Ok(self.left == 0)
///     }
///     fn captured_failure(&self) -> Option<&OperationError> {
///         self.failure.get()
///     }
///     fn capture_failure(&mut self, err: OperationError) {
///         self.failure.set(err);
///     }
/// }
///
/// let mut op = Countdown { left: 2, failure: FailureSlot::new() };
/// assert!(!op.is_ready().unwrap());
/// assert!(op.is_ready().unwrap());
/// assert!(op.readable_descriptors().is_empty());
/// ```
pub trait Operation {
    /// Checks (without blocking) whether the operation has completed.
    fn is_ready(&mut self) -> Result<bool, OperationError>;

    /// Returns a failure previously stored by [`Operation::capture_failure`].
    ///
    /// Must be side-effect free.
    fn captured_failure(&self) -> Option<&OperationError>;

    /// Stores a failure discovered while polling this operation.
    fn capture_failure(&mut self, err: OperationError);

    /// Descriptors that become readable when the operation may have progressed.
    fn readable_descriptors(&self) -> Vec<RawFd> {
        Vec::new()
    }

    /// Descriptors that become writable when the operation may have progressed.
    fn writable_descriptors(&self) -> Vec<RawFd> {
        Vec::new()
    }
}

impl<O: Operation + ?Sized> Operation for Box<O> {
    fn is_ready(&mut self) -> Result<bool, OperationError> {
        (**self).is_ready()
    }

    fn captured_failure(&self) -> Option<&OperationError> {
        (**self).captured_failure()
    }

    fn capture_failure(&mut self, err: OperationError) {
        (**self).capture_failure(err)
    }

    fn readable_descriptors(&self) -> Vec<RawFd> {
        (**self).readable_descriptors()
    }

    fn writable_descriptors(&self) -> Vec<RawFd> {
        (**self).writable_descriptors()
    }
}

/// Owned, type-erased operation.
///
/// Lets one multiplexer drive heterogeneous operations (tasks next to child processes).
pub type BoxOperation = Box<dyn Operation + Send>;

/// Storage for a captured poll-time failure.
///
/// Embed it in an [`Operation`] implementation to satisfy
/// [`captured_failure`](Operation::captured_failure) and
/// [`capture_failure`](Operation::capture_failure).
///
/// The first captured failure wins; later ones are ignored so the caller
/// always observes the error that resolved the entry.
#[derive(Debug, Default, Clone)]
pub struct FailureSlot {
    failure: Option<OperationError>,
}

impl FailureSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self { failure: None }
    }

    /// Returns the captured failure, if any.
    pub fn get(&self) -> Option<&OperationError> {
        self.failure.as_ref()
    }

    /// Stores `err` unless a failure was already captured.
    pub fn set(&mut self, err: OperationError) {
        if self.failure.is_none() {
            self.failure = Some(err);
        }
    }

    /// Returns `Err` with the captured failure, or `Ok(())` when empty.
    pub fn check(&self) -> Result<(), OperationError> {
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// Clears the slot.
    pub fn clear(&mut self) {
        self.failure = None;
    }
}
