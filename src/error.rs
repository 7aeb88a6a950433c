//! Error types used by the waitvisor multiplexer and its operations.
//!
//! This module defines three error enums:
//!
//! - [`MultiplexError`]: construction/configuration errors raised by the multiplexer itself.
//! - [`OperationError`]: failures of individual operations, captured per entry at poll time.
//! - [`TaskError`]: errors returned by task-backed operations ([`TaskOperation`](crate::TaskOperation)).
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//!
//! An interval timeout is **not** an error: it is reported through
//! [`Completions::timed_out`](crate::Completions::timed_out).

use std::io;

use thiserror::Error;

/// # Errors produced by the multiplexer.
///
/// These are surfaced immediately at construction or configuration time and
/// never captured on entries.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultiplexError {
    /// The same key was supplied more than once.
    #[error("duplicate key {key}")]
    DuplicateKey {
        /// Debug rendering of the offending key.
        key: String,
    },

    /// An update interval was not a finite, non-negative number of seconds.
    #[error("invalid update interval: {value}")]
    InvalidInterval {
        /// Textual rendering of the rejected value.
        value: String,
    },
}

impl MultiplexError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use waitvisor::MultiplexError;
    ///
    /// let err = MultiplexError::DuplicateKey { key: "\"a\"".into() };
    /// assert_eq!(err.as_label(), "multiplex_duplicate_key");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            MultiplexError::DuplicateKey { .. } => "multiplex_duplicate_key",
            MultiplexError::InvalidInterval { .. } => "multiplex_invalid_interval",
        }
    }
}

/// # Errors produced by individual operations.
///
/// When an operation's readiness poll fails, the multiplexer stores the error
/// on the operation (see [`Operation::capture_failure`](crate::Operation::capture_failure))
/// and resolves the entry. Fetching the operation's result afterwards is
/// expected to return the same error.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// Operation failed but may succeed if retried by the caller.
    #[error("operation failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable fatal error.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// An OS-level error while driving the operation.
    #[error("i/o error ({kind:?}): {error}")]
    Io {
        /// Kind of the underlying [`io::Error`].
        kind: io::ErrorKind,
        /// The underlying error message.
        error: String,
    },

    /// The work backing the operation panicked.
    #[error("operation panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },

    /// The operation was cancelled by its owner.
    #[error("operation cancelled")]
    Canceled,

    /// A task-backed operation returned an error.
    #[error(transparent)]
    Task(#[from] TaskError),
}

impl OperationError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use waitvisor::OperationError;
    ///
    /// let err = OperationError::Fail { error: "boom".into() };
    /// assert_eq!(err.as_label(), "operation_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            OperationError::Fail { .. } => "operation_failed",
            OperationError::Fatal { .. } => "operation_fatal",
            OperationError::Io { .. } => "operation_io",
            OperationError::Panicked { .. } => "operation_panicked",
            OperationError::Canceled => "operation_canceled",
            OperationError::Task(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            OperationError::Fail { error } => format!("error: {error}"),
            OperationError::Fatal { error } => format!("fatal: {error}"),
            OperationError::Io { kind, error } => format!("io {kind:?}: {error}"),
            OperationError::Panicked { info } => format!("panicked: {info}"),
            OperationError::Canceled => "cancelled".to_string(),
            OperationError::Task(e) => e.as_message(),
        }
    }
}

impl From<io::Error> for OperationError {
    fn from(e: io::Error) -> Self {
        OperationError::Io {
            kind: e.kind(),
            error: e.to_string(),
        }
    }
}

/// # Outcome errors of task-backed operations.
///
/// Returned by the futures of [`Task`](crate::Task) implementations and kept as
/// the result of a [`TaskOperation`](crate::TaskOperation). A task that panics
/// or is aborted is reported through [`OperationError`] instead, since the
/// multiplexer captures it at poll time.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task gave up with an error.
    #[error("task failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The task hit a condition it cannot recover from.
    #[error("task fatal: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// The task stopped because its token was cancelled.
    #[error("task cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use waitvisor::TaskError;
    ///
    /// assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Canceled => "cancelled".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_keep_their_kind() {
        let err: OperationError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert_eq!(err.as_label(), "operation_io");
        assert!(matches!(
            err,
            OperationError::Io {
                kind: io::ErrorKind::BrokenPipe,
                ..
            }
        ));
        assert_eq!(err.as_message(), "io BrokenPipe: pipe");
    }

    #[test]
    fn task_errors_delegate_labels() {
        let err = OperationError::from(TaskError::Fatal { error: "x".into() });
        assert_eq!(err.as_label(), "task_fatal");
        assert_eq!(err.as_message(), "fatal: x");
        assert_eq!(err.to_string(), "task fatal: x");
    }
}
