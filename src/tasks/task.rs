//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (async, cancelable). A task is the
//! async *work* behind a [`TaskOperation`](crate::TaskOperation): the operation
//! spawns it on a tokio runtime when the multiplexer admits the entry.
//!
//! A task receives a [`CancellationToken`] and should check it to stop
//! cooperatively when its operation is cancelled.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Boxed future produced by [`Task::spawn`].
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable unit.
///
/// A `Task` has a stable [`name`](Task::name) and creates a fresh future per
/// [`spawn`](Task::spawn).
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use waitvisor::{BoxTaskFuture, Task, TaskError};
///
/// struct Demo;
///
/// impl Task for Demo {
///     fn name(&self) -> &str { "demo" }
///
///     fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Err(TaskError::Canceled);
///             }
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Creates the future executing the task until completion or cancellation.
    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture;
}
