//! # Task abstractions.
//!
//! This module provides the async work types run by
//! [`TaskOperation`](crate::TaskOperation):
//! - [`Task`] - trait for implementing async cancelable tasks
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//!
//! Closures are wrapped directly with
//! [`TaskOperation::from_fn`](crate::TaskOperation::from_fn).

mod task;

pub use task::{BoxTaskFuture, Task, TaskRef};
