//! # Operations driven by the multiplexer.
//!
//! - [`Operation`] is the capability every entry must provide.
//! - [`FailureSlot`] stores a captured poll failure (first one wins).
//! - [`PollFn`] adapts a closure; it exposes no descriptors (busy-poll).
//! - [`TaskOperation`] lazily spawns a [`Task`](crate::Task) on a tokio runtime.
//! - [`ChildOperation`] lazily spawns a subprocess and drains its stdout.

mod child;
mod operation;
mod poll_fn;
mod task_op;

pub use child::{ChildOperation, ChildOutput};
pub use operation::{BoxOperation, FailureSlot, Operation};
pub use poll_fn::PollFn;
pub use task_op::TaskOperation;
