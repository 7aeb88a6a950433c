//! Multiplexer core: admission, readiness and iteration.
//!
//! The only public API from this module is [`Completions`] (built through
//! [`CompletionsBuilder`]), its [`Config`], and the [`DescriptorWait`] port with
//! its default [`PollWaiter`] implementation.
//!
//! Internal modules:
//! - [`wait_set`]: unresolved entries and the admission window;
//! - [`multiplexer`]: one step (scan, descriptor wait or busy-poll, interval);
//! - [`cursor`]: what the last step produced;
//! - [`waiter`]: blocking primitive over OS descriptors;
//! - [`completions`]: the iteration protocol tying the above together.

mod builder;
mod completions;
mod config;
mod cursor;
mod multiplexer;
mod wait_set;
mod waiter;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::CompletionsBuilder;
pub use completions::Completions;
pub use config::Config;
pub use waiter::{DescriptorWait, PollWaiter};
