//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and built-in implementations
//! for handling events broadcast through the [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Completions ── publish(Event) ──► Bus ──► spawn_listener ──► SubscriberSet
//!                                                                     │
//!                                                    ┌────────────────┼──────────┐
//!                                                    ▼                ▼          ▼
//!                                                LogWriter     PendingTracker  Custom
//! ```
//!
//! ## Subscriber types
//! - **Passive subscribers** - observe and react to events (logging, metrics, alerts)
//! - **Stateful subscribers** - maintain internal state based on events ([`PendingTracker`])

mod pending;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
mod log;

pub use pending::PendingTracker;
pub use subscribe::Subscribe;
pub use subscriber_set::{SubscriberSet, spawn_listener};

#[cfg(feature = "logging")]
pub use log::LogWriter;
