//! Multiplexer events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted while a [`Completions`](crate::Completions)
//! resolves its entries.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Completions` (reset, admission, scan, wait), `SubscriberSet`
//!   workers (overflow/panic).
//! - **Consumers**: [`spawn_listener`](crate::spawn_listener) fanning out to a
//!   [`SubscriberSet`](crate::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
