//! Manager events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `RefreshActor`, `runner::run_attempt`, `SubscriberSet`
//!   workers (overflow/panic).
//! - **Consumers**: the listener spawned by `Manager::start()` (fans out to
//!   `SubscriberSet`), and any receiver from `Manager::subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
