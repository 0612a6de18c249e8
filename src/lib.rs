//! # refreshvisor
//!
//! **refreshvisor** keeps a value (typically a credential or session token)
//! fresh in the background while any number of tasks and threads read it.
//!
//! A [`Manager`] calls a caller-supplied generator once immediately and then
//! on every tick of a fixed interval. Readers that arrive before the first
//! success wait on a one-shot gate; afterwards reads are a lock-free pointer
//! load. Failed refreshes are logged and skipped: readers keep the last good
//! value until a later tick succeeds.
//!
//! ## Architecture
//! ```text
//!                      ┌──────────────────────────────┐
//!   Generate<T> ◄───── │ RefreshActor (tokio task)    │ ◄── RefreshHandle
//!   (GenerateFn,       │  tick ─► run_attempt ─► ...  │     (cancel / stop)
//!    BlockingFn)       └──────┬───────────────┬───────┘
//!                             │ store(v)      │ publish(Event)
//!                             ▼               ▼
//!   ┌────────────────────────────────┐    ┌──────────┐    ┌───────────────┐
//!   │ ValueStore<T>  (arc-swap)      │    │   Bus    │──► │ SubscriberSet │──► LogWriter, ...
//!   │ FirstValueGate (opened once)   │    └──────────┘    └───────────────┘
//!   └───────────────┬────────────────┘
//!                   ▼
//!       Manager::value() / blocking_value() / try_value()
//! ```
//!
//! ### Attempt lifecycle
//! ```text
//! start ──► attempt #1 immediately
//!       ──► attempt #n on every tick (delayed, never overlapping)
//!
//! attempt:
//!   ├─ Ok(v)   ──► store(v) ──► gate.open() (first success only) ──► readers released
//!   └─ Err(e)  ──► value untouched, RefreshFailed published, wait for next tick
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types                               |
//! |-------------------|-----------------------------------------------------------|-----------------------------------------|
//! | **Manager**       | Holds the value, spawns the loop, serves reads.           | [`Manager`], [`ManagerBuilder`]         |
//! | **Generators**    | Async or blocking value producers.                        | [`Generate`], [`GenerateFn`], [`BlockingFn`] |
//! | **Primitives**    | Lock-free slot and one-shot gate.                         | [`ValueStore`], [`FirstValueGate`]      |
//! | **Lifecycle**     | Cancellation and graceful stop of the loop.               | [`RefreshHandle`]                       |
//! | **Events**        | Typed event stream and subscriber fan-out.                | [`Event`], [`Subscribe`], [`LogWriter`] |
//! | **Errors**        | Typed errors for generation, construction, runtime.       | [`RefreshError`], [`ConfigError`], [`RuntimeError`] |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use refreshvisor::{GenerateFn, GeneratorRef, Manager, RefreshError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let generator: GeneratorRef<String> = GenerateFn::arc(|| async {
//!         // call the identity provider here
//!         Ok::<_, RefreshError>("session-token".to_string())
//!     });
//!
//!     let tokens = Manager::builder("identity")
//!         .interval(Duration::from_secs(300))
//!         .timeout(Duration::from_secs(10))
//!         .generator(generator)
//!         .build()?;
//!
//!     let handle = tokens.start()?;
//!     let token = tokens.value().await; // waits for the first token only
//!     assert_eq!(token.as_str(), "session-token");
//!
//!     handle.stop().await;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod generators;
mod store;
mod subscribers;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::{Manager, ManagerBuilder, RefreshHandle, RefreshStats};
pub use error::{ConfigError, RefreshError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use generators::{BlockingFn, Generate, GenerateFn, GeneratorRef};
pub use store::{FirstValueGate, ValueStore};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
