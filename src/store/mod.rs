//! Shared state read by callers and written by the refresh loop.
//!
//! ## Contents
//! - [`ValueStore`] lock-free slot for the current value
//! - [`FirstValueGate`] one-shot latch released by the first success
//!
//! The loop always writes the store **before** opening the gate, so a reader
//! released by the gate finds a value in the store.

mod gate;
mod value;

pub use gate::FirstValueGate;
pub use value::ValueStore;
