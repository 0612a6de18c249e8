//! # Generator abstractions.
//!
//! This module provides the value-producing side of a manager:
//! - [`Generate`] - trait for implementing async generators
//! - [`GenerateFn`] - async-closure generator
//! - [`BlockingFn`] - synchronous-closure generator (runs on the blocking pool)
//! - [`GeneratorRef`] - shared reference to a generator (`Arc<dyn Generate<T>>`)

mod generate;
mod generate_fn;

pub use generate::{Generate, GeneratorRef};
pub use generate_fn::{BlockingFn, GenerateFn};
