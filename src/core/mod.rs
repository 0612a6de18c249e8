//! Runtime core: the manager and its refresh loop.
//!
//! The public API from this module is [`Manager`], [`ManagerBuilder`],
//! [`RefreshHandle`] and [`RefreshStats`].
//!
//! Internal modules:
//! - [`runner`]: executes one attempt with timeout/panic handling and event publishing;
//! - [`actor`]: the periodic loop (immediate first attempt, then one per tick);
//! - [`manager`]: shared state, read path, start path;
//! - [`handle`]: cancellation and join of a started loop;
//! - [`builder`]: fluent construction;
//! - [`stats`]: attempt counters.

mod actor;
mod builder;
mod handle;
mod manager;
mod runner;
mod stats;

pub use builder::ManagerBuilder;
pub use handle::RefreshHandle;
pub use manager::Manager;
pub use stats::RefreshStats;
