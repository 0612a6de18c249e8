//! # Manager configuration.
//!
//! Provides [`Config`] centralized settings for one [`Manager`](crate::Manager).
//!
//! ## Sentinel values
//! - `timeout = 0s` → no timeout on the generator call
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::error::ConfigError;

/// Settings for a refresh manager.
///
/// ## Field semantics
/// - `interval`: Period between generation attempts (must be `> 0`)
/// - `timeout`: Per-call limit on the generator (`0s` = unbounded)
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `log_events`: Attach the built-in [`LogWriter`](crate::LogWriter) on start
///
/// ## Notes
/// All fields are public. Prefer the helper accessors to avoid sprinkling
/// sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Fixed period of the refresh timer.
    ///
    /// The first attempt runs immediately on start; later attempts run once per
    /// period. An attempt that overruns the period delays the next tick.
    pub interval: Duration,

    /// Limit applied to each generator call.
    ///
    /// - `Duration::ZERO` = no timeout (a hung generator stalls later refreshes)
    /// - `> 0` = the attempt fails with `RefreshError::Timeout`
    pub timeout: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` messages skip
    /// older items.
    pub bus_capacity: usize,

    /// Whether `start()` attaches a [`LogWriter`](crate::LogWriter).
    pub log_events: bool,
}

impl Config {
    /// Creates a config with the given interval and defaults for everything else.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Returns the generator call timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → timeout applied per attempt
    #[inline]
    pub fn call_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Checks construction-time invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `interval = 60s`
    /// - `timeout = 0s` (no timeout)
    /// - `bus_capacity = 256`
    /// - `log_events = true`
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            timeout: Duration::ZERO,
            bus_capacity: 256,
            log_events: true,
        }
    }
}
