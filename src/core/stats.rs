//! # Attempt counters.
//!
//! [`Counters`] is updated by the runner under the attempt lock; readers take a
//! [`RefreshStats`] snapshot at any time. Counters are independent atomics, so
//! a snapshot taken during an attempt may mix before/after values.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of a manager's refresh history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// Attempts started (scheduled and manual).
    pub attempts: u64,
    /// Attempts that stored a new value.
    pub successes: u64,
    /// Attempts that failed (including timeouts and panics).
    pub failures: u64,
    /// Failures since the last success.
    pub consecutive_failures: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    attempts: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    consecutive_failures: AtomicU64,
}

impl Counters {
    /// Registers a new attempt and returns its 1-based number.
    pub(crate) fn begin_attempt(&self) -> u64 {
        self.attempts.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    /// Returns the consecutive failure count including this one.
    pub(crate) fn record_failure(&self) -> u64 {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub(crate) fn snapshot(&self) -> RefreshStats {
        RefreshStats {
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_resets_consecutive_failures() {
        let c = Counters::default();
        assert_eq!(c.begin_attempt(), 1);
        assert_eq!(c.record_failure(), 1);
        assert_eq!(c.begin_attempt(), 2);
        assert_eq!(c.record_failure(), 2);
        assert_eq!(c.begin_attempt(), 3);
        c.record_success();

        assert_eq!(
            c.snapshot(),
            RefreshStats {
                attempts: 3,
                successes: 1,
                failures: 2,
                consecutive_failures: 0,
            }
        );
    }
}
