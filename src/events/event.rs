//! # Events emitted by a manager and its refresh loop.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Scheduler events**: loop started / stopped
//! - **Refresh events**: attempt flow (starting, succeeded, failed, timeout, gate opened)
//! - **Subscriber events**: delivery problems (overflow, panic)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! manager name, attempt numbers, reasons and durations.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use refreshvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RefreshFailed)
//!     .with_manager("vault")
//!     .with_reason("connection refused")
//!     .with_attempt(3)
//!     .with_failures(2);
//!
//! assert_eq!(ev.kind, EventKind::RefreshFailed);
//! assert_eq!(ev.manager.as_deref(), Some("vault"));
//! assert_eq!(ev.failures, Some(2));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of manager events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `manager`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `manager`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Scheduler events ===
    /// Refresh loop spawned.
    ///
    /// Sets:
    /// - `manager`: manager name
    /// - `interval_ms`: refresh period (ms)
    SchedulerStarted,

    /// Refresh loop exited after cancellation.
    ///
    /// Sets:
    /// - `manager`: manager name
    /// - `attempt`: number of attempts made
    SchedulerStopped,

    // === Refresh events ===
    /// A generation attempt is starting.
    ///
    /// Sets:
    /// - `manager`: manager name
    /// - `attempt`: attempt number (1-based, per manager)
    RefreshStarting,

    /// The generator returned a value and it was stored.
    ///
    /// Sets:
    /// - `manager`: manager name
    /// - `attempt`: attempt number
    /// - `elapsed_ms`: generator latency (ms)
    RefreshSucceeded,

    /// The generator failed; the stored value is unchanged.
    ///
    /// Sets:
    /// - `manager`: manager name
    /// - `attempt`: attempt number
    /// - `reason`: failure message
    /// - `failures`: consecutive failures including this one
    RefreshFailed,

    /// The generator exceeded the configured call timeout.
    ///
    /// Always followed by `RefreshFailed` for the same attempt.
    ///
    /// Sets:
    /// - `manager`: manager name
    /// - `attempt`: attempt number
    /// - `timeout_ms`: configured call timeout (ms)
    TimeoutHit,

    /// The first value was stored and waiting readers were released.
    ///
    /// Emitted once per manager.
    ///
    /// Sets:
    /// - `manager`: manager name
    /// - `attempt`: attempt number that produced the first value
    GateOpened,
}

/// Manager event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the manager (or subscriber, for subscriber events).
    pub manager: Option<Arc<str>>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Consecutive failures at the time of the event.
    pub failures: Option<u64>,
    /// Call timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Generator latency in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
    /// Refresh period in milliseconds (compact).
    pub interval_ms: Option<u32>,
}

#[inline]
fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            manager: None,
            attempt: None,
            reason: None,
            failures: None,
            timeout_ms: None,
            elapsed_ms: None,
            interval_ms: None,
        }
    }

    /// Attaches a manager name.
    #[inline]
    pub fn with_manager(mut self, name: impl Into<Arc<str>>) -> Self {
        self.manager = Some(name.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u64) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches the consecutive failure count.
    #[inline]
    pub fn with_failures(mut self, n: u64) -> Self {
        self.failures = Some(n);
        self
    }

    /// Attaches a call timeout (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a generator latency (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(compact_ms(d));
        self
    }

    /// Attaches the refresh period (stored as milliseconds).
    #[inline]
    pub fn with_interval(mut self, d: Duration) -> Self {
        self.interval_ms = Some(compact_ms(d));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_manager(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_manager(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::RefreshStarting);
        let b = Event::new(EventKind::RefreshSucceeded);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_durations_saturate_at_u32() {
        let ev = Event::new(EventKind::SchedulerStarted)
            .with_interval(Duration::from_secs(u64::MAX / 2))
            .with_elapsed(Duration::from_millis(1500));
        assert_eq!(ev.interval_ms, Some(u32::MAX));
        assert_eq!(ev.elapsed_ms, Some(1500));
    }

    #[test]
    fn test_subscriber_overflow_helper() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert!(ev.is_subscriber_overflow());
        assert!(!ev.is_subscriber_panic());
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));
    }
}
