//! # LogWriter: tracing-backed event logger
//!
//! Turns incoming [`Event`]s into `tracing` records under the `refreshvisor`
//! target. Attached automatically by `Manager::start()` unless
//! `Config::log_events` is `false`.
//!
//! ## Levels
//! - `info`: scheduler started/stopped, attempt starting/succeeded, first value available
//! - `warn`: attempt failed, timeout hit, subscriber overflow
//! - `error`: subscriber panicked

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event logger subscriber.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let manager = e.manager.as_deref().unwrap_or("unknown");
        match e.kind {
            EventKind::SchedulerStarted => {
                info!(target: "refreshvisor", manager, interval_ms = ?e.interval_ms, "refresh loop started");
            }
            EventKind::SchedulerStopped => {
                info!(target: "refreshvisor", manager, attempts = ?e.attempt, "refresh loop stopped");
            }
            EventKind::RefreshStarting => {
                info!(target: "refreshvisor", manager, attempt = ?e.attempt, "generating new value");
            }
            EventKind::RefreshSucceeded => {
                info!(
                    target: "refreshvisor",
                    manager,
                    attempt = ?e.attempt,
                    elapsed_ms = ?e.elapsed_ms,
                    "generated new value"
                );
            }
            EventKind::GateOpened => {
                info!(target: "refreshvisor", manager, attempt = ?e.attempt, "first value available");
            }
            EventKind::RefreshFailed => {
                warn!(
                    target: "refreshvisor",
                    manager,
                    attempt = ?e.attempt,
                    consecutive_failures = ?e.failures,
                    error = e.reason.as_deref().unwrap_or("unknown"),
                    "refresh failed; keeping previous value"
                );
            }
            EventKind::TimeoutHit => {
                warn!(
                    target: "refreshvisor",
                    manager,
                    attempt = ?e.attempt,
                    timeout_ms = ?e.timeout_ms,
                    "generator timed out"
                );
            }
            EventKind::SubscriberOverflow => {
                warn!(
                    target: "refreshvisor",
                    subscriber = manager,
                    reason = e.reason.as_deref().unwrap_or("unknown"),
                    "subscriber dropped event"
                );
            }
            EventKind::SubscriberPanicked => {
                error!(
                    target: "refreshvisor",
                    subscriber = manager,
                    info = e.reason.as_deref().unwrap_or("unknown"),
                    "subscriber panicked"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
