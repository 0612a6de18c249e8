//! # RefreshActor: the periodic refresh loop.
//!
//! Drives one manager's generator on a fixed-period timer:
//! - first attempt immediately on start,
//! - one attempt per tick afterwards,
//! - cooperative cancellation via [`CancellationToken`].
//!
//! ## Architecture
//! ```text
//! Manager::start() ──► RefreshActor::run(token)
//!
//! publish SchedulerStarted
//! loop {
//!   ├─► wait tick  (first tick completes immediately) ─┐
//!   │                                                  ├─ cancelled → break
//!   ├─► run_attempt()                                 ─┘
//!   │       ├─ Ok  ──► value stored, gate opened on first success
//!   │       └─ Err ──► value untouched; nothing until the next tick
//! }
//! publish SchedulerStopped
//! ```
//!
//! ## Rules
//! - Attempts run **sequentially** (never concurrent for one manager).
//! - An attempt that overruns the period delays the next tick
//!   ([`MissedTickBehavior::Delay`]); ticks are never bursted.
//! - A failed attempt is **not** retried before the next tick.
//! - Cancellation is observed while waiting for a tick **and** during an
//!   attempt; an in-flight generator future is dropped.

use std::sync::Arc;

use tokio::{
    select,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{manager::Shared, runner::run_attempt},
    events::{Event, EventKind},
};

/// Owns the refresh loop of a single manager.
pub(crate) struct RefreshActor<T> {
    shared: Arc<Shared<T>>,
}

impl<T> RefreshActor<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(shared: Arc<Shared<T>>) -> Self {
        Self { shared }
    }

    /// Runs the loop until `token` is cancelled.
    ///
    /// Generation errors are contained here: they never end the loop.
    pub(crate) async fn run(self, token: CancellationToken) {
        let shared = self.shared.as_ref();
        shared.bus.publish(
            Event::new(EventKind::SchedulerStarted)
                .with_manager(shared.name.clone())
                .with_interval(shared.cfg.interval),
        );

        let mut ticker = time::interval(shared.cfg.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            select! {
                biased;
                _ = token.cancelled() => break,
                _ = run_attempt(shared) => {}
            }
        }

        shared.bus.publish(
            Event::new(EventKind::SchedulerStopped)
                .with_manager(shared.name.clone())
                .with_attempt(shared.stats.attempts()),
        );
    }
}
