//! # Run a single generation attempt.
//!
//! Executes one call of the manager's generator with an optional timeout,
//! applies the result to the shared state and publishes events to the bus.
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   RefreshStarting → generate() → Ok(v) → store(v) → RefreshSucceeded
//!                                                   → GateOpened (first success only)
//!
//! Failure:
//!   RefreshStarting → generate() → Err(e) → RefreshFailed
//!
//! Timeout:
//!   RefreshStarting → timeout exceeded → TimeoutHit → RefreshFailed
//!
//! Panic:
//!   RefreshStarting → generate() panics → RefreshFailed (Panicked)
//! ```
//!
//! ## Rules
//! - Attempts are serialized by `Shared::attempt_lock`; scheduled and manual
//!   attempts never overlap, so the store has a single writer.
//! - The store is written **before** the gate opens.
//! - A failure leaves the store, the gate and the previous value untouched.
//! - Dropping the future mid-call (cancellation) records nothing beyond
//!   `RefreshStarting`.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::{self, Instant};

use crate::{
    core::manager::Shared,
    error::{RefreshError, panic_info},
    events::{Event, EventKind},
    generators::Generate,
};

/// Performs one attempt against `shared` and returns its outcome.
pub(crate) async fn run_attempt<T>(shared: &Shared<T>) -> Result<(), RefreshError>
where
    T: Send + Sync + 'static,
{
    let _serial = shared.attempt_lock.lock().await;
    let attempt = shared.stats.begin_attempt();
    shared.bus.publish(
        Event::new(EventKind::RefreshStarting)
            .with_manager(shared.name.clone())
            .with_attempt(attempt),
    );

    let started = Instant::now();
    let res = call_generator(shared, attempt).await;

    match res {
        Ok(value) => {
            shared.store.store(value);
            shared.stats.record_success();
            shared.bus.publish(
                Event::new(EventKind::RefreshSucceeded)
                    .with_manager(shared.name.clone())
                    .with_attempt(attempt)
                    .with_elapsed(started.elapsed()),
            );
            if shared.gate.open() {
                shared.bus.publish(
                    Event::new(EventKind::GateOpened)
                        .with_manager(shared.name.clone())
                        .with_attempt(attempt),
                );
            }
            Ok(())
        }
        Err(e) => {
            let failures = shared.stats.record_failure();
            shared.bus.publish(
                Event::new(EventKind::RefreshFailed)
                    .with_manager(shared.name.clone())
                    .with_attempt(attempt)
                    .with_failures(failures)
                    .with_reason(e.to_string()),
            );
            Err(e)
        }
    }
}

/// Invokes the generator, converting timeouts and panics into errors.
async fn call_generator<T>(shared: &Shared<T>, attempt: u64) -> Result<T, RefreshError>
where
    T: Send + Sync + 'static,
{
    let call = AssertUnwindSafe(shared.generator.generate()).catch_unwind();

    let outcome = match shared.cfg.call_timeout() {
        Some(dur) => match time::timeout(dur, call).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => {
                publish_timeout(shared, dur, attempt);
                return Err(RefreshError::Timeout { timeout: dur });
            }
        },
        None => call.await,
    };

    outcome.unwrap_or_else(|payload| {
        Err(RefreshError::Panicked {
            info: panic_info(&*payload),
        })
    })
}

/// Publishes `TimeoutHit` (always followed by `RefreshFailed`).
fn publish_timeout<T>(shared: &Shared<T>, dur: Duration, attempt: u64) {
    shared.bus.publish(
        Event::new(EventKind::TimeoutHit)
            .with_manager(shared.name.clone())
            .with_timeout(dur)
            .with_attempt(attempt),
    );
}
