//! # Handle to a running refresh loop.
//!
//! Returned by [`Manager::start`](crate::Manager::start). The handle owns the
//! loop's [`CancellationToken`] and the join handle of its task.
//!
//! ## Shutdown path
//! ```text
//! stop() / stop_with_grace(grace)
//!   └─► token.cancel()            → actor leaves its select! at once
//!   └─► await loop task           → SchedulerStopped published,
//!                                   subscriber queues drained
//!         └─ (grace) timeout      → abort task, RuntimeError::GraceExceeded
//! ```
//!
//! Dropping the handle detaches the loop; it keeps running until the token is
//! cancelled elsewhere or the runtime shuts down.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;

/// Owner's control over a started refresh loop.
#[derive(Debug)]
pub struct RefreshHandle {
    name: Arc<str>,
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl RefreshHandle {
    pub(crate) fn new(name: Arc<str>, token: CancellationToken, join: JoinHandle<()>) -> Self {
        Self { name, token, join }
    }

    /// Name of the manager this loop refreshes.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requests the loop to stop without waiting for it. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns `true` once the loop task has finished.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Returns a child of the loop's token.
    ///
    /// Cancelled when the loop is stopped; cancelling it does not stop the loop.
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Cancels the loop and waits until it and its subscriber workers finish.
    pub async fn stop(self) {
        self.token.cancel();
        let _ = self.join.await;
    }

    /// Like [`stop`](Self::stop), but gives up after `grace`.
    ///
    /// On timeout the loop task is aborted and
    /// [`RuntimeError::GraceExceeded`] is returned.
    pub async fn stop_with_grace(mut self, grace: Duration) -> Result<(), RuntimeError> {
        self.token.cancel();
        match tokio::time::timeout(grace, &mut self.join).await {
            Ok(_) => Ok(()),
            Err(_) => {
                self.join.abort();
                Err(RuntimeError::GraceExceeded {
                    name: self.name.to_string(),
                    grace,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manager::Manager;
    use crate::error::RefreshError;
    use crate::events::Event;
    use crate::generators::{GenerateFn, GeneratorRef};
    use crate::subscribers::Subscribe;
    use async_trait::async_trait;

    struct Sluggish;

    #[async_trait]
    impl Subscribe for Sluggish {
        async fn on_event(&self, _ev: &Event) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }

    fn generator() -> GeneratorRef<u8> {
        GenerateFn::arc(|| async { Ok::<_, RefreshError>(1) })
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_with_grace_finishes_in_time() {
        let m = Manager::builder("graceful")
            .interval(Duration::from_secs(1))
            .without_default_logging()
            .generator(generator())
            .build()
            .unwrap();
        let handle = m.start().unwrap();
        assert_eq!(handle.name(), "graceful");
        m.value().await;

        handle.stop_with_grace(Duration::from_secs(5)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_with_grace_reports_slow_drain() {
        let m = Manager::builder("stuck")
            .interval(Duration::from_secs(1))
            .without_default_logging()
            .subscriber(Arc::new(Sluggish))
            .generator(generator())
            .build()
            .unwrap();
        let handle = m.start().unwrap();
        m.value().await;

        let err = handle
            .stop_with_grace(Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::GraceExceeded { ref name, grace }
                if name == "stuck" && grace == Duration::from_secs(1)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_token_follows_cancel() {
        let m = Manager::builder("child")
            .without_default_logging()
            .generator(generator())
            .build()
            .unwrap();
        let handle = m.start().unwrap();
        let child = handle.child_token();
        assert!(!handle.is_cancelled());

        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(child.is_cancelled());
        handle.stop().await;
    }
}
