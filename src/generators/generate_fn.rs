//! # Function-backed generators
//!
//! [`GenerateFn`] wraps an async closure `F: Fn() -> Fut`, producing a fresh
//! future per attempt. [`BlockingFn`] wraps a synchronous closure and runs it
//! on Tokio's blocking pool so the refresh loop's worker thread stays free.
//!
//! ## Concurrency semantics
//! - Each attempt calls the closure again; no state is carried between calls
//!   unless the closure captures it (use `Arc<...>` explicitly for that).
//! - A [`BlockingFn`] call cannot be interrupted: on timeout or cancellation the
//!   closure keeps running on the blocking pool and its result is discarded.
//!   The next call waits until that closure returns, so calls never overlap.
//!
//! ## Example
//! ```rust
//! use refreshvisor::{GenerateFn, GeneratorRef, RefreshError};
//!
//! let g: GeneratorRef<String> = GenerateFn::arc(|| async {
//!     Ok::<_, RefreshError>("mock-token".to_string())
//! });
//! # let _ = g;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{RefreshError, panic_info};
use crate::generators::generate::Generate;

/// Async-closure generator.
#[derive(Debug)]
pub struct GenerateFn<F> {
    f: F,
}

impl<F> GenerateFn<F> {
    /// Creates a new function-backed generator.
    ///
    /// Prefer [`GenerateFn::arc`] when you immediately need a
    /// [`GeneratorRef`](crate::GeneratorRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the generator and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<T, F, Fut> Generate<T> for GenerateFn<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, RefreshError>> + Send + 'static,
{
    async fn generate(&self) -> Result<T, RefreshError> {
        (self.f)().await
    }
}

/// Synchronous-closure generator, executed via [`tokio::task::spawn_blocking`].
///
/// ## Example
/// ```rust
/// use refreshvisor::{BlockingFn, GeneratorRef, RefreshError};
///
/// let g: GeneratorRef<u64> = BlockingFn::arc(|| {
///     // e.g. a blocking HTTP client or a file read
///     Ok::<_, RefreshError>(42)
/// });
/// # let _ = g;
/// ```
#[derive(Debug)]
pub struct BlockingFn<F> {
    f: Arc<F>,
    /// Held by the running closure, released when it returns or unwinds.
    in_flight: Arc<Mutex<()>>,
}

impl<F> BlockingFn<F> {
    /// Creates a new blocking generator.
    pub fn new(f: F) -> Self {
        Self {
            f: Arc::new(f),
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Creates the generator and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<T, F> Generate<T> for BlockingFn<F>
where
    T: Send + 'static,
    F: Fn() -> Result<T, RefreshError> + Send + Sync + 'static,
{
    async fn generate(&self) -> Result<T, RefreshError> {
        let f = Arc::clone(&self.f);
        let guard = Arc::clone(&self.in_flight).lock_owned().await;
        let call = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            f()
        });
        match call.await {
            Ok(res) => res,
            Err(e) if e.is_panic() => Err(RefreshError::Panicked {
                info: panic_info(&*e.into_panic()),
            }),
            Err(_) => Err(RefreshError::Canceled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::GeneratorRef;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_generate_fn_calls_closure_each_time() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let g: GeneratorRef<u32> = GenerateFn::arc(move || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<_, RefreshError>(n)
            }
        });

        assert_eq!(g.generate().await, Ok(1));
        assert_eq!(g.generate().await, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_generate_fn_passes_errors_through() {
        let g: GeneratorRef<String> =
            GenerateFn::arc(|| async { Err::<String, _>(RefreshError::fail("unauthorized")) });
        assert_eq!(g.generate().await, Err(RefreshError::fail("unauthorized")));
    }

    #[tokio::test]
    async fn test_blocking_fn_runs_off_runtime() {
        let g: GeneratorRef<String> = BlockingFn::arc(|| {
            std::thread::sleep(std::time::Duration::from_millis(5));
            Ok::<_, RefreshError>("blocking".to_string())
        });
        assert_eq!(g.generate().await.as_deref(), Ok("blocking"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_fn_waits_for_abandoned_call() {
        let running = Arc::new(AtomicU32::new(0));
        let peak = Arc::new(AtomicU32::new(0));
        let (r, p) = (Arc::clone(&running), Arc::clone(&peak));
        let g: GeneratorRef<u32> = BlockingFn::arc(move || -> Result<u32, RefreshError> {
            let now = r.fetch_add(1, Ordering::SeqCst) + 1;
            p.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(200));
            r.fetch_sub(1, Ordering::SeqCst);
            Ok(now)
        });

        let short = std::time::Duration::from_millis(20);
        assert!(tokio::time::timeout(short, g.generate()).await.is_err());
        assert!(tokio::time::timeout(short, g.generate()).await.is_err());
        assert_eq!(g.generate().await, Ok(1));
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blocking_fn_panic_becomes_error() {
        let g: GeneratorRef<u8> =
            BlockingFn::arc(|| -> Result<u8, RefreshError> { panic!("vault sealed") });
        assert_eq!(
            g.generate().await,
            Err(RefreshError::Panicked {
                info: "vault sealed".into()
            })
        );
    }
}
