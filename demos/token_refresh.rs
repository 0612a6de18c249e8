//! # Example: token_refresh
//!
//! A mock identity provider that fails twice before issuing tokens, read by
//! several tasks and one plain OS thread.
//!
//! Demonstrates how to:
//! - Wrap an async closure in [`GenerateFn`].
//! - Build a [`Manager`] with an interval and a call timeout.
//! - Read the value from tasks ([`Manager::value`]) and threads ([`Manager::blocking_value`]).
//! - Stop the loop gracefully with [`RefreshHandle::stop_with_grace`].
//!
//! ## Flow
//! ```text
//! Manager::start()
//!     ├─► attempt #1 ─► Err (readers keep waiting)
//!     ├─► tick ─► attempt #2 ─► Err
//!     ├─► tick ─► attempt #3 ─► Ok(token-3) ─► GateOpened ─► readers released
//!     ├─► tick ─► attempt #4 ─► Ok(token-4) ─► readers see the new token
//!     └─► stop_with_grace() ─► SchedulerStopped
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=refreshvisor=debug cargo run --example token_refresh
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use refreshvisor::{GenerateFn, GeneratorRef, Manager, RefreshError, RefreshHandle};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Logging: the built-in LogWriter reports through `tracing`
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Mock identity provider: two failures, then a new token per call
    let calls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&calls);
    let generator: GeneratorRef<String> = GenerateFn::arc(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if n <= 2 {
                Err(RefreshError::fail("identity provider unavailable"))
            } else {
                Ok(format!("token-{n}"))
            }
        }
    });

    // 3. Manager refreshing every 300ms, each call bounded by 1s
    let tokens = Manager::builder("identity")
        .interval(Duration::from_millis(300))
        .timeout(Duration::from_secs(1))
        .generator(generator)
        .build()?;

    let handle: RefreshHandle = tokens.start()?;

    // 4. Async readers wait for the first token only
    let mut readers = Vec::new();
    for id in 0..3 {
        let tokens = tokens.clone();
        readers.push(tokio::spawn(async move {
            let token = tokens.value().await;
            println!("[reader-{id}] got {token}");
        }));
    }
    for r in readers {
        r.await?;
    }

    // 5. A plain thread reads through the blocking path
    let from_thread = {
        let tokens = tokens.clone();
        std::thread::spawn(move || tokens.blocking_value())
    };
    let token = tokio::task::spawn_blocking(move || from_thread.join())
        .await?
        .map_err(|_| "reader thread panicked")?;
    println!("[thread] got {token}");

    // 6. Let a refresh or two happen, then look again
    tokio::time::sleep(Duration::from_millis(700)).await;
    println!("[main] current {}", tokens.value().await);
    println!("[main] stats {:?}", tokens.stats());

    // 7. Graceful stop
    handle.stop_with_grace(Duration::from_secs(2)).await?;
    println!("[main] generator called {} times", calls.load(Ordering::SeqCst));
    Ok(())
}
