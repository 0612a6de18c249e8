//! # One-shot gate released by the first successful generation.
//!
//! [`FirstValueGate`] has two states, `WAITING` (initial) and `OPEN` (terminal).
//! Readers that arrive while it is waiting suspend; the single transition to
//! open releases all of them at once. Readers arriving afterwards pass through
//! on an atomic load without touching the channel.
//!
//! ## Internal scheme
//! ```text
//! open():
//!   ├─ watch.send_if_modified(false → true)   (exactly one caller wins)
//!   └─ flag.store(true)                       (fast path for later readers)
//!
//! wait_open():
//!   ├─ flag.load() == true  → return
//!   └─ watch.subscribe().wait_for(open)       (checks current value first)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// One-shot latch: closed until [`open`](FirstValueGate::open) is first called.
///
/// ## Example
/// ```rust
/// use refreshvisor::FirstValueGate;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let gate = FirstValueGate::new();
/// assert!(!gate.is_open());
///
/// assert!(gate.open());   // performs the transition
/// assert!(!gate.open());  // already open: no-op
///
/// gate.wait_open().await; // returns immediately
/// # }
/// ```
pub struct FirstValueGate {
    flag: AtomicBool,
    tx: watch::Sender<bool>,
}

impl FirstValueGate {
    /// Creates a closed gate.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            flag: AtomicBool::new(false),
            tx,
        }
    }

    /// Returns `true` once the gate has been opened.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Opens the gate, releasing every current and future waiter.
    ///
    /// Returns `true` only for the call that performed the transition; later
    /// calls are no-ops returning `false`. Never blocks.
    pub fn open(&self) -> bool {
        let opened = self.tx.send_if_modified(|open| {
            if *open {
                false
            } else {
                *open = true;
                true
            }
        });
        self.flag.store(true, Ordering::Release);
        opened
    }

    /// Suspends until the gate is open.
    ///
    /// Returns immediately if it already is.
    pub async fn wait_open(&self) {
        if self.is_open() {
            return;
        }
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|open| *open).await;
    }

    /// Blocks the current thread until the gate is open.
    ///
    /// Intended for plain OS threads. Calling it from inside an async task
    /// stalls that task's worker thread; use [`wait_open`](Self::wait_open) there.
    pub fn wait_open_blocking(&self) {
        if self.is_open() {
            return;
        }
        futures::executor::block_on(self.wait_open());
    }
}

impl Default for FirstValueGate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FirstValueGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirstValueGate")
            .field("open", &self.is_open())
            .finish()
    }
}
