//! # Lock-free holder of the current value.
//!
//! [`ValueStore`] wraps an [`ArcSwapOption`]: readers load an `Arc<T>` without
//! taking a lock, the refresh loop swaps in a new `Arc<T>` as one pointer.
//! A value is therefore never observed half-written.
//!
//! ## Rules
//! - `load()` returns `None` until the first `store()` (the empty sentinel).
//! - Once stored, the slot never becomes empty again.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

/// Thread-safe slot for the most recently generated value.
///
/// ## Example
/// ```rust
/// use refreshvisor::ValueStore;
///
/// let store = ValueStore::new();
/// assert!(store.load().is_none());
///
/// store.store("token-1".to_string());
/// store.store("token-2".to_string());
/// assert_eq!(store.load().as_deref().map(String::as_str), Some("token-2"));
/// ```
pub struct ValueStore<T> {
    slot: ArcSwapOption<T>,
}

impl<T> ValueStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    /// Replaces the current value unconditionally.
    pub fn store(&self, value: T) {
        self.store_arc(Arc::new(value));
    }

    /// Replaces the current value with an already shared one.
    pub fn store_arc(&self, value: Arc<T>) {
        self.slot.store(Some(value));
    }

    /// Returns the most recently stored value, or `None` before the first store.
    #[inline]
    pub fn load(&self) -> Option<Arc<T>> {
        self.slot.load_full()
    }

    /// Returns `true` while nothing has been stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slot.load().is_none()
    }
}

impl<T> Default for ValueStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ValueStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueStore")
            .field("empty", &self.is_empty())
            .finish()
    }
}
