//! # Subscriber trait
//!
//! `Subscribe` is the extension point for reacting to manager events (logging,
//! metrics, alerting). Each subscriber is driven by a dedicated worker fed by a
//! bounded queue owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they never delay the refresh loop or readers.
//! - If a subscriber's queue overflows, events for that subscriber are dropped
//!   and a `SubscriberOverflow` event is published.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use refreshvisor::{Event, EventKind, Subscribe};
//!
//! struct FailureAlert;
//!
//! #[async_trait]
//! impl Subscribe for FailureAlert {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::RefreshFailed && ev.failures >= Some(5) {
//!             // page someone...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "failure-alert" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        256
    }
}
