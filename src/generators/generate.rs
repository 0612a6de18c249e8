//! # Generator abstraction.
//!
//! A [`Generate`] implementation produces a fresh value each time it is called,
//! or reports why it could not. The refresh loop calls it sequentially, never
//! twice at once, and reacts only to the returned `Result`.
//!
//! The common handle type is [`GeneratorRef`], an `Arc<dyn Generate<T>>`
//! shared between the manager and its scheduler.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RefreshError;

/// Shared handle to a generator.
pub type GeneratorRef<T> = Arc<dyn Generate<T>>;

/// # Source of new values.
///
/// Called once per refresh attempt. Its latency delays both the next tick and,
/// on the first call, the release of readers waiting for a value.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use refreshvisor::{Generate, RefreshError};
///
/// struct StaticToken;
///
/// #[async_trait]
/// impl Generate<String> for StaticToken {
///     async fn generate(&self) -> Result<String, RefreshError> {
///         Ok("session-token".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait Generate<T>: Send + Sync + 'static {
    /// Produces a new value.
    ///
    /// Errors are contained by the scheduler: they are logged and the stored
    /// value is left as it was.
    async fn generate(&self) -> Result<T, RefreshError>;
}
