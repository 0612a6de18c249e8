//! Error types used by refreshvisor.
//!
//! This module defines three error enums:
//!
//! - [`RefreshError`]: a single generation attempt failed.
//! - [`ConfigError`]: a manager was constructed with invalid parameters.
//! - [`RuntimeError`]: starting or stopping the background scheduler failed.
//!
//! [`RefreshError`] and [`RuntimeError`] provide `as_label`/`as_message` helpers
//! for logs and metrics.

use std::any::Any;
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by a generation attempt.
///
/// A generator reports failure by returning one of these. The scheduler never
/// propagates them to readers: the stored value is left untouched and the
/// next attempt happens on the next tick.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The generator could not produce a value.
    #[error("generation failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The generator exceeded the configured call timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The generator panicked; the panic was caught by the scheduler.
    #[error("generator panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The attempt was abandoned because the scheduler is stopping.
    #[error("refresh cancelled")]
    Canceled,
}

impl RefreshError {
    /// Wraps any displayable error as [`RefreshError::Fail`].
    ///
    /// # Example
    /// ```
    /// use refreshvisor::RefreshError;
    ///
    /// let err = RefreshError::fail("connection refused");
    /// assert_eq!(err.to_string(), "generation failed: connection refused");
    /// ```
    pub fn fail(error: impl Display) -> Self {
        RefreshError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use refreshvisor::RefreshError;
    /// use std::time::Duration;
    ///
    /// let err = RefreshError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "refresh_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RefreshError::Fail { .. } => "refresh_failed",
            RefreshError::Timeout { .. } => "refresh_timeout",
            RefreshError::Panicked { .. } => "refresh_panicked",
            RefreshError::Canceled => "refresh_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RefreshError::Fail { error } => format!("error: {error}"),
            RefreshError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            RefreshError::Panicked { info } => format!("panic: {info}"),
            RefreshError::Canceled => "refresh cancelled".to_string(),
        }
    }
}

/// # Construction-time contract violations.
///
/// Rejected eagerly by [`Manager::new`](crate::Manager::new) and
/// [`ManagerBuilder::build`](crate::ManagerBuilder::build).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Refresh interval must be strictly positive.
    #[error("refresh interval must be greater than zero")]
    ZeroInterval,

    /// The builder was finished without a generator.
    #[error("no generator configured for '{name}'")]
    MissingGenerator {
        /// Display name of the manager being built.
        name: String,
    },
}

/// # Errors produced while driving the background scheduler.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// `start()` was called more than once on the same manager.
    #[error("refresh loop for '{name}' already started")]
    AlreadyStarted {
        /// Display name of the manager.
        name: String,
    },

    /// `start()` was called outside a Tokio runtime.
    #[error("no tokio runtime available to spawn the refresh loop")]
    NoRuntime,

    /// The scheduler did not finish within the grace period after cancellation.
    #[error("refresh loop for '{name}' did not stop within {grace:?}")]
    GraceExceeded {
        /// Display name of the manager.
        name: String,
        /// The configured grace duration.
        grace: Duration,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use refreshvisor::RuntimeError;
    ///
    /// let err = RuntimeError::NoRuntime;
    /// assert_eq!(err.as_label(), "runtime_no_runtime");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyStarted { .. } => "runtime_already_started",
            RuntimeError::NoRuntime => "runtime_no_runtime",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::AlreadyStarted { name } => format!("already started: {name}"),
            RuntimeError::NoRuntime => "no tokio runtime".to_string(),
            RuntimeError::GraceExceeded { name, grace } => {
                format!("grace exceeded after {grace:?}; stuck={name}")
            }
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_info(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
