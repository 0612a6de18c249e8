//! # Fluent construction of a [`Manager`].
//!
//! Collects the name, [`Config`] overrides, generator and subscribers, then
//! validates everything in [`ManagerBuilder::build`].

use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config, core::manager::Manager, error::ConfigError, generators::GeneratorRef,
    subscribers::Subscribe,
};

/// Builder for constructing a [`Manager`] with optional settings.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use refreshvisor::{GenerateFn, GeneratorRef, Manager, RefreshError};
///
/// let generator: GeneratorRef<String> = GenerateFn::arc(|| async {
///     Ok::<_, RefreshError>("token".to_string())
/// });
///
/// let manager = Manager::builder("billing-api")
///     .interval(Duration::from_secs(300))
///     .timeout(Duration::from_secs(10))
///     .generator(generator)
///     .build()
///     .unwrap();
/// assert_eq!(manager.config().call_timeout(), Some(Duration::from_secs(10)));
/// ```
pub struct ManagerBuilder<T> {
    name: Arc<str>,
    cfg: Config,
    generator: Option<GeneratorRef<T>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<T> ManagerBuilder<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a new builder with default [`Config`].
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            cfg: Config::default(),
            generator: None,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the refresh period.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.cfg.interval = interval;
        self
    }

    /// Sets the per-call generator timeout (`Duration::ZERO` disables it).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.cfg.timeout = timeout;
        self
    }

    /// Sets the event bus capacity.
    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.cfg.bus_capacity = capacity;
        self
    }

    /// Sets the generator.
    pub fn generator(mut self, generator: GeneratorRef<T>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Replaces the event subscribers.
    ///
    /// Subscribers receive events through dedicated workers with bounded queues
    /// once the loop is started.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Does not attach the built-in [`LogWriter`](crate::LogWriter) on start.
    pub fn without_default_logging(mut self) -> Self {
        self.cfg.log_events = false;
        self
    }

    /// Validates the settings and builds the manager.
    pub fn build(self) -> Result<Manager<T>, ConfigError> {
        let generator = self.generator.ok_or_else(|| ConfigError::MissingGenerator {
            name: self.name.to_string(),
        })?;
        Manager::from_parts(self.name, self.cfg, generator, self.subscribers)
    }
}
