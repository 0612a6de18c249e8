//! # Manager: the background-refreshed value.
//!
//! A [`Manager`] owns one [`ValueStore`], one [`FirstValueGate`], the generator
//! and the immutable [`Config`]. Readers call [`Manager::value`]; the refresh
//! loop spawned by [`Manager::start`] is the only routine writer.
//!
//! ## Read path
//! ```text
//! value():
//!   loop {
//!     store.load() == Some(v) → return v        (never blocks after first success)
//!     gate.wait_open().await                    (suspends before first success)
//!   }
//! ```
//!
//! ## Start path
//! ```text
//! start_with(token):
//!   ├─ reject if already started / no runtime
//!   ├─ bus.subscribe()                          (before the loop publishes anything)
//!   └─ spawn {
//!        SubscriberSet::new(subscribers [+ LogWriter])
//!        spawn listener: Bus ─► SubscriberSet::emit   (until the loop returns)
//!        RefreshActor::run(token).await
//!        done.cancel(); listener.await               (bus drained, queues drained)
//!      }
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    core::{
        actor::RefreshActor,
        builder::ManagerBuilder,
        handle::RefreshHandle,
        runner::run_attempt,
        stats::{Counters, RefreshStats},
    },
    error::{ConfigError, RefreshError, RuntimeError},
    events::{Bus, Event},
    generators::GeneratorRef,
    store::{FirstValueGate, ValueStore},
    subscribers::{LogWriter, Subscribe, SubscriberSet},
};

/// State shared between a manager's clones and its refresh loop.
pub(crate) struct Shared<T> {
    pub(crate) name: Arc<str>,
    pub(crate) cfg: Config,
    pub(crate) generator: GeneratorRef<T>,
    pub(crate) store: ValueStore<T>,
    pub(crate) gate: FirstValueGate,
    pub(crate) bus: Bus,
    pub(crate) stats: Counters,
    /// Serializes attempts (scheduled and manual).
    pub(crate) attempt_lock: Mutex<()>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    started: AtomicBool,
}

/// A value kept fresh by a background loop.
///
/// Cloning is cheap; clones share the same value, gate and loop.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use refreshvisor::{GenerateFn, GeneratorRef, Manager, RefreshError};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let generator: GeneratorRef<String> = GenerateFn::arc(|| async {
///         Ok::<_, RefreshError>("mock-token".to_string())
///     });
///     let tokens = Manager::new("api", Duration::from_millis(500), generator)?;
///
///     let handle = tokens.start()?;
///     assert_eq!(tokens.value().await.as_str(), "mock-token");
///
///     handle.stop().await;
///     Ok(())
/// }
/// ```
pub struct Manager<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Manager<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Manager<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a manager refreshing every `interval` with default settings.
    ///
    /// Fails fast with [`ConfigError::ZeroInterval`] on a zero interval.
    pub fn new(
        name: impl Into<Arc<str>>,
        interval: Duration,
        generator: GeneratorRef<T>,
    ) -> Result<Self, ConfigError> {
        Self::with_config(name, Config::new(interval), generator)
    }

    /// Creates a manager from an explicit [`Config`].
    pub fn with_config(
        name: impl Into<Arc<str>>,
        cfg: Config,
        generator: GeneratorRef<T>,
    ) -> Result<Self, ConfigError> {
        Self::from_parts(name.into(), cfg, generator, Vec::new())
    }

    /// Starts a builder for a manager named `name`.
    pub fn builder(name: impl Into<Arc<str>>) -> ManagerBuilder<T> {
        ManagerBuilder::new(name)
    }

    pub(crate) fn from_parts(
        name: Arc<str>,
        cfg: Config,
        generator: GeneratorRef<T>,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Ok(Self {
            shared: Arc::new(Shared {
                name,
                cfg,
                generator,
                store: ValueStore::new(),
                gate: FirstValueGate::new(),
                bus,
                stats: Counters::default(),
                attempt_lock: Mutex::new(()),
                subscribers,
                started: AtomicBool::new(false),
            }),
        })
    }

    /// Display name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Refresh period.
    pub fn interval(&self) -> Duration {
        self.shared.cfg.interval
    }

    /// Full configuration.
    pub fn config(&self) -> &Config {
        &self.shared.cfg
    }

    /// Returns the current value, waiting for the first one if necessary.
    ///
    /// Suspends only until the first successful generation; afterwards it
    /// returns immediately, even while later refreshes fail (stale value).
    /// There is no built-in timeout: wrap in [`tokio::time::timeout`] if needed.
    pub async fn value(&self) -> Arc<T> {
        loop {
            if let Some(v) = self.shared.store.load() {
                return v;
            }
            self.shared.gate.wait_open().await;
        }
    }

    /// Blocking counterpart of [`value`](Self::value) for plain OS threads.
    ///
    /// Must not be called from inside an async task.
    pub fn blocking_value(&self) -> Arc<T> {
        loop {
            if let Some(v) = self.shared.store.load() {
                return v;
            }
            self.shared.gate.wait_open_blocking();
        }
    }

    /// Returns the current value without waiting; `None` before the first success.
    pub fn try_value(&self) -> Option<Arc<T>> {
        self.shared.store.load()
    }

    /// Returns `true` once at least one generation has succeeded.
    pub fn has_value(&self) -> bool {
        self.shared.gate.is_open()
    }

    /// Snapshot of attempt counters.
    pub fn stats(&self) -> RefreshStats {
        self.shared.stats.snapshot()
    }

    /// Returns a receiver of this manager's events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// Runs one generation attempt now, outside the schedule.
    ///
    /// Waits for an in-flight scheduled attempt to finish first. Success and
    /// failure have the same effect as for scheduled attempts.
    pub async fn refresh_now(&self) -> Result<(), RefreshError> {
        run_attempt(&self.shared).await
    }

    /// Spawns the refresh loop on the current Tokio runtime.
    ///
    /// The first attempt runs immediately. May be called once per manager.
    pub fn start(&self) -> Result<RefreshHandle, RuntimeError> {
        self.start_with(CancellationToken::new())
    }

    /// Like [`start`](Self::start), stopping when `token` is cancelled.
    ///
    /// Pass `parent.child_token()` to tie the loop to an owner's shutdown.
    pub fn start_with(&self, token: CancellationToken) -> Result<RefreshHandle, RuntimeError> {
        let rt = tokio::runtime::Handle::try_current().map_err(|_| RuntimeError::NoRuntime)?;
        if self.shared.started.swap(true, Ordering::AcqRel) {
            return Err(RuntimeError::AlreadyStarted {
                name: self.shared.name.to_string(),
            });
        }

        let mut subs = self.shared.subscribers.clone();
        if self.shared.cfg.log_events {
            subs.push(Arc::new(LogWriter::new()));
        }

        let rx = self.shared.bus.subscribe();
        let bus = self.shared.bus.clone();
        let actor = RefreshActor::new(Arc::clone(&self.shared));
        let actor_token = token.clone();

        let join = rt.spawn(async move {
            let set = SubscriberSet::new(subs, bus);
            let done = CancellationToken::new();
            let listener = tokio::spawn(listen(rx, set, done.clone()));
            actor.run(actor_token).await;
            done.cancel();
            let _ = listener.await;
        });

        Ok(RefreshHandle::new(self.shared.name.clone(), token, join))
    }
}

/// Forwards bus events to subscribers until `done` fires, then drains what
/// was buffered at that moment.
///
/// Termination does not depend on receiving any particular event: a lagging
/// receiver may never see `SchedulerStopped`.
async fn listen(mut rx: broadcast::Receiver<Event>, set: SubscriberSet, done: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            _ = done.cancelled() => break,
            res = rx.recv() => match res {
                Ok(ev) => set.emit(ev),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    // Bounded: `refresh_now()` callers may keep publishing after the loop ends.
    for _ in 0..rx.len() {
        match rx.try_recv() {
            Ok(ev) => set.emit(ev),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    set.shutdown().await;
}

impl<T> fmt::Debug for Manager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("name", &self.shared.name)
            .field("interval", &self.shared.cfg.interval)
            .field("has_value", &self.shared.gate.is_open())
            .field("started", &self.shared.started.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{BlockingFn, GenerateFn};
    use crate::events::EventKind;
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::time::{Instant, sleep, timeout};

    fn quiet(interval: Duration) -> Config {
        Config {
            log_events: false,
            ..Config::new(interval)
        }
    }

    fn constant(value: &'static str) -> GeneratorRef<String> {
        GenerateFn::arc(move || async move { Ok::<_, RefreshError>(value.to_string()) })
    }

    /// Fails `failures` times, then yields "ok-<call>" forever.
    fn flaky(failures: u64) -> (GeneratorRef<String>, Arc<AtomicU64>) {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let g: GeneratorRef<String> = GenerateFn::arc(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n <= failures {
                    Err(RefreshError::fail(format!("boom #{n}")))
                } else {
                    Ok(format!("ok-{n}"))
                }
            }
        });
        (g, calls)
    }

    #[test]
    fn test_new_rejects_zero_interval() {
        let err = Manager::new("zero", Duration::ZERO, constant("x")).unwrap_err();
        assert_eq!(err, ConfigError::ZeroInterval);
    }

    #[test]
    fn test_new_starts_empty() {
        let m = Manager::new("test", Duration::from_secs(10), constant("x")).unwrap();
        assert_eq!(m.name(), "test");
        assert_eq!(m.interval(), Duration::from_secs(10));
        assert!(!m.has_value());
        assert!(m.try_value().is_none());
        assert_eq!(m.stats(), RefreshStats::default());
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let m = Manager::new("test", Duration::from_secs(1), constant("x")).unwrap();
        assert!(matches!(m.start(), Err(RuntimeError::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_token_scenario() {
        let m = Manager::with_config("test", quiet(Duration::from_millis(500)), constant("mock-token"))
            .unwrap();

        let reader = {
            let m = m.clone();
            tokio::spawn(async move { m.value().await })
        };
        let handle = m.start().unwrap();

        let started = Instant::now();
        let v = reader.await.unwrap();
        assert_eq!(v.as_str(), "mock-token");
        assert!(started.elapsed() < Duration::from_millis(50));
        assert!(m.has_value());

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_readers_block_through_failures_then_see_success() {
        let (g, calls) = flaky(2);
        let m = Manager::with_config("flaky", quiet(Duration::from_secs(1)), g).unwrap();

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let m = m.clone();
                tokio::spawn(async move { m.value().await })
            })
            .collect();

        let started = Instant::now();
        let handle = m.start().unwrap();

        for r in readers {
            assert_eq!(r.await.unwrap().as_str(), "ok-3");
        }
        // fail at t=0, fail at t=1s, success at t=2s
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let stats = m.stats();
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.failures, 2);
        assert_eq!(stats.consecutive_failures, 0);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_never_block_after_first_success() {
        // succeeds once, then fails forever
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let g: GeneratorRef<u64> = GenerateFn::arc(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    Ok(n)
                } else {
                    Err(RefreshError::fail("expired credentials"))
                }
            }
        });
        let m = Manager::with_config("stale", quiet(Duration::from_millis(100)), g).unwrap();
        let handle = m.start().unwrap();
        assert_eq!(*m.value().await, 1);

        sleep(Duration::from_millis(550)).await;
        assert!(calls.load(Ordering::SeqCst) >= 5);

        let v = timeout(Duration::from_millis(1), m.value())
            .await
            .expect("value() blocked after first success");
        assert_eq!(*v, 1);
        assert!(m.stats().consecutive_failures >= 4);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_values_never_come_from_the_future() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let g: GeneratorRef<u64> = GenerateFn::arc(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<_, RefreshError>(n) }
        });
        let m = Manager::with_config("seq", quiet(Duration::from_secs(1)), g).unwrap();
        let handle = m.start().unwrap();

        let mut last = 0;
        for k in 1..=5u64 {
            // just after tick k (ticks at 0s, 1s, ... so tick k is at (k-1)s)
            let v = *m.value().await;
            assert!(v >= 1 && v <= k, "tick {k}: got v{v}");
            assert!(v >= last);
            last = v;
            sleep(Duration::from_secs(1)).await;
        }

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_rejected() {
        let m = Manager::with_config("once", quiet(Duration::from_secs(1)), constant("x")).unwrap();
        let handle = m.start().unwrap();
        let err = m.clone().start().unwrap_err();
        assert!(matches!(err, RuntimeError::AlreadyStarted { ref name } if name == "once"));
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_publishes_scheduler_stopped() {
        let m = Manager::with_config("stop", quiet(Duration::from_secs(1)), constant("x")).unwrap();
        let mut rx = m.subscribe();
        let handle = m.start().unwrap();
        m.value().await;

        handle.stop().await;

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            assert_eq!(ev.manager.as_deref(), Some("stop"));
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::SchedulerStarted,
                EventKind::RefreshStarting,
                EventKind::RefreshSucceeded,
                EventKind::GateOpened,
                EventKind::SchedulerStopped,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_token_stops_loop() {
        let parent = CancellationToken::new();
        let m = Manager::with_config("child", quiet(Duration::from_secs(1)), constant("x")).unwrap();
        let handle = m.start_with(parent.child_token()).unwrap();
        m.value().await;

        parent.cancel();
        assert!(handle.is_cancelled());
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let g: GeneratorRef<String> = GenerateFn::arc(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    sleep(Duration::from_secs(3600)).await;
                }
                Ok::<_, RefreshError>(format!("v{n}"))
            }
        });
        let cfg = Config {
            timeout: Duration::from_millis(200),
            ..quiet(Duration::from_secs(1))
        };
        let m = Manager::with_config("slow", cfg, g).unwrap();
        let mut rx = m.subscribe();
        let handle = m.start().unwrap();

        assert_eq!(m.value().await.as_str(), "v2");
        handle.stop().await;

        let mut saw_timeout = false;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::TimeoutHit {
                assert_eq!(ev.timeout_ms, Some(200));
                assert_eq!(ev.attempt, Some(1));
                saw_timeout = true;
            }
        }
        assert!(saw_timeout);
        assert_eq!(m.stats().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_generator_is_contained() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let g: GeneratorRef<u64> = GenerateFn::arc(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    panic!("signing key missing");
                }
                Ok::<_, RefreshError>(n)
            }
        });
        let m = Manager::with_config("panics", quiet(Duration::from_secs(1)), g).unwrap();
        let handle = m.start().unwrap();

        assert_eq!(*m.value().await, 2);
        assert_eq!(m.stats().failures, 1);
        assert!(!handle.is_finished());
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_now_without_loop() {
        let (g, _calls) = flaky(1);
        let m = Manager::with_config("manual", quiet(Duration::from_secs(60)), g).unwrap();

        let err = m.refresh_now().await.unwrap_err();
        assert_eq!(err, RefreshError::fail("boom #1"));
        assert!(!m.has_value());

        m.refresh_now().await.unwrap();
        assert_eq!(m.try_value().unwrap().as_str(), "ok-2");
        assert!(m.has_value());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_now_serializes_with_loop() {
        let in_flight = Arc::new(AtomicU64::new(0));
        let overlaps = Arc::new(AtomicU64::new(0));
        let (f, o) = (Arc::clone(&in_flight), Arc::clone(&overlaps));
        let g: GeneratorRef<u64> = GenerateFn::arc(move || {
            let (f, o) = (Arc::clone(&f), Arc::clone(&o));
            async move {
                if f.fetch_add(1, Ordering::SeqCst) > 0 {
                    o.fetch_add(1, Ordering::SeqCst);
                }
                sleep(Duration::from_millis(300)).await;
                f.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, RefreshError>(1)
            }
        });
        let m = Manager::with_config("serial", quiet(Duration::from_millis(100)), g).unwrap();
        let handle = m.start().unwrap();

        let manual: Vec<_> = (0..3)
            .map(|_| {
                let m = m.clone();
                tokio::spawn(async move { m.refresh_now().await })
            })
            .collect();
        for h in manual {
            h.await.unwrap().unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        handle.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_readers_on_os_threads() {
        let g: GeneratorRef<String> = BlockingFn::arc(|| {
            std::thread::sleep(Duration::from_millis(50));
            Ok::<_, RefreshError>("from-thread".to_string())
        });
        let m = Manager::with_config("threads", quiet(Duration::from_secs(30)), g).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let m = m.clone();
                std::thread::spawn(move || m.blocking_value())
            })
            .collect();

        let handle = m.start().unwrap();
        for r in readers {
            assert_eq!(r.join().unwrap().as_str(), "from-thread");
        }
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_managers_are_isolated() {
        let a = Manager::with_config("a", quiet(Duration::from_secs(1)), constant("alpha")).unwrap();
        let b = Manager::with_config("b", quiet(Duration::from_secs(1)), constant("beta")).unwrap();

        let ha = a.start().unwrap();
        assert_eq!(a.value().await.as_str(), "alpha");
        assert!(!b.has_value());

        let hb = b.start().unwrap();
        assert_eq!(b.value().await.as_str(), "beta");
        assert_eq!(a.value().await.as_str(), "alpha");

        ha.stop().await;
        hb.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timed_out_blocking_calls_never_overlap() {
        let running = Arc::new(AtomicU32::new(0));
        let peak = Arc::new(AtomicU32::new(0));
        let (r, p) = (Arc::clone(&running), Arc::clone(&peak));
        let g: GeneratorRef<u32> = BlockingFn::arc(move || -> Result<u32, RefreshError> {
            let now = r.fetch_add(1, Ordering::SeqCst) + 1;
            p.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(300));
            r.fetch_sub(1, Ordering::SeqCst);
            Ok(now)
        });
        let cfg = Config {
            timeout: Duration::from_millis(50),
            ..quiet(Duration::from_millis(75))
        };
        let m = Manager::with_config("blocking-slow", cfg, g).unwrap();
        let handle = m.start().unwrap();

        sleep(Duration::from_millis(500)).await;
        let _ = m.refresh_now().await;
        sleep(Duration::from_millis(400)).await;
        handle.stop().await;

        assert!(m.stats().failures >= 2);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_finishes_when_listener_lags() {
        let m = Manager::builder("lagging")
            .interval(Duration::from_millis(10))
            .bus_capacity(1)
            .without_default_logging()
            .generator(constant("x"))
            .build()
            .unwrap();
        let handle = m.start().unwrap();

        let hammer = {
            let m = m.clone();
            tokio::spawn(async move {
                loop {
                    let _ = m.refresh_now().await;
                    tokio::task::yield_now().await;
                }
            })
        };
        sleep(Duration::from_millis(100)).await;

        let stopped = timeout(Duration::from_secs(3), handle.stop()).await;
        hammer.abort();
        assert!(stopped.is_ok(), "stop() did not return");
    }
}
