use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::policy;
use super::snapshot::MetricsSnapshot;
use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::random::{self, RandomSource};

/// Callback invoked with every new snapshot.
pub type Observer = Arc<dyn Fn(Arc<MetricsSnapshot>) + Send + Sync>;

/// Epoch value meaning "not running".
const IDLE: u64 = 0;

// ─── Public types ────────────────────────────────────────────────

/// Simulated live dashboard metrics.
///
/// One Tokio task per running period advances the snapshot every
/// `cadence` and pushes it to observers in registration order.
/// `start()` and `stop()` may be called from any thread (or from inside an
/// observer), and once `stop()` returns no observer will be called again
/// until the next `start()`.
pub struct LiveMetricsFeed {
    shared: Arc<Shared>,
    cadence: Duration,
    runtime: Handle,
    /// Worker of the current epoch; also serializes start/stop
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// Handle returned by [`LiveMetricsFeed::subscribe`].
/// Dropping it unsubscribes the observer.
#[must_use = "dropping a Subscription unsubscribes the observer immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

/// Guard from [`LiveMetricsFeed::scoped`]; stops the feed when dropped.
#[must_use = "dropping an ActiveFeed stops the feed immediately"]
pub struct ActiveFeed<'a> {
    feed: &'a LiveMetricsFeed,
}

// ─── Internal state ──────────────────────────────────────────────

struct Shared {
    /// Held for the whole of a tick, including the notification pass.
    /// Re-entrant so an observer may call `stop()` on its own feed.
    gate: ReentrantMutex<()>,
    /// Epoch allowed to tick; `IDLE` when stopped
    active_epoch: AtomicU64,
    next_epoch: AtomicU64,
    state: Mutex<FeedState>,
    observers: Arc<Mutex<Registry>>,
}

struct FeedState {
    current: Arc<MetricsSnapshot>,
    rng: Box<dyn RandomSource>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, Observer)>,
}

// ─── LiveMetricsFeed impl ────────────────────────────────────────

impl LiveMetricsFeed {
    /// Build a feed from `config`, seeding the generator from
    /// `config.seed` when present.
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        Self::build(config, random::source_for(config.seed))
    }

    /// Build a feed drawing from the given random source.
    pub fn with_source(
        config: &FeedConfig,
        source: impl RandomSource,
    ) -> Result<Self, FeedError> {
        Self::build(config, Box::new(source))
    }

    fn build(
        config: &FeedConfig,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, FeedError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| FeedError::NoRuntime)?;

        Ok(Self {
            shared: Arc::new(Shared {
                gate: ReentrantMutex::new(()),
                active_epoch: AtomicU64::new(IDLE),
                next_epoch: AtomicU64::new(IDLE),
                state: Mutex::new(FeedState {
                    current: Arc::new(MetricsSnapshot::initial()),
                    rng,
                }),
                observers: Arc::new(Mutex::new(Registry::default())),
            }),
            cadence: config.cadence(),
            runtime,
            worker: Mutex::new(None),
        })
    }

    /// Begin ticking. No-op when already running.
    pub fn start(&self) {
        let mut worker = self.worker.lock();
        if self.shared.active_epoch.load(Ordering::SeqCst) != IDLE {
            return;
        }

        let epoch = self.shared.next_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.active_epoch.store(epoch, Ordering::SeqCst);

        let shared = self.shared.clone();
        let cadence = self.cadence;
        // First snapshot lands one full cadence after start.
        let first = Instant::now() + cadence;
        *worker = Some(self.runtime.spawn(run(shared, first, cadence, epoch)));

        info!(epoch, cadence_ms = cadence.as_millis() as u64, "live metrics feed started");
    }

    /// Stop ticking. No-op when already stopped.
    ///
    /// A tick running on another thread finishes its notification pass
    /// before this returns; nothing is delivered afterwards.
    pub fn stop(&self) {
        let handle = {
            let mut worker = self.worker.lock();
            let epoch = self.shared.active_epoch.swap(IDLE, Ordering::SeqCst);
            if epoch == IDLE {
                return;
            }
            info!(epoch, "live metrics feed stopped");
            worker.take()
        };

        if let Some(handle) = handle {
            handle.abort();
        }

        // Wait out any tick that read the old epoch before the swap.
        drop(self.shared.gate.lock());
    }

    /// Start the feed and stop it again when the guard goes out of scope.
    pub fn scoped(&self) -> ActiveFeed<'_> {
        self.start();
        ActiveFeed { feed: self }
    }

    pub fn is_running(&self) -> bool {
        self.shared.active_epoch.load(Ordering::SeqCst) != IDLE
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Latest snapshot, or the initial values if nothing ticked yet.
    pub fn current_snapshot(&self) -> Arc<MetricsSnapshot> {
        self.shared.state.lock().current.clone()
    }

    /// Register `observer` for every future snapshot.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(Arc<MetricsSnapshot>) + Send + Sync + 'static,
    {
        let mut registry = self.shared.observers.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.entries.push((id, Arc::new(observer)));
        debug!(id, observers = registry.entries.len(), "observer subscribed");

        Subscription {
            id,
            registry: Arc::downgrade(&self.shared.observers),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.shared.observers.lock().entries.len()
    }
}

impl Drop for LiveMetricsFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

// ─── Worker loop ─────────────────────────────────────────────────

async fn run(shared: Arc<Shared>, first: Instant, cadence: Duration, epoch: u64) {
    let mut interval = tokio::time::interval_at(first, cadence);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if !shared.tick(epoch) {
            debug!(epoch, "worker exiting on stale epoch");
            return;
        }
    }
}

impl Shared {
    /// Advance one step and notify. Returns false once `epoch` is no
    /// longer the active one.
    fn tick(&self, epoch: u64) -> bool {
        let _gate = self.gate.lock();
        if self.active_epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }

        let next = {
            let mut state = self.state.lock();
            let FeedState { current, rng } = &mut *state;
            let next = Arc::new(policy::advance(current, &mut **rng));
            *current = next.clone();
            next
        };

        // Copy the list so observers can (un)subscribe from their callback.
        let observers: Vec<Observer> = self
            .observers
            .lock()
            .entries
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();

        debug!(
            sequence = next.sequence,
            observers = observers.len(),
            "metrics tick"
        );

        for observer in observers {
            observer(next.clone());
        }
        true
    }
}

// ─── Subscription / ActiveFeed ───────────────────────────────────

impl Subscription {
    /// Remove the observer. Same as dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // The feed may already be gone.
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock();
            registry.entries.retain(|(id, _)| *id != self.id);
            debug!(id = self.id, observers = registry.entries.len(), "observer unsubscribed");
        }
    }
}

impl ActiveFeed<'_> {
    pub fn feed(&self) -> &LiveMetricsFeed {
        self.feed
    }
}

impl Drop for ActiveFeed<'_> {
    fn drop(&mut self) {
        self.feed.stop();
    }
}
