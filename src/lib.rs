use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod random;
pub mod server;

pub use config::{FeedConfig, ServerConfig};
pub use error::FeedError;
pub use metrics::{LiveMetricsFeed, MetricsSnapshot, Subscription};
pub use random::RandomSource;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Feed behind the dashboard. A fresh one is installed every time the
    /// view opens.
    feed: RwLock<Arc<LiveMetricsFeed>>,
    /// Configuration for the next fresh feed. Its lock also serializes
    /// opening and closing the view.
    config: Mutex<FeedConfig>,
}

impl AppState {
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let feed = LiveMetricsFeed::new(&config)?;
        Ok(Self {
            feed: RwLock::new(Arc::new(feed)),
            config: Mutex::new(config),
        })
    }

    /// Feed currently serving the dashboard.
    pub fn feed(&self) -> Arc<LiveMetricsFeed> {
        self.feed.read().clone()
    }

    /// Configuration the next fresh feed will be built from.
    pub fn config(&self) -> FeedConfig {
        self.config.lock().clone()
    }

    /// Held while the view is opened or closed.
    pub(crate) fn lifecycle(&self) -> MutexGuard<'_, FeedConfig> {
        self.config.lock()
    }

    /// Install `feed`, returning the one it replaces.
    pub(crate) fn replace_feed(&self, feed: LiveMetricsFeed) -> Arc<LiveMetricsFeed> {
        std::mem::replace(&mut *self.feed.write(), Arc::new(feed))
    }
}
