use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::FeedError;

/// Default cadence of the dashboard feed (one snapshot every 2 s).
pub const DEFAULT_CADENCE_MS: u64 = 2_000;

// ─── Feed configuration ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    /// Interval between two snapshots, in milliseconds
    #[serde(default = "default_cadence_ms")]
    pub cadence_ms: u64,

    /// Fixed RNG seed; `None` draws from OS entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_cadence_ms() -> u64 {
    DEFAULT_CADENCE_MS
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cadence_ms: default_cadence_ms(),
            seed: None,
        }
    }
}

impl FeedConfig {
    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }

    /// Rejects a cadence that is not a positive duration.
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.cadence_ms == 0 {
            return Err(FeedError::InvalidConfiguration(
                "cadence_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

// ─── Server configuration ────────────────────────────────────────

/// Everything the binary needs to serve the dashboard.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub feed: FeedConfig,
    /// Directory served as the fallback for non-API paths
    pub static_dir: Option<PathBuf>,
    /// Start the feed at boot instead of waiting for the view
    pub autostart: bool,
}
