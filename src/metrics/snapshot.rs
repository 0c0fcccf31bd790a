use serde::Serialize;

/// Number of samples in the traffic chart.
pub const HISTORY_LEN: usize = 12;

/// One immutable set of dashboard values produced by a single tick.
/// Shared with observers as `Arc<MetricsSnapshot>`; nobody mutates it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// 0 for the initial values, +1 for every produced snapshot
    pub sequence: u64,
    pub visitor_count: u64,
    pub load_time_seconds: f64,
    pub bandwidth_percent: u32,
    /// Rolling chart window, oldest sample first
    pub history: [u32; HISTORY_LEN],
}

impl MetricsSnapshot {
    /// Values every fresh feed starts from.
    pub fn initial() -> Self {
        Self {
            sequence: 0,
            visitor_count: 12_540,
            load_time_seconds: 0.42,
            bandwidth_percent: 45,
            history: [40, 60, 30, 80, 50, 90, 70, 45, 65, 85, 55, 95],
        }
    }

    /// Most recent chart sample.
    pub fn latest_sample(&self) -> u32 {
        self.history[HISTORY_LEN - 1]
    }
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}
