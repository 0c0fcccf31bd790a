use serde::Serialize;

use super::snapshot::MetricsSnapshot;

/// Load time that fills the whole progress bar.
const LOAD_TIME_FULL_SCALE: f64 = 2.0;

/// Server status card; a fixed 30-day figure, not simulated.
const UPTIME_30_DAYS: &str = "99.99%";

/// Display-ready version of a snapshot, as the dashboard cards show it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub sequence: u64,
    /// e.g. "12,540"
    pub visitors: String,
    /// e.g. "0.42s"
    pub load_time: String,
    pub load_time_bar_percent: f64,
    /// e.g. "45%"
    pub bandwidth: String,
    pub bandwidth_bar_percent: u32,
    /// e.g. "99.99%"
    pub uptime: String,
    /// Bar heights (percent of the chart area), oldest first
    pub chart: Vec<u32>,
    /// Hit count shown in each bar's tooltip (`h * 12.5`, rounded down)
    pub chart_hits: Vec<u64>,
}

impl DashboardView {
    pub fn from_snapshot(snap: &MetricsSnapshot) -> Self {
        Self {
            sequence: snap.sequence,
            visitors: group_thousands(snap.visitor_count),
            load_time: format!("{:.2}s", snap.load_time_seconds),
            load_time_bar_percent: (snap.load_time_seconds / LOAD_TIME_FULL_SCALE
                * 100.0)
                .clamp(0.0, 100.0),
            bandwidth: format!("{}%", snap.bandwidth_percent),
            bandwidth_bar_percent: snap.bandwidth_percent.min(100),
            uptime: UPTIME_30_DAYS.to_string(),
            chart: snap.history.iter().map(|&h| h.min(100)).collect(),
            chart_hits: snap.history.iter().map(|&h| bar_hits(h)).collect(),
        }
    }
}

fn bar_hits(height: u32) -> u64 {
    u64::from(height) * 25 / 2
}

/// 1234567 → "1,234,567"
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
