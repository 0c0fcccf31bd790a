//! Bounded random walk applied to the dashboard on every tick.
//!
//! Draw order is fixed (visitors, load time, bandwidth, chart sample) so a
//! seeded [`RandomSource`] replays the exact same sequence of snapshots.

use std::ops::RangeInclusive;

use super::snapshot::{MetricsSnapshot, HISTORY_LEN};
use crate::random::RandomSource;

// ─── Step ranges ─────────────────────────────────────────────────

/// Visitors drift upward: -2 ..= +7 per tick
pub const VISITOR_DELTA: RangeInclusive<i64> = -2..=7;

/// Load time moves by at most ±50 ms
pub const LOAD_TIME_STEP: f64 = 0.05;
pub const LOAD_TIME_MIN: f64 = 0.1;
pub const LOAD_TIME_MAX: f64 = 1.5;

pub const BANDWIDTH_DELTA: RangeInclusive<i64> = -2..=2;
pub const BANDWIDTH_MIN: u32 = 10;
pub const BANDWIDTH_MAX: u32 = 90;

/// Chart samples drawn by the feed
pub const SAMPLE_RANGE: RangeInclusive<i64> = 20..=79;

// ─── Step function ───────────────────────────────────────────────

/// Compute the snapshot following `prev`.
///
/// Every bounded value is clamped in the same expression that moves it,
/// so no intermediate state ever leaves its range.
pub fn advance(prev: &MetricsSnapshot, rng: &mut dyn RandomSource) -> MetricsSnapshot {
    let visitor_delta = rng.int_inclusive(*VISITOR_DELTA.start(), *VISITOR_DELTA.end());
    let load_delta = rng.float_between(-LOAD_TIME_STEP, LOAD_TIME_STEP);
    let bandwidth_delta =
        rng.int_inclusive(*BANDWIDTH_DELTA.start(), *BANDWIDTH_DELTA.end());
    let sample = rng.int_inclusive(*SAMPLE_RANGE.start(), *SAMPLE_RANGE.end());

    MetricsSnapshot {
        sequence: prev.sequence + 1,
        visitor_count: prev.visitor_count.saturating_add_signed(visitor_delta),
        load_time_seconds: (prev.load_time_seconds + load_delta)
            .clamp(LOAD_TIME_MIN, LOAD_TIME_MAX),
        bandwidth_percent: (i64::from(prev.bandwidth_percent) + bandwidth_delta)
            .clamp(i64::from(BANDWIDTH_MIN), i64::from(BANDWIDTH_MAX))
            as u32,
        history: roll(&prev.history, sample as u32),
    }
}

/// Drop the oldest sample and append `sample`.
fn roll(history: &[u32; HISTORY_LEN], sample: u32) -> [u32; HISTORY_LEN] {
    let mut next = *history;
    next.rotate_left(1);
    next[HISTORY_LEN - 1] = sample;
    next
}
