use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use rankwatch_core::Snapshot;
use rankwatch_rules::CompiledDetectionConfig;

/// Direction of rank movement over a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Rank number went down (the product climbed).
    Rising,
    /// Rank number went up (the product slid).
    Falling,
    Stable,
}

/// Summary of rank movement inside one time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub window_hours: u32,
    pub direction: TrendDirection,
    /// `start_rank - end_rank`; positive means the product improved.
    pub total_change: i64,
    pub start_rank: u32,
    pub end_rank: u32,
    /// Fraction of non-zero moves agreeing with the overall direction.
    pub consistency: f64,
    pub avg_change_per_hour: f64,
    pub data_points: usize,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl Trend {
    pub fn magnitude(&self) -> i64 {
        self.total_change.abs()
    }
}

/// Reduce snapshots to a [`Trend`].
///
/// Input order is not trusted. Returns `None` with fewer than two (or fewer
/// than `min_data_points`) snapshots, or when the rank never moved.
pub fn calculate_trend(
    window_hours: u32,
    snapshots: &[Snapshot],
    min_data_points: usize,
) -> Option<Trend> {
    let mut sorted: Vec<&Snapshot> = snapshots.iter().collect();
    sorted.sort_by_key(|s| s.collected_at);
    trend_from_sorted(window_hours, &sorted, min_data_points)
}

fn trend_from_sorted(
    window_hours: u32,
    sorted: &[&Snapshot],
    min_data_points: usize,
) -> Option<Trend> {
    if sorted.len() < 2 || sorted.len() < min_data_points {
        return None;
    }

    let first = sorted[0];
    let last = sorted[sorted.len() - 1];
    let total_change = i64::from(first.rank) - i64::from(last.rank);

    // Sign of every non-zero step, +1 for an improvement.
    let signs: Vec<i64> = sorted
        .windows(2)
        .map(|pair| (i64::from(pair[0].rank) - i64::from(pair[1].rank)).signum())
        .filter(|&s| s != 0)
        .collect();

    if signs.is_empty() {
        return None;
    }

    let primary = if total_change > 0 { 1 } else { -1 };
    let agreeing = signs.iter().filter(|&&s| s == primary).count();
    let consistency = agreeing as f64 / signs.len() as f64;

    let elapsed_hours =
        (last.collected_at - first.collected_at).num_milliseconds() as f64 / 3_600_000.0;
    let avg_change_per_hour = if elapsed_hours > 0.0 {
        total_change.abs() as f64 / elapsed_hours
    } else {
        0.0
    };

    let direction = match total_change {
        c if c > 0 => TrendDirection::Rising,
        c if c < 0 => TrendDirection::Falling,
        _ => TrendDirection::Stable,
    };

    Some(Trend {
        window_hours,
        direction,
        total_change,
        start_rank: first.rank,
        end_rank: last.rank,
        consistency,
        avg_change_per_hour,
        data_points: sorted.len(),
        started_at: first.collected_at,
        ended_at: last.collected_at,
    })
}

/// Compute a trend for every configured window the history can support.
///
/// Windows are anchored at the newest snapshot. A window is only evaluated
/// when its first snapshot lands within one scrape interval of the window
/// start and the slice holds at least `trend_min_data_points` snapshots.
pub fn trends_by_window(
    snapshots: &[Snapshot],
    config: &CompiledDetectionConfig,
) -> BTreeMap<u32, Trend> {
    let mut trends = BTreeMap::new();

    let mut sorted: Vec<&Snapshot> = snapshots.iter().collect();
    sorted.sort_by_key(|s| s.collected_at);

    let Some(anchor) = sorted.last().map(|s| s.collected_at) else {
        return trends;
    };
    let tolerance = Duration::hours(i64::from(config.scrape_interval_hours));

    for &window_hours in &config.trend_windows_hours {
        let window_start = anchor - Duration::hours(i64::from(window_hours));

        let from = sorted.partition_point(|s| s.collected_at < window_start);
        let slice = &sorted[from..];

        let Some(first) = slice.first().map(|s| s.collected_at) else {
            continue;
        };
        if first > window_start + tolerance {
            debug!(window_hours, %first, %window_start, "history does not span window");
            continue;
        }

        if slice.len() < config.trend_min_data_points {
            debug!(window_hours, points = slice.len(), "not enough points in window");
            continue;
        }

        match trend_from_sorted(window_hours, slice, config.trend_min_data_points) {
            Some(trend) => {
                debug!(
                    window_hours,
                    total_change = trend.total_change,
                    consistency = trend.consistency,
                    points = trend.data_points,
                    "window trend"
                );
                trends.insert(window_hours, trend);
            }
            None => debug!(window_hours, "flat window"),
        }
    }

    trends
}
