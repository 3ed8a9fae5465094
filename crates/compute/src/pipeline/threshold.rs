use serde::Serialize;

use rankwatch_rules::{CompiledDetectionConfig, RankTier};

use super::trend::Trend;

/// Which gate admitted a trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    Absolute,
    Percentage,
}

/// Decides whether a trend is significant enough to become an event.
///
/// A trend must be consistent enough, then clear either the tiered absolute
/// gate (keyed by the rank it ended at) or, when hybrid mode is on, the
/// percentage gate.
#[derive(Debug, Clone)]
pub struct ThresholdPolicy {
    tiers: Vec<RankTier>,
    unranked_threshold: u32,
    change_pct_threshold: f64,
    use_hybrid: bool,
    consistency_threshold: f64,
}

impl ThresholdPolicy {
    pub fn from_config(config: &CompiledDetectionConfig) -> Self {
        Self {
            tiers: config.rank_thresholds.clone(),
            unranked_threshold: config.unranked_threshold,
            change_pct_threshold: config.rank_change_pct_threshold,
            use_hybrid: config.use_hybrid_threshold,
            consistency_threshold: config.trend_consistency_threshold,
        }
    }

    /// Minimum absolute rank change required for a trend ending at `rank`.
    pub fn threshold_for_rank(&self, rank: u32) -> u32 {
        self.tiers
            .iter()
            .find(|tier| tier.contains(rank))
            .map(|tier| tier.threshold)
            .unwrap_or(self.unranked_threshold)
    }

    /// Rank change as a percentage of the starting rank.
    pub fn change_pct(trend: &Trend) -> Option<f64> {
        (trend.start_rank > 0)
            .then(|| trend.magnitude() as f64 / f64::from(trend.start_rank) * 100.0)
    }

    /// The gate the trend clears, if any.
    pub fn gate(&self, trend: &Trend) -> Option<Gate> {
        if trend.total_change == 0 || trend.consistency < self.consistency_threshold {
            return None;
        }

        if trend.magnitude() >= i64::from(self.threshold_for_rank(trend.end_rank)) {
            return Some(Gate::Absolute);
        }

        if self.use_hybrid {
            if let Some(pct) = Self::change_pct(trend) {
                if pct >= self.change_pct_threshold {
                    return Some(Gate::Percentage);
                }
            }
        }

        None
    }

    pub fn passes(&self, trend: &Trend) -> bool {
        self.gate(trend).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::trend::TrendDirection;
    use chrono::{TimeZone, Utc};

    fn trend(start_rank: u32, end_rank: u32, consistency: f64) -> Trend {
        let total_change = i64::from(start_rank) - i64::from(end_rank);
        let at = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        Trend {
            window_hours: 6,
            direction: if total_change > 0 {
                TrendDirection::Rising
            } else {
                TrendDirection::Falling
            },
            total_change,
            start_rank,
            end_rank,
            consistency,
            avg_change_per_hour: 0.0,
            data_points: 4,
            started_at: at,
            ended_at: at,
        }
    }

    fn policy() -> ThresholdPolicy {
        ThresholdPolicy::from_config(&CompiledDetectionConfig::default())
    }

    #[test]
    fn tier_lookup() {
        let p = policy();
        assert_eq!(p.threshold_for_rank(1), 2);
        assert_eq!(p.threshold_for_rank(5), 2);
        assert_eq!(p.threshold_for_rank(6), 3);
        assert_eq!(p.threshold_for_rank(20), 5);
        assert_eq!(p.threshold_for_rank(25), 7);
        assert_eq!(p.threshold_for_rank(50), 10);
        assert_eq!(p.threshold_for_rank(100), 15);
    }

    #[test]
    fn beyond_last_tier_uses_unranked_threshold() {
        assert_eq!(policy().threshold_for_rank(150), 15);
        assert_eq!(policy().threshold_for_rank(10_000), 15);
    }

    #[test]
    fn absolute_gate() {
        // Ends at 18 -> threshold 5; ends at 25 -> threshold 7.
        assert_eq!(policy().gate(&trend(25, 18, 1.0)), Some(Gate::Absolute));
        assert_eq!(policy().gate(&trend(18, 25, 1.0)), Some(Gate::Absolute));
    }

    #[test]
    fn top_rank_small_move_passes() {
        // 3 -> 1: absolute 2 >= 2.
        assert!(policy().passes(&trend(3, 1, 1.0)));
    }

    #[test]
    fn percentage_gate_when_absolute_fails() {
        // Ends at 6 -> threshold 3; a 2-place move misses it and 2/8 = 25% < 30%.
        assert_eq!(policy().gate(&trend(8, 6, 1.0)), None);
        // Ends at 3 -> one place misses threshold 2 and is only 25%.
        assert_eq!(policy().gate(&trend(4, 3, 1.0)), None);
        // 3 -> 2 misses threshold 2 but moves 33%.
        assert_eq!(policy().gate(&trend(3, 2, 1.0)), Some(Gate::Percentage));
    }

    #[test]
    fn first_tier_boundary() {
        assert_eq!(policy().gate(&trend(7, 5, 1.0)), Some(Gate::Absolute));
        // One place into rank 5 fails the tier and 1/6 misses 30%...
        assert_eq!(policy().gate(&trend(6, 5, 1.0)), None);
        // ...but the percentage gate still gets its say.
        let cfg = CompiledDetectionConfig {
            rank_change_pct_threshold: 15.0,
            ..CompiledDetectionConfig::default()
        };
        assert_eq!(
            ThresholdPolicy::from_config(&cfg).gate(&trend(6, 5, 1.0)),
            Some(Gate::Percentage)
        );
    }

    #[test]
    fn hybrid_off_disables_percentage_gate() {
        let cfg = CompiledDetectionConfig {
            use_hybrid_threshold: false,
            ..CompiledDetectionConfig::default()
        };
        assert!(!ThresholdPolicy::from_config(&cfg).passes(&trend(3, 2, 1.0)));
    }

    #[test]
    fn consistency_is_a_hard_precondition() {
        // Huge move, but too erratic.
        assert!(!policy().passes(&trend(90, 10, 0.5)));
        assert!(policy().passes(&trend(90, 10, 0.6)));
    }

    #[test]
    fn zero_change_never_passes() {
        let cfg = CompiledDetectionConfig {
            rank_change_pct_threshold: 0.0,
            ..CompiledDetectionConfig::default()
        };
        assert!(!ThresholdPolicy::from_config(&cfg).passes(&trend(10, 10, 1.0)));
    }

    #[test]
    fn change_pct_of_start_rank() {
        assert_eq!(ThresholdPolicy::change_pct(&trend(50, 25, 1.0)), Some(50.0));
        assert_eq!(ThresholdPolicy::change_pct(&trend(20, 30, 1.0)), Some(50.0));
    }
}
