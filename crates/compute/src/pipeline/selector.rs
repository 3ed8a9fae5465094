use std::collections::BTreeMap;

use serde::Serialize;

use rankwatch_core::EventType;
use rankwatch_rules::CompiledDetectionConfig;

use super::threshold::ThresholdPolicy;
use super::trend::Trend;

/// Which precedence rule picked the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRule {
    SteadyWindow,
    SurgeWindow,
    LongestPassing,
}

/// The single trend chosen to represent a product/category pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub trend: Trend,
    pub event_type: EventType,
    pub rule: SelectionRule,
}

fn steady_type(trend: &Trend) -> EventType {
    if trend.total_change > 0 {
        EventType::SteadyRise
    } else {
        EventType::SteadyDecline
    }
}

fn surge_type(trend: &Trend) -> EventType {
    if trend.total_change > 0 {
        EventType::RankSurge
    } else {
        EventType::RankDrop
    }
}

/// Pick at most one passing trend and classify it.
///
/// Precedence: the steady window when it passes with the steady consistency
/// floor, then the surge window, then the longest passing window (steady
/// only if it is at least the steady length and meets the floor).
pub fn select_trend(
    trends: &BTreeMap<u32, Trend>,
    policy: &ThresholdPolicy,
    config: &CompiledDetectionConfig,
) -> Option<Selection> {
    let passing = |window: u32| trends.get(&window).filter(|t| policy.passes(t));

    if let Some(trend) = passing(config.steady_window_hours)
        .filter(|t| t.consistency >= config.steady_consistency_min)
    {
        return Some(Selection {
            event_type: steady_type(trend),
            trend: trend.clone(),
            rule: SelectionRule::SteadyWindow,
        });
    }

    if let Some(trend) = passing(config.surge_window_hours) {
        return Some(Selection {
            event_type: surge_type(trend),
            trend: trend.clone(),
            rule: SelectionRule::SurgeWindow,
        });
    }

    let (&window, trend) = trends.iter().rev().find(|(_, t)| policy.passes(t))?;
    let steady =
        window >= config.steady_window_hours && trend.consistency >= config.steady_consistency_min;

    Some(Selection {
        event_type: if steady {
            steady_type(trend)
        } else {
            surge_type(trend)
        },
        trend: trend.clone(),
        rule: SelectionRule::LongestPassing,
    })
}
