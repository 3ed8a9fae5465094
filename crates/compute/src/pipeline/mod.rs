//! Detection pipeline for a single product/category series.
//!
//! - **Trend**: per-window rank trends anchored at the newest snapshot.
//! - **Threshold**: tiered absolute gate OR percentage gate, behind a
//!   consistency floor.
//! - **Selector**: at most one trend per series, classified surge or steady.
//! - **Severity**: 0-100 score banded into [`Severity`].
//! - **Auxiliary**: price, review and stock checks on the last two snapshots.

pub mod auxiliary;
pub mod metrics;
pub mod selector;
pub mod severity;
pub mod threshold;
pub mod trend;

use chrono::{DateTime, Utc};
use tracing::info;

use rankwatch_core::{CategoryId, Event, EventType, EvidenceWindow, ProductId, Severity, Snapshot};
use rankwatch_rules::CompiledDetectionConfig;

pub use self::auxiliary::{
    check_price_change, check_review_surge, check_stock_change, detect_auxiliary,
};
pub use self::metrics::RunReport;
pub use self::selector::{select_trend, Selection, SelectionRule};
pub use self::severity::{score_severity, severity_band, severity_score};
pub use self::threshold::{Gate, ThresholdPolicy};
pub use self::trend::{calculate_trend, trends_by_window, Trend, TrendDirection};

/// Identity and clock shared by every event raised for one series.
#[derive(Debug, Clone, Copy)]
pub struct EventContext {
    pub product_id: ProductId,
    pub category_id: CategoryId,
    pub detected_at: DateTime<Utc>,
    pub evidence: EvidenceWindow,
}

impl EventContext {
    pub fn event(&self, event_type: EventType, severity: Severity) -> Event {
        Event::new(
            self.product_id,
            self.category_id,
            event_type,
            severity,
            self.detected_at,
            self.evidence,
        )
    }
}

/// Turn a selected trend into a rank event.
pub fn rank_event(selection: &Selection, ctx: &EventContext) -> Event {
    let trend = &selection.trend;
    let severity = score_severity(trend.total_change, trend.end_rank, trend.consistency);

    Event {
        prev_rank: Some(trend.start_rank),
        curr_rank: Some(trend.end_rank),
        rank_change: Some(-trend.total_change),
        rank_change_pct: ThresholdPolicy::change_pct(trend),
        trend_window_hours: Some(trend.window_hours),
        trend_consistency: Some(trend.consistency),
        ..ctx.event(selection.event_type, severity)
    }
}

/// Run every detector over one time-sorted series.
///
/// Yields at most one rank event followed by up to three auxiliary events.
pub fn detect_series(
    sorted: &[Snapshot],
    config: &CompiledDetectionConfig,
    policy: &ThresholdPolicy,
    ctx: &EventContext,
) -> Vec<Event> {
    let mut events = Vec::new();

    let trends = trends_by_window(sorted, config);
    if let Some(selection) = select_trend(&trends, policy, config) {
        let event = rank_event(&selection, ctx);
        info!(
            product_id = ctx.product_id,
            category_id = ctx.category_id,
            event_type = %event.event_type,
            severity = %event.severity,
            window_hours = selection.trend.window_hours,
            prev_rank = selection.trend.start_rank,
            curr_rank = selection.trend.end_rank,
            consistency = selection.trend.consistency,
            rule = ?selection.rule,
            gate = ?policy.gate(&selection.trend),
            "rank event"
        );
        events.push(event);
    }

    events.extend(detect_auxiliary(sorted, config, ctx));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rankwatch_core::StockStatus;
    use rust_decimal::Decimal;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap()
    }

    fn snap(rank: u32, hours: i64) -> Snapshot {
        Snapshot {
            product_id: 3,
            category_id: 30,
            rank,
            price: None,
            rating: None,
            review_count: None,
            is_prime: false,
            stock_status: StockStatus::InStock,
            collected_at: t0() + Duration::hours(hours),
        }
    }

    fn ctx() -> EventContext {
        EventContext {
            product_id: 3,
            category_id: 30,
            detected_at: t0() + Duration::hours(12),
            evidence: EvidenceWindow::default(),
        }
    }

    #[test]
    fn rank_event_fields_trace_the_trend() {
        let cfg = CompiledDetectionConfig::default();
        let policy = ThresholdPolicy::from_config(&cfg);
        let series = vec![snap(80, 0), snap(55, 4), snap(30, 8), snap(25, 12)];

        let events = detect_series(&series, &cfg, &policy, &ctx());
        assert_eq!(events.len(), 1);

        let ev = &events[0];
        assert_eq!(ev.event_type, EventType::RankSurge);
        assert_eq!(ev.severity, Severity::High);
        assert_eq!(ev.prev_rank, Some(80));
        assert_eq!(ev.curr_rank, Some(25));
        assert_eq!(ev.rank_change, Some(-55));
        assert_eq!(ev.rank_change_pct, Some(55.0 / 80.0 * 100.0));
        assert_eq!(ev.trend_window_hours, Some(12));
        assert_eq!(ev.trend_consistency, Some(1.0));
        assert_eq!(ev.time_window_start, ctx().detected_at - Duration::days(7));
        assert_eq!(ev.time_window_end, ctx().detected_at + Duration::days(3));
        assert!(!ev.context_collected);
        assert!(!ev.insight_generated);
    }

    #[test]
    fn aux_events_follow_the_rank_event() {
        let cfg = CompiledDetectionConfig::default();
        let policy = ThresholdPolicy::from_config(&cfg);
        let mut series = vec![snap(80, 0), snap(55, 4), snap(30, 8), snap(25, 12)];
        series[2].price = Some(Decimal::new(1000, 2));
        series[3].price = Some(Decimal::new(1500, 2));

        let kinds: Vec<EventType> = detect_series(&series, &cfg, &policy, &ctx())
            .iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(kinds, vec![EventType::RankSurge, EventType::PriceChange]);
    }
}
