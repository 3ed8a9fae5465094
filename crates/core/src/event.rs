use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{CategoryId, ProductId};
use crate::snapshot::StockStatus;

/// Kind of a detected ranking event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Short-window rank improvement.
    RankSurge,
    /// Short-window rank loss.
    RankDrop,
    /// Long, consistent rank improvement.
    SteadyRise,
    /// Long, consistent rank loss.
    SteadyDecline,
    PriceChange,
    ReviewSurge,
    StockChange,
}

impl EventType {
    /// True for the four rank-trend event kinds.
    pub fn is_rank_event(self) -> bool {
        matches!(
            self,
            EventType::RankSurge
                | EventType::RankDrop
                | EventType::SteadyRise
                | EventType::SteadyDecline
        )
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventType::RankSurge => "RANK_SURGE",
            EventType::RankDrop => "RANK_DROP",
            EventType::SteadyRise => "STEADY_RISE",
            EventType::SteadyDecline => "STEADY_DECLINE",
            EventType::PriceChange => "PRICE_CHANGE",
            EventType::ReviewSurge => "REVIEW_SURGE",
            EventType::StockChange => "STOCK_CHANGE",
        };
        write!(f, "{s}")
    }
}

/// Event severity. Ordered so that `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All severities, most severe first.
    pub const DESCENDING: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Span around `detected_at` that downstream context collection scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceWindow {
    pub lookback_days: u32,
    pub lookforward_days: u32,
}

impl Default for EvidenceWindow {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            lookforward_days: 3,
        }
    }
}

impl EvidenceWindow {
    pub fn bounds(&self, detected_at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            detected_at - Duration::days(i64::from(self.lookback_days)),
            detected_at + Duration::days(i64::from(self.lookforward_days)),
        )
    }
}

/// An unsaved detection result.
///
/// Only the fields relevant to `event_type` are populated. `context_collected`
/// and `insight_generated` start out false and are flipped by downstream
/// consumers, never by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub product_id: ProductId,
    pub category_id: CategoryId,
    pub event_type: EventType,
    pub severity: Severity,

    // Rank movement
    pub prev_rank: Option<u32>,
    pub curr_rank: Option<u32>,
    /// `curr_rank - prev_rank`; positive means the product dropped.
    pub rank_change: Option<i64>,
    pub rank_change_pct: Option<f64>,
    pub trend_window_hours: Option<u32>,
    pub trend_consistency: Option<f64>,

    // Price movement
    pub prev_price: Option<Decimal>,
    pub curr_price: Option<Decimal>,
    pub price_change_pct: Option<f64>,

    // Review movement
    pub prev_review_count: Option<u32>,
    pub curr_review_count: Option<u32>,
    pub review_change: Option<i64>,

    // Stock movement
    pub prev_stock_status: Option<StockStatus>,
    pub curr_stock_status: Option<StockStatus>,

    pub detected_at: DateTime<Utc>,
    pub time_window_start: DateTime<Utc>,
    pub time_window_end: DateTime<Utc>,

    #[serde(default)]
    pub context_collected: bool,
    #[serde(default)]
    pub insight_generated: bool,
}

impl Event {
    /// Event skeleton with every movement field empty.
    pub fn new(
        product_id: ProductId,
        category_id: CategoryId,
        event_type: EventType,
        severity: Severity,
        detected_at: DateTime<Utc>,
        evidence: EvidenceWindow,
    ) -> Self {
        let (time_window_start, time_window_end) = evidence.bounds(detected_at);
        Self {
            product_id,
            category_id,
            event_type,
            severity,
            prev_rank: None,
            curr_rank: None,
            rank_change: None,
            rank_change_pct: None,
            trend_window_hours: None,
            trend_consistency: None,
            prev_price: None,
            curr_price: None,
            price_change_pct: None,
            prev_review_count: None,
            curr_review_count: None,
            review_change: None,
            prev_stock_status: None,
            curr_stock_status: None,
            detected_at,
            time_window_start,
            time_window_end,
            context_collected: false,
            insight_generated: false,
        }
    }

    /// Critical and high events are handed to context collection.
    pub fn is_actionable(&self) -> bool {
        self.severity >= Severity::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(Severity::DESCENDING[0], Severity::Critical);
    }

    #[test]
    fn evidence_window_defaults() {
        let e = Event::new(1, 2, EventType::RankSurge, Severity::High, at(), EvidenceWindow::default());
        assert_eq!(e.time_window_start, at() - Duration::days(7));
        assert_eq!(e.time_window_end, at() + Duration::days(3));
        assert!(!e.context_collected);
        assert!(!e.insight_generated);
    }

    #[test]
    fn actionable_only_high_and_critical() {
        let mk = |sev| Event::new(1, 2, EventType::PriceChange, sev, at(), EvidenceWindow::default());
        assert!(mk(Severity::Critical).is_actionable());
        assert!(mk(Severity::High).is_actionable());
        assert!(!mk(Severity::Medium).is_actionable());
        assert!(!mk(Severity::Low).is_actionable());
    }

    #[test]
    fn wire_names() {
        let json = serde_json::to_string(&EventType::SteadyDecline).unwrap();
        assert_eq!(json, "\"STEADY_DECLINE\"");
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        assert!(EventType::RankDrop.is_rank_event());
        assert!(!EventType::StockChange.is_rank_event());
    }
}
