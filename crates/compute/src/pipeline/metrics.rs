use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use rankwatch_core::{Event, EventType, Severity};

/// Counters for one detection pass, updated as pairs complete.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,

    /// Products returned by the catalog for the target brand.
    pub products_scanned: usize,
    /// Products whose category lookup failed.
    pub products_failed: usize,

    /// Every (product, category) pair visited.
    pub pairs_total: usize,
    /// Pairs that went through the detectors.
    pub pairs_evaluated: usize,
    /// Pairs with too little or stale history.
    pub pairs_skipped: usize,
    /// Pairs whose fetch or validation failed.
    pub pairs_failed: usize,

    pub events_total: usize,
    /// Trend events, as opposed to price/review/stock events.
    pub rank_events: usize,
    pub by_type: BTreeMap<EventType, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            duration_ms: 0,
            products_scanned: 0,
            products_failed: 0,
            pairs_total: 0,
            pairs_evaluated: 0,
            pairs_skipped: 0,
            pairs_failed: 0,
            events_total: 0,
            rank_events: 0,
            by_type: BTreeMap::new(),
            by_severity: BTreeMap::new(),
        }
    }

    pub fn record_events(&mut self, events: &[Event]) {
        self.events_total += events.len();
        for event in events {
            if event.event_type.is_rank_event() {
                self.rank_events += 1;
            }
            *self.by_type.entry(event.event_type).or_default() += 1;
            *self.by_severity.entry(event.severity).or_default() += 1;
        }
    }

    /// Stamp the end of the run. `finished_at` is measured from `started_at`
    /// so runs on an injected clock stay reproducible.
    pub fn finish(&mut self, elapsed: Duration) {
        self.duration_ms = elapsed.as_millis() as u64;
        self.finished_at = self.started_at
            + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero());
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    /// Log run totals followed by counts per severity, critical first.
    pub fn log_summary(&self) {
        info!(
            products = self.products_scanned,
            products_failed = self.products_failed,
            pairs = self.pairs_total,
            evaluated = self.pairs_evaluated,
            skipped = self.pairs_skipped,
            failed = self.pairs_failed,
            events = self.events_total,
            rank_events = self.rank_events,
            duration_ms = self.duration_ms,
            "detection run finished"
        );
        for severity in Severity::DESCENDING {
            let count = self.count(severity);
            if count > 0 {
                info!(%severity, count, "events by severity");
            }
        }
        for (event_type, count) in &self.by_type {
            info!(%event_type, count, "events by type");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rankwatch_core::EvidenceWindow;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 3, 6, 0, 0).unwrap()
    }

    #[test]
    fn tallies_by_type_and_severity() {
        let mut report = RunReport::new(at());
        let ev = |t, s| Event::new(1, 1, t, s, at(), EvidenceWindow::default());
        report.record_events(&[
            ev(EventType::RankSurge, Severity::High),
            ev(EventType::PriceChange, Severity::Low),
            ev(EventType::StockChange, Severity::High),
        ]);
        assert_eq!(report.events_total, 3);
        assert_eq!(report.rank_events, 1);
        assert_eq!(report.count(Severity::High), 2);
        assert_eq!(report.count(Severity::Critical), 0);
        assert_eq!(report.by_type[&EventType::PriceChange], 1);
    }

    #[test]
    fn finish_offsets_from_start() {
        let mut report = RunReport::new(at());
        report.finish(Duration::from_millis(1500));
        assert_eq!(report.duration_ms, 1500);
        assert_eq!(
            report.finished_at,
            at() + chrono::Duration::milliseconds(1500)
        );
    }

    #[test]
    fn serializes_enum_keys() {
        let mut report = RunReport::new(at());
        report.record_events(&[Event::new(
            1,
            1,
            EventType::SteadyRise,
            Severity::Critical,
            at(),
            EvidenceWindow::default(),
        )]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["by_type"]["STEADY_RISE"], 1);
        assert_eq!(json["by_severity"]["critical"], 1);
    }
}
