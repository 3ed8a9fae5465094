use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use rankwatch_core::{
    sort_by_time, CategoryId, Event, Product, ProductCatalog, Snapshot, SnapshotSource,
};
use rankwatch_rules::CompiledDetectionConfig;

use crate::error::{DetectError, Result};
use crate::pipeline::{detect_series, EventContext, RunReport, ThresholdPolicy};

/// Result of evaluating one product/category pair.
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    /// Detectors ran; zero or more events were raised.
    Evaluated(Vec<Event>),
    /// Fewer snapshots than `trend_min_data_points`.
    InsufficientData { points: usize },
    /// Newest snapshot predates the run by more than the fetch horizon.
    Stale { latest: DateTime<Utc> },
}

impl PairOutcome {
    pub fn events(&self) -> &[Event] {
        match self {
            PairOutcome::Evaluated(events) => events,
            PairOutcome::InsufficientData { .. } | PairOutcome::Stale { .. } => &[],
        }
    }
}

/// Events found by one pass plus the counters describing it. Nothing has
/// been persisted yet.
#[derive(Debug, Clone)]
pub struct DetectionRun {
    pub events: Vec<Event>,
    pub report: RunReport,
}

impl DetectionRun {
    /// Critical and high events, the ones handed to context collection.
    pub fn actionable(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.is_actionable())
    }
}

/// Scans every tracked product of the configured brand and turns its rank
/// history into events.
pub struct EventDetector<C, S> {
    config: CompiledDetectionConfig,
    policy: ThresholdPolicy,
    catalog: C,
    source: S,
}

impl<C, S> EventDetector<C, S>
where
    C: ProductCatalog,
    S: SnapshotSource,
{
    /// Build a detector, rejecting an invalid config up front.
    pub fn new(config: CompiledDetectionConfig, catalog: C, source: S) -> Result<Self> {
        config.validate()?;
        let policy = ThresholdPolicy::from_config(&config);
        Ok(Self {
            config,
            policy,
            catalog,
            source,
        })
    }

    pub fn config(&self) -> &CompiledDetectionConfig {
        &self.config
    }

    /// Oldest `collected_at` fetched for a pair whose newest snapshot is
    /// `anchor`: the longest window padded by one scrape interval.
    pub fn fetch_since(&self, anchor: DateTime<Utc>) -> DateTime<Utc> {
        let hours = self.config.max_window_hours() + self.config.scrape_interval_hours;
        anchor - Duration::hours(i64::from(hours))
    }

    /// Run the detectors over one pair's snapshots.
    ///
    /// Snapshots may arrive in any order. A zero rank or a snapshot from
    /// another product/category is rejected.
    pub fn detect_pair(
        &self,
        product: &Product,
        category_id: CategoryId,
        mut snapshots: Vec<Snapshot>,
        now: DateTime<Utc>,
    ) -> Result<PairOutcome> {
        for s in &snapshots {
            let reason = if s.rank == 0 {
                Some(format!("rank 0 at {}", s.collected_at))
            } else if s.product_id != product.id || s.category_id != category_id {
                Some(format!(
                    "belongs to product {} in category {}",
                    s.product_id, s.category_id
                ))
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(DetectError::MalformedSnapshot {
                    product_id: product.id,
                    category_id,
                    reason,
                });
            }
        }

        if snapshots.len() < self.config.trend_min_data_points {
            debug!(
                product_id = product.id,
                category_id,
                points = snapshots.len(),
                "not enough snapshots, skipping"
            );
            return Ok(PairOutcome::InsufficientData {
                points: snapshots.len(),
            });
        }

        sort_by_time(&mut snapshots);

        let ctx = EventContext {
            product_id: product.id,
            category_id,
            detected_at: now,
            evidence: self.config.evidence,
        };
        let events = detect_series(&snapshots, &self.config, &self.policy, &ctx);

        debug!(
            product = %product,
            category_id,
            points = snapshots.len(),
            events = events.len(),
            "pair evaluated"
        );
        Ok(PairOutcome::Evaluated(events))
    }

    fn evaluate(
        &self,
        product: &Product,
        category_id: CategoryId,
        now: DateTime<Utc>,
    ) -> Result<PairOutcome> {
        let Some(anchor) = self.source.latest_collected_at(product.id, category_id)? else {
            return Ok(PairOutcome::InsufficientData { points: 0 });
        };
        if anchor < self.fetch_since(now) {
            debug!(
                product_id = product.id,
                category_id,
                latest = %anchor,
                "stale history, skipping"
            );
            return Ok(PairOutcome::Stale { latest: anchor });
        }

        let snapshots = self
            .source
            .snapshots_since(product.id, category_id, self.fetch_since(anchor))?;
        self.detect_pair(product, category_id, snapshots, now)
    }
}

impl<C, S> EventDetector<C, S>
where
    C: ProductCatalog + Sync,
    S: SnapshotSource + Sync,
{
    /// One detection pass on the wall clock.
    pub fn detect_events(&self) -> Result<DetectionRun> {
        self.detect_events_at(Utc::now())
    }

    /// One detection pass with `now` as the detection time.
    ///
    /// Only a catalog failure aborts the run. Per-product and per-pair
    /// failures are logged, counted and skipped. Events come back in
    /// (product, category) order whether or not the pass ran in parallel.
    pub fn detect_events_at(&self, now: DateTime<Utc>) -> Result<DetectionRun> {
        let clock = Instant::now();
        let mut report = RunReport::new(now);
        let brand_id = self.config.target_brand_id;

        info!(
            brand_id,
            windows = ?self.config.trend_windows_hours,
            parallel = self.config.parallel,
            "detection run started"
        );

        let products = self.catalog.products_for_brand(brand_id)?;
        report.products_scanned = products.len();

        let mut pairs: Vec<(&Product, CategoryId)> = Vec::new();
        for product in &products {
            match self.source.categories_for(product.id) {
                Ok(categories) => pairs.extend(categories.into_iter().map(|c| (product, c))),
                Err(e) => {
                    warn!(product_id = product.id, error = %e, "category lookup failed");
                    report.products_failed += 1;
                }
            }
        }
        pairs.sort_by_key(|(product, category_id)| (product.id, *category_id));
        pairs.dedup_by_key(|(product, category_id)| (product.id, *category_id));
        report.pairs_total = pairs.len();

        let outcomes: Vec<Result<PairOutcome>> = if self.config.parallel {
            pairs
                .par_iter()
                .map(|&(product, category_id)| self.evaluate(product, category_id, now))
                .collect()
        } else {
            pairs
                .iter()
                .map(|&(product, category_id)| self.evaluate(product, category_id, now))
                .collect()
        };

        let mut events = Vec::new();
        for (&(product, category_id), outcome) in pairs.iter().zip(outcomes) {
            match outcome {
                Ok(PairOutcome::Evaluated(found)) => {
                    report.pairs_evaluated += 1;
                    events.extend(found);
                }
                Ok(PairOutcome::InsufficientData { .. } | PairOutcome::Stale { .. }) => {
                    report.pairs_skipped += 1
                }
                Err(e) => {
                    warn!(
                        product_id = product.id,
                        category_id,
                        error = %e,
                        "pair failed, continuing"
                    );
                    report.pairs_failed += 1;
                }
            }
        }

        report.record_events(&events);
        report.finish(clock.elapsed());

        Ok(DetectionRun { events, report })
    }
}
