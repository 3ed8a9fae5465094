//! DetectionConfig rule kind: trend windows, tiered rank thresholds,
//! hybrid percentage gate, and auxiliary detector thresholds.

use serde::{Deserialize, Serialize};

use rankwatch_core::{BrandId, EvidenceWindow};

use crate::loader::{Result, RuleError};
use crate::schema::CommonMetadata;
use crate::validation::{self, ValidationResult};

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level DetectionConfig rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DetectionConfigRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: DetectionConfigSpec,
}

/// Specification section of a DetectionConfig rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DetectionConfigSpec {
    /// Brand whose products are scanned.
    #[serde(default = "default_brand")]
    pub target_brand_id: BrandId,
    #[serde(default)]
    pub trend: TrendSection,
    #[serde(default)]
    pub rank_thresholds: RankThresholdSection,
    #[serde(default)]
    pub auxiliary: AuxiliarySection,
    #[serde(default)]
    pub evidence: EvidenceWindow,
    /// Collection cadence. Pads the snapshot fetch cutoff by one interval and
    /// is the slack allowed when checking that history spans a window.
    #[serde(default = "default_scrape_interval")]
    pub scrape_interval_hours: u32,
    /// Evaluate product/category pairs on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

/// Multi-window trend analysis parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TrendSection {
    pub windows_hours: Vec<u32>,
    pub min_data_points: usize,
    /// Minimum fraction of moves agreeing with the overall direction.
    pub consistency_threshold: f64,
    pub surge_window_hours: u32,
    pub steady_window_hours: u32,
    /// Stricter consistency floor for steady rise/decline classification.
    pub steady_consistency_min: f64,
}

/// Tiered absolute thresholds plus the optional percentage gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RankThresholdSection {
    pub tiers: Vec<RankTier>,
    /// Threshold for ranks outside every tier. Defaults to the threshold of
    /// the tier reaching deepest, or 15 without tiers.
    #[serde(default)]
    pub unranked_threshold: Option<u32>,
    pub change_pct_threshold: f64,
    /// Fire on either the tier gate or the percentage gate.
    pub use_hybrid: bool,
}

/// Inclusive rank range with its minimum absolute change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RankTier {
    pub min: u32,
    pub max: u32,
    pub threshold: u32,
}

impl RankTier {
    pub fn contains(&self, rank: u32) -> bool {
        self.min <= rank && rank <= self.max
    }
}

/// Thresholds for the price/review detectors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AuxiliarySection {
    pub price_change_pct_threshold: f64,
    pub review_surge_threshold: u32,
}

fn default_brand() -> BrandId {
    1
}

fn default_scrape_interval() -> u32 {
    1
}

/// Fallback when no tier matches and none is configured.
pub const DEFAULT_UNRANKED_THRESHOLD: u32 = 15;

impl Default for TrendSection {
    fn default() -> Self {
        Self {
            windows_hours: vec![1, 6, 12, 24],
            min_data_points: 3,
            consistency_threshold: 0.6,
            surge_window_hours: 1,
            steady_window_hours: 24,
            steady_consistency_min: 0.8,
        }
    }
}

impl Default for RankThresholdSection {
    fn default() -> Self {
        Self {
            tiers: vec![
                RankTier { min: 1, max: 5, threshold: 2 },
                RankTier { min: 6, max: 10, threshold: 3 },
                RankTier { min: 11, max: 20, threshold: 5 },
                RankTier { min: 21, max: 30, threshold: 7 },
                RankTier { min: 31, max: 50, threshold: 10 },
                RankTier { min: 51, max: 100, threshold: 15 },
            ],
            unranked_threshold: None,
            change_pct_threshold: 30.0,
            use_hybrid: true,
        }
    }
}

impl Default for AuxiliarySection {
    fn default() -> Self {
        Self {
            price_change_pct_threshold: 20.0,
            review_surge_threshold: 100,
        }
    }
}

impl Default for DetectionConfigSpec {
    fn default() -> Self {
        Self {
            target_brand_id: default_brand(),
            trend: TrendSection::default(),
            rank_thresholds: RankThresholdSection::default(),
            auxiliary: AuxiliarySection::default(),
            evidence: EvidenceWindow::default(),
            scrape_interval_hours: default_scrape_interval(),
            parallel: false,
        }
    }
}

// ── Compiled (hot-path) type ────────────────────────────────────────

/// Flat, validated detection settings handed to the detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompiledDetectionConfig {
    /// Ascending, deduplicated.
    pub trend_windows_hours: Vec<u32>,
    pub trend_min_data_points: usize,
    pub trend_consistency_threshold: f64,
    pub steady_window_hours: u32,
    pub surge_window_hours: u32,
    pub steady_consistency_min: f64,
    pub rank_thresholds: Vec<RankTier>,
    pub unranked_threshold: u32,
    pub rank_change_pct_threshold: f64,
    pub use_hybrid_threshold: bool,
    pub price_change_pct_threshold: f64,
    pub review_surge_threshold: u32,
    pub target_brand_id: BrandId,
    pub scrape_interval_hours: u32,
    pub evidence: EvidenceWindow,
    pub parallel: bool,
}

impl Default for CompiledDetectionConfig {
    fn default() -> Self {
        CompiledDetectionConfig::from_spec(&DetectionConfigSpec::default())
    }
}

impl CompiledDetectionConfig {
    /// Flatten a spec without validating it.
    pub fn from_spec(spec: &DetectionConfigSpec) -> Self {
        let mut windows = spec.trend.windows_hours.clone();
        windows.sort_unstable();
        windows.dedup();

        let unranked_threshold = spec.rank_thresholds.unranked_threshold.unwrap_or_else(|| {
            spec.rank_thresholds
                .tiers
                .iter()
                .max_by_key(|t| t.max)
                .map(|t| t.threshold)
                .unwrap_or(DEFAULT_UNRANKED_THRESHOLD)
        });

        Self {
            trend_windows_hours: windows,
            trend_min_data_points: spec.trend.min_data_points,
            trend_consistency_threshold: spec.trend.consistency_threshold,
            steady_window_hours: spec.trend.steady_window_hours,
            surge_window_hours: spec.trend.surge_window_hours,
            steady_consistency_min: spec.trend.steady_consistency_min,
            rank_thresholds: spec.rank_thresholds.tiers.clone(),
            unranked_threshold,
            rank_change_pct_threshold: spec.rank_thresholds.change_pct_threshold,
            use_hybrid_threshold: spec.rank_thresholds.use_hybrid,
            price_change_pct_threshold: spec.auxiliary.price_change_pct_threshold,
            review_surge_threshold: spec.auxiliary.review_surge_threshold,
            target_brand_id: spec.target_brand_id,
            scrape_interval_hours: spec.scrape_interval_hours,
            evidence: spec.evidence,
            parallel: spec.parallel,
        }
    }

    /// Longest configured window, or 0 without windows.
    pub fn max_window_hours(&self) -> u32 {
        self.trend_windows_hours.last().copied().unwrap_or(0)
    }

    /// Check the settings, returning every problem found.
    pub fn check(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        validation::config_checks::validate_compiled(self, "", &mut result);
        result
    }

    /// Fail with a single error listing every blocking problem.
    pub fn validate(&self) -> Result<()> {
        self.check().into_result()
    }
}

impl DetectionConfigRule {
    /// Validate the document and flatten it into the detector's config.
    pub fn compile(&self) -> Result<CompiledDetectionConfig> {
        let result = validation::validate_detection_config(self);
        for w in &result.warnings {
            tracing::warn!(rule = %self.metadata.id, path = %w.path, "{}", w.message);
        }
        result.into_result()?;
        Ok(CompiledDetectionConfig::from_spec(&self.spec))
    }

    /// Parse a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(RuleError::from)
    }
}
