//! Validation for the DetectionConfig rule kind.

use super::{is_kebab_case, ValidationResult};

use crate::detection_config::{CompiledDetectionConfig, DetectionConfigRule};

// ── Common metadata validation ──────────────────────────────────────

fn validate_common_metadata(
    api_version: &str,
    kind: &str,
    expected_kind: &str,
    id: &str,
    result: &mut ValidationResult,
) {
    if api_version != "v1" {
        result.error(
            "apiVersion",
            format!("apiVersion must be 'v1', got '{}'", api_version),
        );
    }
    if kind != expected_kind {
        result.error(
            "kind",
            format!("kind must be '{}', got '{}'", expected_kind, kind),
        );
    }
    if !is_kebab_case(id) {
        result.error(
            "metadata.id",
            format!(
                "id must be kebab-case (lowercase alphanumeric + hyphens), got '{}'",
                id
            ),
        );
    }
}

fn join(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

fn check_fraction(value: f64, path: String, result: &mut ValidationResult) {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        result.error(path, format!("must be within [0, 1], got {}", value));
    }
}

fn check_percentage(value: f64, path: String, result: &mut ValidationResult) {
    if !value.is_finite() || value < 0.0 {
        result.error(path, format!("must be a non-negative percentage, got {}", value));
    }
}

// ── DetectionConfig validation ──────────────────────────────────────

pub fn validate_detection_config(rule: &DetectionConfigRule, result: &mut ValidationResult) {
    validate_common_metadata(
        &rule.api_version,
        &rule.kind,
        "DetectionConfig",
        &rule.metadata.id,
        result,
    );

    if rule.spec.trend.windows_hours.len() > 1 {
        let mut seen = std::collections::HashSet::new();
        for w in &rule.spec.trend.windows_hours {
            if !seen.insert(w) {
                result.warn(
                    "spec.trend.windows_hours",
                    format!("window {}h listed more than once", w),
                );
            }
        }
    }

    validate_compiled(&CompiledDetectionConfig::from_spec(&rule.spec), "spec", result);
}

/// Checks on the flattened settings. Shared by rule compilation and by
/// detectors constructed from hand-built configs.
pub fn validate_compiled(cfg: &CompiledDetectionConfig, prefix: &str, result: &mut ValidationResult) {
    // Windows.
    let windows_path = join(prefix, "trend_windows_hours");
    if cfg.trend_windows_hours.is_empty() {
        result.error(windows_path.clone(), "at least one trend window is required");
    }
    if cfg.trend_windows_hours.contains(&0) {
        result.error(windows_path.clone(), "windows must be at least 1 hour");
    }
    if cfg.trend_windows_hours.windows(2).any(|p| p[0] >= p[1]) {
        result.error(windows_path, "windows must be ascending without duplicates");
    }
    if !cfg.trend_windows_hours.contains(&cfg.surge_window_hours) {
        result.error(
            join(prefix, "surge_window_hours"),
            format!(
                "surge window {}h is not one of the trend windows {:?}",
                cfg.surge_window_hours, cfg.trend_windows_hours
            ),
        );
    }
    if !cfg.trend_windows_hours.contains(&cfg.steady_window_hours) {
        result.error(
            join(prefix, "steady_window_hours"),
            format!(
                "steady window {}h is not one of the trend windows {:?}",
                cfg.steady_window_hours, cfg.trend_windows_hours
            ),
        );
    }
    if cfg.surge_window_hours > cfg.steady_window_hours {
        result.warn(
            join(prefix, "surge_window_hours"),
            "surge window is longer than the steady window",
        );
    }

    // Trend shape.
    if cfg.trend_min_data_points < 2 {
        result.error(
            join(prefix, "trend_min_data_points"),
            format!("need at least 2 data points, got {}", cfg.trend_min_data_points),
        );
    }
    check_fraction(
        cfg.trend_consistency_threshold,
        join(prefix, "trend_consistency_threshold"),
        result,
    );
    check_fraction(
        cfg.steady_consistency_min,
        join(prefix, "steady_consistency_min"),
        result,
    );
    if cfg.steady_consistency_min < cfg.trend_consistency_threshold {
        result.warn(
            join(prefix, "steady_consistency_min"),
            "steady floor is looser than the general consistency threshold",
        );
    }

    // Tiers.
    let tiers_path = join(prefix, "rank_thresholds");
    for (i, tier) in cfg.rank_thresholds.iter().enumerate() {
        if tier.min == 0 {
            result.error(format!("{}[{}].min", tiers_path, i), "ranks start at 1");
        }
        if tier.min > tier.max {
            result.error(
                format!("{}[{}]", tiers_path, i),
                format!("min {} is greater than max {}", tier.min, tier.max),
            );
        }
        if tier.threshold == 0 {
            result.error(
                format!("{}[{}].threshold", tiers_path, i),
                "threshold must be at least 1",
            );
        }
    }
    let mut sorted = cfg.rank_thresholds.clone();
    sorted.sort_by_key(|t| t.min);
    for pair in sorted.windows(2) {
        if pair[0].max >= pair[1].min {
            result.error(
                tiers_path.clone(),
                format!(
                    "tiers {}-{} and {}-{} overlap",
                    pair[0].min, pair[0].max, pair[1].min, pair[1].max
                ),
            );
        } else if pair[0].max + 1 < pair[1].min {
            result.warn(
                tiers_path.clone(),
                format!(
                    "ranks {}-{} fall between tiers and use the unranked threshold",
                    pair[0].max + 1,
                    pair[1].min - 1
                ),
            );
        }
    }
    if cfg.unranked_threshold == 0 {
        result.error(
            join(prefix, "unranked_threshold"),
            "threshold must be at least 1",
        );
    }

    // Percentage gates.
    check_percentage(
        cfg.rank_change_pct_threshold,
        join(prefix, "rank_change_pct_threshold"),
        result,
    );
    check_percentage(
        cfg.price_change_pct_threshold,
        join(prefix, "price_change_pct_threshold"),
        result,
    );
    if cfg.review_surge_threshold == 0 {
        result.error(
            join(prefix, "review_surge_threshold"),
            "threshold must be at least 1",
        );
    }
}
