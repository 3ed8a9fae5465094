//! Filesystem loading for DetectionConfig rules.

mod error;

use std::fs;
use std::path::Path;

use tracing::info;

use crate::detection_config::{CompiledDetectionConfig, DetectionConfigRule};

pub use error::{Result, RuleError};

/// Read and parse a rule file without validating it.
pub fn load_rule_file(path: &Path) -> Result<DetectionConfigRule> {
    let yaml = fs::read_to_string(path)?;
    DetectionConfigRule::from_yaml(&yaml)
}

/// Read, validate and compile the detection config at `path`.
///
/// A rule with `metadata.enabled: false` is refused rather than silently
/// replaced by defaults.
pub fn load_detection_config(path: &Path) -> Result<CompiledDetectionConfig> {
    let rule = load_rule_file(path)?;
    if !rule.metadata.enabled {
        return Err(RuleError::Validation(format!(
            "rule '{}' is disabled",
            rule.metadata.id
        )));
    }
    let compiled = rule.compile()?;
    info!(
        path = %path.display(),
        rule = %rule.metadata.id,
        windows = ?compiled.trend_windows_hours,
        tiers = compiled.rank_thresholds.len(),
        hybrid = compiled.use_hybrid_threshold,
        "loaded detection config"
    );
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_rule(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn load_shipped_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/rules/detection-config.yml");
        let cfg = load_detection_config(&path).unwrap();
        assert_eq!(cfg.trend_windows_hours, vec![1, 6, 12, 24]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_detection_config(&dir.path().join("nope.yml")).unwrap_err();
        assert!(matches!(err, RuleError::Io(_)));
    }

    #[test]
    fn disabled_rule_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rule(
            &dir,
            "off.yml",
            r#"
apiVersion: v1
kind: DetectionConfig
metadata:
  id: detection-off
  name: Off
  enabled: false
spec: {}
"#,
        );
        let err = load_detection_config(&path).unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn invalid_rule_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rule(
            &dir,
            "bad.yml",
            r#"
apiVersion: v1
kind: DetectionConfig
metadata:
  id: detection-bad
  name: Bad
spec:
  trend:
    windows_hours: [6, 24]
    min_data_points: 3
    consistency_threshold: 0.6
    surge_window_hours: 1
    steady_window_hours: 24
    steady_consistency_min: 0.8
"#,
        );
        let err = load_detection_config(&path).unwrap_err();
        assert!(matches!(err, RuleError::Validation(_)));
        assert!(err.to_string().contains("spec.surge_window_hours"));
    }

    #[test]
    fn partial_trend_block_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rule(
            &dir,
            "partial.yml",
            r#"
apiVersion: v1
kind: DetectionConfig
metadata:
  id: detection-partial
  name: Partial
spec:
  trend: { windows_hours: [1, 24] }
  evidence: { lookback_days: 14 }
"#,
        );
        let cfg = load_detection_config(&path).unwrap();
        assert_eq!(cfg.trend_windows_hours, vec![1, 24]);
        assert_eq!(cfg.trend_min_data_points, 3);
        assert_eq!(cfg.steady_window_hours, 24);
        assert_eq!(cfg.evidence.lookback_days, 14);
        assert_eq!(cfg.evidence.lookforward_days, 3);
    }
}
