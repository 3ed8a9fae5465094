use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::entity::BrandId;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

/// Runtime settings for the detection worker.
///
/// Detection thresholds live in the `DetectionConfig` rule document; this
/// only says where things are and which overrides apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub storage: StorageConfig,
    pub rules: RulesConfig,
    pub detect: DetectConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `RANKWATCH_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("RANKWATCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            storage: StorageConfig::from_env_profiled(p),
            rules: RulesConfig::from_env_profiled(p),
            detect: DetectConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  storage:  data_dir={}", self.storage.data_dir.display());
        tracing::info!("  storage:  snapshots={}", self.storage.snapshots_file.display());
        tracing::info!("  storage:  events={}", self.storage.events_file.display());
        tracing::info!("  rules:    detection_config={}", self.rules.detection_config.display());
        tracing::info!(
            "  detect:   brand={}, parallel={}",
            self.detect
                .target_brand_id
                .map(|b| b.to_string())
                .unwrap_or_else(|| "(from rule)".to_string()),
            self.detect.parallel
        );
    }

    /// JSON view for run reports.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "storage": {
                "data_dir": self.storage.data_dir,
                "snapshots_file": self.storage.snapshots_file,
                "events_file": self.storage.events_file,
            },
            "rules": { "detection_config": self.rules.detection_config },
            "detect": {
                "target_brand_id": self.detect.target_brand_id,
                "parallel": self.detect.parallel,
            },
        })
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// JSON document with `products` and `snapshots`.
    pub snapshots_file: PathBuf,
    /// JSON-lines file detected events are appended to.
    pub events_file: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        let data_dir = PathBuf::from(profiled_env_or(p, "DATA_DIR", "data"));
        let snapshots_file = profiled_env_opt(p, "SNAPSHOTS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("snapshots.json"));
        let events_file = profiled_env_opt(p, "EVENTS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("events.jsonl"));
        Self {
            data_dir,
            snapshots_file,
            events_file,
        }
    }
}

// ── Rules ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Path to the `DetectionConfig` YAML rule.
    pub detection_config: PathBuf,
}

impl RulesConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            detection_config: PathBuf::from(profiled_env_or(
                p,
                "DETECTION_CONFIG",
                "data/rules/detection-config.yml",
            )),
        }
    }
}

// ── Detection overrides ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectConfig {
    /// Overrides the rule's `target_brand_id` when set.
    pub target_brand_id: Option<BrandId>,
    /// Overrides the rule's `parallel` flag when set to true.
    pub parallel: bool,
}

impl DetectConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            target_brand_id: profiled_env_opt(p, "TARGET_BRAND_ID").and_then(|v| v.parse().ok()),
            parallel: profiled_env_bool(p, "DETECT_PARALLEL", false),
        }
    }
}
