//! Detection rule documents.
//!
//! This crate provides:
//! - YAML `DetectionConfig` rule definition with serde deserialization
//! - Validation with structured errors and advisory warnings
//! - Compilation into the flat [`CompiledDetectionConfig`] the detector runs on

pub mod detection_config;
pub mod loader;
pub mod schema;
pub mod validation;

pub use detection_config::{
    CompiledDetectionConfig, DetectionConfigRule, DetectionConfigSpec, RankTier,
};
pub use loader::{load_detection_config, RuleError};
