//! Rule validation with structured errors.
//!
//! Returns a [`ValidationResult`] with errors (block compilation) and
//! warnings (advisory, logged).

pub(crate) mod config_checks;

use serde::{Deserialize, Serialize};

use crate::detection_config::DetectionConfigRule;
use crate::loader::{Result, RuleError};

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Dotted location, e.g. `"spec.trend.windows_hours"`.
    pub path: String,
    pub message: String,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Collapse into a single [`RuleError::Validation`] when invalid.
    pub fn into_result(self) -> Result<()> {
        if self.valid {
            return Ok(());
        }
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(RuleError::Validation(joined))
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a parsed [`DetectionConfigRule`].
pub fn validate_detection_config(rule: &DetectionConfigRule) -> ValidationResult {
    let mut result = ValidationResult::new();
    config_checks::validate_detection_config(rule, &mut result);
    result
}

/// True for lowercase alphanumerics separated by single hyphens.
pub fn is_kebab_case(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('-')
        && !s.ends_with('-')
        && !s.contains("--")
        && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab_case() {
        assert!(is_kebab_case("detection-default"));
        assert!(is_kebab_case("tier2"));
        assert!(!is_kebab_case("Detection"));
        assert!(!is_kebab_case("a--b"));
        assert!(!is_kebab_case("-a"));
        assert!(!is_kebab_case(""));
    }

    #[test]
    fn into_result_joins_errors() {
        let mut r = ValidationResult::new();
        r.error("spec.a", "bad a");
        r.error("spec.b", "bad b");
        let err = r.into_result().unwrap_err().to_string();
        assert!(err.contains("spec.a: bad a"));
        assert!(err.contains("spec.b: bad b"));
    }

    #[test]
    fn warnings_do_not_invalidate() {
        let mut r = ValidationResult::new();
        r.warn("spec.x", "odd");
        assert!(r.valid);
        assert!(r.into_result().is_ok());
    }
}
