//! Synthesis report document.
//!
//! Every validate and generate run writes one of these next to its
//! outputs so downstream tooling can consume results without scraping
//! console text.

use anyhow::{Context, Result};
use rigforge_backend_biped::{RigError, RigMetrics};
use rigforge_spec::error::BackendError;
use rigforge_spec::{ValidationError, ValidationResult, ValidationWarning};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Error codes for CLI-level failures.
///
/// Validation errors pass through their own E-codes and synthesis errors
/// their RIG-codes; these cover failures before either layer runs.
pub mod error_codes {
    /// Request file could not be read or parsed
    pub const REQUEST_LOAD: &str = "CLI_001";
}

/// One coded message in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMessage {
    /// Stable code ("E003", "W001", "RIG_004").
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Input path the message points at, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ReportMessage {
    pub fn from_validation_error(error: &ValidationError) -> Self {
        Self {
            code: error.code.code().to_string(),
            message: error.message.clone(),
            path: error.path.clone(),
        }
    }

    pub fn from_validation_warning(warning: &ValidationWarning) -> Self {
        Self {
            code: warning.code.code().to_string(),
            message: warning.message.clone(),
            path: warning.path.clone(),
        }
    }

    pub fn from_rig_error(error: &RigError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.message(),
            path: None,
        }
    }
}

/// Machine-readable record of one synthesis or validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisReport {
    /// Whether the run succeeded.
    pub ok: bool,
    /// Name of the source skeleton.
    pub skeleton: String,
    /// Canonical hash of the inputs, when synthesis got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_hash: Option<String>,
    /// Canonical hash of the finished rig document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rig_hash: Option<String>,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
    /// Census of the finished rig.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<RigMetrics>,
    /// Structural lint results for the finished rig, when lint ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lint: Option<rigforge_lint::LintReport>,
    /// Errors, in check order.
    pub errors: Vec<ReportMessage>,
    /// Warnings, in check order.
    pub warnings: Vec<ReportMessage>,
    /// Build notes carried over from the rig document.
    pub notes: Vec<String>,
}

impl SynthesisReport {
    /// Starts an empty passing report for the named skeleton.
    pub fn new(skeleton: impl Into<String>) -> Self {
        Self {
            ok: true,
            skeleton: skeleton.into(),
            input_hash: None,
            rig_hash: None,
            duration_ms: 0,
            metrics: None,
            lint: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Folds a validation result into the report. Errors flip `ok`.
    pub fn apply_validation(&mut self, result: &ValidationResult) {
        for error in &result.errors {
            self.errors.push(ReportMessage::from_validation_error(error));
        }
        for warning in &result.warnings {
            self.warnings
                .push(ReportMessage::from_validation_warning(warning));
        }
        if !result.is_ok() {
            self.ok = false;
        }
    }

    /// Records a synthesis failure.
    pub fn fail_with(&mut self, error: &RigError) {
        self.errors.push(ReportMessage::from_rig_error(error));
        self.ok = false;
    }
}

/// Report path for a request: `{name}.report.json` in the given directory.
pub fn report_path(out_dir: &Path, skeleton_name: &str) -> std::path::PathBuf {
    out_dir.join(format!("{}.report.json", skeleton_name))
}

/// Rig document path for a request: `{name}.rig.json` in the given directory.
pub fn rig_path(out_dir: &Path, skeleton_name: &str) -> std::path::PathBuf {
    out_dir.join(format!("{}.rig.json", skeleton_name))
}

/// Serializes and writes a report.
pub fn write_report(report: &SynthesisReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rigforge_spec::{ErrorCode, WarningCode};

    #[test]
    fn test_apply_validation_carries_codes() {
        let mut result = ValidationResult::success();
        result.add_warning(ValidationWarning::new(WarningCode::SparseMesh, "few tris"));
        result.add_error(ValidationError::with_path(
            ErrorCode::UnknownParent,
            "no such bone",
            "bones[2].parent",
        ));

        let mut report = SynthesisReport::new("biped_v1");
        report.apply_validation(&result);

        assert!(!report.ok);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, "E003");
        assert_eq!(report.errors[0].path.as_deref(), Some("bones[2].parent"));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].code, "W003");
    }

    #[test]
    fn test_warnings_alone_keep_ok() {
        let mut result = ValidationResult::success();
        result.add_warning(ValidationWarning::new(WarningCode::SparseMesh, "few tris"));

        let mut report = SynthesisReport::new("biped_v1");
        report.apply_validation(&result);
        assert!(report.ok);
    }

    #[test]
    fn test_fail_with_rig_error() {
        let mut report = SynthesisReport::new("biped_v1");
        report.fail_with(&RigError::unknown_joint("thigh_x"));

        assert!(!report.ok);
        assert_eq!(report.errors[0].code, "RIG_002");
        assert!(report.errors[0].message.contains("thigh_x"));
    }

    #[test]
    fn test_report_round_trips_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = report_path(tmp.path(), "biped_v1");

        let mut report = SynthesisReport::new("biped_v1");
        report.input_hash = Some("0".repeat(64));
        report.duration_ms = 3;
        write_report(&report, &path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        let back: SynthesisReport = serde_json::from_str(&json).unwrap();
        assert!(back.ok);
        assert_eq!(back.skeleton, "biped_v1");
        assert_eq!(back.input_hash.as_deref(), Some("0".repeat(64)).as_deref());
    }

    #[test]
    fn test_output_paths() {
        let dir = Path::new("out");
        assert_eq!(
            report_path(dir, "biped_v1"),
            Path::new("out").join("biped_v1.report.json")
        );
        assert_eq!(
            rig_path(dir, "biped_v1"),
            Path::new("out").join("biped_v1.rig.json")
        );
    }
}
