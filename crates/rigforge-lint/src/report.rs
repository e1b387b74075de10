//! Issue and report types shared by every rule.

use serde::{Deserialize, Serialize};

/// How bad a finding is.
///
/// `Error` fails the lint, `Warning` fails it only in strict mode,
/// `Info` never fails anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One finding, tied to the rule that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintIssue {
    /// Id of the producing rule, e.g. "graph/parent-cycle".
    pub rule_id: String,
    pub severity: Severity,
    /// What is wrong.
    pub message: String,
    /// What to do about it.
    pub suggestion: String,
    /// Where in the document, e.g. "joint:spring_belly" or
    /// "driver:visible_fk_arm_l".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// The offending value, rendered for the report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<String>,
    /// What the rule would have accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_range: Option<String>,
}

impl LintIssue {
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            message: message.into(),
            suggestion: suggestion.into(),
            location: None,
            actual_value: None,
            expected_range: None,
        }
    }

    /// Pins the issue to a place in the document.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_actual_value(mut self, value: impl Into<String>) -> Self {
        self.actual_value = Some(value.into());
        self
    }

    pub fn with_expected_range(mut self, range: impl Into<String>) -> Self {
        self.expected_range = Some(range.into());
        self
    }
}

/// Issue counts by severity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintSummary {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

/// Everything one lint run found, bucketed by severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintReport {
    /// False as soon as any error-level issue lands.
    pub ok: bool,
    pub errors: Vec<LintIssue>,
    pub warnings: Vec<LintIssue>,
    pub info: Vec<LintIssue>,
    pub summary: LintSummary,
}

impl LintReport {
    pub fn new() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            info: Vec::new(),
            summary: LintSummary::default(),
        }
    }

    /// Files an issue under its severity bucket and keeps the counts
    /// and the `ok` flag in step.
    pub fn add_issue(&mut self, issue: LintIssue) {
        let (bucket, count) = match issue.severity {
            Severity::Error => {
                self.ok = false;
                (&mut self.errors, &mut self.summary.errors)
            }
            Severity::Warning => (&mut self.warnings, &mut self.summary.warnings),
            Severity::Info => (&mut self.info, &mut self.summary.info),
        };
        *count += 1;
        bucket.push(issue);
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn total_issues(&self) -> usize {
        self.errors.len() + self.warnings.len() + self.info.len()
    }
}

impl Default for LintReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_builder_fills_the_optional_fields() {
        let issue = LintIssue::new(
            "graph/layer-range",
            Severity::Error,
            "joint sits on layer 40",
            "Move the joint onto a layer in [0, 32)",
        )
        .at("joint:spring_belly")
        .with_actual_value("40")
        .with_expected_range("[0, 32)");

        assert_eq!(issue.location.as_deref(), Some("joint:spring_belly"));
        assert_eq!(issue.actual_value.as_deref(), Some("40"));
        assert_eq!(issue.expected_range.as_deref(), Some("[0, 32)"));
    }

    #[test]
    fn test_only_errors_flip_the_ok_flag() {
        let mut report = LintReport::new();
        report.add_issue(LintIssue::new(
            "graph/shape-anchor",
            Severity::Warning,
            "anchor is grabbable",
            "Lock all channels on the anchor",
        ));
        report.add_issue(LintIssue::new(
            "twist/chain-shape",
            Severity::Info,
            "twist chain is sparse",
            "Nothing to do, informational only",
        ));
        assert!(report.ok);
        assert!(report.has_warnings());

        report.add_issue(LintIssue::new(
            "graph/parent-cycle",
            Severity::Error,
            "parent chain loops",
            "Reparent one joint in the loop",
        ));
        assert!(!report.ok);
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.warnings, 1);
        assert_eq!(report.summary.info, 1);
        assert_eq!(report.total_issues(), 3);
    }

    #[test]
    fn test_buckets_and_counts_agree() {
        let mut report = LintReport::new();
        for i in 0..3 {
            report.add_issue(LintIssue::new(
                "wiring/dangling-constraint",
                Severity::Error,
                format!("target {i} missing"),
                "Point the constraint at an existing joint",
            ));
        }
        assert_eq!(report.errors.len(), report.summary.errors);
        assert_eq!(report.summary.errors, 3);
    }
}
