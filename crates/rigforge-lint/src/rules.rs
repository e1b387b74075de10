//! Lint rule trait and rule modules.

use crate::report::{LintIssue, Severity};
use rigforge_backend_biped::ControlRig;

pub mod graph;
pub mod modules;
pub mod twist;
pub mod wiring;

/// A lint rule that checks one structural invariant of a rig document.
pub trait RigLintRule: Send + Sync {
    /// Unique identifier (e.g., "graph/parent-cycle", "wiring/switch-overlap").
    fn id(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// Default severity (can be overridden by config).
    fn default_severity(&self) -> Severity;

    /// Run the check, return issues found.
    fn check(&self, rig: &ControlRig) -> Vec<LintIssue>;
}

/// Errors that can occur while loading a document for linting.
#[derive(Debug, thiserror::Error)]
pub enum LintError {
    /// Failed to read the document file.
    #[error("failed to read rig document: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid rig document.
    #[error("failed to parse rig document: {0}")]
    Parse(#[from] serde_json::Error),
}
