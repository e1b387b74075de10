//! Structural lint system for rig documents.
//!
//! Re-checks the invariants a generated rig is supposed to carry, on
//! the serialized document instead of the builder's in-memory graph, so
//! hand-edited and re-imported rigs get the same guarantees before the
//! snap tooling and host engine consume them.
//!
//! # Example
//!
//! ```no_run
//! use rigforge_lint::RuleRegistry;
//! use std::path::Path;
//!
//! let registry = RuleRegistry::default_rules();
//! let report = registry.lint_file(Path::new("hero_rig.json")).unwrap();
//!
//! if !report.ok {
//!     for issue in &report.errors {
//!         eprintln!("ERROR: {} - {}", issue.rule_id, issue.message);
//!     }
//! }
//! ```

pub mod registry;
pub mod report;
pub mod rules;

pub use registry::{RuleMetadata, RuleRegistry};
pub use report::{LintIssue, LintReport, LintSummary, Severity};
pub use rules::{LintError, RigLintRule};
