//! Holds the rule set and runs it over a document.

use std::collections::HashSet;
use std::path::Path;

use crate::report::LintReport;
use crate::rules::{graph, modules, twist, wiring, LintError, RigLintRule};
use rigforge_backend_biped::ControlRig;

/// The rule set for one lint run, with per-rule enable state.
pub struct RuleRegistry {
    rules: Vec<Box<dyn RigLintRule>>,
    disabled_rules: HashSet<String>,
    enabled_only: Option<HashSet<String>>,
}

impl RuleRegistry {
    /// An empty registry. Useful for running a single rule in isolation.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            disabled_rules: HashSet::new(),
            enabled_only: None,
        }
    }

    /// The full built-in rule set.
    pub fn default_rules() -> Self {
        let mut registry = Self::new();
        let packs = [
            graph::all_rules(),
            wiring::all_rules(),
            modules::all_rules(),
            twist::all_rules(),
        ];
        for rule in packs.into_iter().flatten() {
            registry.register(rule);
        }
        registry
    }

    pub fn register(&mut self, rule: Box<dyn RigLintRule>) {
        self.rules.push(rule);
    }

    /// Keeps the rule registered but skips it during runs.
    pub fn disable_rule(&mut self, rule_id: &str) {
        self.disabled_rules.insert(rule_id.to_string());
    }

    /// Restricts runs to the named rules. Disables win over this list.
    pub fn enable_only(&mut self, rule_ids: &[&str]) {
        self.enabled_only = Some(rule_ids.iter().map(|s| s.to_string()).collect());
    }

    /// Id, description, and default severity of every registered rule.
    pub fn rule_metadata(&self) -> Vec<RuleMetadata> {
        self.rules
            .iter()
            .map(|r| RuleMetadata {
                id: r.id().to_string(),
                description: r.description().to_string(),
                severity: r.default_severity(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn is_rule_enabled(&self, rule_id: &str) -> bool {
        if self.disabled_rules.contains(rule_id) {
            return false;
        }
        match &self.enabled_only {
            Some(enabled) => enabled.contains(rule_id),
            None => true,
        }
    }

    /// Runs every enabled rule over the document and collects the
    /// findings into one report.
    pub fn lint(&self, rig: &ControlRig) -> LintReport {
        let mut report = LintReport::new();
        let enabled = self.rules.iter().filter(|r| self.is_rule_enabled(r.id()));
        for rule in enabled {
            for issue in rule.check(rig) {
                report.add_issue(issue);
            }
        }
        report
    }

    /// Parses a rig document from disk and lints it.
    pub fn lint_file(&self, path: &Path) -> Result<LintReport, LintError> {
        let text = std::fs::read_to_string(path)?;
        let rig: ControlRig = serde_json::from_str(&text)?;
        Ok(self.lint(&rig))
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::default_rules()
    }
}

/// Introspection record for one rule. Backs the CLI's rule listing.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RuleMetadata {
    pub id: String,
    pub description: String,
    pub severity: crate::report::Severity,
}
