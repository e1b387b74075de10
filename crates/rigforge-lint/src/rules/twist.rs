//! Twist chain rules.
//!
//! Twist joints distribute roll along a limb segment and their
//! influence tables are keyed by index, so a misnamed or gapped chain
//! weights the skin wrong without failing anywhere else.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::report::{LintIssue, Severity};
use crate::rules::RigLintRule;
use rigforge_backend_biped::graph::JointRole;
use rigforge_backend_biped::ControlRig;
use rigforge_spec::validation::MAX_TWIST_COUNT;

/// `twist_{index}_{segment}` with a positive index.
const TWIST_NAME_PATTERN: &str = r"^twist_([1-9][0-9]*)_([a-z][a-z0-9_]*)$";

static TWIST_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn twist_name_regex() -> &'static Regex {
    TWIST_NAME_REGEX.get_or_init(|| Regex::new(TWIST_NAME_PATTERN).expect("invalid regex pattern"))
}

/// Returns all twist chain rules.
pub fn all_rules() -> Vec<Box<dyn RigLintRule>> {
    vec![Box::new(ChainShape)]
}

/// Twist chains are named, tagged, and numbered the way the influence
/// tables expect.
struct ChainShape;

impl RigLintRule for ChainShape {
    fn id(&self) -> &'static str {
        "twist/chain-shape"
    }

    fn description(&self) -> &'static str {
        "Twist joints follow twist_{index}_{segment} in contiguous runs of at most three on an existing segment"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, rig: &ControlRig) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let names: HashSet<&str> = rig.joints.iter().map(|j| j.name.as_str()).collect();
        let mut chains: BTreeMap<&str, Vec<u8>> = BTreeMap::new();

        for joint in &rig.joints {
            let captures = twist_name_regex().captures(&joint.name);
            let twist_role = joint.role == Some(JointRole::Twist);
            let location = format!("joint:{}", joint.name);

            let Some(caps) = captures else {
                if twist_role {
                    issues.push(
                        LintIssue::new(
                            self.id(),
                            self.default_severity(),
                            format!(
                                "'{}' carries the twist role but is not named twist_{{index}}_{{segment}}",
                                joint.name
                            ),
                            "Rename the joint to the twist convention or drop the role",
                        )
                        .at(location),
                    );
                }
                continue;
            };

            if !twist_role {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!("'{}' is named like a twist joint but carries no twist role", joint.name),
                        "Tag the joint with the twist role or rename it",
                    )
                    .at(location.clone()),
                );
            }
            if !joint.deform {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!("twist joint '{}' does not deform", joint.name),
                        "Set the deform flag; twist joints exist to carry skin weights",
                    )
                    .at(location.clone()),
                );
            }

            let segment = caps.get(2).map_or("", |m| m.as_str());
            let index: Option<u8> = caps[1].parse().ok().filter(|i| *i <= MAX_TWIST_COUNT);
            match index {
                Some(index) => chains.entry(segment).or_default().push(index),
                None => issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!("twist index of '{}' is out of range", joint.name),
                        "Twist chains run from 1 to 3 joints",
                    )
                    .at(location)
                    .with_actual_value(caps[1].to_string())
                    .with_expected_range(format!("[1, {MAX_TWIST_COUNT}]")),
                ),
            }
        }

        for (segment, mut indices) in chains {
            if !names.contains(segment) {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!("twist chain subdivides missing segment '{segment}'"),
                        "Twist joints belong to an existing limb segment",
                    )
                    .at(format!("joint:{segment}")),
                );
            }
            indices.sort_unstable();
            let expected: Vec<u8> = (1..=indices.len() as u8).collect();
            if indices != expected {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!("twist chain of '{segment}' is not a contiguous run from 1"),
                        "Renumber the chain; influence tables are keyed by index",
                    )
                    .at(format!("joint:{segment}"))
                    .with_actual_value(format!("{indices:?}"))
                    .with_expected_range(format!("{expected:?}")),
                );
            }
        }
        issues
    }
}
