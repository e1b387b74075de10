//! Module record rules.
//!
//! Snap tooling and animator UIs read module records without looking at
//! the graph, so a record that names missing joints or carries bad
//! property bounds breaks them even when the rig itself poses fine.

use std::collections::HashSet;

use crate::report::{LintIssue, Severity};
use crate::rules::RigLintRule;
use rigforge_backend_biped::rig::SnapInfo;
use rigforge_backend_biped::ControlRig;

/// Returns all module record rules.
pub fn all_rules() -> Vec<Box<dyn RigLintRule>> {
    vec![Box::new(PropertyBounds), Box::new(MissingJoint)]
}

/// Properties sit on their module's single holder with sane bounds.
struct PropertyBounds;

impl RigLintRule for PropertyBounds {
    fn id(&self) -> &'static str {
        "module/property-bounds"
    }

    fn description(&self) -> &'static str {
        "Each module's properties live on its one prop holder with min <= default <= max"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, rig: &ControlRig) -> Vec<LintIssue> {
        let mut issues = Vec::new();

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        for binding in &rig.properties {
            let location = format!("property:{}.{}", binding.holder, binding.def.name);
            if rig.joint(&binding.holder).is_none() {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!(
                            "property '{}' sits on missing holder '{}'",
                            binding.def.name, binding.holder
                        ),
                        "Create the holder joint or drop the binding",
                    )
                    .at(location.clone()),
                );
            }
            if !seen.insert((binding.holder.as_str(), binding.def.name.as_str())) {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!(
                            "property '{}' is declared twice on '{}'",
                            binding.def.name, binding.holder
                        ),
                        "Keep one declaration per holder",
                    )
                    .at(location.clone()),
                );
            }
            // NaN bounds fail this comparison too.
            let ordered =
                binding.def.min <= binding.def.default && binding.def.default <= binding.def.max;
            if !ordered {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!(
                            "property '{}' on '{}' defaults outside its bounds",
                            binding.def.name, binding.holder
                        ),
                        "Order the bounds as min <= default <= max",
                    )
                    .at(location)
                    .with_actual_value(binding.def.default.to_string())
                    .with_expected_range(format!("[{}, {}]", binding.def.min, binding.def.max)),
                );
            }
        }

        for module in &rig.modules {
            if module.properties.is_empty() {
                continue;
            }
            let location = format!("module:{}", module.name);
            let Some(holder) = module.prop_joint.as_deref() else {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!("module '{}' carries properties without a prop holder", module.name),
                        "Record the module's prop holder joint",
                    )
                    .at(location),
                );
                continue;
            };
            for def in &module.properties {
                if rig.property(holder, &def.name).is_none() {
                    issues.push(
                        LintIssue::new(
                            self.id(),
                            self.default_severity(),
                            format!(
                                "property '{}' of module '{}' is not held by '{holder}'",
                                def.name, module.name
                            ),
                            "Module properties live on the module's own holder",
                        )
                        .at(location.clone()),
                    );
                }
            }
        }
        issues
    }
}

/// Module records only name joints that exist.
struct MissingJoint;

impl RigLintRule for MissingJoint {
    fn id(&self) -> &'static str {
        "module/missing-joint"
    }

    fn description(&self) -> &'static str {
        "Prop holders, relevant joints, and snap slots name existing joints"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, rig: &ControlRig) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let names: HashSet<&str> = rig.joints.iter().map(|j| j.name.as_str()).collect();

        let mut flag = |module: &str, role: &str, joint: &str, issues: &mut Vec<LintIssue>| {
            if !names.contains(joint) {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!("module '{module}' lists missing {role} '{joint}'"),
                        "Point the record at an existing joint",
                    )
                    .at(format!("module:{module}")),
                );
            }
        };

        for module in &rig.modules {
            if let Some(holder) = module.prop_joint.as_deref() {
                flag(&module.name, "prop holder", holder, &mut issues);
            }
            for joint in &module.relevant_joints {
                flag(&module.name, "relevant joint", joint, &mut issues);
            }
            for snap in &module.snap {
                match snap {
                    SnapInfo::ThreeJointLimb(limb) => {
                        for slot in limb.slots().into_iter().flatten() {
                            flag(&module.name, "snap slot", slot, &mut issues);
                        }
                    }
                    SnapInfo::JointPairs { pairs } => {
                        for (fk, ik) in pairs {
                            flag(&module.name, "snap slot", fk, &mut issues);
                            flag(&module.name, "snap slot", ik, &mut issues);
                        }
                    }
                }
            }
        }
        issues
    }
}
