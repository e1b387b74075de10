//! Joint graph structure rules.
//!
//! The builder enforces these invariants at construction time; the lint
//! re-checks them on the serialized document so hand-edited or
//! re-imported rigs get the same guarantees.

use std::collections::{HashMap, HashSet};

use crate::report::{LintIssue, Severity};
use crate::rules::RigLintRule;
use rigforge_backend_biped::graph::TransformLocks;
use rigforge_backend_biped::ControlRig;

/// Armature layer count of the host document format.
const ARMATURE_LAYERS: u8 = 32;

/// Returns all graph structure rules.
pub fn all_rules() -> Vec<Box<dyn RigLintRule>> {
    vec![
        Box::new(ParentCycle),
        Box::new(LayerRange),
        Box::new(ShapeAnchors),
    ]
}

/// Parent links must form a forest.
struct ParentCycle;

impl RigLintRule for ParentCycle {
    fn id(&self) -> &'static str {
        "graph/parent-cycle"
    }

    fn description(&self) -> &'static str {
        "Parent links form a forest: every parent exists and no chain loops"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, rig: &ControlRig) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let parents: HashMap<&str, Option<&str>> = rig
            .joints
            .iter()
            .map(|j| (j.name.as_str(), j.parent.as_deref()))
            .collect();

        for joint in &rig.joints {
            if let Some(parent) = joint.parent.as_deref() {
                if !parents.contains_key(parent) {
                    issues.push(
                        LintIssue::new(
                            self.id(),
                            self.default_severity(),
                            format!("parent '{parent}' of '{}' does not exist", joint.name),
                            "Create the parent joint or clear the parent link",
                        )
                        .at(format!("joint:{}", joint.name)),
                    );
                }
            }
        }

        // Walk up from every joint. The first name seen twice closes a
        // loop; members are remembered so each loop reports once.
        let mut in_cycle: HashSet<&str> = HashSet::new();
        for joint in &rig.joints {
            if in_cycle.contains(joint.name.as_str()) {
                continue;
            }
            let mut trail: Vec<&str> = vec![joint.name.as_str()];
            let mut cursor = joint.parent.as_deref();
            while let Some(name) = cursor {
                if let Some(pos) = trail.iter().position(|n| *n == name) {
                    for member in &trail[pos..] {
                        in_cycle.insert(member);
                    }
                    issues.push(
                        LintIssue::new(
                            self.id(),
                            self.default_severity(),
                            format!("parent chain of '{}' loops back onto itself", trail[pos]),
                            "Reparent one joint to break the loop",
                        )
                        .at(format!("joint:{}", trail[pos])),
                    );
                    break;
                }
                if in_cycle.contains(name) {
                    break;
                }
                trail.push(name);
                cursor = parents.get(name).copied().flatten();
            }
        }

        issues
    }
}

/// Every joint sits on exactly one valid armature layer.
struct LayerRange;

impl RigLintRule for LayerRange {
    fn id(&self) -> &'static str {
        "graph/layer-range"
    }

    fn description(&self) -> &'static str {
        "Every joint sits on exactly one armature layer in [0, 32), and the visible set stays in range"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, rig: &ControlRig) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        for joint in &rig.joints {
            if joint.layer >= ARMATURE_LAYERS {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!("'{}' sits on layer {} outside the armature", joint.name, joint.layer),
                        "Move the joint onto a layer in [0, 32)",
                    )
                    .at(format!("joint:{}", joint.name))
                    .with_actual_value(joint.layer.to_string())
                    .with_expected_range("[0, 32)"),
                );
            }
        }
        for layer in &rig.visible_layers {
            if *layer >= ARMATURE_LAYERS {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!("visible layer {layer} is outside the armature"),
                        "Drop the entry or move it into [0, 32)",
                    )
                    .at("visible_layers")
                    .with_actual_value(layer.to_string())
                    .with_expected_range("[0, 32)"),
                );
            }
        }
        issues
    }
}

/// Shape anchor leaves are display plumbing and must stay inert.
struct ShapeAnchors;

impl RigLintRule for ShapeAnchors {
    fn id(&self) -> &'static str {
        "graph/shape-anchor"
    }

    fn description(&self) -> &'static str {
        "Shape anchor joints are locked, non-deforming, childless, and off the visible layers"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, rig: &ControlRig) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let mut child_count: HashMap<&str, usize> = HashMap::new();
        for joint in &rig.joints {
            if let Some(parent) = joint.parent.as_deref() {
                *child_count.entry(parent).or_insert(0) += 1;
            }
        }

        for joint in &rig.joints {
            let Some(binding) = &joint.shape else {
                continue;
            };
            let Some(anchor_name) = binding.anchor.as_deref() else {
                continue;
            };
            let location = format!("joint:{anchor_name}");
            let Some(anchor) = rig.joint(anchor_name) else {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!("shape anchor '{anchor_name}' of '{}' does not exist", joint.name),
                        "Create the anchor leaf or drop the binding's anchor",
                    )
                    .at(location),
                );
                continue;
            };
            if anchor.locks != TransformLocks::all() {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!("shape anchor '{anchor_name}' is grabbable"),
                        "Lock all transform channels on the anchor",
                    )
                    .at(location.clone()),
                );
            }
            if anchor.deform {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!("shape anchor '{anchor_name}' deforms the mesh"),
                        "Clear the deform flag on the anchor",
                    )
                    .at(location.clone()),
                );
            }
            if child_count.get(anchor_name).copied().unwrap_or(0) > 0 {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!("shape anchor '{anchor_name}' has children"),
                        "Reparent the children; anchors are leaves",
                    )
                    .at(location.clone()),
                );
            }
            if rig.visible_layers.contains(&anchor.layer) {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!("shape anchor '{anchor_name}' sits on a visible layer"),
                        "Move the anchor onto a hidden layer",
                    )
                    .at(location),
                );
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use pretty_assertions::assert_eq;
    use rigforge_backend_biped::graph::Joint;
    use rigforge_backend_biped::shapes::{ShapeBinding, ShapeStyle};
    use rigforge_spec::RigStamp;

    fn joint(name: &str, parent: Option<&str>) -> Joint {
        Joint {
            name: name.into(),
            head: Vec3::ZERO,
            tail: Vec3::new(0.0, 0.1, 0.0),
            roll: 0.0,
            parent: parent.map(Into::into),
            layer: 0,
            group: None,
            deform: false,
            locks: TransformLocks::none(),
            role: None,
            module: None,
            shape: None,
            ik_dof: None,
            hide: false,
            constraints: Vec::new(),
        }
    }

    fn rig(joints: Vec<Joint>) -> ControlRig {
        ControlRig {
            name: "fixture_rig".into(),
            source_skeleton: "fixture".into(),
            input_hash: "0".repeat(64),
            stamp: RigStamp::Generated,
            joints,
            modules: Vec::new(),
            properties: Vec::new(),
            drivers: Vec::new(),
            groups: Vec::new(),
            visible_layers: vec![16, 8],
            notes: Vec::new(),
        }
    }

    #[test]
    fn test_clean_forest_passes_every_graph_rule() {
        let doc = rig(vec![
            joint("root", None),
            joint("hips", Some("root")),
            joint("spine_1", Some("hips")),
        ]);
        for rule in all_rules() {
            assert_eq!(rule.check(&doc).len(), 0, "rule {} fired", rule.id());
        }
    }

    #[test]
    fn test_dangling_parent_is_flagged() {
        let doc = rig(vec![joint("hips", Some("ghost"))]);
        let issues = ParentCycle.check(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("'ghost'"));
        assert_eq!(issues[0].location.as_deref(), Some("joint:hips"));
    }

    #[test]
    fn test_parent_loop_reports_once() {
        // Three joints in a loop plus one hanging off it.
        let doc = rig(vec![
            joint("a", Some("b")),
            joint("b", Some("c")),
            joint("c", Some("a")),
            joint("d", Some("a")),
        ]);
        let issues = ParentCycle.check(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("loops"));
    }

    #[test]
    fn test_self_parent_is_a_loop() {
        let doc = rig(vec![joint("ouroboros", Some("ouroboros"))]);
        let issues = ParentCycle.check(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location.as_deref(), Some("joint:ouroboros"));
    }

    #[test]
    fn test_layer_out_of_range() {
        let mut doc = rig(vec![joint("root", None)]);
        doc.joints[0].layer = 40;
        doc.visible_layers.push(33);
        let issues = LayerRange.check(&doc);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].actual_value.as_deref(), Some("40"));
        assert_eq!(issues[1].location.as_deref(), Some("visible_layers"));
    }

    #[test]
    fn test_anchor_must_stay_inert() {
        let mut owner = joint("ctrl_waist", None);
        owner.shape = Some(ShapeBinding {
            style: ShapeStyle::Circle,
            scale: 0.2,
            anchor: Some("shape_ctrl_waist".into()),
        });
        // Unlocked, deforming, and sitting on a visible layer.
        let mut anchor = joint("shape_ctrl_waist", Some("ctrl_waist"));
        anchor.deform = true;
        anchor.layer = 16;
        let doc = rig(vec![owner, anchor]);

        let issues = ShapeAnchors.check(&doc);
        assert_eq!(issues.len(), 3);

        let mut doc = doc;
        doc.joints[1].locks = TransformLocks::all();
        doc.joints[1].deform = false;
        doc.joints[1].layer = 24;
        assert_eq!(ShapeAnchors.check(&doc).len(), 0);
    }

    #[test]
    fn test_missing_anchor_is_flagged() {
        let mut owner = joint("ctrl_waist", None);
        owner.shape = Some(ShapeBinding {
            style: ShapeStyle::Circle,
            scale: 0.2,
            anchor: Some("shape_ctrl_waist".into()),
        });
        let doc = rig(vec![owner]);
        let issues = ShapeAnchors.check(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("does not exist"));
    }

    #[test]
    fn test_anchor_with_a_child_is_flagged() {
        let mut owner = joint("ctrl_waist", None);
        owner.shape = Some(ShapeBinding {
            style: ShapeStyle::Circle,
            scale: 0.2,
            anchor: Some("shape_ctrl_waist".into()),
        });
        let mut anchor = joint("shape_ctrl_waist", Some("ctrl_waist"));
        anchor.locks = TransformLocks::all();
        anchor.layer = 24;
        let stray = joint("stray", Some("shape_ctrl_waist"));
        let doc = rig(vec![owner, anchor, stray]);
        let issues = ShapeAnchors.check(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("children"));
    }
}
