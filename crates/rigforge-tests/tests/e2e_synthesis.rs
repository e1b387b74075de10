//! End-to-end synthesis tests.
//!
//! These run the real `synthesize` entry point on the reference skeleton
//! and meshes and check the finished document the way a downstream
//! consumer would:
//!
//! - Every region module registers and the animator layer set is fixed
//! - Parenting terminates, and every cross-reference resolves
//! - The census stays internally consistent
//! - One arm module adds exactly its own joints and nothing else
//! - Proxy shape anchors stay off the animator layers

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use rigforge_backend_biped::modules::arm::ArmBuilder;
use rigforge_backend_biped::modules::ik_prop::IkPropBuilder;
use rigforge_backend_biped::modules::root::RootBuilder;
use rigforge_backend_biped::modules::ModuleBuilder;
use rigforge_backend_biped::raycast::NullProbe;
use rigforge_backend_biped::{summarize, RigBuildContext};
use rigforge_spec::{RigOptions, RigStamp, Side, SkeletonPreset, SourceSkeleton};
use rigforge_tests::fixtures::reference_rig;

// ============================================================================
// Whole-document structure
// ============================================================================

/// Every region registers under its canonical name, exactly the limb
/// and spine modules carry an FK/IK switch, and the animator sees the
/// fixed five-layer set.
#[test]
fn test_every_region_registers() {
    let rig = reference_rig();

    assert_eq!(rig.stamp, RigStamp::Generated);
    assert_eq!(rig.source_skeleton, "biped_v1");

    let modules: BTreeSet<&str> = rig.modules.iter().map(|m| m.name.as_str()).collect();
    let expected: BTreeSet<&str> = [
        "root",
        "spine",
        "ik_prop",
        "head",
        "arm_l",
        "arm_r",
        "leg_l",
        "leg_r",
        "fingers_l",
        "fingers_r",
        "springs",
        "face",
    ]
    .into_iter()
    .collect();
    assert_eq!(modules, expected);

    let switchable: BTreeSet<&str> = rig
        .modules
        .iter()
        .filter(|m| m.switchable)
        .map(|m| m.name.as_str())
        .collect();
    let expected_switchable: BTreeSet<&str> =
        ["spine", "arm_l", "arm_r", "leg_l", "leg_r"].into_iter().collect();
    assert_eq!(switchable, expected_switchable);

    assert_eq!(rig.visible_layers, vec![16, 8, 9, 10, 6]);
}

/// Every parent reference points at a joint in the document and walking
/// the parent chain terminates at a root.
#[test]
fn test_parenting_resolves_and_terminates() {
    let rig = reference_rig();
    let limit = rig.joints.len();

    for joint in &rig.joints {
        let mut cursor = joint.parent.as_deref();
        let mut steps = 0usize;
        while let Some(name) = cursor {
            steps += 1;
            assert!(
                steps <= limit,
                "parent chain from '{}' does not terminate",
                joint.name
            );
            let parent = rig
                .joint(name)
                .unwrap_or_else(|| panic!("'{}' parents missing joint '{name}'", joint.name));
            cursor = parent.parent.as_deref();
        }
    }
}

/// Driver edges and constraints only ever name joints and constraints
/// that exist in the document.
#[test]
fn test_cross_references_resolve() {
    let rig = reference_rig();

    for joint in &rig.joints {
        for constraint in &joint.constraints {
            if let Some(target) = &constraint.target {
                assert!(
                    rig.joint(target).is_some(),
                    "constraint '{}' on '{}' targets missing joint '{target}'",
                    constraint.name,
                    joint.name
                );
            }
        }
    }

    for driver in &rig.drivers {
        let target = rig
            .joint(driver.target.joint())
            .unwrap_or_else(|| panic!("driver writes to missing joint '{}'", driver.target.joint()));
        if let Some(constraint) = driver.target.constraint() {
            assert!(
                target.constraint(constraint).is_some(),
                "driver writes to missing constraint '{constraint}' on '{}'",
                target.name
            );
        }
        assert!(
            rig.joint(&driver.prop.holder).is_some(),
            "driver reads from missing holder '{}'",
            driver.prop.holder
        );
    }

    for record in &rig.modules {
        if let Some(holder) = &record.prop_joint {
            assert!(rig.joint(holder).is_some(), "module '{}' prop holder missing", record.name);
        }
        for name in &record.relevant_joints {
            assert!(
                rig.joint(name).is_some(),
                "module '{}' lists missing joint '{name}'",
                record.name
            );
        }
    }
}

/// Property bindings resolve, and every switchable module starts out on
/// its FK layer.
#[test]
fn test_switch_properties_default_to_fk() {
    let rig = reference_rig();

    for binding in &rig.properties {
        assert!(
            rig.joint(&binding.holder).is_some(),
            "property '{}' sits on missing holder '{}'",
            binding.def.name,
            binding.holder
        );
    }

    for record in rig.modules.iter().filter(|m| m.switchable) {
        let holder = record
            .prop_joint
            .as_deref()
            .unwrap_or_else(|| panic!("switchable module '{}' has no prop holder", record.name));
        let switch = rig
            .property(holder, &format!("switch_{}", record.name))
            .unwrap_or_else(|| panic!("module '{}' has no switch property", record.name));
        assert_eq!(switch.min, 0.0);
        assert_eq!(switch.max, 2.0);
        assert_eq!(switch.default, 0.0, "module '{}' must start in FK", record.name);
    }
}

// ============================================================================
// Census
// ============================================================================

/// The census is a pure function of the document and its counts agree
/// with the document itself.
#[test]
fn test_census_is_consistent() {
    let rig = reference_rig();

    let metrics = summarize(&rig);
    assert_eq!(metrics, summarize(&rig));

    assert_eq!(metrics.joint_count, rig.joints.len());
    assert_eq!(metrics.driver_count, rig.drivers.len());
    assert_eq!(metrics.property_count, rig.properties.len());
    assert_eq!(metrics.note_count, rig.notes.len());
    assert_eq!(metrics.module_count, 12);
    assert_eq!(
        metrics.joints_per_layer.values().sum::<usize>(),
        metrics.joint_count
    );
    assert!(metrics.deform_count > 0);
    assert!(metrics.deform_count < metrics.joint_count);
}

// ============================================================================
// Module isolation
// ============================================================================

/// Building one arm on a bare root adds exactly the arm's own joints.
/// Guards against modules leaking joints into each other.
#[test]
fn test_arm_module_adds_exactly_its_own_joints() {
    let skeleton: &'static SourceSkeleton =
        Box::leak(Box::new(SkeletonPreset::BipedV1.source_skeleton()));
    let options: &'static RigOptions =
        Box::leak(Box::new(RigOptions::default().with_twist_counts(0, 0, 0, 0)));
    let mut ctx = RigBuildContext::new(skeleton, options, &NullProbe).unwrap();
    RootBuilder.build(&mut ctx).unwrap();
    IkPropBuilder.build(&mut ctx).unwrap();

    let before: BTreeSet<String> = ctx.graph.names().into_iter().map(String::from).collect();
    ArmBuilder { side: Side::Left }.build(&mut ctx).unwrap();
    let after: BTreeSet<String> = ctx.graph.names().into_iter().map(String::from).collect();

    // Shape anchors are per-joint leaves; the interesting set is the
    // mechanism and control joints.
    let added: BTreeSet<&str> = after
        .difference(&before)
        .map(String::as_str)
        .filter(|name| !name.starts_with("shape_"))
        .collect();
    let expected: BTreeSet<&str> = [
        "elbow_l",
        "fk_filler_upperarm_l",
        "fk_forearm_l",
        "fk_hand_l",
        "fk_shoulder_l",
        "fk_upperarm_l",
        "ik_forearm_l",
        "ik_hand_l",
        "ik_upperarm_l",
        "line_elbow_l",
        "module_props__arm_l",
        "parent_fk_upperarm_l",
        "target_elbow_l",
        "touch_ik_hand_l",
    ]
    .into_iter()
    .collect();
    assert_eq!(added, expected);

    assert!(
        after.iter().all(|name| !name.contains("twist")),
        "zero twist counts must not grow twist joints"
    );
}

// ============================================================================
// Shape anchors
// ============================================================================

/// Widget anchors are plumbing: they must resolve, never deform, and
/// never sit on a layer the animator sees.
#[test]
fn test_shape_anchors_stay_off_animator_layers() {
    let rig = reference_rig();

    let mut anchored = 0usize;
    for joint in &rig.joints {
        if let Some(anchor) = joint.shape.as_ref().and_then(|s| s.anchor.as_ref()) {
            anchored += 1;
            let anchor_joint = rig
                .joint(anchor)
                .unwrap_or_else(|| panic!("'{}' anchors to missing joint '{anchor}'", joint.name));
            assert!(!anchor_joint.deform, "anchor '{anchor}' must not deform");
            assert!(
                !rig.visible_layers.contains(&anchor_joint.layer),
                "anchor '{anchor}' sits on visible layer {}",
                anchor_joint.layer
            );
        }
    }
    assert!(anchored > 0, "expected shaped joints with anchors");
}
