//! Behavioral tests over finished documents.
//!
//! Synthesis-level structure is covered elsewhere; these tests pin what
//! the rig *does* once an engine binds it:
//!
//! - FK, IK, and base switch states never fight over a joint
//! - Twist counts, influence grading, and numbering direction
//! - Spring remaps hit identity at rest and clamp at their peaks
//! - The baked pole angle matches a recomputation from the document
//! - Mechanism joints stay off the animator layers

use pretty_assertions::assert_eq;
use rigforge_backend_biped::constraint::{ConstraintKind, TransformRemap};
use rigforge_backend_biped::drivers::{evaluate, DriverTarget};
use rigforge_backend_biped::graph::Joint;
use rigforge_backend_biped::limb::compute_pole_angle;
use rigforge_backend_biped::ControlRig;
use rigforge_spec::RigOptions;
use rigforge_tests::fixtures::{reference_rig, rig_with_options};

fn mute_expression<'a>(rig: &'a ControlRig, joint: &str, constraint: &str) -> &'a str {
    rig.drivers
        .iter()
        .find_map(|d| match &d.target {
            DriverTarget::ConstraintMute {
                joint: j,
                constraint: c,
            } if j == joint && c == constraint => Some(d.expression.as_str()),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no mute driver on '{joint}' for '{constraint}'"))
}

fn remap_of<'a>(joint: &'a Joint, name: &str) -> &'a TransformRemap {
    let constraint = joint
        .constraint(name)
        .unwrap_or_else(|| panic!("missing constraint '{name}' on '{}'", joint.name));
    match &constraint.kind {
        ConstraintKind::TransformRemap(remap) => remap,
        other => panic!("'{name}' on '{}' is not a remap: {other:?}", joint.name),
    }
}

// ============================================================================
// FK/IK switching
// ============================================================================

/// Sampling the switch range through the document's own driver
/// expressions, at most one bind constraint is live at any value, FK
/// wins at 0, IK at 1, and the base pose at 2.
#[test]
fn test_switch_states_are_mutually_exclusive() {
    let rig = reference_rig();
    let fk_mute = mute_expression(&rig, "upperarm_l", "bind_to_fk_1");
    let ik_mute = mute_expression(&rig, "upperarm_l", "bind_to_ik_1");

    for v in [0.0f32, 0.25, 0.5, 0.75, 0.99, 1.0, 1.25, 1.5, 1.99, 2.0] {
        let fk_live = evaluate(fk_mute, v).unwrap() == 0.0;
        let ik_live = evaluate(ik_mute, v).unwrap() == 0.0;
        assert!(!(fk_live && ik_live), "both binds live at switch = {v}");
    }

    assert_eq!(evaluate(fk_mute, 0.0).unwrap(), 0.0);
    assert_ne!(evaluate(ik_mute, 0.0).unwrap(), 0.0);
    assert_ne!(evaluate(fk_mute, 1.0).unwrap(), 0.0);
    assert_eq!(evaluate(ik_mute, 1.0).unwrap(), 0.0);
    assert_ne!(evaluate(fk_mute, 2.0).unwrap(), 0.0);
    assert_ne!(evaluate(ik_mute, 2.0).unwrap(), 0.0);
}

/// The IK bind influence fades linearly from full at 1 to nothing at 2,
/// handing the joint back to its rest pose.
#[test]
fn test_bind_influence_fades_toward_base() {
    let rig = reference_rig();
    let blend = rig
        .drivers
        .iter()
        .find_map(|d| match &d.target {
            DriverTarget::ConstraintInfluence { joint, constraint }
                if joint == "upperarm_l" && constraint == "bind_to_ik_1" =>
            {
                Some(d.expression.as_str())
            }
            _ => None,
        })
        .expect("bind influence driver");

    assert_eq!(evaluate(blend, 1.0).unwrap(), 1.0);
    assert_eq!(evaluate(blend, 1.5).unwrap(), 0.5);
    assert_eq!(evaluate(blend, 2.0).unwrap(), 0.0);
}

// ============================================================================
// Twist chains
// ============================================================================

/// Per-segment twist counts carry through a full synthesis, with the
/// influence grading of each segment class.
#[test]
fn test_twist_counts_follow_the_options() {
    let rig = rig_with_options(RigOptions::default().with_twist_counts(2, 1, 3, 2));

    let influence = |joint: &str| -> f32 {
        rig.joint(joint)
            .unwrap_or_else(|| panic!("missing twist joint '{joint}'"))
            .constraint("track twist target")
            .unwrap_or_else(|| panic!("'{joint}' has no track constraint"))
            .influence
    };

    assert_eq!(influence("twist_1_upperarm_l"), 0.75);
    assert_eq!(influence("twist_2_upperarm_l"), 0.5);
    assert!(rig.joint("twist_3_upperarm_l").is_none());

    assert_eq!(influence("twist_1_forearm_l"), 1.0);
    assert!(rig.joint("twist_2_forearm_l").is_none());

    assert_eq!(influence("twist_1_thigh_l"), 0.75);
    assert_eq!(influence("twist_2_thigh_l"), 0.5);
    assert_eq!(influence("twist_3_thigh_l"), 0.25);

    assert_eq!(influence("twist_1_shin_l"), 1.0);
    assert_eq!(influence("twist_2_shin_l"), 0.5);
    assert!(rig.joint("twist_3_shin_l").is_none());

    // Upper segments decouple their reference through a no-twist joint;
    // lower segments glue the target to the end affector instead.
    assert!(rig.joint("no_twist_upperarm_l").is_some());
    assert!(rig.joint("no_twist_thigh_l").is_some());
    assert!(rig.joint("no_twist_forearm_l").is_none());
    assert!(rig.joint("no_twist_shin_l").is_none());
    assert!(rig.joint("twist_target_forearm_l").is_some());
    assert!(rig.joint("twist_target_shin_l").is_some());
}

/// Upper chains number from the shoulder down, lower chains from the
/// ankle up.
#[test]
fn test_twist_numbering_direction() {
    let rig = rig_with_options(RigOptions::default().with_twist_counts(2, 1, 3, 2));

    let upperarm = rig.joint("upperarm_l").unwrap();
    let first = rig.joint("twist_1_upperarm_l").unwrap();
    let second = rig.joint("twist_2_upperarm_l").unwrap();
    assert!((first.head - upperarm.head).length() < 1e-6);
    assert!((second.head - upperarm.head).length() > (first.head - upperarm.head).length());

    let shin = rig.joint("shin_l").unwrap();
    let shin_first = rig.joint("twist_1_shin_l").unwrap();
    let shin_second = rig.joint("twist_2_shin_l").unwrap();
    assert!((shin_first.tail - shin.tail).length() < 1e-6);
    assert!((shin_first.head - shin.head).length() > (shin_second.head - shin.head).length());
}

// ============================================================================
// Spring remaps
// ============================================================================

/// The seat spring's remaps read thigh pitch: identity at rest, peak
/// scale at the forward boundary, and the input clamps past it.
#[test]
fn test_spring_bottom_remap_boundaries() {
    let rig = reference_rig();
    let bottom = rig.joint("spring_bottom_l").expect("spring bottom joint");

    let swell = remap_of(bottom, "swell forward");
    assert_eq!(swell.map(0.0), 1.0);
    assert!((swell.map(45.0_f32.to_radians()) - 1.4).abs() < 1e-6);
    assert_eq!(
        swell.map(std::f32::consts::PI),
        swell.map(45.0_f32.to_radians())
    );

    let swing = remap_of(bottom, "swing backward");
    assert_eq!(swing.map(0.0), 0.0);
    assert!((swing.map((-30.0_f32).to_radians()) - (-10.0_f32).to_radians()).abs() < 1e-6);
    assert_eq!(swing.map(-2.0), swing.map((-30.0_f32).to_radians()));

    for name in ["swell forward", "swing forward", "swell backward", "swing backward"] {
        assert!(bottom.constraint(name).is_some(), "missing '{name}'");
    }
}

// ============================================================================
// Pole angle
// ============================================================================

/// Recomputing the pole angle from the finished document's own geometry
/// reproduces the baked constraint value, and the computation itself is
/// bit-stable.
#[test]
fn test_pole_angle_recomputes_to_the_baked_value() {
    let rig = reference_rig();
    let base = rig.joint("ik_upperarm_l").unwrap();
    let end_tail = rig.joint("ik_forearm_l").unwrap().tail;
    let pole = rig.joint("elbow_l").unwrap().head;

    let first = compute_pole_angle(base, end_tail, pole).unwrap();
    let second = compute_pole_angle(base, end_tail, pole).unwrap();
    assert_eq!(first.to_bits(), second.to_bits());

    let ik = rig
        .joint("ik_forearm_l")
        .unwrap()
        .constraint("ik")
        .expect("ik constraint");
    match ik.kind {
        ConstraintKind::Ik {
            pole_angle,
            ref pole_target,
            ..
        } => {
            assert_eq!(pole_target.as_deref(), Some("elbow_l"));
            assert!(
                (first - pole_angle).abs() < 1e-6,
                "recomputed {first} vs baked {pole_angle}"
            );
        }
        ref other => panic!("unexpected kind {other:?}"),
    }
}

// ============================================================================
// Layer hygiene
// ============================================================================

/// Pure mechanism joints never land on a layer the animator sees.
#[test]
fn test_mechanism_joints_stay_off_animator_layers() {
    let rig = reference_rig();
    let prefixes = [
        "line_",
        "no_twist_",
        "twist_target_",
        "shape_",
        "parent_fk_",
        "fk_filler_",
        "module_props__",
        "snap_target_",
        "roll_back_",
        "roll_front_",
    ];

    let mut checked = 0usize;
    for joint in &rig.joints {
        let is_mechanism = prefixes.iter().any(|p| joint.name.starts_with(p))
            || joint.name == "target_elbow_l"
            || joint.name == "target_elbow_r"
            || joint.name == "target_knee_l"
            || joint.name == "target_knee_r";
        if is_mechanism {
            checked += 1;
            assert!(
                !rig.visible_layers.contains(&joint.layer),
                "mechanism joint '{}' sits on visible layer {}",
                joint.name,
                joint.layer
            );
        }
    }
    assert!(checked > 0);
}
