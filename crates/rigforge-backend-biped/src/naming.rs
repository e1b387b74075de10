//! Joint name construction.
//!
//! Every generated joint name funnels through here so the layered naming
//! convention stays in one place. Pole controls are named after the
//! anatomical point they pull ("elbow_l", "knee_r"), everything else gets
//! a role prefix.

use rigforge_spec::Side;

use crate::constants::{CTRL_PREFIX, FK_PREFIX, IK_PREFIX};

/// `fk_` counterpart of a deform joint.
pub fn fk(name: &str) -> String {
    format!("{FK_PREFIX}{name}")
}

/// `ik_` counterpart of a deform joint.
pub fn ik(name: &str) -> String {
    format!("{IK_PREFIX}{name}")
}

/// `ctrl_` joint.
pub fn ctrl(name: &str) -> String {
    format!("{CTRL_PREFIX}{name}")
}

/// Sided base name, e.g. `upperarm` + left -> `upperarm_l`.
pub fn sided(base: &str, side: Side) -> String {
    format!("{base}{}", side.suffix())
}

/// Target holder of a joint, e.g. `target_elbow_l`. Used for pole
/// parents and IK end effectors.
pub fn target(name: &str) -> String {
    format!("target_{name}")
}

/// Twist sub-joint, e.g. `twist_1_upperarm_l`.
pub fn twist(index: u8, source: &str) -> String {
    format!("twist_{index}_{source}")
}

/// Anti-twist reference of a limb segment.
pub fn no_twist(source: &str) -> String {
    format!("no_twist_{source}")
}

/// Aim point the twist joints of a segment track.
pub fn twist_target(source: &str) -> String {
    format!("twist_target_{source}")
}

/// Spring corrective joint.
pub fn spring(region: &str) -> String {
    format!("spring_{region}")
}

/// Touch re-anchor control.
pub fn touch(end_joint: &str) -> String {
    format!("touch_{end_joint}")
}

/// Per-module property holder, e.g. `module_props__arm_l`.
pub fn module_props(module: &str) -> String {
    format!("module_props__{module}")
}

/// Rotation-isolation helper parent of an FK chain root.
pub fn isolate_parent(joint: &str) -> String {
    format!("parent_{joint}")
}

/// Retarget filler bridging a chain root to its first parent.
pub fn fk_filler(chain_root: &str) -> String {
    format!("fk_filler_{chain_root}")
}

/// Pole visualization line.
pub fn pole_line(pole: &str) -> String {
    format!("line_{pole}")
}

/// The animator-facing IK foot control.
pub fn ik_main(foot: &str) -> String {
    format!("{IK_PREFIX}main_{foot}")
}

/// FK-space snap target for the IK foot control.
pub fn snap_target(foot: &str) -> String {
    format!("snap_target_{foot}")
}

/// Heel pivot of the foot roll mechanism.
pub fn roll_back(foot: &str) -> String {
    format!("roll_back_{foot}")
}

/// Toe pivot of the foot roll mechanism.
pub fn roll_front(foot: &str) -> String {
    format!("roll_front_{foot}")
}

/// The foot roll dial.
pub fn roll_main(foot: &str) -> String {
    format!("roll_main_{foot}")
}

/// Driven parent of the IK toes.
pub fn ik_parent_of(toes: &str) -> String {
    format!("{IK_PREFIX}parent_{toes}")
}
