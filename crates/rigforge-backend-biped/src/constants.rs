//! Rig tunables.
//!
//! Values that shape the generated rig: twist influence tables, spring
//! remap boundaries, face follow factors, finger curl mapping, sizes and
//! distances, layer indices. Angles are degrees here and converted to
//! radians at the constraint build sites.

/// Prefix for forward-kinematics layer joints.
pub const FK_PREFIX: &str = "fk_";
/// Prefix for inverse-kinematics layer joints.
pub const IK_PREFIX: &str = "ik_";
/// Prefix for control-layer joints.
pub const CTRL_PREFIX: &str = "ctrl_";

/// Offset of upper-limb twist targets along the segment's local Z.
pub const TWIST_TARGET_DISTANCE: f32 = -0.4;
/// Offset used for lower-limb twist targets. Historically fixed at 1
/// independent of [`TWIST_TARGET_DISTANCE`]; kept as its own value so the
/// behavior stays reproducible.
pub const TWIST_TARGET_DISTANCE_LOWER: f32 = 1.0;

/// Multiplier applied to the longest shape-sizing ray hit.
pub const AUTO_SHAPE_MULTIPLIER: f32 = 1.5;
/// Additive scale offset for torso and head widgets.
pub const AUTO_SHAPE_SCALE_OFFSET: f32 = 0.05;
/// Additive scale offset for limb widgets.
pub const AUTO_SHAPE_SCALE_OFFSET_LIMB: f32 = 0.02;
/// Maximum distance for shape-sizing rays.
pub const SHAPE_RAY_MAX_DISTANCE: f32 = 10.0;
/// Widget scale used when every sizing ray misses the mesh.
pub const FALLBACK_SHAPE_SCALE: f32 = 0.1;

/// Maximum distance for the heel probe behind the toes.
pub const HEEL_RAY_DISTANCE: f32 = 1.0;
/// Maximum distance for spring placement probes.
pub const SPRING_RAY_DISTANCE: f32 = 1.0;

/// Length of the root control joint.
pub const ROOT_SIZE: f32 = 0.25;
/// Length of the root extraction helper joint.
pub const ROOT_EXTRACT_SIZE: f32 = 0.15;
/// Length of pole-target and snap-target joints.
pub const TARGET_BONE_SIZE: f32 = 0.05;
/// Length of module property holder joints.
pub const MODULE_PROP_BONE_SIZE: f32 = 0.05;

/// Widget scale of finger controls.
pub const FINGER_SHAPE_SIZE: f32 = 0.01;
/// Widget scale of facial detail controls.
pub const FACE_SHAPE_SIZE: f32 = 0.005;
/// Forward offset of the central look target from the eyes.
pub const LOOK_TARGET_OFFSET: f32 = 0.5;
/// Widget scale of the central look target.
pub const LOOK_TARGET_SIZE: f32 = FACE_SHAPE_SIZE * 5.0;
/// Forward offset of the spring-chest aim targets.
pub const CHEST_TARGET_DISTANCE: f32 = 1.0;
/// Widget scale of the spring-chest aim targets.
pub const CHEST_TARGET_SIZE: f32 = 0.25;

/// Twist influence tables, indexed by `[count - 1][joint_index - 1]`.
/// Upper segments number from the proximal end, lower segments from the
/// distal end.
pub const UPPERARM_TWIST_INFLUENCES: [&[f32]; 3] = [&[0.75], &[0.75, 0.5], &[0.75, 0.5, 0.25]];
/// See [`UPPERARM_TWIST_INFLUENCES`].
pub const FOREARM_TWIST_INFLUENCES: [&[f32]; 3] = [&[1.0], &[1.0, 0.5], &[1.0, 0.5, 0.25]];
/// See [`UPPERARM_TWIST_INFLUENCES`].
pub const THIGH_TWIST_INFLUENCES: [&[f32]; 3] = [&[0.75], &[0.75, 0.5], &[0.75, 0.5, 0.25]];
/// See [`UPPERARM_TWIST_INFLUENCES`].
pub const SHIN_TWIST_INFLUENCES: [&[f32]; 3] = [&[0.75], &[1.0, 0.5], &[1.0, 0.5, 0.25]];

/// How much the neck twist joint copies head rotation.
pub const NECK_TWIST_ROTATE_BACK: f32 = 0.5;
/// Lower Y rotation limit of the neck twist joint, degrees.
pub const NECK_TWIST_MIN_Y_DEG: f32 = -20.0;
/// Damped-track influence of the neck twist joint toward the head.
pub const NECK_TWIST_TRACK_TO_HEAD: f32 = 1.0;

/// Hip swing, degrees, that fully slides the thigh twist target.
pub const THIGH_TWIST_SLIDE_ROT_DEG: f32 = 90.0;
/// Slide distance of the thigh twist target at full hip swing, as a
/// fraction of thigh length.
pub const THIGH_TWIST_SLIDE_FACTOR: f32 = 0.25;

/// Spring bottom, forward swing: thigh rotation that reaches peak scale.
pub const SPRING_BOTTOM_FWD_ROT_TO_SCALE_ROT_DEG: f32 = 45.0;
/// Spring bottom, forward swing: peak scale.
pub const SPRING_BOTTOM_FWD_ROT_TO_SCALE_SCALE: f32 = 1.4;
/// Spring bottom, forward swing: thigh rotation that reaches peak rotation.
pub const SPRING_BOTTOM_FWD_ROT_TO_ROT_ROT_DEG: f32 = 90.0;
/// Spring bottom, forward swing: peak spring rotation, degrees.
pub const SPRING_BOTTOM_FWD_ROT_TO_ROT_TARGET_DEG: f32 = 60.0;
/// Spring bottom, backward swing: thigh rotation that reaches peak scale.
pub const SPRING_BOTTOM_BWD_ROT_TO_SCALE_ROT_DEG: f32 = -30.0;
/// Spring bottom, backward swing: peak scale.
pub const SPRING_BOTTOM_BWD_ROT_TO_SCALE_SCALE: f32 = 1.4;
/// Spring bottom, backward swing: thigh rotation that reaches peak rotation.
pub const SPRING_BOTTOM_BWD_ROT_TO_ROT_ROT_DEG: f32 = -30.0;
/// Spring bottom, backward swing: peak spring rotation, degrees.
pub const SPRING_BOTTOM_BWD_ROT_TO_ROT_TARGET_DEG: f32 = -10.0;

/// Waist rotation, degrees, that fully inflates the belly spring.
pub const SPRING_BELLY_ROT_DEG: f32 = 30.0;
/// Belly spring scale at full waist rotation.
pub const SPRING_BELLY_SCALE: f32 = 2.0;

/// Shoulder raise, degrees, that peaks the chest spring.
pub const SPRING_CHEST_UP_SHOULDER_ROT_DEG: f32 = 60.0;
/// Chest spring rotation at peak shoulder raise, degrees.
pub const SPRING_CHEST_UP_CHEST_ROT_DEG: f32 = 30.0;
/// Shoulder drop, degrees, that peaks the chest spring downward.
pub const SPRING_CHEST_DOWN_SHOULDER_ROT_DEG: f32 = -20.0;
/// Chest spring rotation at peak shoulder drop, degrees.
pub const SPRING_CHEST_DOWN_CHEST_ROT_DEG: f32 = -5.0;

/// How much the lower teeth follow the jaw.
pub const TEETH_LOWER_FOLLOW_JAW: f32 = 0.7;
/// How much the lower lip joints follow the jaw.
pub const LOWER_LIP_FOLLOW_JAW: f32 = 0.5;
/// How much the upper eyelid follows the eye.
pub const UPPER_LID_FOLLOW_EYE: f32 = 0.25;
/// How much the lower eyelid follows the eye.
pub const LOWER_LID_FOLLOW_EYE: f32 = 0.1;

/// Finger control Y scale at full forward curl.
pub const FINGER_CURL_SCALE_MIN: f32 = 0.5;
/// Finger control Y scale at full backward bend.
pub const FINGER_CURL_SCALE_MAX: f32 = 1.25;
/// Segment rotation at full forward curl, degrees.
pub const FINGER_CURL_FWD_ROT_DEG: f32 = -90.0;
/// Segment rotation at full backward bend, degrees.
pub const FINGER_CURL_BWD_ROT_DEG: f32 = 10.0;
/// Thumb second-segment rotation at full forward curl, degrees.
pub const THUMB_CURL_FWD_ROT_DEG: f32 = -75.0;
/// Thumb second-segment rotation at full backward bend, degrees.
pub const THUMB_CURL_BWD_ROT_DEG: f32 = 30.0;

/// Waist control copy influence from the chest control.
pub const CTRL_WAIST_COPY_CTRL_CHEST: f32 = 1.0;
/// Waist control copy influence from the hips control.
pub const CTRL_WAIST_COPY_CTRL_HIPS: f32 = 0.6;
/// First, shadowed assignment of the mid-spine waist copy influence. Not
/// applied; the second assignment below wins.
pub const IK_SPINE_2_COPY_CTRL_WAIST_SHADOWED: f32 = 0.6;
/// Effective mid-spine waist copy influence.
pub const IK_SPINE_2_COPY_CTRL_WAIST: f32 = 0.5;

/// Default rotation isolation influence of the neck control.
pub const FIXATE_CTRL_NECK_DEFAULT: f32 = 0.3;
/// Default rotation isolation influence of the head control.
pub const FIXATE_CTRL_HEAD_DEFAULT: f32 = 0.5;
/// Default rotation isolation influence of limb FK chains.
pub const FIXATE_LIMB_DEFAULT: f32 = 0.0;

/// Armature layer indices. Layers 0..8 hold deforming game joints, 8..16
/// the animator-facing controls, 16..32 internal machinery.
pub mod layers {
    /// Deforming base joints.
    pub const BASE: u8 = 0;
    /// Deforming twist joints.
    pub const TWIST: u8 = 1;
    /// Deforming spring joints.
    pub const SPRING: u8 = 2;
    /// Deforming fix-up joints.
    pub const FIX: u8 = 3;
    /// Deforming face joints.
    pub const FACE: u8 = 4;
    /// Face controls and eye targets.
    pub const FACE_EXTRA: u8 = 5;
    /// Prop attachment joints.
    pub const IK_PROP: u8 = 6;
    /// FK controls.
    pub const FK: u8 = 8;
    /// IK and general controls.
    pub const CTRL_IK: u8 = 9;
    /// Touch re-anchor controls.
    pub const TOUCH: u8 = 10;
    /// Pole targets and target lines.
    pub const TARGET: u8 = 11;
    /// Root controls.
    pub const ROOT: u8 = 16;
    /// Shape anchors and scratch helpers.
    pub const MISC: u8 = 24;
    /// Twist targets and no-twist references.
    pub const TWIST_TARGET: u8 = 25;
    /// FK machinery (fillers, fixate helpers).
    pub const FK_EXTRA: u8 = 26;
    /// IK machinery (spine mechanism, roll pivots).
    pub const CTRL_IK_EXTRA: u8 = 27;
    /// Module property holders.
    pub const MODULE_PROP: u8 = 28;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twist_tables_match_counts() {
        for table in [
            UPPERARM_TWIST_INFLUENCES,
            FOREARM_TWIST_INFLUENCES,
            THIGH_TWIST_INFLUENCES,
            SHIN_TWIST_INFLUENCES,
        ] {
            for (i, row) in table.iter().enumerate() {
                assert_eq!(row.len(), i + 1);
                assert!(row.iter().all(|inf| (0.0..=1.0).contains(inf)));
            }
        }
    }

    #[test]
    fn test_waist_copy_pair_preserved() {
        assert_eq!(IK_SPINE_2_COPY_CTRL_WAIST_SHADOWED, 0.6);
        assert_eq!(IK_SPINE_2_COPY_CTRL_WAIST, 0.5);
    }

    #[test]
    fn test_layer_indices_fit_mask() {
        use layers::*;
        for layer in [
            BASE, TWIST, SPRING, FIX, FACE, FACE_EXTRA, IK_PROP, FK, CTRL_IK, TOUCH, TARGET,
            ROOT, MISC, TWIST_TARGET, FK_EXTRA, CTRL_IK_EXTRA, MODULE_PROP,
        ] {
            assert!(layer < 32);
        }
    }
}
