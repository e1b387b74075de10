//! Input validation.
//!
//! `validate_inputs` runs the full precondition ladder over a source
//! skeleton, its meshes, and the options record. Failures are collected
//! into a [`ValidationResult`], never raised; synthesis refuses to start
//! on a failed result and the inputs stay untouched.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode};
use crate::mesh::MeshData;
use crate::options::RigOptions;
use crate::skeleton::{
    eye_bones, face_detail_bones, finger_bones, jaw_bones, required_core_bones, RigStamp, Side,
    SourceSkeleton,
};

/// Pattern for valid bone names: lowercase, digits, underscores.
const BONE_NAME_PATTERN: &str = r"^[a-z][a-z0-9_]*$";

/// Maximum supported twist joints per limb segment.
pub const MAX_TWIST_COUNT: u8 = 3;

/// Meshes with fewer triangles than this trip a sparse-mesh warning.
const SPARSE_MESH_TRIANGLES: usize = 4;

static BONE_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn bone_name_regex() -> &'static Regex {
    BONE_NAME_REGEX.get_or_init(|| Regex::new(BONE_NAME_PATTERN).expect("invalid regex pattern"))
}

/// Validates a skeleton, its meshes, and the options record.
///
/// Checks run in order: stamp, mesh presence, object scale, skeleton
/// integrity, mesh integrity, required bones for the enabled options,
/// option ranges. All problems are aggregated.
pub fn validate_inputs(
    skeleton: &SourceSkeleton,
    meshes: &[MeshData],
    options: &RigOptions,
) -> ValidationResult {
    let mut result = ValidationResult::default();

    validate_stamp(skeleton, &mut result);
    validate_mesh_presence(meshes, &mut result);
    validate_object_scale(skeleton, &mut result);
    validate_skeleton_integrity(skeleton, &mut result);
    validate_mesh_integrity(meshes, &mut result);
    validate_required_bones(skeleton, options, &mut result);
    validate_option_ranges(options, &mut result);

    result
}

fn validate_stamp(skeleton: &SourceSkeleton, result: &mut ValidationResult) {
    match skeleton.stamp {
        None => result.add_error(ValidationError::with_path(
            ErrorCode::MissingStamp,
            "skeleton is not stamped for rig generation",
            "stamp",
        )),
        Some(RigStamp::Generated) => result.add_warning(ValidationWarning::with_path(
            WarningCode::AlreadyGenerated,
            "skeleton already carries a generated rig; it will be regenerated",
            "stamp",
        )),
        Some(RigStamp::Generatable) => {}
    }
}

fn validate_mesh_presence(meshes: &[MeshData], result: &mut ValidationResult) {
    if meshes.is_empty() {
        result.add_error(ValidationError::new(
            ErrorCode::NoMeshes,
            "at least one collaborating mesh is required for surface probing",
        ));
    }
}

fn validate_object_scale(skeleton: &SourceSkeleton, result: &mut ValidationResult) {
    let scale = skeleton.object_scale;
    if scale.iter().any(|s| (s - 1.0).abs() > 1e-4) {
        result.add_error(ValidationError::with_path(
            ErrorCode::NonIdentityScale,
            format!(
                "object scale must be identity, got [{}, {}, {}]",
                scale[0], scale[1], scale[2]
            ),
            "object_scale",
        ));
    }
}

fn validate_skeleton_integrity(skeleton: &SourceSkeleton, result: &mut ValidationResult) {
    let regex = bone_name_regex();
    let mut seen: HashSet<&str> = HashSet::new();

    for (i, bone) in skeleton.bones.iter().enumerate() {
        let path = format!("bones[{}]", i);
        if !regex.is_match(&bone.name) {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidName,
                format!("invalid bone name '{}'", bone.name),
                format!("{}.name", path),
            ));
        }
        if !seen.insert(bone.name.as_str()) {
            result.add_error(ValidationError::with_path(
                ErrorCode::DuplicateBone,
                format!("duplicate bone name '{}'", bone.name),
                format!("{}.name", path),
            ));
        }
        if bone.length() < 1e-5 {
            result.add_error(ValidationError::with_path(
                ErrorCode::ZeroLengthBone,
                format!("bone '{}' has zero length", bone.name),
                path.clone(),
            ));
        }
        if let Some(ref parent) = bone.parent {
            if !skeleton.has_bone(parent) {
                result.add_error(ValidationError::with_path(
                    ErrorCode::UnknownParent,
                    format!("bone '{}' references unknown parent '{}'", bone.name, parent),
                    format!("{}.parent", path),
                ));
            }
        }
    }

    for cycle_bone in parent_cycles(skeleton) {
        result.add_error(ValidationError::new(
            ErrorCode::ParentCycle,
            format!("parent chain through '{}' contains a cycle", cycle_bone),
        ));
    }
}

/// Returns one representative bone per parent cycle.
fn parent_cycles(skeleton: &SourceSkeleton) -> Vec<String> {
    let parent_of: HashMap<&str, &str> = skeleton
        .bones
        .iter()
        .filter_map(|b| b.parent.as_deref().map(|p| (b.name.as_str(), p)))
        .collect();

    let mut cycles = Vec::new();
    let mut cleared: HashSet<&str> = HashSet::new();
    for bone in &skeleton.bones {
        let mut trail: HashSet<&str> = HashSet::new();
        let mut current = bone.name.as_str();
        loop {
            if cleared.contains(current) {
                break;
            }
            if !trail.insert(current) {
                cycles.push(current.to_string());
                break;
            }
            match parent_of.get(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        cleared.extend(trail);
    }
    cycles
}

fn validate_mesh_integrity(meshes: &[MeshData], result: &mut ValidationResult) {
    for (i, mesh) in meshes.iter().enumerate() {
        let path = format!("meshes[{}]", i);
        if mesh.indices.len() % 3 != 0 {
            result.add_error(ValidationError::with_path(
                ErrorCode::RaggedTriangles,
                format!(
                    "mesh '{}' has {} indices, not a multiple of three",
                    mesh.name,
                    mesh.indices.len()
                ),
                format!("{}.indices", path),
            ));
        }
        let vertex_count = mesh.positions.len() as u32;
        if let Some(bad) = mesh.indices.iter().find(|&&ix| ix >= vertex_count) {
            result.add_error(ValidationError::with_path(
                ErrorCode::IndexOutOfRange,
                format!(
                    "mesh '{}' index {} out of range for {} vertices",
                    mesh.name, bad, vertex_count
                ),
                format!("{}.indices", path),
            ));
        }
        let finite = mesh
            .positions
            .iter()
            .all(|p| p.iter().all(|c| c.is_finite()))
            && mesh.transform.iter().all(|c| c.is_finite());
        if !finite {
            result.add_error(ValidationError::with_path(
                ErrorCode::NonFiniteMesh,
                format!("mesh '{}' contains non-finite values", mesh.name),
                path.clone(),
            ));
        }
        if mesh.triangle_count() < SPARSE_MESH_TRIANGLES {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::SparseMesh,
                format!(
                    "mesh '{}' has only {} triangles; surface probes may miss",
                    mesh.name,
                    mesh.triangle_count()
                ),
                path,
            ));
        }
    }
}

fn validate_required_bones(
    skeleton: &SourceSkeleton,
    options: &RigOptions,
    result: &mut ValidationResult,
) {
    let mut required = required_core_bones();
    if options.fingers {
        for side in Side::both() {
            required.extend(finger_bones(side));
        }
    }
    if options.face.has_eyes() {
        required.extend(eye_bones());
    }
    if options.face.has_jaw() {
        required.extend(jaw_bones());
    }
    if options.face.has_detail() {
        required.extend(face_detail_bones());
    }

    for name in required {
        if !skeleton.has_bone(&name) {
            result.add_error(ValidationError::new(
                ErrorCode::MissingBone,
                format!("required bone '{}' is missing for the enabled options", name),
            ));
        }
    }
}

fn validate_option_ranges(options: &RigOptions, result: &mut ValidationResult) {
    let counts = [
        ("twist_upperarm", options.twist_upperarm),
        ("twist_forearm", options.twist_forearm),
        ("twist_thigh", options.twist_thigh),
        ("twist_shin", options.twist_shin),
    ];
    for (field, count) in counts {
        if count > MAX_TWIST_COUNT {
            result.add_error(ValidationError::with_path(
                ErrorCode::TwistCountOutOfRange,
                format!("{} must be 0..={}, got {}", field, MAX_TWIST_COUNT, count),
                field,
            ));
        }
    }
    if !(options.pole_target_distance.is_finite() && options.pole_target_distance.abs() > 1e-5) {
        result.add_error(ValidationError::with_path(
            ErrorCode::OptionOutOfRange,
            "pole_target_distance must be finite and non-zero",
            "pole_target_distance",
        ));
    }
    for (field, value) in [
        ("forearm_bend_back_limit", options.forearm_bend_back_limit),
        ("shin_bend_back_limit", options.shin_bend_back_limit),
    ] {
        if !(0.0..180.0).contains(&value) {
            result.add_error(ValidationError::with_path(
                ErrorCode::OptionOutOfRange,
                format!("{} must be in [0, 180), got {}", field, value),
                field,
            ));
        }
    }
}
