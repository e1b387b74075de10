//! Rigforge Biped Backend
//!
//! Synthesizes a humanoid control rig from a validated source skeleton,
//! its collaborating meshes, and an options record. The output is a
//! plain-data document: joints with ordered constraints, animator
//! properties, property-to-attribute driver edges, bone groups, and
//! per-module metadata. Nothing here talks to a host application; a
//! downstream engine binds the document and evaluates the drivers.
//!
//! # Example
//!
//! ```
//! use rigforge_backend_biped::synthesize;
//! use rigforge_spec::{MeshData, RigOptions, SkeletonPreset};
//!
//! let skeleton = SkeletonPreset::BipedV1.source_skeleton();
//! let meshes = vec![MeshData::box_shell("body", [0.0, 0.0, 0.9], [0.4, 0.25, 0.9])];
//! let rig = synthesize(&skeleton, &meshes, &RigOptions::default()).unwrap();
//!
//! assert!(rig.joint("root").is_some());
//! assert_eq!(rig.input_hash.len(), 64);
//! ```
//!
//! # Modules
//!
//! - [`graph`]: The joint graph and its mutation primitives
//! - [`constraint`]: Constraint records the engine evaluates
//! - [`drivers`]: Property definitions, driver edges, expression dialect
//! - [`shapes`]: Proxy widget binding and auto sizing
//! - [`raycast`]: The surface probe over the merged mesh snapshot
//! - [`context`]: Build state threaded through every module builder
//! - [`limb`]: The shared three-joint IK limb pattern
//! - [`twist`]: Segment twist chains
//! - [`modules`]: Region builders and the dependency-ordered runner
//! - [`rig`]: The finished document
//! - [`metrics`]: Census counts over a finished document

pub mod constants;
pub mod constraint;
pub mod context;
pub mod drivers;
pub mod error;
pub mod graph;
pub mod limb;
pub mod math;
pub mod metrics;
pub mod modules;
pub mod naming;
pub mod raycast;
pub mod rig;
pub mod shapes;
pub mod twist;

use rigforge_spec::hash::canonical_input_hash;
use rigforge_spec::{validate_inputs, MeshData, RigOptions, SourceSkeleton};

pub use context::RigBuildContext;
pub use error::{RigError, RigResult};
pub use metrics::{summarize, RigMetrics};
pub use modules::{default_builders, run_builders, ModuleBuilder};
pub use raycast::{MeshProbe, NullProbe, SurfaceProbe};
pub use rig::{ControlRig, ModuleRecord};

use crate::constants::layers;

/// Layers the finished rig leaves visible for the animator.
const VISIBLE_LAYERS: [u8; 5] = [
    layers::ROOT,
    layers::FK,
    layers::CTRL_IK,
    layers::TOUCH,
    layers::IK_PROP,
];

/// Synthesizes a control rig document from the given inputs.
///
/// Runs the precondition ladder first and refuses to start on any
/// failure, leaving the inputs untouched. The mesh snapshot is merged
/// once; every builder probes that copy. Builders run in dependency
/// order; a failing module aborts the whole run carrying its name.
pub fn synthesize(
    skeleton: &SourceSkeleton,
    meshes: &[MeshData],
    options: &RigOptions,
) -> RigResult<ControlRig> {
    let validation = validate_inputs(skeleton, meshes, options);
    if !validation.is_ok() {
        return Err(RigError::preconditions(&validation));
    }

    let input_hash = canonical_input_hash(skeleton, meshes, options)?;
    let probe = MeshProbe::from_meshes(meshes);
    let mut ctx = RigBuildContext::new(skeleton, options, &probe)?;

    run_builders(&mut ctx, &default_builders())?;

    ctx.visible_layers = VISIBLE_LAYERS.to_vec();
    ctx.finish(input_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rigforge_spec::{RigStamp, SkeletonPreset};

    fn fixture() -> (SourceSkeleton, Vec<MeshData>, RigOptions) {
        (
            SkeletonPreset::BipedV1.source_skeleton(),
            vec![MeshData::box_shell(
                "body",
                [0.0, 0.0, 0.9],
                [0.4, 0.25, 0.9],
            )],
            RigOptions::default(),
        )
    }

    #[test]
    fn test_synthesize_builds_every_region() {
        let (skeleton, meshes, options) = fixture();
        let rig = synthesize(&skeleton, &meshes, &options).unwrap();

        assert_eq!(rig.stamp, RigStamp::Generated);
        assert_eq!(rig.source_skeleton, "biped_v1");
        let modules: Vec<&str> = rig.modules.iter().map(|m| m.name.as_str()).collect();
        for expected in [
            "root", "spine", "ik_prop", "head", "arm_l", "arm_r", "leg_l", "leg_r",
            "fingers_l", "fingers_r", "springs", "face",
        ] {
            assert!(modules.contains(&expected), "missing module {expected}");
        }
        assert_eq!(rig.visible_layers, VISIBLE_LAYERS.to_vec());
    }

    #[test]
    fn test_synthesize_refuses_bad_inputs() {
        let (skeleton, _, options) = fixture();
        let err = synthesize(&skeleton, &[], &options).unwrap_err();
        match err {
            RigError::PreconditionFailed { reasons } => assert!(!reasons.is_empty()),
            other => panic!("expected precondition failure, got {other}"),
        }
    }

    #[test]
    fn test_synthesize_is_deterministic() {
        let (skeleton, meshes, options) = fixture();
        let first = synthesize(&skeleton, &meshes, &options).unwrap();
        let second = synthesize(&skeleton, &meshes, &options).unwrap();
        assert_eq!(
            first.canonical_hash().unwrap(),
            second.canonical_hash().unwrap()
        );
        assert_eq!(first.input_hash, second.input_hash);
    }
}
