//! Shared fixtures for the integration scenarios.
//!
//! Everything builds on the `BipedV1` preset plus a closed box shell
//! around the torso, so sizing and spring rays have geometry to hit.

use rigforge_backend_biped::drivers::Driver;
use rigforge_backend_biped::{synthesize, ControlRig};
use rigforge_spec::{MeshData, RigOptions, SkeletonPreset, SourceSkeleton};

/// The canonical biped source skeleton.
pub fn reference_skeleton() -> SourceSkeleton {
    SkeletonPreset::BipedV1.source_skeleton()
}

/// A box shell around the preset body.
pub fn reference_meshes() -> Vec<MeshData> {
    vec![MeshData::box_shell("body", [0.0, 0.0, 0.9], [0.4, 0.25, 0.9])]
}

/// Synthesizes the reference rig with default options.
pub fn reference_rig() -> ControlRig {
    rig_with_options(RigOptions::default())
}

/// Synthesizes the reference rig with the given options.
pub fn rig_with_options(options: RigOptions) -> ControlRig {
    synthesize(&reference_skeleton(), &reference_meshes(), &options)
        .expect("reference rig should synthesize")
}

/// All drivers wired to a module's switch property.
pub fn switch_drivers<'a>(rig: &'a ControlRig, module: &str) -> Vec<&'a Driver> {
    let prop = format!("switch_{module}");
    rig.drivers
        .iter()
        .filter(|d| d.prop.property == prop)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_inputs_pass_validation() {
        let result = rigforge_spec::validate_inputs(
            &reference_skeleton(),
            &reference_meshes(),
            &RigOptions::default(),
        );
        assert!(result.is_ok(), "fixture inputs invalid: {:?}", result.errors);
    }
}
