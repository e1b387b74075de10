//! Rig census metrics.
//!
//! Flat counts over a finished rig document. The CLI prints them after
//! generation and tests pin them for reference scenarios, which catches
//! silent structural drift without diffing whole documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rig::ControlRig;

/// Counts taken from a finished control rig.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RigMetrics {
    /// Total joints in the document.
    pub joint_count: usize,
    /// Joints that participate in skinning.
    pub deform_count: usize,
    /// Constraints across all joints.
    pub constraint_count: usize,
    /// Property-to-attribute driver edges.
    pub driver_count: usize,
    /// Registered modules.
    pub module_count: usize,
    /// Animator properties, over all holders.
    pub property_count: usize,
    /// Build notes (geometry query misses and the like).
    pub note_count: usize,
    /// Joints per occupied layer, keyed by layer index.
    pub joints_per_layer: BTreeMap<u8, usize>,
}

/// Takes the census of a rig document.
pub fn summarize(rig: &ControlRig) -> RigMetrics {
    let mut joints_per_layer: BTreeMap<u8, usize> = BTreeMap::new();
    for joint in &rig.joints {
        *joints_per_layer.entry(joint.layer).or_default() += 1;
    }
    RigMetrics {
        joint_count: rig.joints.len(),
        deform_count: rig.joints.iter().filter(|j| j.deform).count(),
        constraint_count: rig.joints.iter().map(|j| j.constraints.len()).sum(),
        driver_count: rig.drivers.len(),
        module_count: rig.modules.len(),
        property_count: rig.properties.len(),
        note_count: rig.notes.len(),
        joints_per_layer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::layers;
    use crate::modules::root::RootBuilder;
    use crate::modules::ModuleBuilder;
    use crate::raycast::NullProbe;
    use pretty_assertions::assert_eq;
    use rigforge_spec::{RigOptions, SkeletonPreset, SourceSkeleton};

    #[test]
    fn test_census_counts_line_up() {
        let skeleton: &'static SourceSkeleton =
            Box::leak(Box::new(SkeletonPreset::BipedV1.source_skeleton()));
        let options: &'static RigOptions = Box::leak(Box::new(RigOptions::default()));
        let mut ctx = crate::context::RigBuildContext::new(skeleton, options, &NullProbe).unwrap();
        RootBuilder.build(&mut ctx).unwrap();
        let rig = ctx.finish("0".repeat(64)).unwrap();

        let metrics = summarize(&rig);
        assert_eq!(metrics.joint_count, rig.joints.len());
        assert_eq!(metrics.module_count, 1);
        // The root control sits alone on the root layer; every seeded
        // source bone starts out on the base layer.
        assert_eq!(metrics.joints_per_layer[&layers::ROOT], 1);
        assert_eq!(
            metrics.joints_per_layer.values().sum::<usize>(),
            metrics.joint_count
        );
    }

    #[test]
    fn test_census_serializes_stably() {
        let metrics = RigMetrics {
            joint_count: 3,
            joints_per_layer: BTreeMap::from([(0, 2), (16, 1)]),
            ..RigMetrics::default()
        };
        let json = serde_json::to_string(&metrics).unwrap();
        let back: RigMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metrics);
    }
}
