//! Root control.
//!
//! `root` is the world-space master every other control ultimately hangs
//! from. `root_extract` is a small helper parented to it; rig internals
//! (the torso chain, prop joints, pole holders) attach there so the root
//! joint's own channels stay an animator surface and nothing else.

use glam::Vec3;

use crate::constants::{layers, ROOT_EXTRACT_SIZE, ROOT_SIZE};
use crate::context::{JointSettings, RigBuildContext};
use crate::error::RigResult;
use crate::graph::JointRole;
use crate::modules::ModuleBuilder;
use crate::rig::{groups, ModuleRecord};
use crate::shapes::{ShapeSpec, ShapeStyle};

pub struct RootBuilder;

impl ModuleBuilder for RootBuilder {
    fn name(&self) -> String {
        "root".into()
    }

    fn requires(&self) -> Vec<String> {
        Vec::new()
    }

    fn build(&self, ctx: &mut RigBuildContext<'_>) -> RigResult<()> {
        let module = self.name();

        ctx.graph.create(
            "root",
            Vec3::ZERO,
            Vec3::new(0.0, ROOT_SIZE, 0.0),
            0.0,
            None,
        )?;
        ctx.apply_settings(
            "root",
            &JointSettings::on_layer(layers::ROOT)
                .group(groups::CENTRAL_IK)
                .lock(false, false, true)
                .role(JointRole::Ctrl)
                .shape(ShapeSpec::manual(ShapeStyle::Circle, ROOT_SIZE)),
        )?;

        ctx.graph.create(
            "root_extract",
            Vec3::ZERO,
            Vec3::new(0.0, ROOT_EXTRACT_SIZE, 0.0),
            0.0,
            Some("root"),
        )?;
        ctx.apply_settings(
            "root_extract",
            &JointSettings::on_layer(layers::MISC).lock_all(),
        )?;

        let relevant = vec!["root".to_string()];
        ctx.set_module_on_joints(&module, &relevant)?;
        ctx.register_module(ModuleRecord {
            name: module,
            prop_joint: None,
            properties: Vec::new(),
            relevant_joints: relevant,
            snap: Vec::new(),
            switchable: false,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raycast::NullProbe;
    use rigforge_spec::{RigOptions, SkeletonPreset, SourceSkeleton};

    #[test]
    fn test_root_and_extract_helper() {
        let skeleton: &'static SourceSkeleton =
            Box::leak(Box::new(SkeletonPreset::BipedV1.source_skeleton()));
        let options: &'static RigOptions = Box::leak(Box::new(RigOptions::default()));
        let mut ctx = RigBuildContext::new(skeleton, options, &NullProbe).unwrap();

        RootBuilder.build(&mut ctx).unwrap();

        let root = ctx.graph.joint("root").unwrap();
        assert_eq!(root.layer, layers::ROOT);
        assert_eq!(root.parent, None);
        assert!(root.locks.scale.iter().all(|l| *l));
        assert!(!root.locks.rotation.iter().any(|l| *l));

        let extract = ctx.graph.joint("root_extract").unwrap();
        assert_eq!(extract.parent.as_deref(), Some("root"));
        assert_eq!(extract.layer, layers::MISC);
        assert!(extract.locks.location.iter().all(|l| *l));
    }
}
