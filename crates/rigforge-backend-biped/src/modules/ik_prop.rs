//! Shared prop attachment joint.
//!
//! `ik_hand_prop` is a free-floating duplicate of the right hand parented
//! under `root_extract`. Both hands' IK targets parent to it, so a rifle
//! or a two-handed sword is animated by moving one joint.

use crate::constants::{layers, TARGET_BONE_SIZE};
use crate::context::{JointSettings, RigBuildContext};
use crate::error::RigResult;
use crate::graph::{JointRole, LengthMode, ParentSpec};
use crate::modules::ModuleBuilder;
use crate::rig::{groups, ModuleRecord};
use crate::shapes::{ShapeSpec, ShapeStyle};

pub const IK_HAND_PROP: &str = "ik_hand_prop";

pub struct IkPropBuilder;

impl ModuleBuilder for IkPropBuilder {
    fn name(&self) -> String {
        "ik_prop".into()
    }

    fn requires(&self) -> Vec<String> {
        vec!["hand_r".to_string(), "root_extract".to_string()]
    }

    fn build(&self, ctx: &mut RigBuildContext<'_>) -> RigResult<()> {
        let module = self.name();
        ctx.graph.duplicate(
            "hand_r",
            IK_HAND_PROP,
            ParentSpec::Joint("root_extract"),
            LengthMode::Full,
        )?;
        ctx.apply_settings(
            IK_HAND_PROP,
            &JointSettings::on_layer(layers::IK_PROP)
                .group(groups::IK_PROP)
                .lock(false, false, true)
                .role(JointRole::IkProp)
                .shape(ShapeSpec::manual(ShapeStyle::Cube, TARGET_BONE_SIZE)),
        )?;

        let relevant = vec![IK_HAND_PROP.to_string()];
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
    use crate::modules::root::RootBuilder;
    use crate::raycast::NullProbe;
    use rigforge_spec::{RigOptions, SkeletonPreset, SourceSkeleton};

    #[test]
    fn test_prop_joint_mirrors_the_right_hand() {
        let skeleton: &'static SourceSkeleton =
            Box::leak(Box::new(SkeletonPreset::BipedV1.source_skeleton()));
        let options: &'static RigOptions = Box::leak(Box::new(RigOptions::default()));
        let mut ctx = RigBuildContext::new(skeleton, options, &NullProbe).unwrap();
        RootBuilder.build(&mut ctx).unwrap();
        IkPropBuilder.build(&mut ctx).unwrap();

        let prop = ctx.graph.joint(IK_HAND_PROP).unwrap();
        let hand = ctx.graph.joint("hand_r").unwrap();
        assert_eq!(prop.head, hand.head);
        assert_eq!(prop.parent.as_deref(), Some("root_extract"));
        assert_eq!(prop.layer, layers::IK_PROP);
        assert!(!prop.deform);
        assert_eq!(prop.role, Some(JointRole::IkProp));
    }
}
