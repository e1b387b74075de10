//! Arm modules, one per side.
//!
//! An arm is the three-joint limb pattern with a leading FK shoulder.
//! The base chain shoulder/upperarm/forearm/hand hangs off `spine_3`;
//! the limb runs on the last three joints with the base shoulder as the
//! FK chain's parent, the IK hand parented to the shared `ik_hand_prop`
//! grab bone, and the pole target held by `root_extract`. The shoulder
//! itself only has an FK layer. Twist chains cover both segments.

use rigforge_spec::Side;

use crate::constants::{layers, AUTO_SHAPE_SCALE_OFFSET_LIMB};
use crate::constraint::Constraint;
use crate::context::{ConstraintAttr, CtrlStyle, JointSettings, RigBuildContext};
use crate::drivers::{expr, PropertyDef};
use crate::error::RigResult;
use crate::graph::{JointRole, LengthMode, ParentSpec};
use crate::limb::{build_three_joint_limb, BendAxis, LimbSpec, PoleParent};
use crate::modules::ik_prop::IK_HAND_PROP;
use crate::modules::ModuleBuilder;
use crate::naming;
use crate::rig::{groups, ModuleRecord, SnapInfo};
use crate::shapes::{ShapeSpec, ShapeStyle};
use crate::twist::{build_twist_chain, TwistSegment, TwistSpec};

const FIRST_PARENT: &str = "spine_3";

pub struct ArmBuilder {
    pub side: Side,
}

impl ArmBuilder {
    fn chain(&self) -> [String; 4] {
        [
            naming::sided("shoulder", self.side),
            naming::sided("upperarm", self.side),
            naming::sided("forearm", self.side),
            naming::sided("hand", self.side),
        ]
    }
}

impl ModuleBuilder for ArmBuilder {
    fn name(&self) -> String {
        naming::sided("arm", self.side)
    }

    fn requires(&self) -> Vec<String> {
        let mut needs = vec![
            "root".to_string(),
            "root_extract".to_string(),
            FIRST_PARENT.to_string(),
            IK_HAND_PROP.to_string(),
        ];
        needs.extend(self.chain());
        needs
    }

    fn build(&self, ctx: &mut RigBuildContext<'_>) -> RigResult<()> {
        let module = self.name();
        let chain = self.chain();
        let shoulder = chain[0].as_str();
        let limb_chain = [chain[1].as_str(), chain[2].as_str(), chain[3].as_str()];
        let pole_name = naming::sided("elbow", self.side);
        let prop_joint = ctx.create_module_prop_joint(&module)?;

        // Base chain.
        for (index, name) in chain.iter().enumerate() {
            let parent = if index == 0 {
                FIRST_PARENT.to_string()
            } else {
                chain[index - 1].clone()
            };
            ctx.graph.set_parent(name, Some(&parent))?;
            ctx.apply_settings(
                name,
                &JointSettings::on_layer(layers::BASE)
                    .group(groups::BASE)
                    .deforming()
                    .lock(true, false, true)
                    .role(JointRole::Base),
            )?;
        }

        // FK shoulder ahead of the limb. There is no IK counterpart, so
        // the bind mutes outside FK mode and the base joint holds its
        // rest pose.
        let fk_shoulder = naming::fk(shoulder);
        ctx.graph.duplicate(
            shoulder,
            &fk_shoulder,
            ParentSpec::Joint(FIRST_PARENT),
            LengthMode::Full,
        )?;
        ctx.apply_settings(
            &fk_shoulder,
            &JointSettings::on_layer(layers::FK)
                .group(groups::FK)
                .lock(true, false, true)
                .role(JointRole::Fk)
                .shape(ShapeSpec::auto(
                    ShapeStyle::Circle,
                    AUTO_SHAPE_SCALE_OFFSET_LIMB,
                )),
        )?;

        let bend_back = ctx.options.forearm_bend_back_limit;
        let build = build_three_joint_limb(
            ctx,
            &LimbSpec {
                module: &module,
                prop_joint: &prop_joint,
                chain: limb_chain,
                pole_name: &pole_name,
                side: self.side,
                bend_axis: BendAxis::NegX,
                bend_back_deg: bend_back,
                first_parent: shoulder,
                ik_parent: IK_HAND_PROP,
                pole_parent: PoleParent::Joint("root_extract"),
                with_touch: true,
            },
        )?;

        let switch_prop = format!("switch_{module}");
        ctx.graph.add_constraint(
            shoulder,
            Constraint::copy_rotation("bind_to_fk_1", &fk_shoulder).muted(),
        )?;
        ctx.prop_to_drive_constraint(
            &prop_joint,
            PropertyDef::new(&switch_prop, 0.0, 2.0, 0.0, "0:fk, 1:ik, 2:base"),
            shoulder,
            "bind_to_fk_1",
            ConstraintAttr::Mute,
            expr::FK_MUTE,
        )?;

        build_twist_chain(
            ctx,
            &TwistSpec {
                segment: TwistSegment::Upperarm,
                source: limb_chain[0],
                end_affector: limb_chain[2],
                count: ctx.options.twist_upperarm,
            },
        )?;
        build_twist_chain(
            ctx,
            &TwistSpec {
                segment: TwistSegment::Forearm,
                source: limb_chain[1],
                end_affector: limb_chain[2],
                count: ctx.options.twist_forearm,
            },
        )?;

        let mut relevant = vec![fk_shoulder];
        relevant.extend(build.relevant.clone());

        ctx.bone_visibility(&prop_joint, &module, &relevant, CtrlStyle::Ik)?;
        ctx.set_module_on_joints(&module, &relevant)?;
        ctx.register_module(ModuleRecord {
            name: module,
            prop_joint: Some(prop_joint),
            properties: Vec::new(),
            relevant_joints: relevant,
            snap: vec![SnapInfo::ThreeJointLimb(build.snap)],
            switchable: true,
        });
        Ok(())
    }
}
