//! Neck and head controls.
//!
//! A single ctrl pair drives the base joints directly; there is no
//! FK/IK switch here. Both controls get rotation isolation with their
//! own defaults, so the head can hold world orientation while the torso
//! moves. The optional neck twist joint splits skin deformation between
//! neck and skull.

use rigforge_spec::RigOptions;

use crate::constants::{
    layers, AUTO_SHAPE_SCALE_OFFSET, FIXATE_CTRL_HEAD_DEFAULT, FIXATE_CTRL_NECK_DEFAULT,
    NECK_TWIST_MIN_Y_DEG, NECK_TWIST_ROTATE_BACK, NECK_TWIST_TRACK_TO_HEAD,
};
use crate::constraint::{Constraint, ConstraintKind, Space};
use crate::context::{CtrlStyle, JointSettings, RigBuildContext};
use crate::error::RigResult;
use crate::graph::{JointRole, LengthMode, ParentSpec};
use crate::limb::isolate_rotation;
use crate::modules::ModuleBuilder;
use crate::naming;
use crate::rig::{groups, ModuleRecord};
use crate::shapes::{ShapeSpec, ShapeStyle};

pub struct HeadBuilder;

impl ModuleBuilder for HeadBuilder {
    fn name(&self) -> String {
        "head".into()
    }

    fn requires(&self) -> Vec<String> {
        ["root", "spine_3", "neck", "head"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn build(&self, ctx: &mut RigBuildContext<'_>) -> RigResult<()> {
        let module = self.name();
        let prop_joint = ctx.create_module_prop_joint(&module)?;
        let mut relevant: Vec<String> = Vec::new();

        for (name, parent) in [("neck", "spine_3"), ("head", "neck")] {
            ctx.graph.set_parent(name, Some(parent))?;
            ctx.apply_settings(
                name,
                &JointSettings::on_layer(layers::BASE)
                    .group(groups::BASE)
                    .deforming()
                    .lock(true, false, true)
                    .role(JointRole::Base),
            )?;
            relevant.push(name.to_string());
        }

        let ctrl_settings = || {
            JointSettings::on_layer(layers::CTRL_IK)
                .group(groups::CENTRAL_IK)
                .lock(true, false, true)
                .role(JointRole::Ctrl)
                .shape(ShapeSpec::auto(
                    ShapeStyle::Circle,
                    AUTO_SHAPE_SCALE_OFFSET,
                ))
        };
        ctx.graph.duplicate(
            "neck",
            "ctrl_neck",
            ParentSpec::Joint("spine_3"),
            LengthMode::Full,
        )?;
        ctx.apply_settings("ctrl_neck", &ctrl_settings())?;
        isolate_rotation(
            ctx,
            &prop_joint,
            "spine_3",
            "ctrl_neck",
            "fixate_ctrl_neck",
            FIXATE_CTRL_NECK_DEFAULT,
        )?;

        ctx.graph.duplicate(
            "head",
            "ctrl_head",
            ParentSpec::Joint("ctrl_neck"),
            LengthMode::Full,
        )?;
        ctx.apply_settings("ctrl_head", &ctrl_settings())?;
        isolate_rotation(
            ctx,
            &prop_joint,
            "ctrl_neck",
            "ctrl_head",
            "fixate_ctrl_head",
            FIXATE_CTRL_HEAD_DEFAULT,
        )?;

        // Always-on binds; the head module has no switch.
        ctx.graph.add_constraint(
            "neck",
            Constraint::copy_rotation("copy ctrl_neck", "ctrl_neck"),
        )?;
        ctx.graph.add_constraint(
            "head",
            Constraint::copy_rotation("copy ctrl_head", "ctrl_head"),
        )?;
        relevant.push("ctrl_neck".to_string());
        relevant.push("ctrl_head".to_string());

        if ctx.options.twist_neck {
            build_neck_twist(ctx)?;
        }

        ctx.bone_visibility(&prop_joint, &module, &relevant, CtrlStyle::Ctrl)?;
        ctx.set_module_on_joints(&module, &relevant)?;
        ctx.register_module(ModuleRecord {
            name: module,
            prop_joint: Some(prop_joint),
            properties: Vec::new(),
            relevant_joints: relevant,
            snap: Vec::new(),
            switchable: false,
        });
        Ok(())
    }
}

/// Half-length deform joint that carries part of the head's rotation
/// down the neck skin.
fn build_neck_twist(ctx: &mut RigBuildContext<'_>) -> RigResult<()> {
    let twist = naming::twist(1, "neck");
    ctx.graph
        .duplicate("neck", &twist, ParentSpec::SourceParent, LengthMode::Half)?;
    ctx.apply_settings(
        &twist,
        &JointSettings::on_layer(layers::TWIST)
            .group(groups::TWIST)
            .deforming()
            .lock(true, false, true)
            .role(JointRole::Twist),
    )?;
    ctx.graph.add_constraint(
        &twist,
        Constraint::copy_rotation("copy head", "head").with_influence(NECK_TWIST_ROTATE_BACK),
    )?;
    ctx.graph.add_constraint(
        &twist,
        Constraint::new(
            "limit rotation",
            None,
            ConstraintKind::LimitRotation {
                x: None,
                y: Some((NECK_TWIST_MIN_Y_DEG.to_radians(), 0.0)),
                z: None,
                transform_limit: false,
                owner_space: Space::Local,
            },
        ),
    )?;
    ctx.graph.add_constraint(
        &twist,
        Constraint::damped_track("track head", "head", 0.0)
            .with_influence(NECK_TWIST_TRACK_TO_HEAD),
    )?;
    Ok(())
}
