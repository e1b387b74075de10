//! Face module, tiered.
//!
//! The eye tier aims both eyes at per-eye targets hanging off a central
//! look control. The jaw tier softens the mouth: lower teeth leave the
//! jaw's parentage and trail it by a partial copy instead. The full tier
//! doubles every detail bone with a control the base glues to, and adds
//! the eyelid and lip follows on top of the glue.

use glam::Vec3;
use rigforge_spec::skeleton::{FACE_DETAIL_CENTRAL, FACE_DETAIL_SIDED};
use rigforge_spec::{RigOptions, Side};

use crate::constants::{
    layers, FACE_SHAPE_SIZE, LOOK_TARGET_OFFSET, LOOK_TARGET_SIZE, LOWER_LID_FOLLOW_EYE,
    LOWER_LIP_FOLLOW_JAW, TEETH_LOWER_FOLLOW_JAW, UPPER_LID_FOLLOW_EYE,
};
use crate::constraint::{AxisToggles, Constraint, ConstraintKind, Space};
use crate::context::{CtrlStyle, JointSettings, RigBuildContext};
use crate::error::RigResult;
use crate::graph::{JointRole, LengthMode, ParentSpec};
use crate::modules::ModuleBuilder;
use crate::naming;
use crate::rig::{groups, ModuleRecord};
use crate::shapes::{ShapeSpec, ShapeStyle};

/// Central look control name.
const LOOK: &str = "look";

pub struct FaceBuilder;

fn face_settings() -> JointSettings {
    JointSettings::on_layer(layers::FACE)
        .group(groups::FACE)
        .deforming()
        .role(JointRole::Face)
}

fn ctrl_settings() -> JointSettings {
    JointSettings::on_layer(layers::FACE_EXTRA)
        .group(groups::FACE)
        .lock(false, false, true)
        .role(JointRole::Ctrl)
        .shape(ShapeSpec::manual(ShapeStyle::Sphere, FACE_SHAPE_SIZE))
}

fn aim_settings(size: f32) -> JointSettings {
    JointSettings::on_layer(layers::FACE_EXTRA)
        .group(groups::FACE)
        .lock(false, true, true)
        .role(JointRole::Ctrl)
        .shape(ShapeSpec::manual(ShapeStyle::Sphere, size))
}

/// Local-space location glue toward a control double.
fn copy_location_local(name: impl Into<String>, target: impl Into<String>) -> Constraint {
    Constraint::new(
        name,
        Some(target.into()),
        ConstraintKind::CopyLocation {
            axes: AxisToggles::all(),
            use_offset: false,
            target_space: Space::Local,
            owner_space: Space::Local,
        },
    )
}

impl FaceBuilder {
    fn build_eyes(&self, ctx: &mut RigBuildContext<'_>, relevant: &mut Vec<String>) -> RigResult<()> {
        let eyes = [Side::Left.bone("eye"), Side::Right.bone("eye")];
        let mid = (ctx.graph.joint(&eyes[0])?.head + ctx.graph.joint(&eyes[1])?.head) / 2.0;

        let look_head = mid - Vec3::Y * LOOK_TARGET_OFFSET;
        ctx.graph.create(
            LOOK,
            look_head,
            look_head - Vec3::Y * LOOK_TARGET_SIZE,
            0.0,
            Some("head"),
        )?;
        ctx.apply_settings(LOOK, &aim_settings(LOOK_TARGET_SIZE))?;
        relevant.push(LOOK.to_string());

        for eye in &eyes {
            ctx.apply_settings(eye, &face_settings())?;

            let target = naming::target(eye);
            ctx.graph
                .duplicate(eye, &target, ParentSpec::Joint(LOOK), LengthMode::Full)?;
            ctx.graph.translate(&target, -Vec3::Y * LOOK_TARGET_OFFSET)?;
            ctx.apply_settings(&target, &aim_settings(FACE_SHAPE_SIZE))?;

            ctx.graph.add_constraint(
                eye,
                Constraint::damped_track(format!("track {target}"), &target, 0.0),
            )?;
            relevant.push(target);
        }
        Ok(())
    }

    fn build_jaw(&self, ctx: &mut RigBuildContext<'_>) -> RigResult<()> {
        for name in ["jaw", "teeth_upper", "teeth_lower", "tongue_1", "tongue_2"] {
            ctx.apply_settings(name, &face_settings())?;
        }

        // The lower teeth trail the jaw instead of riding it rigidly.
        ctx.graph.set_parent("teeth_lower", Some("head"))?;
        ctx.graph.add_constraint(
            "teeth_lower",
            Constraint::copy_rotation_local("follow jaw", "jaw")
                .with_influence(TEETH_LOWER_FOLLOW_JAW),
        )?;
        Ok(())
    }

    fn build_detail(&self, ctx: &mut RigBuildContext<'_>, relevant: &mut Vec<String>) -> RigResult<()> {
        let mut details: Vec<String> = Vec::new();
        for side in Side::both() {
            for base in FACE_DETAIL_SIDED {
                details.push(side.bone(base));
            }
        }
        details.extend(FACE_DETAIL_CENTRAL.iter().map(|n| n.to_string()));

        for name in &details {
            // Lower lips swap their jaw parentage for a partial follow,
            // mirroring the teeth.
            if name.starts_with("lip_lower") {
                ctx.graph.set_parent(name, Some("head"))?;
            }
            ctx.apply_settings(name, &face_settings())?;

            let ctrl = naming::ctrl(name);
            ctx.graph
                .duplicate(name, &ctrl, ParentSpec::SourceParent, LengthMode::Full)?;
            ctx.apply_settings(&ctrl, &ctrl_settings())?;

            ctx.graph
                .add_constraint(name, copy_location_local(format!("follow {ctrl}"), &ctrl))?;
            ctx.graph.add_constraint(
                name,
                Constraint::copy_rotation_local(format!("copy {ctrl}"), &ctrl),
            )?;
            relevant.push(ctrl);
        }

        for side in Side::both() {
            let eye = side.bone("eye");
            ctx.graph.add_constraint(
                &side.bone("eyelid_upper"),
                Constraint::copy_rotation_local(format!("follow {eye}"), &eye)
                    .with_influence(UPPER_LID_FOLLOW_EYE),
            )?;
            ctx.graph.add_constraint(
                &side.bone("eyelid_lower"),
                Constraint::copy_rotation_local(format!("follow {eye}"), &eye)
                    .with_influence(LOWER_LID_FOLLOW_EYE),
            )?;
            ctx.graph.add_constraint(
                &side.bone("lip_lower"),
                Constraint::copy_rotation_local("follow jaw", "jaw")
                    .with_influence(LOWER_LIP_FOLLOW_JAW),
            )?;
        }
        ctx.graph.add_constraint(
            "lip_lower_mid",
            Constraint::copy_rotation_local("follow jaw", "jaw").with_influence(LOWER_LIP_FOLLOW_JAW),
        )?;
        Ok(())
    }
}

impl ModuleBuilder for FaceBuilder {
    fn name(&self) -> String {
        "face".to_string()
    }

    fn requires(&self) -> Vec<String> {
        let mut needs = vec!["root".to_string(), "head".to_string()];
        for side in Side::both() {
            needs.push(side.bone("eye"));
        }
        needs
    }

    fn enabled(&self, options: &RigOptions) -> bool {
        options.face.has_eyes()
    }

    fn build(&self, ctx: &mut RigBuildContext<'_>) -> RigResult<()> {
        let module = self.name();
        let tier = ctx.options.face;
        let prop_joint = ctx.create_module_prop_joint(&module)?;
        let mut relevant: Vec<String> = Vec::new();

        self.build_eyes(ctx, &mut relevant)?;
        if tier.has_jaw() {
            self.build_jaw(ctx)?;
        }
        if tier.has_detail() {
            self.build_detail(ctx, &mut relevant)?;
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
