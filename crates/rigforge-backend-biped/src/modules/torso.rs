//! Torso module.
//!
//! The hips/spine chain gets two control layers. The FK layer is a plain
//! duplicate chain. The ctrl layer is `ctrl_torso` (whole-torso mover)
//! with `ctrl_hips`, `ctrl_waist`, and `ctrl_chest` riding on it; the
//! waist blends between chest and hips through stacked copy constraints,
//! and a hidden `ik_` spine chain resolves the ctrl bones into per-joint
//! transforms the base chain can bind to. Hips additionally bind
//! location, so the pelvis translates in both modes.

use crate::constants::{
    layers, AUTO_SHAPE_SCALE_OFFSET, CTRL_WAIST_COPY_CTRL_CHEST, CTRL_WAIST_COPY_CTRL_HIPS,
    IK_SPINE_2_COPY_CTRL_WAIST,
};
use crate::constraint::Constraint;
use crate::context::{ConstraintAttr, CtrlStyle, JointSettings, RigBuildContext};
use crate::drivers::{expr, PropertyDef};
use crate::error::RigResult;
use crate::graph::{JointRole, LengthMode, ParentSpec};
use crate::limb::bind_fk_ik_switch;
use crate::modules::ModuleBuilder;
use crate::naming;
use crate::rig::{groups, ModuleRecord, SnapInfo};
use crate::shapes::{ShapeSpec, ShapeStyle};

const CHAIN: [&str; 4] = ["hips", "spine_1", "spine_2", "spine_3"];
const FIRST_PARENT: &str = "root_extract";

pub struct TorsoBuilder;

impl ModuleBuilder for TorsoBuilder {
    fn name(&self) -> String {
        "spine".into()
    }

    fn requires(&self) -> Vec<String> {
        let mut needs = vec!["root".to_string(), FIRST_PARENT.to_string()];
        needs.extend(CHAIN.iter().map(|s| s.to_string()));
        needs
    }

    fn build(&self, ctx: &mut RigBuildContext<'_>) -> RigResult<()> {
        let module = self.name();
        let prop_joint = ctx.create_module_prop_joint(&module)?;
        let mut relevant: Vec<String> = Vec::new();

        for (index, name) in CHAIN.iter().enumerate() {
            let parent = if index == 0 {
                FIRST_PARENT
            } else {
                CHAIN[index - 1]
            };
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

        // FK layer. The hips control keeps location free; the pelvis
        // translates there in FK mode.
        let fk_chain: Vec<String> = CHAIN.iter().map(|name| naming::fk(name)).collect();
        for (index, (source, fk)) in CHAIN.iter().zip(&fk_chain).enumerate() {
            let parent = if index == 0 {
                FIRST_PARENT.to_string()
            } else {
                fk_chain[index - 1].clone()
            };
            ctx.graph
                .duplicate(source, fk, ParentSpec::Joint(&parent), LengthMode::Full)?;
            let lock_location = index != 0;
            ctx.apply_settings(
                fk,
                &JointSettings::on_layer(layers::FK)
                    .group(groups::FK)
                    .lock(lock_location, false, true)
                    .role(JointRole::Fk)
                    .shape(ShapeSpec::auto(
                        ShapeStyle::Circle,
                        AUTO_SHAPE_SCALE_OFFSET,
                    )),
            )?;
            relevant.push(fk.clone());
        }

        // Ctrl layer.
        let ctrl_settings = || {
            JointSettings::on_layer(layers::CTRL_IK)
                .group(groups::CENTRAL_IK)
                .lock(false, false, true)
                .role(JointRole::Ctrl)
                .shape(ShapeSpec::auto(
                    ShapeStyle::Circle,
                    AUTO_SHAPE_SCALE_OFFSET,
                ))
        };
        ctx.graph.duplicate(
            "hips",
            "ctrl_torso",
            ParentSpec::Joint(FIRST_PARENT),
            LengthMode::Full,
        )?;
        ctx.apply_settings("ctrl_torso", &ctrl_settings())?;
        ctx.graph.duplicate(
            "hips",
            "ctrl_hips",
            ParentSpec::Joint("ctrl_torso"),
            LengthMode::Full,
        )?;
        ctx.apply_settings("ctrl_hips", &ctrl_settings())?;
        ctx.graph.duplicate(
            "spine_3",
            "ctrl_chest",
            ParentSpec::Joint("ctrl_torso"),
            LengthMode::Full,
        )?;
        ctx.apply_settings("ctrl_chest", &ctrl_settings())?;
        ctx.graph.duplicate(
            "spine_2",
            "ctrl_waist",
            ParentSpec::Joint("ctrl_torso"),
            LengthMode::Full,
        )?;
        ctx.apply_settings("ctrl_waist", &ctrl_settings())?;

        // The waist follows the chest fully, then leans back toward the
        // hips; the stacked influences produce the blend.
        ctx.graph.add_constraint(
            "ctrl_waist",
            Constraint::copy_rotation("copy ctrl_chest", "ctrl_chest")
                .with_influence(CTRL_WAIST_COPY_CTRL_CHEST),
        )?;
        ctx.graph.add_constraint(
            "ctrl_waist",
            Constraint::copy_rotation("copy ctrl_hips", "ctrl_hips")
                .with_influence(CTRL_WAIST_COPY_CTRL_HIPS),
        )?;
        for name in ["ctrl_torso", "ctrl_hips", "ctrl_waist", "ctrl_chest"] {
            relevant.push(name.to_string());
        }

        // Hidden resolver chain the base joints bind to in ctrl mode.
        let ik_chain: Vec<String> = CHAIN.iter().map(|name| naming::ik(name)).collect();
        ctx.graph.duplicate(
            "hips",
            &ik_chain[0],
            ParentSpec::Joint("ctrl_hips"),
            LengthMode::Full,
        )?;
        for index in 1..CHAIN.len() {
            let parent = ik_chain[index - 1].clone();
            ctx.graph.duplicate(
                CHAIN[index],
                &ik_chain[index],
                ParentSpec::Joint(&parent),
                LengthMode::Full,
            )?;
        }
        for name in &ik_chain {
            ctx.apply_settings(
                name,
                &JointSettings::on_layer(layers::CTRL_IK_EXTRA).lock_all(),
            )?;
        }
        ctx.graph.add_constraint(
            &ik_chain[2],
            Constraint::copy_rotation("copy ctrl_waist", "ctrl_waist")
                .with_influence(IK_SPINE_2_COPY_CTRL_WAIST),
        )?;
        ctx.graph.add_constraint(
            &ik_chain[3],
            Constraint::copy_rotation("copy ctrl_chest", "ctrl_chest"),
        )?;

        // Bind the base chain to both layers.
        let switch_prop = format!("switch_{module}");
        for ((base, fk), ik) in CHAIN.iter().zip(&fk_chain).zip(&ik_chain) {
            bind_fk_ik_switch(ctx, &prop_joint, &switch_prop, base, fk, ik)?;
        }
        bind_location_switch(
            ctx,
            &prop_joint,
            &switch_prop,
            "hips",
            &fk_chain[0],
            &ik_chain[0],
        )?;

        let snap = SnapInfo::JointPairs {
            pairs: vec![
                (fk_chain[0].clone(), "ctrl_hips".to_string()),
                (fk_chain[2].clone(), "ctrl_waist".to_string()),
                (fk_chain[3].clone(), "ctrl_chest".to_string()),
            ],
        };

        ctx.bone_visibility(&prop_joint, &module, &relevant, CtrlStyle::Ctrl)?;
        ctx.set_module_on_joints(&module, &relevant)?;
        ctx.register_module(ModuleRecord {
            name: module,
            prop_joint: Some(prop_joint),
            properties: Vec::new(),
            relevant_joints: relevant,
            snap: vec![snap],
            switchable: true,
        });
        Ok(())
    }
}

/// The location half of the hips bind: a second muted copy pair with the
/// same switch drivers as the rotation pair.
fn bind_location_switch(
    ctx: &mut RigBuildContext<'_>,
    prop_joint: &str,
    switch_prop: &str,
    base: &str,
    fk: &str,
    ik: &str,
) -> RigResult<()> {
    ctx.graph
        .add_constraint(base, Constraint::copy_location("bind_to_fk_2", fk).muted())?;
    ctx.graph
        .add_constraint(base, Constraint::copy_location("bind_to_ik_2", ik).muted())?;

    let prop = || PropertyDef::new(switch_prop, 0.0, 2.0, 0.0, "0:fk, 1:ik, 2:base");
    ctx.prop_to_drive_constraint(
        prop_joint,
        prop(),
        base,
        "bind_to_fk_2",
        ConstraintAttr::Mute,
        expr::FK_MUTE,
    )?;
    ctx.prop_to_drive_constraint(
        prop_joint,
        prop(),
        base,
        "bind_to_ik_2",
        ConstraintAttr::Mute,
        expr::IK_MUTE,
    )?;
    ctx.prop_to_drive_constraint(
        prop_joint,
        prop(),
        base,
        "bind_to_ik_2",
        ConstraintAttr::Influence,
        expr::BIND_BLEND,
    )?;
    Ok(())
}

/// Side-agnostic helper for tests that need a built torso.
#[cfg(test)]
pub(crate) fn build_for_tests(ctx: &mut RigBuildContext<'_>) -> RigResult<()> {
    crate::modules::root::RootBuilder.build(ctx)?;
    TorsoBuilder.build(ctx)
}
