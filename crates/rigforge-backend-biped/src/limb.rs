//! Three-joint IK limb builder.
//!
//! Arms and legs share one pattern: the deforming chain stays put, an FK
//! duplicate chain and an IK duplicate chain are built beside it, and the
//! base joints blend between the two through driven copy constraints. The
//! middle joint bends on a single axis; the IK side gets a pole target
//! with a baked pole angle.

use glam::Vec3;

use rigforge_spec::Side;

use crate::constants::{
    layers, AUTO_SHAPE_SCALE_OFFSET_LIMB, FIXATE_LIMB_DEFAULT, TARGET_BONE_SIZE,
};
use crate::constraint::{Constraint, ConstraintKind, Space};
use crate::context::{ConstraintAttr, JointSettings, RigBuildContext};
use crate::drivers::{expr, PropertyDef};
use crate::error::{RigError, RigResult};
use crate::graph::{IkDof, Joint, JointGraph, JointRole, LengthMode, ParentSpec};
use crate::math;
use crate::naming;
use crate::rig::{groups, LimbSnap};
use crate::shapes::{ShapeSpec, ShapeStyle};

const MIN_JOINT_LENGTH: f32 = 1e-5;

/// The one axis a limb's middle joint bends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BendAxis {
    X,
    NegX,
}

impl BendAxis {
    /// Usable rotation range in degrees for a given backward-bend
    /// allowance.
    pub fn limits_deg(self, bend_back: f32) -> (f32, f32) {
        match self {
            BendAxis::X => (-bend_back, 180.0 - bend_back),
            BendAxis::NegX => (bend_back - 180.0, bend_back),
        }
    }

    /// Which way along the middle joint's local Z the pole target goes.
    pub fn pole_offset_sign(self) -> f32 {
        match self {
            BendAxis::X => -1.0,
            BendAxis::NegX => 1.0,
        }
    }
}

/// Where the pole control's holder joint parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoleParent<'a> {
    /// Under the limb's own IK end joint.
    IkTarget,
    /// Under an explicit joint.
    Joint(&'a str),
}

/// Inputs of one limb build.
#[derive(Debug, Clone)]
pub struct LimbSpec<'a> {
    pub module: &'a str,
    /// The module's property holder joint.
    pub prop_joint: &'a str,
    /// Base, middle, end deform joints.
    pub chain: [&'a str; 3],
    /// Name of the pole control, e.g. `elbow_l`.
    pub pole_name: &'a str,
    pub side: Side,
    pub bend_axis: BendAxis,
    /// Backward-bend allowance of the middle joint, degrees.
    pub bend_back_deg: f32,
    /// Parent of the FK and IK chain roots.
    pub first_parent: &'a str,
    /// Parent of the IK end joint.
    pub ik_parent: &'a str,
    pub pole_parent: PoleParent<'a>,
    /// Add a touch control that can re-anchor the IK end.
    pub with_touch: bool,
}

/// Joints a limb build produced.
#[derive(Debug, Clone)]
pub struct LimbBuild {
    pub fk_chain: [String; 3],
    pub ik_chain: [String; 3],
    pub pole: String,
    /// The `target_` holder the pole control hangs from.
    pub pole_parent_joint: String,
    pub touch: Option<String>,
    /// Animator-facing joints this build added, in presentation order.
    pub relevant: Vec<String>,
    pub snap: LimbSnap,
}

/// Builds the FK/IK pair for a three-joint chain and binds the base
/// joints to it.
pub fn build_three_joint_limb(
    ctx: &mut RigBuildContext<'_>,
    spec: &LimbSpec<'_>,
) -> RigResult<LimbBuild> {
    for name in spec.chain {
        let joint = ctx.graph.joint(name)?;
        if joint.length() < MIN_JOINT_LENGTH {
            return Err(RigError::degenerate(format!("joint '{name}' has no length")));
        }
    }
    let ik_group = groups::side_ik(spec.side);
    let (min_deg, max_deg) = spec.bend_axis.limits_deg(spec.bend_back_deg);
    let bend_range = (min_deg.to_radians(), max_deg.to_radians());

    // FK chain.
    let fk_chain = [
        naming::fk(spec.chain[0]),
        naming::fk(spec.chain[1]),
        naming::fk(spec.chain[2]),
    ];
    for (i, (source, fk)) in spec.chain.iter().zip(&fk_chain).enumerate() {
        let parent = if i == 0 {
            spec.first_parent.to_string()
        } else {
            fk_chain[i - 1].clone()
        };
        ctx.graph
            .duplicate(source, fk, ParentSpec::Joint(&parent), LengthMode::Full)?;
        ctx.apply_settings(
            fk,
            &JointSettings::on_layer(layers::FK)
                .group(groups::FK)
                .lock(true, false, true)
                .role(JointRole::Fk)
                .shape(ShapeSpec::auto(
                    ShapeStyle::Circle,
                    AUTO_SHAPE_SCALE_OFFSET_LIMB,
                )),
        )?;
    }

    // Single-axis bend on the FK middle joint.
    ctx.graph.add_constraint(
        &fk_chain[1],
        Constraint::new(
            "limit rotation",
            None,
            ConstraintKind::LimitRotation {
                x: Some(bend_range),
                y: Some((0.0, 0.0)),
                z: Some((0.0, 0.0)),
                transform_limit: true,
                owner_space: Space::Local,
            },
        ),
    )?;

    isolate_rotation(
        ctx,
        spec.prop_joint,
        spec.first_parent,
        &fk_chain[0],
        &format!("fixate_{}", spec.module),
        FIXATE_LIMB_DEFAULT,
    )?;

    // IK chain. The first two joints are solver mechanism; the end joint
    // is the grabbable target, parented outside the chain.
    let ik_chain = [
        naming::ik(spec.chain[0]),
        naming::ik(spec.chain[1]),
        naming::ik(spec.chain[2]),
    ];
    ctx.graph.duplicate(
        spec.chain[0],
        &ik_chain[0],
        ParentSpec::Joint(spec.first_parent),
        LengthMode::Full,
    )?;
    ctx.graph.duplicate(
        spec.chain[1],
        &ik_chain[1],
        ParentSpec::Joint(&ik_chain[0]),
        LengthMode::Full,
    )?;
    ctx.graph.duplicate(
        spec.chain[2],
        &ik_chain[2],
        ParentSpec::Joint(spec.ik_parent),
        LengthMode::Full,
    )?;
    for name in &ik_chain[..2] {
        ctx.apply_settings(
            name,
            &JointSettings::on_layer(layers::CTRL_IK_EXTRA)
                .group(ik_group)
                .lock(true, false, true)
                .role(JointRole::Ik),
        )?;
    }
    ctx.apply_settings(
        &ik_chain[2],
        &JointSettings::on_layer(layers::CTRL_IK)
            .group(ik_group)
            .lock(false, false, true)
            .role(JointRole::Ik)
            .shape(ShapeSpec::manual(ShapeStyle::Cube, TARGET_BONE_SIZE)),
    )?;

    // The solver's own bend restriction mirrors the FK limit.
    ctx.graph.joint_mut(&ik_chain[1])?.ik_dof = Some(IkDof {
        limit_x: Some(bend_range),
        lock_y: true,
        lock_z: true,
    });

    // Pole target.
    let pole_pos = place_pole_target(
        &mut ctx.graph,
        spec.chain[1],
        ctx.options.pole_target_distance,
        spec.bend_axis.pole_offset_sign(),
    )?;
    let pole_parent_joint = naming::target(spec.pole_name);
    let pole_parent_name = match spec.pole_parent {
        PoleParent::IkTarget => ik_chain[2].as_str(),
        PoleParent::Joint(name) => name,
    };
    ctx.graph.create(
        &pole_parent_joint,
        pole_pos,
        pole_pos + Vec3::new(0.0, TARGET_BONE_SIZE, 0.0),
        0.0,
        Some(pole_parent_name),
    )?;
    ctx.apply_settings(
        &pole_parent_joint,
        &JointSettings::on_layer(layers::TARGET)
            .group(groups::TARGET)
            .lock_all(),
    )?;
    ctx.graph.create(
        spec.pole_name,
        pole_pos,
        pole_pos + Vec3::new(0.0, TARGET_BONE_SIZE, 0.0),
        0.0,
        Some(&pole_parent_joint),
    )?;
    ctx.apply_settings(
        spec.pole_name,
        &JointSettings::on_layer(layers::CTRL_IK)
            .group(ik_group)
            .lock(false, true, true)
            .role(JointRole::Ik)
            .shape(ShapeSpec::manual(ShapeStyle::Sphere, TARGET_BONE_SIZE)),
    )?;

    // Elbow/knee-to-pole guide line.
    let middle_head = ctx.graph.joint(spec.chain[1])?.head;
    let line = naming::pole_line(spec.pole_name);
    let line_length = (pole_pos - middle_head).length();
    if line_length < MIN_JOINT_LENGTH {
        return Err(RigError::degenerate(format!(
            "pole '{}' coincides with the middle joint",
            spec.pole_name
        )));
    }
    ctx.graph
        .create(&line, middle_head, pole_pos, 0.0, Some(&ik_chain[0]))?;
    ctx.apply_settings(
        &line,
        &JointSettings::on_layer(layers::TARGET)
            .group(groups::TARGET)
            .lock_all(),
    )?;
    ctx.graph.add_constraint(
        &line,
        Constraint::new(
            format!("stretch to {}", spec.pole_name),
            Some(spec.pole_name.to_string()),
            ConstraintKind::StretchTo {
                rest_length: line_length,
                head_tail: 0.0,
            },
        ),
    )?;

    // IK solve on the middle joint, reaching for the end joint.
    let pole_angle = {
        let base = ctx.graph.joint(&ik_chain[0])?;
        let end_tail = ctx.graph.joint(&ik_chain[1])?.tail;
        compute_pole_angle(base, end_tail, pole_pos)?
    };
    ctx.graph.add_constraint(
        &ik_chain[1],
        Constraint::new(
            "ik",
            Some(ik_chain[2].clone()),
            ConstraintKind::Ik {
                chain_count: 2,
                pole_target: Some(spec.pole_name.to_string()),
                pole_angle,
                use_tail: false,
            },
        ),
    )?;

    // Bind the base chain to both layers; the switch drivers pick one.
    let switch_prop = format!("switch_{}", spec.module);
    for ((base, fk), ik) in spec.chain.iter().zip(&fk_chain).zip(&ik_chain) {
        bind_fk_ik_switch(ctx, spec.prop_joint, &switch_prop, base, fk, ik)?;
    }

    fk_filler(ctx, spec.first_parent, spec.chain[0])?;

    let touch = if spec.with_touch {
        Some(touch_joint(
            ctx,
            spec.module,
            spec.prop_joint,
            &ik_chain[2],
            ik_group,
        )?)
    } else {
        None
    };

    let mut relevant: Vec<String> = fk_chain.to_vec();
    relevant.push(ik_chain[2].clone());
    relevant.push(spec.pole_name.to_string());
    if let Some(touch) = &touch {
        relevant.push(touch.clone());
    }

    let snap = LimbSnap {
        fk_chain: fk_chain.clone(),
        ik_chain: ik_chain.clone(),
        pole: spec.pole_name.to_string(),
        ik_target: ik_chain[2].clone(),
        fk_end: fk_chain[2].clone(),
        foot: None,
    };

    Ok(LimbBuild {
        fk_chain,
        ik_chain,
        pole: spec.pole_name.to_string(),
        pole_parent_joint,
        touch,
        relevant,
        snap,
    })
}

/// Lets an FK chain root ignore its parent's rotation.
///
/// A helper joint slots in between: parented normally, but with a driven
/// world-space copy of the root joint's rotation. At full influence the
/// chain root holds its world orientation no matter what the parent does.
pub fn isolate_rotation(
    ctx: &mut RigBuildContext<'_>,
    prop_joint: &str,
    parent_joint: &str,
    first_joint: &str,
    prop_name: &str,
    default: f32,
) -> RigResult<String> {
    let helper = naming::isolate_parent(first_joint);
    ctx.graph.duplicate(
        first_joint,
        &helper,
        ParentSpec::Joint(parent_joint),
        LengthMode::Half,
    )?;
    ctx.apply_settings(&helper, &JointSettings::on_layer(layers::MISC).lock_all())?;
    ctx.graph.add_constraint(
        &helper,
        Constraint::copy_rotation("copy root", "root").with_influence(default),
    )?;
    ctx.graph.set_parent(first_joint, Some(&helper))?;

    let prop = PropertyDef::new(
        prop_name,
        0.0,
        1.0,
        default,
        "1: ignore parent rotation",
    );
    ctx.prop_to_drive_constraint(
        prop_joint,
        prop,
        &helper,
        "copy root",
        ConstraintAttr::Influence,
        expr::DIRECT,
    )?;
    Ok(helper)
}

/// Positions a pole target by duplicating the middle joint, nudging the
/// copy along its local Z, and reading the result back.
pub fn place_pole_target(
    graph: &mut JointGraph,
    middle: &str,
    distance: f32,
    sign: f32,
) -> RigResult<Vec3> {
    let scratch = format!("scratch_pole_{middle}");
    graph.duplicate(middle, &scratch, ParentSpec::Unparented, LengthMode::Full)?;
    let offset = graph.joint(&scratch)?.z_axis() * (sign * distance);
    graph.translate(&scratch, offset)?;
    let position = graph.joint(&scratch)?.head;
    graph.remove(&scratch)?;
    Ok(position)
}

/// The roll correction that aligns the solver's bend plane with the
/// limb's rest plane. Static at bind pose, baked into the IK constraint.
pub fn compute_pole_angle(base: &Joint, chain_end_tail: Vec3, pole_pos: Vec3) -> RigResult<f32> {
    let limb_vector = chain_end_tail - base.head;
    let pole_normal = limb_vector.cross(pole_pos - base.head);
    let projected = pole_normal.cross(base.vector());
    if projected.length_squared() < MIN_JOINT_LENGTH {
        return Err(RigError::degenerate(
            "ik plane is collinear, pole angle undefined",
        ));
    }
    Ok(math::signed_angle(base.x_axis(), projected, base.vector()))
}

/// Adds the muted FK/IK copy pair on a base joint and the switch drivers
/// that arbitrate them.
pub fn bind_fk_ik_switch(
    ctx: &mut RigBuildContext<'_>,
    prop_joint: &str,
    switch_prop: &str,
    base: &str,
    fk: &str,
    ik: &str,
) -> RigResult<()> {
    ctx.graph
        .add_constraint(base, Constraint::copy_rotation("bind_to_fk_1", fk).muted())?;
    ctx.graph
        .add_constraint(base, Constraint::copy_rotation("bind_to_ik_1", ik).muted())?;

    let prop = || PropertyDef::new(switch_prop, 0.0, 2.0, 0.0, "0:fk, 1:ik, 2:base");
    ctx.prop_to_drive_constraint(
        prop_joint,
        prop(),
        base,
        "bind_to_fk_1",
        ConstraintAttr::Mute,
        expr::FK_MUTE,
    )?;
    ctx.prop_to_drive_constraint(
        prop_joint,
        prop(),
        base,
        "bind_to_ik_1",
        ConstraintAttr::Mute,
        expr::IK_MUTE,
    )?;
    ctx.prop_to_drive_constraint(
        prop_joint,
        prop(),
        base,
        "bind_to_ik_1",
        ConstraintAttr::Influence,
        expr::BIND_BLEND,
    )?;
    Ok(())
}

/// Bridges a chain root to its first parent for retarget tooling.
fn fk_filler(ctx: &mut RigBuildContext<'_>, first_parent: &str, chain_root: &str) -> RigResult<()> {
    let head = ctx.graph.joint(first_parent)?.head;
    let tail = ctx.graph.joint(chain_root)?.head;
    if (tail - head).length() < MIN_JOINT_LENGTH {
        ctx.note(format!(
            "fk filler for '{chain_root}' skipped, chain root sits on its parent"
        ));
        return Ok(());
    }
    let filler = naming::fk_filler(chain_root);
    ctx.graph
        .create(&filler, head, tail, 0.0, Some(first_parent))?;
    ctx.apply_settings(
        &filler,
        &JointSettings::on_layer(layers::FK_EXTRA).lock_all(),
    )?;
    Ok(())
}

/// A world-space control that can take over the IK end joint, for
/// planting a hand or foot on something.
fn touch_joint(
    ctx: &mut RigBuildContext<'_>,
    module: &str,
    prop_joint: &str,
    ik_end: &str,
    ik_group: &str,
) -> RigResult<String> {
    let touch = naming::touch(ik_end);
    ctx.graph
        .duplicate(ik_end, &touch, ParentSpec::Joint("root"), LengthMode::Full)?;
    ctx.apply_settings(
        &touch,
        &JointSettings::on_layer(layers::TOUCH)
            .group(ik_group)
            .lock(false, false, true)
            .role(JointRole::Touch)
            .shape(ShapeSpec::manual(ShapeStyle::Cube, TARGET_BONE_SIZE)),
    )?;

    let inverse_offset = ctx
        .graph
        .joint(&touch)?
        .world_matrix()
        .inverse()
        .to_cols_array();
    ctx.graph.add_constraint(
        ik_end,
        Constraint::new(
            "touch",
            Some(touch.clone()),
            ConstraintKind::ChildOf { inverse_offset },
        )
        .with_influence(0.0),
    )?;
    let prop = PropertyDef::new(
        format!("touch_{module}"),
        0.0,
        1.0,
        0.0,
        "1: follow the touch control",
    );
    ctx.prop_to_drive_constraint(
        prop_joint,
        prop,
        ik_end,
        "touch",
        ConstraintAttr::Influence,
        expr::DIRECT,
    )?;
    Ok(touch)
}
