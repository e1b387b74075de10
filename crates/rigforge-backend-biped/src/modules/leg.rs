//! Leg modules, one per side.
//!
//! A leg is the three-joint limb pattern on thigh/shin/foot plus a toe
//! pair and a foot roll stack. The IK foot hands its parenting over to
//! `ik_main_{foot}`, the animator's ground-level control, with two
//! driven pivots between them: `roll_back` pivots at the heel for
//! backward roll, `roll_front` at the toe tips for forward roll, both
//! copying the X rotation of the `roll_main` dial. The heel pivot comes
//! from a ray cast against the character mesh. Toes switch FK/IK with
//! the rest of the leg and carry their own single-axis lock properties.

use std::f32::consts::PI;

use glam::Vec3;
use rigforge_spec::Side;

use crate::constants::{
    layers, AUTO_SHAPE_SCALE_OFFSET_LIMB, HEEL_RAY_DISTANCE, TARGET_BONE_SIZE,
};
use crate::constraint::{AxisToggles, Constraint, ConstraintKind, RotationMix, Space};
use crate::context::{CtrlStyle, JointSettings, RigBuildContext};
use crate::drivers::{expr, LockAttribute, PropertyDef};
use crate::error::RigResult;
use crate::graph::{JointRole, LengthMode, ParentSpec};
use crate::limb::{bind_fk_ik_switch, build_three_joint_limb, BendAxis, LimbSpec, PoleParent};
use crate::modules::ModuleBuilder;
use crate::naming;
use crate::rig::{groups, FootSnap, ModuleRecord, SnapInfo};
use crate::shapes::{ReferencePoint, ShapeSpec, ShapeStyle};
use crate::twist::{build_twist_chain, TwistSegment, TwistSpec};

const FIRST_PARENT: &str = "hips";
const IK_PARENT: &str = "root";

pub struct LegBuilder {
    pub side: Side,
}

impl LegBuilder {
    fn chain(&self) -> [String; 4] {
        [
            naming::sided("thigh", self.side),
            naming::sided("shin", self.side),
            naming::sided("foot", self.side),
            naming::sided("toes", self.side),
        ]
    }
}

impl ModuleBuilder for LegBuilder {
    fn name(&self) -> String {
        naming::sided("leg", self.side)
    }

    fn requires(&self) -> Vec<String> {
        let mut needs = vec![
            "root".to_string(),
            "root_extract".to_string(),
            FIRST_PARENT.to_string(),
        ];
        needs.extend(self.chain());
        needs
    }

    fn build(&self, ctx: &mut RigBuildContext<'_>) -> RigResult<()> {
        let module = self.name();
        let chain = self.chain();
        let limb_chain = [chain[0].as_str(), chain[1].as_str(), chain[2].as_str()];
        let foot = chain[2].as_str();
        let toes = chain[3].as_str();
        let pole_name = naming::sided("knee", self.side);
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

        let bend_back = ctx.options.shin_bend_back_limit;
        let mut build = build_three_joint_limb(
            ctx,
            &LimbSpec {
                module: &module,
                prop_joint: &prop_joint,
                chain: limb_chain,
                pole_name: &pole_name,
                side: self.side,
                bend_axis: BendAxis::X,
                bend_back_deg: bend_back,
                first_parent: FIRST_PARENT,
                ik_parent: IK_PARENT,
                pole_parent: PoleParent::IkTarget,
                with_touch: true,
            },
        )?;
        let fk_foot = build.snap.fk_end.clone();
        let ik_foot = build.snap.ik_target.clone();
        let switch_prop = format!("switch_{module}");
        let ik_group = groups::side_ik(self.side);

        // Toe pair, switched with the rest of the leg.
        let fk_toes = naming::fk(toes);
        ctx.graph
            .duplicate(toes, &fk_toes, ParentSpec::Joint(&fk_foot), LengthMode::Full)?;
        ctx.apply_settings(
            &fk_toes,
            &JointSettings::on_layer(layers::FK)
                .group(groups::FK)
                .lock(true, false, true)
                .role(JointRole::Fk)
                .shape(ShapeSpec::manual(ShapeStyle::Sphere, TARGET_BONE_SIZE)),
        )?;
        let ik_toes = naming::ik(toes);
        ctx.graph
            .duplicate(toes, &ik_toes, ParentSpec::Joint(&ik_foot), LengthMode::Full)?;
        ctx.apply_settings(
            &ik_toes,
            &JointSettings::on_layer(layers::CTRL_IK)
                .group(ik_group)
                .lock(true, false, true)
                .role(JointRole::Ik)
                .shape(ShapeSpec::manual(ShapeStyle::Cube, TARGET_BONE_SIZE)),
        )?;
        bind_fk_ik_switch(ctx, &prop_joint, &switch_prop, toes, &fk_toes, &ik_toes)?;
        toe_lock_prop(ctx, &fk_toes, &format!("limit_fk_{toes}"), 0.0)?;
        toe_lock_prop(ctx, &ik_toes, &format!("limit_ik_{toes}"), 1.0)?;

        // Foot roll stack. The heel pivot comes off the mesh; the ray
        // runs backward from the toe tips at toe height.
        let (foot_head, foot_roll, foot_len) = {
            let joint = ctx.graph.joint(foot)?;
            (joint.head, joint.roll, joint.length())
        };
        let toes_head = ctx.graph.joint(toes)?.head;
        let heel = match ctx.probe().cast(toes_head, Vec3::Y, HEEL_RAY_DISTANCE) {
            Some(hit) => hit.position,
            None => {
                ctx.note(format!(
                    "geometry query miss: heel behind '{toes}', assuming it under the ankle"
                ));
                Vec3::new(toes_head.x, foot_head.y, toes_head.z)
            }
        };
        let third_point = heel + (toes_head - heel) / 3.0;

        let ik_main = naming::ik_main(foot);
        let ik_main_roll = match self.side {
            Side::Left => -PI,
            Side::Right => PI,
        };
        ctx.graph.create(
            &ik_main,
            foot_head,
            foot_head - Vec3::new(0.0, foot_len, 0.0),
            ik_main_roll,
            Some(IK_PARENT),
        )?;
        ctx.apply_settings(
            &ik_main,
            &JointSettings::on_layer(layers::CTRL_IK)
                .group(ik_group)
                .lock(false, false, true)
                .role(JointRole::Ik)
                .shape(ShapeSpec::auto(
                    ShapeStyle::Cube,
                    AUTO_SHAPE_SCALE_OFFSET_LIMB,
                )),
        )?;

        let snap_target = naming::snap_target(foot);
        ctx.graph
            .duplicate(&ik_main, &snap_target, ParentSpec::Joint(&fk_foot), LengthMode::Full)?;
        ctx.apply_settings(
            &snap_target,
            &JointSettings::on_layer(layers::FK_EXTRA).lock_all(),
        )?;

        let roll_main = naming::roll_main(foot);
        ctx.graph.create(
            &roll_main,
            foot_head,
            foot_head + Vec3::new(0.0, foot_len, 0.0),
            foot_roll,
            Some(&ik_main),
        )?;
        ctx.apply_settings(
            &roll_main,
            &JointSettings::on_layer(layers::CTRL_IK)
                .group(ik_group)
                .lock(true, false, true)
                .role(JointRole::Ik)
                .shape(
                    ShapeSpec::manual(ShapeStyle::FootRoll, TARGET_BONE_SIZE)
                        .at(ReferencePoint::Tail),
                ),
        )?;
        ctx.graph.add_constraint(
            &roll_main,
            Constraint::new(
                "limit rotation",
                None,
                ConstraintKind::LimitRotation {
                    x: Some((-PI, PI)),
                    y: Some((0.0, 0.0)),
                    z: Some((0.0, 0.0)),
                    transform_limit: true,
                    owner_space: Space::Local,
                },
            ),
        )?;

        let roll_back = naming::roll_back(foot);
        ctx.graph
            .create(&roll_back, heel, third_point, foot_roll, Some(&ik_main))?;
        roll_pivot_settings(ctx, &roll_back, ik_group)?;
        roll_pivot_constraints(ctx, &roll_back, &roll_main, true)?;

        let roll_front = naming::roll_front(foot);
        ctx.graph
            .create(&roll_front, toes_head, third_point, foot_roll, Some(&roll_back))?;
        roll_pivot_settings(ctx, &roll_front, ik_group)?;
        roll_pivot_constraints(ctx, &roll_front, &roll_main, false)?;

        // The solved foot rides the roll stack; the animator grabs
        // ik_main from now on.
        ctx.graph.set_parent(&ik_foot, Some(&roll_front))?;
        ctx.graph.joint_mut(&ik_foot)?.layer = layers::CTRL_IK_EXTRA;
        ctx.graph
            .set_parent(&build.pole_parent_joint, Some(&ik_main))?;

        // Toe counter-pivot: forward roll would drag the IK toes along,
        // so their driven parent rotates back by the same angle.
        let ik_toes_parent = naming::ik_parent_of(toes);
        ctx.graph.duplicate(
            &ik_toes,
            &ik_toes_parent,
            ParentSpec::Joint(&ik_foot),
            LengthMode::Full,
        )?;
        ctx.apply_settings(
            &ik_toes_parent,
            &JointSettings::on_layer(layers::CTRL_IK_EXTRA).lock(true, false, true),
        )?;
        ctx.graph.set_parent(&ik_toes, Some(&ik_toes_parent))?;
        ctx.graph.add_constraint(
            &ik_toes_parent,
            Constraint::new(
                format!("copy {roll_front}"),
                Some(roll_front.clone()),
                ConstraintKind::CopyRotation {
                    axes: AxisToggles::only_x(),
                    invert: AxisToggles::only_x(),
                    mix: RotationMix::Offset,
                    target_space: Space::Local,
                    owner_space: Space::Local,
                },
            ),
        )?;

        build_twist_chain(
            ctx,
            &TwistSpec {
                segment: TwistSegment::Thigh,
                source: limb_chain[0],
                end_affector: foot,
                count: ctx.options.twist_thigh,
            },
        )?;
        build_twist_chain(
            ctx,
            &TwistSpec {
                segment: TwistSegment::Shin,
                source: limb_chain[1],
                end_affector: foot,
                count: ctx.options.twist_shin,
            },
        )?;

        build.snap.foot = Some(FootSnap {
            snap_target: snap_target.clone(),
            ik_main: ik_main.clone(),
            roll_main: roll_main.clone(),
        });

        let mut relevant = build.relevant.clone();
        relevant.retain(|name| name != &ik_foot);
        relevant.push(fk_toes.clone());
        relevant.push(ik_toes.clone());
        relevant.push(ik_main);
        relevant.push(roll_main);

        ctx.bone_visibility(&prop_joint, &module, &relevant, CtrlStyle::Ik)?;
        ctx.set_module_on_joints(&module, &relevant)?;
        ctx.register_module(ModuleRecord {
            name: module,
            prop_joint: Some(prop_joint),
            properties: Vec::new(),
            relevant_joints: relevant,
            snap: vec![
                SnapInfo::ThreeJointLimb(build.snap),
                SnapInfo::JointPairs {
                    pairs: vec![(fk_toes, ik_toes)],
                },
            ],
            switchable: true,
        });
        Ok(())
    }
}

/// A property on the toe control itself that collapses its rotation to
/// the curl axis.
fn toe_lock_prop(
    ctx: &mut RigBuildContext<'_>,
    control: &str,
    prop_name: &str,
    default: f32,
) -> RigResult<()> {
    let prop =
        || PropertyDef::new(prop_name, 0.0, 1.0, default, "limit toes to single axis rotation");
    for index in [1, 2] {
        ctx.prop_to_drive_lock_channel(
            control,
            prop(),
            control,
            LockAttribute::Rotation,
            index,
            expr::DIRECT,
        )?;
    }
    Ok(())
}

fn roll_pivot_settings(
    ctx: &mut RigBuildContext<'_>,
    pivot: &str,
    ik_group: &str,
) -> RigResult<()> {
    ctx.apply_settings(
        pivot,
        &JointSettings::on_layer(layers::CTRL_IK_EXTRA)
            .group(ik_group)
            .lock(true, false, true)
            .role(JointRole::Ik),
    )
}

/// Both pivots copy the dial's X rotation, the heel pivot inverted, and
/// clamp to their own half of the roll range.
fn roll_pivot_constraints(
    ctx: &mut RigBuildContext<'_>,
    pivot: &str,
    roll_main: &str,
    invert: bool,
) -> RigResult<()> {
    ctx.graph.add_constraint(
        pivot,
        Constraint::new(
            format!("copy {roll_main}"),
            Some(roll_main.to_string()),
            ConstraintKind::CopyRotation {
                axes: AxisToggles::only_x(),
                invert: if invert {
                    AxisToggles::only_x()
                } else {
                    AxisToggles::none()
                },
                mix: RotationMix::Replace,
                target_space: Space::Local,
                owner_space: Space::Local,
            },
        ),
    )?;
    ctx.graph.add_constraint(
        pivot,
        Constraint::new(
            "limit rotation",
            None,
            ConstraintKind::LimitRotation {
                x: Some((0.0, PI)),
                y: Some((0.0, 0.0)),
                z: Some((0.0, 0.0)),
                transform_limit: true,
                owner_space: Space::Local,
            },
        ),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::root::RootBuilder;
    use crate::raycast::{NullProbe, RayHit, SurfaceProbe};
    use pretty_assertions::assert_eq;
    use rigforge_spec::{RigOptions, SkeletonPreset, SourceSkeleton};

    struct HeelProbe;

    impl SurfaceProbe for HeelProbe {
        fn cast(&self, origin: Vec3, direction: Vec3, _max_distance: f32) -> Option<RayHit> {
            Some(RayHit {
                position: origin + direction.normalize() * 0.22,
                distance: 0.22,
            })
        }
    }

    fn built_context(probe: &'static dyn SurfaceProbe) -> RigBuildContext<'static> {
        let skeleton: &'static SourceSkeleton =
            Box::leak(Box::new(SkeletonPreset::BipedV1.source_skeleton()));
        let options: &'static RigOptions = Box::leak(Box::new(RigOptions::default()));
        let mut ctx = RigBuildContext::new(skeleton, options, probe).unwrap();
        RootBuilder.build(&mut ctx).unwrap();
        LegBuilder { side: Side::Left }.build(&mut ctx).unwrap();
        ctx
    }

    #[test]
    fn test_leg_builds_the_roll_stack() {
        let ctx = built_context(&NullProbe);

        let parents = [
            ("ik_main_foot_l", "root"),
            ("roll_main_foot_l", "ik_main_foot_l"),
            ("roll_back_foot_l", "ik_main_foot_l"),
            ("roll_front_foot_l", "roll_back_foot_l"),
            ("ik_foot_l", "roll_front_foot_l"),
            ("target_knee_l", "ik_main_foot_l"),
            ("snap_target_foot_l", "fk_foot_l"),
            ("fk_toes_l", "fk_foot_l"),
            ("ik_parent_toes_l", "ik_foot_l"),
            ("ik_toes_l", "ik_parent_toes_l"),
        ];
        for (child, parent) in parents {
            let joint = ctx.graph.joint(child).unwrap();
            assert_eq!(joint.parent.as_deref(), Some(parent), "parent of {child}");
        }

        // The solved foot steps aside for the animator-facing control.
        assert_eq!(
            ctx.graph.joint("ik_foot_l").unwrap().layer,
            layers::CTRL_IK_EXTRA
        );
        assert_eq!(
            ctx.graph.joint("ik_main_foot_l").unwrap().layer,
            layers::CTRL_IK
        );

        let foot = ctx.graph.joint("foot_l").unwrap();
        let ik_main = ctx.graph.joint("ik_main_foot_l").unwrap();
        assert_eq!(ik_main.head, foot.head);
        assert_eq!(ik_main.tail, foot.head - Vec3::new(0.0, foot.length(), 0.0));
        assert_eq!(ik_main.roll, -PI);
    }

    #[test]
    fn test_roll_pivots_copy_the_dial() {
        let ctx = built_context(&NullProbe);

        let back = ctx.graph.joint("roll_back_foot_l").unwrap();
        let copy = back.constraint("copy roll_main_foot_l").unwrap();
        match &copy.kind {
            ConstraintKind::CopyRotation { axes, invert, .. } => {
                assert_eq!(*axes, AxisToggles::only_x());
                assert_eq!(*invert, AxisToggles::only_x());
            }
            other => panic!("unexpected kind {other:?}"),
        }
        match back.constraint("limit rotation").unwrap().kind {
            ConstraintKind::LimitRotation { x, transform_limit, .. } => {
                assert_eq!(x, Some((0.0, PI)));
                assert!(transform_limit);
            }
            ref other => panic!("unexpected kind {other:?}"),
        }

        let front = ctx.graph.joint("roll_front_foot_l").unwrap();
        match &front.constraint("copy roll_main_foot_l").unwrap().kind {
            ConstraintKind::CopyRotation { invert, .. } => {
                assert_eq!(*invert, AxisToggles::none());
            }
            other => panic!("unexpected kind {other:?}"),
        }

        // The toe counter-pivot adds the inverse on top of its own pose.
        let toes_parent = ctx.graph.joint("ik_parent_toes_l").unwrap();
        match &toes_parent.constraint("copy roll_front_foot_l").unwrap().kind {
            ConstraintKind::CopyRotation { invert, mix, .. } => {
                assert_eq!(*invert, AxisToggles::only_x());
                assert_eq!(*mix, RotationMix::Offset);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_heel_pivot_comes_off_the_mesh() {
        let ctx = built_context(&HeelProbe);

        let toes_head = ctx.graph.joint("toes_l").unwrap().head;
        let heel = toes_head + Vec3::Y * 0.22;
        let third_point = heel + (toes_head - heel) / 3.0;

        let back = ctx.graph.joint("roll_back_foot_l").unwrap();
        assert!((back.head - heel).length() < 1e-6);
        assert!((back.tail - third_point).length() < 1e-6);
        let front = ctx.graph.joint("roll_front_foot_l").unwrap();
        assert_eq!(front.head, toes_head);
        assert!((front.tail - third_point).length() < 1e-6);
    }

    #[test]
    fn test_heel_miss_falls_back_under_the_ankle() {
        let ctx = built_context(&NullProbe);

        let toes_head = ctx.graph.joint("toes_l").unwrap().head;
        let foot_head = ctx.graph.joint("foot_l").unwrap().head;
        let back = ctx.graph.joint("roll_back_foot_l").unwrap();
        assert_eq!(back.head, Vec3::new(toes_head.x, foot_head.y, toes_head.z));
    }

    #[test]
    fn test_toe_locks_live_on_the_toe_controls() {
        let ctx = built_context(&NullProbe);

        let lock_drivers: Vec<_> = ctx
            .drivers()
            .iter()
            .filter(|d| d.prop.property.starts_with("limit_"))
            .collect();
        assert_eq!(lock_drivers.len(), 4);
        for driver in &lock_drivers {
            assert_eq!(driver.expression, expr::DIRECT);
            assert_eq!(driver.prop.holder, driver.target.joint());
        }

        let rig = ctx.finish("0".repeat(64)).unwrap();
        let fk_prop = rig
            .property("fk_toes_l", "limit_fk_toes_l")
            .expect("fk toe lock prop");
        assert_eq!(fk_prop.default, 0.0);
        let ik_prop = rig
            .property("ik_toes_l", "limit_ik_toes_l")
            .expect("ik toe lock prop");
        assert_eq!(ik_prop.default, 1.0);
    }

    #[test]
    fn test_leg_record_carries_both_snap_records() {
        let ctx = built_context(&NullProbe);
        let record = ctx
            .modules()
            .iter()
            .find(|m| m.name == "leg_l")
            .expect("leg record");

        assert!(record.switchable);
        assert!(!record.relevant_joints.contains(&"ik_foot_l".to_string()));
        assert!(record.relevant_joints.contains(&"ik_main_foot_l".to_string()));

        match &record.snap[0] {
            SnapInfo::ThreeJointLimb(snap) => {
                let foot = snap.foot.as_ref().expect("foot snap");
                assert_eq!(foot.snap_target, "snap_target_foot_l");
                assert_eq!(foot.ik_main, "ik_main_foot_l");
                assert_eq!(foot.roll_main, "roll_main_foot_l");
                let slots = snap.slots();
                assert_eq!(slots[9], Some("snap_target_foot_l"));
                assert_eq!(slots[10], Some("ik_main_foot_l"));
                assert_eq!(slots[11], Some("roll_main_foot_l"));
            }
            other => panic!("unexpected snap {other:?}"),
        }
        match &record.snap[1] {
            SnapInfo::JointPairs { pairs } => {
                assert_eq!(pairs, &vec![("fk_toes_l".to_string(), "ik_toes_l".to_string())]);
            }
            other => panic!("unexpected snap {other:?}"),
        }
    }

    #[test]
    fn test_leg_twists_follow_the_options() {
        let ctx = built_context(&NullProbe);
        for name in [
            "twist_1_thigh_l",
            "twist_2_thigh_l",
            "twist_3_thigh_l",
            "no_twist_thigh_l",
            "twist_1_shin_l",
            "twist_target_shin_l",
        ] {
            assert!(ctx.graph.contains(name), "missing {name}");
        }
        // Default shin count is 1.
        assert!(!ctx.graph.contains("twist_2_shin_l"));

        let follow = ctx
            .graph
            .joint("twist_target_shin_l")
            .unwrap()
            .constraint("follow foot_l")
            .expect("shin target follows the foot");
        assert_eq!(follow.target.as_deref(), Some("foot_l"));
    }
}
