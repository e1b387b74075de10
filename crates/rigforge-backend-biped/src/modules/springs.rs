//! Spring corrective module.
//!
//! Soft-tissue helpers: a belly joint that inflates with a forward waist
//! crunch, per-side bottom joints that swell and swing with the thigh,
//! and per-side chest joints that aim at grabbable targets and ride
//! shoulder raises. Every drive is a clamped piecewise-linear remap off
//! a base joint, so at rest pose each branch contributes identity.

use glam::Vec3;
use rigforge_spec::{RigOptions, Side};

use crate::constants::{
    layers, CHEST_TARGET_DISTANCE, CHEST_TARGET_SIZE, SPRING_BELLY_ROT_DEG, SPRING_BELLY_SCALE,
    SPRING_BOTTOM_BWD_ROT_TO_ROT_ROT_DEG, SPRING_BOTTOM_BWD_ROT_TO_ROT_TARGET_DEG,
    SPRING_BOTTOM_BWD_ROT_TO_SCALE_ROT_DEG, SPRING_BOTTOM_BWD_ROT_TO_SCALE_SCALE,
    SPRING_BOTTOM_FWD_ROT_TO_ROT_ROT_DEG, SPRING_BOTTOM_FWD_ROT_TO_ROT_TARGET_DEG,
    SPRING_BOTTOM_FWD_ROT_TO_SCALE_ROT_DEG, SPRING_BOTTOM_FWD_ROT_TO_SCALE_SCALE,
    SPRING_CHEST_DOWN_CHEST_ROT_DEG, SPRING_CHEST_DOWN_SHOULDER_ROT_DEG,
    SPRING_CHEST_UP_CHEST_ROT_DEG, SPRING_CHEST_UP_SHOULDER_ROT_DEG, SPRING_RAY_DISTANCE,
};
use crate::constraint::{Axis, ChannelRef, Constraint, Space, TransformRemap};
use crate::context::{CtrlStyle, JointSettings, RigBuildContext};
use crate::error::RigResult;
use crate::graph::JointRole;
use crate::modules::ModuleBuilder;
use crate::naming;
use crate::rig::{groups, ModuleRecord};
use crate::shapes::{ShapeSpec, ShapeStyle};

/// Spring length as a fraction of the driver bone's length.
const BOTTOM_LENGTH_FACTOR: f32 = 0.25;
/// See [`BOTTOM_LENGTH_FACTOR`].
const CHEST_LENGTH_FACTOR: f32 = 0.5;

pub struct SpringsBuilder;

/// Remap off a driver joint's pitch into the owner's along-bone scale.
/// Rest pitch maps to identity and the peak clamps.
fn rotation_to_scale(name: &str, driver: &str, rot_deg: f32, scale: f32) -> Constraint {
    Constraint::remap(
        name,
        driver,
        TransformRemap {
            from: ChannelRef::rotation(Axis::X),
            to: ChannelRef::scale(Axis::Y),
            from_min: 0.0,
            from_max: rot_deg.to_radians(),
            to_min: 1.0,
            to_max: scale,
            space: Space::Local,
        },
    )
}

/// Remap off one driver rotation channel into the owner's pitch, zero at
/// rest and clamped at the peak.
fn rotation_to_rotation(
    name: &str,
    driver: &str,
    from: Axis,
    from_deg: f32,
    to_deg: f32,
) -> Constraint {
    Constraint::remap(
        name,
        driver,
        TransformRemap {
            from: ChannelRef::rotation(from),
            to: ChannelRef::rotation(Axis::X),
            from_min: 0.0,
            from_max: from_deg.to_radians(),
            to_min: 0.0,
            to_max: to_deg.to_radians(),
            space: Space::Local,
        },
    )
}

fn spring_settings() -> JointSettings {
    JointSettings::on_layer(layers::SPRING)
        .group(groups::SPRING)
        .deforming()
        .lock(true, false, false)
        .role(JointRole::Spring)
}

impl SpringsBuilder {
    fn build_belly(&self, ctx: &mut RigBuildContext<'_>, created: &mut Vec<String>) -> RigResult<()> {
        let waist = "spine_1";
        let (origin, length) = {
            let joint = ctx.graph.joint(waist)?;
            (joint.center(), joint.length())
        };
        let head = match ctx.probe().cast(origin, -Vec3::Y, SPRING_RAY_DISTANCE) {
            Some(hit) => hit.position,
            None => {
                ctx.note(format!(
                    "geometry query miss: belly in front of '{waist}', assuming one bone length out"
                ));
                origin - Vec3::Y * length
            }
        };

        let name = naming::spring("belly");
        ctx.graph
            .create(&name, head, head - Vec3::Y * length, 0.0, Some(waist))?;
        ctx.apply_settings(&name, &spring_settings())?;
        ctx.graph.add_constraint(
            &name,
            rotation_to_scale("swell", waist, SPRING_BELLY_ROT_DEG, SPRING_BELLY_SCALE),
        )?;
        created.push(name);
        Ok(())
    }

    fn build_bottom(
        &self,
        ctx: &mut RigBuildContext<'_>,
        side: Side,
        created: &mut Vec<String>,
    ) -> RigResult<()> {
        let thigh = naming::sided("thigh", side);
        let (origin, length) = {
            let joint = ctx.graph.joint(&thigh)?;
            (joint.head, joint.length())
        };
        let reach = length * BOTTOM_LENGTH_FACTOR;
        let head = match ctx.probe().cast(origin, Vec3::Y, SPRING_RAY_DISTANCE) {
            Some(hit) => hit.position,
            None => {
                ctx.note(format!(
                    "geometry query miss: seat behind '{thigh}', assuming a quarter thigh out"
                ));
                origin + Vec3::Y * reach
            }
        };

        let name = naming::spring(&naming::sided("bottom", side));
        ctx.graph
            .create(&name, head, head - Vec3::Z * reach, 0.0, Some("hips"))?;
        ctx.apply_settings(&name, &spring_settings())?;

        // Thigh pitch reads the same on both sides, so the branch
        // boundaries do not mirror.
        ctx.graph.add_constraint(
            &name,
            rotation_to_scale(
                "swell forward",
                &thigh,
                SPRING_BOTTOM_FWD_ROT_TO_SCALE_ROT_DEG,
                SPRING_BOTTOM_FWD_ROT_TO_SCALE_SCALE,
            ),
        )?;
        ctx.graph.add_constraint(
            &name,
            rotation_to_rotation(
                "swing forward",
                &thigh,
                Axis::X,
                SPRING_BOTTOM_FWD_ROT_TO_ROT_ROT_DEG,
                SPRING_BOTTOM_FWD_ROT_TO_ROT_TARGET_DEG,
            ),
        )?;
        ctx.graph.add_constraint(
            &name,
            rotation_to_scale(
                "swell backward",
                &thigh,
                SPRING_BOTTOM_BWD_ROT_TO_SCALE_ROT_DEG,
                SPRING_BOTTOM_BWD_ROT_TO_SCALE_SCALE,
            ),
        )?;
        ctx.graph.add_constraint(
            &name,
            rotation_to_rotation(
                "swing backward",
                &thigh,
                Axis::X,
                SPRING_BOTTOM_BWD_ROT_TO_ROT_ROT_DEG,
                SPRING_BOTTOM_BWD_ROT_TO_ROT_TARGET_DEG,
            ),
        )?;
        created.push(name);
        Ok(())
    }

    fn build_chest(
        &self,
        ctx: &mut RigBuildContext<'_>,
        side: Side,
        created: &mut Vec<String>,
        relevant: &mut Vec<String>,
    ) -> RigResult<()> {
        let shoulder = naming::sided("shoulder", side);
        let (origin, length) = {
            let joint = ctx.graph.joint(&shoulder)?;
            (joint.head, joint.length())
        };
        let reach = length * CHEST_LENGTH_FACTOR;
        let head = match ctx.probe().cast(origin, -Vec3::Y, SPRING_RAY_DISTANCE) {
            Some(hit) => hit.position,
            None => {
                ctx.note(format!(
                    "geometry query miss: chest in front of '{shoulder}', assuming half a shoulder out"
                ));
                origin - Vec3::Y * reach
            }
        };

        let name = naming::spring(&naming::sided("chest", side));
        ctx.graph
            .create(&name, head, head - Vec3::Y * reach, 0.0, Some("spine_3"))?;
        ctx.apply_settings(&name, &spring_settings())?;

        let target = naming::target(&naming::sided("chest", side));
        let target_head = head - Vec3::Y * CHEST_TARGET_DISTANCE;
        ctx.graph.create(
            &target,
            target_head,
            target_head - Vec3::Y * CHEST_TARGET_SIZE,
            0.0,
            Some("spine_3"),
        )?;
        ctx.apply_settings(
            &target,
            &JointSettings::on_layer(layers::CTRL_IK)
                .group(groups::SPRING)
                .lock(false, true, true)
                .role(JointRole::Ctrl)
                .shape(ShapeSpec::manual(ShapeStyle::Sphere, CHEST_TARGET_SIZE)),
        )?;

        ctx.graph.add_constraint(
            &name,
            Constraint::damped_track(format!("track {target}"), &target, 0.0),
        )?;
        // Shoulder raise reads with mirrored sign on the right.
        let sign = side.sign();
        ctx.graph.add_constraint(
            &name,
            rotation_to_rotation(
                "raise",
                &shoulder,
                Axis::Z,
                SPRING_CHEST_UP_SHOULDER_ROT_DEG * sign,
                SPRING_CHEST_UP_CHEST_ROT_DEG,
            ),
        )?;
        ctx.graph.add_constraint(
            &name,
            rotation_to_rotation(
                "drop",
                &shoulder,
                Axis::Z,
                SPRING_CHEST_DOWN_SHOULDER_ROT_DEG * sign,
                SPRING_CHEST_DOWN_CHEST_ROT_DEG,
            ),
        )?;

        created.push(name);
        created.push(target.clone());
        relevant.push(target);
        Ok(())
    }
}

impl ModuleBuilder for SpringsBuilder {
    fn name(&self) -> String {
        "springs".to_string()
    }

    fn requires(&self) -> Vec<String> {
        let mut needs = vec![
            "root".to_string(),
            "hips".to_string(),
            "spine_1".to_string(),
            "spine_3".to_string(),
        ];
        for side in Side::both() {
            needs.push(naming::sided("thigh", side));
            needs.push(naming::sided("shoulder", side));
        }
        needs
    }

    fn enabled(&self, options: &RigOptions) -> bool {
        options.springs
    }

    fn build(&self, ctx: &mut RigBuildContext<'_>) -> RigResult<()> {
        let module = self.name();
        let prop_joint = ctx.create_module_prop_joint(&module)?;
        let mut created: Vec<String> = Vec::new();
        let mut relevant: Vec<String> = Vec::new();

        self.build_belly(ctx, &mut created)?;
        for side in Side::both() {
            self.build_bottom(ctx, side, &mut created)?;
            self.build_chest(ctx, side, &mut created, &mut relevant)?;
        }

        ctx.bone_visibility(&prop_joint, &module, &relevant, CtrlStyle::Ctrl)?;
        ctx.set_module_on_joints(&module, &created)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintKind;
    use crate::modules::root::RootBuilder;
    use crate::raycast::{NullProbe, RayHit, SurfaceProbe};
    use pretty_assertions::assert_eq;
    use rigforge_spec::{RigOptions, SkeletonPreset, SourceSkeleton};

    struct ShellProbe;

    impl SurfaceProbe for ShellProbe {
        fn cast(&self, origin: Vec3, direction: Vec3, _max_distance: f32) -> Option<RayHit> {
            Some(RayHit {
                position: origin + direction.normalize() * 0.15,
                distance: 0.15,
            })
        }
    }

    fn built_context(probe: &'static dyn SurfaceProbe) -> RigBuildContext<'static> {
        let skeleton: &'static SourceSkeleton =
            Box::leak(Box::new(SkeletonPreset::BipedV1.source_skeleton()));
        let options: &'static RigOptions = Box::leak(Box::new(RigOptions::default()));
        let mut ctx = RigBuildContext::new(skeleton, options, probe).unwrap();
        RootBuilder.build(&mut ctx).unwrap();
        SpringsBuilder.build(&mut ctx).unwrap();
        ctx
    }

    fn remap_of<'a>(ctx: &'a RigBuildContext<'_>, joint: &str, name: &str) -> &'a TransformRemap {
        let constraint = ctx.graph.joint(joint).unwrap().constraint(name).unwrap();
        match &constraint.kind {
            ConstraintKind::TransformRemap(remap) => remap,
            other => panic!("{name} on {joint} is not a remap: {other:?}"),
        }
    }

    #[test]
    fn test_springs_build_five_correctives() {
        let ctx = built_context(&ShellProbe);

        for (name, parent) in [
            ("spring_belly", "spine_1"),
            ("spring_bottom_l", "hips"),
            ("spring_bottom_r", "hips"),
            ("spring_chest_l", "spine_3"),
            ("spring_chest_r", "spine_3"),
        ] {
            let joint = ctx.graph.joint(name).unwrap();
            assert_eq!(joint.parent.as_deref(), Some(parent), "{name} parent");
            assert!(joint.deform, "{name} deforms");
            assert_eq!(joint.layer, layers::SPRING, "{name} layer");
            assert_eq!(joint.group.as_deref(), Some(groups::SPRING), "{name} group");
            assert_eq!(joint.role, Some(JointRole::Spring), "{name} role");
            assert_eq!(joint.module.as_deref(), Some("springs"), "{name} module");
        }
        assert!(ctx.graph.contains("module_props__springs"));
    }

    #[test]
    fn test_belly_inflates_with_the_waist() {
        let ctx = built_context(&ShellProbe);

        let swell = remap_of(&ctx, "spring_belly", "swell");
        let constraint = ctx
            .graph
            .joint("spring_belly")
            .unwrap()
            .constraint("swell")
            .unwrap();
        assert_eq!(constraint.target.as_deref(), Some("spine_1"));
        assert_eq!(swell.from, ChannelRef::rotation(Axis::X));
        assert_eq!(swell.to, ChannelRef::scale(Axis::Y));
        assert_eq!(swell.space, Space::Local);

        assert!((swell.map(0.0) - 1.0).abs() < 1e-6);
        assert!((swell.map(SPRING_BELLY_ROT_DEG.to_radians()) - SPRING_BELLY_SCALE).abs() < 1e-6);
        // Past the boundary the output clamps; a backward bend stays neutral.
        assert!((swell.map(1.5) - SPRING_BELLY_SCALE).abs() < 1e-6);
        assert!((swell.map(-0.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bottom_swings_both_ways() {
        let ctx = built_context(&ShellProbe);

        let names: Vec<&str> = ctx
            .graph
            .joint("spring_bottom_l")
            .unwrap()
            .constraints
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["swell forward", "swing forward", "swell backward", "swing backward"]
        );

        let swing_fwd = remap_of(&ctx, "spring_bottom_l", "swing forward");
        assert!((swing_fwd.map(90f32.to_radians()) - 60f32.to_radians()).abs() < 1e-6);
        assert!(swing_fwd.map(0.0).abs() < 1e-6);
        assert!(swing_fwd.map(-0.5).abs() < 1e-6);

        let swing_bwd = remap_of(&ctx, "spring_bottom_l", "swing backward");
        assert!((swing_bwd.map((-30f32).to_radians()) - (-10f32).to_radians()).abs() < 1e-6);
        assert!((swing_bwd.map((-45f32).to_radians()) - (-10f32).to_radians()).abs() < 1e-6);
        assert!(swing_bwd.map(0.3).abs() < 1e-6);

        let swell_fwd = remap_of(&ctx, "spring_bottom_l", "swell forward");
        assert!((swell_fwd.map(45f32.to_radians()) - 1.4).abs() < 1e-6);
        let swell_bwd = remap_of(&ctx, "spring_bottom_l", "swell backward");
        assert!((swell_bwd.map((-30f32).to_radians()) - 1.4).abs() < 1e-6);
        assert!((swell_bwd.map(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_springs_sit_on_the_mesh() {
        let ctx = built_context(&ShellProbe);

        let waist_center = ctx.graph.joint("spine_1").unwrap().center();
        let belly = ctx.graph.joint("spring_belly").unwrap();
        assert_eq!(belly.head, waist_center - Vec3::Y * 0.15);

        let thigh_head = ctx.graph.joint("thigh_l").unwrap().head;
        let bottom = ctx.graph.joint("spring_bottom_l").unwrap();
        assert_eq!(bottom.head, thigh_head + Vec3::Y * 0.15);

        let shoulder_head = ctx.graph.joint("shoulder_r").unwrap().head;
        let chest = ctx.graph.joint("spring_chest_r").unwrap();
        assert_eq!(chest.head, shoulder_head - Vec3::Y * 0.15);
    }

    #[test]
    fn test_probe_miss_tucks_springs_against_the_bone() {
        let ctx = built_context(&NullProbe);

        let waist = ctx.graph.joint("spine_1").unwrap();
        let expected_belly = waist.center() - Vec3::Y * waist.length();
        assert_eq!(ctx.graph.joint("spring_belly").unwrap().head, expected_belly);

        let thigh = ctx.graph.joint("thigh_l").unwrap();
        let expected_bottom = thigh.head + Vec3::Y * (thigh.length() * BOTTOM_LENGTH_FACTOR);
        assert_eq!(ctx.graph.joint("spring_bottom_l").unwrap().head, expected_bottom);

        let shoulder = ctx.graph.joint("shoulder_l").unwrap();
        let expected_chest = shoulder.head - Vec3::Y * (shoulder.length() * CHEST_LENGTH_FACTOR);
        assert_eq!(ctx.graph.joint("spring_chest_l").unwrap().head, expected_chest);
    }

    #[test]
    fn test_chest_tracks_its_target_and_rides_the_shoulder() {
        let ctx = built_context(&ShellProbe);

        let chest = ctx.graph.joint("spring_chest_l").unwrap();
        let track = chest.constraint("track target_chest_l").unwrap();
        assert_eq!(track.target.as_deref(), Some("target_chest_l"));

        let target = ctx.graph.joint("target_chest_l").unwrap();
        assert_eq!(target.head, chest.head - Vec3::Y * CHEST_TARGET_DISTANCE);
        assert_eq!(target.parent.as_deref(), Some("spine_3"));
        assert_eq!(target.layer, layers::CTRL_IK);
        assert_eq!(target.role, Some(JointRole::Ctrl));
        assert!(!target.locks.location.iter().any(|l| *l));
        assert!(target.locks.rotation.iter().all(|l| *l));
        assert!(target.locks.scale.iter().all(|l| *l));

        let raise_l = remap_of(&ctx, "spring_chest_l", "raise");
        assert_eq!(raise_l.from, ChannelRef::rotation(Axis::Z));
        assert!((raise_l.from_max - 60f32.to_radians()).abs() < 1e-6);
        assert!((raise_l.map(60f32.to_radians()) - 30f32.to_radians()).abs() < 1e-6);

        // The right shoulder reads raises with opposite sign.
        let raise_r = remap_of(&ctx, "spring_chest_r", "raise");
        assert!((raise_r.from_max + 60f32.to_radians()).abs() < 1e-6);
        assert!((raise_r.map((-60f32).to_radians()) - 30f32.to_radians()).abs() < 1e-6);
        assert!(raise_r.map(60f32.to_radians()).abs() < 1e-6);

        let drop_l = remap_of(&ctx, "spring_chest_l", "drop");
        assert!((drop_l.map((-20f32).to_radians()) - (-5f32).to_radians()).abs() < 1e-6);
        assert!(drop_l.map(0.4).abs() < 1e-6);
    }

    #[test]
    fn test_springs_toggle_with_the_option() {
        assert!(SpringsBuilder.enabled(&RigOptions::default()));
        assert!(!SpringsBuilder.enabled(&RigOptions::default().with_springs(false)));
    }

    #[test]
    fn test_record_lists_the_chest_targets() {
        let ctx = built_context(&ShellProbe);

        let record = ctx
            .modules()
            .iter()
            .find(|m| m.name == "springs")
            .unwrap();
        assert!(!record.switchable);
        assert!(record.snap.is_empty());
        assert_eq!(
            record.relevant_joints,
            vec!["target_chest_l".to_string(), "target_chest_r".to_string()]
        );

        let hide_props: Vec<&str> = ctx
            .drivers()
            .iter()
            .filter(|d| d.prop.property == "visible_ctrl_springs")
            .map(|d| d.target.joint())
            .collect();
        assert_eq!(hide_props, vec!["target_chest_l", "target_chest_r"]);
    }
}
