//! Rig module builders.
//!
//! Each module synthesizes one region of the rig:
//! - `root` - root control and the root_extract helper
//! - `torso` - hips/spine chain with FK and the ctrl/ik spine mechanism
//! - `ik_prop` - the shared hand prop attachment joint
//! - `head` - neck and head controls, optional neck twist
//! - `arm` - shoulder FK plus the three-joint limb, twists, touch
//! - `leg` - three-joint limb plus foot roll pivots and toe controls
//! - `fingers` - per-finger FK chains and scale-to-curl controls
//! - `springs` - belly, bottom, and chest corrective joints
//! - `face` - tiered eye, jaw, and detail controls
//!
//! Builders declare the joint names they depend on; the runner executes
//! whichever builders are satisfied until none remain, so a module can
//! rely on joints an earlier module created (`root_extract`,
//! `ik_hand_prop`) without hardcoding the sequence.

pub mod arm;
pub mod face;
pub mod fingers;
pub mod head;
pub mod ik_prop;
pub mod leg;
pub mod root;
pub mod springs;
pub mod torso;

use rigforge_spec::{RigOptions, Side};

use crate::context::RigBuildContext;
use crate::error::{RigError, RigResult};

/// Common interface of all rig module builders.
pub trait ModuleBuilder {
    /// Module name, used for records, properties, and error context.
    fn name(&self) -> String;

    /// Joint names that must exist in the graph before `build` runs.
    fn requires(&self) -> Vec<String>;

    /// Whether the options enable this module at all.
    fn enabled(&self, _options: &RigOptions) -> bool {
        true
    }

    /// Synthesizes the module into the context.
    fn build(&self, ctx: &mut RigBuildContext<'_>) -> RigResult<()>;
}

/// The stock builder set, in canonical registration order.
pub fn default_builders() -> Vec<Box<dyn ModuleBuilder>> {
    let mut builders: Vec<Box<dyn ModuleBuilder>> = vec![
        Box::new(root::RootBuilder),
        Box::new(torso::TorsoBuilder),
        Box::new(ik_prop::IkPropBuilder),
        Box::new(head::HeadBuilder),
    ];
    for side in Side::both() {
        builders.push(Box::new(arm::ArmBuilder { side }));
    }
    for side in Side::both() {
        builders.push(Box::new(leg::LegBuilder { side }));
    }
    for side in Side::both() {
        builders.push(Box::new(fingers::FingersBuilder { side }));
    }
    builders.push(Box::new(springs::SpringsBuilder));
    builders.push(Box::new(face::FaceBuilder));
    builders
}

/// Runs every enabled builder whose dependencies are met, repeating
/// until all have run. A pass that runs nothing means the remaining
/// builders wait on joints nobody will create; the first of them names
/// the missing joints in the error.
pub fn run_builders(
    ctx: &mut RigBuildContext<'_>,
    builders: &[Box<dyn ModuleBuilder>],
) -> RigResult<()> {
    let mut pending: Vec<&Box<dyn ModuleBuilder>> = builders
        .iter()
        .filter(|b| b.enabled(ctx.options))
        .collect();

    while !pending.is_empty() {
        let mut blocked = Vec::new();
        let mut progressed = false;

        for builder in pending {
            let missing: Vec<String> = builder
                .requires()
                .into_iter()
                .filter(|joint| !ctx.graph.contains(joint))
                .collect();
            if missing.is_empty() {
                builder
                    .build(ctx)
                    .map_err(|err| err.in_module(&builder.name()))?;
                progressed = true;
            } else {
                blocked.push((builder, missing));
            }
        }

        if !progressed {
            let (builder, missing) = blocked
                .into_iter()
                .next()
                .expect("pending was non-empty and nothing ran");
            return Err(RigError::DependencyUnsatisfied {
                module: builder.name(),
                missing,
            });
        }
        pending = blocked.into_iter().map(|(builder, _)| builder).collect();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raycast::NullProbe;
    use rigforge_spec::{SkeletonPreset, SourceSkeleton};

    struct NeedsGhost;

    impl ModuleBuilder for NeedsGhost {
        fn name(&self) -> String {
            "ghost_rider".into()
        }

        fn requires(&self) -> Vec<String> {
            vec!["ghost_joint".into()]
        }

        fn build(&self, _ctx: &mut RigBuildContext<'_>) -> RigResult<()> {
            Ok(())
        }
    }

    struct CountingBuilder {
        name: &'static str,
        needs: &'static [&'static str],
        creates: &'static str,
    }

    impl ModuleBuilder for CountingBuilder {
        fn name(&self) -> String {
            self.name.into()
        }

        fn requires(&self) -> Vec<String> {
            self.needs.iter().map(|s| s.to_string()).collect()
        }

        fn build(&self, ctx: &mut RigBuildContext<'_>) -> RigResult<()> {
            ctx.graph.create(
                self.creates,
                glam::Vec3::ZERO,
                glam::Vec3::Y,
                0.0,
                None,
            )?;
            Ok(())
        }
    }

    fn test_context() -> RigBuildContext<'static> {
        let skeleton: &'static SourceSkeleton =
            Box::leak(Box::new(SkeletonPreset::BipedV1.source_skeleton()));
        let options: &'static RigOptions =
            Box::leak(Box::new(RigOptions::default()));
        RigBuildContext::new(skeleton, options, &NullProbe).unwrap()
    }

    #[test]
    fn test_runner_orders_by_dependency_not_registration() {
        let mut ctx = test_context();
        // Registered out of order: b waits for a's joint.
        let builders: Vec<Box<dyn ModuleBuilder>> = vec![
            Box::new(CountingBuilder {
                name: "b",
                needs: &["made_by_a"],
                creates: "made_by_b",
            }),
            Box::new(CountingBuilder {
                name: "a",
                needs: &[],
                creates: "made_by_a",
            }),
        ];
        run_builders(&mut ctx, &builders).unwrap();
        assert!(ctx.graph.contains("made_by_a"));
        assert!(ctx.graph.contains("made_by_b"));
    }

    #[test]
    fn test_runner_reports_unsatisfiable_dependency() {
        let mut ctx = test_context();
        let builders: Vec<Box<dyn ModuleBuilder>> = vec![Box::new(NeedsGhost)];
        let err = run_builders(&mut ctx, &builders).unwrap_err();
        match err {
            RigError::DependencyUnsatisfied { module, missing } => {
                assert_eq!(module, "ghost_rider");
                assert_eq!(missing, vec!["ghost_joint".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_builders_register_every_region() {
        let names: Vec<String> = default_builders().iter().map(|b| b.name()).collect();
        for expected in [
            "root", "spine", "ik_prop", "head", "arm_l", "arm_r", "leg_l", "leg_r",
            "fingers_l", "fingers_r", "springs", "face",
        ] {
            assert!(names.contains(&expected.to_string()), "missing {expected}");
        }
    }
}
