//! Finger modules, one per side.
//!
//! Every finger is a three-segment FK chain bound always-on to the base
//! joints, plus a `ctrl_{finger}` master whose Y scale curls the chain:
//! squashing below rest maps to forward curl, stretching above rest to a
//! small backward splay. Both branches clamp at rest scale so the other
//! branch contributes nothing. The thumb keeps its metacarpal out of the
//! curl and uses wider backward range.

use rigforge_spec::skeleton::FINGER_BASES;
use rigforge_spec::{RigOptions, Side};

use crate::constants::{
    layers, FINGER_CURL_BWD_ROT_DEG, FINGER_CURL_FWD_ROT_DEG, FINGER_CURL_SCALE_MAX,
    FINGER_CURL_SCALE_MIN, FINGER_SHAPE_SIZE, THUMB_CURL_BWD_ROT_DEG, THUMB_CURL_FWD_ROT_DEG,
};
use crate::constraint::{Axis, ChannelRef, Constraint, Space, TransformRemap};
use crate::context::{CtrlStyle, JointSettings, RigBuildContext};
use crate::error::RigResult;
use crate::graph::{JointRole, LengthMode, ParentSpec};
use crate::modules::ModuleBuilder;
use crate::naming;
use crate::rig::{groups, ModuleRecord};
use crate::shapes::{ShapeSpec, ShapeStyle};

pub struct FingersBuilder {
    pub side: Side,
}

impl FingersBuilder {
    fn hand(&self) -> String {
        naming::sided("hand", self.side)
    }

    fn segments(&self, base: &str) -> [String; 3] {
        [
            naming::sided(&format!("{base}_1"), self.side),
            naming::sided(&format!("{base}_2"), self.side),
            naming::sided(&format!("{base}_3"), self.side),
        ]
    }
}

impl ModuleBuilder for FingersBuilder {
    fn name(&self) -> String {
        naming::sided("fingers", self.side)
    }

    fn requires(&self) -> Vec<String> {
        let mut needs = vec![self.hand()];
        for base in FINGER_BASES {
            needs.extend(self.segments(base));
        }
        needs
    }

    fn enabled(&self, options: &RigOptions) -> bool {
        options.fingers
    }

    fn build(&self, ctx: &mut RigBuildContext<'_>) -> RigResult<()> {
        let module = self.name();
        let hand = self.hand();
        let prop_joint = ctx.create_module_prop_joint(&module)?;
        let mut relevant: Vec<String> = Vec::new();

        for base in FINGER_BASES {
            let segments = self.segments(base);
            let is_thumb = base == "thumb";

            for (index, name) in segments.iter().enumerate() {
                let parent = if index == 0 {
                    hand.clone()
                } else {
                    segments[index - 1].clone()
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

            let fk_chain: Vec<String> = segments.iter().map(|name| naming::fk(name)).collect();
            for (index, (source, fk)) in segments.iter().zip(&fk_chain).enumerate() {
                let parent = if index == 0 {
                    hand.clone()
                } else {
                    fk_chain[index - 1].clone()
                };
                ctx.graph
                    .duplicate(source, fk, ParentSpec::Joint(&parent), LengthMode::Full)?;
                ctx.apply_settings(
                    fk,
                    &JointSettings::on_layer(layers::FK)
                        .group(groups::FK)
                        .lock(true, false, true)
                        .role(JointRole::Fk)
                        .shape(ShapeSpec::manual(ShapeStyle::Sphere, FINGER_SHAPE_SIZE)),
                )?;
                ctx.graph.add_constraint(
                    source,
                    Constraint::copy_rotation(format!("copy {fk}"), fk.clone()),
                )?;
                relevant.push(fk.clone());
            }

            let ctrl = naming::ctrl(&naming::sided(base, self.side));
            ctx.graph
                .duplicate(&segments[0], &ctrl, ParentSpec::Joint(&hand), LengthMode::Full)?;
            ctx.apply_settings(
                &ctrl,
                &JointSettings::on_layer(layers::FK)
                    .group(groups::FK)
                    .lock(true, true, false)
                    .role(JointRole::Ctrl)
                    .shape(ShapeSpec::manual(ShapeStyle::Plane, FINGER_SHAPE_SIZE)),
            )?;
            relevant.push(ctrl.clone());

            let (fwd, bwd) = if is_thumb {
                (THUMB_CURL_FWD_ROT_DEG, THUMB_CURL_BWD_ROT_DEG)
            } else {
                (FINGER_CURL_FWD_ROT_DEG, FINGER_CURL_BWD_ROT_DEG)
            };
            // The thumb's first segment is the metacarpal and stays out
            // of the curl.
            let curled = if is_thumb { &fk_chain[1..] } else { &fk_chain[..] };
            for fk in curled {
                add_curl_remaps(ctx, fk, &ctrl, fwd, bwd)?;
            }
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

/// Two curl branches: squash below rest scale rolls the segment forward,
/// stretch above rest splays it back. Each branch clamps to zero inside
/// the other's range.
fn add_curl_remaps(
    ctx: &mut RigBuildContext<'_>,
    fk: &str,
    ctrl: &str,
    fwd_deg: f32,
    bwd_deg: f32,
) -> RigResult<()> {
    ctx.graph.add_constraint(
        fk,
        Constraint::remap(
            "curl forward",
            ctrl,
            TransformRemap {
                from: ChannelRef::scale(Axis::Y),
                to: ChannelRef::rotation(Axis::X),
                from_min: 1.0,
                from_max: FINGER_CURL_SCALE_MIN,
                to_min: 0.0,
                to_max: fwd_deg.to_radians(),
                space: Space::Local,
            },
        ),
    )?;
    ctx.graph.add_constraint(
        fk,
        Constraint::remap(
            "curl backward",
            ctrl,
            TransformRemap {
                from: ChannelRef::scale(Axis::Y),
                to: ChannelRef::rotation(Axis::X),
                from_min: 1.0,
                from_max: FINGER_CURL_SCALE_MAX,
                to_min: 0.0,
                to_max: bwd_deg.to_radians(),
                space: Space::Local,
            },
        ),
    )?;
    Ok(())
}
