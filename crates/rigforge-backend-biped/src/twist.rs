//! Limb twist distribution chains.
//!
//! Rolling a limb segment at a single pivot shears the skin weights near
//! the joint. These builders subdivide the segment into up to three
//! deforming twist joints that each aim a tracking constraint at a stable
//! reference point, with graded influence along the segment. Upper
//! segments (upperarm, thigh) derive the reference from a no-twist joint
//! that follows the segment's swing but not its roll; lower segments
//! (forearm, shin) glue the reference to the end affector so wrist or
//! ankle roll is what gets distributed.

use crate::constants::{
    layers, FOREARM_TWIST_INFLUENCES, SHIN_TWIST_INFLUENCES, THIGH_TWIST_INFLUENCES,
    THIGH_TWIST_SLIDE_FACTOR, THIGH_TWIST_SLIDE_ROT_DEG, TWIST_TARGET_DISTANCE,
    TWIST_TARGET_DISTANCE_LOWER, UPPERARM_TWIST_INFLUENCES,
};
use crate::constraint::{
    Axis, ChannelRef, Constraint, ConstraintKind, Space, TrackAxis, TransformRemap,
};
use crate::context::{JointSettings, RigBuildContext};
use crate::error::RigResult;
use crate::graph::{JointRole, LengthMode, ParentSpec, SubdivideParent};
use crate::naming;
use crate::rig::groups;

/// Every segment is cut into this many sub-joints before surplus joints
/// are discarded down to the configured count.
const TWIST_SUBDIVISIONS: u8 = 3;

/// Limb segment classes with distinct influence tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwistSegment {
    Upperarm,
    Forearm,
    Thigh,
    Shin,
}

impl TwistSegment {
    /// Influence row for a twist count, indexed by joint index - 1.
    fn influences(self, count: u8) -> &'static [f32] {
        let row = (count - 1) as usize;
        match self {
            TwistSegment::Upperarm => UPPERARM_TWIST_INFLUENCES[row],
            TwistSegment::Forearm => FOREARM_TWIST_INFLUENCES[row],
            TwistSegment::Thigh => THIGH_TWIST_INFLUENCES[row],
            TwistSegment::Shin => SHIN_TWIST_INFLUENCES[row],
        }
    }

    /// Upper segments number from the shoulder or hip and decouple their
    /// reference through a no-twist joint; lower segments number from the
    /// wrist or ankle and follow the end affector.
    fn is_upper(self) -> bool {
        matches!(self, TwistSegment::Upperarm | TwistSegment::Thigh)
    }

    /// Hip swing shears the thigh surface sideways, so thigh targets get
    /// a corrective slide.
    fn slides_with_swing(self) -> bool {
        matches!(self, TwistSegment::Thigh)
    }
}

/// One limb segment to grow a twist chain on.
#[derive(Debug, Clone, Copy)]
pub struct TwistSpec<'a> {
    pub segment: TwistSegment,
    /// The deforming segment joint, e.g. `upperarm_l`.
    pub source: &'a str,
    /// The joint lower-segment references glue to (hand or foot). Upper
    /// segments ignore it.
    pub end_affector: &'a str,
    /// Twist joints to keep, 0 to 3. Zero builds nothing.
    pub count: u8,
}

/// Builds the twist chain of one limb segment and returns the twist
/// joint names ordered by index.
pub fn build_twist_chain(
    ctx: &mut RigBuildContext<'_>,
    spec: &TwistSpec<'_>,
) -> RigResult<Vec<String>> {
    let count = spec.count.min(TWIST_SUBDIVISIONS);
    if count == 0 {
        return Ok(Vec::new());
    }

    let twists = ctx.graph.subdivide(
        spec.source,
        TWIST_SUBDIVISIONS,
        count,
        !spec.segment.is_upper(),
        "twist",
        SubdivideParent::Source,
        false,
    )?;
    for name in &twists {
        ctx.apply_settings(
            name,
            &JointSettings::on_layer(layers::TWIST)
                .group(groups::TWIST)
                .deforming()
                .lock(true, false, true)
                .role(JointRole::Twist),
        )?;
    }

    let target = if spec.segment.is_upper() {
        build_upper_target(ctx, spec)?
    } else {
        build_lower_target(ctx, spec)?
    };

    let influences = spec.segment.influences(count);
    for (name, influence) in twists.iter().zip(influences) {
        ctx.graph.add_constraint(
            name,
            Constraint::new(
                "track twist target",
                Some(target.clone()),
                ConstraintKind::DampedTrack {
                    track_axis: TrackAxis::Z,
                    head_tail: 0.0,
                },
            )
            .with_influence(*influence),
        )?;
    }

    Ok(twists)
}

/// A no-twist reference plus an aim point hanging off it. The no-twist
/// joint keeps the source's parent and tracks the source's tail, which
/// reproduces the segment's swing while its own roll stays put.
fn build_upper_target(ctx: &mut RigBuildContext<'_>, spec: &TwistSpec<'_>) -> RigResult<String> {
    let no_twist = naming::no_twist(spec.source);
    ctx.graph
        .duplicate(spec.source, &no_twist, ParentSpec::SourceParent, LengthMode::Half)?;
    ctx.apply_settings(
        &no_twist,
        &JointSettings::on_layer(layers::BASE).lock(true, false, true),
    )?;
    ctx.graph.add_constraint(
        &no_twist,
        Constraint::damped_track(format!("track {}", spec.source), spec.source, 1.0),
    )?;

    let target = naming::twist_target(spec.source);
    ctx.graph
        .duplicate(&no_twist, &target, ParentSpec::Joint(&no_twist), LengthMode::Full)?;
    let offset = ctx.graph.joint(&no_twist)?.z_axis() * TWIST_TARGET_DISTANCE;
    ctx.graph.translate(&target, offset)?;
    ctx.apply_settings(
        &target,
        &JointSettings::on_layer(layers::TWIST_TARGET).lock(true, true, true),
    )?;

    if spec.segment.slides_with_swing() {
        let slide = ctx.graph.joint(spec.source)?.length() * THIGH_TWIST_SLIDE_FACTOR;
        let swing = THIGH_TWIST_SLIDE_ROT_DEG.to_radians();
        ctx.graph.add_constraint(
            &target,
            Constraint::remap(
                "slide with swing",
                spec.source,
                TransformRemap {
                    from: ChannelRef::rotation(Axis::X),
                    to: ChannelRef::location(Axis::Y),
                    from_min: -swing,
                    from_max: swing,
                    to_min: -slide,
                    to_max: slide,
                    space: Space::Local,
                },
            ),
        )?;
    }
    Ok(target)
}

/// An aim point pinned to the end affector. The joint stays parented to
/// the segment; a child-of constraint with the affector's bind inverse
/// takes over at pose time, so only rotation the hand or foot adds after
/// binding reaches the twist joints.
fn build_lower_target(ctx: &mut RigBuildContext<'_>, spec: &TwistSpec<'_>) -> RigResult<String> {
    let target = naming::twist_target(spec.source);
    ctx.graph
        .duplicate(spec.source, &target, ParentSpec::Joint(spec.source), LengthMode::Half)?;
    let offset = ctx.graph.joint(spec.source)?.z_axis() * TWIST_TARGET_DISTANCE_LOWER;
    ctx.graph.translate(&target, offset)?;
    ctx.apply_settings(
        &target,
        &JointSettings::on_layer(layers::TWIST_TARGET).lock(true, true, true),
    )?;

    let inverse_offset = ctx
        .graph
        .joint(spec.end_affector)?
        .world_matrix()
        .inverse()
        .to_cols_array();
    ctx.graph.add_constraint(
        &target,
        Constraint::new(
            format!("follow {}", spec.end_affector),
            Some(spec.end_affector.to_string()),
            ConstraintKind::ChildOf { inverse_offset },
        ),
    )?;
    Ok(target)
}
