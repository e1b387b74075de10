//! Constraint records.
//!
//! Constraints are data: the downstream engine evaluates them. Declaration
//! order on a joint is evaluation order, later constraints win on the
//! channels they write.

use serde::{Deserialize, Serialize};

/// Evaluation space for constraint input and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Space {
    /// Armature space.
    #[default]
    World,
    /// Joint local space.
    Local,
}

/// Per-axis toggle triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisToggles {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl AxisToggles {
    /// All axes enabled.
    pub fn all() -> Self {
        Self { x: true, y: true, z: true }
    }

    /// No axes enabled.
    pub fn none() -> Self {
        Self { x: false, y: false, z: false }
    }

    /// Only X enabled.
    pub fn only_x() -> Self {
        Self { x: true, y: false, z: false }
    }
}

impl Default for AxisToggles {
    fn default() -> Self {
        Self::all()
    }
}

/// Tracking axis for track constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackAxis {
    X,
    #[default]
    Y,
    Z,
    NegX,
    NegY,
    NegZ,
}

/// Rotation mixing for copy-rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMix {
    /// Replace the owner rotation.
    #[default]
    Replace,
    /// Add on top of the owner rotation.
    Offset,
}

/// A transform axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Channel kinds a transform remap can read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Location,
    Rotation,
    Scale,
}

/// One transform channel of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub kind: ChannelKind,
    pub axis: Axis,
}

impl ChannelRef {
    pub fn rotation(axis: Axis) -> Self {
        Self { kind: ChannelKind::Rotation, axis }
    }

    pub fn location(axis: Axis) -> Self {
        Self { kind: ChannelKind::Location, axis }
    }

    pub fn scale(axis: Axis) -> Self {
        Self { kind: ChannelKind::Scale, axis }
    }
}

/// Piecewise-linear mapping from one channel of the target to one channel
/// of the owner. Input is clamped to `[from_min, from_max]`; rotation
/// values are radians, scale values are factors applied on every axis when
/// the output channel is scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformRemap {
    pub from: ChannelRef,
    pub to: ChannelRef,
    pub from_min: f32,
    pub from_max: f32,
    pub to_min: f32,
    pub to_max: f32,
    #[serde(default)]
    pub space: Space,
}

impl TransformRemap {
    /// Evaluates the mapping for a raw input value. This is the reference
    /// semantics the remap constraint carries; the engine side must match.
    pub fn map(&self, input: f32) -> f32 {
        if (self.from_max - self.from_min).abs() < f32::EPSILON {
            return self.to_min;
        }
        let clamped = if self.from_min <= self.from_max {
            input.clamp(self.from_min, self.from_max)
        } else {
            input.clamp(self.from_max, self.from_min)
        };
        let t = (clamped - self.from_min) / (self.from_max - self.from_min);
        self.to_min + (self.to_max - self.to_min) * t
    }
}

/// Rotation limit range for one axis, radians.
pub type LimitRange = (f32, f32);

/// Constraint behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    CopyRotation {
        #[serde(default)]
        axes: AxisToggles,
        #[serde(default = "AxisToggles::none")]
        invert: AxisToggles,
        #[serde(default)]
        mix: RotationMix,
        #[serde(default)]
        target_space: Space,
        #[serde(default)]
        owner_space: Space,
    },
    CopyLocation {
        #[serde(default)]
        axes: AxisToggles,
        #[serde(default)]
        use_offset: bool,
        #[serde(default)]
        target_space: Space,
        #[serde(default)]
        owner_space: Space,
    },
    CopyScale {
        #[serde(default)]
        axes: AxisToggles,
        #[serde(default)]
        use_offset: bool,
    },
    DampedTrack {
        #[serde(default)]
        track_axis: TrackAxis,
        /// Aim point along the target joint, 0 head to 1 tail.
        #[serde(default)]
        head_tail: f32,
    },
    TrackTo {
        #[serde(default)]
        track_axis: TrackAxis,
        #[serde(default)]
        target_space: Space,
        #[serde(default)]
        owner_space: Space,
    },
    LimitRotation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<LimitRange>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<LimitRange>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        z: Option<LimitRange>,
        /// Clamp the visible transform values, not only the evaluated pose.
        #[serde(default)]
        transform_limit: bool,
        #[serde(default)]
        owner_space: Space,
    },
    LimitScale {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f32>,
        #[serde(default)]
        owner_space: Space,
    },
    Ik {
        /// How many parents above the owner the chain includes.
        chain_count: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pole_target: Option<String>,
        /// Pole angle, radians.
        #[serde(default)]
        pole_angle: f32,
        /// Solve to the target's tail instead of its head.
        #[serde(default)]
        use_tail: bool,
    },
    TransformRemap(TransformRemap),
    ChildOf {
        /// Snapshotted inverse of the target's world matrix at bind time,
        /// column-major.
        inverse_offset: [f32; 16],
    },
    StretchTo {
        /// Rest length of the owner, world units.
        rest_length: f32,
        #[serde(default)]
        head_tail: f32,
    },
}

/// One constraint on a joint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Constraint name, unique on its joint.
    pub name: String,
    /// Target joint, when the kind uses one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Blend factor in [0, 1].
    pub influence: f32,
    /// Muted constraints are skipped by the engine.
    #[serde(default)]
    pub mute: bool,
    #[serde(flatten)]
    pub kind: ConstraintKind,
}

impl Constraint {
    /// A new constraint with influence 1, unmuted.
    pub fn new(name: impl Into<String>, target: Option<String>, kind: ConstraintKind) -> Self {
        Self {
            name: name.into(),
            target,
            influence: 1.0,
            mute: false,
            kind,
        }
    }

    /// Full copy-rotation of `target` in world space.
    pub fn copy_rotation(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            name,
            Some(target.into()),
            ConstraintKind::CopyRotation {
                axes: AxisToggles::all(),
                invert: AxisToggles::none(),
                mix: RotationMix::Replace,
                target_space: Space::World,
                owner_space: Space::World,
            },
        )
    }

    /// Local-space copy-rotation of `target`.
    pub fn copy_rotation_local(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            name,
            Some(target.into()),
            ConstraintKind::CopyRotation {
                axes: AxisToggles::all(),
                invert: AxisToggles::none(),
                mix: RotationMix::Replace,
                target_space: Space::Local,
                owner_space: Space::Local,
            },
        )
    }

    /// Full copy-location of `target` in world space.
    pub fn copy_location(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            name,
            Some(target.into()),
            ConstraintKind::CopyLocation {
                axes: AxisToggles::all(),
                use_offset: false,
                target_space: Space::World,
                owner_space: Space::World,
            },
        )
    }

    /// Damped track toward a point along `target`.
    pub fn damped_track(name: impl Into<String>, target: impl Into<String>, head_tail: f32) -> Self {
        Self::new(
            name,
            Some(target.into()),
            ConstraintKind::DampedTrack {
                track_axis: TrackAxis::Y,
                head_tail,
            },
        )
    }

    /// Transform remap driven by `target`.
    pub fn remap(name: impl Into<String>, target: impl Into<String>, remap: TransformRemap) -> Self {
        Self::new(name, Some(target.into()), ConstraintKind::TransformRemap(remap))
    }

    /// Sets the influence.
    pub fn with_influence(mut self, influence: f32) -> Self {
        self.influence = influence;
        self
    }

    /// Starts the constraint muted.
    pub fn muted(mut self) -> Self {
        self.mute = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remap_clamps_and_interpolates() {
        let remap = TransformRemap {
            from: ChannelRef::rotation(Axis::X),
            to: ChannelRef::scale(Axis::Y),
            from_min: 0.0,
            from_max: 1.0,
            to_min: 1.0,
            to_max: 2.0,
            space: Space::Local,
        };
        assert_eq!(remap.map(-0.5), 1.0);
        assert_eq!(remap.map(0.5), 1.5);
        assert_eq!(remap.map(2.0), 2.0);
    }

    #[test]
    fn test_remap_negative_range() {
        let remap = TransformRemap {
            from: ChannelRef::rotation(Axis::X),
            to: ChannelRef::rotation(Axis::X),
            from_min: 0.0,
            from_max: -0.6,
            to_min: 0.0,
            to_max: -0.2,
            space: Space::Local,
        };
        assert_eq!(remap.map(0.2), 0.0);
        assert!((remap.map(-0.3) + 0.1).abs() < 1e-6);
        assert!((remap.map(-0.9) + 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_constraint_json_shape() {
        let c = Constraint::copy_rotation("bind_to_fk_1", "fk_thigh_l").muted();
        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value["type"], "copy_rotation");
        assert_eq!(value["target"], "fk_thigh_l");
        assert_eq!(value["mute"], true);
    }

    #[test]
    fn test_constraint_roundtrip() {
        let c = Constraint::damped_track("track twist target", "twist_target_upperarm_l", 1.0)
            .with_influence(0.75);
        let json = serde_json::to_string(&c).unwrap();
        let back: Constraint = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }
}
