//! Proxy shape catalog and sizing.
//!
//! Controls carry a display proxy so animators can grab them. Sizing is
//! either a fixed scale or measured from the character skin: a four-ray
//! fan cast outward from the joint, widest hit wins. The binding is
//! cosmetic data in the document; it never feeds constraint evaluation.

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::{AUTO_SHAPE_MULTIPLIER, FALLBACK_SHAPE_SCALE, SHAPE_RAY_MAX_DISTANCE};
use crate::raycast::SurfaceProbe;

/// Display proxy styles shipped with the widget library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeStyle {
    Circle,
    Cube,
    Sphere,
    Plane,
    FootRoll,
    Arrow,
    Diamond,
}

impl ShapeStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeStyle::Circle => "circle",
            ShapeStyle::Cube => "cube",
            ShapeStyle::Sphere => "sphere",
            ShapeStyle::Plane => "plane",
            ShapeStyle::FootRoll => "foot_roll",
            ShapeStyle::Arrow => "arrow",
            ShapeStyle::Diamond => "diamond",
        }
    }
}

/// Where on the joint the proxy sits and rays originate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePoint {
    Head,
    #[default]
    Middle,
    Tail,
}

impl ReferencePoint {
    /// The reference position on a head-tail segment.
    pub fn position(self, head: Vec3, tail: Vec3) -> Vec3 {
        match self {
            ReferencePoint::Head => head,
            ReferencePoint::Middle => (head + tail) * 0.5,
            ReferencePoint::Tail => tail,
        }
    }
}

/// Requested sizing for a proxy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeSizing {
    /// Measure from the skin, then add `offset`.
    Auto { offset: f32 },
    /// Fixed scale.
    Manual { scale: f32 },
}

/// A shape request, resolved into a [`ShapeBinding`] at apply time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeSpec {
    pub style: ShapeStyle,
    pub sizing: ShapeSizing,
    pub reference: ReferencePoint,
}

impl ShapeSpec {
    pub fn auto(style: ShapeStyle, offset: f32) -> Self {
        Self {
            style,
            sizing: ShapeSizing::Auto { offset },
            reference: ReferencePoint::Middle,
        }
    }

    pub fn manual(style: ShapeStyle, scale: f32) -> Self {
        Self {
            style,
            sizing: ShapeSizing::Manual { scale },
            reference: ReferencePoint::Middle,
        }
    }

    pub fn at(mut self, reference: ReferencePoint) -> Self {
        self.reference = reference;
        self
    }
}

/// Resolved proxy binding stored on a joint.
///
/// `anchor` is a dedicated `shape_{name}` leaf joint when the proxy's
/// transform is decoupled from the control's pivot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeBinding {
    pub style: ShapeStyle,
    pub scale: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

/// Result of auto sizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScale {
    pub scale: f32,
    /// True when every ray missed and the fallback scale was used.
    pub missed: bool,
}

/// The four fan directions: local +Z swept around local Y in quarter
/// turns.
pub fn fan_directions(basis: Mat3) -> [Vec3; 4] {
    let mut dirs = [Vec3::ZERO; 4];
    for (n, dir) in dirs.iter_mut().enumerate() {
        let angle = (n as f32) * std::f32::consts::FRAC_PI_2;
        *dir = Mat3::from_axis_angle(basis.y_axis, angle) * basis.z_axis;
    }
    dirs
}

/// Measures a proxy scale by casting the fan from `origin`.
pub fn auto_shape_scale(
    probe: &dyn SurfaceProbe,
    origin: Vec3,
    basis: Mat3,
    offset: f32,
) -> AutoScale {
    let mut farthest: Option<f32> = None;
    for dir in fan_directions(basis) {
        if let Some(hit) = probe.cast(origin, dir, SHAPE_RAY_MAX_DISTANCE) {
            farthest = Some(farthest.map_or(hit.distance, |d: f32| d.max(hit.distance)));
        }
    }
    match farthest {
        Some(distance) => AutoScale {
            scale: distance * AUTO_SHAPE_MULTIPLIER + offset,
            missed: false,
        },
        None => AutoScale {
            scale: FALLBACK_SHAPE_SCALE,
            missed: true,
        },
    }
}

/// Endpoints of a `shape_{name}` anchor leaf for a joint. Middle anchors
/// span center-to-tail; tail anchors extend half a length past the tail.
pub fn anchor_endpoints(head: Vec3, tail: Vec3, reference: ReferencePoint) -> (Vec3, Vec3) {
    match reference {
        ReferencePoint::Middle | ReferencePoint::Head => ((head + tail) * 0.5, tail),
        ReferencePoint::Tail => (tail, tail + (tail - head) * 0.5),
    }
}
