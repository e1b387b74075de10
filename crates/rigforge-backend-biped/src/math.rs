//! Bone-space geometry helpers.
//!
//! Joints follow the armature convention: local +Y runs head to tail, roll
//! spins the X/Z basis around it. `bone_matrix` reproduces that basis so
//! shape-sizing rays, pole offsets, and twist-target offsets can work in a
//! joint's local frame.

use glam::{Mat3, Vec3};

/// Precision guard for the near-singular -Y orientation.
const SAFE_THRESHOLD: f32 = 6.1e-3;
const CRITICAL_THRESHOLD_SQUARED: f32 = 2.5e-4 * 2.5e-4;

/// Builds the orientation basis of a joint from its head-to-tail vector and
/// roll. Column 1 (Y) is the normalized bone vector.
pub fn bone_matrix(head: Vec3, tail: Vec3, roll: f32) -> Mat3 {
    vec_roll_to_mat3(tail - head, roll)
}

/// Orientation basis for a bone vector and roll.
pub fn vec_roll_to_mat3(vec: Vec3, roll: f32) -> Mat3 {
    let nor = vec.normalize_or_zero();
    if nor == Vec3::ZERO {
        return Mat3::IDENTITY;
    }

    let x = nor.x;
    let y = nor.y;
    let z = nor.z;

    let mut theta = 1.0 + y;
    let theta_alt = x * x + z * z;

    let b_matrix = if theta > SAFE_THRESHOLD || theta_alt > CRITICAL_THRESHOLD_SQUARED {
        if theta <= SAFE_THRESHOLD {
            // Close to -Y the direct form loses precision; recompute theta
            // from the X/Z distance via the sqrt series expansion.
            theta = theta_alt * 0.5 + theta_alt * theta_alt * 0.125;
        }
        Mat3::from_cols(
            Vec3::new(1.0 - x * x / theta, -x, -x * z / theta),
            Vec3::new(x, y, z),
            Vec3::new(-x * z / theta, -z, 1.0 - z * z / theta),
        )
    } else {
        // Exactly opposite the rest direction: flip X and Y.
        Mat3::from_cols(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.0), Vec3::Z)
    };

    Mat3::from_axis_angle(nor, roll) * b_matrix
}

/// Point at fraction `t` between `a` and `b`.
pub fn nth_point(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// Mirrors `p` through `pivot`.
pub fn mirror_point(p: Vec3, pivot: Vec3) -> Vec3 {
    pivot * 2.0 - p
}

/// Angle between `u` and `v` with the sign resolved against `normal`:
/// positive when `u x v` points along `normal` within one radian,
/// negative otherwise.
pub fn signed_angle(u: Vec3, v: Vec3, normal: Vec3) -> f32 {
    let angle = u.angle_between(v);
    let cross = u.cross(v);
    if cross.length_squared() > 0.0 && cross.angle_between(normal) < 1.0 {
        angle
    } else {
        -angle
    }
}
