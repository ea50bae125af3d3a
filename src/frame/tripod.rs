//! Forward kinematics of a three-legged mount.
//!
//! Three legs stand on a circle of radius `r` around the parent's z axis. Legs one and two are placed
//! symmetrically at `±a/2` from the +y axis, leg three sits on the -y axis:
//!
//! ```text
//! p1 = ( r sin(a/2), r cos(a/2), L1)
//! p2 = (-r sin(a/2), r cos(a/2), L2)
//! p3 = (0, -r, L3)
//! ```
//!
//! The platform resting on the leg tips has its normal along `(p1 - p3) x (p2 - p3)` and its center in the
//! circumcenter of the three tips.
//!
//! ```text
//! center = p3 + (|v1|² (v2 x C) + |v2|² (C x v1)) / (2 |C|²),  v1 = p1 - p3, v2 = p2 - p3, C = v1 x v2
//! ```
use crate::error::{OptResult, OptraceError};
use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Default cone angle between legs one and two in degrees.
pub const DEFAULT_ANGLE_DEG: f64 = 70.0;
/// Default radius of the leg circle in meters.
pub const DEFAULT_RADIUS: f64 = 42e-3;
/// Default length of each leg in meters.
pub const DEFAULT_LEG_LENGTH: f64 = 2e-2;

/// Returns the three leg tips for the given leg lengths, cone angle (radians) and radius (meters).
#[must_use]
pub fn leg_tips(legs: &[f64; 3], angle: f64, radius: f64) -> [Point3<f64>; 3] {
    let (sin, cos) = (0.5 * angle).sin_cos();
    [
        Point3::new(radius * sin, radius * cos, legs[0]),
        Point3::new(-radius * sin, radius * cos, legs[1]),
        Point3::new(0.0, -radius, legs[2]),
    ]
}

/// Solve the platform pose relative to the mount.
///
/// Returns the platform center and the rotation that maps the mount's z axis onto the platform normal.
///
/// # Errors
///
/// This function will return an error if the leg tips are (nearly) collinear or the configuration yields
/// non-finite values.
pub fn solve(
    legs: &[f64; 3],
    angle: f64,
    radius: f64,
) -> OptResult<(Point3<f64>, UnitQuaternion<f64>)> {
    let [p1, p2, p3] = leg_tips(legs, angle, radius);
    let v1 = p1 - p3;
    let v2 = p2 - p3;
    let c = v1.cross(&v2);
    let c_norm2 = c.norm_squared();
    let scale = v1.norm_squared().max(v2.norm_squared());
    if !c_norm2.is_finite() || c_norm2 <= f64::EPSILON * scale * scale {
        return Err(OptraceError::Degenerate(
            "tripod leg tips are collinear".into(),
        ));
    }
    let normal = c / c_norm2.sqrt();
    // circumcenter of the triangle p1, p2, p3
    let center = p3
        + (v1.norm_squared() * v2.cross(&c) + v2.norm_squared() * c.cross(&v1)) / (2.0 * c_norm2);
    let rotation = UnitQuaternion::rotation_between(&Vector3::z(), &normal).ok_or_else(|| {
        OptraceError::Degenerate("tripod platform normal is antiparallel to the mount axis".into())
    })?;
    Ok((center, rotation))
}
