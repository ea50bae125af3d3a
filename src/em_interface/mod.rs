#![warn(missing_docs)]
//! Electromagnetic behaviour of a boundary.
//!
//! An [`EmInterface`] decides what happens to a ray once it has hit a surface: it may be reflected, refracted,
//! redirected towards an image point or simply pass. All computations are done in the local frame of the
//! boundary. Interfaces are stateless with respect to individual rays.
//!
//! Whether a ray is transmitted at all is governed separately by a [`Transmission`].
mod dielectric;
mod paraxial;
mod phase_screen;
mod reflective;
mod transmission;
pub mod zernike;

pub use dielectric::{Dielectric, TotalInternalReflection};
pub use paraxial::Paraxial;
pub use phase_screen::PhaseScreen;
pub use reflective::Reflective;
pub use transmission::{Transmission, TransmissionMap};

use crate::error::{OptResult, OptraceError};
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;

/// Ray state at an intersection point handed to an [`EmInterface`] (local coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Incidence {
    /// intersection point
    pub point: Point3<f64>,
    /// unit surface normal (pointing towards +z)
    pub normal: Vector3<f64>,
    /// unit direction of the incoming ray
    pub direction: Vector3<f64>,
    /// refractive index of the medium the ray comes from
    pub refractive_index: f64,
}

/// Outcome of an [`EmInterface::interact`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    /// the ray continues in `direction` within a medium of the given index
    Redirected {
        /// new unit direction
        direction: Vector3<f64>,
        /// refractive index of the medium the ray continues in
        refractive_index: f64,
    },
    /// no refracted ray exists. `direction` holds the reflected ray or `None` if the ray is lost.
    TotalInternalReflection {
        /// reflected unit direction (if kept)
        direction: Option<Vector3<f64>>,
    },
    /// the ray ends here
    Absorbed,
}

/// Interface for all EM behaviours.
pub trait EmInterface: Send + Sync {
    /// Compute the fate of a single ray hitting the surface.
    fn interact(&self, incidence: &Incidence) -> Interaction;
    /// Return the interface type as string (for debugging purposes)
    fn name(&self) -> String;
    /// Return a downcasted mutable reference of a [`Dielectric`].
    ///
    /// # Errors
    /// This function will return an error if the interface is not a [`Dielectric`].
    fn as_dielectric_mut(&mut self) -> OptResult<&mut Dielectric> {
        Err(OptraceError::Other(format!("cannot cast {} to dielectric", self.name())))
    }
    /// Return a downcasted mutable reference of a [`Paraxial`] lens.
    ///
    /// # Errors
    /// This function will return an error if the interface is not a [`Paraxial`] lens.
    fn as_paraxial_mut(&mut self) -> OptResult<&mut Paraxial> {
        Err(OptraceError::Other(format!("cannot cast {} to paraxial lens", self.name())))
    }
    /// Return a downcasted mutable reference of a [`PhaseScreen`].
    ///
    /// # Errors
    /// This function will return an error if the interface is not a [`PhaseScreen`].
    fn as_phase_screen_mut(&mut self) -> OptResult<&mut PhaseScreen> {
        Err(OptraceError::Other(format!("cannot cast {} to phase screen", self.name())))
    }
}

impl Debug for dyn EmInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Mirror `direction` at the plane given by `normal`.
///
/// Reflecting twice at the same normal restores the original direction.
#[must_use]
pub fn reflect(direction: &Vector3<f64>, normal: &Vector3<f64>) -> Vector3<f64> {
    direction - 2.0 * direction.dot(normal) * normal
}

/// Refract `direction` at a surface with the given `normal` (vector form of Snell's law).
///
/// The normal must point against the incoming ray (`direction · normal < 0`) and `ratio` is `n_from / n_to`.
/// Returns `None` on total internal reflection.
#[must_use]
pub fn refract(direction: &Vector3<f64>, normal: &Vector3<f64>, ratio: f64) -> Option<Vector3<f64>> {
    let n_x_u = ratio * normal.cross(direction);
    let cos2 = 1.0 - n_x_u.norm_squared();
    if cos2 < 0.0 {
        return None;
    }
    Some((-normal.cross(&n_x_u) - normal * cos2.sqrt()).normalize())
}

/// Check that a refractive index is >= 1.0 and finite.
pub(crate) fn check_refractive_index(n: f64) -> OptResult<f64> {
    if n < 1.0 || !n.is_finite() {
        return Err(OptraceError::Configuration(
            "refractive index must be >=1.0 and finite".into(),
        ));
    }
    Ok(n)
}

/// Interface that leaves rays untouched (e.g. apertures, stops and detectors).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transparent;
impl EmInterface for Transparent {
    fn interact(&self, incidence: &Incidence) -> Interaction {
        Interaction::Redirected {
            direction: incidence.direction,
            refractive_index: incidence.refractive_index,
        }
    }
    fn name(&self) -> String {
        "transparent".into()
    }
}

#[cfg(test)]
pub(crate) fn incidence(direction: Vector3<f64>) -> Incidence {
    Incidence {
        point: Point3::origin(),
        normal: Vector3::z(),
        direction: direction.normalize(),
        refractive_index: 1.0,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    #[test]
    fn reflect_involutive() {
        let n = Vector3::new(0.1, -0.3, 1.0).normalize();
        for u in [
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::new(0.3, 0.2, -1.0).normalize(),
            Vector3::new(-0.7, 0.1, 0.2).normalize(),
        ] {
            let r = reflect(&u, &n);
            assert_abs_diff_eq!(r.norm(), 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(reflect(&r, &n), u, epsilon = 1e-12);
            assert_abs_diff_eq!(reflect(&u, &-n), r, epsilon = 1e-12);
        }
    }
    #[test]
    fn reflect_normal_incidence() {
        assert_eq!(reflect(&-Vector3::z(), &Vector3::z()), Vector3::z());
    }
    #[test]
    fn refract_straight() {
        let r = refract(&-Vector3::z(), &Vector3::z(), 1.0 / 1.5).unwrap();
        assert_abs_diff_eq!(r, -Vector3::z(), epsilon = 1e-15);
    }
    #[test]
    fn refract_snell() {
        let theta_in: f64 = 0.5;
        let u = Vector3::new(theta_in.sin(), 0.0, -theta_in.cos());
        let r = refract(&u, &Vector3::z(), 1.0 / 1.5).unwrap();
        let theta_out = r.x.asin();
        assert_abs_diff_eq!(theta_in.sin(), 1.5 * theta_out.sin(), epsilon = 1e-12);
        assert!(r.z < 0.0);
    }
    #[test]
    fn refract_round_trip() {
        let n = Vector3::new(0.2, 0.1, 1.0).normalize();
        let u = Vector3::new(0.3, -0.4, -1.0).normalize();
        let inside = refract(&u, &n, 1.0 / 1.7).unwrap();
        // leave through the same surface with the reversed ray
        let back = refract(&-inside, &-n, 1.7).unwrap();
        assert_abs_diff_eq!(back, -u, epsilon = 1e-12);
    }
    #[test]
    fn refract_tir() {
        let theta: f64 = 1.0;
        let u = Vector3::new(theta.sin(), 0.0, -theta.cos());
        assert_matches!(refract(&u, &Vector3::z(), 1.5), None);
    }
    #[test]
    fn refractive_index() {
        assert_eq!(check_refractive_index(1.5).unwrap(), 1.5);
        assert!(check_refractive_index(0.99).is_err());
        assert!(check_refractive_index(f64::NAN).is_err());
        assert!(check_refractive_index(f64::INFINITY).is_err());
    }
    #[test]
    fn transparent() {
        let i = incidence(Vector3::new(1.0, 0.0, -1.0));
        assert_matches!(Transparent.interact(&i), Interaction::Redirected { direction, refractive_index } => {
            assert_eq!(direction, i.direction);
            assert_eq!(refractive_index, 1.0);
        });
        assert_eq!(Transparent.name(), "transparent");
    }
}
