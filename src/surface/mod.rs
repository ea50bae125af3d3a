#![warn(missing_docs)]
//! Geometric surface shapes.
//!
//! A [`SurfaceShape`] is expressed in the local coordinates of the frame owning it. The local z axis is the optical
//! axis and all surfaces have their vertex (or their aperture center) at the local origin. A shape answers where
//! a ray meets it ([`SurfaceShape::intercept`]), how large it is ([`SurfaceShape::area`]) and can scatter points
//! over itself ([`SurfaceShape::generate_points`]).
//!
//! Failing to hit a surface is not an error. The intercept returns `None` if there is no geometric solution in
//! front of the ray and an [`Intercept`] with `inside == false` if the ray meets the surface outside its aperture.
mod array;
mod circular;
mod conic;
mod parabolic;
mod rectangular;

pub use array::SurfaceArray;
pub use circular::CircularFlat;
pub use conic::Conic;
pub use parabolic::Parabolic;
pub use rectangular::RectangularFlat;

use crate::{
    error::{OptResult, OptraceError},
    random::RandomState,
    utils::usize_to_f64,
};
use kahan::KahanSummator;
use nalgebra::{Point3, Vector3};
use std::{f64::consts::PI, fmt::Debug};
use uom::si::f64::Area;

/// Result of a successful ray / surface intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intercept {
    /// intersection point in local coordinates
    pub point: Point3<f64>,
    /// unit surface normal at `point` with a non-negative local z component
    pub normal: Vector3<f64>,
    /// distance travelled along the (unit) ray direction
    pub distance: f64,
    /// `true` if the point lies within the clear aperture
    pub inside: bool,
}

/// Common interface of all surface shapes.
pub trait SurfaceShape: Send + Sync {
    /// Intersect a ray given by `origin` and unit `direction` (local coordinates) with this surface.
    ///
    /// Returns `None` if the ray is parallel to the surface, misses it completely or the surface lies behind the
    /// ray.
    fn intercept(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Option<Intercept>;
    /// Returns the true (not projected) area of the clear aperture.
    fn area(&self) -> Area;
    /// Draw `nr_of_points` points distributed uniformly over the (projected) aperture together with their normals.
    fn generate_points(
        &self,
        nr_of_points: usize,
        rng: &mut RandomState,
    ) -> Vec<(Point3<f64>, Vector3<f64>)>;
    /// Return the shape type as string (for debugging purposes)
    fn name(&self) -> String;
    /// Return a downcasted mutable reference of a [`Conic`].
    ///
    /// # Errors
    /// This function will return an error if the shape is not a [`Conic`].
    fn as_conic_mut(&mut self) -> OptResult<&mut Conic> {
        Err(OptraceError::Other(format!("cannot cast {} to conic", self.name())))
    }
    /// Return a downcasted mutable reference of a [`Parabolic`].
    ///
    /// # Errors
    /// This function will return an error if the shape is not a [`Parabolic`].
    fn as_parabolic_mut(&mut self) -> OptResult<&mut Parabolic> {
        Err(OptraceError::Other(format!("cannot cast {} to paraboloid", self.name())))
    }
    /// Return a downcasted mutable reference of a [`CircularFlat`].
    ///
    /// # Errors
    /// This function will return an error if the shape is not a [`CircularFlat`].
    fn as_circular_mut(&mut self) -> OptResult<&mut CircularFlat> {
        Err(OptraceError::Other(format!("cannot cast {} to circular flat", self.name())))
    }
    /// Return a downcasted mutable reference of a [`RectangularFlat`].
    ///
    /// # Errors
    /// This function will return an error if the shape is not a [`RectangularFlat`].
    fn as_rectangular_mut(&mut self) -> OptResult<&mut RectangularFlat> {
        Err(OptraceError::Other(format!(
            "cannot cast {} to rectangular flat",
            self.name()
        )))
    }
}

impl Debug for dyn SurfaceShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Intersect a ray with the local z = 0 plane.
///
/// Returns the hit point and the ray parameter or `None` if the ray is parallel to the plane or the plane lies
/// behind the ray.
#[must_use]
pub fn plane_intercept(origin: &Point3<f64>, direction: &Vector3<f64>) -> Option<(Point3<f64>, f64)> {
    if direction.z.abs() < f64::EPSILON {
        return None;
    }
    let t = -origin.z / direction.z;
    if t.is_sign_negative() && t != 0.0 {
        return None;
    }
    let t = t.max(0.0);
    Some((origin + t * direction, t))
}

/// Draw a point uniformly distributed over the annulus `hole <= r < radius`. Returns `(r, phi)`.
pub(crate) fn sample_annulus(radius: f64, hole: f64, rng: &mut RandomState) -> (f64, f64) {
    let h2 = hole * hole;
    let r = rng.randu().mul_add(radius.mul_add(radius, -h2), h2).sqrt();
    let phi = 2.0 * PI * rng.randu();
    (r, phi)
}

const RADIAL_STEPS: usize = 128;
const AZIMUTHAL_STEPS: usize = 128;

/// Area of a rotationally symmetric surface `z(rho)` over the annulus `hole <= r < radius` centered at
/// `offset`, given the radial slope `dz/drho`.
///
/// Simpson integration in `r`, midpoint rule in the azimuth (exact for periodic integrands).
pub(crate) fn annulus_area(
    radius: f64,
    hole: f64,
    offset: (f64, f64),
    slope: impl Fn(f64) -> f64,
) -> f64 {
    let element = |x: f64, y: f64| {
        let s = slope((x + offset.0).hypot(y + offset.1));
        s.mul_add(s, 1.0).sqrt()
    };
    let centered = offset.0 == 0.0 && offset.1 == 0.0;
    let dr = (radius - hole) / usize_to_f64(RADIAL_STEPS);
    let dphi = 2.0 * PI / usize_to_f64(AZIMUTHAL_STEPS);
    let ring = |r: f64| -> f64 {
        if centered {
            2.0 * PI * r * element(r, 0.0)
        } else {
            let terms: Vec<f64> = (0..AZIMUTHAL_STEPS)
                .map(|k| {
                    let phi = (usize_to_f64(k) + 0.5) * dphi;
                    r * element(r * phi.cos(), r * phi.sin()) * dphi
                })
                .collect();
            terms.iter().kahan_sum().sum()
        }
    };
    let terms: Vec<f64> = (0..=RADIAL_STEPS)
        .map(|i| {
            let weight = if i == 0 || i == RADIAL_STEPS {
                1.0
            } else if i % 2 == 1 {
                4.0
            } else {
                2.0
            };
            weight * ring(usize_to_f64(i).mul_add(dr, hole))
        })
        .collect();
    let sum: f64 = terms.iter().kahan_sum().sum();
    sum * dr / 3.0
}

/// Check that a length is finite and non-negative.
pub(crate) fn check_length(value: f64, what: &str) -> OptResult<f64> {
    if !value.is_finite() || value.is_sign_negative() {
        return Err(OptraceError::Configuration(format!(
            "{what} must be positive and finite"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    #[test]
    fn plane() {
        let (p, t) = plane_intercept(&Point3::new(1.0, 2.0, -3.0), &Vector3::z()).unwrap();
        assert_eq!(p, Point3::new(1.0, 2.0, 0.0));
        assert_eq!(t, 3.0);
        assert!(plane_intercept(&Point3::new(0.0, 0.0, 1.0), &Vector3::z()).is_none());
        assert!(plane_intercept(&Point3::new(0.0, 0.0, 1.0), &Vector3::x()).is_none());
        let (p, t) = plane_intercept(&Point3::origin(), &Vector3::z()).unwrap();
        assert_eq!(p, Point3::origin());
        assert_eq!(t, 0.0);
    }
    #[test]
    fn annulus() {
        let mut rng = RandomState::default();
        for _ in 0..1000 {
            let (r, phi) = sample_annulus(2.0, 1.0, &mut rng);
            assert!((1.0..2.0).contains(&r));
            assert!((0.0..2.0 * PI).contains(&phi));
        }
    }
    #[test]
    fn flat_area() {
        assert_relative_eq!(annulus_area(1.0, 0.0, (0.0, 0.0), |_| 0.0), PI, max_relative = 1e-12);
        assert_relative_eq!(
            annulus_area(1.0, 0.5, (0.3, 0.0), |_| 0.0),
            0.75 * PI,
            max_relative = 1e-9
        );
    }
    #[test]
    fn cone_area() {
        // cone with slope 1: lateral area sqrt(2) * pi * r^2
        assert_abs_diff_eq!(
            annulus_area(1.0, 0.0, (0.0, 0.0), |_| 1.0),
            2.0_f64.sqrt() * PI,
            epsilon = 1e-9
        );
    }
    #[test]
    fn lengths() {
        assert!(check_length(-1.0, "radius").is_err());
        assert!(check_length(f64::NAN, "radius").is_err());
        assert!(check_length(f64::INFINITY, "radius").is_err());
        assert_eq!(check_length(0.0, "radius").unwrap(), 0.0);
    }
}
