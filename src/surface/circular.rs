//! Flat circular (or elliptical) aperture with an optional central hole.
use super::{check_length, plane_intercept, sample_annulus, Intercept, SurfaceShape};
use crate::{
    error::{OptResult, OptraceError},
    meter,
    random::RandomState,
    square_meter,
};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;
use uom::si::f64::{Area, Length};

/// Flat circular aperture in the local z = 0 plane.
///
/// A non-zero eccentricity turns the circle into an ellipse `x²/a2 + y²/b2 < R²` with `a2 · b2 = 1`, so that the
/// area does not depend on the eccentricity. A positive eccentricity elongates the aperture along x, a negative
/// one along y.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularFlat {
    radius: f64,
    hole: f64,
    eccentricity: f64,
    a2: f64,
    b2: f64,
}
impl CircularFlat {
    /// Creates a new [`CircularFlat`] of the given radius.
    ///
    /// # Errors
    ///
    /// This function will return an error if the radius is not positive and finite.
    pub fn new(radius: Length) -> OptResult<Self> {
        if !radius.is_normal() || radius.is_sign_negative() {
            return Err(OptraceError::Configuration(
                "radius must be positive and finite".into(),
            ));
        }
        Ok(Self {
            radius: radius.value,
            hole: 0.0,
            eccentricity: 0.0,
            a2: 1.0,
            b2: 1.0,
        })
    }
    /// Cut a central hole of the given radius.
    ///
    /// # Errors
    ///
    /// This function will return an error if the hole radius is negative, not finite or not smaller than the
    /// aperture radius.
    pub fn with_hole(mut self, hole: Length) -> OptResult<Self> {
        self.set_hole(hole)?;
        Ok(self)
    }
    /// Set the (signed) eccentricity of the aperture.
    ///
    /// # Errors
    ///
    /// This function will return an error if the eccentricity is outside the open interval (-1, 1).
    pub fn with_eccentricity(mut self, eccentricity: f64) -> OptResult<Self> {
        self.set_eccentricity(eccentricity)?;
        Ok(self)
    }
    /// Set the aperture radius.
    ///
    /// # Errors
    ///
    /// This function will return an error if the radius is not positive and finite or not larger than the hole.
    pub fn set_radius(&mut self, radius: Length) -> OptResult<()> {
        if !radius.is_normal() || radius.is_sign_negative() {
            return Err(OptraceError::Configuration(
                "radius must be positive and finite".into(),
            ));
        }
        if radius.value <= self.hole {
            return Err(OptraceError::Configuration(
                "radius must be larger than the hole radius".into(),
            ));
        }
        self.radius = radius.value;
        Ok(())
    }
    /// Set the radius of the central hole (0.0 removes it).
    ///
    /// # Errors
    ///
    /// This function will return an error if the hole radius is negative, not finite or not smaller than the
    /// aperture radius.
    pub fn set_hole(&mut self, hole: Length) -> OptResult<()> {
        let hole = check_length(hole.value, "hole radius")?;
        if hole >= self.radius {
            return Err(OptraceError::Configuration(
                "hole radius must be smaller than the aperture radius".into(),
            ));
        }
        self.hole = hole;
        Ok(())
    }
    /// Set the (signed) eccentricity of the aperture.
    ///
    /// # Errors
    ///
    /// This function will return an error if the eccentricity is outside the open interval (-1, 1).
    pub fn set_eccentricity(&mut self, eccentricity: f64) -> OptResult<()> {
        if !(eccentricity > -1.0 && eccentricity < 1.0) {
            return Err(OptraceError::Configuration(
                "eccentricity must be within (-1, 1)".into(),
            ));
        }
        let root = eccentricity.mul_add(-eccentricity, 1.0).sqrt();
        if eccentricity > 0.0 {
            self.b2 = root;
            self.a2 = 1.0 / root;
        } else {
            self.a2 = root;
            self.b2 = 1.0 / root;
        }
        self.eccentricity = eccentricity;
        Ok(())
    }
    /// Radius and eccentricity of the ellipse with the given full width (along x) and height (along y).
    ///
    /// # Errors
    ///
    /// This function will return an error if width or height are not positive and finite.
    pub fn radius_eccentricity(width: Length, height: Length) -> OptResult<(Length, f64)> {
        if !width.is_normal()
            || !height.is_normal()
            || width.is_sign_negative()
            || height.is_sign_negative()
        {
            return Err(OptraceError::Configuration(
                "width and height must be positive and finite".into(),
            ));
        }
        let (w, h) = (width.value, height.value);
        let radius = 0.5 * (w * h).sqrt();
        let eccentricity = if w >= h {
            (1.0 - (h / w).powi(2)).sqrt()
        } else {
            -(1.0 - (w / h).powi(2)).sqrt()
        };
        Ok((meter!(radius), eccentricity))
    }
    /// Returns the radius of this [`CircularFlat`].
    #[must_use]
    pub fn radius(&self) -> Length {
        meter!(self.radius)
    }
    /// Returns the hole radius of this [`CircularFlat`].
    #[must_use]
    pub fn hole(&self) -> Length {
        meter!(self.hole)
    }
    /// Returns the eccentricity of this [`CircularFlat`].
    #[must_use]
    pub const fn eccentricity(&self) -> f64 {
        self.eccentricity
    }
    fn normalized_radius2(&self, x: f64, y: f64) -> f64 {
        x * x / self.a2 + y * y / self.b2
    }
}
impl SurfaceShape for CircularFlat {
    fn intercept(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Option<Intercept> {
        let (point, distance) = plane_intercept(origin, direction)?;
        let rho2 = self.normalized_radius2(point.x, point.y);
        Some(Intercept {
            point,
            normal: Vector3::z(),
            distance,
            inside: rho2 < self.radius * self.radius && rho2 >= self.hole * self.hole,
        })
    }
    fn area(&self) -> Area {
        square_meter!(PI * self.hole.mul_add(-self.hole, self.radius * self.radius))
    }
    fn generate_points(
        &self,
        nr_of_points: usize,
        rng: &mut RandomState,
    ) -> Vec<(Point3<f64>, Vector3<f64>)> {
        let (a, b) = (self.a2.sqrt(), self.b2.sqrt());
        (0..nr_of_points)
            .map(|_| {
                let (r, phi) = sample_annulus(self.radius, self.hole, rng);
                (
                    Point3::new(r * a * phi.cos(), r * b * phi.sin(), 0.0),
                    Vector3::z(),
                )
            })
            .collect()
    }
    fn name(&self) -> String {
        "circular flat".into()
    }
    fn as_circular_mut(&mut self) -> OptResult<&mut Self> {
        Ok(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::millimeter;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use assert_matches::assert_matches;
    use uom::si::{area::square_meter, length::meter};
    #[test]
    fn new() {
        assert!(CircularFlat::new(meter!(0.0)).is_err());
        assert!(CircularFlat::new(meter!(-1.0)).is_err());
        assert!(CircularFlat::new(meter!(f64::NAN)).is_err());
        assert!(CircularFlat::new(meter!(f64::INFINITY)).is_err());
        let c = CircularFlat::new(millimeter!(10.0)).unwrap();
        assert_relative_eq!(c.radius().get::<meter>(), 0.01);
        assert_eq!(c.hole().value, 0.0);
        assert_eq!(c.eccentricity(), 0.0);
        assert_eq!(c.name(), "circular flat");
    }
    #[test]
    fn setters() {
        let mut c = CircularFlat::new(meter!(1.0)).unwrap();
        c.set_hole(meter!(0.5)).unwrap();
        assert_eq!(c.hole().value, 0.5);
        assert!(c.set_radius(meter!(0.4)).is_err());
        assert_eq!(c.radius().value, 1.0);
        c.set_radius(meter!(2.0)).unwrap();
        assert_eq!(c.radius().value, 2.0);
        assert!(c.set_hole(meter!(2.0)).is_err());
        c.set_hole(meter!(0.0)).unwrap();
        assert!(c.set_eccentricity(1.0).is_err());
        c.set_eccentricity(0.6).unwrap();
        assert_eq!(c.eccentricity(), 0.6);
        assert_matches!(c.set_radius(meter!(f64::NAN)), Err(OptraceError::Configuration(_)));
    }
    #[test]
    fn with_hole() {
        let c = CircularFlat::new(meter!(1.0)).unwrap();
        assert!(c.clone().with_hole(meter!(1.0)).is_err());
        assert!(c.clone().with_hole(meter!(-0.1)).is_err());
        let c = c.with_hole(meter!(0.5)).unwrap();
        assert_eq!(c.hole().value, 0.5);
    }
    #[test]
    fn with_eccentricity() {
        let c = CircularFlat::new(meter!(1.0)).unwrap();
        assert_matches!(
            c.clone().with_eccentricity(1.0),
            Err(OptraceError::Configuration(_))
        );
        assert!(c.clone().with_eccentricity(-1.0).is_err());
        assert!(c.clone().with_eccentricity(f64::NAN).is_err());
        let e = c.with_eccentricity(0.8).unwrap();
        assert_relative_eq!(e.a2 * e.b2, 1.0);
        assert!(e.a2 > e.b2);
    }
    #[test]
    fn containment() {
        let radius = 0.01;
        let c = CircularFlat::new(meter!(radius)).unwrap();
        let eps = 1e-6;
        for phi in [0.0, 0.7, 2.0, 4.5] {
            let (s, co) = f64::sin_cos(phi);
            let origin = Point3::new(radius * (1.0 - eps) * co, radius * (1.0 - eps) * s, 1.0);
            let hit = c.intercept(&origin, &-Vector3::z()).unwrap();
            assert!(hit.inside);
            assert_abs_diff_eq!(hit.distance, 1.0);
            assert_eq!(hit.normal, Vector3::z());
            let origin = Point3::new(radius * (1.0 + eps) * co, radius * (1.0 + eps) * s, 1.0);
            assert!(!c.intercept(&origin, &-Vector3::z()).unwrap().inside);
        }
    }
    #[test]
    fn hole() {
        let c = CircularFlat::new(meter!(1.0))
            .unwrap()
            .with_hole(meter!(0.2))
            .unwrap();
        assert!(!c.intercept(&Point3::new(0.1, 0.0, -1.0), &Vector3::z()).unwrap().inside);
        assert!(c.intercept(&Point3::new(0.3, 0.0, -1.0), &Vector3::z()).unwrap().inside);
    }
    #[test]
    fn no_intercept() {
        let c = CircularFlat::new(meter!(1.0)).unwrap();
        assert!(c.intercept(&Point3::new(0.0, 0.0, 1.0), &Vector3::x()).is_none());
        assert!(c.intercept(&Point3::new(0.0, 0.0, 1.0), &Vector3::z()).is_none());
    }
    #[test]
    fn ellipse() {
        let (radius, e) = CircularFlat::radius_eccentricity(meter!(4.0), meter!(1.0)).unwrap();
        assert_relative_eq!(radius.value, 1.0);
        let c = CircularFlat::new(radius).unwrap().with_eccentricity(e).unwrap();
        // semi axes 2 and 0.5
        assert!(c.intercept(&Point3::new(1.9, 0.0, -1.0), &Vector3::z()).unwrap().inside);
        assert!(!c.intercept(&Point3::new(2.1, 0.0, -1.0), &Vector3::z()).unwrap().inside);
        assert!(c.intercept(&Point3::new(0.0, 0.45, -1.0), &Vector3::z()).unwrap().inside);
        assert!(!c.intercept(&Point3::new(0.0, 0.55, -1.0), &Vector3::z()).unwrap().inside);
        let (_, e) = CircularFlat::radius_eccentricity(meter!(1.0), meter!(4.0)).unwrap();
        assert!(e < 0.0);
        assert!(CircularFlat::radius_eccentricity(meter!(0.0), meter!(4.0)).is_err());
    }
    #[test]
    fn area() {
        let c = CircularFlat::new(meter!(2.0))
            .unwrap()
            .with_hole(meter!(1.0))
            .unwrap();
        assert_relative_eq!(c.area().get::<square_meter>(), 3.0 * PI);
        let e = c.with_eccentricity(0.5).unwrap();
        assert_relative_eq!(e.area().get::<square_meter>(), 3.0 * PI);
    }
    #[test]
    fn generate_points() {
        let c = CircularFlat::new(meter!(1.0))
            .unwrap()
            .with_hole(meter!(0.5))
            .unwrap();
        let mut rng = RandomState::default();
        let points = c.generate_points(500, &mut rng);
        assert_eq!(points.len(), 500);
        for (p, n) in points {
            let rho = p.coords.xy().norm();
            assert!((0.5..1.0).contains(&rho));
            assert_eq!(p.z, 0.0);
            assert_eq!(n, Vector3::z());
        }
    }
}
