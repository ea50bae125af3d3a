//! Parabolic surface parametrized by its focal length.
//!
//! This is the `K = -1` member of the conic family written as `rho² - 4 f z = 0`, which has no singular leading
//! coefficient for any finite focal length.
use super::{annulus_area, check_length, sample_annulus, Intercept, SurfaceShape};
use crate::{
    error::{OptResult, OptraceError},
    meter,
    random::RandomState,
    square_meter,
};
use nalgebra::{Point2, Point3, Vector3};
use roots::{find_roots_quadratic, Roots};
use std::f64::consts::PI;
use uom::si::f64::{Area, Length};

/// Paraboloid with a circular aperture, an optional hole and an optional decenter.
///
/// A positive focal length opens the surface towards +z, i.e. its focus lies at `(0, 0, f)` relative to the
/// vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Parabolic {
    radius: f64,
    focal_length: f64,
    hole: f64,
    x0: f64,
    y0: f64,
}
impl Parabolic {
    /// Create a new [`Parabolic`] surface.
    ///
    /// # Errors
    ///
    /// This function will return an error if the aperture radius is not positive and finite or the focal length
    /// is 0.0 or not finite.
    pub fn new(radius: Length, focal_length: Length) -> OptResult<Self> {
        let surface = Self {
            radius: radius.value,
            focal_length: focal_length.value,
            hole: 0.0,
            x0: 0.0,
            y0: 0.0,
        };
        surface.validate()?;
        Ok(surface)
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
    /// Decenter the aperture on the parent paraboloid (off-axis parabola).
    ///
    /// # Errors
    ///
    /// This function will return an error if an offset component is not finite.
    pub fn with_offset(mut self, offset: Point2<Length>) -> OptResult<Self> {
        self.set_offset(offset)?;
        Ok(self)
    }
    /// Set the aperture radius.
    ///
    /// # Errors
    ///
    /// This function will return an error if the radius is not positive and finite or not larger than the hole.
    /// The surface is unchanged in this case.
    pub fn set_radius(&mut self, radius: Length) -> OptResult<()> {
        self.update(|s| s.radius = radius.value)
    }
    /// Set the focal length.
    ///
    /// # Errors
    ///
    /// This function will return an error if the focal length is 0.0 or not finite. The surface is unchanged in
    /// this case.
    pub fn set_focal_length(&mut self, focal_length: Length) -> OptResult<()> {
        self.update(|s| s.focal_length = focal_length.value)
    }
    /// Set the radius of the central hole (0.0 removes it).
    ///
    /// # Errors
    ///
    /// This function will return an error if the hole radius is negative, not finite or not smaller than the
    /// aperture radius. The surface is unchanged in this case.
    pub fn set_hole(&mut self, hole: Length) -> OptResult<()> {
        self.update(|s| s.hole = hole.value)
    }
    /// Set the decenter of the aperture on the parent paraboloid.
    ///
    /// # Errors
    ///
    /// This function will return an error if an offset component is not finite. The surface is unchanged in this
    /// case.
    pub fn set_offset(&mut self, offset: Point2<Length>) -> OptResult<()> {
        self.update(|s| {
            s.x0 = offset.x.value;
            s.y0 = offset.y.value;
        })
    }
    /// Returns the hole radius of this [`Parabolic`].
    #[must_use]
    pub fn hole(&self) -> Length {
        meter!(self.hole)
    }
    /// Returns the decenter of the aperture.
    #[must_use]
    pub fn offset(&self) -> Point2<Length> {
        meter!(self.x0, self.y0)
    }
    fn update(&mut self, change: impl FnOnce(&mut Self)) -> OptResult<()> {
        let mut candidate = self.clone();
        change(&mut candidate);
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }
    fn validate(&self) -> OptResult<()> {
        if !self.radius.is_normal() || self.radius.is_sign_negative() {
            return Err(OptraceError::Configuration(
                "aperture radius must be positive and finite".into(),
            ));
        }
        if !self.focal_length.is_normal() {
            return Err(OptraceError::Configuration(
                "focal length must be != 0.0 and finite".into(),
            ));
        }
        let hole = check_length(self.hole, "hole radius")?;
        if hole >= self.radius {
            return Err(OptraceError::Configuration(
                "hole radius must be smaller than the aperture radius".into(),
            ));
        }
        if !self.x0.is_finite() || !self.y0.is_finite() {
            return Err(OptraceError::Configuration(
                "offset must be finite".into(),
            ));
        }
        Ok(())
    }
    /// Returns the focal length of this [`Parabolic`].
    #[must_use]
    pub fn focal_length(&self) -> Length {
        meter!(self.focal_length)
    }
    /// Returns the aperture radius of this [`Parabolic`].
    #[must_use]
    pub fn radius(&self) -> Length {
        meter!(self.radius)
    }
    fn sag(&self, x: f64, y: f64) -> f64 {
        x.mul_add(x, y * y) / (4.0 * self.focal_length)
    }
    fn vertex_offset(&self) -> Vector3<f64> {
        Vector3::new(self.x0, self.y0, self.sag(self.x0, self.y0))
    }
    fn normal_at(&self, q: &Point3<f64>) -> Vector3<f64> {
        let sign = self.focal_length.signum();
        Vector3::new(-sign * q.x, -sign * q.y, 2.0 * self.focal_length.abs()).normalize()
    }
}
impl SurfaceShape for Parabolic {
    fn intercept(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Option<Intercept> {
        let offset = self.vertex_offset();
        let p = origin + offset;
        let d = direction;
        let f = self.focal_length;
        // (p_x + t d_x)² + (p_y + t d_y)² - 4 f (p_z + t d_z) = 0
        let a = d.x.mul_add(d.x, d.y * d.y);
        let b = 2. * (2. * f).mul_add(-d.z, p.x.mul_add(d.x, p.y * d.y));
        let c = (4. * f).mul_add(-p.z, p.x.mul_add(p.x, p.y * p.y));
        let t = if a <= f64::EPSILON * b.abs().max(f64::EPSILON) {
            // axis-parallel ray: only one intersection
            if b.abs() <= f64::EPSILON {
                return None;
            }
            Some(-c / b).filter(|t| *t >= 0.0)
        } else {
            match find_roots_quadratic(a, b, c) {
                Roots::No(_) => None,
                Roots::One(t) => Some(t[0]).filter(|t| *t >= 0.0),
                Roots::Two(t) => t.into_iter().filter(|t| *t >= 0.0).min_by(f64::total_cmp),
                _ => None,
            }
        }?;
        let q = p + t * d;
        let point = q - offset;
        let rho2 = point.x.mul_add(point.x, point.y * point.y);
        Some(Intercept {
            point,
            normal: self.normal_at(&q),
            distance: t,
            inside: rho2 < self.radius * self.radius && rho2 >= self.hole * self.hole,
        })
    }
    fn area(&self) -> Area {
        let f = self.focal_length;
        let area = if self.x0 == 0.0 && self.y0 == 0.0 {
            let cap = |rho: f64| {
                (8. * PI * f * f / 3.) * ((rho * rho / (4. * f * f) + 1.).powf(1.5) - 1.)
            };
            cap(self.radius) - cap(self.hole)
        } else {
            annulus_area(self.radius, self.hole, (self.x0, self.y0), |rho| {
                rho / (2. * f)
            })
        };
        square_meter!(area)
    }
    fn generate_points(
        &self,
        nr_of_points: usize,
        rng: &mut RandomState,
    ) -> Vec<(Point3<f64>, Vector3<f64>)> {
        let offset = self.vertex_offset();
        (0..nr_of_points)
            .map(|_| {
                let (r, phi) = sample_annulus(self.radius, self.hole, rng);
                let (x, y) = (r * phi.cos() + self.x0, r * phi.sin() + self.y0);
                let q = Point3::new(x, y, self.sag(x, y));
                (q - offset, self.normal_at(&q))
            })
            .collect()
    }
    fn name(&self) -> String {
        "parabolic".into()
    }
    fn as_parabolic_mut(&mut self) -> OptResult<&mut Self> {
        Ok(self)
    }
}
