//! Rotationally symmetric conic surfaces (spheres, ellipsoids, paraboloids and hyperboloids).
//!
//! The surface is given by its sag
//!
//! ```text
//! z(rho) = c rho² / (1 + sqrt(1 - (1 + K) c² rho²))
//! ```
//!
//! with the curvature `c = 1 / R`. Substituting the ray `p + t d` into the implicit form
//! `c rho² - 2 z + c (1 + K) z² = 0` yields a quadratic in `t` that stays regular for `c -> 0` (flat) and for
//! `K = -1` (paraboloid).
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

/// Off-axis aware conic surface with a circular aperture and an optional central hole.
///
/// The local origin sits on the surface at the aperture center. For a decentered surface (offset `(x0, y0)`)
/// the vertex of the parent conic lies at `(-x0, -y0, -z(x0, y0))`.
#[derive(Debug, Clone, PartialEq)]
pub struct Conic {
    radius: f64,
    curvature_radius: f64,
    conic: f64,
    hole: f64,
    x0: f64,
    y0: f64,
    convex: bool,
}
impl Conic {
    /// Creates a new [`Conic`].
    ///
    /// A positive curvature radius opens the surface towards +z (concave when seen from +z). An infinite radius
    /// describes a flat surface.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the aperture radius is not positive and finite.
    ///   - the curvature radius is zero or NaN.
    ///   - the conic constant is not finite.
    ///   - the surface is not defined over the whole aperture (e.g. a hemisphere smaller than the aperture).
    pub fn new(radius: Length, curvature_radius: Length, conic: f64) -> OptResult<Self> {
        let surface = Self {
            radius: radius.value,
            curvature_radius: curvature_radius.value,
            conic,
            hole: 0.0,
            x0: 0.0,
            y0: 0.0,
            convex: false,
        };
        surface.validate()?;
        Ok(surface)
    }
    /// Creates a spherical surface (conic constant 0).
    ///
    /// # Errors
    ///
    /// Same as [`Conic::new`].
    pub fn spherical(radius: Length, curvature_radius: Length) -> OptResult<Self> {
        Self::new(radius, curvature_radius, 0.0)
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
    /// Decenter the aperture on the parent conic.
    ///
    /// # Errors
    ///
    /// This function will return an error if an offset component is not finite or the shifted aperture leaves the
    /// domain of the surface.
    pub fn with_offset(mut self, offset: Point2<Length>) -> OptResult<Self> {
        self.set_offset(offset)?;
        Ok(self)
    }
    /// Mirror the sag so that the surface bulges towards +z.
    #[must_use]
    pub const fn with_convex(mut self, convex: bool) -> Self {
        self.convex = convex;
        self
    }
    /// Returns the aperture radius of this [`Conic`].
    #[must_use]
    pub fn radius(&self) -> Length {
        meter!(self.radius)
    }
    /// Returns the curvature radius of this [`Conic`].
    #[must_use]
    pub fn curvature_radius(&self) -> Length {
        meter!(self.curvature_radius)
    }
    /// Returns the conic constant of this [`Conic`].
    #[must_use]
    pub const fn conic_constant(&self) -> f64 {
        self.conic
    }
    /// Returns the hole radius of this [`Conic`].
    #[must_use]
    pub fn hole(&self) -> Length {
        meter!(self.hole)
    }
    /// Returns `true` if this [`Conic`] is convex.
    #[must_use]
    pub const fn is_convex(&self) -> bool {
        self.convex
    }
    /// Set the aperture radius.
    ///
    /// # Errors
    ///
    /// This function will return an error if the radius is not positive and finite, not larger than the hole or
    /// leaves the domain of the surface. The surface is unchanged in this case.
    pub fn set_radius(&mut self, radius: Length) -> OptResult<()> {
        self.update(|s| s.radius = radius.value)
    }
    /// Set the curvature radius.
    ///
    /// # Errors
    ///
    /// This function will return an error if the curvature radius is zero or NaN or the aperture leaves the
    /// domain of the surface. The surface is unchanged in this case.
    pub fn set_curvature_radius(&mut self, curvature_radius: Length) -> OptResult<()> {
        self.update(|s| s.curvature_radius = curvature_radius.value)
    }
    /// Set the conic constant.
    ///
    /// # Errors
    ///
    /// This function will return an error if the constant is not finite or the aperture leaves the domain of the
    /// surface. The surface is unchanged in this case.
    pub fn set_conic_constant(&mut self, conic: f64) -> OptResult<()> {
        self.update(|s| s.conic = conic)
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
    /// Set the decenter of the aperture on the parent conic.
    ///
    /// # Errors
    ///
    /// This function will return an error if an offset component is not finite or the shifted aperture leaves the
    /// domain of the surface. The surface is unchanged in this case.
    pub fn set_offset(&mut self, offset: Point2<Length>) -> OptResult<()> {
        self.update(|s| {
            s.x0 = offset.x.value;
            s.y0 = offset.y.value;
        })
    }
    /// Returns the decenter of the aperture.
    #[must_use]
    pub fn offset(&self) -> Point2<Length> {
        meter!(self.x0, self.y0)
    }
    /// Set whether the sag is mirrored towards +z.
    pub fn set_convex(&mut self, convex: bool) {
        self.convex = convex;
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
        if self.curvature_radius.is_nan() || self.curvature_radius == 0.0 {
            return Err(OptraceError::Configuration(
                "curvature radius must be != 0.0".into(),
            ));
        }
        if !self.conic.is_finite() {
            return Err(OptraceError::Configuration(
                "conic constant must be finite".into(),
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
        self.check_domain()
    }
    /// Effective signed curvature.
    fn curvature(&self) -> f64 {
        let c = self.curvature_radius.recip();
        if self.convex {
            -c
        } else {
            c
        }
    }
    fn check_domain(&self) -> OptResult<()> {
        let rho = self.x0.hypot(self.y0) + self.radius;
        let c = self.curvature_radius.recip();
        if (1.0 + self.conic) * c * c * rho * rho >= 1.0 {
            return Err(OptraceError::Configuration(format!(
                "conic surface (R = {}, K = {}) is not defined up to rho = {rho}",
                self.curvature_radius, self.conic
            )));
        }
        Ok(())
    }
    /// Sag of the parent conic at distance `rho` from its vertex.
    #[must_use]
    pub fn sag(&self, rho: f64) -> f64 {
        let c = self.curvature();
        let rho2 = rho * rho;
        c * rho2 / (1.0 + ((1.0 + self.conic) * c * c).mul_add(-rho2, 1.0).sqrt())
    }
    fn slope(&self, rho: f64) -> f64 {
        let c = self.curvature();
        c * rho / ((1.0 + self.conic) * c * c).mul_add(-rho * rho, 1.0).sqrt()
    }
    fn vertex_offset(&self) -> Vector3<f64> {
        Vector3::new(self.x0, self.y0, self.sag(self.x0.hypot(self.y0)))
    }
    fn normal_at(&self, q: &Point3<f64>) -> Vector3<f64> {
        let c = self.curvature();
        Vector3::new(-c * q.x, -c * q.y, (c * (1.0 + self.conic)).mul_add(-q.z, 1.0)).normalize()
    }
}

/// Ray parameter of the first intersection with the conic `c rho² - 2 z + c k1 z² = 0` in vertex coordinates.
fn solve(c: f64, k1: f64, p: &Point3<f64>, d: &Vector3<f64>) -> Option<f64> {
    let a = c * (d.x.mul_add(d.x, d.y * d.y) + k1 * d.z * d.z);
    let b = 2.0 * (c * (p.x.mul_add(d.x, p.y * d.y) + k1 * p.z * d.z) - d.z);
    let cc = c * (p.x.mul_add(p.x, p.y * p.y) + k1 * p.z * p.z) - 2.0 * p.z;
    // points on the vertex branch have a normal with positive z component
    let on_branch = |t: f64| (c * k1).mul_add(-t.mul_add(d.z, p.z), 1.0) > 0.0;
    if a.abs() <= f64::EPSILON || (4.0 * a * cc).abs() <= f64::EPSILON * b * b {
        if b.abs() <= f64::EPSILON {
            return None;
        }
        let t = -cc / b;
        return (t >= 0.0 && on_branch(t)).then_some(t);
    }
    let candidates = match find_roots_quadratic(a, b, cc) {
        Roots::No(_) => return None,
        Roots::One(t) => vec![t[0]],
        Roots::Two(t) => vec![t[0], t[1]],
        _ => return None,
    };
    candidates
        .into_iter()
        .filter(|t| *t >= 0.0 && on_branch(*t))
        .min_by(f64::total_cmp)
}

impl SurfaceShape for Conic {
    fn intercept(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Option<Intercept> {
        let offset = self.vertex_offset();
        let p = origin + offset;
        let t = solve(self.curvature(), 1.0 + self.conic, &p, direction)?;
        let q = p + t * direction;
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
        let centered = self.x0 == 0.0 && self.y0 == 0.0;
        let c = self.curvature();
        let area = if c == 0.0 {
            PI * self.hole.mul_add(-self.hole, self.radius * self.radius)
        } else if centered && self.conic.abs() < f64::EPSILON {
            // spherical cap: 2 pi R h
            2.0 * PI * self.curvature_radius.abs() * (self.sag(self.radius) - self.sag(self.hole)).abs()
        } else if centered && (self.conic + 1.0).abs() < f64::EPSILON {
            let cap = |rho: f64| (2.0 * PI / (3.0 * c * c)) * ((c * rho).mul_add(c * rho, 1.0).powf(1.5) - 1.0);
            cap(self.radius) - cap(self.hole)
        } else {
            annulus_area(self.radius, self.hole, (self.x0, self.y0), |rho| self.slope(rho))
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
                let q = Point3::new(x, y, self.sag(x.hypot(y)));
                (q - offset, self.normal_at(&q))
            })
            .collect()
    }
    fn name(&self) -> String {
        if self.conic == 0.0 {
            "spherical".into()
        } else {
            format!("conic (K = {})", self.conic)
        }
    }
    fn as_conic_mut(&mut self) -> OptResult<&mut Self> {
        Ok(self)
    }
}
