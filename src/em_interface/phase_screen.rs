//! Thin aberrating plate described by a Zernike expansion.
use super::{
    reflect, refract,
    zernike::{Zernike, ZernikeSum},
    check_refractive_index, EmInterface, Incidence, Interaction,
};
use crate::error::{OptResult, OptraceError};
use nalgebra::Vector3;
use uom::si::f64::Length;

/// Phase screen over a disc of radius `R`.
///
/// Inside the disc the ray is refracted at a virtual surface whose slope is given by the gradient of the
/// Zernike sum, evaluated in coordinates normalized to `R`. Rays outside of the disc pass unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseScreen {
    radius: f64,
    zernike: ZernikeSum,
    n_in: f64,
    n_out: f64,
}
impl PhaseScreen {
    /// Creates a new [`PhaseScreen`] from coefficients in ANSI order.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the radius is not positive and finite.
    ///   - a coefficient is not finite.
    ///   - one of the refractive indices is < 1.0 or not finite.
    pub fn new(radius: Length, coefficients: &[f64], n_in: f64, n_out: f64) -> OptResult<Self> {
        let mut screen = Self {
            radius: 1.0,
            zernike: ZernikeSum::default(),
            n_in: check_refractive_index(n_in)?,
            n_out: check_refractive_index(n_out)?,
        };
        screen.set_radius(radius)?;
        screen.set_coefficients(coefficients)?;
        Ok(screen)
    }
    /// Set the radius the Zernike coordinates are normalized to.
    ///
    /// # Errors
    ///
    /// This function will return an error if the radius is not positive and finite.
    pub fn set_radius(&mut self, radius: Length) -> OptResult<()> {
        if !radius.is_normal() || radius.is_sign_negative() {
            return Err(OptraceError::Configuration(
                "phase screen radius must be positive and finite".into(),
            ));
        }
        self.radius = radius.value;
        Ok(())
    }
    /// Replace the Zernike expansion by the given coefficients in ANSI order.
    ///
    /// # Errors
    ///
    /// This function will return an error if a coefficient is not finite.
    pub fn set_coefficients(&mut self, coefficients: &[f64]) -> OptResult<()> {
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(OptraceError::Configuration(
                "Zernike coefficients must be finite".into(),
            ));
        }
        self.zernike = ZernikeSum::from_ansi_coefficients(coefficients);
        Ok(())
    }
    /// Set the refractive indices in front of and behind the screen.
    ///
    /// # Errors
    ///
    /// This function will return an error if one of the indices is < 1.0 or not finite.
    pub fn set_refractive_indices(&mut self, n_in: f64, n_out: f64) -> OptResult<()> {
        let (n_in, n_out) = (check_refractive_index(n_in)?, check_refractive_index(n_out)?);
        self.n_in = n_in;
        self.n_out = n_out;
        Ok(())
    }
    /// Returns the refractive indices `(n_in, n_out)`.
    #[must_use]
    pub const fn refractive_indices(&self) -> (f64, f64) {
        (self.n_in, self.n_out)
    }
    /// Add a single polynomial term.
    pub fn add_term(&mut self, polynomial: Zernike, coefficient: f64) {
        self.zernike.add(polynomial, coefficient);
    }
    /// Returns the radius of this [`PhaseScreen`] in meters.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }
    /// Returns the Zernike expansion of this [`PhaseScreen`].
    #[must_use]
    pub const fn zernike(&self) -> &ZernikeSum {
        &self.zernike
    }
    /// Virtual surface normal at the local position `(x, y)`, oriented towards +z.
    #[must_use]
    pub fn normal(&self, x: f64, y: f64) -> Vector3<f64> {
        let (gx, gy) = self.zernike.gradient(x / self.radius, y / self.radius);
        Vector3::new(-gx / self.radius, -gy / self.radius, 1.0).normalize()
    }
}
impl EmInterface for PhaseScreen {
    fn interact(&self, incidence: &Incidence) -> Interaction {
        let p = incidence.point;
        let u = incidence.direction;
        if p.x.hypot(p.y) > self.radius {
            return Interaction::Redirected {
                direction: u,
                refractive_index: incidence.refractive_index,
            };
        }
        let mut n = self.normal(p.x, p.y);
        if u.dot(&n) > 0.0 {
            n = -n;
        }
        refract(&u, &n, self.n_in / self.n_out).map_or_else(
            || Interaction::TotalInternalReflection {
                direction: Some(reflect(&u, &n)),
            },
            |direction| Interaction::Redirected {
                direction,
                refractive_index: self.n_out,
            },
        )
    }
    fn name(&self) -> String {
        "phase screen".into()
    }
    fn as_phase_screen_mut(&mut self) -> OptResult<&mut Self> {
        Ok(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{em_interface::incidence, meter};
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use nalgebra::Point3;
    #[test]
    fn new() {
        assert!(PhaseScreen::new(meter!(0.0), &[], 1.0, 1.0).is_err());
        assert!(PhaseScreen::new(meter!(-1.0), &[], 1.0, 1.0).is_err());
        assert!(PhaseScreen::new(meter!(1.0), &[f64::NAN], 1.0, 1.0).is_err());
        assert!(PhaseScreen::new(meter!(1.0), &[], 0.5, 1.0).is_err());
        let screen = PhaseScreen::new(meter!(0.01), &[0.0, 1.0], 1.0, 1.0).unwrap();
        assert_eq!(screen.radius(), 0.01);
        assert_eq!(screen.zernike().len(), 1);
        assert_eq!(screen.name(), "phase screen");
    }
    #[test]
    fn setters() {
        let mut screen = PhaseScreen::new(meter!(0.01), &[0.0, 1.0], 1.0, 1.0).unwrap();
        screen.set_radius(meter!(0.02)).unwrap();
        assert_eq!(screen.radius(), 0.02);
        assert!(screen.set_radius(meter!(0.0)).is_err());
        assert_eq!(screen.radius(), 0.02);
        screen.set_coefficients(&[0.0, 0.0, 0.5, 0.0, 0.2]).unwrap();
        assert_eq!(screen.zernike().len(), 2);
        assert!(screen.set_coefficients(&[f64::INFINITY]).is_err());
        assert_eq!(screen.zernike().len(), 2);
        screen.set_refractive_indices(1.0, 1.5).unwrap();
        assert_eq!(screen.refractive_indices(), (1.0, 1.5));
        assert!(screen.set_refractive_indices(1.2, 0.5).is_err());
        assert_eq!(screen.refractive_indices(), (1.0, 1.5));
    }
    #[test]
    fn empty_screen_passes() {
        let screen = PhaseScreen::new(meter!(1.0), &[], 1.0, 1.0).unwrap();
        let u = Vector3::new(0.1, 0.2, -1.0).normalize();
        let mut i = incidence(u);
        i.point = Point3::new(0.3, 0.1, 0.0);
        assert_matches!(screen.interact(&i), Interaction::Redirected { direction, refractive_index } => {
            assert_abs_diff_eq!(direction, u, epsilon = 1e-12);
            assert_eq!(refractive_index, 1.0);
        });
    }
    #[test]
    fn outside_unchanged() {
        let screen = PhaseScreen::new(meter!(1.0), &[0.0, 0.0, 0.5], 1.0, 1.5).unwrap();
        let mut i = incidence(-Vector3::z());
        i.point = Point3::new(2.0, 0.0, 0.0);
        assert_matches!(screen.interact(&i), Interaction::Redirected { direction, refractive_index } => {
            assert_eq!(direction, -Vector3::z());
            assert_eq!(refractive_index, 1.0);
        });
    }
    #[test]
    fn tilt_deflects() {
        // a tilt term acts as a thin prism in x
        let screen = PhaseScreen::new(meter!(1.0), &[0.0, 0.0, 0.1], 1.0, 1.0).unwrap();
        let n = screen.normal(0.2, 0.3);
        assert_abs_diff_eq!(n, Vector3::new(-0.1, 0.0, 1.0).normalize(), epsilon = 1e-12);
        for p in [Point3::new(0.0, 0.0, 0.0), Point3::new(0.5, -0.2, 0.0)] {
            let mut i = incidence(-Vector3::z());
            i.point = p;
            let Interaction::Redirected { direction, .. } = screen.interact(&i) else {
                panic!("ray must pass");
            };
            // same index on both sides: the ray is unchanged
            assert_abs_diff_eq!(direction, -Vector3::z(), epsilon = 1e-9);
        }
        let screen = PhaseScreen::new(meter!(1.0), &[0.0, 0.0, 0.1], 1.0, 1.5).unwrap();
        let mut i = incidence(-Vector3::z());
        i.point = Point3::new(0.5, 0.0, 0.0);
        let Interaction::Redirected { direction, refractive_index } = screen.interact(&i) else {
            panic!("ray must pass");
        };
        assert_eq!(refractive_index, 1.5);
        assert!(direction.x.abs() > 1e-3);
        assert_abs_diff_eq!(direction.y, 0.0, epsilon = 1e-12);
    }
}
