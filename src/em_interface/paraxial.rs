//! Ideal thin lens.
use super::{EmInterface, Incidence, Interaction};
use crate::error::{OptResult, OptraceError};
use nalgebra::Point3;
use uom::si::f64::Length;

/// Paraxial (ideal) lens of a given focal length.
///
/// All rays sharing a direction are sent to the same point of the focal plane, found by projecting the
/// direction onto the plane at distance `f` behind the lens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paraxial {
    focal_length: f64,
}
impl Paraxial {
    /// Creates a new [`Paraxial`] lens.
    ///
    /// # Errors
    ///
    /// This function will return an error if the focal length is 0.0 or not finite.
    pub fn new(focal_length: Length) -> OptResult<Self> {
        let mut lens = Self { focal_length: 1.0 };
        lens.set_focal_length(focal_length)?;
        Ok(lens)
    }
    /// Set the focal length.
    ///
    /// # Errors
    ///
    /// This function will return an error if the focal length is 0.0 or not finite.
    pub fn set_focal_length(&mut self, focal_length: Length) -> OptResult<()> {
        if !focal_length.is_normal() {
            return Err(OptraceError::Configuration(
                "focal length must be != 0.0 and finite".into(),
            ));
        }
        self.focal_length = focal_length.value;
        Ok(())
    }
    /// Returns the focal length in meters.
    #[must_use]
    pub const fn focal_length(&self) -> f64 {
        self.focal_length
    }
}
impl EmInterface for Paraxial {
    fn interact(&self, incidence: &Incidence) -> Interaction {
        let d = incidence.direction;
        if d.z.abs() < f64::EPSILON {
            return Interaction::Absorbed;
        }
        let f = self.focal_length;
        let image = Point3::new(f * d.x / d.z.abs(), f * d.y / d.z.abs(), d.z.signum() * f);
        let to_image = image - incidence.point;
        let direction = if f > 0.0 { to_image } else { -to_image };
        match direction.try_normalize(f64::EPSILON) {
            Some(direction) => Interaction::Redirected {
                direction,
                refractive_index: incidence.refractive_index,
            },
            None => Interaction::Absorbed,
        }
    }
    fn name(&self) -> String {
        "paraxial".into()
    }
    fn as_paraxial_mut(&mut self) -> OptResult<&mut Self> {
        Ok(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{em_interface::incidence, meter};
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use nalgebra::Vector3;
    #[test]
    fn new() {
        assert!(Paraxial::new(meter!(0.0)).is_err());
        assert!(Paraxial::new(meter!(f64::NAN)).is_err());
        assert!(Paraxial::new(meter!(f64::INFINITY)).is_err());
        assert_eq!(Paraxial::new(meter!(-0.5)).unwrap().focal_length(), -0.5);
    }
    #[test]
    fn set_focal_length() {
        let mut lens = Paraxial::new(meter!(0.1)).unwrap();
        lens.set_focal_length(meter!(0.25)).unwrap();
        assert_eq!(lens.focal_length(), 0.25);
        assert!(lens.set_focal_length(meter!(0.0)).is_err());
        assert_eq!(lens.focal_length(), 0.25);
    }
    #[test]
    fn focus_parallel_rays() {
        let lens = Paraxial::new(meter!(0.1)).unwrap();
        for (x, y) in [(0.0, 0.0), (0.01, 0.0), (-0.02, 0.005)] {
            let mut i = incidence(-Vector3::z());
            i.point = Point3::new(x, y, 0.0);
            let Interaction::Redirected { direction, .. } = lens.interact(&i) else {
                panic!("ray must pass");
            };
            let t = -0.1 / direction.z;
            assert_abs_diff_eq!(x + t * direction.x, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(y + t * direction.y, 0.0, epsilon = 1e-12);
        }
    }
    #[test]
    fn tilted_bundle() {
        let lens = Paraxial::new(meter!(0.1)).unwrap();
        let u = Vector3::new(0.1, 0.0, -1.0).normalize();
        for x in [-0.01, 0.0, 0.02] {
            let mut i = incidence(u);
            i.point = Point3::new(x, 0.0, 0.0);
            let Interaction::Redirected { direction, .. } = lens.interact(&i) else {
                panic!("ray must pass");
            };
            let t = -0.1 / direction.z;
            assert_abs_diff_eq!(x + t * direction.x, 0.01, epsilon = 1e-12);
        }
    }
    #[test]
    fn diverging() {
        let lens = Paraxial::new(meter!(-0.1)).unwrap();
        let mut i = incidence(-Vector3::z());
        i.point = Point3::new(0.01, 0.0, 0.0);
        let Interaction::Redirected { direction, .. } = lens.interact(&i) else {
            panic!("ray must pass");
        };
        // virtual focus in front of the lens
        assert!(direction.x > 0.0);
        assert!(direction.z < 0.0);
        let t = 0.1 / direction.z;
        assert_abs_diff_eq!(0.01 + t * direction.x, 0.0, epsilon = 1e-12);
    }
    #[test]
    fn grazing() {
        let lens = Paraxial::new(meter!(0.1)).unwrap();
        assert_matches!(lens.interact(&incidence(Vector3::x())), Interaction::Absorbed);
    }
}
