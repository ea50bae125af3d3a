//! Specular reflection.
use super::{reflect, EmInterface, Incidence, Interaction};

/// Perfect mirror. The ray stays in its medium.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reflective;

impl EmInterface for Reflective {
    fn interact(&self, incidence: &Incidence) -> Interaction {
        Interaction::Redirected {
            direction: reflect(&incidence.direction, &incidence.normal),
            refractive_index: incidence.refractive_index,
        }
    }
    fn name(&self) -> String {
        "reflective".into()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::em_interface::incidence;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use nalgebra::Vector3;
    #[test]
    fn interact() {
        let mut i = incidence(Vector3::new(1.0, 0.0, -1.0));
        i.refractive_index = 1.3;
        assert_matches!(Reflective.interact(&i), Interaction::Redirected { direction, refractive_index } => {
            assert_abs_diff_eq!(direction, Vector3::new(1.0, 0.0, 1.0).normalize(), epsilon = 1e-15);
            assert_eq!(refractive_index, 1.3);
        });
        assert_eq!(Reflective.name(), "reflective");
    }
}
