//! Refraction between two homogeneous media.
use super::{check_refractive_index, reflect, refract, EmInterface, Incidence, Interaction};
use crate::error::OptResult;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Handling of rays for which no refracted ray exists.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TotalInternalReflection {
    /// keep the ray and reflect it specularly
    #[default]
    Reflect,
    /// remove the ray from the beam
    Prune,
}

/// Dielectric interface between a medium `n_in` on the +z side (where the normal points to) and a medium `n_out`
/// on the -z side.
///
/// A ray arriving from the +z side (against the normal) refracts with `n_in / n_out` and continues in `n_out`.
/// A ray arriving from the -z side uses the inverse ratio and continues in `n_in`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dielectric {
    n_in: f64,
    n_out: f64,
    tir: TotalInternalReflection,
}
impl Dielectric {
    /// Creates a new [`Dielectric`] interface.
    ///
    /// # Errors
    ///
    /// This function will return an error if one of the refractive indices is < 1.0 or not finite.
    pub fn new(n_in: f64, n_out: f64) -> OptResult<Self> {
        Ok(Self {
            n_in: check_refractive_index(n_in)?,
            n_out: check_refractive_index(n_out)?,
            tir: TotalInternalReflection::default(),
        })
    }
    /// Set the handling of totally internally reflected rays.
    #[must_use]
    pub const fn with_total_internal_reflection(mut self, tir: TotalInternalReflection) -> Self {
        self.tir = tir;
        self
    }
    /// Set the refractive index on the +z side.
    ///
    /// # Errors
    ///
    /// This function will return an error if the index is < 1.0 or not finite.
    pub fn set_n_in(&mut self, n_in: f64) -> OptResult<()> {
        self.n_in = check_refractive_index(n_in)?;
        Ok(())
    }
    /// Set the refractive index on the -z side.
    ///
    /// # Errors
    ///
    /// This function will return an error if the index is < 1.0 or not finite.
    pub fn set_n_out(&mut self, n_out: f64) -> OptResult<()> {
        self.n_out = check_refractive_index(n_out)?;
        Ok(())
    }
    /// Set the handling of totally internally reflected rays.
    pub fn set_total_internal_reflection(&mut self, tir: TotalInternalReflection) {
        self.tir = tir;
    }
    /// Returns the refractive indices `(n_in, n_out)`.
    #[must_use]
    pub const fn refractive_indices(&self) -> (f64, f64) {
        (self.n_in, self.n_out)
    }
    /// Returns the handling of totally internally reflected rays.
    #[must_use]
    pub const fn total_internal_reflection(&self) -> TotalInternalReflection {
        self.tir
    }
}
impl EmInterface for Dielectric {
    fn interact(&self, incidence: &Incidence) -> Interaction {
        let u = &incidence.direction;
        let n = &incidence.normal;
        let refracted = if u.dot(n) < 0.0 {
            refract(u, n, self.n_in / self.n_out).map(|d| (d, self.n_out))
        } else {
            refract(u, &-n, self.n_out / self.n_in).map(|d| (d, self.n_in))
        };
        match refracted {
            Some((direction, refractive_index)) => Interaction::Redirected {
                direction,
                refractive_index,
            },
            None => Interaction::TotalInternalReflection {
                direction: match self.tir {
                    TotalInternalReflection::Reflect => Some(reflect(u, n)),
                    TotalInternalReflection::Prune => None,
                },
            },
        }
    }
    fn name(&self) -> String {
        format!("dielectric ({} / {})", self.n_in, self.n_out)
    }
    fn as_dielectric_mut(&mut self) -> OptResult<&mut Self> {
        Ok(self)
    }
}
