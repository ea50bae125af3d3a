#![warn(missing_docs)]
//! Point distributions used to seed ray origins and directions.
//!
//! A [`Sampler`] pre-generates a buffer of points in the local z = 0 plane (a disc, a ring, a single point or
//! an intensity-weighted map) and hands them out one at a time. Once the buffer is consumed, [`Sampler::get`]
//! returns `None` until it is sampled again. Random buffers remember the epoch of the [`RandomState`] they were
//! drawn from, so that [`Sampler::ensure_samples`] regenerates them after a reseed.
//!
//! ## Example
//! ```rust
//! use optrace::{millimeter, random::RandomState, sampler::{RingSampler, Sampler}};
//!
//! let mut ring = RingSampler::new(millimeter!(1.0)).unwrap();
//! let mut rng = RandomState::default();
//! ring.sample(4, &mut rng).unwrap();
//! let points: Vec<_> = std::iter::from_fn(|| ring.get()).collect();
//! assert_eq!(points.len(), 4);
//! assert!(ring.get().is_none());
//! ```
mod circular;
mod map;
mod point;
mod ring;
mod sky;

pub use circular::CircularSampler;
pub use map::MapSampler;
pub use point::PointSampler;
pub use ring::RingSampler;
pub use sky::{SkySampler, SkyShape};

use crate::{
    error::{OptResult, OptraceError},
    random::RandomState,
};
use nalgebra::{Matrix3, Point3};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, path::Path};
use strum::{Display, EnumIter, EnumString};
use uom::si::f64::Length;

/// Cached samples of a [`Sampler`] together with its common settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBuffer {
    radius: f64,
    random: bool,
    samples: Vec<Point3<f64>>,
    requested: usize,
    cursor: usize,
    epoch: Option<u64>,
}
impl SampleBuffer {
    /// Creates an empty [`SampleBuffer`] for the given radius (in meters).
    #[must_use]
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }
    /// Returns the radius (in meters).
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }
    /// Returns the number of samples generated during the last sampling.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    /// Returns `true` if the buffer holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    /// Returns the number of samples not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.cursor
    }
    /// Drop all cached samples.
    pub fn invalidate(&mut self) {
        self.samples.clear();
        self.requested = 0;
        self.cursor = 0;
        self.epoch = None;
    }
    fn fill(&mut self, samples: Vec<Point3<f64>>, requested: usize, epoch: Option<u64>) {
        self.samples = samples;
        self.requested = requested;
        self.cursor = 0;
        self.epoch = epoch;
    }
    fn is_current(&self, requested: usize, rng: &RandomState) -> bool {
        self.requested == requested
            && self.requested > 0
            && (!self.random || self.epoch == Some(rng.epoch()))
    }
    fn pop(&mut self) -> Option<Point3<f64>> {
        let sample = self.samples.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(sample)
    }
}

/// Common interface of all samplers.
///
/// Implementors only provide access to their [`SampleBuffer`] and the generation of a fresh set of points. All
/// other operations are provided.
pub trait Sampler: Send + Sync {
    /// Returns the buffer of this sampler.
    fn buffer(&self) -> &SampleBuffer;
    /// Returns the mutable buffer of this sampler.
    fn buffer_mut(&mut self) -> &mut SampleBuffer;
    /// Generate (about) `nr_of_samples` new points.
    ///
    /// # Errors
    ///
    /// This function will return an error if the sampler cannot produce points with its current configuration.
    fn generate(&self, nr_of_samples: usize, rng: &mut RandomState) -> OptResult<Vec<Point3<f64>>>;
    /// Return the sampler type as string (for debugging purposes)
    fn name(&self) -> String;

    /// Returns the radius of the sampled area.
    fn radius(&self) -> Length {
        crate::meter!(self.buffer().radius)
    }
    /// Set the radius of the sampled area. Cached samples are dropped if the radius changes.
    ///
    /// # Errors
    ///
    /// This function will return an error if the radius is negative or not finite.
    fn set_radius(&mut self, radius: Length) -> OptResult<()> {
        let radius = check_radius(radius)?;
        if (radius - self.buffer().radius).abs() > 0.0 {
            let buffer = self.buffer_mut();
            buffer.radius = radius;
            buffer.invalidate();
        }
        Ok(())
    }
    /// Returns `true` if this sampler draws random samples.
    fn is_random(&self) -> bool {
        self.buffer().random
    }
    /// Switch between uniform and random sampling. Cached samples are dropped only if the mode changes.
    fn set_random(&mut self, random: bool) {
        if self.buffer().random != random {
            let buffer = self.buffer_mut();
            buffer.random = random;
            buffer.invalidate();
        }
    }
    /// (Re)generate the buffer with `nr_of_samples` points.
    ///
    /// # Errors
    ///
    /// This function will return an error if `nr_of_samples` is zero or the generation fails.
    fn sample(&mut self, nr_of_samples: usize, rng: &mut RandomState) -> OptResult<()> {
        if nr_of_samples == 0 {
            return Err(OptraceError::Sampler(
                "number of samples must be > 0".into(),
            ));
        }
        let samples = self.generate(nr_of_samples, rng)?;
        let epoch = self.is_random().then(|| rng.epoch());
        self.buffer_mut().fill(samples, nr_of_samples, epoch);
        Ok(())
    }
    /// Regenerate the buffer only if it was sampled with a different count or, for random samplers, from an
    /// older epoch of `rng`. A partially consumed but current buffer is kept.
    ///
    /// # Errors
    ///
    /// This function will return an error if sampling fails (see [`Sampler::sample`]).
    fn ensure_samples(&mut self, nr_of_samples: usize, rng: &mut RandomState) -> OptResult<()> {
        if self.buffer().is_current(nr_of_samples, rng) {
            Ok(())
        } else {
            self.sample(nr_of_samples, rng)
        }
    }
    /// Return the next sample or `None` if the buffer is exhausted.
    fn get(&mut self) -> Option<Point3<f64>> {
        self.buffer_mut().pop()
    }
    /// Return the next sample.
    ///
    /// # Errors
    ///
    /// This function will return an error if the buffer is exhausted.
    fn next_sample(&mut self) -> OptResult<Point3<f64>> {
        self.get().ok_or_else(|| {
            OptraceError::Sampler(format!("{} sampler exhausted", self.name()))
        })
    }
    /// Return the next sample mapped into the coordinate system spanned by the columns of `system` and
    /// shifted to `center`.
    fn get_in(&mut self, system: &Matrix3<f64>, center: &Point3<f64>) -> Option<Point3<f64>> {
        self.get().map(|p| center + system * p.coords)
    }
    /// Sample `nr_of_samples` points and return all of them mapped by `system` and `center` (see
    /// [`Sampler::get_in`]). The buffer is exhausted afterwards.
    ///
    /// # Errors
    ///
    /// This function will return an error if sampling fails (see [`Sampler::sample`]).
    fn sample_in(
        &mut self,
        nr_of_samples: usize,
        system: &Matrix3<f64>,
        center: &Point3<f64>,
        rng: &mut RandomState,
    ) -> OptResult<Vec<Point3<f64>>> {
        self.sample(nr_of_samples, rng)?;
        Ok(std::iter::from_fn(|| self.get_in(system, center)).collect())
    }
}

impl Debug for dyn Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} sampler", self.name())
    }
}

/// Kind of an aperture [`Sampler`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SamplerKind {
    /// all samples at the center
    Point,
    /// samples on a circle
    Ring,
    /// samples over a disc
    #[default]
    Circular,
    /// samples weighted by an intensity map
    Map,
}
impl SamplerKind {
    /// Build a sampler of this kind.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the radius is invalid.
    ///   - a map sampler is requested without a map file or the map cannot be loaded.
    pub fn build(
        self,
        radius: Length,
        random: bool,
        map: Option<&Path>,
    ) -> OptResult<Box<dyn Sampler>> {
        let mut sampler: Box<dyn Sampler> = match self {
            Self::Point => Box::new(PointSampler::default()),
            Self::Ring => Box::new(RingSampler::new(radius)?),
            Self::Circular => Box::new(CircularSampler::new(radius)?),
            Self::Map => {
                let path = map.ok_or_else(|| {
                    OptraceError::Sampler("map sampler needs an intensity map file".into())
                })?;
                Box::new(MapSampler::from_png(path, radius)?)
            }
        };
        sampler.set_random(random);
        Ok(sampler)
    }
}

pub(crate) fn check_radius(radius: Length) -> OptResult<f64> {
    if radius.is_sign_negative() || !radius.is_finite() {
        return Err(OptraceError::Configuration(
            "radius must be >= 0.0 and finite".into(),
        ));
    }
    Ok(radius.value)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{meter, millimeter};
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use std::str::FromStr;
    #[test]
    fn sample_zero() {
        let mut s = CircularSampler::new(meter!(1.0)).unwrap();
        assert_matches!(
            s.sample(0, &mut RandomState::default()),
            Err(OptraceError::Sampler(_))
        );
    }
    #[test]
    fn exhaustion() {
        let mut s = RingSampler::new(meter!(1.0)).unwrap();
        let mut rng = RandomState::default();
        assert!(s.get().is_none());
        s.sample(3, &mut rng).unwrap();
        assert_eq!(s.buffer().remaining(), 3);
        for _ in 0..3 {
            assert!(s.next_sample().is_ok());
        }
        assert!(s.get().is_none());
        assert_matches!(s.next_sample(), Err(OptraceError::Sampler(_)));
        // a current buffer is not refilled
        s.ensure_samples(3, &mut rng).unwrap();
        assert!(s.get().is_none());
        s.ensure_samples(4, &mut rng).unwrap();
        assert_eq!(s.buffer().remaining(), 4);
    }
    #[test]
    fn random_buffer_follows_epoch() {
        let mut s = CircularSampler::new(meter!(1.0)).unwrap();
        s.set_random(true);
        let mut rng = RandomState::default();
        s.ensure_samples(5, &mut rng).unwrap();
        let first = s.get().unwrap();
        s.ensure_samples(5, &mut rng).unwrap();
        assert_eq!(s.buffer().remaining(), 4);
        rng.update();
        s.ensure_samples(5, &mut rng).unwrap();
        assert_eq!(s.buffer().remaining(), 5);
        assert_ne!(s.get().unwrap(), first);
    }
    #[test]
    fn uniform_buffer_ignores_epoch() {
        let mut s = CircularSampler::new(meter!(1.0)).unwrap();
        let mut rng = RandomState::default();
        s.ensure_samples(5, &mut rng).unwrap();
        s.get();
        rng.update();
        s.ensure_samples(5, &mut rng).unwrap();
        assert_eq!(s.buffer().remaining(), 4);
    }
    #[test]
    fn settings_invalidate() {
        let mut s = RingSampler::new(meter!(1.0)).unwrap();
        let mut rng = RandomState::default();
        s.sample(3, &mut rng).unwrap();
        s.set_random(false);
        assert_eq!(s.buffer().remaining(), 3);
        s.set_random(true);
        assert!(s.buffer().is_empty());
        s.sample(3, &mut rng).unwrap();
        s.set_radius(meter!(1.0)).unwrap();
        assert_eq!(s.buffer().len(), 3);
        s.set_radius(meter!(2.0)).unwrap();
        assert!(s.buffer().is_empty());
        assert!(s.set_radius(meter!(-1.0)).is_err());
        assert!(s.set_radius(meter!(f64::NAN)).is_err());
        assert_eq!(s.radius(), meter!(2.0));
    }
    #[test]
    fn sample_in_frame() {
        let mut s = RingSampler::new(millimeter!(1.0)).unwrap();
        // swap x and z
        let system = Matrix3::new(0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0);
        let center = Point3::new(1.0, 2.0, 3.0);
        let points = s
            .sample_in(4, &system, &center, &mut RandomState::default())
            .unwrap();
        assert_eq!(points.len(), 4);
        assert_abs_diff_eq!(points[0], Point3::new(1.0, 2.0, 3.001), epsilon = 1e-15);
        for p in &points {
            assert_abs_diff_eq!(p.x, 1.0);
        }
        assert!(s.get().is_none());
    }
    #[test]
    fn kind() {
        assert_eq!(SamplerKind::from_str("ring").unwrap(), SamplerKind::Ring);
        assert_eq!(SamplerKind::default().to_string(), "circular");
        let s = SamplerKind::Ring.build(meter!(1.0), true, None).unwrap();
        assert!(s.is_random());
        assert_eq!(s.name(), "ring");
        assert_eq!(format!("{s:?}"), "ring sampler");
        assert_matches!(
            SamplerKind::Map.build(meter!(1.0), false, None),
            Err(OptraceError::Sampler(_))
        );
        assert!(SamplerKind::Point.build(meter!(1.0), false, None).is_ok());
    }
}
