//! Direction sampler for sources at infinity.
use super::{CircularSampler, MapSampler, PointSampler, RingSampler, Sampler};
use crate::{
    error::{OptResult, OptraceError},
    radian,
    random::RandomState,
};
use log::debug;
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::{f64::consts::PI, path::PathBuf};
use strum::{Display, EnumIter, EnumString};
use uom::si::f64::Angle;

/// Angular shape of a source on the sky.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SkyShape {
    /// a single direction
    #[default]
    PointLike,
    /// a uniformly filled disc
    CircleLike,
    /// the rim of a disc
    RingLike,
    /// an extended object given by an intensity map
    Extended,
}

/// Sampler of ray directions around a central axis.
///
/// Two-dimensional samples `s` of the underlying aperture sampler are interpreted as angular offsets (in
/// radians) and turned into directions `Rot(ey, -s.x) · Rot(ex, s.y) · axis`. Every setter marks the sampler
/// dirty; the next [`SkySampler::get`] rebuilds the underlying sampler before handing out directions.
#[derive(Debug)]
pub struct SkySampler {
    shape: SkyShape,
    diameter: f64,
    axis: Vector3<f64>,
    nr_of_rays: usize,
    random: bool,
    map: Option<PathBuf>,
    dirty: bool,
    sampler: Box<dyn Sampler>,
}
impl Default for SkySampler {
    fn default() -> Self {
        Self {
            shape: SkyShape::default(),
            diameter: PI / 6.0,
            axis: -Vector3::z(),
            nr_of_rays: 1000,
            random: false,
            map: None,
            dirty: true,
            sampler: Box::new(PointSampler::default()),
        }
    }
}
impl SkySampler {
    /// Returns the shape of the source.
    #[must_use]
    pub const fn shape(&self) -> SkyShape {
        self.shape
    }
    /// Set the shape of the source.
    pub fn set_shape(&mut self, shape: SkyShape) {
        self.shape = shape;
        self.dirty = true;
    }
    /// Returns the angular diameter of the source.
    #[must_use]
    pub fn diameter(&self) -> Angle {
        radian!(self.diameter)
    }
    /// Set the angular diameter of the source.
    ///
    /// # Errors
    ///
    /// This function will return an error if the diameter is negative or not finite.
    pub fn set_diameter(&mut self, diameter: Angle) -> OptResult<()> {
        if diameter.is_sign_negative() || !diameter.is_finite() {
            return Err(OptraceError::Configuration(
                "angular diameter must be >= 0.0 and finite".into(),
            ));
        }
        self.diameter = diameter.value;
        self.dirty = true;
        Ok(())
    }
    /// Returns the central direction.
    #[must_use]
    pub const fn axis(&self) -> Vector3<f64> {
        self.axis
    }
    /// Set the central direction (normalized internally).
    ///
    /// # Errors
    ///
    /// This function will return an error if the axis has zero length or is not finite.
    pub fn set_axis(&mut self, axis: Vector3<f64>) -> OptResult<()> {
        let axis = axis
            .try_normalize(f64::EPSILON)
            .filter(|a| a.iter().all(|c| c.is_finite()))
            .ok_or_else(|| {
                OptraceError::Degenerate("sky axis must have a finite, non-zero length".into())
            })?;
        self.axis = axis;
        self.dirty = true;
        Ok(())
    }
    /// Returns the number of directions generated per sampling.
    #[must_use]
    pub const fn nr_of_rays(&self) -> usize {
        self.nr_of_rays
    }
    /// Set the number of directions generated per sampling.
    ///
    /// # Errors
    ///
    /// This function will return an error if the number is zero.
    pub fn set_nr_of_rays(&mut self, nr_of_rays: usize) -> OptResult<()> {
        if nr_of_rays == 0 {
            return Err(OptraceError::Sampler("number of rays must be > 0".into()));
        }
        self.nr_of_rays = nr_of_rays;
        self.dirty = true;
        Ok(())
    }
    /// Returns `true` if directions are drawn randomly.
    #[must_use]
    pub const fn is_random(&self) -> bool {
        self.random
    }
    /// Switch between uniform and random sampling.
    pub fn set_random(&mut self, random: bool) {
        self.random = random;
        self.dirty = true;
    }
    /// Set the intensity map (image file) used by [`SkyShape::Extended`].
    pub fn set_map(&mut self, path: Option<PathBuf>) {
        self.map = path;
        self.dirty = true;
    }
    /// Returns `true` if a setting changed since the last reconfiguration.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }
    /// Rebuild the underlying sampler from the current settings.
    ///
    /// # Errors
    ///
    /// This function will return an error if an extended source has no (loadable) map.
    pub fn reconfigure(&mut self, rng: &mut RandomState) -> OptResult<()> {
        let radius = crate::meter!(0.5 * self.diameter);
        let mut sampler: Box<dyn Sampler> = match self.shape {
            SkyShape::PointLike => Box::new(PointSampler::default()),
            SkyShape::CircleLike => Box::new(CircularSampler::new(radius)?),
            SkyShape::RingLike => Box::new(RingSampler::new(radius)?),
            SkyShape::Extended => {
                let path = self.map.as_deref().ok_or_else(|| {
                    OptraceError::Sampler("extended sky source needs an intensity map".into())
                })?;
                Box::new(MapSampler::from_png(path, radius)?)
            }
        };
        sampler.set_random(self.random);
        sampler.sample(self.nr_of_rays, rng)?;
        debug!(
            "sky sampler reconfigured: {} with {} samples",
            self.shape,
            sampler.buffer().len()
        );
        self.sampler = sampler;
        self.dirty = false;
        Ok(())
    }
    /// Return the next direction or `None` once all directions of the current sampling are consumed.
    ///
    /// A dirty sampler is reconfigured first. A random sampler is resampled if `rng` was reseeded since.
    ///
    /// # Errors
    ///
    /// This function will return an error if the reconfiguration fails.
    pub fn get(&mut self, rng: &mut RandomState) -> OptResult<Option<Vector3<f64>>> {
        if self.dirty {
            self.reconfigure(rng)?;
        } else if self.random && self.sampler.buffer().remaining() == 0 {
            self.sampler.ensure_samples(self.nr_of_rays, rng)?;
        }
        Ok(self.sampler.get().map(|s| self.direction(s.x, s.y)))
    }
    /// Direction for the angular offset `(sx, sy)` from the axis.
    #[must_use]
    pub fn direction(&self, sx: f64, sy: f64) -> Vector3<f64> {
        Rotation3::from_axis_angle(&Vector3::y_axis(), -sx)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), sy)
            * self.axis
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::degree;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    fn drain(sky: &mut SkySampler, rng: &mut RandomState) -> Vec<Vector3<f64>> {
        std::iter::from_fn(|| sky.get(rng).unwrap()).collect()
    }
    #[test]
    fn default() {
        let sky = SkySampler::default();
        assert_eq!(sky.shape(), SkyShape::PointLike);
        assert_abs_diff_eq!(sky.diameter().value, PI / 6.0);
        assert_eq!(sky.axis(), -Vector3::z());
        assert_eq!(sky.nr_of_rays(), 1000);
        assert!(!sky.is_random());
        assert!(sky.is_dirty());
    }
    #[test]
    fn setters() {
        let mut sky = SkySampler::default();
        assert!(sky.set_diameter(degree!(-1.0)).is_err());
        assert!(sky.set_nr_of_rays(0).is_err());
        assert_matches!(sky.set_axis(Vector3::zeros()), Err(OptraceError::Degenerate(_)));
        sky.set_axis(Vector3::new(0.0, 0.0, 2.0)).unwrap();
        assert_eq!(sky.axis(), Vector3::z());
    }
    #[test]
    fn point_like() {
        let mut sky = SkySampler::default();
        sky.set_nr_of_rays(10).unwrap();
        let mut rng = RandomState::default();
        let dirs = drain(&mut sky, &mut rng);
        assert!(!sky.is_dirty());
        assert_eq!(dirs.len(), 10);
        assert!(dirs.iter().all(|d| *d == -Vector3::z()));
    }
    #[test]
    fn circle_like() {
        let mut sky = SkySampler::default();
        sky.set_shape(SkyShape::CircleLike);
        sky.set_diameter(degree!(2.0)).unwrap();
        sky.set_nr_of_rays(200).unwrap();
        let mut rng = RandomState::default();
        let dirs = drain(&mut sky, &mut rng);
        assert_eq!(dirs.len(), 200);
        let half = degree!(1.0).value;
        for d in dirs {
            assert_abs_diff_eq!(d.norm(), 1.0, epsilon = 1e-12);
            assert!(d.angle(&-Vector3::z()) <= half + 1e-12);
        }
        // exhausted until a setting changes
        assert!(sky.get(&mut rng).unwrap().is_none());
        sky.set_nr_of_rays(5).unwrap();
        assert_eq!(drain(&mut sky, &mut rng).len(), 5);
    }
    #[test]
    fn ring_like_offsets() {
        let mut sky = SkySampler::default();
        sky.set_shape(SkyShape::RingLike);
        sky.set_diameter(degree!(4.0)).unwrap();
        sky.set_nr_of_rays(4).unwrap();
        let mut rng = RandomState::default();
        // first ring sample is (+r, 0): tilt towards +x
        let d = sky.get(&mut rng).unwrap().unwrap();
        let r = degree!(2.0).value;
        assert_abs_diff_eq!(d, Vector3::new(r.sin(), 0.0, -r.cos()), epsilon = 1e-12);
    }
    #[test]
    fn random_resamples_after_reseed() {
        let mut sky = SkySampler::default();
        sky.set_shape(SkyShape::CircleLike);
        sky.set_random(true);
        sky.set_nr_of_rays(3).unwrap();
        let mut rng = RandomState::default();
        assert_eq!(drain(&mut sky, &mut rng).len(), 3);
        rng.set_seed(99);
        assert_eq!(drain(&mut sky, &mut rng).len(), 3);
    }
    #[test]
    fn extended_from_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sky.png");
        image::GrayImage::from_pixel(64, 64, image::Luma([200]))
            .save(&path)
            .unwrap();
        let mut sky = SkySampler::default();
        sky.set_shape(SkyShape::Extended);
        sky.set_diameter(degree!(2.0)).unwrap();
        sky.set_nr_of_rays(500).unwrap();
        sky.set_map(Some(path));
        let mut rng = RandomState::default();
        let dirs = drain(&mut sky, &mut rng);
        assert_eq!(dirs.len(), 500);
        let corner = degree!(1.0).value * 2.0_f64.sqrt();
        for d in dirs {
            assert_abs_diff_eq!(d.norm(), 1.0, epsilon = 1e-12);
            assert!(d.angle(&-Vector3::z()) <= corner + 1e-12);
        }
    }
    #[test]
    fn extended_needs_map() {
        let mut sky = SkySampler::default();
        sky.set_shape(SkyShape::Extended);
        assert_matches!(sky.get(&mut RandomState::default()), Err(OptraceError::Sampler(_)));
        assert!(sky.is_dirty());
    }
}
