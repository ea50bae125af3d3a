#![warn(missing_docs)]
//! Batch of rays propagated together through a sequence of medium boundaries.
//!
//! The beam stores one vector per ray property. A ray keeps its index for the whole lifetime of the beam; pruned
//! rays stay in place so that all vectors remain aligned.
use crate::{
    error::{OptResult, OptraceError},
    nanometer,
};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use uom::si::f64::Length;

/// Liveness of a single ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, Serialize, Deserialize)]
pub enum RayState {
    /// ray is in flight and will be tested against the next boundary
    #[default]
    Alive,
    /// ray was consumed by the boundary processed last
    Intercepted,
    /// ray was removed from the pass (terminal)
    Pruned,
}

/// Counters collected while a boundary processes a beam.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryStatistics {
    /// rays that hit the boundary and passed on
    pub intercepted: usize,
    /// rays pruned because they missed the aperture
    pub vignetted: usize,
    /// rays pruned by the transmission of the boundary
    pub blocked: usize,
    /// rays that were totally internally reflected
    pub total_internal_reflections: usize,
}
impl BoundaryStatistics {
    /// Total number of rays pruned by the boundary.
    #[must_use]
    pub const fn pruned(&self) -> usize {
        self.vignetted + self.blocked
    }
}

/// Structure-of-arrays representation of a bundle of rays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RayBeam {
    origins: Vec<Point3<f64>>,
    destinations: Vec<Point3<f64>>,
    directions: Vec<Vector3<f64>>,
    normals: Vec<Vector3<f64>>,
    lengths: Vec<f64>,
    optical_lengths: Vec<f64>,
    wavelengths: Vec<f64>,
    ids: Vec<usize>,
    states: Vec<RayState>,
    refractive_index: f64,
}
impl Default for RayBeam {
    fn default() -> Self {
        Self::new(0)
    }
}
impl RayBeam {
    /// Creates a new [`RayBeam`] with `nr_of_rays` rays at the origin travelling along +z.
    ///
    /// All rays are alive, carry a wavelength of 1000 nm and start in vacuum (`n = 1`).
    #[must_use]
    pub fn new(nr_of_rays: usize) -> Self {
        Self {
            origins: vec![Point3::origin(); nr_of_rays],
            destinations: vec![Point3::origin(); nr_of_rays],
            directions: vec![Vector3::z(); nr_of_rays],
            normals: vec![Vector3::zeros(); nr_of_rays],
            lengths: vec![0.0; nr_of_rays],
            optical_lengths: vec![0.0; nr_of_rays],
            wavelengths: vec![nanometer!(1000.0).value; nr_of_rays],
            ids: (0..nr_of_rays).collect(),
            states: vec![RayState::Alive; nr_of_rays],
            refractive_index: 1.0,
        }
    }
    /// Creates a beam from a list of ray origins sharing one direction.
    ///
    /// # Errors
    ///
    /// This function will return an error if the direction has zero length or is not finite.
    pub fn from_origins(origins: &[Point3<f64>], direction: Vector3<f64>) -> OptResult<Self> {
        let mut beam = Self::new(0);
        for origin in origins {
            beam.push_ray(*origin, direction)?;
        }
        Ok(beam)
    }
    /// Creates a beam of rays starting in a common origin with the given directions.
    ///
    /// # Errors
    ///
    /// This function will return an error if one of the directions has zero length or is not finite.
    pub fn from_directions(origin: Point3<f64>, directions: &[Vector3<f64>]) -> OptResult<Self> {
        let mut beam = Self::new(0);
        for direction in directions {
            beam.push_ray(origin, *direction)?;
        }
        Ok(beam)
    }
    fn normalized(direction: Vector3<f64>) -> OptResult<Vector3<f64>> {
        let norm = direction.norm();
        if !norm.is_normal() {
            return Err(OptraceError::Degenerate(
                "ray direction must have a finite, non-zero length".into(),
            ));
        }
        Ok(direction / norm)
    }
    /// Append an alive ray and return its index.
    ///
    /// # Errors
    ///
    /// This function will return an error if the direction has zero length or is not finite or the origin is not
    /// finite.
    pub fn push_ray(&mut self, origin: Point3<f64>, direction: Vector3<f64>) -> OptResult<usize> {
        if !origin.iter().all(|c| c.is_finite()) {
            return Err(OptraceError::Configuration(
                "ray origin must be finite".into(),
            ));
        }
        let direction = Self::normalized(direction)?;
        let index = self.len();
        self.origins.push(origin);
        self.destinations.push(origin);
        self.directions.push(direction);
        self.normals.push(Vector3::zeros());
        self.lengths.push(0.0);
        self.optical_lengths.push(0.0);
        self.wavelengths.push(nanometer!(1000.0).value);
        self.ids.push(index);
        self.states.push(RayState::Alive);
        Ok(index)
    }
    /// Overwrite origin and direction of the ray at `index`. The destination is reset to the origin.
    ///
    /// # Errors
    ///
    /// This function will return an error if the index is out of range or the direction is invalid.
    pub fn set_ray(
        &mut self,
        index: usize,
        origin: Point3<f64>,
        direction: Vector3<f64>,
    ) -> OptResult<()> {
        self.check_index(index)?;
        let direction = Self::normalized(direction)?;
        self.origins[index] = origin;
        self.destinations[index] = origin;
        self.directions[index] = direction;
        Ok(())
    }
    /// Set the wavelength of all rays.
    ///
    /// # Errors
    ///
    /// This function will return an error if the wavelength is not positive and finite.
    pub fn set_wavelength(&mut self, wavelength: Length) -> OptResult<()> {
        if !wavelength.is_normal() || wavelength.is_sign_negative() {
            return Err(OptraceError::Configuration(
                "wavelength must be positive and finite".into(),
            ));
        }
        self.wavelengths.fill(wavelength.value);
        Ok(())
    }
    /// Set the refractive index of the medium the beam currently travels in.
    ///
    /// # Errors
    ///
    /// This function will return an error if the index is not >= 1 and finite.
    pub fn set_refractive_index(&mut self, refractive_index: f64) -> OptResult<()> {
        if refractive_index < 1.0 || !refractive_index.is_finite() {
            return Err(OptraceError::Configuration(
                "refractive index must be >=1.0 and finite".into(),
            ));
        }
        self.refractive_index = refractive_index;
        Ok(())
    }
    fn check_index(&self, index: usize) -> OptResult<()> {
        if index >= self.len() {
            return Err(OptraceError::Other(format!(
                "ray index {index} out of range (beam of {} rays)",
                self.len()
            )));
        }
        Ok(())
    }
    /// Number of rays (including pruned ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }
    /// Returns `true` if the beam contains no rays at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
    /// Refractive index of the medium the beam currently travels in.
    #[must_use]
    pub const fn refractive_index(&self) -> f64 {
        self.refractive_index
    }
    /// Ray origins (start points of the current segment).
    #[must_use]
    pub fn origins(&self) -> &[Point3<f64>] {
        &self.origins
    }
    /// Ray destinations (last hit points).
    #[must_use]
    pub fn destinations(&self) -> &[Point3<f64>] {
        &self.destinations
    }
    /// Unit propagation directions.
    #[must_use]
    pub fn directions(&self) -> &[Vector3<f64>] {
        &self.directions
    }
    /// Surface normals at the last hit points (zero before the first hit).
    #[must_use]
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }
    /// Accumulated geometric path lengths in meters.
    #[must_use]
    pub fn lengths(&self) -> &[f64] {
        &self.lengths
    }
    /// Accumulated optical path lengths in meters.
    #[must_use]
    pub fn optical_lengths(&self) -> &[f64] {
        &self.optical_lengths
    }
    /// Wavelengths in meters.
    #[must_use]
    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }
    /// Stable ray ids.
    #[must_use]
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }
    /// Liveness of all rays.
    #[must_use]
    pub fn states(&self) -> &[RayState] {
        &self.states
    }
    /// Liveness of the ray at `index`.
    #[must_use]
    pub fn state(&self, index: usize) -> Option<RayState> {
        self.states.get(index).copied()
    }
    /// Returns `true` if the ray at `index` is alive.
    #[must_use]
    pub fn is_alive(&self, index: usize) -> bool {
        self.state(index) == Some(RayState::Alive)
    }
    /// Returns `true` if the ray at `index` is pruned.
    #[must_use]
    pub fn is_pruned(&self, index: usize) -> bool {
        self.state(index) == Some(RayState::Pruned)
    }
    /// Mark an alive ray as intercepted. Pruned rays are left untouched.
    pub fn intercept(&mut self, index: usize) {
        if let Some(state) = self.states.get_mut(index) {
            if *state != RayState::Pruned {
                *state = RayState::Intercepted;
            }
        }
    }
    /// Remove a ray from the pass. Pruning is terminal and idempotent.
    pub fn prune(&mut self, index: usize) {
        if let Some(state) = self.states.get_mut(index) {
            *state = RayState::Pruned;
        }
    }
    /// Start the next step: every intercepted ray becomes alive again and continues from its last hit point.
    pub fn advance(&mut self) {
        for (i, state) in self.states.iter_mut().enumerate() {
            if *state == RayState::Intercepted {
                *state = RayState::Alive;
                self.origins[i] = self.destinations[i];
            }
        }
    }
    /// Reset all intercepted rays to alive without moving their origins.
    pub fn unintercept_all(&mut self) {
        for state in &mut self.states {
            if *state == RayState::Intercepted {
                *state = RayState::Alive;
            }
        }
    }
    /// Record a hit of the ray at `index`.
    ///
    /// The destination and normal are overwritten, the geometric length grows by `distance` and the optical length
    /// by `distance` times the current (incoming) refractive index. The ray is marked as intercepted.
    pub fn record_hit(
        &mut self,
        index: usize,
        point: Point3<f64>,
        normal: Vector3<f64>,
        distance: f64,
    ) {
        if self.is_pruned(index) || index >= self.len() {
            return;
        }
        let distance = distance.max(0.0);
        self.destinations[index] = point;
        self.normals[index] = normal;
        self.lengths[index] += distance;
        self.optical_lengths[index] += self.refractive_index * distance;
        self.states[index] = RayState::Intercepted;
    }
    /// Set the propagation direction of the ray at `index` (normalized internally).
    pub fn set_direction(&mut self, index: usize, direction: Vector3<f64>) {
        if let (Some(d), Ok(direction)) = (self.directions.get_mut(index), Self::normalized(direction)) {
            *d = direction;
        }
    }
    /// Indices of all alive rays.
    pub fn alive(&self) -> impl Iterator<Item = usize> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == RayState::Alive)
            .map(|(i, _)| i)
    }
    /// Number of alive rays.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.count(RayState::Alive)
    }
    /// Number of intercepted rays.
    #[must_use]
    pub fn intercepted_count(&self) -> usize {
        self.count(RayState::Intercepted)
    }
    /// Number of pruned rays.
    #[must_use]
    pub fn pruned_count(&self) -> usize {
        self.count(RayState::Pruned)
    }
    fn count(&self, state: RayState) -> usize {
        self.states.iter().filter(|s| **s == state).count()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use itertools::Itertools;
    #[test]
    fn new() {
        let beam = RayBeam::new(3);
        assert_eq!(beam.len(), 3);
        assert!(!beam.is_empty());
        assert_eq!(beam.alive_count(), 3);
        assert_eq!(beam.ids(), &[0, 1, 2]);
        assert_eq!(beam.refractive_index(), 1.0);
        assert_eq!(beam.directions()[1], Vector3::z());
        assert!(RayBeam::default().is_empty());
    }
    #[test]
    fn push_ray() {
        let mut beam = RayBeam::default();
        let i = beam
            .push_ray(Point3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, -2.0))
            .unwrap();
        assert_eq!(i, 0);
        assert_eq!(beam.directions()[0], -Vector3::z());
        assert_eq!(beam.destinations()[0], Point3::new(0.0, 0.0, 1.0));
        assert_matches!(
            beam.push_ray(Point3::origin(), Vector3::zeros()),
            Err(OptraceError::Degenerate(_))
        );
        assert!(beam
            .push_ray(Point3::new(f64::NAN, 0.0, 0.0), Vector3::z())
            .is_err());
        assert_eq!(beam.len(), 1);
    }
    #[test]
    fn from_origins() {
        let origins = [Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        let beam = RayBeam::from_origins(&origins, Vector3::x()).unwrap();
        assert_eq!(beam.origins(), &origins);
        assert!(RayBeam::from_origins(&origins, Vector3::zeros()).is_err());
        let beam = RayBeam::from_directions(Point3::origin(), &[Vector3::x(), Vector3::y()]).unwrap();
        assert_eq!(beam.directions()[1], Vector3::y());
    }
    #[test]
    fn set_ray() {
        let mut beam = RayBeam::new(1);
        beam.set_ray(0, Point3::new(1.0, 2.0, 3.0), Vector3::x()).unwrap();
        assert_eq!(beam.origins()[0], Point3::new(1.0, 2.0, 3.0));
        assert!(beam.set_ray(1, Point3::origin(), Vector3::x()).is_err());
        assert!(beam.set_ray(0, Point3::origin(), Vector3::zeros()).is_err());
    }
    #[test]
    fn set_refractive_index() {
        let mut beam = RayBeam::new(1);
        assert!(beam.set_refractive_index(0.9).is_err());
        assert!(beam.set_refractive_index(f64::NAN).is_err());
        assert!(beam.set_refractive_index(f64::INFINITY).is_err());
        beam.set_refractive_index(1.5).unwrap();
        assert_eq!(beam.refractive_index(), 1.5);
    }
    #[test]
    fn set_wavelength() {
        let mut beam = RayBeam::new(2);
        beam.set_wavelength(nanometer!(633.0)).unwrap();
        assert_abs_diff_eq!(beam.wavelengths()[1], 633e-9);
        assert!(beam.set_wavelength(nanometer!(0.0)).is_err());
        assert!(beam.set_wavelength(nanometer!(-1.0)).is_err());
    }
    #[test]
    fn lifecycle() {
        let mut beam = RayBeam::new(3);
        beam.intercept(0);
        beam.prune(1);
        assert_eq!(beam.state(0), Some(RayState::Intercepted));
        assert_eq!(beam.intercepted_count(), 1);
        assert_eq!(beam.pruned_count(), 1);
        assert_eq!(beam.alive().collect_vec(), vec![2]);
        beam.advance();
        assert_eq!(beam.alive().collect_vec(), vec![0, 2]);
        beam.intercept(2);
        beam.unintercept_all();
        assert_eq!(beam.alive_count(), 2);
        assert_eq!(beam.state(5), None);
    }
    #[test]
    fn pruned_is_terminal() {
        let mut beam = RayBeam::new(1);
        beam.prune(0);
        beam.prune(0);
        beam.intercept(0);
        beam.advance();
        beam.unintercept_all();
        beam.record_hit(0, Point3::origin(), Vector3::z(), 1.0);
        assert!(beam.is_pruned(0));
        assert_eq!(beam.lengths()[0], 0.0);
    }
    #[test]
    fn record_hit() {
        let mut beam = RayBeam::new(1);
        beam.set_refractive_index(1.5).unwrap();
        beam.record_hit(0, Point3::new(0.0, 0.0, 2.0), Vector3::z(), 2.0);
        assert_eq!(beam.state(0), Some(RayState::Intercepted));
        assert_eq!(beam.destinations()[0], Point3::new(0.0, 0.0, 2.0));
        assert_eq!(beam.normals()[0], Vector3::z());
        assert_abs_diff_eq!(beam.lengths()[0], 2.0);
        assert_abs_diff_eq!(beam.optical_lengths()[0], 3.0);
        // origin only moves on the next step
        assert_eq!(beam.origins()[0], Point3::origin());
        beam.advance();
        assert_eq!(beam.origins()[0], Point3::new(0.0, 0.0, 2.0));
        // accumulators never decrease
        beam.record_hit(0, Point3::new(0.0, 0.0, 1.0), Vector3::z(), -1.0);
        assert_abs_diff_eq!(beam.lengths()[0], 2.0);
    }
    #[test]
    fn set_direction() {
        let mut beam = RayBeam::new(1);
        beam.set_direction(0, Vector3::new(3.0, 0.0, 0.0));
        assert_eq!(beam.directions()[0], Vector3::x());
        beam.set_direction(0, Vector3::zeros());
        assert_eq!(beam.directions()[0], Vector3::x());
    }
    #[test]
    fn statistics() {
        let stats = BoundaryStatistics {
            intercepted: 3,
            vignetted: 2,
            blocked: 1,
            total_internal_reflections: 0,
        };
        assert_eq!(stats.pruned(), 3);
        assert_eq!(BoundaryStatistics::default().pruned(), 0);
    }
}
