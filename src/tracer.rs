//! Minimal driver tracing a beam through a sequence of placed boundaries.
use crate::{
    boundary::MediumBoundary,
    error::{OptResult, OptraceError},
    frame::{FrameId, FrameTree},
    heuristic::{DummyHeuristic, VisibilityHeuristic},
    random::RandomState,
    ray_beam::{BoundaryStatistics, RayBeam, RayState},
};
use kahan::KahanSummator;
use log::{debug, info};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A [`MediumBoundary`] attached to a frame.
#[derive(Debug)]
pub struct PlacedBoundary {
    name: String,
    frame: FrameId,
    boundary: MediumBoundary,
}
impl PlacedBoundary {
    /// Creates a new [`PlacedBoundary`].
    #[must_use]
    pub fn new(name: &str, frame: FrameId, boundary: MediumBoundary) -> Self {
        Self {
            name: name.into(),
            frame,
            boundary: boundary.with_name(name),
        }
    }
    /// Returns the name of this [`PlacedBoundary`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Returns the frame this boundary is attached to.
    #[must_use]
    pub const fn frame(&self) -> FrameId {
        self.frame
    }
    /// Returns the boundary.
    #[must_use]
    pub const fn boundary(&self) -> &MediumBoundary {
        &self.boundary
    }
}

/// Statistics of a single boundary during a trace pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryReport {
    /// name of the boundary
    pub name: String,
    /// name of the frame the boundary is attached to
    pub frame: String,
    /// counters of the pass
    pub statistics: BoundaryStatistics,
}

/// Result of a trace pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceReport {
    /// seed of the random generator
    pub seed: u64,
    /// number of rays of the beam
    pub nr_of_rays: usize,
    /// processed boundaries in processing order
    pub boundaries: Vec<BoundaryReport>,
    /// rays alive after the pass (never stopped by a boundary)
    pub alive: usize,
    /// rays which hit the last boundary they were tested against
    pub intercepted: usize,
    /// rays removed from the beam
    pub pruned: usize,
    /// refractive index of the medium the beam ends in
    pub refractive_index: f64,
    /// centroid of the last hit points of the intercepted rays (in meters)
    pub centroid: Option<Point3<f64>>,
    /// rms distance of these hit points from their centroid (in meters)
    pub rms_radius: Option<f64>,
}

/// Owner of the frames and boundaries of an optical bench.
#[derive(Debug)]
pub struct Tracer {
    frames: FrameTree,
    boundaries: Vec<PlacedBoundary>,
    heuristic: Box<dyn VisibilityHeuristic>,
    rng: RandomState,
}
impl Default for Tracer {
    fn default() -> Self {
        Self::new(FrameTree::new())
    }
}
impl Tracer {
    /// Creates a new [`Tracer`] for the given frames using the [`DummyHeuristic`] and a default seeded generator.
    #[must_use]
    pub fn new(frames: FrameTree) -> Self {
        Self {
            frames,
            boundaries: Vec::new(),
            heuristic: Box::new(DummyHeuristic::default()),
            rng: RandomState::default(),
        }
    }
    /// Returns the frames of this [`Tracer`].
    #[must_use]
    pub const fn frames(&self) -> &FrameTree {
        &self.frames
    }
    /// Returns the frames of this [`Tracer`] for modification (e.g. to move an axis between passes).
    pub fn frames_mut(&mut self) -> &mut FrameTree {
        &mut self.frames
    }
    /// Returns the placed boundaries.
    #[must_use]
    pub fn boundaries(&self) -> &[PlacedBoundary] {
        &self.boundaries
    }
    /// Find a boundary index by name.
    #[must_use]
    pub fn boundary_by_name(&self, name: &str) -> Option<usize> {
        self.boundaries.iter().position(|b| b.name == name)
    }
    /// Attach a boundary to a frame. Returns the index of the boundary.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the frame is unknown.
    ///   - a boundary with the same name already exists.
    pub fn add_boundary(
        &mut self,
        name: &str,
        frame: FrameId,
        boundary: MediumBoundary,
    ) -> OptResult<usize> {
        self.frames.name(frame)?;
        if self.boundary_by_name(name).is_some() {
            return Err(OptraceError::Configuration(format!(
                "boundary '{name}' already exists"
            )));
        }
        self.boundaries
            .push(PlacedBoundary::new(name, frame, boundary));
        Ok(self.boundaries.len() - 1)
    }
    /// Returns the visibility heuristic.
    #[must_use]
    pub fn heuristic(&self) -> &dyn VisibilityHeuristic {
        self.heuristic.as_ref()
    }
    /// Replace the visibility heuristic.
    pub fn set_heuristic(&mut self, heuristic: Box<dyn VisibilityHeuristic>) {
        self.heuristic = heuristic;
    }
    /// Returns the random generator shared by all boundaries and samplers of this bench.
    pub fn rng_mut(&mut self) -> &mut RandomState {
        &mut self.rng
    }
    /// Reseed the random generator.
    pub fn set_seed(&mut self, seed: u64) {
        self.rng.set_seed(seed);
    }
    /// Trace the beam through all candidate boundaries.
    ///
    /// All stale frames are recalculated first. The heuristic then lists the candidate boundaries which are
    /// processed in that order.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - a frame cannot be resolved (e.g. a degenerate tripod).
    ///   - the heuristic lists an unknown boundary.
    pub fn trace(&mut self, beam: &mut RayBeam) -> OptResult<TraceReport> {
        self.frames.recalculate()?;
        self.heuristic.update_visibility(beam, &self.boundaries);
        let mut reports = Vec::with_capacity(self.heuristic.visible().len());
        for index in self.heuristic.visible() {
            let placed = self.boundaries.get(*index).ok_or_else(|| {
                OptraceError::Other(format!("heuristic selected unknown boundary {index}"))
            })?;
            let pose = self.frames.pose(placed.frame)?;
            let statistics = placed.boundary.process(beam, pose, &mut self.rng);
            reports.push(BoundaryReport {
                name: placed.name.clone(),
                frame: self.frames.name(placed.frame)?.to_owned(),
                statistics,
            });
        }
        let report = TraceReport {
            seed: self.rng.seed(),
            nr_of_rays: beam.len(),
            boundaries: reports,
            alive: beam.alive_count(),
            intercepted: beam.intercepted_count(),
            pruned: beam.pruned_count(),
            refractive_index: beam.refractive_index(),
            centroid: centroid(beam),
            rms_radius: rms_radius(beam),
        };
        info!(
            "traced {} rays through {} boundaries: {} intercepted, {} pruned",
            report.nr_of_rays,
            report.boundaries.len(),
            report.intercepted,
            report.pruned
        );
        debug!("final refractive index {}", report.refractive_index);
        Ok(report)
    }
}

fn hit_points(beam: &RayBeam) -> Vec<Point3<f64>> {
    beam.states()
        .iter()
        .zip(beam.destinations())
        .filter(|(state, _)| **state == RayState::Intercepted)
        .map(|(_, p)| *p)
        .collect()
}
fn centroid(beam: &RayBeam) -> Option<Point3<f64>> {
    let points = hit_points(beam);
    if points.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let coordinate = |c: usize| -> f64 {
        let values: Vec<f64> = points.iter().map(|p| p[c]).collect();
        let sum: f64 = values.iter().kahan_sum().sum();
        sum / n
    };
    Some(Point3::new(coordinate(0), coordinate(1), coordinate(2)))
}
fn rms_radius(beam: &RayBeam) -> Option<f64> {
    let center = centroid(beam)?;
    let points = hit_points(beam);
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let squares: Vec<f64> = points
        .iter()
        .map(|p| (p - center).norm_squared())
        .collect();
    let sum: f64 = squares.iter().kahan_sum().sum();
    Some((sum / n).sqrt())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        boundary::presets, centimeter, degree, frame::RotationAxis, meter, millimeter,
        utils::test_helper::test_helper::check_warnings,
    };
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use nalgebra::Vector3;
    fn collimated(n: usize, z: f64) -> RayBeam {
        let origins: Vec<_> = (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let x = (i as f64).mul_add(0.001, -0.002);
                Point3::new(x, 0.0, z)
            })
            .collect();
        RayBeam::from_origins(&origins, -Vector3::z()).unwrap()
    }
    #[test]
    fn add_boundary() {
        let mut tracer = Tracer::default();
        let world = tracer.frames().world();
        assert_eq!(
            tracer
                .add_boundary("m1", world, presets::flat_mirror(centimeter!(1.0)).unwrap())
                .unwrap(),
            0
        );
        assert_matches!(
            tracer.add_boundary("m1", world, presets::infinite_mirror()),
            Err(OptraceError::Configuration(_))
        );
        let mut other = FrameTree::new();
        let foreign = other
            .add_translated(other.world(), "a", meter!(0.0, 0.0, 1.0))
            .unwrap();
        assert!(tracer
            .add_boundary("m2", foreign, presets::infinite_mirror())
            .is_err());
        assert_eq!(tracer.boundary_by_name("m1"), Some(0));
        assert_eq!(tracer.boundaries()[0].boundary().name(), "m1");
        assert_eq!(tracer.heuristic().name(), "dummy");
    }
    #[test]
    fn empty() {
        let mut tracer = Tracer::default();
        let mut beam = collimated(3, 1.0);
        let report = tracer.trace(&mut beam).unwrap();
        assert!(report.boundaries.is_empty());
        assert_eq!(report.alive, 3);
        assert_eq!(report.centroid, None);
        assert_eq!(report.rms_radius, None);
    }
    #[test]
    fn mirror_then_detector() {
        let mut frames = FrameTree::new();
        let mirror = frames
            .add_translated(frames.world(), "mirror", meter!(0.0, 0.0, 0.0))
            .unwrap();
        let detector = frames
            .add_translated(frames.world(), "detector", millimeter!(0.0, 0.0, 50.0))
            .unwrap();
        let detector = frames
            .add_rotated_about(detector, "detector flip", RotationAxis::X, degree!(180.0))
            .unwrap();
        let mut tracer = Tracer::new(frames);
        let m1 = presets::spherical_mirror(centimeter!(1.0), meter!(0.1)).unwrap();
        tracer.add_boundary("m1", mirror, m1).unwrap();
        let ccd = presets::detector(centimeter!(2.0), centimeter!(2.0)).unwrap();
        tracer.add_boundary("ccd", detector, ccd).unwrap();
        let mut beam = collimated(5, 1.0);
        let report = tracer.trace(&mut beam).unwrap();
        assert_eq!(report.boundaries.len(), 2);
        assert_eq!(report.boundaries[0].name, "m1");
        assert_eq!(report.boundaries[1].frame, "detector flip");
        assert_eq!(report.boundaries[1].statistics.intercepted, 5);
        assert_eq!(report.intercepted, 5);
        assert_eq!(report.pruned, 0);
        // detector sits in the focal plane
        let centroid = report.centroid.unwrap();
        assert_abs_diff_eq!(centroid.z, 0.05, epsilon = 1e-9);
        assert!(report.rms_radius.unwrap() < 1e-6);
    }
    #[test]
    fn moved_frame_is_recalculated() {
        let mut frames = FrameTree::new();
        let stage = frames
            .add_translated(frames.world(), "stage", meter!(0.0, 0.0, 0.0))
            .unwrap();
        let mut tracer = Tracer::new(frames);
        let stop = presets::detector(centimeter!(1.0), centimeter!(1.0)).unwrap();
        tracer.add_boundary("stop", stage, stop).unwrap();
        tracer
            .frames_mut()
            .set_offset(stage, millimeter!(0.0, 0.0, 100.0))
            .unwrap();
        let mut beam = collimated(1, 1.0);
        beam.set_ray(0, Point3::new(0.0, 0.0, 1.0), -Vector3::z()).unwrap();
        let report = tracer.trace(&mut beam).unwrap();
        assert_eq!(report.intercepted, 1);
        assert_abs_diff_eq!(beam.destinations()[0].z, 0.1, epsilon = 1e-12);
    }
    #[test]
    fn total_internal_reflection_is_reported() {
        testing_logger::setup();
        let mut tracer = Tracer::default();
        let world = tracer.frames().world();
        let glass = presets::circular_window(meter!(10.0), 1.0, 1.5).unwrap();
        tracer.add_boundary("glass", world, glass).unwrap();
        let mut beam = RayBeam::default();
        // leaving the glass towards +z at a steep angle
        beam.push_ray(Point3::new(0.0, 0.0, -1.0), Vector3::new(1.0, 0.0, 1.0))
            .unwrap();
        let report = tracer.trace(&mut beam).unwrap();
        assert_eq!(report.boundaries[0].statistics.total_internal_reflections, 1);
        check_warnings(vec!["glass: 1 ray(s) totally internally reflected"]);
    }
    #[test]
    fn report_to_yaml() {
        let mut tracer = Tracer::default();
        let world = tracer.frames().world();
        tracer
            .add_boundary("m", world, presets::infinite_mirror())
            .unwrap();
        let mut beam = collimated(2, 1.0);
        let report = tracer.trace(&mut beam).unwrap();
        let yaml = serde_yaml::to_string(&report).unwrap();
        assert!(yaml.contains("name: m"));
        assert!(yaml.contains("intercepted: 2"));
    }
}
