//! YAML description of an optical bench and its light source.
//!
//! Lengths are given in meters, angles in degrees. The world frame is always present and named `world`.
//!
//! ```yaml
//! seed: 42
//! frames:
//!   - name: mount
//!     kind: translated
//!     offset: [0.0, 0.0, -0.1]
//! boundaries:
//!   - name: primary
//!     type: spherical_mirror
//!     frame: mount
//!     properties:
//!       radius: 0.02
//!       curvature_radius: 0.4
//! source:
//!   sampler: circular
//!   radius: 0.01
//!   nr_of_rays: 100
//!   center: [0.0, 0.0, 0.5]
//!   direction: [0.0, 0.0, -1.0]
//! ```
use crate::{
    degree,
    error::{OptResult, OptraceError},
    frame::{tripod, FrameId, FrameTree},
    meter,
    properties::Properties,
    random::DEFAULT_SEED,
    ray_beam::RayBeam,
    registry::Registry,
    sampler::{SamplerKind, SkySampler, SkyShape},
    tracer::Tracer,
};
use log::{info, warn};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

/// Geometry of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameGeometry {
    /// shifted along the parent's axes
    Translated {
        /// offset in meters
        offset: [f64; 3],
    },
    /// rotated around an axis given in the parent's coordinates
    Rotated {
        /// rotation axis
        axis: [f64; 3],
        /// rotation angle in degrees
        angle: f64,
    },
    /// platform on three legs
    Tripod {
        /// leg lengths in meters
        legs: [f64; 3],
        /// cone angle between legs one and two in degrees
        #[serde(default = "default_cone_angle")]
        cone_angle: f64,
        /// radius of the leg circle in meters
        #[serde(default = "default_leg_radius")]
        radius: f64,
    },
}
const fn default_cone_angle() -> f64 {
    tripod::DEFAULT_ANGLE_DEG
}
const fn default_leg_radius() -> f64 {
    tripod::DEFAULT_RADIUS
}

/// A frame entry of a [`Scenario`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEntry {
    /// unique name of the frame
    pub name: String,
    /// name of the parent frame
    #[serde(default = "default_frame")]
    pub parent: String,
    /// kind and parameters
    #[serde(flatten)]
    pub geometry: FrameGeometry,
}

/// A boundary entry of a [`Scenario`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryEntry {
    /// unique name of the boundary
    pub name: String,
    /// registered boundary type
    #[serde(rename = "type")]
    pub boundary_type: String,
    /// name of the frame the boundary is attached to
    #[serde(default = "default_frame")]
    pub frame: String,
    /// parameters handed to the boundary factory
    #[serde(default)]
    pub properties: Properties,
}

/// Angular distribution of the source directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyEntry {
    /// shape of the source on the sky
    #[serde(default)]
    pub shape: SkyShape,
    /// angular diameter in degrees
    #[serde(default = "default_sky_diameter")]
    pub diameter: f64,
    /// draw directions randomly
    #[serde(default)]
    pub random: bool,
    /// intensity map of an extended source
    #[serde(default)]
    pub map: Option<PathBuf>,
}
const fn default_sky_diameter() -> f64 {
    30.0
}

/// Ray source of a [`Scenario`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// aperture sampler
    #[serde(default)]
    pub sampler: SamplerKind,
    /// aperture radius in meters
    pub radius: f64,
    /// draw origins randomly
    #[serde(default)]
    pub random: bool,
    /// requested number of rays
    pub nr_of_rays: usize,
    /// frame the source is given in
    #[serde(default = "default_frame")]
    pub frame: String,
    /// center of the aperture in the source frame (meters)
    #[serde(default)]
    pub center: [f64; 3],
    /// propagation direction (central axis of the sky) in the source frame
    #[serde(default = "default_direction")]
    pub direction: [f64; 3],
    /// wavelength in meters
    #[serde(default = "default_wavelength")]
    pub wavelength: f64,
    /// intensity map of a map sampler
    #[serde(default)]
    pub map: Option<PathBuf>,
    /// optional angular spread of the directions
    #[serde(default)]
    pub sky: Option<SkyEntry>,
}
fn default_frame() -> String {
    "world".into()
}
const fn default_direction() -> [f64; 3] {
    [0.0, 0.0, -1.0]
}
const fn default_wavelength() -> f64 {
    1.0e-6
}
const fn default_seed() -> u64 {
    DEFAULT_SEED
}
const fn default_refractive_index() -> f64 {
    1.0
}
fn default_heuristic() -> String {
    "dummy".into()
}

/// Complete description of an optical bench together with its light source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_seed")]
    seed: u64,
    #[serde(default = "default_refractive_index")]
    refractive_index: f64,
    #[serde(default = "default_heuristic")]
    heuristic: String,
    #[serde(default)]
    frames: Vec<FrameEntry>,
    #[serde(default)]
    boundaries: Vec<BoundaryEntry>,
    source: SourceEntry,
}
impl Scenario {
    /// Read a scenario from a YAML file.
    ///
    /// # Errors
    ///
    /// This function will return an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> OptResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            OptraceError::Scenario(format!("cannot read file {}: {e}", path.display()))
        })?;
        let scenario = Self::from_string(&contents)?;
        info!("loaded scenario {}", path.display());
        Ok(scenario)
    }
    /// Parse a scenario from a YAML string.
    ///
    /// # Errors
    ///
    /// This function will return an error if the string cannot be parsed.
    pub fn from_string(yaml: &str) -> OptResult<Self> {
        let scenario: Self = serde_yaml::from_str(yaml)
            .map_err(|e| OptraceError::Scenario(format!("parsing of scenario failed: {e}")))?;
        info!(
            "scenario with {} frame(s) and {} boundary(ies)",
            scenario.frames.len(),
            scenario.boundaries.len()
        );
        Ok(scenario)
    }
    /// Returns the seed of the random generator.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
    /// Override the seed of the random generator.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }
    /// Returns the requested number of rays.
    #[must_use]
    pub const fn nr_of_rays(&self) -> usize {
        self.source.nr_of_rays
    }
    /// Override the requested number of rays.
    ///
    /// # Errors
    ///
    /// This function will return an error if the number is zero.
    pub fn set_nr_of_rays(&mut self, nr_of_rays: usize) -> OptResult<()> {
        if nr_of_rays == 0 {
            return Err(OptraceError::Scenario("number of rays must be > 0".into()));
        }
        self.source.nr_of_rays = nr_of_rays;
        Ok(())
    }
    /// Returns the frame entries.
    #[must_use]
    pub fn frames(&self) -> &[FrameEntry] {
        &self.frames
    }
    /// Returns the boundary entries.
    #[must_use]
    pub fn boundaries(&self) -> &[BoundaryEntry] {
        &self.boundaries
    }
    /// Returns the source entry.
    #[must_use]
    pub const fn source(&self) -> &SourceEntry {
        &self.source
    }
    /// Build the tracer and the initial beam.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - a frame, boundary or heuristic cannot be created.
    ///   - a name refers to an unknown frame.
    ///   - the source cannot be sampled.
    pub fn build(&self, registry: &Registry) -> OptResult<(Tracer, RayBeam)> {
        let mut frames = FrameTree::new();
        for entry in &self.frames {
            add_frame(&mut frames, entry)?;
        }
        frames.recalculate()?;
        let mut tracer = Tracer::new(frames);
        tracer.set_seed(self.seed);
        tracer.set_heuristic(registry.create_heuristic(&self.heuristic)?);
        for entry in &self.boundaries {
            let frame = frame_id(tracer.frames(), &entry.frame)?;
            let boundary = registry.create_boundary(&entry.boundary_type, &entry.properties)?;
            tracer.add_boundary(&entry.name, frame, boundary)?;
        }
        let beam = self.build_beam(&mut tracer)?;
        info!(
            "built {} boundaries and a beam of {} rays",
            tracer.boundaries().len(),
            beam.len()
        );
        Ok((tracer, beam))
    }
    fn build_beam(&self, tracer: &mut Tracer) -> OptResult<RayBeam> {
        let source = &self.source;
        let pose = *tracer.frames().pose(frame_id(tracer.frames(), &source.frame)?)?;
        let mut sampler = source
            .sampler
            .build(meter!(source.radius), source.random, source.map.as_deref())?;
        let system = pose.orientation().into_inner();
        let center = pose.from_relative(&Point3::from(source.center));
        let origins = sampler.sample_in(source.nr_of_rays, &system, &center, tracer.rng_mut())?;
        let axis = Vector3::from(source.direction);
        let mut beam = if let Some(sky_entry) = &source.sky {
            let mut sky = SkySampler::default();
            sky.set_shape(sky_entry.shape);
            sky.set_diameter(degree!(sky_entry.diameter))?;
            sky.set_axis(axis)?;
            sky.set_random(sky_entry.random);
            sky.set_map(sky_entry.map.clone());
            sky.set_nr_of_rays(origins.len().max(1))?;
            let mut beam = RayBeam::default();
            let mut unresolved = 0;
            for origin in origins {
                if let Some(direction) = sky.get(tracer.rng_mut())? {
                    beam.push_ray(origin, pose.from_relative_vec(&direction))?;
                } else {
                    unresolved += 1;
                    let index = beam.push_ray(origin, pose.from_relative_vec(&axis))?;
                    beam.prune(index);
                }
            }
            if unresolved > 0 {
                warn!("{unresolved} ray(s) pruned by an unresolved sky sampler");
            }
            beam
        } else {
            RayBeam::from_origins(&origins, pose.from_relative_vec(&axis))?
        };
        beam.set_wavelength(meter!(source.wavelength))?;
        beam.set_refractive_index(self.refractive_index)?;
        Ok(beam)
    }
}

fn frame_id(frames: &FrameTree, name: &str) -> OptResult<FrameId> {
    frames
        .frame_by_name(name)
        .ok_or_else(|| OptraceError::Scenario(format!("unknown frame '{name}'")))
}
fn add_frame(frames: &mut FrameTree, entry: &FrameEntry) -> OptResult<FrameId> {
    let parent = frame_id(frames, &entry.parent)?;
    match &entry.geometry {
        FrameGeometry::Translated { offset } => frames.add_translated(
            parent,
            &entry.name,
            meter!(offset[0], offset[1], offset[2]),
        ),
        FrameGeometry::Rotated { axis, angle } => {
            frames.add_rotated(parent, &entry.name, Vector3::from(*axis), degree!(*angle))
        }
        FrameGeometry::Tripod {
            legs,
            cone_angle,
            radius,
        } => {
            let id = frames.add_tripod(
                parent,
                &entry.name,
                [meter!(legs[0]), meter!(legs[1]), meter!(legs[2])],
            )?;
            frames.set_tripod_geometry(id, degree!(*cone_angle), meter!(*radius))?;
            Ok(id)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ray_beam::RayState, utils::test_helper::test_helper::check_warnings};
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    const MINIMAL: &str = "source:\n  radius: 0.01\n  nr_of_rays: 10\n";
    #[test]
    fn defaults() {
        let scenario = Scenario::from_string(MINIMAL).unwrap();
        assert_eq!(scenario.seed(), DEFAULT_SEED);
        assert_eq!(scenario.nr_of_rays(), 10);
        assert!(scenario.frames().is_empty());
        assert!(scenario.boundaries().is_empty());
        let source = scenario.source();
        assert_eq!(source.sampler, SamplerKind::Circular);
        assert_eq!(source.frame, "world");
        assert_eq!(source.direction, [0.0, 0.0, -1.0]);
        assert!(source.sky.is_none());
    }
    #[test]
    fn parse_errors() {
        assert_matches!(Scenario::from_string("seed: 1"), Err(OptraceError::Scenario(_)));
        assert_matches!(
            Scenario::from_string("source: [1, 2]"),
            Err(OptraceError::Scenario(_))
        );
        assert_matches!(
            Scenario::from_file(Path::new("files_for_testing/nonexistent.yaml")),
            Err(OptraceError::Scenario(_))
        );
    }
    #[test]
    fn overrides() {
        let mut scenario = Scenario::from_string(MINIMAL).unwrap();
        scenario.set_seed(7);
        assert_eq!(scenario.seed(), 7);
        assert!(scenario.set_nr_of_rays(0).is_err());
        scenario.set_nr_of_rays(20).unwrap();
        let (mut tracer, beam) = scenario.build(&Registry::default()).unwrap();
        assert_eq!(beam.len(), 20);
        assert_eq!(tracer.rng_mut().seed(), 7);
    }
    #[test]
    fn frames() {
        let yaml = "
frames:
  - name: stage
    kind: translated
    offset: [0.0, 0.0, 0.1]
  - name: tilt
    parent: stage
    kind: rotated
    axis: [1.0, 0.0, 0.0]
    angle: 90.0
  - name: mount
    parent: tilt
    kind: tripod
    legs: [0.02, 0.02, 0.02]
source:
  radius: 0.0
  sampler: point
  nr_of_rays: 1
";
        let scenario = Scenario::from_string(yaml).unwrap();
        assert_matches!(scenario.frames()[2].geometry, FrameGeometry::Tripod { .. });
        let (tracer, _) = scenario.build(&Registry::default()).unwrap();
        let frames = tracer.frames();
        assert_eq!(frames.len(), 4);
        let tilt = frames.frame_by_name("tilt").unwrap();
        let pose = frames.pose(tilt).unwrap();
        assert_abs_diff_eq!(pose.center().z, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(pose.e_z(), -Vector3::y(), epsilon = 1e-12);
    }
    #[test]
    fn unknown_names() {
        let unknown_parent = "
frames:
  - name: stage
    parent: bench
    kind: translated
    offset: [0.0, 0.0, 0.1]
source:
  radius: 0.01
  nr_of_rays: 1
";
        let scenario = Scenario::from_string(unknown_parent).unwrap();
        assert_matches!(
            scenario.build(&Registry::default()),
            Err(OptraceError::Scenario(_))
        );
        let unknown_type = "
boundaries:
  - name: m
    type: hologram
source:
  radius: 0.01
  nr_of_rays: 1
";
        let scenario = Scenario::from_string(unknown_type).unwrap();
        assert_matches!(
            scenario.build(&Registry::default()),
            Err(OptraceError::Registry(_))
        );
    }
    #[test]
    fn source_in_rotated_frame() {
        let yaml = "
frames:
  - name: turned
    kind: rotated
    axis: [0.0, 1.0, 0.0]
    angle: 90.0
source:
  sampler: ring
  radius: 0.01
  nr_of_rays: 4
  frame: turned
  center: [0.0, 0.0, 1.0]
  wavelength: 5.0e-7
refractive_index: 1.5
";
        let (_, beam) = Scenario::from_string(yaml)
            .unwrap()
            .build(&Registry::default())
            .unwrap();
        assert_eq!(beam.len(), 4);
        assert_abs_diff_eq!(beam.refractive_index(), 1.5);
        assert_abs_diff_eq!(beam.wavelengths()[0], 5.0e-7);
        for (origin, direction) in beam.origins().iter().zip(beam.directions()) {
            // local z is world x
            assert_abs_diff_eq!(*direction, -Vector3::x(), epsilon = 1e-12);
            assert_abs_diff_eq!(origin.x, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(origin.y.hypot(origin.z), 0.01, epsilon = 1e-12);
        }
    }
    #[test]
    fn sky_source() {
        let yaml = "
source:
  sampler: point
  radius: 0.0
  nr_of_rays: 50
  sky:
    shape: circle_like
    diameter: 2.0
";
        let (_, beam) = Scenario::from_string(yaml)
            .unwrap()
            .build(&Registry::default())
            .unwrap();
        assert_eq!(beam.len(), 50);
        assert_eq!(beam.alive_count(), 50);
        let half = 1.0_f64.to_radians();
        assert!(beam
            .directions()
            .iter()
            .all(|d| d.angle(&-Vector3::z()) <= half + 1e-12));
    }
    #[test]
    fn sky_source_needs_map() {
        testing_logger::setup();
        let yaml = "
source:
  radius: 0.01
  nr_of_rays: 5
  sky:
    shape: extended
";
        let scenario = Scenario::from_string(yaml).unwrap();
        assert_matches!(
            scenario.build(&Registry::default()),
            Err(OptraceError::Sampler(_))
        );
        check_warnings(vec![]);
    }
    #[test]
    fn from_file() {
        let scenario = Scenario::from_file(Path::new("files_for_testing/newtonian.yaml")).unwrap();
        assert_eq!(scenario.seed(), 42);
        let (mut tracer, mut beam) = scenario.build(&Registry::default()).unwrap();
        assert_eq!(tracer.boundaries().len(), 3);
        let report = tracer.trace(&mut beam).unwrap();
        assert_eq!(report.boundaries.len(), 3);
        // secondary mirror shadows the center of the primary
        assert!(report.boundaries[0].statistics.vignetted > 0);
        assert!(report.intercepted > 0);
        assert_eq!(report.intercepted + report.pruned + report.alive, beam.len());
        assert!(beam.states().iter().any(|s| *s == RayState::Pruned));
    }
}
