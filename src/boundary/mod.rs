#![warn(missing_docs)]
//! Medium boundaries: a surface shape coupled to an electromagnetic behaviour.
//!
//! A [`MediumBoundary`] is anchored to a frame of the [`FrameTree`](crate::frame::FrameTree). During
//! [`MediumBoundary::process`] every alive ray of a [`RayBeam`] is transformed into the local frame, intersected
//! with the shape and, on success, handed to the [`EmInterface`]. Rays missing the aperture are pruned.
//!
//! ## Example
//! ```rust
//! use optrace::{boundary::presets, frame::Pose, random::RandomState, ray_beam::RayBeam, centimeter};
//! use nalgebra::{Point3, Vector3};
//!
//! let mirror = presets::flat_mirror(centimeter!(1.0)).unwrap();
//! let mut beam = RayBeam::from_origins(&[Point3::new(0.0, 0.0, 1.0)], -Vector3::z()).unwrap();
//! let stats = mirror.process(&mut beam, &Pose::identity(), &mut RandomState::default());
//! assert_eq!(stats.intercepted, 1);
//! assert_eq!(beam.directions()[0], Vector3::z());
//! ```
pub mod presets;

use crate::{
    em_interface::{
        Dielectric, EmInterface, Incidence, Interaction, Paraxial, PhaseScreen, Transmission,
    },
    error::{OptResult, OptraceError},
    frame::Pose,
    random::RandomState,
    ray_beam::{BoundaryStatistics, RayBeam},
    surface::{
        plane_intercept, CircularFlat, Conic, Intercept, Parabolic, RectangularFlat, SurfaceShape,
    },
};
use log::{debug, warn};
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;

/// A surface shape bound to an [`EmInterface`].
pub struct MediumBoundary {
    name: String,
    shape: Option<Box<dyn SurfaceShape>>,
    interface: Box<dyn EmInterface>,
    transmission: Transmission,
    complementary: bool,
}
impl MediumBoundary {
    /// Creates a new [`MediumBoundary`].
    ///
    /// A `shape` of `None` denotes the infinite local z = 0 plane. Rays which never reach this plane are
    /// processed in place (at their current origin).
    #[must_use]
    pub fn new(
        name: &str,
        shape: Option<Box<dyn SurfaceShape>>,
        interface: Box<dyn EmInterface>,
    ) -> Self {
        Self {
            name: name.into(),
            shape,
            interface,
            transmission: Transmission::default(),
            complementary: false,
        }
    }
    /// Set the [`Transmission`] of this boundary.
    #[must_use]
    pub fn with_transmission(mut self, transmission: Transmission) -> Self {
        self.transmission = transmission;
        self
    }
    /// Rename this boundary.
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.into();
        self
    }
    /// Invert the aperture test: rays hitting the shape are pruned, rays passing beside it are kept.
    #[must_use]
    pub const fn with_complementary(mut self, complementary: bool) -> Self {
        self.complementary = complementary;
        self
    }
    /// Returns the name of this [`MediumBoundary`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Returns the shape of this [`MediumBoundary`] (`None` for the infinite plane).
    #[must_use]
    pub fn shape(&self) -> Option<&dyn SurfaceShape> {
        self.shape.as_deref()
    }
    /// Returns the electromagnetic behaviour of this [`MediumBoundary`].
    #[must_use]
    pub fn interface(&self) -> &dyn EmInterface {
        self.interface.as_ref()
    }
    /// Returns the transmission of this [`MediumBoundary`].
    #[must_use]
    pub const fn transmission(&self) -> &Transmission {
        &self.transmission
    }
    /// Replace the transmission of this [`MediumBoundary`].
    pub fn set_transmission(&mut self, transmission: Transmission) {
        self.transmission = transmission;
    }
    /// Returns `true` if the aperture test is inverted.
    #[must_use]
    pub const fn is_complementary(&self) -> bool {
        self.complementary
    }
    /// Invert the aperture test.
    pub fn set_complementary(&mut self, complementary: bool) {
        self.complementary = complementary;
    }
    fn shape_mut(&mut self) -> OptResult<&mut Box<dyn SurfaceShape>> {
        let name = &self.name;
        self.shape.as_mut().ok_or_else(|| {
            OptraceError::Other(format!("{name}: the infinite plane has no shape parameters"))
        })
    }
    /// Mutable access to a [`Conic`] shape (radius, curvature radius, conic constant, hole, decenter).
    ///
    /// # Errors
    ///
    /// This function will return an error if the boundary has no conic shape.
    pub fn conic_mut(&mut self) -> OptResult<&mut Conic> {
        self.shape_mut()?.as_conic_mut()
    }
    /// Mutable access to a [`Parabolic`] shape (radius, focal length, hole, decenter).
    ///
    /// # Errors
    ///
    /// This function will return an error if the boundary has no parabolic shape.
    pub fn parabolic_mut(&mut self) -> OptResult<&mut Parabolic> {
        self.shape_mut()?.as_parabolic_mut()
    }
    /// Mutable access to a [`CircularFlat`] shape (radius, hole, eccentricity).
    ///
    /// # Errors
    ///
    /// This function will return an error if the boundary has no flat circular shape.
    pub fn circular_mut(&mut self) -> OptResult<&mut CircularFlat> {
        self.shape_mut()?.as_circular_mut()
    }
    /// Mutable access to a [`RectangularFlat`] shape (width, height, offset).
    ///
    /// # Errors
    ///
    /// This function will return an error if the boundary has no flat rectangular shape.
    pub fn rectangular_mut(&mut self) -> OptResult<&mut RectangularFlat> {
        self.shape_mut()?.as_rectangular_mut()
    }
    /// Mutable access to a [`Dielectric`] interface (refractive indices).
    ///
    /// # Errors
    ///
    /// This function will return an error if the boundary does not refract.
    pub fn dielectric_mut(&mut self) -> OptResult<&mut Dielectric> {
        self.interface.as_dielectric_mut()
    }
    /// Mutable access to a [`Paraxial`] interface (focal length).
    ///
    /// # Errors
    ///
    /// This function will return an error if the boundary is no ideal lens.
    pub fn paraxial_mut(&mut self) -> OptResult<&mut Paraxial> {
        self.interface.as_paraxial_mut()
    }
    /// Mutable access to a [`PhaseScreen`] interface (radius, Zernike coefficients, refractive indices).
    ///
    /// # Errors
    ///
    /// This function will return an error if the boundary is no phase screen.
    pub fn phase_screen_mut(&mut self) -> OptResult<&mut PhaseScreen> {
        self.interface.as_phase_screen_mut()
    }
    fn intercept(
        &self,
        origin: &Point3<f64>,
        direction: &Vector3<f64>,
    ) -> Option<Intercept> {
        self.shape.as_ref().map_or_else(
            || {
                let (point, distance) =
                    plane_intercept(origin, direction).unwrap_or((*origin, 0.0));
                Some(Intercept {
                    point,
                    normal: Vector3::z(),
                    distance,
                    inside: true,
                })
            },
            |shape| shape.intercept(origin, direction),
        )
    }
    /// Propagate all alive rays of the beam to this boundary placed at `pose`.
    ///
    /// Rays intercepted by the previous boundary continue from their last hit point. For every alive ray:
    ///   - a ray missing the aperture (or hitting it if the boundary is complementary) is pruned (vignetted).
    ///   - otherwise its path lengths are updated with the incoming refractive index and the hit point and
    ///     normal are stored.
    ///   - a ray not transmitted or absorbed by the interface is pruned (blocked).
    ///   - otherwise its direction is replaced by the one given by the interface.
    ///
    /// The refractive index of the beam is set to the medium the last redirected ray continues in.
    pub fn process(
        &self,
        beam: &mut RayBeam,
        pose: &Pose,
        rng: &mut RandomState,
    ) -> BoundaryStatistics {
        beam.advance();
        let mut stats = BoundaryStatistics::default();
        let mut medium = None;
        let alive: Vec<usize> = beam.alive().collect();
        for i in alive {
            let origin = pose.to_relative(&beam.origins()[i]);
            let direction = pose.to_relative_vec(&beam.directions()[i]);
            let Some(hit) = self
                .intercept(&origin, &direction)
                .filter(|hit| hit.inside != self.complementary)
            else {
                beam.prune(i);
                stats.vignetted += 1;
                continue;
            };
            beam.record_hit(
                i,
                pose.from_relative(&hit.point),
                pose.from_relative_vec(&hit.normal),
                hit.distance,
            );
            if !self.transmission.transmits(&hit.point, rng) {
                beam.prune(i);
                stats.blocked += 1;
                continue;
            }
            let incidence = Incidence {
                point: hit.point,
                normal: hit.normal,
                direction,
                refractive_index: beam.refractive_index(),
            };
            match self.interface.interact(&incidence) {
                Interaction::Redirected {
                    direction,
                    refractive_index,
                } => {
                    beam.set_direction(i, pose.from_relative_vec(&direction));
                    medium = Some(refractive_index);
                    stats.intercepted += 1;
                }
                Interaction::TotalInternalReflection { direction } => {
                    stats.total_internal_reflections += 1;
                    if let Some(direction) = direction {
                        beam.set_direction(i, pose.from_relative_vec(&direction));
                        stats.intercepted += 1;
                    } else {
                        beam.prune(i);
                        stats.blocked += 1;
                    }
                }
                Interaction::Absorbed => {
                    beam.prune(i);
                    stats.blocked += 1;
                }
            }
        }
        if let Some(refractive_index) = medium {
            if let Err(e) = beam.set_refractive_index(refractive_index) {
                warn!("{}: {e}", self.name);
            }
        }
        if stats.total_internal_reflections > 0 {
            warn!(
                "{}: {} ray(s) totally internally reflected",
                self.name, stats.total_internal_reflections
            );
        }
        debug!("{}: {stats:?}", self.name);
        stats
    }
}
impl Debug for MediumBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediumBoundary")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("interface", &self.interface)
            .field("transmission", &self.transmission)
            .field("complementary", &self.complementary)
            .finish()
    }
}
