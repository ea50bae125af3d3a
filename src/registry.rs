//! Named factories for boundaries and heuristics.
//!
//! A [`Registry`] is built once by the application and handed to whatever instantiates boundaries by name
//! (e.g. [`Scenario::build`](crate::scenario::Scenario::build)). [`Registry::default`] knows all presets of
//! [`boundary::presets`](crate::boundary::presets) and the [`DummyHeuristic`].
//!
//! ```rust
//! use optrace::{properties::Properties, registry::Registry};
//!
//! let registry = Registry::default();
//! let props = Properties::default().with("radius", 0.01).with("curvature_radius", 0.2);
//! let mirror = registry.create_boundary("spherical_mirror", &props).unwrap();
//! assert_eq!(mirror.name(), "spherical mirror");
//! assert!(registry.create_boundary("hologram", &props).is_err());
//! ```
use crate::{
    boundary::{presets, MediumBoundary},
    em_interface::Transmission,
    error::{OptResult, OptraceError},
    heuristic::{DummyHeuristic, VisibilityHeuristic},
    meter,
    properties::Properties,
};
use log::debug;
use std::collections::BTreeMap;

/// Factory creating a boundary from its properties.
pub type BoundaryFactory = fn(&Properties) -> OptResult<MediumBoundary>;
/// Factory creating a visibility heuristic.
pub type HeuristicFactory = fn() -> Box<dyn VisibilityHeuristic>;

/// Explicit registry of boundary and heuristic factories.
#[derive(Debug, Clone)]
pub struct Registry {
    boundaries: BTreeMap<String, BoundaryFactory>,
    heuristics: BTreeMap<String, HeuristicFactory>,
}
impl Registry {
    /// Creates an empty [`Registry`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            boundaries: BTreeMap::new(),
            heuristics: BTreeMap::new(),
        }
    }
    /// Register a boundary factory.
    ///
    /// # Errors
    ///
    /// This function will return an error if a boundary factory with the same name already exists.
    pub fn register_boundary(&mut self, name: &str, factory: BoundaryFactory) -> OptResult<()> {
        if self.boundaries.contains_key(name) {
            return Err(OptraceError::Registry(format!(
                "boundary type '{name}' already registered"
            )));
        }
        self.boundaries.insert(name.into(), factory);
        Ok(())
    }
    /// Register a heuristic factory.
    ///
    /// # Errors
    ///
    /// This function will return an error if a heuristic factory with the same name already exists.
    pub fn register_heuristic(&mut self, name: &str, factory: HeuristicFactory) -> OptResult<()> {
        if self.heuristics.contains_key(name) {
            return Err(OptraceError::Registry(format!(
                "heuristic '{name}' already registered"
            )));
        }
        self.heuristics.insert(name.into(), factory);
        Ok(())
    }
    /// Names of all registered boundary types.
    pub fn boundary_types(&self) -> impl Iterator<Item = &str> {
        self.boundaries.keys().map(String::as_str)
    }
    /// Names of all registered heuristics.
    pub fn heuristic_types(&self) -> impl Iterator<Item = &str> {
        self.heuristics.keys().map(String::as_str)
    }
    /// Create a boundary of the given type.
    ///
    /// Every boundary type accepts an optional `transmission` probability replacing the transmission of the
    /// created boundary.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the type is unknown.
    ///   - a property is missing or invalid.
    pub fn create_boundary(&self, name: &str, props: &Properties) -> OptResult<MediumBoundary> {
        let factory = self.boundaries.get(name).ok_or_else(|| {
            OptraceError::Registry(format!("unknown boundary type '{name}'"))
        })?;
        let mut boundary = factory(props)?;
        if props.contains("transmission") {
            boundary.set_transmission(Transmission::from_probability(
                props.get_f64("transmission")?,
            )?);
        }
        debug!("created boundary of type {name}");
        Ok(boundary)
    }
    /// Create a heuristic of the given type.
    ///
    /// # Errors
    ///
    /// This function will return an error if the heuristic is unknown.
    pub fn create_heuristic(&self, name: &str) -> OptResult<Box<dyn VisibilityHeuristic>> {
        self.heuristics
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| OptraceError::Registry(format!("unknown heuristic '{name}'")))
    }
}
impl Default for Registry {
    fn default() -> Self {
        let boundaries: [(&str, BoundaryFactory); 15] = [
            ("flat_mirror", |p| presets::flat_mirror(p.get_length("radius")?)),
            ("spherical_mirror", |p| {
                presets::spherical_mirror(p.get_length("radius")?, p.get_length("curvature_radius")?)
            }),
            ("conic_mirror", |p| {
                presets::conic_mirror(
                    p.get_length("radius")?,
                    p.get_length("curvature_radius")?,
                    p.get_f64_or("conic", 0.0)?,
                    meter!(p.get_f64_or("hole", 0.0)?),
                )
            }),
            ("parabolic_mirror", |p| {
                presets::parabolic_mirror(p.get_length("radius")?, p.get_length("focal_length")?)
            }),
            ("window", |p| {
                presets::circular_window(p.get_length("radius")?, p.get_f64("n_in")?, p.get_f64("n_out")?)
            }),
            ("lens_surface", |p| {
                presets::conic_lens_surface(
                    p.get_length("radius")?,
                    p.get_length("curvature_radius")?,
                    p.get_f64_or("conic", 0.0)?,
                    p.get_f64("n_in")?,
                    p.get_f64("n_out")?,
                )
            }),
            ("ideal_lens", |p| {
                presets::ideal_lens(p.get_length("radius")?, p.get_length("focal_length")?)
            }),
            ("infinite_mirror", |_| Ok(presets::infinite_mirror())),
            ("lenslet_array", |p| {
                presets::lenslet_array(
                    p.get_length("width")?,
                    p.get_length("height")?,
                    p.get_usize("cols")?,
                    p.get_usize("rows")?,
                    p.get_length("curvature_radius")?,
                    p.get_f64_or("conic", 0.0)?,
                    p.get_f64("n_in")?,
                    p.get_f64("n_out")?,
                )
            }),
            ("obstruction", |p| presets::obstruction(p.get_length("radius")?)),
            ("obstruction_map", |p| {
                let cols = p.get_usize("cols")?;
                presets::obstruction_map(
                    p.get_length("width")?,
                    p.get_length("height")?,
                    p.get_f64_list("map")?.to_vec(),
                    cols,
                    p.get_usize("rows")?,
                    if p.contains("stride") {
                        p.get_usize("stride")?
                    } else {
                        cols
                    },
                )
            }),
            ("phase_screen", |p| {
                presets::phase_screen(
                    p.get_length("radius")?,
                    p.get_f64_list("coefficients")?,
                    p.get_f64_or("n_in", 1.0)?,
                    p.get_f64_or("n_out", 1.0)?,
                )
            }),
            ("rectangular_stop", |p| {
                presets::rectangular_stop(p.get_length("width")?, p.get_length("height")?)
            }),
            ("detector", |p| {
                presets::detector(p.get_length("width")?, p.get_length("height")?)
            }),
            ("partial_mirror", |p| {
                presets::partial_mirror(p.get_length("radius")?, p.get_f64("reflectivity")?)
            }),
        ];
        let mut registry = Self::new();
        for (name, factory) in boundaries {
            registry.boundaries.insert(name.into(), factory);
        }
        registry
            .heuristics
            .insert("dummy".into(), || Box::new(DummyHeuristic::default()));
        registry
    }
}
