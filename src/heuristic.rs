//! Selection of candidate boundaries for a trace pass.
use crate::{ray_beam::RayBeam, tracer::PlacedBoundary};
use std::fmt::Debug;

/// Decides which boundaries a beam is tested against and in which order.
///
/// [`VisibilityHeuristic::update_visibility`] is called once at the start of every trace pass. The tracer then
/// processes the boundaries listed by [`VisibilityHeuristic::visible`] (as indices into the boundary list) in
/// that order.
pub trait VisibilityHeuristic: Send + Sync {
    /// Recompute the list of candidate boundaries for the given beam.
    fn update_visibility(&mut self, beam: &RayBeam, boundaries: &[PlacedBoundary]);
    /// Indices of the candidate boundaries in processing order.
    fn visible(&self) -> &[usize];
    /// Name of this heuristic.
    fn name(&self) -> String;
}
impl Debug for dyn VisibilityHeuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} heuristic", self.name())
    }
}

/// Heuristic declaring every boundary visible, in the order they were added.
#[derive(Debug, Default, Clone)]
pub struct DummyHeuristic {
    visible: Vec<usize>,
}
impl VisibilityHeuristic for DummyHeuristic {
    fn update_visibility(&mut self, _beam: &RayBeam, boundaries: &[PlacedBoundary]) {
        self.visible = (0..boundaries.len()).collect();
    }
    fn visible(&self) -> &[usize] {
        &self.visible
    }
    fn name(&self) -> String {
        "dummy".into()
    }
}
