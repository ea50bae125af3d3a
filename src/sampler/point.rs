//! Degenerate sampler placing every sample at the origin.
use super::{SampleBuffer, Sampler};
use crate::{error::OptResult, random::RandomState};
use nalgebra::Point3;

/// Sampler for point-like sources. The radius is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSampler {
    buffer: SampleBuffer,
}
impl Sampler for PointSampler {
    fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }
    fn buffer_mut(&mut self) -> &mut SampleBuffer {
        &mut self.buffer
    }
    fn generate(&self, nr_of_samples: usize, _rng: &mut RandomState) -> OptResult<Vec<Point3<f64>>> {
        Ok(vec![Point3::origin(); nr_of_samples])
    }
    fn name(&self) -> String {
        "point".into()
    }
}
