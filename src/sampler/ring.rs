//! Samples on a circle.
use super::{check_radius, SampleBuffer, Sampler};
use crate::{error::OptResult, random::RandomState, utils::usize_to_f64};
use nalgebra::Point3;
use std::f64::consts::PI;
use uom::si::f64::Length;

/// Samples on the circle of the configured radius.
///
/// Uniform sampling places sample `j` of `N` at the angle `2πj / N`. Random sampling draws the angle uniformly.
#[derive(Debug, Clone, PartialEq)]
pub struct RingSampler {
    buffer: SampleBuffer,
}
impl RingSampler {
    /// Creates a new [`RingSampler`].
    ///
    /// # Errors
    ///
    /// This function will return an error if the radius is negative or not finite.
    pub fn new(radius: Length) -> OptResult<Self> {
        Ok(Self {
            buffer: SampleBuffer::new(check_radius(radius)?),
        })
    }
}
impl Sampler for RingSampler {
    fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }
    fn buffer_mut(&mut self) -> &mut SampleBuffer {
        &mut self.buffer
    }
    fn generate(&self, nr_of_samples: usize, rng: &mut RandomState) -> OptResult<Vec<Point3<f64>>> {
        let r = self.buffer.radius();
        let step = 2.0 * PI / usize_to_f64(nr_of_samples);
        Ok((0..nr_of_samples)
            .map(|j| {
                let theta = if self.is_random() {
                    2.0 * PI * rng.randu()
                } else {
                    usize_to_f64(j) * step
                };
                Point3::new(r * theta.cos(), r * theta.sin(), 0.0)
            })
            .collect())
    }
    fn name(&self) -> String {
        "ring".into()
    }
}
