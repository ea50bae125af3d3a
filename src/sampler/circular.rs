//! Samples over a disc.
use super::{check_radius, SampleBuffer, Sampler};
use crate::{error::OptResult, random::RandomState};
use nalgebra::Point3;
use sobol::{params::JoeKuoD6, Sobol};
use std::f64::consts::PI;
use uom::si::f64::Length;

/// Samples distributed uniformly (by area) over a disc.
///
/// Uniform sampling maps a two-dimensional Sobol low-discrepancy sequence `(u, v)` to `r = R sqrt(u)`,
/// `θ = 2πv`, which is reproducible for a given number of samples. Random sampling uses the same mapping with
/// uniformly drawn `u` and `v`.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularSampler {
    buffer: SampleBuffer,
}
impl CircularSampler {
    /// Creates a new [`CircularSampler`].
    ///
    /// # Errors
    ///
    /// This function will return an error if the radius is negative or not finite.
    pub fn new(radius: Length) -> OptResult<Self> {
        Ok(Self {
            buffer: SampleBuffer::new(check_radius(radius)?),
        })
    }
    fn map(&self, u: f64, v: f64) -> Point3<f64> {
        let r = self.buffer.radius() * u.sqrt();
        let theta = 2.0 * PI * v;
        Point3::new(r * theta.cos(), r * theta.sin(), 0.0)
    }
}
impl Sampler for CircularSampler {
    fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }
    fn buffer_mut(&mut self) -> &mut SampleBuffer {
        &mut self.buffer
    }
    fn generate(&self, nr_of_samples: usize, rng: &mut RandomState) -> OptResult<Vec<Point3<f64>>> {
        if self.is_random() {
            Ok((0..nr_of_samples)
                .map(|_| {
                    let (u, v) = (rng.randu(), rng.randu());
                    self.map(u, v)
                })
                .collect())
        } else {
            let params = JoeKuoD6::minimal();
            let seq = Sobol::<f64>::new(2, &params);
            Ok(seq
                .take(nr_of_samples)
                .map(|point| self.map(point[0], point[1]))
                .collect())
        }
    }
    fn name(&self) -> String {
        "circular".into()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::millimeter;
    #[test]
    fn new() {
        assert!(CircularSampler::new(millimeter!(-1.0)).is_err());
        assert!(CircularSampler::new(millimeter!(f64::NAN)).is_err());
    }
    #[test]
    fn uniform_reproducible() {
        let mut rng = RandomState::default();
        let mut a = CircularSampler::new(millimeter!(1.0)).unwrap();
        let mut b = CircularSampler::new(millimeter!(1.0)).unwrap();
        a.sample(50, &mut rng).unwrap();
        rng.set_seed(7);
        b.sample(50, &mut rng).unwrap();
        assert_eq!(a.buffer(), b.buffer());
    }
    #[test]
    fn inside_disc() {
        for random in [false, true] {
            let mut s = CircularSampler::new(millimeter!(1.0)).unwrap();
            s.set_random(random);
            s.sample(1000, &mut RandomState::default()).unwrap();
            let points: Vec<_> = std::iter::from_fn(|| s.get()).collect();
            assert_eq!(points.len(), 1000);
            assert!(points.iter().all(|p| p.coords.norm() <= 0.001 + 1e-15));
            // area uniform: about a quarter of the points within half the radius
            let inner = points.iter().filter(|p| p.coords.norm() < 0.0005).count();
            assert!((200..300).contains(&inner), "{inner}");
        }
    }
}
