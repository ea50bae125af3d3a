//! Samples weighted by a pixelated intensity map.
use super::{check_radius, SampleBuffer, Sampler};
use crate::{
    error::{OptResult, OptraceError},
    random::RandomState,
    utils::{f64_to_usize, usize_to_f64},
};
use image::ImageReader;
use kahan::{KahanSum, KahanSummator};
use log::info;
use nalgebra::Point3;
use rand_distr::{Distribution, Poisson};
use std::path::Path;
use uom::si::f64::Length;

/// Sampler following the intensity distribution of an image.
///
/// The map spans `2R` in x and keeps square pixels, i.e. it spans `2R · rows / cols` in y. Row 0 is the top
/// (+y) row. Random sampling draws a Poisson distributed count with mean `N · λ` for every pixel of normalized
/// intensity `λ` and jitters the points uniformly inside the pixel, so the number of samples is only
/// approximately `N`. Uniform sampling places points at the pixel centers, pixel `k` receiving
/// `round(N · C_k) - round(N · C_(k-1))` of them for the cumulative intensity `C`, so exactly `N` points are
/// distributed even if the map has more pixels than requested samples.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSampler {
    buffer: SampleBuffer,
    cols: usize,
    rows: usize,
    intensity: Vec<f64>,
}
impl MapSampler {
    /// Creates a new [`MapSampler`] from row-major intensity data.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the radius is negative or not finite.
    ///   - the data length does not match `cols × rows` or is empty.
    ///   - a value is negative or not finite or all values are zero.
    pub fn new(radius: Length, cols: usize, rows: usize, data: &[f64]) -> OptResult<Self> {
        let radius = check_radius(radius)?;
        if cols == 0 || rows == 0 || data.len() != cols * rows {
            return Err(OptraceError::Sampler(format!(
                "intensity map of {cols}x{rows} pixels needs exactly {} values",
                cols * rows
            )));
        }
        if data.iter().any(|v| v.is_sign_negative() || !v.is_finite()) {
            return Err(OptraceError::Sampler(
                "intensity values must be >= 0.0 and finite".into(),
            ));
        }
        let total: f64 = data.iter().kahan_sum().sum();
        if total <= 0.0 {
            return Err(OptraceError::Sampler("intensity map is empty".into()));
        }
        Ok(Self {
            buffer: SampleBuffer::new(radius),
            cols,
            rows,
            intensity: data.iter().map(|v| v / total).collect(),
        })
    }
    /// Load the intensity map from an image file (converted to 16 bit grayscale).
    ///
    /// # Errors
    ///
    /// This function will return an error if the file cannot be read or decoded or the image is black.
    pub fn from_png(path: &Path, radius: Length) -> OptResult<Self> {
        let image = ImageReader::open(path)
            .map_err(|e| OptraceError::Sampler(format!("cannot open {}: {e}", path.display())))?
            .decode()
            .map_err(|e| OptraceError::Sampler(format!("cannot decode {}: {e}", path.display())))?
            .to_luma16();
        let to_usize = |v: u32| {
            usize::try_from(v)
                .map_err(|_| OptraceError::Sampler(format!("image {} is too large", path.display())))
        };
        let (cols, rows) = (to_usize(image.width())?, to_usize(image.height())?);
        info!("loaded {cols}x{rows} intensity map from {}", path.display());
        let data: Vec<f64> = image.pixels().map(|p| f64::from(p.0[0])).collect();
        Self::new(radius, cols, rows, &data)
    }
    /// Returns the number of columns and rows of the map.
    #[must_use]
    pub const fn size(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }
    /// Returns the normalized intensity of the pixel `(col, row)`.
    #[must_use]
    pub fn intensity(&self, col: usize, row: usize) -> Option<f64> {
        (col < self.cols)
            .then(|| self.intensity.get(col + row * self.cols).copied())
            .flatten()
    }
    fn pixel_size(&self) -> f64 {
        2.0 * self.buffer.radius() / usize_to_f64(self.cols)
    }
}
impl Sampler for MapSampler {
    fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }
    fn buffer_mut(&mut self) -> &mut SampleBuffer {
        &mut self.buffer
    }
    fn generate(&self, nr_of_samples: usize, rng: &mut RandomState) -> OptResult<Vec<Point3<f64>>> {
        let n = usize_to_f64(nr_of_samples);
        let h = self.pixel_size();
        let x0 = -self.buffer.radius();
        let y0 = 0.5 * h * usize_to_f64(self.rows);
        let mut samples = Vec::with_capacity(nr_of_samples);
        let last_lit = self.intensity.iter().rposition(|lambda| *lambda > 0.0);
        let mut cumulative = KahanSum::new_with_value(0.0);
        for (index, lambda) in self.intensity.iter().enumerate() {
            cumulative += *lambda;
            if *lambda <= 0.0 {
                continue;
            }
            let (col, row) = (usize_to_f64(index % self.cols), usize_to_f64(index / self.cols));
            if self.is_random() {
                let poisson = Poisson::new(n * lambda)
                    .map_err(|e| OptraceError::Sampler(format!("invalid pixel intensity: {e}")))?;
                let count = f64_to_usize(poisson.sample(rng.generator()));
                for _ in 0..count {
                    let (jx, jy) = (rng.randu(), rng.randu());
                    samples.push(Point3::new(
                        (col + jx).mul_add(h, x0),
                        (row + jy).mul_add(-h, y0),
                        0.0,
                    ));
                }
            } else {
                let target = if last_lit == Some(index) {
                    nr_of_samples
                } else {
                    f64_to_usize((n * cumulative.sum()).round()).min(nr_of_samples)
                };
                let count = target.saturating_sub(samples.len());
                let center = Point3::new((col + 0.5).mul_add(h, x0), (row + 0.5).mul_add(-h, y0), 0.0);
                samples.extend(std::iter::repeat_n(center, count));
            }
        }
        Ok(samples)
    }
    fn name(&self) -> String {
        "map".into()
    }
}
