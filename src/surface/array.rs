//! Regular grid of identical sub-apertures (e.g. a lenslet array).
use super::{plane_intercept, rectangular::check_extent, Intercept, SurfaceShape};
use crate::{
    error::{OptResult, OptraceError},
    meter,
    random::RandomState,
    utils::{f64_to_usize, floor_to_isize, usize_to_f64},
};
use nalgebra::{Point3, Vector3};
use uom::si::f64::{Area, Length};

/// A `width × height` tile divided into `cols × rows` cells, each holding a copy of a sub-aperture centered in
/// the cell.
#[derive(Debug)]
pub struct SurfaceArray {
    width: f64,
    height: f64,
    cols: usize,
    rows: usize,
    sub_aperture: Box<dyn SurfaceShape>,
}
impl SurfaceArray {
    /// Creates a new [`SurfaceArray`].
    ///
    /// # Errors
    ///
    /// This function will return an error if width or height are not positive and finite or if the number of
    /// columns or rows is zero.
    pub fn new(
        width: Length,
        height: Length,
        cols: usize,
        rows: usize,
        sub_aperture: Box<dyn SurfaceShape>,
    ) -> OptResult<Self> {
        check_extent(width.value, height.value)?;
        if cols == 0 || rows == 0 {
            return Err(OptraceError::Configuration(
                "number of columns and rows must be > 0".into(),
            ));
        }
        Ok(Self {
            width: width.value,
            height: height.value,
            cols,
            rows,
            sub_aperture,
        })
    }
    /// Width of a single cell.
    #[must_use]
    pub fn cell_width(&self) -> Length {
        meter!(self.width / usize_to_f64(self.cols))
    }
    /// Height of a single cell.
    #[must_use]
    pub fn cell_height(&self) -> Length {
        meter!(self.height / usize_to_f64(self.rows))
    }
    /// Returns the number of columns and rows.
    #[must_use]
    pub const fn grid(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }
    /// Returns the sub-aperture of this [`SurfaceArray`].
    #[must_use]
    pub fn sub_aperture(&self) -> &dyn SurfaceShape {
        self.sub_aperture.as_ref()
    }
    /// Center of the cell `(col, row)` relative to the tile center.
    fn cell_center(&self, col: usize, row: usize) -> Vector3<f64> {
        let w = self.width / usize_to_f64(self.cols);
        let h = self.height / usize_to_f64(self.rows);
        Vector3::new(
            (usize_to_f64(col) + 0.5).mul_add(w, -0.5 * self.width),
            (usize_to_f64(row) + 0.5).mul_add(h, -0.5 * self.height),
            0.0,
        )
    }
    fn cell_index(value: f64, extent: f64, count: usize) -> usize {
        let cell = extent / usize_to_f64(count);
        let index = floor_to_isize((value + 0.5 * extent) / cell).max(0);
        usize::try_from(index).map_or(0, |i| i.min(count - 1))
    }
}
impl SurfaceShape for SurfaceArray {
    fn intercept(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Option<Intercept> {
        let (point, distance) = plane_intercept(origin, direction)?;
        if point.x.abs() >= 0.5 * self.width || point.y.abs() >= 0.5 * self.height {
            return Some(Intercept {
                point,
                normal: Vector3::z(),
                distance,
                inside: false,
            });
        }
        let col = Self::cell_index(point.x, self.width, self.cols);
        let row = Self::cell_index(point.y, self.height, self.rows);
        let center = self.cell_center(col, row);
        let mut hit = self.sub_aperture.intercept(&(origin - center), direction)?;
        hit.point += center;
        Some(hit)
    }
    fn area(&self) -> Area {
        self.sub_aperture.area() * usize_to_f64(self.cols * self.rows)
    }
    fn generate_points(
        &self,
        nr_of_points: usize,
        rng: &mut RandomState,
    ) -> Vec<(Point3<f64>, Vector3<f64>)> {
        let cells = self.cols * self.rows;
        (0..nr_of_points)
            .filter_map(|_| {
                let cell = f64_to_usize(rng.randu() * usize_to_f64(cells)).min(cells - 1);
                let center = self.cell_center(cell % self.cols, cell / self.cols);
                self.sub_aperture
                    .generate_points(1, rng)
                    .pop()
                    .map(|(p, n)| (p + center, n))
            })
            .collect()
    }
    fn name(&self) -> String {
        format!(
            "array of {}x{} {}",
            self.cols,
            self.rows,
            self.sub_aperture.name()
        )
    }
}
