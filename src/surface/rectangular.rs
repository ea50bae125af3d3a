//! Flat rectangular aperture.
use super::{check_length, plane_intercept, Intercept, SurfaceShape};
use crate::{
    error::{OptResult, OptraceError},
    meter, millimeter,
    random::RandomState,
    square_meter,
};
use nalgebra::{Point2, Point3, Vector3};
use uom::si::f64::{Area, Length};

/// Flat rectangle in the local z = 0 plane, optionally shifted within the plane.
#[derive(Debug, Clone, PartialEq)]
pub struct RectangularFlat {
    width: f64,
    height: f64,
    x0: f64,
    y0: f64,
}
impl Default for RectangularFlat {
    /// 100 mm x 100 mm centered at the origin.
    fn default() -> Self {
        Self {
            width: millimeter!(100.0).value,
            height: millimeter!(100.0).value,
            x0: 0.0,
            y0: 0.0,
        }
    }
}
impl RectangularFlat {
    /// Creates a new [`RectangularFlat`] with the given full width (along x) and height (along y).
    ///
    /// # Errors
    ///
    /// This function will return an error if width or height are not positive and finite.
    pub fn new(width: Length, height: Length) -> OptResult<Self> {
        let mut rect = Self::default();
        rect.set_width(width)?;
        rect.set_height(height)?;
        Ok(rect)
    }
    /// Shift the rectangle center within the plane.
    ///
    /// # Errors
    ///
    /// This function will return an error if an offset component is not finite.
    pub fn with_offset(mut self, offset: Point2<Length>) -> OptResult<Self> {
        self.set_offset(offset)?;
        Ok(self)
    }
    /// Set the full width (along x).
    ///
    /// # Errors
    ///
    /// This function will return an error if the width is not positive and finite.
    pub fn set_width(&mut self, width: Length) -> OptResult<()> {
        self.width = check_dimension(width, "width")?;
        Ok(())
    }
    /// Set the full height (along y).
    ///
    /// # Errors
    ///
    /// This function will return an error if the height is not positive and finite.
    pub fn set_height(&mut self, height: Length) -> OptResult<()> {
        self.height = check_dimension(height, "height")?;
        Ok(())
    }
    /// Set the center offset within the plane.
    ///
    /// # Errors
    ///
    /// This function will return an error if an offset component is not finite.
    pub fn set_offset(&mut self, offset: Point2<Length>) -> OptResult<()> {
        if !offset.x.is_finite() || !offset.y.is_finite() {
            return Err(OptraceError::Configuration(
                "offset must be finite".into(),
            ));
        }
        self.x0 = offset.x.value;
        self.y0 = offset.y.value;
        Ok(())
    }
    /// Returns the width of this [`RectangularFlat`].
    #[must_use]
    pub fn width(&self) -> Length {
        meter!(self.width)
    }
    /// Returns the height of this [`RectangularFlat`].
    #[must_use]
    pub fn height(&self) -> Length {
        meter!(self.height)
    }
    /// Returns the center offset of this [`RectangularFlat`].
    #[must_use]
    pub fn offset(&self) -> Point2<Length> {
        meter!(self.x0, self.y0)
    }
    pub(crate) fn contains(&self, x: f64, y: f64) -> bool {
        (x - self.x0).abs() < 0.5 * self.width && (y - self.y0).abs() < 0.5 * self.height
    }
}
fn check_dimension(value: Length, what: &str) -> OptResult<f64> {
    if !value.is_normal() || value.is_sign_negative() {
        return Err(OptraceError::Configuration(format!(
            "{what} must be positive and finite"
        )));
    }
    Ok(value.value)
}
impl SurfaceShape for RectangularFlat {
    fn intercept(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Option<Intercept> {
        let (point, distance) = plane_intercept(origin, direction)?;
        Some(Intercept {
            point,
            normal: Vector3::z(),
            distance,
            inside: self.contains(point.x, point.y),
        })
    }
    fn area(&self) -> Area {
        square_meter!(self.width * self.height)
    }
    fn generate_points(
        &self,
        nr_of_points: usize,
        rng: &mut RandomState,
    ) -> Vec<(Point3<f64>, Vector3<f64>)> {
        (0..nr_of_points)
            .map(|_| {
                let x = 0.5f64.mul_add(self.width * rng.randu_sign(), self.x0);
                let y = 0.5f64.mul_add(self.height * rng.randu_sign(), self.y0);
                (Point3::new(x, y, 0.0), Vector3::z())
            })
            .collect()
    }
    fn name(&self) -> String {
        "rectangular flat".into()
    }
    fn as_rectangular_mut(&mut self) -> OptResult<&mut Self> {
        Ok(self)
    }
}

/// Validate width and height given in SI units.
pub(crate) fn check_extent(width: f64, height: f64) -> OptResult<()> {
    if check_length(width, "width")? == 0.0 || check_length(height, "height")? == 0.0 {
        return Err(OptraceError::Configuration(
            "width and height must be non-zero".into(),
        ));
    }
    Ok(())
}
