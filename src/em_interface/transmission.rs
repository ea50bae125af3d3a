//! Probability of a ray to pass a boundary.
use crate::{
    error::{OptResult, OptraceError},
    random::RandomState,
    utils::{floor_to_isize, usize_to_f64},
};
use nalgebra::Point3;
use uom::si::f64::Length;

/// Pixelated transmission map covering a `width × height` rectangle centered at the local origin.
///
/// Pixel `(i, j)` with `i = floor((x + width / 2) / hx)` and `j = floor((height / 2 - y) / hy)` holds the
/// transmission probability at `(x, y)`, i.e. row 0 is the top (+y) row. Row `j` starts at index `j * stride` in
/// the data.
#[derive(Debug, Clone, PartialEq)]
pub struct TransmissionMap {
    width: f64,
    height: f64,
    hx: f64,
    hy: f64,
    cols: usize,
    rows: usize,
    stride: usize,
    data: Vec<f64>,
}
impl TransmissionMap {
    /// Creates a new [`TransmissionMap`].
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - width or height are not positive and finite.
    ///   - `cols` or `rows` is zero or `stride < cols`.
    ///   - the data does not cover all pixels.
    ///   - a pixel value is not finite.
    pub fn new(
        width: Length,
        height: Length,
        data: Vec<f64>,
        cols: usize,
        rows: usize,
        stride: usize,
    ) -> OptResult<Self> {
        if !width.is_normal()
            || !height.is_normal()
            || width.is_sign_negative()
            || height.is_sign_negative()
        {
            return Err(OptraceError::Configuration(
                "map width and height must be positive and finite".into(),
            ));
        }
        if cols == 0 || rows == 0 || stride < cols {
            return Err(OptraceError::Configuration(
                "map needs at least one pixel and a stride >= cols".into(),
            ));
        }
        if data.len() < (rows - 1) * stride + cols {
            return Err(OptraceError::Configuration(format!(
                "map of {cols}x{rows} pixels (stride {stride}) needs more than {} values",
                data.len()
            )));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(OptraceError::Configuration(
                "map values must be finite".into(),
            ));
        }
        Ok(Self {
            width: width.value,
            height: height.value,
            hx: width.value / usize_to_f64(cols),
            hy: height.value / usize_to_f64(rows),
            cols,
            rows,
            stride,
            data,
        })
    }
    /// Returns the transmission at the given local point or `None` outside of the map.
    #[must_use]
    pub fn value_at(&self, x: f64, y: f64) -> Option<f64> {
        let i = floor_to_isize(0.5f64.mul_add(self.width, x) / self.hx);
        let j = floor_to_isize(0.5f64.mul_add(self.height, -y) / self.hy);
        let i = usize::try_from(i).ok().filter(|i| *i < self.cols)?;
        let j = usize::try_from(j).ok().filter(|j| *j < self.rows)?;
        self.data.get(i + j * self.stride).copied()
    }
}

/// Transmission of a boundary.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Transmission {
    /// every ray passes
    #[default]
    Transparent,
    /// every ray is blocked
    Opaque,
    /// a ray passes with the given probability
    Partial(f64),
    /// position dependent probability; rays outside of the map pass
    Map(TransmissionMap),
}
impl Transmission {
    /// Creates a [`Transmission`] from a probability. Values `<= 0` are opaque, values `>= 1` transparent.
    ///
    /// # Errors
    ///
    /// This function will return an error if the value is NaN.
    pub fn from_probability(tx: f64) -> OptResult<Self> {
        if tx.is_nan() {
            return Err(OptraceError::Configuration(
                "transmission must not be NaN".into(),
            ));
        }
        Ok(if tx <= 0.0 {
            Self::Opaque
        } else if tx >= 1.0 {
            Self::Transparent
        } else {
            Self::Partial(tx)
        })
    }
    /// Decide whether a ray hitting the boundary at the local `point` passes.
    pub fn transmits(&self, point: &Point3<f64>, rng: &mut RandomState) -> bool {
        match self {
            Self::Transparent => true,
            Self::Opaque => false,
            Self::Partial(tx) => *tx >= rng.randu(),
            Self::Map(map) => map
                .value_at(point.x, point.y)
                .is_none_or(|tx| tx >= rng.randu()),
        }
    }
}
