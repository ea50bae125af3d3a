//! Ready-made boundaries for common optical elements.
//!
//! All presets are placed at the origin of their frame with the optical axis along local z. Curved mirrors
//! with a positive curvature radius are concave for light arriving from +z.
use super::MediumBoundary;
use crate::{
    em_interface::{
        Dielectric, Paraxial, PhaseScreen, Reflective, Transmission, TransmissionMap, Transparent,
    },
    error::{OptResult, OptraceError},
    meter,
    surface::{CircularFlat, Conic, Parabolic, RectangularFlat, SurfaceArray},
    utils::usize_to_f64,
};
use uom::si::f64::Length;

/// Flat circular mirror.
///
/// # Errors
///
/// This function will return an error if the radius is not positive and finite.
pub fn flat_mirror(radius: Length) -> OptResult<MediumBoundary> {
    Ok(MediumBoundary::new(
        "flat mirror",
        Some(Box::new(CircularFlat::new(radius)?)),
        Box::new(Reflective),
    ))
}
/// Spherical mirror.
///
/// # Errors
///
/// This function will return an error if the surface parameters are invalid (see [`Conic::new`]).
pub fn spherical_mirror(radius: Length, curvature_radius: Length) -> OptResult<MediumBoundary> {
    Ok(MediumBoundary::new(
        "spherical mirror",
        Some(Box::new(Conic::spherical(radius, curvature_radius)?)),
        Box::new(Reflective),
    ))
}
/// Conic mirror with an optional central hole (use a zero length for none).
///
/// # Errors
///
/// This function will return an error if the surface parameters are invalid (see [`Conic::new`]).
pub fn conic_mirror(
    radius: Length,
    curvature_radius: Length,
    conic: f64,
    hole: Length,
) -> OptResult<MediumBoundary> {
    let shape = Conic::new(radius, curvature_radius, conic)?.with_hole(hole)?;
    Ok(MediumBoundary::new(
        "conic mirror",
        Some(Box::new(shape)),
        Box::new(Reflective),
    ))
}
/// Parabolic mirror of the given focal length.
///
/// # Errors
///
/// This function will return an error if the surface parameters are invalid (see [`Parabolic::new`]).
pub fn parabolic_mirror(radius: Length, focal_length: Length) -> OptResult<MediumBoundary> {
    Ok(MediumBoundary::new(
        "parabolic mirror",
        Some(Box::new(Parabolic::new(radius, focal_length)?)),
        Box::new(Reflective),
    ))
}
/// Flat dielectric surface. Light arriving from +z passes from `n_in` into `n_out`.
///
/// # Errors
///
/// This function will return an error if the radius or one of the refractive indices is invalid.
pub fn circular_window(radius: Length, n_in: f64, n_out: f64) -> OptResult<MediumBoundary> {
    Ok(MediumBoundary::new(
        "window",
        Some(Box::new(CircularFlat::new(radius)?)),
        Box::new(Dielectric::new(n_in, n_out)?),
    ))
}
/// Curved refracting surface of a lens.
///
/// # Errors
///
/// This function will return an error if the surface parameters or the refractive indices are invalid.
pub fn conic_lens_surface(
    radius: Length,
    curvature_radius: Length,
    conic: f64,
    n_in: f64,
    n_out: f64,
) -> OptResult<MediumBoundary> {
    Ok(MediumBoundary::new(
        "lens surface",
        Some(Box::new(Conic::new(radius, curvature_radius, conic)?)),
        Box::new(Dielectric::new(n_in, n_out)?),
    ))
}
/// Ideal thin lens with a circular aperture.
///
/// # Errors
///
/// This function will return an error if the radius or the focal length is invalid.
pub fn ideal_lens(radius: Length, focal_length: Length) -> OptResult<MediumBoundary> {
    Ok(MediumBoundary::new(
        "ideal lens",
        Some(Box::new(CircularFlat::new(radius)?)),
        Box::new(Paraxial::new(focal_length)?),
    ))
}
/// Mirror covering the whole local z = 0 plane. Every alive ray is reflected.
#[must_use]
pub fn infinite_mirror() -> MediumBoundary {
    MediumBoundary::new("infinite mirror", None, Box::new(Reflective))
}
/// Rectangular array of `cols × rows` refracting conic lenslets.
///
/// Each lenslet covers its whole cell, i.e. its aperture radius is half the cell diagonal.
///
/// # Errors
///
/// This function will return an error if the array or lenslet parameters are invalid.
#[allow(clippy::too_many_arguments)]
pub fn lenslet_array(
    width: Length,
    height: Length,
    cols: usize,
    rows: usize,
    curvature_radius: Length,
    conic: f64,
    n_in: f64,
    n_out: f64,
) -> OptResult<MediumBoundary> {
    if cols == 0 || rows == 0 {
        return Err(OptraceError::Configuration(
            "number of columns and rows must be > 0".into(),
        ));
    }
    let w = width.value / usize_to_f64(cols);
    let h = height.value / usize_to_f64(rows);
    let lenslet = Conic::new(meter!(0.5 * w.hypot(h)), curvature_radius, conic)?;
    let array = SurfaceArray::new(width, height, cols, rows, Box::new(lenslet))?;
    Ok(MediumBoundary::new(
        "lenslet array",
        Some(Box::new(array)),
        Box::new(Dielectric::new(n_in, n_out)?),
    ))
}
/// Opaque disc. Rays hitting it are pruned, all others pass.
///
/// # Errors
///
/// This function will return an error if the radius is not positive and finite.
pub fn obstruction(radius: Length) -> OptResult<MediumBoundary> {
    Ok(MediumBoundary::new(
        "obstruction",
        Some(Box::new(CircularFlat::new(radius)?)),
        Box::new(Transparent),
    )
    .with_complementary(true))
}
/// Obstruction given by a pixelated transmission map centered at the frame origin (see [`TransmissionMap`]).
/// Rays outside of the map pass.
///
/// # Errors
///
/// This function will return an error if the map is invalid.
pub fn obstruction_map(
    width: Length,
    height: Length,
    map: Vec<f64>,
    cols: usize,
    rows: usize,
    stride: usize,
) -> OptResult<MediumBoundary> {
    let map = TransmissionMap::new(width, height, map, cols, rows, stride)?;
    Ok(
        MediumBoundary::new("obstruction map", None, Box::new(Transparent))
            .with_transmission(Transmission::Map(map)),
    )
}
/// Phase screen given by Zernike coefficients in ANSI order, normalized to `radius`.
///
/// # Errors
///
/// This function will return an error if the screen parameters are invalid (see [`PhaseScreen::new`]).
pub fn phase_screen(
    radius: Length,
    coefficients: &[f64],
    n_in: f64,
    n_out: f64,
) -> OptResult<MediumBoundary> {
    Ok(MediumBoundary::new(
        "phase screen",
        None,
        Box::new(PhaseScreen::new(radius, coefficients, n_in, n_out)?),
    ))
}
/// Rectangular aperture stop.
///
/// # Errors
///
/// This function will return an error if width or height are not positive and finite.
pub fn rectangular_stop(width: Length, height: Length) -> OptResult<MediumBoundary> {
    Ok(MediumBoundary::new(
        "rectangular stop",
        Some(Box::new(RectangularFlat::new(width, height)?)),
        Box::new(Transparent),
    ))
}
/// Rectangular detector plane. Rays hitting it stay intercepted at the detector for readout.
///
/// # Errors
///
/// This function will return an error if width or height are not positive and finite.
pub fn detector(width: Length, height: Length) -> OptResult<MediumBoundary> {
    Ok(MediumBoundary::new(
        "detector",
        Some(Box::new(RectangularFlat::new(width, height)?)),
        Box::new(Transparent),
    ))
}
/// Flat circular mirror with a given reflection probability.
///
/// # Errors
///
/// This function will return an error if the radius is invalid or the reflectivity is NaN.
pub fn partial_mirror(radius: Length, reflectivity: f64) -> OptResult<MediumBoundary> {
    Ok(flat_mirror(radius)?.with_transmission(Transmission::from_probability(reflectivity)?))
}
