//! Zernike polynomials in ANSI single-index ordering (unnormalized).
//!
//! The polynomial `Z_n^l` with radial order `n` and azimuthal frequency `l` is `R_n^|l|(ρ) cos(lφ)` for `l >= 0`
//! and `R_n^|l|(ρ) sin(|l|φ)` for `l < 0`. The ANSI index is `j = (n (n + 2) + l) / 2`.
use crate::error::{OptResult, OptraceError};
use num::integer::binomial;

/// Radius below which the gradient is evaluated numerically.
const CENTER_TOLERANCE: f64 = 1e-9;
/// Step of the central difference used close to the center.
const STEP: f64 = 1e-6;

/// A single Zernike polynomial.
#[derive(Debug, Clone, PartialEq)]
pub struct Zernike {
    n: u32,
    l: i32,
    /// radial polynomial as `(power, coefficient)` pairs
    radial: Vec<(i32, f64)>,
}
impl Zernike {
    /// Creates the polynomial with the given ANSI index.
    #[must_use]
    pub fn from_ansi(j: u32) -> Self {
        let jf = f64::from(j);
        let mut n = ((-3.0 + 8.0f64.mul_add(jf, 9.0).sqrt()) / 2.0).ceil();
        // guard against rounding of the square root
        while n * (n + 3.0) / 2.0 < jf {
            n += 1.0;
        }
        while n > 0.0 && (n - 1.0) * (n + 2.0) / 2.0 >= jf {
            n -= 1.0;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n = n as u32;
        #[allow(clippy::cast_possible_wrap)]
        let l = 2 * j as i32 - (n * (n + 2)) as i32;
        Self::build(n, l)
    }
    /// Creates the polynomial `Z_n^l`.
    ///
    /// # Errors
    ///
    /// This function will return an error if `|l| > n` or `n - |l|` is odd.
    pub fn from_nl(n: u32, l: i32) -> OptResult<Self> {
        if l.unsigned_abs() > n || (n - l.unsigned_abs()) % 2 != 0 {
            return Err(OptraceError::Configuration(format!(
                "no Zernike polynomial with n={n}, l={l}"
            )));
        }
        Ok(Self::build(n, l))
    }
    fn build(n: u32, l: i32) -> Self {
        let m = l.unsigned_abs();
        let radial = (0..=(n - m) / 2)
            .map(|i| {
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                let coeff = sign
                    * f64::from(binomial(n - i, i))
                    * f64::from(binomial(n - 2 * i, (n + m) / 2 - i));
                #[allow(clippy::cast_possible_wrap)]
                let power = (n - 2 * i) as i32;
                (power, coeff)
            })
            .collect();
        Self { n, l, radial }
    }
    /// Returns the radial order `n`.
    #[must_use]
    pub const fn n(&self) -> u32 {
        self.n
    }
    /// Returns the azimuthal frequency `l`.
    #[must_use]
    pub const fn l(&self) -> i32 {
        self.l
    }
    /// Returns the ANSI index of this polynomial.
    #[must_use]
    pub fn ansi_index(&self) -> u32 {
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
        let j = ((self.n * (self.n + 2)) as i32 + self.l) as u32 / 2;
        j
    }
    fn radial_value(&self, rho: f64) -> f64 {
        self.radial
            .iter()
            .map(|(p, c)| c * rho.powi(*p))
            .sum()
    }
    fn radial_derivative(&self, rho: f64) -> f64 {
        self.radial
            .iter()
            .filter(|(p, _)| *p > 0)
            .map(|(p, c)| c * f64::from(*p) * rho.powi(p - 1))
            .sum()
    }
    fn angular(&self, phi: f64) -> f64 {
        let l = f64::from(self.l);
        if self.l >= 0 {
            (l * phi).cos()
        } else {
            (-l * phi).sin()
        }
    }
    /// Value of the polynomial at the normalized position `(x, y)`.
    #[must_use]
    pub fn value(&self, x: f64, y: f64) -> f64 {
        let rho = x.hypot(y);
        let phi = y.atan2(x);
        self.radial_value(rho) * self.angular(phi)
    }
    /// Gradient `(∂Z/∂x, ∂Z/∂y)` at the normalized position `(x, y)`.
    #[must_use]
    pub fn gradient(&self, x: f64, y: f64) -> (f64, f64) {
        let rho = x.hypot(y);
        if rho < CENTER_TOLERANCE {
            let dx = (self.value(x + STEP, y) - self.value(x - STEP, y)) / (2.0 * STEP);
            let dy = (self.value(x, y + STEP) - self.value(x, y - STEP)) / (2.0 * STEP);
            return (dx, dy);
        }
        let phi = y.atan2(x);
        let r = self.radial_value(rho);
        let dr = self.radial_derivative(rho);
        let l = f64::from(self.l);
        // d(angular)/dφ
        let d_angular = if self.l >= 0 {
            -l * (l * phi).sin()
        } else {
            -l * (-l * phi).cos()
        };
        let angular = self.angular(phi);
        let (drho_dx, drho_dy) = (x / rho, y / rho);
        let rho2 = rho * rho;
        let (dphi_dx, dphi_dy) = (-y / rho2, x / rho2);
        (
            dr * angular * drho_dx + r * d_angular * dphi_dx,
            dr * angular * drho_dy + r * d_angular * dphi_dy,
        )
    }
}

/// Weighted sum of Zernike polynomials.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZernikeSum {
    terms: Vec<(Zernike, f64)>,
}
impl ZernikeSum {
    /// Creates a sum from coefficients given in ANSI order (index 0 is the piston term).
    #[must_use]
    pub fn from_ansi_coefficients(coefficients: &[f64]) -> Self {
        let terms = coefficients
            .iter()
            .zip(0u32..)
            .filter(|(c, _)| **c != 0.0)
            .map(|(c, j)| (Zernike::from_ansi(j), *c))
            .collect();
        Self { terms }
    }
    /// Add a single term.
    pub fn add(&mut self, polynomial: Zernike, coefficient: f64) {
        self.terms.push((polynomial, coefficient));
    }
    /// Returns the number of (non-zero) terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }
    /// Returns `true` if the sum has no terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
    /// Value of the sum at the normalized position `(x, y)`.
    #[must_use]
    pub fn value(&self, x: f64, y: f64) -> f64 {
        self.terms.iter().map(|(z, c)| c * z.value(x, y)).sum()
    }
    /// Gradient of the sum at the normalized position `(x, y)`.
    #[must_use]
    pub fn gradient(&self, x: f64, y: f64) -> (f64, f64) {
        self.terms.iter().fold((0.0, 0.0), |(gx, gy), (z, c)| {
            let (dx, dy) = z.gradient(x, y);
            (c.mul_add(dx, gx), c.mul_add(dy, gy))
        })
    }
}
