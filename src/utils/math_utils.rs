//! Checked-free numeric conversions used where clippy's cast lints would otherwise fire.

#[must_use]
pub const fn usize_to_f64(value: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let newval = value as f64;
    newval
}

#[must_use]
pub const fn f64_to_usize(value: f64) -> usize {
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    let newval = value as usize;
    newval
}

/// Floor of `value` as a signed index.
#[must_use]
pub fn floor_to_isize(value: f64) -> isize {
    #[allow(clippy::cast_possible_truncation)]
    let newval = value.floor() as isize;
    newval
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn conversions() {
        assert_eq!(usize_to_f64(3), 3.0);
        assert_eq!(f64_to_usize(3.7), 3);
        assert_eq!(f64_to_usize(-1.0), 0);
        assert_eq!(floor_to_isize(-0.5), -1);
        assert_eq!(floor_to_isize(2.5), 2);
    }
}
