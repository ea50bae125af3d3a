#![warn(missing_docs)]
//! Unit macros for building `uom` quantities, points and lists thereof.
//!
//! Each macro accepts one value (a scalar quantity), two values (`Point2`), three values (`Point3`)
//! or more values (`Vec`).
//!
//! ```rust
//! use optrace::{degree, millimeter};
//!
//! let radius = millimeter!(12.5);
//! let center = millimeter!(0.0, 0.0, 100.0);
//! let tilt = degree!(3.0);
//! assert!((radius.value - 0.0125).abs() < 1e-15);
//! assert!((center.z.value - 0.1).abs() < 1e-15);
//! assert!(tilt.value > 0.0);
//! ```

/// helper macro to create the units
#[macro_export]
macro_rules! uom_unit_creator {
    ($unit:ident, $unit_type:ident, $val1:expr) => {
        $unit_type::new::<$unit>($val1)
    };
    ($unit:ident, $unit_type:ident, $val1:expr, $val2:expr) => {{
        use nalgebra::Point2;
        Point2::new($unit_type::new::<$unit>($val1), $unit_type::new::<$unit>($val2))
    }};
    ($unit:ident, $unit_type:ident, $val1:expr, $val2:expr, $val3:expr) => {{
        use nalgebra::Point3;
        Point3::new(
            $unit_type::new::<$unit>($val1),
            $unit_type::new::<$unit>($val2),
            $unit_type::new::<$unit>($val3),
        )
    }};
    ($unit:ident, $unit_type:ident, $( $x:expr ),*) => {{
        use std::vec::Vec;
        let mut temp_vec = Vec::new();
        $(
            temp_vec.push($unit_type::new::<$unit>($x));
        )*
        temp_vec
    }};
}

///macro to create a Length in meter
#[macro_export]
macro_rules! meter {
    ($( $x:expr ),*) => {{
        use uom::si::{f64::Length, length::meter};
        $crate::uom_unit_creator![meter, Length, $( $x ),*]
    }};
}
///macro to create a Length in centimeter
#[macro_export]
macro_rules! centimeter {
    ($( $x:expr ),*) => {{
        use uom::si::{f64::Length, length::centimeter};
        $crate::uom_unit_creator![centimeter, Length, $( $x ),*]
    }};
}
///macro to create a Length in millimeter
#[macro_export]
macro_rules! millimeter {
    ($( $x:expr ),*) => {{
        use uom::si::{f64::Length, length::millimeter};
        $crate::uom_unit_creator![millimeter, Length, $( $x ),*]
    }};
}
///macro to create a Length in micrometer
#[macro_export]
macro_rules! micrometer {
    ($( $x:expr ),*) => {{
        use uom::si::{f64::Length, length::micrometer};
        $crate::uom_unit_creator![micrometer, Length, $( $x ),*]
    }};
}
///macro to create a Length in nanometer
#[macro_export]
macro_rules! nanometer {
    ($( $x:expr ),*) => {{
        use uom::si::{f64::Length, length::nanometer};
        $crate::uom_unit_creator![nanometer, Length, $( $x ),*]
    }};
}
///macro to create an Area in square meter
#[macro_export]
macro_rules! square_meter {
    ($( $x:expr ),*) => {{
        use uom::si::{area::square_meter, f64::Area};
        $crate::uom_unit_creator![square_meter, Area, $( $x ),*]
    }};
}
///macro to create an angle in radian
#[macro_export]
macro_rules! radian {
    ($( $x:expr ),*) => {{
        use uom::si::{angle::radian, f64::Angle};
        $crate::uom_unit_creator![radian, Angle, $( $x ),*]
    }};
}
///macro to create an angle in milliradian
#[macro_export]
macro_rules! milliradian {
    ($( $x:expr ),*) => {{
        use uom::si::{angle::radian, f64::Angle};
        $crate::uom_unit_creator![radian, Angle, $( 1e-3*$x ),*]
    }};
}
///macro to create an angle in degree
#[macro_export]
macro_rules! degree {
    ($( $x:expr ),*) => {{
        use uom::si::{angle::degree, f64::Angle};
        $crate::uom_unit_creator![degree, Angle, $( $x ),*]
    }};
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use nalgebra::{Point2, Point3};
    use uom::si::{angle::radian, area::square_millimeter, f64::Length, length::meter};

    #[test]
    fn milliradian_test() {
        let rad = milliradian!(3.);
        assert_relative_eq!(rad.get::<radian>(), 3e-3);
    }
    #[test]
    fn degree_test() {
        assert_relative_eq!(degree!(180.0).get::<radian>(), std::f64::consts::PI);
    }
    #[test]
    fn square_meter_test() {
        assert_relative_eq!(square_meter!(1e-6).get::<square_millimeter>(), 1.0);
    }
    #[test]
    fn lengths() {
        assert_relative_eq!(centimeter!(1.0).value, 0.01);
        assert_relative_eq!(millimeter!(1.0).value, 0.001);
        assert_relative_eq!(micrometer!(1.0).value, 1e-6);
        assert_relative_eq!(nanometer!(633.0).value, 633e-9);
    }
    #[test]
    fn uom_unit_creator() {
        let meter1 = Length::new::<meter>(1.);
        let meter2 = uom_unit_creator!(meter, Length, 1.);
        assert_relative_eq!(meter1.value, meter2.value);

        let p2 = Point2::new(Length::new::<meter>(1.), Length::new::<meter>(2.));
        let p2_macro = uom_unit_creator!(meter, Length, 1., 2.);
        assert_eq!(p2, p2_macro);

        let p3 = Point3::new(
            Length::new::<meter>(1.),
            Length::new::<meter>(2.),
            Length::new::<meter>(3.),
        );
        assert_eq!(p3, uom_unit_creator!(meter, Length, 1., 2., 3.));

        let list = uom_unit_creator!(meter, Length, 1., 2., 3., 4.);
        assert_eq!(list.len(), 4);
        assert_relative_eq!(list[3].value, 4.0);
    }
}
