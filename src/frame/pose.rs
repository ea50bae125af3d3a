//! Resolved placement of a reference frame in world coordinates.
use nalgebra::{Isometry3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};

/// Orientation and center of a resolved reference frame.
///
/// The orientation maps local vectors to world vectors, i.e. its columns are the local axes expressed in world
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    isometry: Isometry3<f64>,
}
impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}
impl Pose {
    /// Identity pose located at the origin.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            isometry: Isometry3::identity(),
        }
    }
    /// Creates a new [`Pose`] from an orientation and a center point.
    #[must_use]
    pub fn new(orientation: UnitQuaternion<f64>, center: Point3<f64>) -> Self {
        Self {
            isometry: Isometry3::from_parts(Translation3::from(center.coords), orientation),
        }
    }
    /// Returns the orientation of this [`Pose`] as rotation matrix.
    #[must_use]
    pub fn orientation(&self) -> Rotation3<f64> {
        self.isometry.rotation.to_rotation_matrix()
    }
    /// Returns the orientation of this [`Pose`] as unit quaternion.
    #[must_use]
    pub const fn rotation(&self) -> &UnitQuaternion<f64> {
        &self.isometry.rotation
    }
    /// Returns the center of this [`Pose`] in world coordinates.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        Point3::from(self.isometry.translation.vector)
    }
    /// Local x axis in world coordinates.
    #[must_use]
    pub fn e_x(&self) -> Vector3<f64> {
        self.from_relative_vec(&Vector3::x())
    }
    /// Local y axis in world coordinates.
    #[must_use]
    pub fn e_y(&self) -> Vector3<f64> {
        self.from_relative_vec(&Vector3::y())
    }
    /// Local z axis (optical axis) in world coordinates.
    #[must_use]
    pub fn e_z(&self) -> Vector3<f64> {
        self.from_relative_vec(&Vector3::z())
    }
    /// Convert a point given in this frame's coordinates into world coordinates.
    #[must_use]
    pub fn from_relative(&self, point: &Point3<f64>) -> Point3<f64> {
        self.isometry.transform_point(point)
    }
    /// Convert a world point into this frame's coordinates.
    #[must_use]
    pub fn to_relative(&self, point: &Point3<f64>) -> Point3<f64> {
        self.isometry.inverse_transform_point(point)
    }
    /// Convert a free vector given in this frame's coordinates into world coordinates (rotation only).
    #[must_use]
    pub fn from_relative_vec(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.isometry.transform_vector(vector)
    }
    /// Convert a free world vector into this frame's coordinates (rotation only).
    #[must_use]
    pub fn to_relative_vec(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.isometry.inverse_transform_vector(vector)
    }
    /// Pose shifted by `offset` measured along this pose's axes. The orientation is kept.
    #[must_use]
    pub fn translated(&self, offset: &Vector3<f64>) -> Self {
        Self::new(
            self.isometry.rotation,
            self.center() + self.from_relative_vec(offset),
        )
    }
    /// Pose rotated by `rotation` expressed in this pose's axes. The center is kept.
    #[must_use]
    pub fn rotated(&self, rotation: &UnitQuaternion<f64>) -> Self {
        Self::new(self.isometry.rotation * rotation, self.center())
    }
}
