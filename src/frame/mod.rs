#![warn(missing_docs)]
//! Hierarchy of reference frames.
//!
//! All frames of an optical bench live in a [`FrameTree`] and are addressed by a [`FrameId`]. Each frame stores
//! the id of its parent and a list of named degrees of freedom ("axes") such as a translation distance, a rotation
//! angle or a tripod leg length. The resolved [`Pose`] of a frame is a function of its parent's resolved pose and
//! of its own axes only.
//!
//! Setting an axis marks the frame dirty. [`FrameTree::recalculate`] walks the arena root first and recomputes
//! every dirty frame together with all frames below it. [`FrameTree::resolve`] does the same lazily for a single
//! frame and its ancestors. Querying the pose of a stale frame with [`FrameTree::pose`] is an error.
//!
//! ## Example
//!
//! ```rust
//! use optrace::{degree, frame::FrameTree, millimeter};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut frames = FrameTree::new();
//! let stage = frames
//!     .add_translated(frames.world(), "stage", millimeter!(0.0, 0.0, 100.0))
//!     .unwrap();
//! let tilt = frames
//!     .add_rotated(stage, "tilt", Vector3::x(), degree!(90.0))
//!     .unwrap();
//! let pose = frames.pose(tilt).unwrap();
//! assert!((pose.center().z - 0.1).abs() < 1e-12);
//!
//! frames.set_offset(stage, millimeter!(0.0, 0.0, 200.0)).unwrap();
//! assert!(frames.pose(tilt).is_err());
//! frames.recalculate().unwrap();
//! assert!((frames.pose(tilt).unwrap().center().z - 0.2).abs() < 1e-12);
//! ```
mod pose;
pub mod tripod;

pub use pose::Pose;

use crate::error::{OptResult, OptraceError};
use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uom::si::f64::{Angle, Length};

/// Index of a frame inside a [`FrameTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameId(usize);
impl FrameId {
    /// Returns the arena index of this [`FrameId`].
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Kind of a reference frame. It determines how the pose is computed from the parent's pose and the axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    /// fixed identity root
    World,
    /// offset by a vector measured along the parent's axes
    Translated,
    /// rotated around an axis given in the parent's coordinates
    Rotated,
    /// platform resting on three legs
    Tripod,
}
impl FrameKind {
    /// Names of the axes (degrees of freedom) of this frame kind.
    #[must_use]
    pub const fn axis_names(self) -> &'static [&'static str] {
        match self {
            Self::World => &[],
            Self::Translated => &["dx", "dy", "dz"],
            Self::Rotated => &["angle", "ex", "ey", "ez"],
            Self::Tripod => &["leg1", "leg2", "leg3", "angle", "radius"],
        }
    }
}

/// Principal rotation axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize)]
pub enum RotationAxis {
    /// x axis
    X,
    /// y axis
    Y,
    /// z axis
    Z,
}
impl RotationAxis {
    /// Unit vector of this axis.
    #[must_use]
    pub fn vector(self) -> Vector3<f64> {
        match self {
            Self::X => Vector3::x(),
            Self::Y => Vector3::y(),
            Self::Z => Vector3::z(),
        }
    }
}

#[derive(Debug, Clone)]
struct NamedPoint {
    name: String,
    local: Point3<f64>,
    world: Point3<f64>,
}

#[derive(Debug, Clone)]
struct NamedDirection {
    name: String,
    local: Vector3<f64>,
    world: Vector3<f64>,
}

#[derive(Debug, Clone)]
struct FrameNode {
    name: String,
    parent: Option<FrameId>,
    kind: FrameKind,
    axes: Vec<f64>,
    pose: Pose,
    dirty: bool,
    // bumped on every recomputation
    generation: u64,
    // generation of the parent this pose was computed from
    parent_generation: u64,
    points: Vec<NamedPoint>,
    directions: Vec<NamedDirection>,
}

/// Arena of reference frames.
///
/// Frames are only ever appended, a parent therefore always has a smaller index than its children. This makes
/// the insertion order a valid root-to-leaf traversal.
#[derive(Debug, Clone)]
pub struct FrameTree {
    nodes: Vec<FrameNode>,
}
impl Default for FrameTree {
    fn default() -> Self {
        Self::new()
    }
}
impl FrameTree {
    /// Creates a new [`FrameTree`] containing only the world frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![FrameNode {
                name: "world".into(),
                parent: None,
                kind: FrameKind::World,
                axes: Vec::new(),
                pose: Pose::identity(),
                dirty: false,
                generation: 1,
                parent_generation: 0,
                points: Vec::new(),
                directions: Vec::new(),
            }],
        }
    }
    /// Returns the id of the world frame.
    #[must_use]
    pub const fn world(&self) -> FrameId {
        FrameId(0)
    }
    /// Number of frames (including the world frame).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    /// Returns `true` if the tree only contains the world frame.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }
    /// Iterator over all frame ids in root-to-leaf order.
    pub fn ids(&self) -> impl Iterator<Item = FrameId> {
        (0..self.nodes.len()).map(FrameId)
    }
    fn node(&self, id: FrameId) -> OptResult<&FrameNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| OptraceError::Frame(format!("unknown frame id {}", id.0)))
    }
    fn node_mut(&mut self, id: FrameId) -> OptResult<&mut FrameNode> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| OptraceError::Frame(format!("unknown frame id {}", id.0)))
    }
    /// Find a frame by its name.
    #[must_use]
    pub fn frame_by_name(&self, name: &str) -> Option<FrameId> {
        self.nodes.iter().position(|n| n.name == name).map(FrameId)
    }
    /// Returns the name of the given frame.
    ///
    /// # Errors
    ///
    /// This function will return an error if the id is unknown.
    pub fn name(&self, id: FrameId) -> OptResult<&str> {
        Ok(self.node(id)?.name.as_str())
    }
    /// Returns the parent of the given frame (`None` for the world frame).
    ///
    /// # Errors
    ///
    /// This function will return an error if the id is unknown.
    pub fn parent(&self, id: FrameId) -> OptResult<Option<FrameId>> {
        Ok(self.node(id)?.parent)
    }
    /// Returns the [`FrameKind`] of the given frame.
    ///
    /// # Errors
    ///
    /// This function will return an error if the id is unknown.
    pub fn kind(&self, id: FrameId) -> OptResult<FrameKind> {
        Ok(self.node(id)?.kind)
    }
    fn push(
        &mut self,
        parent: FrameId,
        name: &str,
        kind: FrameKind,
        axes: Vec<f64>,
    ) -> OptResult<FrameId> {
        self.node(parent)?;
        if self.frame_by_name(name).is_some() {
            return Err(OptraceError::Frame(format!("frame name '{name}' already in use")));
        }
        if let Some(value) = axes.iter().find(|v| !v.is_finite()) {
            return Err(OptraceError::Configuration(format!(
                "axis values of frame '{name}' must be finite, got {value}"
            )));
        }
        let id = FrameId(self.nodes.len());
        self.nodes.push(FrameNode {
            name: name.to_owned(),
            parent: Some(parent),
            kind,
            axes,
            pose: Pose::identity(),
            dirty: true,
            generation: 0,
            parent_generation: 0,
            points: Vec::new(),
            directions: Vec::new(),
        });
        if let Err(e) = self.resolve(id) {
            self.nodes.pop();
            return Err(e);
        }
        Ok(id)
    }
    /// Add a frame shifted by `offset` (measured along the parent's axes).
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the parent is unknown or cannot be resolved.
    ///   - the name is already in use.
    ///   - an offset component is not finite.
    pub fn add_translated(
        &mut self,
        parent: FrameId,
        name: &str,
        offset: Point3<Length>,
    ) -> OptResult<FrameId> {
        self.push(
            parent,
            name,
            FrameKind::Translated,
            vec![offset.x.value, offset.y.value, offset.z.value],
        )
    }
    /// Add a frame rotated by `angle` around `axis` (given in the parent's coordinates).
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the parent is unknown or cannot be resolved.
    ///   - the name is already in use.
    ///   - the axis has zero length.
    ///   - the angle or an axis component is not finite.
    pub fn add_rotated(
        &mut self,
        parent: FrameId,
        name: &str,
        axis: Vector3<f64>,
        angle: Angle,
    ) -> OptResult<FrameId> {
        self.push(
            parent,
            name,
            FrameKind::Rotated,
            vec![angle.value, axis.x, axis.y, axis.z],
        )
    }
    /// Add a frame rotated by `angle` around one of the parent's principal axes.
    ///
    /// # Errors
    ///
    /// Same as [`FrameTree::add_rotated`].
    pub fn add_rotated_about(
        &mut self,
        parent: FrameId,
        name: &str,
        axis: RotationAxis,
        angle: Angle,
    ) -> OptResult<FrameId> {
        self.add_rotated(parent, name, axis.vector(), angle)
    }
    /// Add a tripod frame with the given leg lengths and the default cone (70°, radius 42 mm).
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the parent is unknown or cannot be resolved.
    ///   - the name is already in use.
    ///   - a leg length is not finite.
    pub fn add_tripod(
        &mut self,
        parent: FrameId,
        name: &str,
        legs: [Length; 3],
    ) -> OptResult<FrameId> {
        self.push(
            parent,
            name,
            FrameKind::Tripod,
            vec![
                legs[0].value,
                legs[1].value,
                legs[2].value,
                tripod::DEFAULT_ANGLE_DEG.to_radians(),
                tripod::DEFAULT_RADIUS,
            ],
        )
    }
    fn axis_index(&self, id: FrameId, name: &str) -> OptResult<usize> {
        let node = self.node(id)?;
        node.kind
            .axis_names()
            .iter()
            .position(|n| *n == name)
            .ok_or_else(|| {
                OptraceError::Frame(format!(
                    "frame '{}' of kind {} has no axis '{name}'",
                    node.name, node.kind
                ))
            })
    }
    /// Returns the value of a named axis in SI units (meters, radians).
    ///
    /// # Errors
    ///
    /// This function will return an error if the frame or the axis name is unknown.
    pub fn axis(&self, id: FrameId, name: &str) -> OptResult<f64> {
        let index = self.axis_index(id, name)?;
        Ok(self.node(id)?.axes[index])
    }
    /// Set a named axis (SI units) and mark the frame dirty.
    ///
    /// # Errors
    ///
    /// This function will return an error if the frame or the axis name is unknown or if the value is not finite.
    pub fn set_axis(&mut self, id: FrameId, name: &str, value: f64) -> OptResult<()> {
        if !value.is_finite() {
            return Err(OptraceError::Configuration(format!(
                "axis '{name}' must be finite"
            )));
        }
        let index = self.axis_index(id, name)?;
        let node = self.node_mut(id)?;
        node.axes[index] = value;
        node.dirty = true;
        Ok(())
    }
    /// Set the offset of a translated frame.
    ///
    /// # Errors
    ///
    /// This function will return an error if the frame is not a translated frame or a component is not finite.
    pub fn set_offset(&mut self, id: FrameId, offset: Point3<Length>) -> OptResult<()> {
        self.set_axis(id, "dx", offset.x.value)?;
        self.set_axis(id, "dy", offset.y.value)?;
        self.set_axis(id, "dz", offset.z.value)
    }
    /// Set the rotation angle of a rotated frame.
    ///
    /// # Errors
    ///
    /// This function will return an error if the frame is not a rotated frame or the angle is not finite.
    pub fn set_angle(&mut self, id: FrameId, angle: Angle) -> OptResult<()> {
        self.set_axis(id, "angle", angle.value)
    }
    /// Set the rotation axis of a rotated frame.
    ///
    /// # Errors
    ///
    /// This function will return an error if the frame is not a rotated frame or a component is not finite.
    pub fn set_rotation_axis(&mut self, id: FrameId, axis: Vector3<f64>) -> OptResult<()> {
        self.set_axis(id, "ex", axis.x)?;
        self.set_axis(id, "ey", axis.y)?;
        self.set_axis(id, "ez", axis.z)
    }
    /// Set the length of one tripod leg (`leg` = 0, 1 or 2).
    ///
    /// # Errors
    ///
    /// This function will return an error if the frame is not a tripod, the leg index is out of range or the
    /// length is not finite.
    pub fn set_leg(&mut self, id: FrameId, leg: usize, length: Length) -> OptResult<()> {
        let name = match leg {
            0 => "leg1",
            1 => "leg2",
            2 => "leg3",
            _ => {
                return Err(OptraceError::Frame(format!(
                    "tripod leg index {leg} out of range"
                )))
            }
        };
        self.set_axis(id, name, length.value)
    }
    /// Set the cone angle (between legs one and two) and the leg circle radius of a tripod.
    ///
    /// # Errors
    ///
    /// This function will return an error if the frame is not a tripod or a value is not finite.
    pub fn set_tripod_geometry(&mut self, id: FrameId, angle: Angle, radius: Length) -> OptResult<()> {
        self.set_axis(id, "angle", angle.value)?;
        self.set_axis(id, "radius", radius.value)
    }
    /// Attach a named point (given in local coordinates) to a frame.
    ///
    /// # Errors
    ///
    /// This function will return an error if the frame is unknown or the name is already used on this frame.
    pub fn add_point(&mut self, id: FrameId, name: &str, local: Point3<Length>) -> OptResult<()> {
        let node = self.node_mut(id)?;
        if node.points.iter().any(|p| p.name == name) {
            return Err(OptraceError::Frame(format!(
                "point '{name}' already defined on frame '{}'",
                node.name
            )));
        }
        let local = local.map(|c| c.value);
        let world = node.pose.from_relative(&local);
        node.points.push(NamedPoint {
            name: name.to_owned(),
            local,
            world,
        });
        Ok(())
    }
    /// Attach a named direction (given in local coordinates) to a frame.
    ///
    /// # Errors
    ///
    /// This function will return an error if the frame is unknown, the direction has zero length or the name is
    /// already used on this frame.
    pub fn add_direction(&mut self, id: FrameId, name: &str, local: Vector3<f64>) -> OptResult<()> {
        let local = Unit::try_new(local, f64::EPSILON)
            .ok_or_else(|| OptraceError::Degenerate("direction must have a non-zero length".into()))?
            .into_inner();
        let node = self.node_mut(id)?;
        if node.directions.iter().any(|d| d.name == name) {
            return Err(OptraceError::Frame(format!(
                "direction '{name}' already defined on frame '{}'",
                node.name
            )));
        }
        let world = node.pose.from_relative_vec(&local);
        node.directions.push(NamedDirection {
            name: name.to_owned(),
            local,
            world,
        });
        Ok(())
    }
    /// World coordinates of a named point.
    ///
    /// # Errors
    ///
    /// This function will return an error if the frame is stale or the point is unknown.
    pub fn point(&self, id: FrameId, name: &str) -> OptResult<Point3<f64>> {
        self.check_fresh(id)?;
        let node = self.node(id)?;
        node.points
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.world)
            .ok_or_else(|| {
                OptraceError::Frame(format!("frame '{}' has no point '{name}'", node.name))
            })
    }
    /// World coordinates of a named direction.
    ///
    /// # Errors
    ///
    /// This function will return an error if the frame is stale or the direction is unknown.
    pub fn direction(&self, id: FrameId, name: &str) -> OptResult<Vector3<f64>> {
        self.check_fresh(id)?;
        let node = self.node(id)?;
        node.directions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.world)
            .ok_or_else(|| {
                OptraceError::Frame(format!("frame '{}' has no direction '{name}'", node.name))
            })
    }
    /// Returns `true` if the pose of the frame does not reflect the current axis values of the frame or one of
    /// its ancestors.
    ///
    /// # Errors
    ///
    /// This function will return an error if the id is unknown.
    pub fn is_stale(&self, id: FrameId) -> OptResult<bool> {
        let mut current = self.node(id)?;
        loop {
            if current.dirty {
                return Ok(true);
            }
            let Some(parent_id) = current.parent else {
                return Ok(false);
            };
            let parent = self.node(parent_id)?;
            if parent.generation != current.parent_generation {
                return Ok(true);
            }
            current = parent;
        }
    }
    fn check_fresh(&self, id: FrameId) -> OptResult<()> {
        if self.is_stale(id)? {
            return Err(OptraceError::Frame(format!(
                "frame '{}' must be recalculated before use",
                self.node(id)?.name
            )));
        }
        Ok(())
    }
    /// Returns the resolved pose of a frame.
    ///
    /// # Errors
    ///
    /// This function will return an error if the frame is unknown or stale.
    pub fn pose(&self, id: FrameId) -> OptResult<&Pose> {
        self.check_fresh(id)?;
        Ok(&self.node(id)?.pose)
    }
    /// Recompute all stale frames in root-to-leaf order.
    ///
    /// # Errors
    ///
    /// This function will return an error if a frame configuration is degenerate (e.g. collinear tripod legs or
    /// a zero rotation axis). Frames processed before the failing one stay resolved.
    pub fn recalculate(&mut self) -> OptResult<()> {
        for index in 1..self.nodes.len() {
            if self.needs_update(index) {
                self.recompute(index)?;
            }
        }
        Ok(())
    }
    /// Lazily recompute the given frame and its ancestors (root first) and return its pose.
    ///
    /// # Errors
    ///
    /// This function will return an error if the frame is unknown or a frame configuration on the path is
    /// degenerate.
    pub fn resolve(&mut self, id: FrameId) -> OptResult<Pose> {
        self.node(id)?;
        let mut chain = vec![id.0];
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            chain.push(parent.0);
            current = parent;
        }
        for &index in chain.iter().rev() {
            if self.needs_update(index) {
                self.recompute(index)?;
            }
        }
        Ok(self.nodes[id.0].pose)
    }
    fn needs_update(&self, index: usize) -> bool {
        let node = &self.nodes[index];
        node.dirty
            || node
                .parent
                .is_some_and(|p| self.nodes[p.0].generation != node.parent_generation)
    }
    fn recompute(&mut self, index: usize) -> OptResult<()> {
        let Some(parent) = self.nodes[index].parent else {
            return Ok(());
        };
        let parent_pose = self.nodes[parent.0].pose;
        let parent_generation = self.nodes[parent.0].generation;
        let node = &self.nodes[index];
        let pose = Self::compute_pose(node.kind, &node.axes, &parent_pose).map_err(|e| match e {
            OptraceError::Degenerate(m) => {
                OptraceError::Degenerate(format!("frame '{}': {m}", node.name))
            }
            other => other,
        })?;
        let node = &mut self.nodes[index];
        node.pose = pose;
        node.dirty = false;
        node.generation += 1;
        node.parent_generation = parent_generation;
        for point in &mut node.points {
            point.world = pose.from_relative(&point.local);
        }
        for direction in &mut node.directions {
            direction.world = pose.from_relative_vec(&direction.local);
        }
        Ok(())
    }
    fn compute_pose(kind: FrameKind, axes: &[f64], parent: &Pose) -> OptResult<Pose> {
        match kind {
            FrameKind::World => Ok(Pose::identity()),
            FrameKind::Translated => Ok(parent.translated(&Vector3::new(axes[0], axes[1], axes[2]))),
            FrameKind::Rotated => {
                let axis = Unit::try_new(Vector3::new(axes[1], axes[2], axes[3]), f64::EPSILON)
                    .ok_or_else(|| {
                        OptraceError::Degenerate("rotation axis must have a non-zero length".into())
                    })?;
                Ok(parent.rotated(&UnitQuaternion::from_axis_angle(&axis, axes[0])))
            }
            FrameKind::Tripod => {
                let (center, rotation) =
                    tripod::solve(&[axes[0], axes[1], axes[2]], axes[3], axes[4])?;
                Ok(Pose::new(
                    parent.rotation() * rotation,
                    parent.from_relative(&center),
                ))
            }
        }
    }
}
