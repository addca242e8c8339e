//! 2D transform component.
//!
//! [`Transform2D`] holds an entity's position, rotation and size on the
//! plane, plus an optional parent whose movements it follows. Positions are
//! in double precision so they can be advanced by the `f64` frame delta
//! directly.

use engine_component::{Component, Entity};
use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};

/// A 2D transform with an optional parent.
///
/// The parent link is data only. Whoever owns the transforms is responsible
/// for moving children when their parent moves.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform2D {
    /// Position of the entity's centre.
    pub position: DVec2,
    /// Rotation in radians, counter-clockwise.
    pub rotation: f64,
    /// Width and height.
    pub size: DVec2,
    /// The entity this transform follows, or [`Entity::INVALID`] for none.
    pub parent: Entity,
}

impl Transform2D {
    /// The identity transform: origin, no rotation, unit size, no parent.
    pub const IDENTITY: Self = Self {
        position: DVec2::ZERO,
        rotation: 0.0,
        size: DVec2::ONE,
        parent: Entity::INVALID,
    };

    /// Create a transform at `(x, y)` with default rotation and size.
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: DVec2::new(x, y),
            ..Self::IDENTITY
        }
    }

    /// Set the parent.
    #[must_use]
    pub fn with_parent(mut self, parent: Entity) -> Self {
        self.parent = parent;
        self
    }

    /// Set the size.
    #[must_use]
    pub fn with_size(mut self, size: DVec2) -> Self {
        self.size = size;
        self
    }

    /// Returns `true` if the transform follows another entity.
    #[must_use]
    pub fn has_parent(&self) -> bool {
        self.parent.is_valid()
    }

    /// Turn an absolute target position into the offset that reaches it.
    #[must_use]
    pub fn offset_to(&self, target: DVec2) -> DVec2 {
        target - self.position
    }

    /// Move by `offset`.
    pub fn translate(&mut self, offset: DVec2) {
        self.position += offset;
    }

    /// Compute the affine matrix for this transform (scale, rotate, then
    /// translate).
    #[must_use]
    pub fn to_affine(&self) -> DAffine2 {
        DAffine2::from_scale_angle_translation(self.size, self.rotation, self.position)
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for Transform2D {
    fn type_name() -> &'static str {
        "Transform2D"
    }
}
