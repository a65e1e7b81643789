//! Math types and glam re-exports.
//!
//! Everything is 2D: positions are [`Vec2`] and rotations are angles in
//! radians (counter-clockwise). [`Transform`] is the component game logic
//! reads and writes; the physics sync step mirrors it into rigid bodies.

pub use glam::Vec2;

use serde::{Deserialize, Serialize};

use crate::ecs::Component;

/// Rotate `v` counter-clockwise by `angle` radians.
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Position and rotation of an entity in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
    pub rotation: f32,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation: 0.0,
    };

    pub fn from_xy(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            rotation: 0.0,
        }
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Map a point from this transform's local frame into world space.
    pub fn world_point(&self, local: Vec2) -> Vec2 {
        rotate(local, self.rotation) + self.position
    }

    /// Map a world-space point into this transform's local frame.
    pub fn local_point(&self, world: Vec2) -> Vec2 {
        rotate(world - self.position, -self.rotation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for Transform {
    fn duplicate(&self) -> Option<Self> {
        Some(*self)
    }
}
