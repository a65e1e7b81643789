//! Rigid bodies with position-delta (Verlet-style) integration.
//!
//! A body stores no velocity. Its velocity is whatever moved it last step:
//! `position - previous_position`. Each step re-applies that delta, so a
//! body keeps drifting until something changes `previous_position`.
//!
//! That makes the manipulation methods differ in a way that matters:
//!
//! | method                  | position    | previous position | net velocity       |
//! |-------------------------|-------------|-------------------|--------------------|
//! | `set_position(p)`       | `p`         | old position      | `p - old`          |
//! | `move_by(d)`            | `+= d`      | old position      | `d`                |
//! | `translate(d)`          | `+= d`      | unchanged         | `old velocity + d` |
//! | `set_linear_velocity(v)`| unchanged   | `position - v`    | `v`                |
//! | `apply_linear_velocity` | unchanged   | `-= v`            | `old velocity + v` |

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::fixture::Fixture;
use crate::ecs::Entity;

/// Handle to a body owned by a [`PhysicsWorld`](super::world::PhysicsWorld).
/// Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub(crate) u32);

impl BodyHandle {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Everything needed to create a body.
///
/// ```ignore
/// let desc = BodyDesc::dynamic(Fixture::circle(1.0, 5.0))
///     .at(Vec2::new(100.0, 50.0))
///     .with_masks(PLAYER, ENEMY | WALL);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub position: Vec2,
    pub rotation: f32,
    pub is_static: bool,
    pub fixture: Fixture,
    pub self_mask: u32,
    pub collision_mask: u32,
    pub linear_damping: f32,
    pub user_data: Option<Entity>,
}

impl BodyDesc {
    pub fn dynamic(fixture: Fixture) -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            is_static: false,
            fixture,
            self_mask: 1,
            collision_mask: u32::MAX,
            linear_damping: 1.0,
            user_data: None,
        }
    }

    pub fn fixed(fixture: Fixture) -> Self {
        Self {
            is_static: true,
            ..Self::dynamic(fixture)
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// `self_mask` is the layers this body is on; `collision_mask` the layers
    /// it collides with.
    pub fn with_masks(mut self, self_mask: u32, collision_mask: u32) -> Self {
        self.self_mask = self_mask;
        self.collision_mask = collision_mask;
        self
    }

    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    pub fn with_user_data(mut self, owner: Entity) -> Self {
        self.user_data = Some(owner);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RigidBody {
    handle: BodyHandle,
    position: Vec2,
    previous_position: Vec2,
    rotation: f32,
    angular_velocity: f32,
    /// Fraction of the derived velocity kept each step. 1.0 keeps all of it.
    linear_damping: f32,
    fixture: Fixture,
    self_mask: u32,
    collision_mask: u32,
    is_static: bool,
    mass: f32,
    user_data: Option<Entity>,
    marked_for_deletion: bool,
}

impl RigidBody {
    pub(crate) fn new(handle: BodyHandle, desc: BodyDesc) -> Self {
        let mut body = Self {
            handle,
            position: desc.position,
            previous_position: desc.position,
            rotation: desc.rotation,
            angular_velocity: 0.0,
            linear_damping: desc.linear_damping,
            fixture: desc.fixture,
            self_mask: desc.self_mask,
            collision_mask: desc.collision_mask,
            is_static: desc.is_static,
            mass: 0.0,
            user_data: desc.user_data,
            marked_for_deletion: false,
        };
        body.attach_fixture(desc.fixture);
        body
    }

    pub fn handle(&self) -> BodyHandle {
        self.handle
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn previous_position(&self) -> Vec2 {
        self.previous_position
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Displacement per step, derived from the last two positions.
    pub fn linear_velocity(&self) -> Vec2 {
        self.position - self.previous_position
    }

    pub fn linear_damping(&self) -> f32 {
        self.linear_damping
    }

    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    pub fn self_mask(&self) -> u32 {
        self.self_mask
    }

    pub fn collision_mask(&self) -> u32 {
        self.collision_mask
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Zero for static bodies, otherwise the fixture's mass.
    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn user_data(&self) -> Option<Entity> {
        self.user_data
    }

    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked_for_deletion
    }

    pub fn aabb(&self) -> Aabb {
        self.fixture.aabb(self.position, self.rotation)
    }

    /// Jump to `position`; the jump becomes the body's velocity.
    pub fn set_position(&mut self, position: Vec2) {
        self.previous_position = self.position;
        self.position = position;
    }

    /// Move by `delta`; `delta` becomes the body's velocity.
    pub fn move_by(&mut self, delta: Vec2) {
        self.previous_position = self.position;
        self.position += delta;
    }

    /// Shift by `delta` without resetting the previous position.
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    pub fn rotate(&mut self, angle: f32) {
        self.rotation += angle;
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.previous_position = self.position - velocity;
    }

    pub fn apply_linear_velocity(&mut self, velocity: Vec2) {
        self.previous_position -= velocity;
    }

    pub fn set_angular_velocity(&mut self, velocity: f32) {
        self.angular_velocity = velocity;
    }

    pub fn apply_angular_velocity(&mut self, velocity: f32) {
        self.angular_velocity += velocity;
    }

    pub fn set_linear_damping(&mut self, damping: f32) {
        self.linear_damping = damping;
    }

    pub fn set_self_mask(&mut self, mask: u32) {
        self.self_mask = mask;
    }

    pub fn set_collision_mask(&mut self, mask: u32) {
        self.collision_mask = mask;
    }

    pub fn set_user_data(&mut self, owner: Option<Entity>) {
        self.user_data = owner;
    }

    /// Replace the fixture and recompute mass.
    pub fn attach_fixture(&mut self, fixture: Fixture) {
        self.fixture = fixture;
        self.mass = if self.is_static { 0.0 } else { fixture.mass };
    }

    /// Each body's collision mask must accept the other's layer.
    pub fn can_collide_with(&self, other: &RigidBody) -> bool {
        self.collision_mask & other.self_mask != 0 && other.collision_mask & self.self_mask != 0
    }

    pub(crate) fn mark_for_deletion(&mut self) {
        self.marked_for_deletion = true;
    }

    pub(crate) fn integrate(&mut self, dt: f32) {
        let velocity = (self.position - self.previous_position) * self.linear_damping;
        self.previous_position = self.position;
        self.position += velocity;
        self.rotation += self.angular_velocity * dt;
    }
}
