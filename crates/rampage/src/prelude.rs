//! Convenience re-exports: `use rampage::prelude::*` for the common items.

pub use crate::app::{App, Plugin, SimHandle, Simulation};
pub use crate::config::{ConfigError, QuadTreeConfig, SimConfig};
pub use crate::ecs::{Component, ComponentSet, Entity, Query, Schedule, System, TagSet, World};
pub use crate::gameplay::{
    GameState, GameplayPlugin, Guarded, Health, Hostile, Lifetime, Projectile, damage_system,
    health_system, lifetime_system,
};
pub use crate::math::{Transform, Vec2};
pub use crate::physics::{
    Aabb, BodyDesc, BodyHandle, CollisionEvent, CollisionEvents, Fixture, PhysicsPlugin,
    Manifold, PhysicsWorld, QuadTree, RigidBody, RigidBodyComponent, Shape, attach_body,
    physics_system,
};
pub use crate::time::{FixedTime, TickClock};
