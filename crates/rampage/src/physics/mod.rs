//! # 2D Arcade Physics
//!
//! Position-based rigid bodies with one fixture each (circle or rectangle),
//! a quad-tree broadphase rebuilt every step, SAT narrowphase and a purely
//! positional resolver. There is no impulse response; overlapping bodies are
//! pushed apart and the push becomes their velocity for the next step.
//!
//! ## Module Overview
//!
//! - [`aabb`] — Axis-aligned boxes and quadrant splitting
//! - [`fixture`] — Circle and rectangle shapes
//! - [`body`] — Rigid bodies and their creation descriptors
//! - [`quadtree`] — Region quad-tree over bounding boxes
//! - [`narrowphase`] — Exact overlap tests and manifolds
//! - [`resolve`] — Mass-weighted positional separation
//! - [`world`] — The stepped physics world and its collision events
//! - [`sync`] — ECS components, resources and the physics system

pub mod aabb;
pub mod body;
pub mod fixture;
pub mod narrowphase;
pub mod quadtree;
pub mod resolve;
pub mod sync;
pub mod world;

pub use aabb::Aabb;
pub use body::{BodyDesc, BodyHandle, RigidBody};
pub use fixture::{Fixture, Shape};
pub use narrowphase::Manifold;
pub use quadtree::QuadTree;
pub use sync::{CollisionEvents, PhysicsPlugin, RigidBodyComponent, attach_body, physics_system};
pub use world::{CollisionEvent, PhysicsWorld};
