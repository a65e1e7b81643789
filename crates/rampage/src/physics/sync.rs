//! # Physics ↔ ECS Sync
//!
//! Bodies live in the [`PhysicsWorld`] resource; entities refer to them
//! through a [`RigidBodyComponent`] holding a [`BodyHandle`]. Each tick,
//! [`physics_system`] runs:
//!
//! ```text
//! Transform ──(changed?)──▶ RigidBody      sync in
//!        dead owners ──▶ mark for deletion
//!                 PhysicsWorld::step(dt)
//! RigidBody ──(changed?)──▶ Transform      sync out
//!          events ──▶ CollisionEvents resource
//! ```
//!
//! Writing a new position into a body goes through
//! [`RigidBody::set_position`](super::body::RigidBody::set_position), so a
//! transform teleported by game logic carries that jump as velocity into
//! the step.

use super::body::{BodyDesc, BodyHandle};
use super::world::{CollisionEvent, PhysicsWorld};
use crate::app::{App, Plugin};
use crate::ecs::{Component, Entity, Query, World};
use crate::math::Transform;
use crate::time::FixedTime;

/// Installs a [`PhysicsWorld`] sized from the app's config and the
/// [`physics_system`].
pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        let physics = PhysicsWorld::from_config(app.config());
        app.world.insert_resource(physics);
        app.world.insert_resource(CollisionEvents::default());
        app.schedule.add_system(physics_system());
    }
}

/// Links an entity to its body. Removing the component (or destroying the
/// entity) marks the body for deletion at the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RigidBodyComponent {
    pub handle: BodyHandle,
}

impl Component for RigidBodyComponent {
    fn duplicate(&self) -> Option<Self> {
        None
    }

    fn on_remove(self, world: &mut World) {
        match world.get_resource_mut::<PhysicsWorld>() {
            Some(physics) => {
                physics.mark_for_deletion(self.handle);
            }
            None => {
                log::debug!(
                    "body {:?} released while the physics world is checked out",
                    self.handle
                );
            }
        }
    }
}

/// Collision pairs from the most recent physics step.
#[derive(Debug, Clone, Default)]
pub struct CollisionEvents(pub Vec<CollisionEvent>);

impl CollisionEvents {
    pub fn iter(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Create a body for `entity` and attach the component linking them.
///
/// The body starts at the entity's [`Transform`] when it has one; otherwise
/// the entity gets a transform matching `desc`. Returns `None` if the entity
/// is dead or there is no [`PhysicsWorld`] resource.
pub fn attach_body(world: &mut World, entity: Entity, desc: BodyDesc) -> Option<BodyHandle> {
    if !world.is_alive(entity) {
        return None;
    }
    let desc = match world.get::<Transform>(entity) {
        Some(transform) => desc.at(transform.position).with_rotation(transform.rotation),
        None => {
            world.add_component(
                entity,
                Transform {
                    position: desc.position,
                    rotation: desc.rotation,
                },
            );
            desc
        }
    };
    let handle = world
        .get_resource_mut::<PhysicsWorld>()?
        .create(desc.with_user_data(entity));
    // Replacing an existing link runs its removal hook, releasing the old body.
    world.add_component(entity, RigidBodyComponent { handle });
    Some(handle)
}

/// The system that drives [`PhysicsWorld`] one fixed tick per run.
///
/// The step length comes from the [`FixedTime`] resource, defaulting to
/// 1/60 s when it is missing. Does nothing without a [`PhysicsWorld`].
pub fn physics_system() -> impl FnMut(&mut World) + Send {
    let mut linked = Query::of::<(Transform, RigidBodyComponent)>();
    move |world: &mut World| {
        let Some(mut physics) = world.resource_remove::<PhysicsWorld>() else {
            return;
        };
        let dt = world
            .get_resource::<FixedTime>()
            .map_or(1.0 / 60.0, FixedTime::delta_secs);

        let entities = linked.entities(world);
        for &entity in &entities {
            let (Some(transform), Some(link)) = (
                world.get::<Transform>(entity),
                world.get::<RigidBodyComponent>(entity),
            ) else {
                continue;
            };
            let Some(body) = physics.body_mut(link.handle) else {
                continue;
            };
            if body.position() != transform.position {
                body.set_position(transform.position);
            }
            if body.rotation() != transform.rotation {
                body.set_rotation(transform.rotation);
            }
        }

        let orphaned: Vec<BodyHandle> = physics
            .bodies()
            .filter(|b| !b.is_marked_for_deletion())
            .filter(|b| b.user_data().is_some_and(|owner| !world.is_alive(owner)))
            .map(|b| b.handle())
            .collect();
        for handle in orphaned {
            log::trace!("body {handle:?} lost its owner");
            physics.mark_for_deletion(handle);
        }

        physics.step(dt);

        for &entity in &entities {
            let Some(link) = world.get::<RigidBodyComponent>(entity).copied() else {
                continue;
            };
            let Some(body) = physics.body(link.handle) else {
                continue;
            };
            let (position, rotation) = (body.position(), body.rotation());
            if let Some(transform) = world.get_mut::<Transform>(entity) {
                if transform.position != position {
                    transform.position = position;
                }
                if transform.rotation != rotation {
                    transform.rotation = rotation;
                }
            }
        }

        world.insert_resource(CollisionEvents(physics.events().to_vec()));
        world.insert_resource(physics);
    }
}
