//! Survival-game rules built on the store and the physics events.
//!
//! - [`Lifetime`] entities are destroyed once their time runs out.
//! - [`Health`] entities are destroyed at zero health.
//! - [`damage_system`] turns the tick's [`CollisionEvents`] into damage:
//!   a [`Projectile`] hitting a [`Hostile`] spends one hit and kills the
//!   hostile for a point; a hostile touching a [`Health`] holder costs it one
//!   health, and touching a [`Guarded`] entity costs the base one integrity.

use serde::{Deserialize, Serialize};

use crate::app::{App, Plugin};
use crate::ecs::{Component, Entity, Query, World};
use crate::physics::sync::CollisionEvents;
use crate::time::FixedTime;

/// Destroys its entity when `remaining` drops below zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifetime {
    /// Seconds left.
    pub remaining: f32,
}

impl Lifetime {
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Component for Lifetime {
    fn duplicate(&self) -> Option<Self> {
        Some(*self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub points: i32,
}

impl Health {
    pub fn new(points: i32) -> Self {
        Self { points }
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(50)
    }
}

impl Component for Health {
    fn duplicate(&self) -> Option<Self> {
        Some(*self)
    }
}

/// A bullet. It survives `hits_left` further hits after the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projectile {
    pub hits_left: i32,
}

impl Default for Projectile {
    fn default() -> Self {
        Self { hits_left: 5 }
    }
}

impl Component for Projectile {
    fn duplicate(&self) -> Option<Self> {
        Some(*self)
    }
}

/// Marks enemies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hostile;

impl Component for Hostile {
    fn duplicate(&self) -> Option<Self> {
        Some(Hostile)
    }
}

/// Marks entities whose contact with a hostile damages the base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Guarded;

impl Component for Guarded {
    fn duplicate(&self) -> Option<Self> {
        Some(Guarded)
    }
}

/// Score and base integrity for the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameState {
    pub score: u32,
    pub base_integrity: i32,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            score: 0,
            base_integrity: 100,
        }
    }
}

pub fn lifetime_system() -> impl FnMut(&mut World) + Send {
    let mut query = Query::of::<(Lifetime,)>();
    move |world: &mut World| {
        let dt = world
            .get_resource::<FixedTime>()
            .map_or(1.0 / 60.0, FixedTime::delta_secs);
        query.for_each(world, |world, entity| {
            let Some(lifetime) = world.get_mut::<Lifetime>(entity) else {
                return;
            };
            lifetime.remaining -= dt;
            if lifetime.remaining < 0.0 {
                world.destroy_entity(entity);
            }
        });
    }
}

pub fn health_system() -> impl FnMut(&mut World) + Send {
    let mut query = Query::of::<(Health,)>();
    move |world: &mut World| {
        query.for_each(world, |world, entity| {
            if world.get::<Health>(entity).is_some_and(|h| h.points <= 0) {
                log::debug!("{entity:?} ran out of health");
                world.destroy_entity(entity);
            }
        });
    }
}

/// Apply the tick's collisions. Events naming a dead or missing entity are
/// skipped; destruction is queued until every event is handled.
pub fn damage_system(world: &mut World) {
    let Some(events) = world.get_resource::<CollisionEvents>() else {
        return;
    };
    let pairs: Vec<(Entity, Entity)> = events
        .iter()
        .filter_map(|e| Some((e.user_a?, e.user_b?)))
        .collect();
    if pairs.is_empty() {
        return;
    }

    world.deferred(|world| {
        for (a, b) in pairs {
            if !world.is_alive(a) || !world.is_alive(b) {
                continue;
            }
            let projectile_hit = (world.has::<Projectile>(a) && world.has::<Hostile>(b))
                || (world.has::<Projectile>(b) && world.has::<Hostile>(a));
            if projectile_hit {
                strike(world, a);
                strike(world, b);
            }

            let base_hit = (world.has::<Guarded>(a) && world.has::<Hostile>(b))
                || (world.has::<Guarded>(b) && world.has::<Hostile>(a));
            if base_hit {
                if let Some(state) = world.get_resource_mut::<GameState>() {
                    state.base_integrity -= 1;
                }
            }

            let health_hit = (world.has::<Health>(a) && world.has::<Hostile>(b))
                || (world.has::<Health>(b) && world.has::<Hostile>(a));
            if health_hit {
                for side in [a, b] {
                    if let Some(health) = world.get_mut::<Health>(side) {
                        health.points -= 1;
                    }
                }
            }
        }
    });
}

/// One side of a projectile/hostile contact.
fn strike(world: &mut World, entity: Entity) {
    if let Some(projectile) = world.get_mut::<Projectile>(entity) {
        projectile.hits_left -= 1;
        if projectile.hits_left < 0 {
            world.destroy_entity(entity);
        }
    } else if world.has::<Hostile>(entity) {
        world.destroy_entity(entity);
        if let Some(state) = world.get_resource_mut::<GameState>() {
            state.score += 1;
        }
    }
}

/// Installs [`GameState`] and the lifetime, damage and health systems.
/// Add it after the physics plugin so damage sees the current tick's events.
pub struct GameplayPlugin;

impl Plugin for GameplayPlugin {
    fn build(&self, app: &mut App) {
        if !app.world.has_resource::<GameState>() {
            app.world.insert_resource(GameState::default());
        }
        app.schedule.add_system(lifetime_system());
        app.schedule.add_system(damage_system);
        app.schedule.add_system(health_system());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::world::CollisionEvent;
    use crate::physics::BodyHandle;

    fn event(a: Entity, b: Entity) -> CollisionEvent {
        CollisionEvent {
            body_a: BodyHandle(1),
            body_b: BodyHandle(2),
            user_a: Some(a),
            user_b: Some(b),
        }
    }

    fn game_world() -> World {
        let mut world = World::new();
        world.insert_resource(GameState::default());
        world
    }

    #[test]
    fn lifetime_expires() {
        let mut world = World::new();
        world.insert_resource(FixedTime::new(2));
        let e = world.create_entity();
        world.add_component(e, Lifetime::new(0.8));
        let mut system = lifetime_system();
        system(&mut world);
        assert!(world.is_alive(e));
        assert!((world.get::<Lifetime>(e).unwrap().remaining - 0.3).abs() < 1e-6);
        system(&mut world);
        assert!(!world.is_alive(e));
    }

    #[test]
    fn zero_health_destroys() {
        let mut world = World::new();
        let alive = world.create_entity();
        world.add_component(alive, Health::new(1));
        let dead = world.create_entity();
        world.add_component(dead, Health::new(0));
        let mut system = health_system();
        system(&mut world);
        assert!(world.is_alive(alive));
        assert!(!world.is_alive(dead));
    }

    #[test]
    fn projectile_kills_hostile_and_scores() {
        let mut world = game_world();
        let bullet = world.create_entity();
        let enemy = world.create_entity();
        world.insert_resource(CollisionEvents(vec![event(enemy, bullet)]));
        world.add_component(bullet, Projectile { hits_left: 1 });
        world.add_component(enemy, Hostile);

        damage_system(&mut world);

        assert!(!world.is_alive(enemy));
        assert!(world.is_alive(bullet));
        assert_eq!(world.get::<Projectile>(bullet).unwrap().hits_left, 0);
        assert_eq!(world.resource::<GameState>().score, 1);
    }

    #[test]
    fn projectile_out_of_hits_is_destroyed() {
        let mut world = game_world();
        let bullet = world.create_entity();
        let enemy = world.create_entity();
        world.add_component(bullet, Projectile { hits_left: 0 });
        world.add_component(enemy, Hostile);
        world.insert_resource(CollisionEvents(vec![event(bullet, enemy)]));
        damage_system(&mut world);
        assert!(!world.is_alive(bullet));
        assert!(!world.is_alive(enemy));
    }

    #[test]
    fn second_event_for_destroyed_entity_is_skipped() {
        let mut world = game_world();
        let bullet = world.create_entity();
        let enemy = world.create_entity();
        world.add_component(bullet, Projectile { hits_left: 5 });
        world.add_component(enemy, Hostile);
        world.insert_resource(CollisionEvents(vec![event(bullet, enemy), event(bullet, enemy)]));
        damage_system(&mut world);
        assert_eq!(world.get::<Projectile>(bullet).unwrap().hits_left, 4);
        assert_eq!(world.resource::<GameState>().score, 1);
    }

    #[test]
    fn hostile_contact_costs_health_and_integrity() {
        let mut world = game_world();
        let player = world.create_entity();
        let enemy = world.create_entity();
        world.add_component(player, Health::new(3));
        world.add_component(player, Guarded);
        world.add_component(enemy, Hostile);
        world.insert_resource(CollisionEvents(vec![event(enemy, player)]));
        damage_system(&mut world);
        assert_eq!(world.get::<Health>(player).unwrap().points, 2);
        assert_eq!(world.resource::<GameState>().base_integrity, 99);
        assert!(world.is_alive(enemy));
    }

    #[test]
    fn events_without_owner_are_ignored() {
        let mut world = game_world();
        let enemy = world.create_entity();
        world.add_component(enemy, Hostile);
        world.insert_resource(CollisionEvents(vec![CollisionEvent {
            body_a: BodyHandle(1),
            body_b: BodyHandle(2),
            user_a: Some(enemy),
            user_b: None,
        }]));
        damage_system(&mut world);
        assert!(world.is_alive(enemy));
    }
}
