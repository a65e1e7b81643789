//! # Query — Visiting Entities by Required Components
//!
//! A [`Query`] names a required tag set and visits every enabled entity whose
//! tag set contains it. The `Enabled` marker is added to the requirement
//! implicitly, so disabling an entity hides it from every query without
//! touching its other components.
//!
//! ```ignore
//! let mut query = Query::of::<(Transform, Lifetime)>();
//! query.for_each(world, |world, entity| {
//!     let lifetime = world.get_mut::<Lifetime>(entity).unwrap();
//!     lifetime.remaining -= dt;
//! });
//! ```
//!
//! ## Resolution
//!
//! The required set is turned into a list of matching tag sets through the
//! world's superset cache. The query keeps that list and the cache generation
//! it was read at, and re-reads only after a new tag set has been linked.
//!
//! ## Iteration
//!
//! [`for_each`](Query::for_each) snapshots the matching entities, then runs
//! the callback inside a transaction. Structural changes made by the callback
//! (adding or removing components, creating or destroying entities) commit
//! after the last visit, so the callback never sees the lists shift and never
//! visits an entity twice.
//!
//! A query resolves component ids against the first world it runs on and must
//! not be shared between worlds.

use super::component::{Component, ComponentId, ComponentRegistry};
use super::entity::Entity;
use super::tag_set::TagSet;
use super::world::World;

/// A group of component types, expressed as a tuple: `(A,)`, `(A, B)`, ...
pub trait ComponentSet {
    /// Push the id of each member, registering types not seen before.
    fn register(registry: &mut ComponentRegistry, ids: &mut Vec<ComponentId>);

    fn tag_set(registry: &mut ComponentRegistry) -> TagSet {
        let mut ids = Vec::new();
        Self::register(registry, &mut ids);
        TagSet::from_ids(ids)
    }
}

macro_rules! impl_component_set_tuple {
    ($($C:ident),+) => {
        impl<$($C: Component),+> ComponentSet for ($($C,)+) {
            fn register(registry: &mut ComponentRegistry, ids: &mut Vec<ComponentId>) {
                $(ids.push(registry.register::<$C>());)+
            }
        }
    };
}

impl_component_set_tuple!(A);
impl_component_set_tuple!(A, B);
impl_component_set_tuple!(A, B, C);
impl_component_set_tuple!(A, B, C, D);
impl_component_set_tuple!(A, B, C, D, E);
impl_component_set_tuple!(A, B, C, D, E, F);
impl_component_set_tuple!(A, B, C, D, E, F, G);
impl_component_set_tuple!(A, B, C, D, E, F, G, H);

enum Required {
    Types(fn(&mut ComponentRegistry) -> TagSet),
    Tags(TagSet),
}

pub struct Query {
    required: Required,
    /// Requirement plus `Enabled`, fixed on first use.
    full: Option<TagSet>,
    resolved: Vec<TagSet>,
    generation: Option<u64>,
}

impl Query {
    /// Query for the component types in `C`.
    pub fn of<C: ComponentSet>() -> Self {
        Self::from_required(Required::Types(C::tag_set))
    }

    /// Query for an explicit tag set.
    pub fn with_tags(tags: TagSet) -> Self {
        Self::from_required(Required::Tags(tags))
    }

    fn from_required(required: Required) -> Self {
        Self {
            required,
            full: None,
            resolved: Vec::new(),
            generation: None,
        }
    }

    /// Register the query's tag set with `world` ahead of the first run.
    pub fn prepare(&mut self, world: &mut World) {
        self.refresh(world);
    }

    /// The required tag set including `Enabled`, once resolved.
    pub fn required(&self) -> Option<&TagSet> {
        self.full.as_ref()
    }

    fn refresh(&mut self, world: &mut World) {
        if self.full.is_none() {
            let base = match &self.required {
                Required::Types(tag_set) => tag_set(world.registry_mut()),
                Required::Tags(tags) => tags.clone(),
            };
            self.full = Some(base.add(world.enabled_id()));
        }
        let Some(full) = &self.full else {
            return;
        };
        if self.generation != Some(world.index_generation()) {
            self.resolved = world.supersets_of(full);
            self.generation = Some(world.index_generation());
        }
    }

    /// Matching entities as of now. Queued changes are not reflected.
    pub fn entities(&mut self, world: &mut World) -> Vec<Entity> {
        self.refresh(world);
        let mut out = Vec::new();
        for set in &self.resolved {
            out.extend_from_slice(world.entities_with_tags(set));
        }
        out
    }

    pub fn count(&mut self, world: &mut World) -> usize {
        self.refresh(world);
        self.resolved
            .iter()
            .map(|set| world.entities_with_tags(set).len())
            .sum()
    }

    /// Visit every matching entity inside a transaction.
    pub fn for_each(&mut self, world: &mut World, mut f: impl FnMut(&mut World, Entity)) {
        let snapshot = self.entities(world);
        world.begin_deferred();
        for entity in snapshot {
            f(world, entity);
        }
        world.end_deferred();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Velocity(f32);

    impl Component for Velocity {
        fn duplicate(&self) -> Option<Self> {
            Some(self.clone())
        }
    }

    #[derive(Clone)]
    struct Frozen;

    impl Component for Frozen {
        fn duplicate(&self) -> Option<Self> {
            Some(Frozen)
        }
    }

    fn sorted(mut v: Vec<Entity>) -> Vec<Entity> {
        v.sort();
        v
    }

    #[test]
    fn matches_supersets_only() {
        let mut world = World::new();
        let moving = world.create_entity();
        world.add_component(moving, Velocity(1.0));
        let frozen = world.create_entity();
        world.add_component(frozen, Velocity(0.0));
        world.add_component(frozen, Frozen);
        let _bare = world.create_entity();

        let mut query = Query::of::<(Velocity,)>();
        assert_eq!(sorted(query.entities(&mut world)), vec![moving, frozen]);
        let mut frozen_only = Query::of::<(Velocity, Frozen)>();
        assert_eq!(frozen_only.entities(&mut world), vec![frozen]);
    }

    #[test]
    fn disable_hides_and_enable_restores() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, Velocity(1.0));
        let mut query = Query::of::<(Velocity,)>();
        let before = query.entities(&mut world);

        world.disable(e);
        assert!(query.entities(&mut world).is_empty());
        assert!(world.has::<Velocity>(e));

        world.enable(e);
        assert_eq!(query.entities(&mut world), before);
    }

    #[test]
    fn query_prepared_before_entities_sees_them() {
        let mut world = World::new();
        let mut query = Query::of::<(Velocity,)>();
        query.prepare(&mut world);
        assert_eq!(query.count(&mut world), 0);

        let e = world.create_entity();
        world.add_component(e, Frozen);
        world.add_component(e, Velocity(2.0));
        assert_eq!(query.entities(&mut world), vec![e]);
    }

    #[test]
    fn changes_inside_for_each_commit_afterwards() {
        let mut world = World::new();
        for _ in 0..3 {
            let e = world.create_entity();
            world.add_component(e, Velocity(1.0));
        }
        let mut query = Query::of::<(Velocity,)>();
        let mut frozen = Query::of::<(Frozen,)>();

        let mut visits = 0;
        query.for_each(&mut world, |world, entity| {
            visits += 1;
            world.add_component(entity, Frozen);
            let spawned = world.create_entity();
            world.add_component(spawned, Velocity(5.0));
            // Not yet indexed while the visit is running.
            assert_eq!(frozen.entities(world).len(), 0);
        });

        assert_eq!(visits, 3);
        assert_eq!(frozen.count(&mut world), 3);
        assert_eq!(query.count(&mut world), 6);
    }

    #[test]
    fn destroy_inside_for_each_is_deferred() {
        let mut world = World::new();
        let a = world.create_entity();
        world.add_component(a, Velocity(1.0));
        let b = world.create_entity();
        world.add_component(b, Velocity(1.0));

        let mut query = Query::of::<(Velocity,)>();
        let mut seen = Vec::new();
        query.for_each(&mut world, |world, entity| {
            seen.push(entity);
            world.destroy_entity(a);
            world.destroy_entity(b);
        });

        assert_eq!(seen.len(), 2);
        assert_eq!(query.count(&mut world), 0);
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn values_written_in_callback_are_visible() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, Velocity(1.0));
        let mut query = Query::of::<(Velocity,)>();
        query.for_each(&mut world, |world, entity| {
            if let Some(v) = world.get_mut::<Velocity>(entity) {
                v.0 *= 3.0;
            }
        });
        assert_eq!(world.get::<Velocity>(e).map(|v| v.0), Some(3.0));
    }

    #[test]
    fn empty_requirement_matches_every_enabled_entity() {
        let mut world = World::new();
        let a = world.create_entity();
        let b = world.create_entity();
        world.add_component(b, Frozen);
        let c = world.create_entity();
        world.disable(c);
        let mut all = Query::with_tags(TagSet::new());
        assert_eq!(sorted(all.entities(&mut world)), vec![a, b]);
    }
}
