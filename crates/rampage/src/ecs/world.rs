//! # World — The Entity/Component Store
//!
//! The [`World`] owns every entity, every component value and every resource.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ World                                                    │
//! │                                                          │
//! │  allocator:  generational entity slots                   │
//! │  registry:   TypeId → ComponentId                        │
//! │                                                          │
//! │  records:    entity index → EntityRecord                 │
//! │                { tags, row, ComponentId → value }        │
//! │                                                          │
//! │  index:      TagSet → Archetype { entities }             │
//! │              TagSet → [superset TagSets]                 │
//! │                                                          │
//! │  transaction: queued moves / destroys / new sets         │
//! │  resources:  TypeId → Box<dyn Any>                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Structural changes
//!
//! Adding a component the entity lacks, or removing one it has, moves the
//! entity to the archetype of its new tag set. Inside a transaction
//! ([`begin_deferred`](World::begin_deferred) / [`end_deferred`](World::end_deferred))
//! the move is queued and the value change is applied at once, so queries in
//! flight keep walking stable lists while `get` already sees new data.
//!
//! Commit applies the queue in a fixed order: superset links for tag sets
//! first seen during the transaction, then moves, then destructions.
//!
//! ## Resources
//!
//! Singletons not tied to an entity (the physics world, the fixed clock, game
//! state). Stored type-erased in a map, with the extract/reinsert
//! [`resource_remove`](World::resource_remove) escape hatch for code that
//! needs a resource and the world mutably at the same time.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use super::archetype::ArchetypeIndex;
use super::component::{Component, ComponentId, ComponentRegistry, Enabled, StoredComponent};
use super::deferred::{Pending, Transaction};
use super::entity::{Entity, EntityAllocator};
use super::query::ComponentSet;
use super::tag_set::TagSet;

/// Where an entity lives and what it holds.
struct EntityRecord {
    /// Committed tag set. A queued move may make the effective set differ.
    tags: TagSet,
    /// Row in the archetype for `tags`.
    row: usize,
    components: HashMap<ComponentId, StoredComponent>,
}

/// Counts for diagnostics output.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, serde::Serialize)]
pub struct WorldStats {
    pub entities: usize,
    pub entity_slots: usize,
    pub archetypes: usize,
    pub component_types: usize,
}

pub struct World {
    allocator: EntityAllocator,
    registry: ComponentRegistry,
    enabled: ComponentId,
    records: HashMap<u32, EntityRecord>,
    index: ArchetypeIndex,
    transaction: Transaction,
    resources: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl World {
    pub fn new() -> Self {
        let mut registry = ComponentRegistry::new();
        let enabled = registry.register::<Enabled>();

        let mut world = Self {
            allocator: EntityAllocator::new(),
            registry,
            enabled,
            records: HashMap::new(),
            index: ArchetypeIndex::new(),
            transaction: Transaction::new(),
            resources: HashMap::new(),
        };
        world.ensure_archetype(&TagSet::new());
        world.ensure_archetype(&TagSet::new().add(enabled));
        log::debug!("world created");
        world
    }

    // ── Entities ─────────────────────────────────────────────────────

    /// Create an enabled entity with no other components.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        let empty = TagSet::new();
        let row = self.place(entity, &empty);
        self.records.insert(
            entity.index,
            EntityRecord {
                tags: empty,
                row,
                components: HashMap::new(),
            },
        );
        self.enable(entity);
        entity
    }

    /// Destroy an entity, running every component's removal hook.
    ///
    /// Inside a transaction the destruction is queued and the entity stops
    /// reporting [`is_alive`](World::is_alive) immediately. Returns `false`
    /// for dead or stale handles and for entities already queued.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.allocator.is_alive(entity) {
            log::debug!("destroy of dead entity {entity:?} ignored");
            return false;
        }
        if self.transaction.is_active() {
            return self.transaction.record_destroy(entity);
        }
        self.destroy_now(entity);
        true
    }

    /// Live and not queued for destruction.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity) && !self.transaction.is_doomed(entity)
    }

    /// Create a new entity holding a duplicate of each of `source`'s
    /// components. Components whose [`Component::duplicate`] returns `None`
    /// are left off. Returns `None` if `source` is not alive.
    pub fn clone_entity(&mut self, source: Entity) -> Option<Entity> {
        if !self.is_alive(source) {
            return None;
        }
        let record = self.records.get(&source.index)?;

        let mut ids: Vec<ComponentId> = record.components.keys().copied().collect();
        ids.sort_unstable();
        let mut copies = Vec::with_capacity(ids.len());
        for id in ids {
            match record.components.get(&id).and_then(StoredComponent::duplicate) {
                Some(copy) => copies.push((id, copy)),
                None => log::debug!(
                    "clone of {source:?} skips {}",
                    self.registry.name(id).unwrap_or("<unknown>")
                ),
            }
        }
        let source_enabled = record.components.contains_key(&self.enabled);

        let clone = self.create_entity();
        for (id, copy) in copies {
            self.attach(clone, id, copy);
        }
        if !source_enabled {
            self.disable(clone);
        }
        Some(clone)
    }

    pub fn enable(&mut self, entity: Entity) {
        self.add_component(entity, Enabled);
    }

    /// Hide an entity from every query. Returns `false` if it was not enabled.
    pub fn disable(&mut self, entity: Entity) -> bool {
        self.remove_component::<Enabled>(entity)
    }

    pub fn is_enabled(&self, entity: Entity) -> bool {
        self.has::<Enabled>(entity)
    }

    /// Number of live entity handles, including ones queued for destruction.
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Number of distinct tag sets that have held entities.
    pub fn archetype_count(&self) -> usize {
        self.index.archetype_count()
    }

    // ── Components ───────────────────────────────────────────────────

    /// Attach `value`. If the entity already holds a `T`, the old value is
    /// replaced in place (its removal hook runs) and the tag set is unchanged.
    /// Ignored for dead entities.
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) {
        let id = self.registry.register::<T>();
        self.attach(entity, id, StoredComponent::new(value));
    }

    /// Detach the entity's `T`, running its removal hook. Returns `false` if
    /// there was nothing to remove.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> bool {
        match self.registry.get::<T>() {
            Some(id) => self.detach(entity, id),
            None => false,
        }
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        let id = self.registry.get::<T>()?;
        self.records
            .get(&entity.index)?
            .components
            .get(&id)?
            .get::<T>()
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        let id = self.registry.get::<T>()?;
        self.records
            .get_mut(&entity.index)?
            .components
            .get_mut(&id)?
            .get_mut::<T>()
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.get::<T>(entity).is_some()
    }

    /// Id for `T`, registering it if needed.
    pub fn register_component<T: Component>(&mut self) -> ComponentId {
        self.registry.register::<T>()
    }

    pub fn component_id<T: Component>(&self) -> Option<ComponentId> {
        self.registry.get::<T>()
    }

    pub fn component_name(&self, id: ComponentId) -> Option<&'static str> {
        self.registry.name(id)
    }

    /// Tag set of a group of component types, e.g. `world.tag_set::<(Transform, Health)>()`.
    pub fn tag_set<C: ComponentSet>(&mut self) -> TagSet {
        C::tag_set(&mut self.registry)
    }

    /// The entity's committed tag set. Queued moves are not reflected.
    pub fn tags_of(&self, entity: Entity) -> Option<&TagSet> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        self.records.get(&entity.index).map(|r| &r.tags)
    }

    // ── Transactions ─────────────────────────────────────────────────

    /// Open a transaction. Transactions nest; only the outermost
    /// [`end_deferred`](World::end_deferred) commits.
    pub fn begin_deferred(&mut self) {
        self.transaction.begin();
    }

    pub fn end_deferred(&mut self) {
        if let Some(pending) = self.transaction.end() {
            self.commit(pending);
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.transaction.is_active()
    }

    /// Run `f` inside a transaction.
    pub fn deferred<R>(&mut self, f: impl FnOnce(&mut World) -> R) -> R {
        self.begin_deferred();
        let out = f(self);
        self.end_deferred();
        out
    }

    fn commit(&mut self, pending: Pending) {
        if pending.is_empty() {
            return;
        }
        log::trace!(
            "commit: {} new set(s), {} move(s), {} destroy(s)",
            pending.new_sets.len(),
            pending.moves.len(),
            pending.destroys.len()
        );
        for set in &pending.new_sets {
            self.index.link(set);
        }
        for (entity, to) in pending.moves {
            self.apply_move(entity, to);
        }
        for entity in pending.destroys {
            if self.allocator.is_alive(entity) {
                self.destroy_now(entity);
            }
        }
    }

    // ── Query support ────────────────────────────────────────────────

    pub(crate) fn enabled_id(&self) -> ComponentId {
        self.enabled
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    pub(crate) fn index_generation(&self) -> u64 {
        self.index.generation()
    }

    /// Every known tag set that contains `set`, `set` itself first when it is
    /// known. A set seen for the first time is linked into the cache, or,
    /// inside a transaction, scanned without caching and linked on commit.
    pub fn supersets_of(&mut self, set: &TagSet) -> Vec<TagSet> {
        if let Some(list) = self.index.supersets(set) {
            return list.to_vec();
        }
        if self.transaction.is_active() {
            self.transaction.record_new_set(set.clone());
            return self.index.scan_supersets(set);
        }
        self.index.link(set);
        self.index
            .supersets(set)
            .map(<[TagSet]>::to_vec)
            .unwrap_or_default()
    }

    /// Entities whose committed tag set is exactly `set`.
    pub fn entities_with_tags(&self, set: &TagSet) -> &[Entity] {
        self.index
            .archetype(set)
            .map(|a| a.entities())
            .unwrap_or(&[])
    }

    // ── Internals ────────────────────────────────────────────────────

    fn ensure_archetype(&mut self, set: &TagSet) {
        let (_, created) = self.index.archetype_mut(set);
        if created {
            self.link_set(set);
        }
    }

    fn link_set(&mut self, set: &TagSet) {
        if self.transaction.is_active() {
            if !self.index.is_linked(set) {
                self.transaction.record_new_set(set.clone());
            }
        } else {
            self.index.link(set);
        }
    }

    fn place(&mut self, entity: Entity, set: &TagSet) -> usize {
        let (archetype, created) = self.index.archetype_mut(set);
        let row = archetype.push(entity);
        if created {
            self.link_set(set);
        }
        row
    }

    fn unplace(&mut self, set: &TagSet, row: usize) {
        let Some(archetype) = self.index.existing_mut(set) else {
            return;
        };
        if let Some(moved) = archetype.swap_remove(row) {
            if let Some(record) = self.records.get_mut(&moved.index) {
                record.row = row;
            }
        }
    }

    /// Tag set the entity will have once queued moves apply.
    fn effective_tags(&self, entity: Entity) -> Option<TagSet> {
        if let Some(pending) = self.transaction.pending_tags(entity) {
            return Some(pending.clone());
        }
        self.records.get(&entity.index).map(|r| r.tags.clone())
    }

    fn attach(&mut self, entity: Entity, id: ComponentId, stored: StoredComponent) {
        if !self.allocator.is_alive(entity) {
            log::debug!("component added to dead entity {entity:?} dropped");
            return;
        }
        let Some(current) = self.effective_tags(entity) else {
            return;
        };
        let Some(record) = self.records.get_mut(&entity.index) else {
            return;
        };
        match record.components.insert(id, stored) {
            Some(old) => old.remove(self),
            None => self.move_to(entity, current.add(id)),
        }
    }

    fn detach(&mut self, entity: Entity, id: ComponentId) -> bool {
        if !self.allocator.is_alive(entity) {
            return false;
        }
        let Some(current) = self.effective_tags(entity) else {
            return false;
        };
        let Some(stored) = self
            .records
            .get_mut(&entity.index)
            .and_then(|r| r.components.remove(&id))
        else {
            return false;
        };
        self.move_to(entity, current.remove(id));
        stored.remove(self);
        true
    }

    fn move_to(&mut self, entity: Entity, to: TagSet) {
        if self.transaction.is_active() {
            self.transaction.record_move(entity, to);
        } else {
            self.apply_move(entity, to);
        }
    }

    fn apply_move(&mut self, entity: Entity, to: TagSet) {
        if !self.allocator.is_alive(entity) {
            return;
        }
        let Some(record) = self.records.get(&entity.index) else {
            return;
        };
        if record.tags == to {
            return;
        }
        let (from, row) = (record.tags.clone(), record.row);
        self.unplace(&from, row);
        let new_row = self.place(entity, &to);
        if let Some(record) = self.records.get_mut(&entity.index) {
            record.tags = to;
            record.row = new_row;
        }
    }

    fn destroy_now(&mut self, entity: Entity) {
        let Some(record) = self.records.remove(&entity.index) else {
            return;
        };
        self.unplace(&record.tags, record.row);
        self.allocator.deallocate(entity);

        let mut components: Vec<(ComponentId, StoredComponent)> =
            record.components.into_iter().collect();
        components.sort_unstable_by_key(|(id, _)| *id);
        for (_, stored) in components {
            stored.remove(self);
        }
    }

    // ── Resources ────────────────────────────────────────────────────

    /// Insert a resource, replacing any existing one of the same type.
    pub fn insert_resource<T: Send + Sync + 'static>(&mut self, value: T) {
        self.resources.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// # Panics
    ///
    /// Panics if the resource hasn't been inserted.
    pub fn resource<T: Send + Sync + 'static>(&self) -> &T {
        self.get_resource::<T>().unwrap_or_else(|| {
            panic!(
                "resource `{}` not found; insert it before use",
                std::any::type_name::<T>()
            )
        })
    }

    /// # Panics
    ///
    /// Panics if the resource hasn't been inserted.
    pub fn resource_mut<T: Send + Sync + 'static>(&mut self) -> &mut T {
        self.get_resource_mut::<T>().unwrap_or_else(|| {
            panic!(
                "resource `{}` not found; insert it before use",
                std::any::type_name::<T>()
            )
        })
    }

    pub fn get_resource<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.resources
            .get(&TypeId::of::<T>())
            .and_then(|r| r.downcast_ref::<T>())
    }

    pub fn get_resource_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.resources
            .get_mut(&TypeId::of::<T>())
            .and_then(|r| r.downcast_mut::<T>())
    }

    pub fn has_resource<T: Send + Sync + 'static>(&self) -> bool {
        self.resources.contains_key(&TypeId::of::<T>())
    }

    /// Take a resource out of the world. Pair with
    /// [`insert_resource`](World::insert_resource) to work on a resource and
    /// the rest of the world at once.
    pub fn resource_remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.resources
            .remove(&TypeId::of::<T>())
            .and_then(|r| r.downcast::<T>().ok())
            .map(|b| *b)
    }

    #[cfg(feature = "diagnostics")]
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            entities: self.allocator.alive_count(),
            entity_slots: self.allocator.total_slots(),
            archetypes: self.index.archetype_count(),
            component_types: self.registry.len(),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
