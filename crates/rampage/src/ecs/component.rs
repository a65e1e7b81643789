//! # Component — Typed Data Attached to Entities
//!
//! A component is any `Send + Sync + 'static` value that implements
//! [`Component`]. The trait carries the two behaviours the store needs
//! beyond plain storage:
//!
//! - [`duplicate`](Component::duplicate): an explicit deep copy used by
//!   [`World::clone_entity`](super::world::World::clone_entity). Returning
//!   `None` leaves the component off the clone (a rigid-body handle must not
//!   be shared by two entities, for instance).
//! - [`on_remove`](Component::on_remove): a hook run exactly once when the
//!   component is detached or its entity is destroyed. It receives the world
//!   so it can release external resources (a physics body, say).
//!
//! ## Storage
//!
//! Values are stored type-erased as `Box<dyn Any + Send + Sync>`, the same
//! zero-unsafe trade the rest of the ECS makes. Next to each box we keep two
//! monomorphized function pointers captured when the value was inserted, so
//! duplication and the removal hook dispatch without ever inspecting the
//! value's type at runtime.
//!
//! ## Ids
//!
//! [`ComponentRegistry`] assigns a dense [`ComponentId`] to each component
//! type the first time it is seen. Ids are never reused or reclaimed, which
//! keeps every [`TagSet`](super::tag_set::TagSet) ever built meaningful for
//! the lifetime of the store.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use super::world::World;

/// Data that can be attached to an entity.
pub trait Component: Send + Sync + Sized + 'static {
    /// Deep copy for entity cloning. `None` skips this component on the clone.
    fn duplicate(&self) -> Option<Self>;

    /// Called exactly once when the component leaves the store.
    fn on_remove(self, _world: &mut World) {}
}

/// Stable small-integer id of a component type within one store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u32);

impl ComponentId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// Maps component types to ids, assigned on first registration.
#[derive(Default)]
pub struct ComponentRegistry {
    ids: HashMap<TypeId, ComponentId>,
    names: Vec<&'static str>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id of `T`, assigning the next free id if `T` is new.
    pub fn register<T: 'static>(&mut self) -> ComponentId {
        let next = ComponentId(self.names.len() as u32);
        *self.ids.entry(TypeId::of::<T>()).or_insert_with(|| {
            self.names.push(short_type_name(std::any::type_name::<T>()));
            next
        })
    }

    /// The id of `T` if it has been registered.
    pub fn get<T: 'static>(&self) -> Option<ComponentId> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// Short type name for diagnostics.
    pub fn name(&self, id: ComponentId) -> Option<&'static str> {
        self.names.get(id.0 as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Marker held by every enabled entity. Queries implicitly require it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Enabled;

impl Component for Enabled {
    fn duplicate(&self) -> Option<Self> {
        Some(Enabled)
    }
}

type ErasedBox = Box<dyn Any + Send + Sync>;

/// One component value plus the hooks captured for its concrete type.
pub(crate) struct StoredComponent {
    value: ErasedBox,
    duplicate: fn(&(dyn Any + Send + Sync)) -> Option<StoredComponent>,
    on_remove: fn(ErasedBox, &mut World),
}

impl StoredComponent {
    pub fn new<T: Component>(value: T) -> Self {
        Self {
            value: Box::new(value),
            duplicate: duplicate_erased::<T>,
            on_remove: on_remove_erased::<T>,
        }
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut()
    }

    pub fn duplicate(&self) -> Option<StoredComponent> {
        (self.duplicate)(&*self.value)
    }

    /// Consume the value, running its removal hook.
    pub fn remove(self, world: &mut World) {
        (self.on_remove)(self.value, world);
    }
}

fn duplicate_erased<T: Component>(value: &(dyn Any + Send + Sync)) -> Option<StoredComponent> {
    value
        .downcast_ref::<T>()
        .and_then(T::duplicate)
        .map(StoredComponent::new)
}

fn on_remove_erased<T: Component>(value: ErasedBox, world: &mut World) {
    if let Ok(value) = value.downcast::<T>() {
        (*value).on_remove(world);
    }
}

/// Strip the module path, keeping the last segment (`game::Transform` → `Transform`).
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Position(f32, f32);

    impl Component for Position {
        fn duplicate(&self) -> Option<Self> {
            Some(self.clone())
        }
    }

    struct Handle;

    impl Component for Handle {
        fn duplicate(&self) -> Option<Self> {
            None
        }
    }

    #[test]
    fn registration_is_idempotent_and_dense() {
        let mut registry = ComponentRegistry::new();
        let a = registry.register::<Position>();
        let b = registry.register::<Handle>();
        assert_eq!(registry.register::<Position>(), a);
        assert_eq!(a.raw(), 0);
        assert_eq!(b.raw(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unregistered_type_has_no_id() {
        let registry = ComponentRegistry::new();
        assert!(registry.get::<Position>().is_none());
    }

    #[test]
    fn names_are_shortened() {
        let mut registry = ComponentRegistry::new();
        let id = registry.register::<Position>();
        assert_eq!(registry.name(id), Some("Position"));
    }

    #[test]
    fn stored_component_duplicates_through_trait() {
        let stored = StoredComponent::new(Position(1.0, 2.0));
        let copy = stored.duplicate().expect("position duplicates");
        let p = copy.get::<Position>().unwrap();
        assert_eq!((p.0, p.1), (1.0, 2.0));
    }

    #[test]
    fn stored_component_respects_skip() {
        let stored = StoredComponent::new(Handle);
        assert!(stored.duplicate().is_none());
    }

    #[test]
    fn downcast_to_wrong_type_is_none() {
        let stored = StoredComponent::new(Position(0.0, 0.0));
        assert!(stored.get::<Handle>().is_none());
    }
}
