//! # Entity — Opaque Handles Into the Store
//!
//! An [`Entity`] owns nothing. The [`World`](super::world::World) keeps a
//! per-entity map from component id to component value, and the entity is
//! just the key into that map.
//!
//! ## Generational handles
//!
//! Handles are handed to code the store does not control: collision events
//! carry the owning entity of each body, and game logic stashes handles in
//! its own components. A slot index alone would let a destroyed entity's
//! handle silently alias whatever entity reuses the slot. Each slot therefore
//! carries a generation that is bumped on release:
//!
//! ```text
//! Entity { index: 5, generation: 0 }  ← bullet
//! Entity { index: 5, generation: 1 }  ← enemy spawned after the bullet died
//! ```
//!
//! A body whose back-reference still says `generation: 0` resolves to
//! nothing instead of to the enemy.

use std::fmt;

/// A lightweight handle to an entity in the [`World`](super::world::World).
///
/// Created by [`World::create_entity`](super::world::World::create_entity)
/// and invalidated by [`World::destroy_entity`](super::world::World::destroy_entity).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct Entity {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Entity {
    /// Slot index. Useful for diagnostics and as a dense map key.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Hands out entity slots and recycles them.
///
/// ```text
/// generations: [0, 1, 0, 2]   ← current generation per slot
/// free_list:   [1, 3]         ← released slots, reused LIFO
/// ```
pub(crate) struct EntityAllocator {
    generations: Vec<u32>,
    free_list: Vec<u32>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Allocate a handle, reusing a released slot when one is available.
    pub fn allocate(&mut self) -> Entity {
        if let Some(index) = self.free_list.pop() {
            let generation = self.generations[index as usize];
            Entity { index, generation }
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            Entity {
                index,
                generation: 0,
            }
        }
    }

    /// Release a handle. Returns `false` when the handle was already stale.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let idx = entity.index as usize;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_list.push(entity.index);
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.generations
            .get(entity.index as usize)
            .is_some_and(|&generation| generation == entity.generation)
    }

    pub fn alive_count(&self) -> usize {
        self.generations.len() - self.free_list.len()
    }

    #[cfg(any(feature = "diagnostics", test))]
    pub(crate) fn total_slots(&self) -> usize {
        self.generations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_slots_are_sequential() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_eq!((a.index, a.generation), (0, 0));
        assert_eq!((b.index, b.generation), (1, 0));
        assert_eq!(alloc.total_slots(), 2);
    }

    #[test]
    fn reused_slot_gets_new_generation() {
        let mut alloc = EntityAllocator::new();
        let bullet = alloc.allocate();
        assert!(alloc.deallocate(bullet));
        let enemy = alloc.allocate();
        assert_eq!(enemy.index, bullet.index);
        assert_eq!(enemy.generation, 1);
        assert!(!alloc.is_alive(bullet));
        assert!(alloc.is_alive(enemy));
    }

    #[test]
    fn releasing_twice_is_rejected() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate();
        assert!(alloc.deallocate(e));
        assert!(!alloc.deallocate(e));
        assert_eq!(alloc.alive_count(), 0);
    }

    #[test]
    fn unknown_index_is_not_alive() {
        let alloc = EntityAllocator::new();
        let ghost = Entity {
            index: 42,
            generation: 0,
        };
        assert!(!alloc.is_alive(ghost));
    }
}
