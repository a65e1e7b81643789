//! # Deferred — Structural Changes Held Back During Iteration
//!
//! While a query walks archetype lists, adding or removing a component must
//! not move the entity between lists, and destroying an entity must not
//! shrink one. Between [`World::begin_deferred`](super::world::World::begin_deferred)
//! and the matching `end_deferred`, such changes are queued here instead:
//!
//! ```text
//! new_sets:  [{E,T,B}]                  ← superset cache links
//! moves:     [(e3, {E,T}), (e7, {E})]   ← latest target per entity
//! destroys:  [e3]
//! ```
//!
//! Component values themselves are written immediately, so `get` inside a
//! transaction sees the latest value. Only the archetype index lags.
//!
//! Transactions nest through a depth counter; only the outermost end hands
//! the queues back for commit.

use std::collections::{HashMap, HashSet};

use super::entity::Entity;
use super::tag_set::TagSet;

/// Queued structural changes, applied in field order on commit.
pub(crate) struct Pending {
    pub new_sets: Vec<TagSet>,
    pub moves: Vec<(Entity, TagSet)>,
    pub destroys: Vec<Entity>,
}

impl Pending {
    pub fn is_empty(&self) -> bool {
        self.new_sets.is_empty() && self.moves.is_empty() && self.destroys.is_empty()
    }
}

#[derive(Default)]
pub(crate) struct Transaction {
    depth: u32,
    new_sets: Vec<TagSet>,
    moves: Vec<(Entity, TagSet)>,
    /// Entity → slot in `moves`, so repeated moves coalesce in place.
    move_slots: HashMap<Entity, usize>,
    destroys: Vec<Entity>,
    doomed: HashSet<Entity>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    #[cfg(test)]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn begin(&mut self) {
        self.depth += 1;
    }

    /// Close one level. Returns the queued work when the outermost level
    /// closes; `None` while still nested or when no transaction was open.
    pub fn end(&mut self) -> Option<Pending> {
        match self.depth {
            0 => {
                log::warn!("end_deferred called without a matching begin_deferred");
                None
            }
            1 => {
                self.depth = 0;
                self.move_slots.clear();
                self.doomed.clear();
                Some(Pending {
                    new_sets: std::mem::take(&mut self.new_sets),
                    moves: std::mem::take(&mut self.moves),
                    destroys: std::mem::take(&mut self.destroys),
                })
            }
            _ => {
                self.depth -= 1;
                None
            }
        }
    }

    pub fn record_new_set(&mut self, set: TagSet) {
        if !self.new_sets.contains(&set) {
            self.new_sets.push(set);
        }
    }

    /// Queue a move. A later move of the same entity replaces the target.
    pub fn record_move(&mut self, entity: Entity, to: TagSet) {
        match self.move_slots.get(&entity) {
            Some(&slot) => self.moves[slot].1 = to,
            None => {
                self.move_slots.insert(entity, self.moves.len());
                self.moves.push((entity, to));
            }
        }
    }

    /// Target of the entity's pending move, if one is queued.
    pub fn pending_tags(&self, entity: Entity) -> Option<&TagSet> {
        self.move_slots
            .get(&entity)
            .map(|&slot| &self.moves[slot].1)
    }

    /// Queue a destruction. Returns `false` if one is already queued.
    pub fn record_destroy(&mut self, entity: Entity) -> bool {
        if self.doomed.insert(entity) {
            self.destroys.push(entity);
            true
        } else {
            false
        }
    }

    pub fn is_doomed(&self, entity: Entity) -> bool {
        self.doomed.contains(&entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::ComponentId;

    fn entity(index: u32) -> Entity {
        Entity {
            index,
            generation: 0,
        }
    }

    fn set(ids: &[u32]) -> TagSet {
        TagSet::from_ids(ids.iter().map(|&n| ComponentId(n)))
    }

    #[test]
    fn only_outermost_end_commits() {
        let mut tx = Transaction::new();
        tx.begin();
        tx.begin();
        tx.record_destroy(entity(1));
        assert!(tx.end().is_none());
        assert!(tx.is_active());
        let pending = tx.end().expect("outermost end returns queue");
        assert_eq!(pending.destroys, vec![entity(1)]);
        assert!(!tx.is_active());
    }

    #[test]
    fn unbalanced_end_is_ignored() {
        let mut tx = Transaction::new();
        assert!(tx.end().is_none());
        assert_eq!(tx.depth(), 0);
    }

    #[test]
    fn repeated_moves_coalesce() {
        let mut tx = Transaction::new();
        tx.begin();
        tx.record_move(entity(0), set(&[1]));
        tx.record_move(entity(2), set(&[2]));
        tx.record_move(entity(0), set(&[1, 3]));
        assert_eq!(tx.pending_tags(entity(0)), Some(&set(&[1, 3])));
        let pending = tx.end().unwrap();
        assert_eq!(
            pending.moves,
            vec![(entity(0), set(&[1, 3])), (entity(2), set(&[2]))]
        );
    }

    #[test]
    fn destroy_is_queued_once() {
        let mut tx = Transaction::new();
        tx.begin();
        assert!(tx.record_destroy(entity(4)));
        assert!(!tx.record_destroy(entity(4)));
        assert!(tx.is_doomed(entity(4)));
        let pending = tx.end().unwrap();
        assert_eq!(pending.destroys.len(), 1);
        assert!(!tx.is_doomed(entity(4)));
    }

    #[test]
    fn empty_transaction_yields_empty_pending() {
        let mut tx = Transaction::new();
        tx.begin();
        assert!(tx.end().unwrap().is_empty());
    }
}
