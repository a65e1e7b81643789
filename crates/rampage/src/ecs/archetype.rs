//! # Archetype — Entities Grouped by Tag Set
//!
//! Every entity lives in exactly one archetype: the bucket for its current
//! [`TagSet`]. Component values themselves stay in the per-entity maps owned
//! by the [`World`](super::world::World); an archetype is only the list of
//! entities that share a signature, parallel to a row index stored on each
//! entity record.
//!
//! ## Superset cache
//!
//! A query asks for "all entities whose tag set contains mine". Rather than
//! testing every archetype on every query, [`ArchetypeIndex`] keeps, for each
//! tag set it knows about, the list of known tag sets that are supersets of
//! it (itself included). The list is maintained incrementally: when a set is
//! seen for the first time, one scan over the known sets both builds the new
//! set's own list and appends the new set to the list of every known subset.
//!
//! ```text
//! known: {}        → [{}, {E}, {E,T}, {E,T,B}]
//!        {E}       → [{E}, {E,T}, {E,T,B}]
//!        {E,T}     → [{E,T}, {E,T,B}]
//! new:   {E,T,B}   → [{E,T,B}]          (and appended to the three above)
//! ```
//!
//! Query sets that no entity holds are linked the same way, so a query
//! registered before any matching entity exists still picks up archetypes
//! created later.

use std::collections::HashMap;

use super::entity::Entity;
use super::tag_set::TagSet;

/// The entities currently holding one exact tag set.
#[derive(Default)]
pub(crate) struct Archetype {
    entities: Vec<Entity>,
}

impl Archetype {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity, returning its row.
    pub fn push(&mut self, entity: Entity) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    /// Swap-remove the entity at `row`. Returns the entity that was moved into
    /// `row`, if any, so the caller can patch its stored row.
    pub fn swap_remove(&mut self, row: usize) -> Option<Entity> {
        self.entities.swap_remove(row);
        self.entities.get(row).copied()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entities.len()
    }
}

/// Tag set → archetype, plus the tag set → supersets cache.
pub(crate) struct ArchetypeIndex {
    archetypes: HashMap<TagSet, Archetype>,
    supersets: HashMap<TagSet, Vec<TagSet>>,
    /// Bumped whenever a set is linked, so cached query resolutions can tell
    /// they are stale.
    generation: u64,
}

impl ArchetypeIndex {
    pub fn new() -> Self {
        Self {
            archetypes: HashMap::new(),
            supersets: HashMap::new(),
            generation: 0,
        }
    }

    pub fn archetype(&self, set: &TagSet) -> Option<&Archetype> {
        self.archetypes.get(set)
    }

    /// The archetype for `set`, creating it if needed. The flag reports
    /// whether it was created, in which case the caller must link the set.
    pub fn archetype_mut(&mut self, set: &TagSet) -> (&mut Archetype, bool) {
        let created = !self.archetypes.contains_key(set);
        let archetype = self
            .archetypes
            .entry(set.clone())
            .or_insert_with(Archetype::new);
        (archetype, created)
    }

    pub fn existing_mut(&mut self, set: &TagSet) -> Option<&mut Archetype> {
        self.archetypes.get_mut(set)
    }

    pub fn is_linked(&self, set: &TagSet) -> bool {
        self.supersets.contains_key(set)
    }

    /// Compute the sub/superset relations of a newly seen set against every
    /// known set. No-op for sets already linked.
    pub fn link(&mut self, set: &TagSet) {
        if self.supersets.contains_key(set) {
            return;
        }

        let mut own = vec![set.clone()];
        for (known, list) in self.supersets.iter_mut() {
            if known.is_superset_of(set) {
                own.push(known.clone());
            } else if known.is_subset_of(set) {
                list.push(set.clone());
            }
        }
        // HashMap order is arbitrary; keep resolution order reproducible.
        own[1..].sort_unstable();

        log::trace!("linked tag set {set:?} with {} superset(s)", own.len() - 1);
        self.supersets.insert(set.clone(), own);
        self.generation += 1;
    }

    /// Cached supersets of a linked set.
    pub fn supersets(&self, set: &TagSet) -> Option<&[TagSet]> {
        self.supersets.get(set).map(Vec::as_slice)
    }

    /// Supersets of a set that is not linked yet, computed without touching
    /// the cache.
    pub fn scan_supersets(&self, set: &TagSet) -> Vec<TagSet> {
        let mut found: Vec<TagSet> = self
            .supersets
            .keys()
            .filter(|known| known.is_superset_of(set))
            .cloned()
            .collect();
        found.sort_unstable();
        found
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::ComponentId;

    fn set(ids: &[u32]) -> TagSet {
        TagSet::from_ids(ids.iter().map(|&n| ComponentId(n)))
    }

    fn entity(index: u32) -> Entity {
        Entity {
            index,
            generation: 0,
        }
    }

    #[test]
    fn swap_remove_reports_moved_entity() {
        let mut arch = Archetype::new();
        arch.push(entity(0));
        arch.push(entity(1));
        arch.push(entity(2));
        assert_eq!(arch.swap_remove(0), Some(entity(2)));
        assert_eq!(arch.entities(), &[entity(2), entity(1)]);
        assert_eq!(arch.swap_remove(1), None);
        assert_eq!(arch.len(), 1);
    }

    #[test]
    fn link_records_both_directions() {
        let mut index = ArchetypeIndex::new();
        index.link(&set(&[]));
        index.link(&set(&[1]));
        index.link(&set(&[1, 2]));
        index.link(&set(&[2]));

        assert_eq!(index.supersets(&set(&[])).unwrap().len(), 4);
        assert_eq!(
            index.supersets(&set(&[1])).unwrap(),
            &[set(&[1]), set(&[1, 2])]
        );
        assert_eq!(
            index.supersets(&set(&[2])).unwrap(),
            &[set(&[2]), set(&[1, 2])]
        );
        assert_eq!(index.supersets(&set(&[1, 2])).unwrap(), &[set(&[1, 2])]);
    }

    #[test]
    fn unrelated_sets_stay_apart() {
        let mut index = ArchetypeIndex::new();
        index.link(&set(&[1, 3]));
        index.link(&set(&[2, 4]));
        assert_eq!(index.supersets(&set(&[1, 3])).unwrap(), &[set(&[1, 3])]);
        assert_eq!(index.supersets(&set(&[2, 4])).unwrap(), &[set(&[2, 4])]);
    }

    #[test]
    fn link_is_idempotent_and_bumps_generation_once() {
        let mut index = ArchetypeIndex::new();
        index.link(&set(&[1]));
        let g = index.generation();
        index.link(&set(&[1]));
        assert_eq!(index.generation(), g);
        assert_eq!(index.supersets(&set(&[1])).unwrap().len(), 1);
    }

    #[test]
    fn scan_does_not_touch_cache() {
        let mut index = ArchetypeIndex::new();
        index.link(&set(&[1, 2]));
        let g = index.generation();
        assert_eq!(index.scan_supersets(&set(&[1])), vec![set(&[1, 2])]);
        assert!(!index.is_linked(&set(&[1])));
        assert_eq!(index.generation(), g);
    }
}
