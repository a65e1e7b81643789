//! # Tag Set — The Structural Key of an Entity
//!
//! A [`TagSet`] is the exact set of component ids an entity currently holds.
//! Entities with equal tag sets share an archetype, and queries are phrased
//! as "every archetype whose tag set is a superset of mine".
//!
//! Tag sets are values: every operation returns a new set and never mutates
//! the receiver, so a set used as a `HashMap` key can never change under the
//! map. The ids are kept sorted and unique, which makes structural equality
//! and hashing agree regardless of insertion order and lets membership use a
//! binary search.

use std::fmt;

use super::component::ComponentId;

/// Sorted, duplicate-free set of [`ComponentId`]s.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagSet {
    ids: Vec<ComponentId>,
}

impl TagSet {
    /// The empty set.
    pub fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Build a set from ids in any order; duplicates collapse.
    pub fn from_ids(ids: impl IntoIterator<Item = ComponentId>) -> Self {
        let mut ids: Vec<ComponentId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }

    /// A copy of this set that also holds `id`.
    pub fn add(&self, id: ComponentId) -> Self {
        match self.ids.binary_search(&id) {
            Ok(_) => self.clone(),
            Err(pos) => {
                let mut ids = Vec::with_capacity(self.ids.len() + 1);
                ids.extend_from_slice(&self.ids[..pos]);
                ids.push(id);
                ids.extend_from_slice(&self.ids[pos..]);
                Self { ids }
            }
        }
    }

    /// A copy of this set without `id`.
    pub fn remove(&self, id: ComponentId) -> Self {
        match self.ids.binary_search(&id) {
            Ok(pos) => {
                let mut ids = self.ids.clone();
                ids.remove(pos);
                Self { ids }
            }
            Err(_) => self.clone(),
        }
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// Every id in `self` is also in `other`.
    pub fn is_subset_of(&self, other: &TagSet) -> bool {
        if self.ids.len() > other.ids.len() {
            return false;
        }
        // Both sides are sorted, so a single merge walk suffices.
        let mut theirs = other.ids.iter();
        'ours: for id in &self.ids {
            for candidate in theirs.by_ref() {
                if candidate == id {
                    continue 'ours;
                }
                if candidate > id {
                    return false;
                }
            }
            return false;
        }
        true
    }

    /// Every id in `other` is also in `self`.
    pub fn is_superset_of(&self, other: &TagSet) -> bool {
        other.is_subset_of(self)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.ids.iter().copied()
    }
}

impl fmt::Debug for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids.iter().map(|id| id.0)).finish()
    }
}

impl FromIterator<ComponentId> for TagSet {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> ComponentId {
        ComponentId(n)
    }

    fn set(ids: &[u32]) -> TagSet {
        TagSet::from_ids(ids.iter().map(|&n| id(n)))
    }

    #[test]
    fn add_keeps_sorted_order() {
        let s = TagSet::new().add(id(5)).add(id(1)).add(id(3));
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![id(1), id(3), id(5)]);
    }

    #[test]
    fn add_is_idempotent() {
        for base in [set(&[]), set(&[2]), set(&[1, 4, 9])] {
            for x in 0..10 {
                let once = base.add(id(x));
                assert!(once.contains(id(x)));
                assert_eq!(once.add(id(x)), once);
            }
        }
    }

    #[test]
    fn add_does_not_mutate_receiver() {
        let base = set(&[1, 2]);
        let grown = base.add(id(3));
        assert_eq!(base, set(&[1, 2]));
        assert_eq!(grown, set(&[1, 2, 3]));
    }

    #[test]
    fn remove_missing_id_is_identity() {
        let base = set(&[1, 2]);
        assert_eq!(base.remove(id(7)), base);
        assert_eq!(base.remove(id(1)), set(&[2]));
    }

    #[test]
    fn insertion_order_does_not_affect_equality() {
        assert_eq!(set(&[3, 1, 2]), TagSet::new().add(id(2)).add(id(3)).add(id(1)));
    }

    #[test]
    fn subset_and_superset_agree() {
        let sets = [
            set(&[]),
            set(&[1]),
            set(&[2]),
            set(&[1, 2]),
            set(&[1, 3]),
            set(&[1, 2, 3]),
        ];
        for a in &sets {
            for b in &sets {
                assert_eq!(a.is_subset_of(b), b.is_superset_of(a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn subset_relations() {
        assert!(set(&[]).is_subset_of(&set(&[4])));
        assert!(set(&[1, 3]).is_subset_of(&set(&[1, 2, 3])));
        assert!(!set(&[1, 4]).is_subset_of(&set(&[1, 2, 3])));
        assert!(!set(&[1, 2, 3]).is_subset_of(&set(&[1, 3])));
        assert!(set(&[2]).is_subset_of(&set(&[2])));
    }
}
