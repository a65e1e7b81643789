//! # Quad-Tree Broadphase
//!
//! A region quad-tree over bounding boxes. Leaves hold up to `capacity`
//! elements; inserting past that splits the leaf into four quadrants (until
//! `max_depth`) and pushes its elements down. An element whose box straddles
//! a quadrant boundary is stored in every quadrant it touches.
//!
//! ```text
//! root (internal)
//! ├── q0 leaf [a, b]
//! ├── q1 leaf [b, c]      ← b straddles q0/q1
//! ├── q2 (not created)
//! └── q3 leaf [d]
//! ```
//!
//! Nodes and elements live in flat arenas indexed by `u32`. Each element has
//! a `queried` mark: a query sets it on the first leaf that reports the
//! element and clears every mark it set before returning, so an element
//! stored in several leaves comes back once.
//!
//! The root leaf accepts any box. Once the root splits, elements that fall
//! outside all four quadrants are dropped from the tree.

use std::collections::HashMap;
use std::hash::Hash;

use super::aabb::Aabb;
use crate::config::QuadTreeConfig;

struct Node {
    region: Aabb,
    level: u32,
    /// `Some` for leaves, `None` once the node has split.
    items: Option<Vec<u32>>,
    children: [Option<u32>; 4],
}

impl Node {
    fn leaf(region: Aabb, level: u32) -> Self {
        Self {
            region,
            level,
            items: Some(Vec::new()),
            children: [None; 4],
        }
    }
}

struct Element<K> {
    key: K,
    aabb: Aabb,
    queried: bool,
}

pub struct QuadTree<K> {
    capacity: usize,
    max_depth: u32,
    nodes: Vec<Node>,
    elements: Vec<Option<Element<K>>>,
    free: Vec<u32>,
    slots: HashMap<K, u32>,
}

impl<K: Copy + Eq + Hash> QuadTree<K> {
    pub fn new(bounds: Aabb, config: QuadTreeConfig) -> Self {
        Self {
            capacity: config.capacity,
            max_depth: config.max_depth,
            nodes: vec![Node::leaf(bounds, 0)],
            elements: Vec::new(),
            free: Vec::new(),
            slots: HashMap::new(),
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.nodes[0].region
    }

    /// Insert `key` with box `aabb`. A key already present is re-inserted
    /// with the new box.
    pub fn insert(&mut self, key: K, aabb: Aabb) {
        if self.slots.contains_key(&key) {
            self.remove(key);
        }
        let element = Element {
            key,
            aabb,
            queried: false,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.elements[slot as usize] = Some(element);
                slot
            }
            None => {
                self.elements.push(Some(element));
                (self.elements.len() - 1) as u32
            }
        };
        self.slots.insert(key, slot);
        self.add(0, slot);
    }

    /// Remove `key` from every leaf holding it. Returns `false` if absent.
    pub fn remove(&mut self, key: K) -> bool {
        let Some(slot) = self.slots.remove(&key) else {
            return false;
        };
        let Some(aabb) = self.element_aabb(slot) else {
            return false;
        };
        self.erase(0, slot, &aabb);
        self.elements[slot as usize] = None;
        self.free.push(slot);
        true
    }

    /// Keys of every element whose box overlaps `area`, each reported once.
    pub fn query(&mut self, area: &Aabb) -> Vec<K> {
        let mut found = Vec::new();
        self.collect(0, area, &mut found);

        let mut keys = Vec::with_capacity(found.len());
        for slot in found {
            if let Some(element) = self.elements[slot as usize].as_mut() {
                element.queried = false;
                keys.push(element.key);
            }
        }
        keys
    }

    /// Drop every element and node, keeping the root region.
    pub fn clear(&mut self) {
        let root = Node::leaf(self.nodes[0].region, 0);
        self.nodes.clear();
        self.nodes.push(root);
        self.elements.clear();
        self.free.clear();
        self.slots.clear();
    }

    pub fn contains(&self, key: K) -> bool {
        self.slots.contains_key(&key)
    }

    /// Number of elements inserted and not removed.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest level reached by any node (root is level 0).
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.level).max().unwrap_or(0)
    }

    /// Regions of all leaf nodes, for debug drawing.
    pub fn leaf_regions(&self) -> Vec<Aabb> {
        self.nodes
            .iter()
            .filter(|n| n.items.is_some())
            .map(|n| n.region)
            .collect()
    }

    fn element_aabb(&self, slot: u32) -> Option<Aabb> {
        self.elements
            .get(slot as usize)
            .and_then(Option::as_ref)
            .map(|e| e.aabb)
    }

    fn add(&mut self, node: usize, slot: u32) {
        let level = self.nodes[node].level;
        let leaf_len = self.nodes[node].items.as_ref().map(Vec::len);
        match leaf_len {
            None => self.add_to_children(node, slot),
            Some(len) if len + 1 > self.capacity && level + 1 <= self.max_depth => {
                let held = self.nodes[node].items.take().unwrap_or_default();
                log::trace!(
                    "quad-tree split at level {level}, redistributing {} element(s)",
                    held.len() + 1
                );
                self.add_to_children(node, slot);
                for existing in held {
                    self.add_to_children(node, existing);
                }
            }
            Some(_) => {
                if let Some(items) = self.nodes[node].items.as_mut() {
                    items.push(slot);
                }
            }
        }
    }

    fn add_to_children(&mut self, node: usize, slot: u32) {
        let Some(aabb) = self.element_aabb(slot) else {
            return;
        };
        let region = self.nodes[node].region;
        let level = self.nodes[node].level;

        let mut placed = false;
        for quadrant in 0..4 {
            let child_region = region.quadrant(quadrant);
            if !aabb.intersects(&child_region) {
                continue;
            }
            let child = match self.nodes[node].children[quadrant] {
                Some(child) => child,
                None => {
                    let child = self.nodes.len() as u32;
                    self.nodes.push(Node::leaf(child_region, level + 1));
                    self.nodes[node].children[quadrant] = Some(child);
                    child
                }
            };
            self.add(child as usize, slot);
            placed = true;
        }
        if !placed {
            log::trace!("element {aabb:?} lies outside {region:?}; dropped from quad-tree");
        }
    }

    fn erase(&mut self, node: usize, slot: u32, aabb: &Aabb) {
        if let Some(items) = self.nodes[node].items.as_mut() {
            items.retain(|&s| s != slot);
            return;
        }
        let children = self.nodes[node].children;
        for child in children.into_iter().flatten() {
            if aabb.intersects(&self.nodes[child as usize].region) {
                self.erase(child as usize, slot, aabb);
            }
        }
    }

    fn collect(&mut self, node: usize, area: &Aabb, found: &mut Vec<u32>) {
        if let Some(items) = self.nodes[node].items.as_ref() {
            for &slot in items {
                let Some(element) = self.elements[slot as usize].as_mut() else {
                    continue;
                };
                if !element.queried && element.aabb.intersects(area) {
                    element.queried = true;
                    found.push(slot);
                }
            }
            return;
        }
        let children = self.nodes[node].children;
        for child in children.into_iter().flatten() {
            if area.intersects(&self.nodes[child as usize].region) {
                self.collect(child as usize, area, found);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn tree() -> QuadTree<u32> {
        QuadTree::new(
            Aabb::from_xywh(0.0, 0.0, 100.0, 100.0),
            QuadTreeConfig {
                capacity: 6,
                max_depth: 8,
            },
        )
    }

    fn small_box(x: f32, y: f32) -> Aabb {
        Aabb::from_xywh(x, y, 2.0, 2.0)
    }

    fn sorted(mut v: Vec<u32>) -> Vec<u32> {
        v.sort();
        v
    }

    #[test]
    fn leaf_splits_past_capacity() {
        let mut t = tree();
        for i in 0..6 {
            t.insert(i, small_box(i as f32 * 3.0, 5.0));
        }
        assert_eq!(t.node_count(), 1);
        t.insert(6, small_box(80.0, 80.0));
        assert!(t.node_count() > 1);
        assert_eq!(t.len(), 7);
        assert_eq!(
            sorted(t.query(&Aabb::from_xywh(0.0, 0.0, 100.0, 100.0))),
            (0..7).collect::<Vec<_>>()
        );
    }

    #[test]
    fn straddling_element_is_reported_once() {
        let mut t = tree();
        // Force a split so the quadrants exist.
        for i in 0..6 {
            t.insert(i, small_box(5.0 + i as f32, 5.0));
        }
        // Spans the q0/q1 boundary at x = 50.
        t.insert(99, Aabb::from_xywh(45.0, 10.0, 10.0, 4.0));
        let hits = t.query(&Aabb::from_xywh(40.0, 8.0, 20.0, 8.0));
        assert_eq!(hits, vec![99]);
    }

    #[test]
    fn marks_are_cleared_between_queries() {
        let mut t = tree();
        for i in 0..8 {
            t.insert(i, Aabb::from_xywh(40.0, 40.0, 20.0, 20.0));
        }
        let area = Aabb::from_xywh(45.0, 45.0, 1.0, 1.0);
        let first = sorted(t.query(&area));
        let second = sorted(t.query(&area));
        assert_eq!(first.len(), 8);
        assert_eq!(first, second);
    }

    #[test]
    fn touching_boxes_are_found() {
        let mut t = tree();
        t.insert(1, Aabb::from_xywh(10.0, 10.0, 5.0, 5.0));
        assert_eq!(t.query(&Aabb::from_xywh(15.0, 15.0, 1.0, 1.0)), vec![1]);
        assert!(t.query(&Aabb::from_xywh(15.1, 15.1, 1.0, 1.0)).is_empty());
    }

    #[test]
    fn depth_is_capped() {
        let mut t = QuadTree::new(
            Aabb::from_xywh(0.0, 0.0, 100.0, 100.0),
            QuadTreeConfig {
                capacity: 1,
                max_depth: 3,
            },
        );
        for i in 0..20 {
            t.insert(i, small_box(1.0, 1.0));
        }
        assert_eq!(t.depth(), 3);
        assert_eq!(t.query(&small_box(1.0, 1.0)).len(), 20);
    }

    #[test]
    fn remove_takes_element_out_of_every_leaf() {
        let mut t = tree();
        for i in 0..6 {
            t.insert(i, small_box(5.0 + i as f32, 5.0));
        }
        t.insert(42, Aabb::from_xywh(40.0, 40.0, 20.0, 20.0));
        assert!(t.remove(42));
        assert!(!t.remove(42));
        assert!(t.query(&Aabb::from_xywh(45.0, 45.0, 10.0, 10.0)).is_empty());
        assert_eq!(t.len(), 6);
    }

    #[test]
    fn reinserting_key_moves_it() {
        let mut t = tree();
        t.insert(1, small_box(5.0, 5.0));
        t.insert(1, small_box(90.0, 90.0));
        assert_eq!(t.len(), 1);
        assert!(t.query(&small_box(5.0, 5.0)).is_empty());
        assert_eq!(t.query(&small_box(90.0, 90.0)), vec![1]);
    }

    #[test]
    fn out_of_bounds_element_dropped_after_split() {
        let mut t = tree();
        t.insert(100, Aabb::from_center(Vec2::new(-50.0, -50.0), Vec2::ONE));
        for i in 0..6 {
            t.insert(i, small_box(5.0 + i as f32, 5.0));
        }
        assert!(t.query(&Aabb::from_xywh(-60.0, -60.0, 20.0, 20.0)).is_empty());
    }

    #[test]
    fn clear_resets_to_single_leaf() {
        let mut t = tree();
        for i in 0..10 {
            t.insert(i, small_box(i as f32 * 9.0, 50.0));
        }
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.node_count(), 1);
        assert_eq!(t.bounds(), Aabb::from_xywh(0.0, 0.0, 100.0, 100.0));
    }
}
