//! # Physics World — One Fixed Step at a Time
//!
//! [`PhysicsWorld::step`] runs, in order:
//!
//! ```text
//! 1. clear last step's events, manifolds and quad-tree
//! 2. integrate every live body and insert it into the quad-tree
//! 3. delete bodies marked for deletion
//! 4. for each body A (in handle order):
//!      query the tree with A's box
//!      for each candidate B not yet tested as an A:
//!        mask filter → narrowphase → resolve → record event
//! ```
//!
//! Bodies live in a `Vec` kept sorted by handle, so iteration order is
//! creation order and a handle lookup is a binary search. Handles come from
//! a counter and are never reused.
//!
//! The tree stores each body's box as it was after integration. Corrections
//! applied during step 4 move bodies but not their tree entries; a body
//! pushed into a new neighbour is picked up on the next step.

use glam::Vec2;

use super::aabb::Aabb;
use super::body::{BodyDesc, BodyHandle, RigidBody};
use super::narrowphase::{self, Manifold};
use super::quadtree::QuadTree;
use super::resolve::resolve;
use crate::config::{QuadTreeConfig, SimConfig};
use crate::ecs::Entity;

/// Two bodies that overlapped and were separated this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CollisionEvent {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub user_a: Option<Entity>,
    pub user_b: Option<Entity>,
}

impl CollisionEvent {
    /// The other owner, if `entity` is one side of this event.
    pub fn other(&self, entity: Entity) -> Option<Entity> {
        if self.user_a == Some(entity) {
            self.user_b
        } else if self.user_b == Some(entity) {
            self.user_a
        } else {
            None
        }
    }
}

pub struct PhysicsWorld {
    next_id: u32,
    bodies: Vec<RigidBody>,
    tree: QuadTree<BodyHandle>,
    events: Vec<CollisionEvent>,
    manifolds: Vec<(BodyHandle, BodyHandle, Manifold)>,
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("bodies", &self.bodies.len())
            .field("events", &self.events.len())
            .field("bounds", &self.tree.bounds())
            .finish()
    }
}

impl PhysicsWorld {
    /// A world whose broadphase covers `bounds`.
    pub fn new(bounds: Aabb, quadtree: QuadTreeConfig) -> Self {
        log::info!(
            "physics world {:?}..{:?}, quad-tree capacity {} depth {}",
            bounds.min,
            bounds.max,
            quadtree.capacity,
            quadtree.max_depth
        );
        Self {
            next_id: 0,
            bodies: Vec::new(),
            tree: QuadTree::new(bounds, quadtree),
            events: Vec::new(),
            manifolds: Vec::new(),
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.world_bounds(), config.quadtree)
    }

    /// Create a body. Handles increase monotonically.
    pub fn create(&mut self, desc: BodyDesc) -> BodyHandle {
        self.next_id += 1;
        let handle = BodyHandle(self.next_id);
        self.bodies.push(RigidBody::new(handle, desc));
        handle
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.index_of(handle).map(|i| &self.bodies[i])
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.index_of(handle).map(|i| &mut self.bodies[i])
    }

    pub fn bodies(&self) -> impl Iterator<Item = &RigidBody> {
        self.bodies.iter()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Remove a body immediately. Returns `false` for unknown handles.
    pub fn destroy(&mut self, handle: BodyHandle) -> bool {
        match self.index_of(handle) {
            Some(i) => {
                self.bodies.remove(i);
                self.tree.remove(handle);
                true
            }
            None => false,
        }
    }

    /// Flag a body for removal at the start of the next step. The body keeps
    /// its slot until then but is no longer simulated.
    pub fn mark_for_deletion(&mut self, handle: BodyHandle) -> bool {
        match self.body_mut(handle) {
            Some(body) => {
                body.mark_for_deletion();
                true
            }
            None => false,
        }
    }

    /// Collision pairs found by the latest step.
    pub fn events(&self) -> &[CollisionEvent] {
        &self.events
    }

    /// Manifolds of the latest step's collisions, in event order.
    pub fn manifolds(&self) -> &[(BodyHandle, BodyHandle, Manifold)] {
        &self.manifolds
    }

    /// Bodies whose boxes, as inserted by the latest step, overlap `area`.
    pub fn query_region(&mut self, area: &Aabb) -> Vec<BodyHandle> {
        let mut hits = self.tree.query(area);
        hits.sort_unstable();
        hits
    }

    /// Bodies containing `point`, tested against their current boxes.
    pub fn bodies_at(&mut self, point: Vec2) -> Vec<BodyHandle> {
        let probe = Aabb::new(point, point);
        self.query_region(&probe)
            .into_iter()
            .filter(|&h| self.body(h).is_some_and(|b| b.aabb().contains_point(point)))
            .collect()
    }

    pub fn tree(&self) -> &QuadTree<BodyHandle> {
        &self.tree
    }

    pub fn step(&mut self, dt: f32) {
        self.events.clear();
        self.manifolds.clear();
        self.tree.clear();

        for body in &mut self.bodies {
            if body.is_marked_for_deletion() {
                continue;
            }
            body.integrate(dt);
            self.tree.insert(body.handle(), body.aabb());
        }

        let before = self.bodies.len();
        self.bodies.retain(|b| !b.is_marked_for_deletion());
        if self.bodies.len() != before {
            log::trace!("deleted {} marked bod(ies)", before - self.bodies.len());
        }

        let mut tested = vec![false; self.bodies.len()];
        for i in 0..self.bodies.len() {
            tested[i] = true;
            let area = self.bodies[i].aabb();
            for candidate in self.tree.query(&area) {
                let Some(j) = self.index_of(candidate) else {
                    continue;
                };
                if j == i || tested[j] {
                    continue;
                }
                let (a, b) = pair_mut(&mut self.bodies, i, j);
                if !a.can_collide_with(b) || (a.is_static() && b.is_static()) {
                    continue;
                }
                let Some(manifold) = narrowphase::detect(a, b) else {
                    continue;
                };
                resolve(&manifold, a, b);
                self.events.push(CollisionEvent {
                    body_a: a.handle(),
                    body_b: b.handle(),
                    user_a: a.user_data(),
                    user_b: b.user_data(),
                });
                self.manifolds.push((a.handle(), b.handle(), manifold));
            }
        }
    }

    fn index_of(&self, handle: BodyHandle) -> Option<usize> {
        self.bodies
            .binary_search_by_key(&handle, RigidBody::handle)
            .ok()
    }
}

/// Mutable references to two distinct elements.
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(i, j);
    if i < j {
        let (lo, hi) = items.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}
