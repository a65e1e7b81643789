//! Positional collision response.
//!
//! Overlapping bodies are pushed apart along the manifold normal. Nothing
//! is exchanged as impulse: each correction goes through
//! [`RigidBody::move_by`], so the correction itself becomes the body's
//! velocity for the next step.

use super::body::RigidBody;
use super::narrowphase::Manifold;

/// Separate `a` and `b`. Returns `false` when both are static and nothing
/// moved.
///
/// - one static: the dynamic body takes the full `normal * depth`
/// - both dynamic: A moves `normal * depth * mB / (mA + mB)`, B moves
///   `-normal * depth * mA / (mA + mB)`; massless pairs split evenly
pub fn resolve(manifold: &Manifold, a: &mut RigidBody, b: &mut RigidBody) -> bool {
    let correction = manifold.normal * manifold.depth;
    match (a.is_static(), b.is_static()) {
        (true, true) => false,
        (true, false) => {
            b.move_by(-correction);
            true
        }
        (false, true) => {
            a.move_by(correction);
            true
        }
        (false, false) => {
            let total = a.mass() + b.mass();
            let (share_a, share_b) = if total > 0.0 {
                (b.mass() / total, a.mass() / total)
            } else {
                (0.5, 0.5)
            };
            a.move_by(correction * share_a);
            b.move_by(-correction * share_b);
            true
        }
    }
}
