//! # Narrowphase — Exact Overlap Tests
//!
//! [`detect`] answers whether two bodies' fixtures overlap and, if so, by how
//! much and along which direction. The returned [`Manifold`] normal points
//! from body B towards body A: moving A along `+normal` by `depth`, or B
//! along `-normal`, separates them.
//!
//! | A \ B     | Circle          | Rectangle                   |
//! |-----------|-----------------|-----------------------------|
//! | Circle    | centre distance | rect/circle, normal negated |
//! | Rectangle | single-axis SAT | four-axis SAT               |
//!
//! The rectangle/circle test projects on one axis only, the line between the
//! two centres, with the circle reduced to the interval `centre ± radius`.
//! It is an approximation of full polygon/circle SAT: near a rectangle's
//! corner it reports overlap slightly early.

use glam::Vec2;

use super::body::RigidBody;
use super::fixture::Shape;

#[derive(Debug, Clone, PartialEq)]
pub struct Manifold {
    /// Penetration depth, never negative.
    pub depth: f32,
    /// Unit separation direction, pointing away from body B.
    pub normal: Vec2,
    /// Contact points where the test produces them. Not used for resolution.
    pub contacts: Vec<Vec2>,
}

impl Manifold {
    fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        self
    }
}

pub fn detect(a: &RigidBody, b: &RigidBody) -> Option<Manifold> {
    let (fa, fb) = (a.fixture(), b.fixture());
    match (fa.shape, fb.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_circle(a.position(), ra, b.position(), rb)
        }
        (Shape::Rectangle { .. }, Shape::Rectangle { .. }) => {
            let corners_a = fa.corners(a.position(), a.rotation())?;
            let corners_b = fb.corners(b.position(), b.rotation())?;
            rect_rect(&corners_a, a.rotation(), &corners_b, b.rotation())
        }
        (Shape::Rectangle { .. }, Shape::Circle { radius }) => {
            let corners = fa.corners(a.position(), a.rotation())?;
            rect_circle(&corners, a.position(), b.position(), radius)
        }
        (Shape::Circle { radius }, Shape::Rectangle { .. }) => {
            let corners = fb.corners(b.position(), b.rotation())?;
            rect_circle(&corners, b.position(), a.position(), radius).map(Manifold::flipped)
        }
    }
}

/// Overlap when the centres are at most `ra + rb` apart (touching counts).
/// Coincident centres separate along +X by the full radius sum.
pub fn circle_circle(pa: Vec2, ra: f32, pb: Vec2, rb: f32) -> Option<Manifold> {
    let delta = pa - pb;
    let distance = delta.length();
    let radii = ra + rb;
    if distance > radii {
        return None;
    }
    if pa == pb {
        return Some(Manifold {
            depth: radii,
            normal: Vec2::X,
            contacts: vec![pb],
        });
    }
    let normal = delta / distance;
    Some(Manifold {
        depth: radii - distance,
        normal,
        contacts: vec![pb + normal * rb],
    })
}

/// SAT over the two face normals of each rectangle, A's first.
pub fn rect_rect(
    corners_a: &[Vec2; 4],
    rotation_a: f32,
    corners_b: &[Vec2; 4],
    rotation_b: f32,
) -> Option<Manifold> {
    let (sa, ca) = rotation_a.sin_cos();
    let (sb, cb) = rotation_b.sin_cos();
    let axes = [
        Vec2::new(ca, sa),
        Vec2::new(-sa, ca),
        Vec2::new(cb, sb),
        Vec2::new(-sb, cb),
    ];
    separating_axis_test(&axes, corners_a, corners_b)
}

/// One-axis test between a rectangle (corners + centre) and a circle.
pub fn rect_circle(
    corners: &[Vec2; 4],
    rect_center: Vec2,
    circle_center: Vec2,
    radius: f32,
) -> Option<Manifold> {
    let axis = (circle_center - rect_center).try_normalize().unwrap_or(Vec2::X);
    let along = axis * radius;
    let circle_points = [circle_center - along, circle_center + along];
    separating_axis_test(&[axis], corners, &circle_points)
}

/// Project both point sets onto each axis. Any gap means no overlap.
/// Otherwise the axis with the smallest overlap wins; on equal overlap the
/// later axis replaces the earlier one. The normal is flipped so that it
/// points from B towards A.
pub fn separating_axis_test(axes: &[Vec2], a: &[Vec2], b: &[Vec2]) -> Option<Manifold> {
    let mut best: Option<(f32, Vec2)> = None;
    for &axis in axes {
        let (min_a, max_a) = project(axis, a)?;
        let (min_b, max_b) = project(axis, b)?;
        if !(max_a >= min_b && max_b >= min_a) {
            return None;
        }
        let overlap = (max_a.min(max_b) - min_a.max(min_b)).max(0.0);
        if best.is_none_or(|(depth, _)| overlap <= depth) {
            let normal = if max_a - max_b < 0.0 { -axis } else { axis };
            best = Some((overlap, normal));
        }
    }
    best.map(|(depth, normal)| Manifold {
        depth,
        normal,
        contacts: Vec::new(),
    })
}

fn project(axis: Vec2, points: &[Vec2]) -> Option<(f32, f32)> {
    let (first, rest) = points.split_first()?;
    let start = axis.dot(*first);
    Some(rest.iter().fold((start, start), |(lo, hi), p| {
        let d = axis.dot(*p);
        (lo.min(d), hi.max(d))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::{BodyDesc, BodyHandle};
    use crate::physics::fixture::Fixture;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn body(desc: BodyDesc) -> RigidBody {
        RigidBody::new(BodyHandle(0), desc)
    }

    #[test]
    fn circles_overlapping_along_x() {
        let m = circle_circle(Vec2::ZERO, 5.0, Vec2::new(8.0, 0.0), 5.0).unwrap();
        assert!(approx(m.depth, 2.0));
        assert_eq!(m.normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn circles_touching_count_as_overlap() {
        let m = circle_circle(Vec2::ZERO, 5.0, Vec2::new(10.0, 0.0), 5.0).unwrap();
        assert!(approx(m.depth, 0.0));
        assert!(circle_circle(Vec2::ZERO, 5.0, Vec2::new(10.01, 0.0), 5.0).is_none());
    }

    #[test]
    fn coincident_circles_use_fallback_normal() {
        let m = circle_circle(Vec2::ONE, 2.0, Vec2::ONE, 3.0).unwrap();
        assert_eq!(m.normal, Vec2::X);
        assert!(approx(m.depth, 5.0));
    }

    #[test]
    fn rectangles_overlap_on_x() {
        let a = body(BodyDesc::fixed(Fixture::rectangle(1.0, 10.0, 10.0)));
        let b = body(BodyDesc::dynamic(Fixture::rectangle(1.0, 10.0, 10.0)).at(Vec2::new(5.0, 0.0)));
        let m = detect(&a, &b).unwrap();
        assert!(approx(m.depth, 5.0));
        assert_eq!(m.normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn separated_rectangles_miss() {
        let a = body(BodyDesc::dynamic(Fixture::rectangle(1.0, 10.0, 10.0)));
        let b = body(
            BodyDesc::dynamic(Fixture::rectangle(1.0, 10.0, 10.0)).at(Vec2::new(0.0, 10.5)),
        );
        assert!(detect(&a, &b).is_none());
    }

    #[test]
    fn rotated_rectangle_uses_its_own_axes() {
        let a = body(BodyDesc::dynamic(Fixture::rectangle(1.0, 2.0, 2.0)));
        // A diamond whose tip reaches x = 1 + sqrt(2) - 0.2 from centre 2.2.
        let b = body(
            BodyDesc::dynamic(Fixture::rectangle(1.0, 2.0, 2.0))
                .at(Vec2::new(2.2, 0.0))
                .with_rotation(std::f32::consts::FRAC_PI_4),
        );
        let m = detect(&a, &b).unwrap();
        assert!(m.depth > 0.0);
        assert!(m.normal.x < 0.0);
    }

    #[test]
    fn rect_circle_normal_points_away_from_circle() {
        let rect = body(BodyDesc::dynamic(Fixture::rectangle(1.0, 10.0, 10.0)));
        let circle = body(BodyDesc::dynamic(Fixture::circle(1.0, 2.0)).at(Vec2::new(6.0, 0.0)));
        let m = detect(&rect, &circle).unwrap();
        assert!(approx(m.depth, 1.0));
        assert_eq!(m.normal, Vec2::new(-1.0, 0.0));

        let swapped = detect(&circle, &rect).unwrap();
        assert!(approx(swapped.depth, 1.0));
        assert_eq!(swapped.normal, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn rect_circle_miss() {
        let rect = body(BodyDesc::dynamic(Fixture::rectangle(1.0, 10.0, 10.0)));
        let circle = body(BodyDesc::dynamic(Fixture::circle(1.0, 2.0)).at(Vec2::new(0.0, 7.5)));
        assert!(detect(&rect, &circle).is_none());
    }

    #[test]
    fn equal_overlap_prefers_later_axis() {
        let square = [
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
        ];
        let shifted = square.map(|p| p + Vec2::new(1.0, 1.0));
        let m = separating_axis_test(&[Vec2::X, Vec2::Y], &square, &shifted).unwrap();
        assert!(approx(m.depth, 1.0));
        assert_eq!(m.normal, Vec2::new(0.0, -1.0));
    }
}
