//! Shapes attached to rigid bodies.
//!
//! A body carries exactly one [`Fixture`]: a [`Shape`] plus the mass it
//! contributes. Geometry is expressed relative to the body's position and
//! rotation, so the same fixture answers for any pose.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use crate::math::rotate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Rectangle { half_width: f32, half_height: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub shape: Shape,
    pub mass: f32,
}

impl Fixture {
    pub fn circle(mass: f32, radius: f32) -> Self {
        Self {
            shape: Shape::Circle { radius },
            mass,
        }
    }

    /// Rectangle of full `width` × `height`, centred on the body.
    pub fn rectangle(mass: f32, width: f32, height: f32) -> Self {
        Self {
            shape: Shape::Rectangle {
                half_width: width / 2.0,
                half_height: height / 2.0,
            },
            mass,
        }
    }

    /// Bounding box in the body's frame (origin at the body position),
    /// accounting for `rotation`.
    pub fn local_aabb(&self, rotation: f32) -> Aabb {
        match self.shape {
            Shape::Circle { radius } => Aabb::from_center(Vec2::ZERO, Vec2::splat(radius)),
            Shape::Rectangle {
                half_width,
                half_height,
            } => {
                let corners = rectangle_corners(half_width, half_height, Vec2::ZERO, rotation);
                // Four corners, never empty.
                Aabb::enclosing(&corners)
                    .unwrap_or_else(|| Aabb::new(Vec2::ZERO, Vec2::ZERO))
            }
        }
    }

    pub fn aabb(&self, position: Vec2, rotation: f32) -> Aabb {
        self.local_aabb(rotation).translated(position)
    }

    /// World-space corners of a rectangle fixture, counter-clockwise from the
    /// lower-left. `None` for circles.
    pub fn corners(&self, position: Vec2, rotation: f32) -> Option<[Vec2; 4]> {
        match self.shape {
            Shape::Rectangle {
                half_width,
                half_height,
            } => Some(rectangle_corners(half_width, half_height, position, rotation)),
            Shape::Circle { .. } => None,
        }
    }
}

fn rectangle_corners(hw: f32, hh: f32, position: Vec2, rotation: f32) -> [Vec2; 4] {
    [
        Vec2::new(-hw, -hh),
        Vec2::new(hw, -hh),
        Vec2::new(hw, hh),
        Vec2::new(-hw, hh),
    ]
    .map(|c| rotate(c, rotation) + position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn rectangle_stores_half_extents() {
        let f = Fixture::rectangle(1.0, 10.0, 4.0);
        assert_eq!(
            f.shape,
            Shape::Rectangle {
                half_width: 5.0,
                half_height: 2.0
            }
        );
    }

    #[test]
    fn circle_aabb_is_centred() {
        let f = Fixture::circle(1.0, 3.0);
        assert_eq!(
            f.aabb(Vec2::new(10.0, 10.0), 1.2),
            Aabb::new(Vec2::new(7.0, 7.0), Vec2::new(13.0, 13.0))
        );
    }

    #[test]
    fn rotated_square_aabb_grows() {
        let f = Fixture::rectangle(1.0, 2.0, 2.0);
        let b = f.local_aabb(FRAC_PI_4);
        let r = 2.0_f32.sqrt();
        assert!((b.max.x - r).abs() < 1e-5);
        assert!((b.min.y + r).abs() < 1e-5);
    }

    #[test]
    fn corners_are_offset_by_position() {
        let f = Fixture::rectangle(1.0, 2.0, 4.0);
        let c = f.corners(Vec2::new(5.0, 5.0), 0.0).unwrap();
        assert_eq!(c[0], Vec2::new(4.0, 3.0));
        assert_eq!(c[2], Vec2::new(6.0, 7.0));
        assert!(Fixture::circle(1.0, 1.0).corners(Vec2::ZERO, 0.0).is_none());
    }
}
