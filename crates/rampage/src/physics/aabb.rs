use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box. `min` is the lower-left corner, `max` the
/// upper-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Box with its lower-left corner at `(x, y)`.
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Smallest box holding every point. `None` for an empty slice.
    pub fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut out = Self::new(*first, *first);
        for p in rest {
            out.min = out.min.min(*p);
            out.max = out.max.max(*p);
        }
        Some(out)
    }

    /// Closed-interval overlap test: boxes that only touch overlap.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        self.min.x <= p.x && p.x <= self.max.x && self.min.y <= p.y && p.y <= self.max.y
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// One of the four equal sub-boxes:
    ///
    /// ```text
    /// ┌───┬───┐
    /// │ 2 │ 3 │
    /// ├───┼───┤
    /// │ 0 │ 1 │
    /// └───┴───┘
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `index > 3`.
    pub fn quadrant(&self, index: usize) -> Aabb {
        let half = self.size() * 0.5;
        let origin = match index {
            0 => self.min,
            1 => Vec2::new(self.min.x + half.x, self.min.y),
            2 => Vec2::new(self.min.x, self.min.y + half.y),
            3 => self.min + half,
            _ => panic!("invalid quadrant index {index}"),
        };
        Aabb::new(origin, origin + half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_boxes_intersect() {
        let a = Aabb::from_xywh(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::from_xywh(10.0, 0.0, 5.0, 5.0);
        let c = Aabb::from_xywh(0.0, 10.0, 5.0, 5.0);
        assert!(a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(b.intersects(&a));
    }

    #[test]
    fn separated_boxes_do_not_intersect() {
        let a = Aabb::from_xywh(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::from_xywh(10.5, 0.0, 5.0, 5.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn quadrants_tile_the_box() {
        let b = Aabb::from_xywh(0.0, 0.0, 8.0, 4.0);
        assert_eq!(b.quadrant(0), Aabb::from_xywh(0.0, 0.0, 4.0, 2.0));
        assert_eq!(b.quadrant(1), Aabb::from_xywh(4.0, 0.0, 4.0, 2.0));
        assert_eq!(b.quadrant(2), Aabb::from_xywh(0.0, 2.0, 4.0, 2.0));
        assert_eq!(b.quadrant(3), Aabb::from_xywh(4.0, 2.0, 4.0, 2.0));
    }

    #[test]
    #[should_panic(expected = "invalid quadrant index")]
    fn quadrant_out_of_range_panics() {
        Aabb::from_xywh(0.0, 0.0, 1.0, 1.0).quadrant(4);
    }

    #[test]
    fn enclosing_points() {
        let pts = [Vec2::new(1.0, -2.0), Vec2::new(-3.0, 4.0), Vec2::new(0.0, 0.0)];
        let b = Aabb::enclosing(&pts).unwrap();
        assert_eq!(b, Aabb::new(Vec2::new(-3.0, -2.0), Vec2::new(1.0, 4.0)));
        assert!(Aabb::enclosing(&[]).is_none());
    }
}
