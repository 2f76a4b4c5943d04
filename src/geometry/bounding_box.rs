//! Axis-aligned 2D bounding box over scaled integer coordinates.

use super::Point;
use crate::Coord;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box.
///
/// A default-constructed box is empty (min > max) and merges correctly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Point::new(Coord::MAX, Coord::MAX),
            max: Point::new(Coord::MIN, Coord::MIN),
        }
    }
}

impl BoundingBox {
    /// Create an empty bounding box.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bounding box covering the given points.
    pub fn from_points(points: &[Point]) -> Self {
        let mut bb = Self::new();
        for p in points {
            bb.merge_point(*p);
        }
        bb
    }

    /// Whether no point was merged yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Extend the box to contain a point.
    #[inline]
    pub fn merge_point(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// Extend the box to contain another box.
    #[inline]
    pub fn merge(&mut self, other: &BoundingBox) {
        if !other.is_empty() {
            self.merge_point(other.min);
            self.merge_point(other.max);
        }
    }

    /// Size of the box as a vector.
    #[inline]
    pub fn size(&self) -> Point {
        self.max - self.min
    }

    /// Center of the box. Halving both corners first prevents overflow.
    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            self.min.x / 2 + self.max.x / 2,
            self.min.y / 2 + self.max.y / 2,
        )
    }

    /// Whether two boxes overlap (touching counts).
    #[inline]
    pub fn overlap(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Whether the box contains a point (inclusive).
    #[inline]
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Grow the box by a margin in every direction.
    pub fn inflated(&self, margin: Coord) -> Self {
        Self {
            min: self.min - Point::new(margin, margin),
            max: self.max + Point::new(margin, margin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_and_size() {
        let bb = BoundingBox::from_points(&[Point::new(0, 10), Point::new(100, -20)]);
        assert_eq!(bb.min, Point::new(0, -20));
        assert_eq!(bb.max, Point::new(100, 10));
        assert_eq!(bb.size(), Point::new(100, 30));
    }

    #[test]
    fn test_overlap() {
        let a = BoundingBox::from_points(&[Point::new(0, 0), Point::new(10, 10)]);
        let b = BoundingBox::from_points(&[Point::new(5, 5), Point::new(20, 20)]);
        let c = BoundingBox::from_points(&[Point::new(11, 11), Point::new(20, 20)]);
        assert!(a.overlap(&b));
        assert!(!a.overlap(&c));
    }

    #[test]
    fn test_empty() {
        let mut bb = BoundingBox::new();
        assert!(bb.is_empty());
        bb.merge_point(Point::new(1, 2));
        assert!(!bb.is_empty());
        assert_eq!(bb.size(), Point::zero());
    }
}
