//! Line segment type.

use super::{Point, PointF};
use crate::{unscale, Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A line segment defined by two endpoints.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line {
    pub a: Point,
    pub b: Point,
}

impl Line {
    /// Create a new line segment from two points.
    #[inline]
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Get the direction vector (b - a).
    #[inline]
    pub fn direction(&self) -> Point {
        self.b - self.a
    }

    /// Get the direction vector as floating-point.
    #[inline]
    pub fn direction_f(&self) -> PointF {
        self.b.to_f64() - self.a.to_f64()
    }

    /// Get the midpoint of the line segment.
    #[inline]
    pub fn midpoint(&self) -> Point {
        Point::new(
            self.a.x / 2 + self.b.x / 2,
            self.a.y / 2 + self.b.y / 2,
        )
    }

    /// Get the squared length of the line segment.
    #[inline]
    pub fn length_squared(&self) -> i128 {
        self.a.distance_squared(&self.b)
    }

    /// Get the length of the line segment.
    #[inline]
    pub fn length(&self) -> CoordF {
        self.a.distance(&self.b)
    }

    /// Check if this line segment is a point (zero length).
    #[inline]
    pub fn is_point(&self) -> bool {
        self.a == self.b
    }

    /// Reverse the direction of the line segment.
    #[inline]
    pub fn reverse(&self) -> Self {
        Self {
            a: self.b,
            b: self.a,
        }
    }

    /// Calculate the distance from a point to this line segment.
    pub fn distance_to_point(&self, p: &Point) -> CoordF {
        let proj = p.project_onto_segment(self.a, self.b);
        p.distance(&proj)
    }

    /// Calculate the perpendicular distance from a point to the infinite
    /// line through this segment.
    pub fn perp_distance_to(&self, p: &Point) -> CoordF {
        let dir = self.direction();
        let len_sq = dir.length_squared();
        if len_sq == 0 {
            return p.distance(&self.a);
        }
        let ap = *p - self.a;
        let cross = (dir.x as i128 * ap.y as i128 - dir.y as i128 * ap.x as i128).abs();
        cross as CoordF / (len_sq as CoordF).sqrt()
    }

    /// Project a point onto this line segment, clamping to the segment bounds.
    #[inline]
    pub fn project_point(&self, p: &Point) -> Point {
        p.project_onto_segment(self.a, self.b)
    }

    /// Project a point onto the infinite line through this segment
    /// (the foot of the perpendicular).
    pub fn foot(&self, p: &Point) -> Point {
        let ab = self.direction();
        let len_sq = ab.length_squared();
        if len_sq == 0 {
            return self.a;
        }
        let t = (*p - self.a).dot(&ab) as CoordF / len_sq as CoordF;
        Point::new(
            (self.a.x as CoordF + t * ab.x as CoordF).round() as Coord,
            (self.a.y as CoordF + t * ab.y as CoordF).round() as Coord,
        )
    }

    /// Calculate the angle of this line segment (radians from positive x-axis).
    #[inline]
    pub fn angle(&self) -> CoordF {
        let dir = self.direction();
        (dir.y as CoordF).atan2(dir.x as CoordF)
    }

    /// Angle of the undirected carrier line, normalized so the direction has
    /// a non-negative x component. Result lies in `(-PI/2, PI/2]`.
    pub fn undirected_angle(&self) -> CoordF {
        let mut dir = self.direction();
        if dir.x < 0 || (dir.x == 0 && dir.y < 0) {
            dir = -dir;
        }
        (dir.y as CoordF).atan2(dir.x as CoordF)
    }

    /// Calculate the intersection point of two line segments.
    /// Returns None if the segments don't intersect.
    pub fn intersection(&self, other: &Line) -> Option<Point> {
        let d1 = self.direction();
        let d2 = other.direction();

        let cross = d1.cross(&d2);
        if cross == 0 {
            return None; // parallel
        }

        let diff = other.a - self.a;
        let t = diff.cross(&d2) as CoordF / cross as CoordF;
        let u = diff.cross(&d1) as CoordF / cross as CoordF;

        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some(Point::new(
                (self.a.x as CoordF + t * d1.x as CoordF).round() as Coord,
                (self.a.y as CoordF + t * d1.y as CoordF).round() as Coord,
            ))
        } else {
            None
        }
    }

    /// Squared distance from a point to the segment `a..b`.
    pub fn distance_to_squared(p: Point, a: Point, b: Point) -> f64 {
        let proj = p.project_onto_segment(a, b);
        p.distance_squared(&proj) as f64
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line({:?} -> {:?})", self.a, self.b)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[({:.6}, {:.6}) -> ({:.6}, {:.6})]",
            unscale(self.a.x),
            unscale(self.a.y),
            unscale(self.b.x),
            unscale(self.b.y)
        )
    }
}

impl From<(Point, Point)> for Line {
    #[inline]
    fn from((a, b): (Point, Point)) -> Self {
        Self { a, b }
    }
}

/// Type alias for a collection of lines.
pub type Lines = Vec<Line>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_length() {
        let line = Line::new(Point::zero(), Point::new(3_000_000, 4_000_000));
        assert!((line.length() - 5_000_000.0).abs() < 1.0);
    }

    #[test]
    fn test_line_intersection() {
        let line1 = Line::new(Point::new(0, 0), Point::new(100, 100));
        let line2 = Line::new(Point::new(0, 100), Point::new(100, 0));
        assert_eq!(line1.intersection(&line2), Some(Point::new(50, 50)));
    }

    #[test]
    fn test_line_no_intersection() {
        let line1 = Line::new(Point::new(0, 0), Point::new(50, 50));
        let line2 = Line::new(Point::new(60, 60), Point::new(100, 100));
        assert!(line1.intersection(&line2).is_none());
    }

    #[test]
    fn test_perp_distance() {
        let line = Line::new(Point::new(0, 0), Point::new(100, 0));
        assert!((line.perp_distance_to(&Point::new(500, 40)) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_foot() {
        let line = Line::new(Point::new(0, 0), Point::new(100, 0));
        assert_eq!(line.foot(&Point::new(250, 40)), Point::new(250, 0));
    }

    #[test]
    fn test_undirected_angle() {
        let l1 = Line::new(Point::new(0, 0), Point::new(100, 0));
        let l2 = Line::new(Point::new(100, 0), Point::new(0, 0));
        assert!((l1.undirected_angle() - l2.undirected_angle()).abs() < 1e-12);
    }
}
