//! Closed polygon type.
//!
//! A polygon stores its boundary as an ordered point sequence without
//! repeating the first point at the end. Outer contours wind counter-clockwise,
//! holes clockwise.

use super::{BoundingBox, Line, Point};
use crate::CoordF;
use serde::{Deserialize, Serialize};

/// A closed polygon (single boundary loop).
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Create a polygon from a point sequence. A trailing duplicate of the
    /// first point is dropped.
    pub fn from_points(mut points: Vec<Point>) -> Self {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Self { points }
    }

    /// Access the boundary points.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Mutable access to the boundary points.
    #[inline]
    pub fn points_mut(&mut self) -> &mut Vec<Point> {
        &mut self.points
    }

    /// Number of boundary points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the polygon has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Signed area (shoelace formula); positive for counter-clockwise winding.
    pub fn signed_area(&self) -> CoordF {
        if self.points.len() < 3 {
            return 0.0;
        }
        let mut sum: i128 = 0;
        for (i, p) in self.points.iter().enumerate() {
            let q = &self.points[(i + 1) % self.points.len()];
            sum += p.x as i128 * q.y as i128 - q.x as i128 * p.y as i128;
        }
        sum as CoordF / 2.0
    }

    /// Absolute area.
    #[inline]
    pub fn area(&self) -> CoordF {
        self.signed_area().abs()
    }

    /// Whether the polygon winds counter-clockwise.
    #[inline]
    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Whether the polygon winds clockwise.
    #[inline]
    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    /// Reverse the winding direction in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Area centroid. Falls back to the vertex average for degenerate polygons.
    pub fn centroid(&self) -> Point {
        let n = self.points.len();
        if n == 0 {
            return Point::zero();
        }
        let mut area2: CoordF = 0.0;
        let mut cx: CoordF = 0.0;
        let mut cy: CoordF = 0.0;
        for (i, p) in self.points.iter().enumerate() {
            let q = &self.points[(i + 1) % n];
            let cross = p.x as CoordF * q.y as CoordF - q.x as CoordF * p.y as CoordF;
            area2 += cross;
            cx += (p.x as CoordF + q.x as CoordF) * cross;
            cy += (p.y as CoordF + q.y as CoordF) * cross;
        }
        if area2.abs() < 1.0 {
            let sx: i128 = self.points.iter().map(|p| p.x as i128).sum();
            let sy: i128 = self.points.iter().map(|p| p.y as i128).sum();
            return Point::new((sx / n as i128) as i64, (sy / n as i128) as i64);
        }
        let f = 1.0 / (3.0 * area2);
        Point::new((cx * f).round() as i64, (cy * f).round() as i64)
    }

    /// Point-in-polygon test (crossing number). Points on the boundary may
    /// land on either side.
    pub fn contains(&self, p: &Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = &self.points[i];
            let b = &self.points[j];
            if (a.y > p.y) != (b.y > p.y) {
                let slope_side = (p.x - a.x) as i128 * (b.y - a.y) as i128
                    - (b.x - a.x) as i128 * (p.y - a.y) as i128;
                if slope_side == 0 {
                    return true; // on the edge
                }
                if (slope_side < 0) != (b.y < a.y) {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Boundary as line segments, closing back to the first point.
    pub fn lines(&self) -> Vec<Line> {
        let n = self.points.len();
        (0..n)
            .map(|i| Line::new(self.points[i], self.points[(i + 1) % n]))
            .collect()
    }

    /// Bounding box of the boundary points.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Translate by a vector in place.
    pub fn translate(&mut self, v: Point) {
        for p in &mut self.points {
            *p += v;
        }
    }

    /// Rotate about the origin in place (radians).
    pub fn rotate(&mut self, angle: CoordF) {
        for p in &mut self.points {
            *p = p.rotate(angle);
        }
    }

    /// Rotate about a center point in place (radians).
    pub fn rotate_around(&mut self, angle: CoordF, center: Point) {
        for p in &mut self.points {
            *p = p.rotate_around(angle, center);
        }
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(points)
    }
}

/// Type alias for a collection of polygons.
pub type Polygons = Vec<Polygon>;
