//! Polygon with holes.

use super::{simplify::douglas_peucker, BoundingBox, Line, Point, Polygon, Polygons};
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};

/// One outer contour plus zero or more hole contours.
///
/// Invariant: the contour winds counter-clockwise, holes wind clockwise,
/// holes are disjoint and lie strictly inside the contour.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExPolygon {
    pub contour: Polygon,
    pub holes: Polygons,
}

impl ExPolygon {
    /// Create an ExPolygon from a contour without holes.
    pub fn new(contour: Polygon) -> Self {
        Self {
            contour,
            holes: Vec::new(),
        }
    }

    /// Create an ExPolygon from a contour and holes.
    pub fn with_holes(contour: Polygon, holes: Polygons) -> Self {
        Self { contour, holes }
    }

    /// Whether the contour is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contour.is_empty()
    }

    /// Total number of boundary points (contour + holes).
    pub fn points_count(&self) -> usize {
        self.contour.len() + self.holes.iter().map(|h| h.len()).sum::<usize>()
    }

    /// Area of the contour minus the hole areas.
    pub fn area(&self) -> CoordF {
        self.contour.area() - self.holes.iter().map(|h| h.area()).sum::<CoordF>()
    }

    /// Whether the point lies inside the contour and outside every hole.
    pub fn contains(&self, p: &Point) -> bool {
        self.contour.contains(p) && !self.holes.iter().any(|h| h.contains(p))
    }

    /// All boundary segments: contour lines first, then each hole in order.
    ///
    /// Line index `i` addresses the same segment as the flattened point
    /// sequence, which is what the Voronoi cells report as source index.
    pub fn to_lines(&self) -> Vec<Line> {
        let mut lines = self.contour.lines();
        for hole in &self.holes {
            lines.extend(hole.lines());
        }
        lines
    }

    /// Bounding box of the contour.
    pub fn bounding_box(&self) -> BoundingBox {
        self.contour.bounding_box()
    }

    /// Translate all rings in place.
    pub fn translate(&mut self, v: Point) {
        self.contour.translate(v);
        for hole in &mut self.holes {
            hole.translate(v);
        }
    }

    /// Rotate all rings about the origin in place (radians).
    pub fn rotate(&mut self, angle: CoordF) {
        self.contour.rotate(angle);
        for hole in &mut self.holes {
            hole.rotate(angle);
        }
    }

    /// Rotate all rings about a center in place (radians).
    pub fn rotate_around(&mut self, angle: CoordF, center: Point) {
        self.contour.rotate_around(angle, center);
        for hole in &mut self.holes {
            hole.rotate_around(angle, center);
        }
    }

    /// Return a copy with every ring simplified by Douglas-Peucker.
    ///
    /// Holes degenerating below 3 points are dropped; a degenerate contour
    /// yields an empty ExPolygon.
    pub fn simplified(&self, tolerance: Coord) -> ExPolygon {
        let contour = Polygon::from_points(douglas_peucker(self.contour.points(), tolerance));
        if contour.len() < 3 {
            return ExPolygon::default();
        }
        let holes = self
            .holes
            .iter()
            .map(|h| Polygon::from_points(douglas_peucker(h.points(), tolerance)))
            .filter(|h| h.len() >= 3)
            .collect();
        ExPolygon { contour, holes }
    }
}

impl From<Polygon> for ExPolygon {
    fn from(contour: Polygon) -> Self {
        Self::new(contour)
    }
}

/// Type alias for a collection of ExPolygons.
pub type ExPolygons = Vec<ExPolygon>;

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: i64, offset: Point) -> Polygon {
        let mut p = Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(size, 0),
            Point::new(size, size),
            Point::new(0, size),
        ]);
        p.translate(offset);
        p
    }

    fn square_with_hole() -> ExPolygon {
        let mut hole = square(20, Point::new(40, 40));
        hole.reverse();
        ExPolygon::with_holes(square(100, Point::zero()), vec![hole])
    }

    #[test]
    fn test_contains_respects_holes() {
        let ex = square_with_hole();
        assert!(ex.contains(&Point::new(10, 10)));
        assert!(!ex.contains(&Point::new(50, 50)));
        assert!(!ex.contains(&Point::new(200, 50)));
    }

    #[test]
    fn test_area() {
        let ex = square_with_hole();
        assert!((ex.area() - (10_000.0 - 400.0)).abs() < 1e-9);
    }

    #[test]
    fn test_to_lines_order() {
        let ex = square_with_hole();
        let lines = ex.to_lines();
        assert_eq!(lines.len(), 8);
        // contour lines come first
        assert_eq!(lines[0].a, Point::new(0, 0));
        // a hole line follows the contour block
        assert_eq!(lines[4].a, ex.holes[0].points()[0]);
    }
}
