//! Geometry primitives for the support generator.
//!
//! This module provides the fundamental geometric types used throughout the
//! sampling pipeline:
//! - [`Point`] - 2D point with integer coordinates (scaled)
//! - [`PointF`] - 2D point with floating-point coordinates
//! - [`Line`] - line segment between two points
//! - [`Polygon`] - closed polygon (boundary loop)
//! - [`ExPolygon`] - polygon with holes (exterior + interior contours)
//! - [`BoundingBox`] - axis-aligned bounding box
//!
//! ## Coordinate System
//!
//! Scaled integer coordinates are used internally to avoid floating-point
//! precision issues. Coordinates are scaled by `SCALING_FACTOR` (1,000,000),
//! so 1 unit = 1 nanometer.
//!
//! - Use `scale()` to convert from mm to internal units
//! - Use `unscale()` to convert from internal units to mm

mod bounding_box;
mod expolygon;
mod line;
mod point;
mod polygon;
pub mod simplify;

pub use bounding_box::BoundingBox;
pub use expolygon::{ExPolygon, ExPolygons};
pub use line::{Line, Lines};
pub use point::{Point, PointF, Points};
pub use polygon::{Polygon, Polygons};
pub use simplify::{douglas_peucker, remove_duplicate_points};

use crate::{Coord, CoordF};

/// Linear interpolation between two points.
#[inline]
pub fn lerp(a: Point, b: Point, t: CoordF) -> Point {
    Point::new(
        (a.x as CoordF + (b.x - a.x) as CoordF * t).round() as Coord,
        (a.y as CoordF + (b.y - a.y) as CoordF * t).round() as Coord,
    )
}

/// Orientation of three points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Counter-clockwise (left turn)
    CounterClockwise,
    /// Clockwise (right turn)
    Clockwise,
    /// Collinear (no turn)
    Collinear,
}

/// Determine the orientation of three points.
pub fn orientation(p1: Point, p2: Point, p3: Point) -> Orientation {
    let cross = (p2 - p1).cross(&(p3 - p2));
    if cross > 0 {
        Orientation::CounterClockwise
    } else if cross < 0 {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}
