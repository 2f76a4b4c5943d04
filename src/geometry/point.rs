//! 2D point types with scaled integer and floating-point coordinates.

use crate::{scale, unscale, Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A 2D point with scaled integer coordinates.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    /// Create a new point from integer coordinates.
    #[inline]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Create a point from floating-point coordinates (in mm).
    #[inline]
    pub fn new_scale(x: CoordF, y: CoordF) -> Self {
        Self {
            x: scale(x),
            y: scale(y),
        }
    }

    /// The origin point (0, 0).
    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0, y: 0 }
    }

    /// Convert to a floating-point point (scaled units, not mm).
    #[inline]
    pub fn to_f64(&self) -> PointF {
        PointF::new(self.x as CoordF, self.y as CoordF)
    }

    /// Convert to a floating-point point in mm.
    #[inline]
    pub fn to_mm(&self) -> PointF {
        PointF::new(unscale(self.x), unscale(self.y))
    }

    /// Squared Euclidean distance to another point, widened to avoid overflow.
    #[inline]
    pub fn distance_squared(&self, other: &Point) -> i128 {
        let dx = (self.x - other.x) as i128;
        let dy = (self.y - other.y) as i128;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point) -> CoordF {
        (self.distance_squared(other) as CoordF).sqrt()
    }

    /// Squared length of this point treated as a vector.
    #[inline]
    pub fn length_squared(&self) -> i128 {
        let x = self.x as i128;
        let y = self.y as i128;
        x * x + y * y
    }

    /// Length of this point treated as a vector.
    #[inline]
    pub fn length(&self) -> CoordF {
        (self.length_squared() as CoordF).sqrt()
    }

    /// Dot product with another vector.
    #[inline]
    pub fn dot(&self, other: &Point) -> i128 {
        self.x as i128 * other.x as i128 + self.y as i128 * other.y as i128
    }

    /// Cross product (z component) with another vector.
    #[inline]
    pub fn cross(&self, other: &Point) -> i128 {
        self.x as i128 * other.y as i128 - self.y as i128 * other.x as i128
    }

    /// Rotate 90 degrees counter-clockwise about the origin.
    #[inline]
    pub fn rotate_90_ccw(&self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Rotate about the origin by an angle in radians.
    pub fn rotate(&self, angle: CoordF) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(
            (self.x as CoordF * cos - self.y as CoordF * sin).round() as Coord,
            (self.x as CoordF * sin + self.y as CoordF * cos).round() as Coord,
        )
    }

    /// Rotate about a center point by an angle in radians.
    pub fn rotate_around(&self, angle: CoordF, center: Point) -> Self {
        (*self - center).rotate(angle) + center
    }

    /// Project this point onto the segment `a..b`, clamping to segment bounds.
    pub fn project_onto_segment(&self, a: Point, b: Point) -> Point {
        let ab = b - a;
        let len_sq = ab.length_squared();
        if len_sq == 0 {
            return a;
        }
        let t = (*self - a).dot(&ab) as CoordF / len_sq as CoordF;
        let t = t.clamp(0.0, 1.0);
        Point::new(
            (a.x as CoordF + t * ab.x as CoordF).round() as Coord,
            (a.y as CoordF + t * ab.y as CoordF).round() as Coord,
        )
    }

    /// Check whether two points coincide within a tolerance.
    #[inline]
    pub fn coincides_with(&self, other: &Point, tolerance: Coord) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", unscale(self.x), unscale(self.y))
    }
}

impl Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    #[inline]
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    #[inline]
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Point {
    type Output = Point;
    #[inline]
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<CoordF> for Point {
    type Output = Point;
    #[inline]
    fn mul(self, rhs: CoordF) -> Point {
        Point::new(
            (self.x as CoordF * rhs).round() as Coord,
            (self.y as CoordF * rhs).round() as Coord,
        )
    }
}

/// Type alias for a collection of points.
pub type Points = Vec<Point>;

/// A 2D point with floating-point coordinates.
#[derive(Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointF {
    pub x: CoordF,
    pub y: CoordF,
}

impl PointF {
    /// Create a new floating-point point.
    #[inline]
    pub const fn new(x: CoordF, y: CoordF) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[inline]
    pub fn distance_squared(&self, other: &PointF) -> CoordF {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &PointF) -> CoordF {
        self.distance_squared(other).sqrt()
    }

    /// Vector length.
    #[inline]
    pub fn norm(&self) -> CoordF {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Normalize to unit length. Returns the zero vector unchanged.
    pub fn normalize(&self) -> PointF {
        let n = self.norm();
        if n == 0.0 {
            *self
        } else {
            PointF::new(self.x / n, self.y / n)
        }
    }

    /// Dot product.
    #[inline]
    pub fn dot(&self, other: &PointF) -> CoordF {
        self.x * other.x + self.y * other.y
    }

    /// Cross product (z component).
    #[inline]
    pub fn cross(&self, other: &PointF) -> CoordF {
        self.x * other.y - self.y * other.x
    }

    /// Perpendicular vector (rotated 90 degrees counter-clockwise).
    #[inline]
    pub fn perp(&self) -> PointF {
        PointF::new(-self.y, self.x)
    }

    /// Round to a scaled integer point.
    #[inline]
    pub fn to_scaled(&self) -> Point {
        Point::new(self.x.round() as Coord, self.y.round() as Coord)
    }
}

impl fmt::Debug for PointF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

impl Add for PointF {
    type Output = PointF;
    #[inline]
    fn add(self, rhs: PointF) -> PointF {
        PointF::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for PointF {
    type Output = PointF;
    #[inline]
    fn sub(self, rhs: PointF) -> PointF {
        PointF::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<CoordF> for PointF {
    type Output = PointF;
    #[inline]
    fn mul(self, rhs: CoordF) -> PointF {
        PointF::new(self.x * rhs, self.y * rhs)
    }
}
