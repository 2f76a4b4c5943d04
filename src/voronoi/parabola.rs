//! Discretization of parabolic Voronoi edges.
//!
//! A Voronoi edge between a point site (focus) and a segment site (directrix)
//! is a parabolic arc. The island width at an arc point is twice its distance
//! to either site, so sampling the arc densely enough makes the width
//! function piecewise-linear within tolerance. The apex is always emitted,
//! which keeps the width minimum exact.

use crate::geometry::{Line, Point, PointF};
use crate::{Coord, CoordF};

/// Maximal deviation of the polyline from the true arc, in scaled units.
const DISCRETIZATION_TOLERANCE: CoordF = 10_000.0; // 0.01 mm

/// Upper bound on subdivision to keep degenerate arcs cheap.
const MAX_SEGMENTS: usize = 64;

/// Sample a parabolic arc between two already-known arc points.
///
/// Returns the geometry samples from `v0` to `v1` and the island width at
/// each sample. Falls back to the straight chord when the focus lies on the
/// directrix carrier line.
pub fn discretize(
    focus: Point,
    directrix: Line,
    v0: Point,
    v1: Point,
) -> (Vec<Point>, Vec<CoordF>) {
    let origin = directrix.a.to_f64();
    let dir = directrix.direction_f().normalize();
    if dir.norm() == 0.0 {
        return chord_fallback(focus, v0, v1);
    }
    let mut normal = dir.perp();
    let f = focus.to_f64() - origin;
    let mut vf = f.dot(&normal);
    if vf < 0.0 {
        normal = normal * -1.0;
        vf = -vf;
    }
    if vf < 1.0 {
        // focus on the carrier line, arc degenerates
        return chord_fallback(focus, v0, v1);
    }
    let uf = f.dot(&dir);

    let to_frame = |p: Point| -> CoordF { (p.to_f64() - origin).dot(&dir) };
    let u0 = to_frame(v0);
    let u1 = to_frame(v1);

    // parabola in directrix frame: v(u) = ((u - uf)^2 + vf^2) / (2 vf)
    let eval = |u: CoordF| -> (PointF, CoordF) {
        let du = u - uf;
        let v = (du * du + vf * vf) / (2.0 * vf);
        (origin + dir * u + normal * v, 2.0 * v)
    };

    // chord sagitta of a parabola with curvature 1/vf is du^2 / (8 vf)
    let span = (u1 - u0).abs();
    let step = (8.0 * DISCRETIZATION_TOLERANCE * vf).sqrt();
    let count = ((span / step).ceil() as usize).clamp(1, MAX_SEGMENTS);

    let mut us: Vec<CoordF> = (0..=count)
        .map(|i| u0 + (u1 - u0) * (i as CoordF / count as CoordF))
        .collect();
    // keep the apex exact when it lies on the arc
    if (uf - u0.min(u1)) > f64::EPSILON && (u0.max(u1) - uf) > f64::EPSILON {
        us.push(uf);
        if u0 < u1 {
            us.sort_by(|a, b| a.partial_cmp(b).unwrap());
        } else {
            us.sort_by(|a, b| b.partial_cmp(a).unwrap());
        }
    }

    let mut points = Vec::with_capacity(us.len());
    let mut widths = Vec::with_capacity(us.len());
    for (i, &u) in us.iter().enumerate() {
        let (p, w) = eval(u);
        // endpoints come from the diagram, keep them bit-exact
        let point = if i == 0 {
            v0
        } else if i == us.len() - 1 {
            v1
        } else {
            p.to_scaled()
        };
        if points.last() == Some(&point) {
            continue;
        }
        points.push(point);
        widths.push(w);
    }
    if points.len() < 2 {
        return chord_fallback(focus, v0, v1);
    }
    (points, widths)
}

fn chord_fallback(focus: Point, v0: Point, v1: Point) -> (Vec<Point>, Vec<CoordF>) {
    let w0 = 2.0 * v0.distance(&focus);
    let w1 = 2.0 * v1.distance(&focus);
    (vec![v0, v1], vec![w0, w1])
}

/// Width of the island at a skeleton point given its two source features.
///
/// The distance to a segment site is clamped to the segment, which also
/// covers point sites reported as a segment endpoint.
pub fn width_at(point: Point, line_a: &Line, line_b: &Line) -> CoordF {
    let d = line_a
        .distance_to_point(&point)
        .min(line_b.distance_to_point(&point));
    2.0 * d
}

/// Widths below this many units collapse to zero (contour contact).
pub const WIDTH_ZERO_TOLERANCE: Coord = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apex_is_sampled() {
        // focus above the x axis, arc symmetric around the apex
        let focus = Point::new(0, 2_000_000);
        let directrix = Line::new(Point::new(-10_000_000, 0), Point::new(10_000_000, 0));
        // arc points equidistant from focus and directrix
        let v0 = Point::new(-4_000_000, 5_000_000);
        let v1 = Point::new(4_000_000, 5_000_000);
        let (points, widths) = discretize(focus, directrix, v0, v1);
        assert!(points.len() > 2);
        // apex width = distance focus-directrix = 2 mm
        let min = widths.iter().cloned().fold(f64::MAX, f64::min);
        assert!((min - 2_000_000.0).abs() < 1.0);
        assert_eq!(points.first(), Some(&v0));
        assert_eq!(points.last(), Some(&v1));
    }

    #[test]
    fn test_width_at_clamps_to_segment() {
        let a = Line::new(Point::new(0, 0), Point::new(1_000_000, 0));
        let b = Line::new(Point::new(0, 2_000_000), Point::new(1_000_000, 2_000_000));
        let w = width_at(Point::new(500_000, 1_000_000), &a, &b);
        assert!((w - 2_000_000.0).abs() < 1.0);
        // beyond the segment end the distance grows diagonally
        let w = width_at(Point::new(2_000_000, 1_000_000), &a, &b);
        assert!(w > 2_000_000.0);
    }
}
