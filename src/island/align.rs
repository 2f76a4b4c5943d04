//! Alignment of support points by centroidal relaxation.
//!
//! Each iteration moves every movable point toward the centroid of its
//! Voronoi cell clipped to the island. The cell is built directly: a disk of
//! the coverage radius around the point, cut by the perpendicular-bisector
//! half-plane against every nearby sample, then intersected with the island.

use crate::clipper;
use crate::geometry::{ExPolygon, Point, PointF, Polygon};
use crate::island::point::SupportIslandPoint;
use crate::island::SampleConfig;
use crate::{Coord, CoordF};

/// Vertices of the disk polygon approximating a cell's outer bound.
const CELL_DISK_SEGMENTS: usize = 24;

/// Iteratively spread the support points evenly over the island.
pub fn align_samples(
    samples: &mut [SupportIslandPoint],
    island: &ExPolygon,
    config: &SampleConfig,
) {
    if samples.len() <= 1 {
        return; // a single support has nothing to align against
    }
    if !samples.iter().any(|s| s.can_move()) {
        return;
    }

    for _ in 0..config.count_iteration {
        let max_move = align_once(samples, island, config);
        if max_move < config.minimal_move {
            break;
        }
    }
}

/// One relaxation step. Returns the largest displacement.
fn align_once(
    samples: &mut [SupportIslandPoint],
    island: &ExPolygon,
    config: &SampleConfig,
) -> Coord {
    let points: Vec<Point> = samples.iter().map(|s| s.point).collect();
    let radius = config.max_distance() as CoordF;

    let mut max_move = 0;
    for (index, sample) in samples.iter_mut().enumerate() {
        if !sample.can_move() {
            continue;
        }
        let cell = match point_cell(&points, index, radius) {
            Some(cell) => cell,
            None => continue,
        };

        // clip the cell to the island and keep the piece holding the point
        let pieces = clipper::intersection_ex(
            std::slice::from_ref(&cell),
            std::slice::from_ref(island),
        );
        let piece = match pieces.iter().find(|p| p.contains(&points[index])) {
            Some(piece) => piece,
            // a cell that lost its generating point is a geometric
            // degeneracy; skip the point for this iteration
            None => match pieces.first() {
                Some(piece) if pieces.len() == 1 => piece,
                _ => continue,
            },
        };

        let centroid = piece.contour.centroid();
        let moved = sample.move_towards(centroid);
        max_move = max_move.max(moved);
    }

    move_duplicate_positions(samples, &points);
    max_move
}

/// Voronoi cell of `points[index]` clipped to the coverage disk.
fn point_cell(points: &[Point], index: usize, radius: CoordF) -> Option<ExPolygon> {
    let center = points[index].to_f64();
    let mut cell: Vec<PointF> = (0..CELL_DISK_SEGMENTS)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * i as CoordF / CELL_DISK_SEGMENTS as CoordF;
            PointF::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect();

    let reach = 2.0 * radius;
    for (other_index, other) in points.iter().enumerate() {
        if other_index == index {
            continue;
        }
        let other = other.to_f64();
        if (other - center).norm() >= reach {
            continue; // bisector cannot cut the disk
        }
        let midpoint = (center + other) * 0.5;
        let normal = other - center;
        cell = clip_by_half_plane(cell, midpoint, normal);
        if cell.len() < 3 {
            return None;
        }
    }

    Some(ExPolygon::new(Polygon::from_points(
        cell.iter().map(PointF::to_scaled).collect(),
    )))
}

/// Keep the side of the polygon where `(x - origin) . normal <= 0`.
fn clip_by_half_plane(polygon: Vec<PointF>, origin: PointF, normal: PointF) -> Vec<PointF> {
    let side = |p: &PointF| (*p - origin).dot(&normal);
    let mut result = Vec::with_capacity(polygon.len() + 1);
    for (i, current) in polygon.iter().enumerate() {
        let next = &polygon[(i + 1) % polygon.len()];
        let side_current = side(current);
        let side_next = side(next);
        if side_current <= 0.0 {
            result.push(*current);
        }
        if (side_current < 0.0 && side_next > 0.0) || (side_current > 0.0 && side_next < 0.0) {
            let t = side_current / (side_current - side_next);
            result.push(*current + (*next - *current) * t);
        }
    }
    result
}

/// Points that collapsed onto the same position get their last move halved
/// until the set is duplicate free again.
fn move_duplicate_positions(samples: &mut [SupportIslandPoint], previous: &[Point]) {
    fn sort_order(order: &mut [usize], positions: &[Point]) {
        order.sort_by(|a, b| positions[*a].cmp(&positions[*b]));
    }

    let mut positions: Vec<Point> = samples.iter().map(|s| s.point).collect();
    let mut order: Vec<usize> = (0..positions.len()).collect();
    sort_order(&mut order, &positions);

    loop {
        let duplicate = order
            .windows(2)
            .find(|pair| positions[pair[0]] == positions[pair[1]])
            .map(|pair| pair[1]);
        let Some(index) = duplicate else {
            return;
        };
        let halfway = Point::new(
            previous[index].x / 2 + positions[index].x / 2,
            previous[index].y / 2 + positions[index].y / 2,
        );
        let moved = samples[index].move_towards(halfway);
        positions[index] = samples[index].point;
        if moved == 0 {
            return; // frozen or fully constrained, nothing more to split
        }
        sort_order(&mut order, &positions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::island::point::PointType;
    use crate::scale;
    use std::rc::Rc;

    fn square(size: f64) -> ExPolygon {
        ExPolygon::new(Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(scale(size), 0),
            Point::new(scale(size), scale(size)),
            Point::new(0, scale(size)),
        ]))
    }

    #[test]
    fn test_inner_points_spread_out() {
        let island = square(10.0);
        let inset = Rc::new(island.clone());
        // two clustered points plus one far away
        let mut samples = vec![
            SupportIslandPoint::inner(Point::new_scale(4.0, 5.0), Rc::clone(&inset)),
            SupportIslandPoint::inner(Point::new_scale(4.4, 5.0), Rc::clone(&inset)),
            SupportIslandPoint::inner(Point::new_scale(8.0, 5.0), Rc::clone(&inset)),
        ];
        let config = SampleConfig::from_head_diameter(0.4);
        align_samples(&mut samples, &island, &config);

        let d01 = samples[0].point.distance(&samples[1].point);
        assert!(
            d01 > scale(1.0) as f64,
            "clustered points did not separate: {d01}"
        );
        for s in &samples {
            assert!(island.contains(&s.point));
        }
        // no duplicates survive alignment
        for i in 0..samples.len() {
            for j in (i + 1)..samples.len() {
                assert_ne!(samples[i].point, samples[j].point);
            }
        }
    }

    #[test]
    fn test_frozen_points_do_not_move() {
        let island = square(10.0);
        let frozen = Point::new_scale(2.0, 2.0);
        let mut samples = vec![
            SupportIslandPoint::no_move(frozen, PointType::OneCenterPoint),
            SupportIslandPoint::inner(Point::new_scale(2.2, 2.0), Rc::new(island.clone())),
        ];
        let config = SampleConfig::from_head_diameter(0.4);
        align_samples(&mut samples, &island, &config);
        assert_eq!(samples[0].point, frozen);
        assert_ne!(samples[1].point, frozen);
    }

    #[test]
    fn test_single_point_returns_immediately() {
        let island = square(5.0);
        let mut samples = vec![SupportIslandPoint::inner(
            Point::new_scale(1.0, 1.0),
            Rc::new(island.clone()),
        )];
        let config = SampleConfig::from_head_diameter(0.4);
        align_samples(&mut samples, &island, &config);
        assert_eq!(samples[0].point, Point::new_scale(1.0, 1.0));
    }
}
