//! Support points generated on an island, with their movement policies.
//!
//! Alignment wants to nudge points toward cell centroids, but each sampler
//! constrains where its points may go: skeleton samples stay on their
//! skeleton segment, outline samples slide along their outline run, inner
//! samples roam the inset polygon and the small-island points are frozen.

use std::rc::Rc;

use crate::geometry::{ExPolygon, Line, Point};
use crate::{Coord, CoordF};

/// Classification of a generated support point by its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointType {
    ThinPart,
    ThinPartChange,
    ThinPartLoop,
    ThickPartOutline,
    ThickPartInner,
    OneBbCenterPoint,
    OneCenterPoint,
    TwoPoints,
    TwoPointsBackup,
}

/// Contiguous run of inset outline lines an outline sample may slide along.
#[derive(Debug)]
pub struct OutlineRestriction {
    pub lines: Vec<Line>,
    lengths: Vec<CoordF>,
    total_length: CoordF,
    /// Wrap-around run (border without any thin-part chord).
    pub circular: bool,
    /// Maximal slide from the birth position along the run.
    pub max_align_distance: Coord,
}

impl OutlineRestriction {
    pub fn new(lines: Vec<Line>, circular: bool, max_align_distance: Coord) -> Self {
        let lengths: Vec<CoordF> = lines.iter().map(Line::length).collect();
        let total_length = lengths.iter().sum();
        Self {
            lines,
            lengths,
            total_length,
            circular,
            max_align_distance,
        }
    }

    pub fn total_length(&self) -> CoordF {
        self.total_length
    }

    pub fn length(&self, index: usize) -> CoordF {
        self.lengths[index]
    }

    /// Arc-length coordinate of `(index, ratio)` from the run start.
    pub fn arc_of(&self, index: usize, ratio: CoordF) -> CoordF {
        self.lengths[..index].iter().sum::<CoordF>() + ratio * self.lengths[index]
    }

    /// Point at an arc-length coordinate; wraps on circular runs, clamps on
    /// open ones.
    pub fn point_at_arc(&self, arc: CoordF) -> Point {
        let mut s = if self.circular {
            arc.rem_euclid(self.total_length.max(f64::EPSILON))
        } else {
            arc.clamp(0.0, self.total_length)
        };
        for (line, &len) in self.lines.iter().zip(&self.lengths) {
            if s <= len || len == self.total_length {
                let t = if len > 0.0 { (s / len).clamp(0.0, 1.0) } else { 0.0 };
                return crate::geometry::lerp(line.a, line.b, t);
            }
            s -= len;
        }
        self.lines.last().map(|l| l.b).unwrap_or(Point::zero())
    }

    /// Arc-length coordinate of the run point closest to `target`.
    fn closest_arc(&self, target: &Point) -> CoordF {
        let mut best_arc = 0.0;
        let mut best_dist = i128::MAX;
        let mut walked = 0.0;
        for (line, &len) in self.lines.iter().zip(&self.lengths) {
            let proj = line.project_point(target);
            let dist = proj.distance_squared(target);
            if dist < best_dist {
                best_dist = dist;
                let t = if len > 0.0 {
                    line.a.distance(&proj) / len
                } else {
                    0.0
                };
                best_arc = walked + t.clamp(0.0, 1.0) * len;
            }
            walked += len;
        }
        best_arc
    }
}

/// Movement policy of a support point during alignment.
enum Movement {
    /// Frozen; all small-island points.
    NoMove,
    /// Stays on the skeleton polyline it was born from.
    CenterOfSkeleton { skeleton: Rc<Vec<Point>> },
    /// Slides along an inset outline run, at most `max_align_distance` from
    /// its birth arc position.
    OutlineSequence {
        restriction: Rc<OutlineRestriction>,
        birth_arc: CoordF,
    },
    /// Roams anywhere inside the shared inset polygon.
    Inner { inset: Rc<ExPolygon> },
}

/// A generated support point with its type tag and movement policy.
pub struct SupportIslandPoint {
    pub point: Point,
    pub point_type: PointType,
    movement: Movement,
}

impl SupportIslandPoint {
    /// Create a frozen point.
    pub fn no_move(point: Point, point_type: PointType) -> Self {
        Self {
            point,
            point_type,
            movement: Movement::NoMove,
        }
    }

    /// Create a point movable along its skeleton edge geometry.
    pub fn center_of_skeleton(
        point: Point,
        point_type: PointType,
        skeleton: Rc<Vec<Point>>,
    ) -> Self {
        Self {
            point,
            point_type,
            movement: Movement::CenterOfSkeleton { skeleton },
        }
    }

    /// Create a point movable along an outline run.
    pub fn outline_sequence(
        restriction: Rc<OutlineRestriction>,
        index: usize,
        ratio: CoordF,
    ) -> Self {
        let birth_arc = restriction.arc_of(index, ratio);
        let point = restriction.point_at_arc(birth_arc);
        Self {
            point,
            point_type: PointType::ThickPartOutline,
            movement: Movement::OutlineSequence {
                restriction,
                birth_arc,
            },
        }
    }

    /// Create a point movable inside the shared inset polygon.
    pub fn inner(point: Point, inset: Rc<ExPolygon>) -> Self {
        Self {
            point,
            point_type: PointType::ThickPartInner,
            movement: Movement::Inner { inset },
        }
    }

    /// Whether alignment may move this point at all.
    pub fn can_move(&self) -> bool {
        !matches!(self.movement, Movement::NoMove)
    }

    /// Move toward `target`, clamped to the point's allowed locus.
    /// Returns the distance actually moved.
    pub fn move_towards(&mut self, target: Point) -> Coord {
        let new_point = match &self.movement {
            Movement::NoMove => return 0,
            Movement::CenterOfSkeleton { skeleton } => {
                closest_on_polyline(skeleton, &target)
            }
            Movement::OutlineSequence {
                restriction,
                birth_arc,
            } => {
                let mut delta = restriction.closest_arc(&target) - birth_arc;
                if restriction.circular {
                    let total = restriction.total_length();
                    if delta > total / 2.0 {
                        delta -= total;
                    } else if delta < -total / 2.0 {
                        delta += total;
                    }
                }
                let cap = restriction.max_align_distance as CoordF;
                restriction.point_at_arc(birth_arc + delta.clamp(-cap, cap))
            }
            Movement::Inner { inset } => {
                if inset.contains(&target) {
                    target
                } else {
                    clamp_to_border(inset, self.point, target)
                }
            }
        };
        let moved = self.point.distance(&new_point).round() as Coord;
        self.point = new_point;
        moved
    }
}

impl std::fmt::Debug for SupportIslandPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}@{:?}", self.point_type, self.point)
    }
}

fn closest_on_polyline(polyline: &[Point], target: &Point) -> Point {
    let mut best = polyline[0];
    let mut best_dist = i128::MAX;
    for pair in polyline.windows(2) {
        let proj = target.project_onto_segment(pair[0], pair[1]);
        let dist = proj.distance_squared(target);
        if dist < best_dist {
            best_dist = dist;
            best = proj;
        }
    }
    best
}

/// Walk from `from` toward `target`, stopping at the first border crossing.
fn clamp_to_border(inset: &ExPolygon, from: Point, target: Point) -> Point {
    let walk = Line::new(from, target);
    let mut best = from;
    let mut best_dist = i128::MAX;
    for border_line in inset.to_lines() {
        if let Some(crossing) = walk.intersection(&border_line) {
            let dist = crossing.distance_squared(&from);
            if dist < best_dist {
                best_dist = dist;
                best = crossing;
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;

    #[test]
    fn test_no_move_is_frozen() {
        let mut p = SupportIslandPoint::no_move(Point::new(5, 5), PointType::OneCenterPoint);
        assert!(!p.can_move());
        assert_eq!(p.move_towards(Point::new(100, 100)), 0);
        assert_eq!(p.point, Point::new(5, 5));
    }

    #[test]
    fn test_center_of_skeleton_stays_on_segment() {
        let skeleton = Rc::new(vec![Point::new(0, 0), Point::new(1000, 0)]);
        let mut p = SupportIslandPoint::center_of_skeleton(
            Point::new(500, 0),
            PointType::ThinPartChange,
            skeleton,
        );
        p.move_towards(Point::new(700, 400));
        assert_eq!(p.point, Point::new(700, 0));
        p.move_towards(Point::new(2000, 0));
        assert_eq!(p.point, Point::new(1000, 0));
    }

    #[test]
    fn test_outline_sequence_clamps_slide() {
        let restriction = Rc::new(OutlineRestriction::new(
            vec![Line::new(Point::new(0, 0), Point::new(10_000, 0))],
            false,
            1_000,
        ));
        let mut p = SupportIslandPoint::outline_sequence(restriction, 0, 0.5);
        assert_eq!(p.point, Point::new(5_000, 0));
        p.move_towards(Point::new(9_000, 100));
        // capped at max_align_distance from the birth arc
        assert_eq!(p.point, Point::new(6_000, 0));
    }

    #[test]
    fn test_inner_clamps_to_polygon() {
        let inset = Rc::new(ExPolygon::new(Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(1000, 0),
            Point::new(1000, 1000),
            Point::new(0, 1000),
        ])));
        let mut p = SupportIslandPoint::inner(Point::new(500, 500), inset);
        p.move_towards(Point::new(600, 600));
        assert_eq!(p.point, Point::new(600, 600));
        p.move_towards(Point::new(5000, 600));
        assert_eq!(p.point, Point::new(1000, 600));
    }
}
