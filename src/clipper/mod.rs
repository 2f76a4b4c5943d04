//! Polygon boolean and offset operations.
//!
//! This module provides polygon boolean operations (union, intersection,
//! difference) and offset operations using the geo-clipper library.
//!
//! These operations are essential for:
//! - Insetting thick-part fields before sampling
//! - Clipping alignment cells against the island
//! - Layer-to-layer overlap tests and peninsula detection

use crate::geometry::{ExPolygon, ExPolygons, Point, Polygon};
use crate::{unscale, CoordF};
use geo::{Coord as GeoCoord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, EndType, JoinType};

/// Join type for offset corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetJoinType {
    /// Square corners
    Square,
    /// Round corners
    #[default]
    Round,
    /// Mitered corners
    Miter,
}

impl From<OffsetJoinType> for JoinType {
    fn from(jt: OffsetJoinType) -> Self {
        match jt {
            OffsetJoinType::Square => JoinType::Square,
            OffsetJoinType::Round => JoinType::Round(0.25),
            OffsetJoinType::Miter => JoinType::Miter(2.0),
        }
    }
}

/// Precision factor handed to clipper; coordinates are converted to mm first,
/// so this factor restores the full scaled-integer resolution inside clipper.
const CLIPPER_FACTOR: CoordF = crate::SCALING_FACTOR;

fn ring_to_geo(points: &[Point]) -> LineString<f64> {
    let mut ring: Vec<GeoCoord<f64>> = points
        .iter()
        .map(|p| GeoCoord {
            x: unscale(p.x),
            y: unscale(p.y),
        })
        .collect();
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            ring.push(*first);
        }
    }
    LineString::new(ring)
}

fn expolygon_to_geo(expoly: &ExPolygon) -> GeoPolygon<f64> {
    let exterior = ring_to_geo(expoly.contour.points());
    let holes = expoly
        .holes
        .iter()
        .map(|hole| ring_to_geo(hole.points()))
        .collect();
    GeoPolygon::new(exterior, holes)
}

fn geo_ring_to_polygon(ring: &LineString<f64>) -> Polygon {
    Polygon::from_points(
        ring.coords()
            .map(|c| Point::new(crate::scale(c.x), crate::scale(c.y)))
            .collect(),
    )
}

fn geo_to_expolygon(geo_poly: &GeoPolygon<f64>) -> ExPolygon {
    let contour = geo_ring_to_polygon(geo_poly.exterior());
    let holes = geo_poly.interiors().iter().map(geo_ring_to_polygon).collect();
    ExPolygon::with_holes(contour, holes)
}

fn geo_multi_to_expolygons(multi: &MultiPolygon<f64>) -> ExPolygons {
    multi
        .0
        .iter()
        .map(geo_to_expolygon)
        .filter(|ex| ex.contour.len() >= 3)
        .collect()
}

fn expolygons_to_geo_multi(expolys: &[ExPolygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(expolys.iter().map(expolygon_to_geo).collect())
}

// ============================================================================
// Boolean Operations
// ============================================================================

/// Compute the union of two sets of polygons.
pub fn union(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return clip.to_vec();
    }
    if clip.is_empty() {
        return subject.to_vec();
    }
    let result =
        expolygons_to_geo_multi(subject).union(&expolygons_to_geo_multi(clip), CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Compute the union of a single set of potentially overlapping polygons.
pub fn union_ex(polygons: &[ExPolygon]) -> ExPolygons {
    match polygons.len() {
        0 => vec![],
        1 => polygons.to_vec(),
        _ => {
            let mut result = vec![polygons[0].clone()];
            for poly in polygons.iter().skip(1) {
                result = union(&result, std::slice::from_ref(poly));
            }
            result
        }
    }
}

/// Compute the intersection of two sets of polygons.
pub fn intersection_ex(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() || clip.is_empty() {
        return vec![];
    }
    let result = expolygons_to_geo_multi(subject)
        .intersection(&expolygons_to_geo_multi(clip), CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Compute the difference of two sets of polygons (subject - clip).
pub fn diff_ex(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return vec![];
    }
    if clip.is_empty() {
        return subject.to_vec();
    }
    let result =
        expolygons_to_geo_multi(subject).difference(&expolygons_to_geo_multi(clip), CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Check if two sets of polygons overlap.
pub fn polygons_overlap(a: &[ExPolygon], b: &[ExPolygon]) -> bool {
    !intersection_ex(a, b).is_empty()
}

// ============================================================================
// Offset Operations
// ============================================================================

/// Offset an ExPolygon by a given scaled distance.
///
/// Positive delta inflates (grows), negative delta deflates (shrinks).
pub fn offset_expolygon(
    expolygon: &ExPolygon,
    delta: crate::Coord,
    join_type: OffsetJoinType,
) -> ExPolygons {
    offset_expolygons(std::slice::from_ref(expolygon), delta, join_type)
}

/// Offset multiple ExPolygons by a given scaled distance.
pub fn offset_expolygons(
    expolygons: &[ExPolygon],
    delta: crate::Coord,
    join_type: OffsetJoinType,
) -> ExPolygons {
    if expolygons.is_empty() {
        return vec![];
    }
    let jt: JoinType = join_type.into();
    let result = expolygons_to_geo_multi(expolygons).offset(
        unscale(delta),
        jt,
        EndType::ClosedPolygon,
        CLIPPER_FACTOR,
    );
    geo_multi_to_expolygons(&result)
}

/// Grow polygons outward by a scaled distance with square joins.
pub fn expand(expolygons: &[ExPolygon], delta: crate::Coord) -> ExPolygons {
    offset_expolygons(expolygons, delta.abs(), OffsetJoinType::Square)
}

/// Shrink polygons inward by a scaled distance with square joins.
pub fn shrink(expolygons: &[ExPolygon], delta: crate::Coord) -> ExPolygons {
    offset_expolygons(expolygons, -delta.abs(), OffsetJoinType::Square)
}
