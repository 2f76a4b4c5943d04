//! Island sampling orchestration.
//!
//! The cascade tries the cheapest covering rule first: a micro island gets
//! one frozen point at its extent center, a short island one point at the
//! skeleton middle, an elongated thin island two points near its tips.
//! Everything else runs the full pipeline: part separation, thin and thick
//! sampling, then alignment.

use crate::geometry::{BoundingBox, ExPolygon, Point};
use crate::island::align::align_samples;
use crate::island::field::{create_peninsula_field, create_thick_field};
use crate::island::parts::separate_thin_thick;
use crate::island::point::{PointType, SupportIslandPoint};
use crate::island::thick::sample_field;
use crate::island::thin::sample_thin_part;
use crate::island::SampleConfig;
use crate::voronoi::{
    create_longest_path, create_position_on_path, create_position_on_path_with_width,
    create_skeleton, get_max_width, ExPath, VoronoiGraph,
};
use crate::{CoordF, Result};

/// A cantilevered sub-region of a layer part reaching beyond what the layer
/// below can hold.
#[derive(Debug, Clone)]
pub struct Peninsula {
    /// The overhanging area to support.
    pub unsupported_area: ExPolygon,
    /// Flag per border line: true on real overhanging edges, false on edges
    /// shared with the supported mainland.
    pub is_outline: Vec<bool>,
}

/// Compute a minimal covering set of support points for one island.
///
/// Degenerate islands produce an empty set; an invalid configuration is a
/// caller error.
pub fn uniform_support_island(
    island: &ExPolygon,
    config: &SampleConfig,
) -> Result<Vec<SupportIslandPoint>> {
    config.validate()?;
    if island.contour.len() < 3 {
        return Ok(Vec::new());
    }

    let simplified = {
        let simplified = island.simplified(config.simplification_tolerance);
        if simplified.is_empty() {
            island.clone()
        } else {
            simplified
        }
    };

    // micro island: the whole extent fits under one head
    if let Some(center) = bb_center_within(&simplified, config.head_radius) {
        return Ok(vec![SupportIslandPoint::no_move(
            center,
            PointType::OneBbCenterPoint,
        )]);
    }

    let lines = simplified.to_lines();
    let graph = create_skeleton(&simplified, &lines)?;
    let Some(start_node) = graph.first_contour_node() else {
        return Ok(Vec::new()); // voronoi collapse
    };
    let longest_path = create_longest_path(&graph, start_node);
    if longest_path.nodes.len() < 2 {
        let center = graph.nodes[start_node].point;
        return Ok(vec![SupportIslandPoint::no_move(
            center,
            PointType::OneCenterPoint,
        )]);
    }

    // short island: one point at the skeleton middle
    if longest_path.length < config.max_length_for_one_support_point as CoordF {
        let position =
            create_position_on_path(&graph, &longest_path.nodes, longest_path.length / 2.0);
        return Ok(match position {
            Some(position) => vec![SupportIslandPoint::no_move(
                graph.position_point(position),
                PointType::OneCenterPoint,
            )],
            None => Vec::new(),
        });
    }

    // elongated thin island: two points stretch it even when the head does
    // not fit fully under the tips
    if get_max_width(&graph, &longest_path.nodes) < config.thin_max_width
        && longest_path.length < config.max_length_for_two_support_points as CoordF
    {
        return Ok(create_side_points(
            &graph,
            &longest_path,
            config,
            PointType::TwoPoints,
        ));
    }

    // general case: separate parts, sample each, align
    let mut supports = Vec::new();
    let (thin_parts, thick_parts) = separate_thin_thick(&graph, &longest_path, config);
    debug_assert!(!thin_parts.is_empty() || !thick_parts.is_empty());
    for part in &thin_parts {
        sample_thin_part(&graph, part, config, &mut supports);
    }
    for part in &thick_parts {
        if let Some(field) = create_thick_field(&graph, part, &simplified, &lines, config) {
            sample_field(&field, config, &mut supports);
        }
    }

    // the part heuristics may under-produce on borderline islands
    if supports.len() <= 2 {
        return Ok(create_side_points(
            &graph,
            &longest_path,
            config,
            PointType::TwoPointsBackup,
        ));
    }

    align_samples(&mut supports, island, config);
    Ok(supports)
}

/// Compute support points for a peninsula.
///
/// The field border is the peninsula itself; only its overhanging edges are
/// treated as outline, so samples never crowd the mainland boundary.
pub fn uniform_support_peninsula(
    peninsula: &Peninsula,
    config: &SampleConfig,
) -> Result<Vec<SupportIslandPoint>> {
    config.validate()?;
    let Some(field) = create_peninsula_field(
        peninsula.unsupported_area.clone(),
        peninsula.is_outline.clone(),
        config,
    ) else {
        return Ok(Vec::new()); // no room for the inset
    };
    let mut supports = Vec::new();
    sample_field(&field, config, &mut supports);
    align_samples(&mut supports, &peninsula.unsupported_area, config);
    Ok(supports)
}

/// Center of the contour extent when it fits a square of `2 * max_radius`.
fn bb_center_within(island: &ExPolygon, max_radius: crate::Coord) -> Option<Point> {
    let points = island.contour.points();
    if points.len() <= 2 {
        return None;
    }
    let bb = BoundingBox::from_points(points);
    let size = bb.size();
    if size.x <= max_radius && size.y <= max_radius {
        Some(bb.center())
    } else {
        None
    }
}

/// Two frozen points near the tips of the longest path, pulled inward to
/// where the island reaches the head diameter but never farther from the
/// tips than the configured cap.
fn create_side_points(
    graph: &VoronoiGraph,
    path: &ExPath,
    config: &SampleConfig,
    point_type: PointType,
) -> Vec<SupportIslandPoint> {
    let max_distance_by_length =
        path.length * config.max_length_ratio_for_two_support_points;
    let max_distance =
        (config.maximal_distance_from_outline as CoordF).min(max_distance_by_length);

    let mut reversed_nodes = path.nodes.clone();
    reversed_nodes.reverse();

    let width = 2 * config.head_radius;
    let mut side_distance1 = max_distance;
    let mut side_distance2 = max_distance;
    let pos1 =
        create_position_on_path_with_width(graph, &path.nodes, width, &mut side_distance1);
    let pos2 =
        create_position_on_path_with_width(graph, &reversed_nodes, width, &mut side_distance2);

    [pos1, pos2]
        .into_iter()
        .flatten()
        .map(|position| {
            SupportIslandPoint::no_move(graph.position_point(position), point_type)
        })
        .collect()
}

/// Project support points to plain 2D points.
pub fn to_points(supports: &[SupportIslandPoint]) -> Vec<Point> {
    supports.iter().map(|s| s.point).collect()
}
