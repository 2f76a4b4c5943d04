//! Sampling of thin island parts along the skeleton.
//!
//! The walk starts at the part center and spreads outward with a running
//! distance-until-next-sample counter; branches inherit the counter so the
//! spacing stays uniform across junctions.

use std::rc::Rc;

use super::point::{PointType, SupportIslandPoint};
use super::parts::ThinPart;
use super::SampleConfig;
use crate::voronoi::{EdgeId, Position, VoronoiGraph};
use crate::CoordF;

#[derive(Debug, Clone, Copy)]
struct SupportIn {
    /// Distance until the next sample.
    support_in: CoordF,
    /// Edge to continue on, not sampled yet.
    edge: Option<EdgeId>,
}

/// Place support points along the skeleton of a thin part.
pub fn sample_thin_part(
    graph: &VoronoiGraph,
    part: &ThinPart,
    config: &SampleConfig,
    results: &mut Vec<SupportIslandPoint>,
) {
    let support_distance = config.thin_max_distance as CoordF;
    let half_support_distance = support_distance / 2.0;

    let mut emit = |position: Position, point_type: PointType, results: &mut Vec<_>| {
        let point = graph.position_point(position);
        let skeleton = Rc::new(graph.edges[position.edge].points.clone());
        results.push(SupportIslandPoint::center_of_skeleton(
            point, point_type, skeleton,
        ));
    };

    // walk both directions from the part center
    let mut curr = SupportIn {
        support_in: half_support_distance + graph.position_distance(part.center),
        edge: Some(part.center.edge),
    };
    let twin_start = graph.twin(part.center.edge);
    let twin_support_in = graph.edges[twin_start].length - curr.support_in + support_distance;
    let mut process = vec![SupportIn {
        support_in: twin_support_in,
        edge: Some(twin_start),
    }];
    let mut is_first_edge = true;

    while curr.edge.is_some() || !process.is_empty() {
        let edge = match curr.edge {
            Some(edge) => edge,
            None => {
                curr = process.pop().expect("queue is non-empty");
                match curr.edge {
                    Some(edge) => edge,
                    None => continue,
                }
            }
        };

        let part_end = part
            .ends
            .binary_search_by(|end| end.edge.cmp(&edge))
            .ok()
            .map(|i| part.ends[i]);

        // sample along the current edge
        let edge_length = match part_end {
            Some(end) => graph.position_distance(end),
            None => graph.edges[edge].length,
        };
        while edge_length >= curr.support_in {
            let ratio = curr.support_in / graph.edges[edge].length;
            emit(
                Position::new(edge, ratio.clamp(0.0, 1.0)),
                PointType::ThinPartChange,
                results,
            );
            curr.support_in += support_distance;
        }
        curr.support_in -= edge_length;

        if let Some(end) = part_end {
            // transition into the neighboring thick part
            if curr.support_in < half_support_distance {
                emit(end, PointType::ThinPart, results);
            }
            curr.edge = None;
            continue;
        }

        // detect a loop within the part
        let twin = graph.twin(edge);
        if !is_first_edge {
            if let Some(queued) = process.iter().position(|p| p.edge == Some(twin)) {
                if curr.support_in < half_support_distance {
                    // close an undersampled gap; alignment fine-tunes it
                    emit(Position::new(edge, 1.0), PointType::ThinPartLoop, results);
                }
                process.remove(queued);
                curr.edge = None;
                continue;
            }
        } else {
            is_first_edge = false;
        }

        // continue into the first child, queue the rest with the counter copied
        let mut next: Option<EdgeId> = None;
        for &child in &graph.nodes[graph.edges[edge].node].edges {
            if child == twin {
                continue;
            }
            if next.is_none() {
                next = Some(child);
                continue;
            }
            process.push(SupportIn {
                support_in: curr.support_in,
                edge: Some(child),
            });
        }
        curr.edge = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ExPolygon, Point, Polygon};
    use crate::island::parts::separate_thin_thick;
    use crate::scale;
    use crate::voronoi::{create_longest_path, create_skeleton};

    #[test]
    fn test_long_strip_sampled_uniformly() {
        let config = SampleConfig::from_head_diameter(0.4);
        let island = ExPolygon::new(Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(scale(30.0), 0),
            Point::new(scale(30.0), scale(0.5)),
            Point::new(0, scale(0.5)),
        ]));
        let lines = island.to_lines();
        let graph = create_skeleton(&island, &lines).unwrap();
        let start = graph.first_contour_node().unwrap();
        let path = create_longest_path(&graph, start);
        let (thin, thick) = separate_thin_thick(&graph, &path, &config);
        assert_eq!(thin.len(), 1);
        assert!(thick.is_empty());

        let mut points = Vec::new();
        sample_thin_part(&graph, &thin[0], &config, &mut points);
        // 30 mm strip at 4.8 mm spacing needs at least 6 samples
        assert!(points.len() >= 6, "got {} samples", points.len());
        // all samples stay inside the island and on the skeleton midline
        for p in &points {
            assert!(island.contains(&p.point));
            assert!((p.point.y - scale(0.25)).abs() < scale(0.05));
        }
        // spacing along x never exceeds the configured distance
        let mut xs: Vec<i64> = points.iter().map(|p| p.point.x).collect();
        xs.sort_unstable();
        for pair in xs.windows(2) {
            assert!(pair[1] - pair[0] <= config.thin_max_distance);
        }
    }
}
