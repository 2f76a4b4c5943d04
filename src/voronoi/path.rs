//! Path search on the skeleton graph.
//!
//! The longest-path walk drives the one-point / two-point island rules and
//! seeds part separation. The walk is deterministic for a given start node:
//! children are explored in arena order and ties keep the first candidate.

use super::graph::{EdgeId, NodeId, Position, VoronoiGraph};
use crate::{Coord, CoordF};

/// A walk through the skeleton with its length and the total length of the
/// side branches that were explored but not chosen.
#[derive(Debug, Clone, Default)]
pub struct ExPath {
    pub nodes: Vec<NodeId>,
    pub length: CoordF,
    pub side_branches_length: CoordF,
}

/// Edge connecting two neighboring path nodes, if any.
pub fn get_neighbor_edge(graph: &VoronoiGraph, from: NodeId, to: NodeId) -> Option<EdgeId> {
    graph.nodes[from]
        .edges
        .iter()
        .copied()
        .find(|&e| graph.edges[e].node == to)
}

/// Find the longest walk starting at `start` that never traverses an edge or
/// its twin twice.
///
/// Linear in graph size. Exact on acyclic skeletons; on skeletons with loops
/// (islands with holes) each loop is entered from one side only, which keeps
/// the walk deterministic.
pub fn create_longest_path(graph: &VoronoiGraph, start: NodeId) -> ExPath {
    struct Frame {
        node: NodeId,
        child_index: usize,
        best_len: CoordF,
        best_path: Vec<NodeId>,
        subtree_len: CoordF,
    }

    let mut visited = vec![false; graph.edges.len()];
    let mut stack = vec![Frame {
        node: start,
        child_index: 0,
        best_len: 0.0,
        best_path: Vec::new(),
        subtree_len: 0.0,
    }];
    // completed child result waiting to be folded into its parent
    let mut returned: Option<(CoordF, Vec<NodeId>, CoordF, EdgeId)> = None;
    let mut result = ExPath::default();

    while let Some(frame) = stack.last_mut() {
        if let Some((child_len, child_path, child_subtree, via_edge)) = returned.take() {
            let edge_len = graph.edges[via_edge].length;
            let candidate = edge_len + child_len;
            frame.subtree_len += edge_len + child_subtree;
            if candidate > frame.best_len {
                frame.best_len = candidate;
                frame.best_path = child_path;
            }
        }

        let node = frame.node;
        let mut descended = false;
        while frame.child_index < graph.nodes[node].edges.len() {
            let edge = graph.nodes[node].edges[frame.child_index];
            frame.child_index += 1;
            let pair = edge.min(graph.edges[edge].twin);
            if visited[pair] {
                continue;
            }
            visited[pair] = true;
            stack.push(Frame {
                node: graph.edges[edge].node,
                child_index: 0,
                best_len: 0.0,
                best_path: Vec::new(),
                subtree_len: 0.0,
            });
            descended = true;
            break;
        }
        if descended {
            continue;
        }

        // frame finished, fold into parent
        let frame = stack.pop().expect("frame present");
        let mut path = Vec::with_capacity(frame.best_path.len() + 1);
        path.push(frame.node);
        path.extend(frame.best_path);
        if let Some(parent) = stack.last() {
            let via_edge = get_neighbor_edge(graph, parent.node, frame.node)
                .expect("child reached through an edge");
            returned = Some((frame.best_len, path, frame.subtree_len, via_edge));
        } else {
            result = ExPath {
                nodes: path,
                length: frame.best_len,
                side_branches_length: frame.subtree_len - frame.best_len,
            };
        }
    }
    result
}

/// Position on the path at a given arc distance from its front.
pub fn create_position_on_path(
    graph: &VoronoiGraph,
    nodes: &[NodeId],
    distance: CoordF,
) -> Option<Position> {
    let mut walked = 0.0;
    for pair in nodes.windows(2) {
        let edge = get_neighbor_edge(graph, pair[0], pair[1])?;
        let length = graph.edges[edge].length;
        walked += length;
        if walked >= distance {
            let behind = walked - distance;
            let ratio = 1.0 - behind / length;
            return Some(Position::new(edge, ratio.clamp(0.0, 1.0)));
        }
    }
    None
}

/// First position along the path where the island width reaches `width`, or
/// the position at `max_distance` from the front, whichever comes first.
///
/// `max_distance` is updated to the distance of the returned position.
pub fn create_position_on_path_with_width(
    graph: &VoronoiGraph,
    nodes: &[NodeId],
    width: Coord,
    max_distance: &mut CoordF,
) -> Option<Position> {
    let mut walked = 0.0;
    for pair in nodes.windows(2) {
        let edge = get_neighbor_edge(graph, pair[0], pair[1])?;
        let length = graph.edges[edge].length;

        if width <= graph.edges[edge].max_width {
            let position = graph.position_with_width(edge, width);
            let distance = walked + graph.position_distance(position);
            if *max_distance > distance {
                *max_distance = distance;
                return Some(position);
            }
        }

        walked += length;
        if walked >= *max_distance {
            let behind = walked - *max_distance;
            let ratio = 1.0 - behind / length;
            return Some(Position::new(edge, ratio.clamp(0.0, 1.0)));
        }
    }
    None
}

/// Maximal island width along the path.
pub fn get_max_width(graph: &VoronoiGraph, nodes: &[NodeId]) -> Coord {
    nodes
        .windows(2)
        .filter_map(|pair| get_neighbor_edge(graph, pair[0], pair[1]))
        .map(|e| graph.edges[e].max_width)
        .max()
        .unwrap_or(0)
}

/// Whether every walk forward from `position` reaches a dead end within
/// `distance`. A loop counts as not ending.
pub fn ends_in_distance(graph: &VoronoiGraph, position: Position, distance: CoordF) -> bool {
    let edge = position.edge;
    let remaining = distance - (graph.edges[edge].length - graph.position_distance(position));
    if remaining < 0.0 {
        return false;
    }
    let mut visited = vec![false; graph.edges.len()];
    visited[edge.min(graph.edges[edge].twin)] = true;
    let mut stack = vec![(graph.edges[edge].node, graph.edges[edge].twin, remaining)];
    while let Some((node, banned, budget)) = stack.pop() {
        for &e in &graph.nodes[node].edges {
            if e == banned {
                continue;
            }
            let pair = e.min(graph.edges[e].twin);
            if visited[pair] {
                return false; // loop back
            }
            visited[pair] = true;
            let rest = budget - graph.edges[e].length;
            if rest < 0.0 {
                return false;
            }
            stack.push((graph.edges[e].node, graph.edges[e].twin, rest));
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ExPolygon, Point, Polygon};
    use crate::scale;
    use crate::voronoi::builder::create_skeleton;

    fn rect_graph(w: f64, h: f64) -> (VoronoiGraph, NodeId) {
        let island = ExPolygon::new(Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(scale(w), 0),
            Point::new(scale(w), scale(h)),
            Point::new(0, scale(h)),
        ]));
        let lines = island.to_lines();
        let graph = create_skeleton(&island, &lines).unwrap();
        let start = graph.first_contour_node().unwrap();
        (graph, start)
    }

    #[test]
    fn test_longest_path_spans_rect() {
        let (graph, start) = rect_graph(10.0, 1.0);
        let path = create_longest_path(&graph, start);
        // spine of 9 mm plus two 45 degree corner fans of 0.5 * sqrt(2)
        assert!(path.length > scale(10.2) as f64);
        assert!(path.length < scale(10.7) as f64);
        assert!(path.nodes.len() >= 2);
        assert_eq!(path.nodes[0], start);
    }

    #[test]
    fn test_longest_path_deterministic() {
        let (graph, start) = rect_graph(10.0, 1.0);
        let a = create_longest_path(&graph, start);
        let b = create_longest_path(&graph, start);
        assert_eq!(a.nodes, b.nodes);
        assert_eq!(a.length, b.length);
    }

    #[test]
    fn test_position_on_path() {
        let (graph, start) = rect_graph(10.0, 1.0);
        let path = create_longest_path(&graph, start);
        let half = create_position_on_path(&graph, &path.nodes, path.length / 2.0).unwrap();
        let p = graph.position_point(half);
        // middle of the spine is near the rectangle center
        assert!((p.x - scale(5.0)).abs() < scale(0.6));
        assert!((p.y - scale(0.5)).abs() < scale(0.1));
        assert!(create_position_on_path(&graph, &path.nodes, path.length * 2.0).is_none());
    }

    #[test]
    fn test_max_width() {
        let (graph, start) = rect_graph(10.0, 1.0);
        let path = create_longest_path(&graph, start);
        let max = get_max_width(&graph, &path.nodes);
        assert!((max - scale(1.0)).abs() < scale(0.05));
    }
}
