//! Skeleton graph over the inside part of an island's Voronoi diagram.
//!
//! Nodes and edges live in arena vectors and refer to each other by index,
//! so the cyclic twin relation needs no reference counting. Every directed
//! edge has a twin with reversed orientation; `twin(twin(e)) == e`.

use crate::geometry::{Line, Point};
use crate::{Coord, CoordF};

/// Index of a node in [`VoronoiGraph::nodes`].
pub type NodeId = usize;
/// Index of an edge in [`VoronoiGraph::edges`].
pub type EdgeId = usize;

/// A Voronoi vertex with its outgoing edges.
#[derive(Debug, Clone)]
pub struct Node {
    /// Vertex position (scaled units).
    pub point: Point,
    /// Outgoing edges, in diagram order.
    pub edges: Vec<EdgeId>,
}

/// A directed skeleton edge.
///
/// The geometry is a polyline from the source node to the target node;
/// straight edges carry two samples, parabolic arcs are subdivided so the
/// island width is piecewise-linear along `points` within tolerance (the
/// arc apex is always a sample, so the width extrema are exact).
#[derive(Debug, Clone)]
pub struct Edge {
    /// Target node.
    pub node: NodeId,
    /// Opposite direction edge.
    pub twin: EdgeId,
    /// Island outline segment generating the Voronoi cell of this side.
    pub source_line: usize,
    /// Geometry samples from source to target, at least two.
    pub points: Vec<Point>,
    /// Island width (2x distance to outline) at each geometry sample.
    pub widths: Vec<CoordF>,
    /// Cached polyline length.
    pub length: CoordF,
    /// Minimal island width along the edge; zero on contour-adjacent edges.
    pub min_width: Coord,
    /// Maximal island width along the edge.
    pub max_width: Coord,
}

/// A point on a skeleton edge: `ratio = 0` at the edge source node,
/// `ratio = 1` at the target node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub edge: EdgeId,
    pub ratio: CoordF,
}

impl Position {
    pub fn new(edge: EdgeId, ratio: CoordF) -> Self {
        Self { edge, ratio }
    }
}

/// The skeleton graph of one island.
#[derive(Debug, Clone, Default)]
pub struct VoronoiGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl VoronoiGraph {
    /// Target node of an edge.
    #[inline]
    pub fn target(&self, edge: EdgeId) -> NodeId {
        self.edges[edge].node
    }

    /// Source node of an edge (target of its twin).
    #[inline]
    pub fn source(&self, edge: EdgeId) -> NodeId {
        self.edges[self.edges[edge].twin].node
    }

    /// Twin of an edge.
    #[inline]
    pub fn twin(&self, edge: EdgeId) -> EdgeId {
        self.edges[edge].twin
    }

    /// The two island outline segments equidistant from an edge.
    #[inline]
    pub fn source_lines(&self, edge: EdgeId) -> (usize, usize) {
        (
            self.edges[edge].source_line,
            self.edges[self.edges[edge].twin].source_line,
        )
    }

    /// Point at a position on an edge, interpolated along the edge geometry.
    pub fn position_point(&self, position: Position) -> Point {
        let edge = &self.edges[position.edge];
        let target = position.ratio.clamp(0.0, 1.0) * edge.length;
        let mut walked = 0.0;
        for pair in edge.points.windows(2) {
            let seg = Line::new(pair[0], pair[1]);
            let len = seg.length();
            if walked + len >= target && len > 0.0 {
                let t = (target - walked) / len;
                return crate::geometry::lerp(pair[0], pair[1], t);
            }
            walked += len;
        }
        *edge.points.last().expect("edge has geometry")
    }

    /// Island width at a position on an edge.
    pub fn position_width(&self, position: Position) -> CoordF {
        let edge = &self.edges[position.edge];
        let target = position.ratio.clamp(0.0, 1.0) * edge.length;
        let mut walked = 0.0;
        for (pair, widths) in edge.points.windows(2).zip(edge.widths.windows(2)) {
            let len = Line::new(pair[0], pair[1]).length();
            if walked + len >= target && len > 0.0 {
                let t = (target - walked) / len;
                return widths[0] + (widths[1] - widths[0]) * t;
            }
            walked += len;
        }
        *edge.widths.last().expect("edge has widths")
    }

    /// Distance from the edge source node to a position.
    #[inline]
    pub fn position_distance(&self, position: Position) -> CoordF {
        position.ratio.clamp(0.0, 1.0) * self.edges[position.edge].length
    }

    /// The same location expressed on the twin edge.
    #[inline]
    pub fn twin_position(&self, position: Position) -> Position {
        Position::new(self.edges[position.edge].twin, 1.0 - position.ratio)
    }

    /// First position along the edge where the island width reaches `width`.
    ///
    /// The width function is piecewise-linear along the edge geometry, so the
    /// crossing is found by inverting the linear segment containing it. The
    /// caller guarantees `min_width <= width <= max_width`; out-of-range
    /// requests clamp to the nearer end.
    pub fn position_with_width(&self, edge_id: EdgeId, width: Coord) -> Position {
        let edge = &self.edges[edge_id];
        let w = width as CoordF;
        let mut walked = 0.0;
        for (pair, widths) in edge.points.windows(2).zip(edge.widths.windows(2)) {
            let len = Line::new(pair[0], pair[1]).length();
            let (w0, w1) = (widths[0], widths[1]);
            if (w0 - w) * (w1 - w) <= 0.0 && (w1 - w0).abs() > f64::EPSILON {
                let t = (w - w0) / (w1 - w0);
                if edge.length > 0.0 {
                    let ratio = ((walked + t * len) / edge.length).clamp(0.0, 1.0);
                    return Position::new(edge_id, ratio);
                }
            }
            walked += len;
        }
        // no crossing, clamp to the closer end
        let first = *edge.widths.first().expect("edge has widths");
        let last = *edge.widths.last().expect("edge has widths");
        if (first - w).abs() <= (last - w).abs() {
            Position::new(edge_id, 0.0)
        } else {
            Position::new(edge_id, 1.0)
        }
    }

    /// The canonical traversal start: the lowest-index node with a single
    /// edge touching the island contour (`min_width == 0`).
    pub fn first_contour_node(&self) -> Option<NodeId> {
        let mut fallback = None;
        for (id, node) in self.nodes.iter().enumerate() {
            if node.edges.len() != 1 {
                continue;
            }
            if self.edges[node.edges[0]].min_width == 0 {
                return Some(id);
            }
            if fallback.is_none() {
                fallback = Some(id);
            }
        }
        fallback.or(if self.nodes.is_empty() { None } else { Some(0) })
    }

    #[cfg(debug_assertions)]
    pub(crate) fn assert_invariants(&self) {
        for (id, edge) in self.edges.iter().enumerate() {
            assert_eq!(self.edges[edge.twin].twin, id, "twin(twin(e)) != e");
            assert!(edge.min_width <= edge.max_width);
            assert!(edge.points.len() >= 2);
            assert_eq!(edge.points.len(), edge.widths.len());
        }
        for node in &self.nodes {
            for &e in &node.edges {
                assert_eq!(self.edges[self.edges[e].twin].node, self.source(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two nodes joined by a single straight edge pair.
    pub(crate) fn two_node_graph(len: Coord, w0: CoordF, w1: CoordF) -> VoronoiGraph {
        let a = Point::new(0, 0);
        let b = Point::new(len, 0);
        VoronoiGraph {
            nodes: vec![
                Node {
                    point: a,
                    edges: vec![0],
                },
                Node {
                    point: b,
                    edges: vec![1],
                },
            ],
            edges: vec![
                Edge {
                    node: 1,
                    twin: 1,
                    source_line: 0,
                    points: vec![a, b],
                    widths: vec![w0, w1],
                    length: len as CoordF,
                    min_width: w0.min(w1) as Coord,
                    max_width: w0.max(w1) as Coord,
                },
                Edge {
                    node: 0,
                    twin: 0,
                    source_line: 1,
                    points: vec![b, a],
                    widths: vec![w1, w0],
                    length: len as CoordF,
                    min_width: w0.min(w1) as Coord,
                    max_width: w0.max(w1) as Coord,
                },
            ],
        }
    }

    #[test]
    fn test_position_point_and_width() {
        let g = two_node_graph(1000, 0.0, 500.0);
        let pos = Position::new(0, 0.5);
        assert_eq!(g.position_point(pos), Point::new(500, 0));
        assert!((g.position_width(pos) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_position_with_width() {
        let g = two_node_graph(1000, 0.0, 500.0);
        let pos = g.position_with_width(0, 250);
        assert!((pos.ratio - 0.5).abs() < 1e-9);
        // twin edge runs the other way
        let pos = g.position_with_width(1, 250);
        assert!((pos.ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_twin_position() {
        let g = two_node_graph(1000, 0.0, 500.0);
        let pos = Position::new(0, 0.25);
        let twin = g.twin_position(pos);
        assert_eq!(twin.edge, 1);
        assert_eq!(g.position_point(pos), g.position_point(twin));
    }
}
