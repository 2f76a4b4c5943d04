//! Adapter from the external Voronoi diagram to the skeleton graph.
//!
//! The diagram of the island outline segments is built by `boostvoronoi`;
//! this module keeps the primary finite edges lying inside the island,
//! pairs every half-edge with its twin, and annotates each edge with its
//! geometry, length and island widths.

use std::collections::HashMap;

use boostvoronoi::builder as VB;
use boostvoronoi::diagram as VD;

use super::graph::{Edge, Node, VoronoiGraph};
use super::parabola::{self, WIDTH_ZERO_TOLERANCE};
use crate::geometry::{ExPolygon, Line, Point};
use crate::{Coord, Error, Result};

type Diagram = VD::VoronoiDiagram<i32, f64>;

/// Build the skeleton graph of an island.
///
/// `lines` must be the island's outline segments in `ExPolygon::to_lines`
/// order; the Voronoi cells reference them by index. Returns an empty graph
/// when the diagram degenerates (all edges outside or collapsed).
pub fn create_skeleton(island: &ExPolygon, lines: &[Line]) -> Result<VoronoiGraph> {
    if lines.len() < 3 {
        return Ok(VoronoiGraph::default());
    }
    let segments = convert_segments(lines)?;

    let mut vb = VB::Builder::<i32, f64>::new();
    vb.with_segments(segments.iter())
        .map_err(|e| Error::Voronoi(e.to_string()))?;
    let diagram: Diagram = vb.construct().map_err(|e| Error::Voronoi(e.to_string()))?;

    let mut graph = VoronoiGraph::default();
    let mut node_of_vertex: HashMap<usize, usize> = HashMap::new();

    let edge_count = diagram.edges().len();
    for index in 0..edge_count {
        let edge_id = VD::VoronoiEdgeIndex(index);
        let edge = diagram.edges()[index].get();
        if !edge.is_primary() {
            continue;
        }
        let twin_id = match diagram.edge_get_twin(Some(edge_id)) {
            Some(twin) => twin,
            None => continue,
        };
        if twin_id.0 < index {
            continue; // the pair was already handled from the twin side
        }
        if !diagram.edge_is_finite(Some(edge_id)).unwrap_or(false) {
            continue;
        }

        let v0 = match vertex_point(&diagram, edge.vertex0()) {
            Some(p) => p,
            None => continue,
        };
        let v1 = match vertex_point(&diagram, diagram.edge_get_vertex1(Some(edge_id))) {
            Some(p) => p,
            None => continue,
        };
        if v0 == v1 {
            continue; // zero length edge
        }

        let cell_id = match diagram.edge_get_cell(Some(edge_id)) {
            Some(c) => c,
            None => continue,
        };
        let twin_cell_id = match diagram.edge_get_cell(Some(twin_id)) {
            Some(c) => c,
            None => continue,
        };
        let cell = diagram.get_cell(cell_id).get();
        let twin_cell = diagram.get_cell(twin_cell_id).get();
        let source_line = cell.source_index();
        let twin_source_line = twin_cell.source_index();

        let (points, widths) = if edge.is_curved() {
            let (focus, directrix) = if cell.contains_point() {
                (
                    retrieve_point(&diagram, cell_id, lines),
                    lines[twin_source_line],
                )
            } else {
                (
                    retrieve_point(&diagram, twin_cell_id, lines),
                    lines[source_line],
                )
            };
            parabola::discretize(focus, directrix, v0, v1)
        } else {
            let (a, b) = (&lines[source_line], &lines[twin_source_line]);
            let mid = Line::new(v0, v1).midpoint();
            (
                vec![v0, mid, v1],
                vec![
                    parabola::width_at(v0, a, b),
                    parabola::width_at(mid, a, b),
                    parabola::width_at(v1, a, b),
                ],
            )
        };

        // only keep skeleton edges lying inside the island
        let probe = points[points.len() / 2];
        if !island.contains(&probe) {
            continue;
        }

        let length: f64 = points.windows(2).map(|p| p[0].distance(&p[1])).sum();
        if length <= 0.0 {
            continue;
        }
        let mut min_width = widths.iter().cloned().fold(f64::MAX, f64::min).round() as Coord;
        let max_width = widths.iter().cloned().fold(0.0_f64, f64::max).round() as Coord;
        if min_width <= WIDTH_ZERO_TOLERANCE {
            min_width = 0;
        }

        let source_node = node_for_vertex(&mut graph, &mut node_of_vertex, edge.vertex0(), v0);
        let target_node = node_for_vertex(
            &mut graph,
            &mut node_of_vertex,
            diagram.edge_get_vertex1(Some(edge_id)),
            v1,
        );
        if source_node == target_node {
            continue; // collapsed by rounding
        }

        let forward_id = graph.edges.len();
        let backward_id = forward_id + 1;
        let mut reversed_points = points.clone();
        reversed_points.reverse();
        let mut reversed_widths = widths.clone();
        reversed_widths.reverse();
        graph.edges.push(Edge {
            node: target_node,
            twin: backward_id,
            source_line,
            points,
            widths,
            length,
            min_width,
            max_width,
        });
        graph.edges.push(Edge {
            node: source_node,
            twin: forward_id,
            source_line: twin_source_line,
            points: reversed_points,
            widths: reversed_widths,
            length,
            min_width,
            max_width,
        });
        graph.nodes[source_node].edges.push(forward_id);
        graph.nodes[target_node].edges.push(backward_id);
    }

    #[cfg(debug_assertions)]
    graph.assert_invariants();
    Ok(graph)
}

fn convert_segments(lines: &[Line]) -> Result<Vec<boostvoronoi::Line<i32>>> {
    let to_i32 = |v: Coord| -> Result<i32> {
        i32::try_from(v).map_err(|_| {
            Error::Voronoi("island coordinates exceed the Voronoi input range".into())
        })
    };
    lines
        .iter()
        .map(|l| {
            Ok(boostvoronoi::Line {
                start: boostvoronoi::Point {
                    x: to_i32(l.a.x)?,
                    y: to_i32(l.a.y)?,
                },
                end: boostvoronoi::Point {
                    x: to_i32(l.b.x)?,
                    y: to_i32(l.b.y)?,
                },
            })
        })
        .collect()
}

fn vertex_point(diagram: &Diagram, vertex: Option<VD::VoronoiVertexIndex>) -> Option<Point> {
    let v = diagram.vertex_get(vertex)?.get();
    Some(Point::new(v.x().round() as Coord, v.y().round() as Coord))
}

fn node_for_vertex(
    graph: &mut VoronoiGraph,
    node_of_vertex: &mut HashMap<usize, usize>,
    vertex: Option<VD::VoronoiVertexIndex>,
    point: Point,
) -> usize {
    let key = vertex.map(|v| v.0).expect("finite edge has both vertices");
    *node_of_vertex.entry(key).or_insert_with(|| {
        let id = graph.nodes.len();
        graph.nodes.push(Node {
            point,
            edges: Vec::new(),
        });
        id
    })
}

/// The point site of a cell generated by a segment endpoint.
fn retrieve_point(diagram: &Diagram, cell_id: VD::VoronoiCellIndex, lines: &[Line]) -> Point {
    let (index, category) = diagram.get_cell(cell_id).get().source_index_2();
    match category {
        VD::SourceCategory::SegmentStart => lines[index].a,
        _ => lines[index].b,
    }
}
