//! Field reconstruction for thick island parts.
//!
//! A thick part's footprint is rebuilt from the island outline: every
//! transition into a thin part is closed by a chord between the feet of the
//! perpendiculars dropped from the transition position onto its two source
//! lines. Outline lines keep their identity in `is_outline`; chord lines do
//! not get outline samples. The border is then inset for sampling, with a
//! map from border line index to inset line index.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::parts::ThickPart;
use super::SampleConfig;
use crate::clipper;
use crate::geometry::{ExPolygon, Line, Point, Polygon};
use crate::voronoi::{EdgeId, Position, VoronoiGraph};
use crate::CoordF;

/// Direction match tolerance for border-to-inset line pairing (radians).
const OFFSET_ANGLE_TOLERANCE: CoordF = 1e-4;
/// Perpendicular distance tolerance for border-to-inset pairing (units).
const OFFSET_DISTANCE_TOLERANCE: CoordF = 20.0;

/// A thick part's footprint prepared for sampling.
#[derive(Debug, Clone)]
pub struct Field {
    /// Outline of the part with thin exits closed by chords.
    pub border: ExPolygon,
    /// Flag per border line: true for island outline, false for a chord.
    pub is_outline: Vec<bool>,
    /// Border inset by `minimal_distance_from_outline`.
    pub inner: ExPolygon,
    /// Map from border line index to the matching inner line index.
    pub field_to_inner: HashMap<usize, usize>,
}

/// A change from wide to tiny stored under the border line it begins on.
#[derive(Debug, Clone)]
struct WideTinyChange {
    /// New coordinate for the cut line's b point.
    new_b: Point,
    /// New coordinate for the continuation line's a point.
    next_new_a: Point,
    /// Line to continue on after the chord.
    next_line_index: usize,
}

/// Build the field of a thick part.
///
/// `island` provides the ring structure of `lines`. Returns `None` when the
/// part is too small to hold any inset area.
pub fn create_thick_field(
    graph: &VoronoiGraph,
    part: &ThickPart,
    island: &ExPolygon,
    lines: &[Line],
    config: &SampleConfig,
) -> Option<Field> {
    let sentinel = lines.len();
    let next_line = ring_successors(island);

    // chords keyed by the line they begin on, ordered along that line
    let mut wide_tiny_changes: BTreeMap<usize, Vec<WideTinyChange>> = BTreeMap::new();
    for end in &part.ends {
        let (p1, p2) = point_on_lines(graph, *end, lines);
        let (i1, i2) = graph.source_lines(end.edge);
        let (change, key) = if is_opposite_direction(graph, end.edge, &lines[i1]) {
            // line i1 is cut at its a side, so the chord begins on line i2
            (
                WideTinyChange {
                    new_b: p2,
                    next_new_a: p1,
                    next_line_index: i1,
                },
                i2,
            )
        } else {
            (
                WideTinyChange {
                    new_b: p1,
                    next_new_a: p2,
                    next_line_index: i2,
                },
                i1,
            )
        };
        let entry = wide_tiny_changes.entry(key).or_default();
        let pos = entry
            .partition_point(|c| is_before(&lines[key], &c.new_b, &change.new_b));
        entry.insert(pos, change);
    }

    let mut field_line_indices = collect_line_indices(graph, part);
    field_line_indices.sort_unstable();
    field_line_indices.dedup();
    if field_line_indices.is_empty() {
        return None;
    }

    let mut points: Vec<Point> = Vec::with_capacity(field_line_indices.len());
    let mut source_indices: Vec<usize> = Vec::with_capacity(field_line_indices.len());
    let mut done: BTreeSet<usize> = BTreeSet::new();

    let (s1, s2) = graph.source_lines(part.start);
    let input_index = s1.min(s2);

    // walk the outline from the entry line, applying chords as they come
    let mut outline_index = input_index;
    // inconsistent chord data must not spin forever in release builds
    let mut budget = 2 * lines.len() + 2 * part.ends.len() + 2;
    loop {
        if budget == 0 {
            log::warn!("field outline walk did not close, keeping partial border");
            break;
        }
        budget -= 1;
        if !insert_changes(
            &mut outline_index,
            &mut points,
            &mut source_indices,
            &mut done,
            input_index,
            &wide_tiny_changes,
            lines,
            sentinel,
        ) {
            break;
        }
        insert_point_b(
            &mut outline_index,
            &mut points,
            &mut source_indices,
            &mut done,
            lines,
            &next_line,
        );
        if outline_index == input_index {
            break;
        }
    }

    if points.len() < 3 {
        return None;
    }
    let mut border = ExPolygon::new(Polygon::from_points(points));

    // remaining participating lines form holes
    for &index in &field_line_indices {
        if done.contains(&index) {
            continue;
        }
        let mut hole_points = Vec::new();
        let mut hole_index = index;
        loop {
            insert_point_b(
                &mut hole_index,
                &mut hole_points,
                &mut source_indices,
                &mut done,
                lines,
                &next_line,
            );
            if hole_index == index {
                break;
            }
        }
        if hole_points.len() >= 3 {
            border.holes.push(Polygon::from_points(hole_points));
        }
    }

    // a part enclosing the island outside can produce a hole larger than the
    // contour; swap them, moving the source index blocks along
    set_biggest_hole_as_contour(&mut border, &mut source_indices);

    let mut is_outline: Vec<bool> = source_indices.iter().map(|&s| s != sentinel).collect();
    // a chord landing exactly on a ring's first point drops one duplicate
    // border point; keep the flags aligned with the border lines
    is_outline.resize(border.points_count(), true);
    field_with_inset(border, is_outline, config)
}

/// Build a field directly from a known border, as peninsulas provide it.
pub fn create_peninsula_field(
    border: ExPolygon,
    is_outline: Vec<bool>,
    config: &SampleConfig,
) -> Option<Field> {
    field_with_inset(border, is_outline, config)
}

fn field_with_inset(
    border: ExPolygon,
    is_outline: Vec<bool>,
    config: &SampleConfig,
) -> Option<Field> {
    let (inner, field_to_inner) = outline_offset(&border, config.minimal_distance_from_outline)?;
    Some(Field {
        border,
        is_outline,
        inner,
        field_to_inner,
    })
}

/// Inset `border` and pair each border line with its inset counterpart by
/// direction and perpendicular distance.
fn outline_offset(
    border: &ExPolygon,
    delta: crate::Coord,
) -> Option<(ExPolygon, HashMap<usize, usize>)> {
    let inset = clipper::shrink(std::slice::from_ref(border), delta);
    // on a split keep the piece with the largest area
    let inner = inset
        .into_iter()
        .max_by(|a, b| a.area().partial_cmp(&b.area()).unwrap_or(std::cmp::Ordering::Equal))?;
    if inner.contour.len() < 3 {
        return None;
    }

    let border_lines = border.to_lines();
    let inner_lines = inner.to_lines();
    let delta_f = delta as CoordF;
    let mut converter = HashMap::new();
    for (border_index, border_line) in border_lines.iter().enumerate() {
        let dir1 = border_line.direction_f().normalize();
        let major = if dir1.x.abs() > dir1.y.abs() { 0 } else { 1 };
        let axis = |p: &Point| if major == 0 { p.x } else { p.y };
        let (mut lo1, mut hi1) = (axis(&border_line.a), axis(&border_line.b));
        if lo1 > hi1 {
            std::mem::swap(&mut lo1, &mut hi1);
        }

        for (inner_index, inner_line) in inner_lines.iter().enumerate() {
            let (mut lo2, mut hi2) = (axis(&inner_line.a), axis(&inner_line.b));
            if lo2 > hi2 {
                std::mem::swap(&mut lo2, &mut hi2);
            }
            if lo1 > hi2 || lo2 > hi1 {
                continue; // intervals do not overlap
            }
            let dir2 = inner_line.direction_f().normalize();
            let angle = dir1.dot(&dir2).clamp(-1.0, 1.0).acos();
            if angle.abs() > OFFSET_ANGLE_TOLERANCE {
                continue;
            }
            let distance = border_line.perp_distance_to(&inner_line.midpoint());
            if (distance - delta_f).abs() > OFFSET_DISTANCE_TOLERANCE {
                continue;
            }
            converter.insert(border_index, inner_index);
            break;
        }
    }
    Some((inner, converter))
}

/// Collect the island line indices touched by the part's Voronoi cells.
fn collect_line_indices(graph: &VoronoiGraph, part: &ThickPart) -> Vec<usize> {
    let mut indices = Vec::new();
    let mut process: Vec<EdgeId> = Vec::new();
    let mut current: Option<EdgeId> = Some(part.start);
    while current.is_some() || !process.is_empty() {
        let edge = match current.take() {
            Some(edge) => edge,
            None => process.pop().expect("queue is non-empty"),
        };
        let (i1, i2) = graph.source_lines(edge);
        indices.push(i1);
        indices.push(i2);

        if part
            .ends
            .binary_search_by(|end| end.edge.cmp(&edge))
            .is_ok()
        {
            continue; // part boundary
        }

        let twin = graph.twin(edge);
        if let Some(queued) = process.iter().position(|&p| p == twin) {
            process.remove(queued);
            continue; // loop closed
        }

        for &child in &graph.nodes[graph.edges[edge].node].edges {
            if child == twin {
                continue;
            }
            if current.is_none() {
                current = Some(child);
            } else {
                process.push(child);
            }
        }
    }
    indices
}

/// Feet of the perpendiculars from a position onto its two source lines.
fn point_on_lines(graph: &VoronoiGraph, position: Position, lines: &[Line]) -> (Point, Point) {
    let point = graph.position_point(position);
    let (i1, i2) = graph.source_lines(position.edge);
    (
        lines[i1].project_point(&point),
        lines[i2].project_point(&point),
    )
}

/// Whether the skeleton edge runs against the direction of `line`.
fn is_opposite_direction(graph: &VoronoiGraph, edge: EdgeId, line: &Line) -> bool {
    let geometry = &graph.edges[edge].points;
    let edge_dir = (*geometry.last().expect("edge has geometry")
        - *geometry.first().expect("edge has geometry"))
    .to_f64();
    edge_dir.dot(&line.direction_f()) < 0.0
}

/// Whether `p` lies strictly before `q` along `line` (measured from a).
fn is_before(line: &Line, p: &Point, q: &Point) -> bool {
    let dir = line.direction();
    (*p - line.a).dot(&dir) < (*q - line.a).dot(&dir)
}

/// Successor of each line index within its ring.
fn ring_successors(island: &ExPolygon) -> Vec<usize> {
    let mut next = Vec::new();
    let mut offset = 0;
    let mut push_ring = |len: usize, next: &mut Vec<usize>| {
        for i in 0..len {
            next.push(offset + (i + 1) % len);
        }
        offset += len;
    };
    push_ring(island.contour.len(), &mut next);
    for hole in &island.holes {
        push_ring(hole.len(), &mut next);
    }
    next
}

fn insert_point_b(
    index: &mut usize,
    points: &mut Vec<Point>,
    source_indices: &mut Vec<usize>,
    done: &mut BTreeSet<usize>,
    lines: &[Line],
    next_line: &[usize],
) {
    points.push(lines[*index].b);
    done.insert(*index);
    *index = next_line[*index];
    source_indices.push(*index);
}

/// Apply every chord beginning on the current line. Returns false when a
/// chord closes the walk back into the entry line.
#[allow(clippy::too_many_arguments)]
fn insert_changes(
    index: &mut usize,
    points: &mut Vec<Point>,
    source_indices: &mut Vec<usize>,
    done: &mut BTreeSet<usize>,
    input_index: usize,
    wide_tiny_changes: &BTreeMap<usize, Vec<WideTinyChange>>,
    lines: &[Line],
    sentinel: usize,
) -> bool {
    let is_before_first_change = |point_on_input_line: &Point| -> bool {
        match wide_tiny_changes.get(&input_index) {
            None => true,
            Some(changes) => !changes
                .iter()
                .any(|c| is_before(&lines[input_index], &c.new_b, point_on_input_line)),
        }
    };

    let mut change_item = wide_tiny_changes.get(index);
    while let Some(changes) = change_item {
        debug_assert!(!changes.is_empty());
        let mut change_index = 0;
        if let Some(last_point) = points.last().copied() {
            // skip chords already passed on this line
            while is_before(&lines[*index], &changes[change_index].new_b, &last_point) {
                change_index += 1;
                if change_index >= changes.len() {
                    return true;
                }
            }
            // the walk ends with a chord into the first line
            if *index == input_index && change_index == 0 {
                return false;
            }
        }

        let change = &changes[change_index];
        if points.last() != Some(&change.new_b) {
            points.push(change.new_b);
            source_indices.push(sentinel);
        } else {
            *source_indices.last_mut().expect("points imply sources") = sentinel;
        }
        if lines[change.next_line_index].b != change.next_new_a {
            points.push(change.next_new_a);
            source_indices.push(change.next_line_index);
        }
        done.insert(*index);

        if *index != input_index
            && change.next_line_index == input_index
            && is_before_first_change(&change.next_new_a)
        {
            return false; // loop finished by the chord
        }

        *index = change.next_line_index;
        change_item = wide_tiny_changes.get(index);
    }
    true
}

/// When a hole's extent exceeds the contour's, swap it in as contour
/// together with its block of source indices.
fn set_biggest_hole_as_contour(shape: &mut ExPolygon, source_indices: &mut Vec<usize>) {
    let contour_size = shape.contour.bounding_box().size();
    let mut biggest = None;
    let mut biggest_size = contour_size;
    for (hole_index, hole) in shape.holes.iter().enumerate() {
        let hole_size = hole.bounding_box().size();
        if hole_size.x >= biggest_size.x {
            biggest_size = hole_size;
            biggest = Some(hole_index);
        }
    }
    let Some(hole_index) = biggest else {
        return;
    };

    let contour_count = shape.contour.len();
    let hole_offset = contour_count
        + shape.holes[..hole_index]
            .iter()
            .map(|h| h.len())
            .sum::<usize>();
    let hole_count = shape.holes[hole_index].len();

    std::mem::swap(&mut shape.contour, &mut shape.holes[hole_index]);

    // move the hole's index block to the front, the old contour's in its place
    let hole_block: Vec<usize> =
        source_indices[hole_offset..hole_offset + hole_count].to_vec();
    let contour_block: Vec<usize> = source_indices[..contour_count].to_vec();
    source_indices.splice(hole_offset..hole_offset + hole_count, contour_block);
    source_indices.splice(..contour_count, hole_block);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::island::parts::separate_thin_thick;
    use crate::scale;
    use crate::voronoi::{create_longest_path, create_skeleton};

    fn dumbbell() -> ExPolygon {
        ExPolygon::new(Polygon::from_points(vec![
            Point::new_scale(0.0, 0.0),
            Point::new_scale(6.0, 0.0),
            Point::new_scale(6.0, 2.7),
            Point::new_scale(16.0, 2.7),
            Point::new_scale(16.0, 0.0),
            Point::new_scale(22.0, 0.0),
            Point::new_scale(22.0, 6.0),
            Point::new_scale(16.0, 6.0),
            Point::new_scale(16.0, 3.3),
            Point::new_scale(6.0, 3.3),
            Point::new_scale(6.0, 6.0),
            Point::new_scale(0.0, 6.0),
        ]))
    }

    #[test]
    fn test_field_of_dumbbell_plate() {
        let config = SampleConfig::from_head_diameter(0.4);
        let island = dumbbell();
        let lines = island.to_lines();
        let graph = create_skeleton(&island, &lines).unwrap();
        let start = graph.first_contour_node().unwrap();
        let path = create_longest_path(&graph, start);
        let (_, thick) = separate_thin_thick(&graph, &path, &config);
        assert_eq!(thick.len(), 2);

        for part in &thick {
            let field = create_thick_field(&graph, part, &island, &lines, &config)
                .expect("plate produces a field");
            // the field is one plate with the neck exit closed by a chord
            let field_area = field.border.area();
            let plate_area = (scale(6.0) as f64) * (scale(6.0) as f64);
            assert!(field_area > plate_area * 0.8, "field too small");
            assert!(field_area < plate_area * 1.4, "field leaked into the neck");
            // exactly one chord segment closes the thin exit
            let chords = field.is_outline.iter().filter(|&&o| !o).count();
            assert_eq!(chords, 1);
            // the inset stays strictly inside the border
            assert!(field.inner.area() < field.border.area());
            // mapped lines actually run parallel at the inset distance
            let border_lines = field.border.to_lines();
            let inner_lines = field.inner.to_lines();
            for (&b, &i) in &field.field_to_inner {
                let d = border_lines[b].perp_distance_to(&inner_lines[i].midpoint());
                assert!(
                    (d - config.minimal_distance_from_outline as f64).abs()
                        < OFFSET_DISTANCE_TOLERANCE
                );
            }
        }
    }

    #[test]
    fn test_square_field_has_no_chords() {
        let config = SampleConfig::from_head_diameter(0.4);
        let island = ExPolygon::new(Polygon::from_points(vec![
            Point::new_scale(0.0, 0.0),
            Point::new_scale(8.0, 0.0),
            Point::new_scale(8.0, 8.0),
            Point::new_scale(0.0, 8.0),
        ]));
        let lines = island.to_lines();
        let graph = create_skeleton(&island, &lines).unwrap();
        let start = graph.first_contour_node().unwrap();
        let path = create_longest_path(&graph, start);
        let (_, thick) = separate_thin_thick(&graph, &path, &config);
        assert_eq!(thick.len(), 1);
        let field = create_thick_field(&graph, &thick[0], &island, &lines, &config).unwrap();
        assert!(field.is_outline.iter().all(|&o| o));
        assert_eq!(field.border.contour.len(), 4);
    }
}
