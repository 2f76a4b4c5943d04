//! Separation of thin and thick island parts along the skeleton.
//!
//! Edges are classified against a hysteresis band: widths below
//! `thick_min_width` are thin, widths above `thin_max_width` are thick, the
//! band between is "middle". The walk emits a part change at the exact
//! position where an edge's width crosses a threshold. Post-processing
//! dissolves every middle part and merges parts too short to stand alone,
//! so the output consists of thin and thick parts only.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::island::SampleConfig;
use crate::voronoi::{
    create_position_on_path, ends_in_distance, EdgeId, ExPath, NodeId, Position, VoronoiGraph,
};
use crate::{Coord, CoordF};

/// Narrow part of the island along the skeleton.
#[derive(Debug, Clone)]
pub struct ThinPart {
    /// Center of the longest path inside the part.
    pub center: Position,
    /// Transitions into neighboring thick parts, sorted by edge id.
    pub ends: Vec<Position>,
}

/// Wide part of the island along the skeleton.
#[derive(Debug, Clone)]
pub struct ThickPart {
    /// Edge pointing into the part (twin of the first end); its source node
    /// lies inside the part.
    pub start: EdgeId,
    /// Transitions into neighboring thin parts, sorted by edge id.
    pub ends: Vec<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IslandPartType {
    Thin,
    Middle,
    Thick,
}

#[derive(Debug, Clone)]
struct IslandPartChange {
    /// Position on the way out of the part; the edge's source node lies
    /// inside the part.
    position: Position,
    part_index: usize,
}

#[derive(Debug, Clone)]
struct IslandPart {
    part_type: IslandPartType,
    changes: Vec<IslandPartChange>,
    /// Accumulated traversed length, the ranking key for middle merges.
    sum_lengths: CoordF,
}

#[derive(Debug, Clone, Copy)]
struct ProcessItem {
    prev_node: Option<NodeId>,
    node: NodeId,
    part: usize,
}

/// Separate the island skeleton into thin and thick parts.
///
/// `path` is the longest path from a contour-entry node; its front seeds the
/// walk in a thin part (contour edges have zero width).
pub fn separate_thin_thick(
    graph: &VoronoiGraph,
    path: &ExPath,
    config: &SampleConfig,
) -> (Vec<ThinPart>, Vec<ThickPart>) {
    let Some(&start_node) = path.nodes.first() else {
        return (Vec::new(), Vec::new());
    };

    let mut parts = vec![IslandPart {
        part_type: IslandPartType::Thin,
        changes: Vec::new(),
        sum_lengths: 0.0,
    }];
    let mut item = ProcessItem {
        prev_node: None,
        node: start_node,
        part: 0,
    };
    let mut process: Vec<ProcessItem> = Vec::new();

    loop {
        let mut next: Option<ProcessItem> = None;
        for &edge in &graph.nodes[item.node].edges {
            let to = graph.edges[edge].node;
            if Some(to) == item.prev_node {
                continue; // already walked
            }
            if let Some(prepared) = next.take() {
                process.push(prepared);
            }

            let next_part = detect_interface(graph, &mut parts, item.part, edge, config);
            let candidate = ProcessItem {
                prev_node: Some(item.node),
                node: to,
                part: next_part,
            };

            // loop back onto a queued walk coming the other way
            if let Some(queued) = process
                .iter()
                .position(|p| Some(p.node) == candidate.prev_node && p.prev_node == Some(candidate.node))
            {
                let other_part = process[queued].part;
                merge_parts_and_fix_process(
                    &mut parts,
                    &mut item.part,
                    other_part,
                    candidate.part,
                    &mut process,
                );
                process.remove(queued);
                continue; // branch already processed from the other side
            }
            next = Some(candidate);
        }

        if let Some(next_item) = next {
            item = next_item;
        } else if let Some(queued) = process.pop() {
            item = queued;
        } else {
            break;
        }
    }

    merge_middle_parts_into_biggest_neighbor(&mut parts);
    if parts.len() > 1 {
        merge_same_neighbor_type_parts(&mut parts);
    }
    if parts.len() > 1 {
        merge_short_parts(graph, &mut parts, config.min_part_length);
    }
    convert_parts(graph, parts, path)
}

/// Emit a part change on `edge` at the width `limit` and open a new part.
///
/// Changes too close to the island contour are suppressed; a change that
/// would cut off the initial stub only retypes the first part.
fn add_part(
    graph: &VoronoiGraph,
    parts: &mut Vec<IslandPart>,
    part_index: usize,
    to_type: IslandPartType,
    edge: EdgeId,
    limit: Coord,
    config: &SampleConfig,
) -> usize {
    let position = graph.position_with_width(edge, limit);
    let min_length = config.min_part_length as CoordF;
    if ends_in_distance(graph, position, min_length) {
        return part_index; // too close to the border, nothing to split off
    }

    let new_part_index = parts.len();
    let twin_position = graph.twin_position(position);
    if new_part_index == 1 && ends_in_distance(graph, twin_position, min_length) {
        // only the initial stub exists behind the change; its correct type
        // is the type a short distance from the start
        debug_assert!(parts[0].changes.is_empty());
        parts[0].part_type = to_type;
        return part_index;
    }

    parts[part_index].changes.push(IslandPartChange {
        position,
        part_index: new_part_index,
    });
    parts[part_index].sum_lengths += graph.position_distance(position);

    parts.push(IslandPart {
        part_type: to_type,
        changes: vec![IslandPartChange {
            position: twin_position,
            part_index,
        }],
        sum_lengths: graph.position_distance(twin_position),
    });
    new_part_index
}

/// Classify `edge` against the hysteresis thresholds, emitting part changes
/// for every threshold crossed. Returns the part index after the edge.
fn detect_interface(
    graph: &VoronoiGraph,
    parts: &mut Vec<IslandPart>,
    part_index: usize,
    edge: EdgeId,
    config: &SampleConfig,
) -> usize {
    let min = config.thick_min_width;
    let max = config.thin_max_width;
    let min_width = graph.edges[edge].min_width;
    let max_width = graph.edges[edge].max_width;

    match parts[part_index].part_type {
        IslandPartType::Thin => {
            if max_width >= min {
                let next =
                    add_part(graph, parts, part_index, IslandPartType::Middle, edge, min, config);
                if max_width >= max {
                    return add_part(graph, parts, next, IslandPartType::Thick, edge, max, config);
                }
                return next;
            }
        }
        IslandPartType::Middle => {
            if min_width < min {
                return add_part(graph, parts, part_index, IslandPartType::Thin, edge, min, config);
            } else if max_width > max {
                return add_part(graph, parts, part_index, IslandPartType::Thick, edge, max, config);
            }
        }
        IslandPartType::Thick => {
            if max_width <= max {
                let next =
                    add_part(graph, parts, part_index, IslandPartType::Middle, edge, max, config);
                if min_width <= min {
                    return add_part(graph, parts, next, IslandPartType::Thin, edge, min, config);
                }
                return next;
            }
        }
    }

    // no interface on this edge
    parts[part_index].sum_lengths += graph.edges[edge].length;
    part_index
}

/// Merge part `remove_index` into part `index` (`index < remove_index`),
/// rewiring changes and fixing part indices everywhere.
fn merge_island_parts(parts: &mut Vec<IslandPart>, index: usize, remove_index: usize) {
    debug_assert!(index < remove_index);
    let mut removed_changes = std::mem::take(&mut parts[remove_index].changes);
    removed_changes.retain(|change| change.part_index != index);
    parts[index]
        .changes
        .retain(|change| change.part_index != remove_index);
    parts[index].changes.extend(removed_changes);

    parts.remove(remove_index);

    for part in parts.iter_mut() {
        for change in &mut part.changes {
            if change.part_index == remove_index {
                change.part_index = index;
            } else if change.part_index > remove_index {
                change.part_index -= 1;
            }
        }
    }
}

/// Merge two parts straddled by a loop-back walk and fix the queued items.
fn merge_parts_and_fix_process(
    parts: &mut Vec<IslandPart>,
    item_part: &mut usize,
    index: usize,
    remove_index: usize,
    process: &mut [ProcessItem],
) {
    if index == remove_index {
        return; // loop connects a part to itself
    }
    let (index, remove_index) = if remove_index < index {
        (remove_index, index)
    } else {
        (index, remove_index)
    };
    debug_assert_eq!(parts[index].part_type, parts[remove_index].part_type);
    parts[index].sum_lengths += parts[remove_index].sum_lengths;
    merge_island_parts(parts, index, remove_index);

    for p in process.iter_mut() {
        if p.part == remove_index {
            p.part = index;
        } else if p.part > remove_index {
            p.part -= 1;
        }
    }
    if *item_part == remove_index {
        *item_part = index;
    } else if *item_part > remove_index {
        *item_part -= 1;
    }
}

/// Dissolve every middle part into its neighbor with the largest
/// `sum_lengths`; equal sums keep the lower part index.
fn merge_middle_parts_into_biggest_neighbor(parts: &mut Vec<IslandPart>) {
    let mut index = 0;
    while index < parts.len() {
        if parts[index].part_type != IslandPartType::Middle || parts[index].changes.is_empty() {
            index += 1;
            continue;
        }
        let biggest = parts[index]
            .changes
            .iter()
            .map(|change| change.part_index)
            .fold(None::<usize>, |best, candidate| match best {
                None => Some(candidate),
                Some(b) if parts[candidate].sum_lengths > parts[b].sum_lengths => Some(candidate),
                Some(b) => Some(b),
            })
            .expect("middle part has changes");

        parts[index].part_type = parts[biggest].part_type;
        let (merged, removed) = if index < biggest {
            (index, biggest)
        } else {
            (biggest, index)
        };
        merge_island_parts(parts, merged, removed);
        // the slot at `index` now holds a different part, re-examine it
        index = index.min(merged);
    }
}

/// Coalesce adjacent parts of the same type.
fn merge_same_neighbor_type_parts(parts: &mut Vec<IslandPart>) {
    let mut index = 0;
    while index < parts.len() {
        let same = parts[index].changes.iter().find_map(|change| {
            (parts[change.part_index].part_type == parts[index].part_type)
                .then_some(change.part_index)
        });
        match same {
            Some(other) => {
                let (merged, removed) = if index < other { (index, other) } else { (other, index) };
                merge_island_parts(parts, merged, removed);
                index = merged;
            }
            None => index += 1,
        }
    }
}

/// Remove part `index`, merging all of its (uniformly opposite-typed)
/// neighbors into one part. Returns the merged part's final index and the
/// sorted list of removed indices.
fn merge_neighbor(parts: &mut Vec<IslandPart>, index: usize) -> (usize, Vec<usize>) {
    let changes = parts[index].changes.clone();
    let mut remove_indices: Vec<usize> = changes.iter().map(|c| c.part_index).collect();
    remove_indices.push(index);
    remove_indices.sort_unstable();
    remove_indices.dedup();
    let modified_index = remove_indices.remove(0);

    // collect the outward changes of all merged neighbors
    let mut merged_changes: Vec<IslandPartChange> = Vec::new();
    let neighbor_type = parts[changes[0].part_index].part_type;
    for change in &changes {
        for n_change in &parts[change.part_index].changes {
            if n_change.part_index != index {
                merged_changes.push(n_change.clone());
            }
        }
    }

    let removed: Vec<usize> = remove_indices.clone();
    for &r in removed.iter().rev() {
        parts.remove(r);
    }

    let merged = &mut parts[modified_index];
    merged.part_type = neighbor_type;
    merged.changes = merged_changes;
    merged.sum_lengths = 0.0; // meaningless after merge

    for part in parts.iter_mut() {
        for change in &mut part.changes {
            match removed.binary_search(&change.part_index) {
                Ok(_) => change.part_index = modified_index,
                Err(shift) => change.part_index -= shift,
            }
        }
    }
    (modified_index, removed)
}

/// Merge parts whose longest internal distance is below `min_part_length`,
/// always picking the shortest remaining part first.
fn merge_short_parts(graph: &VoronoiGraph, parts: &mut Vec<IslandPart>, min_part_length: Coord) {
    debug_assert!(parts.len() > 1);
    let mut lengths: Vec<CoordF> = parts
        .iter()
        .map(|part| get_longest_distance(graph, &part.changes, None))
        .collect();

    loop {
        // ties keep the lowest part index
        let (smallest, length) = lengths.iter().enumerate().fold(
            (0usize, CoordF::INFINITY),
            |(best_i, best_l), (i, &l)| {
                if l < best_l {
                    (i, l)
                } else {
                    (best_i, best_l)
                }
            },
        );
        if length >= min_part_length as CoordF {
            break;
        }

        let (index, removed) = merge_neighbor(parts, smallest);
        if parts.len() == 1 {
            return;
        }
        for &r in removed.iter().rev() {
            lengths.remove(r);
        }
        lengths[index] = get_longest_distance(graph, &parts[index].changes, None);
    }
}

#[derive(PartialEq)]
struct HeapEntry(CoordF, NodeId);
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on distance
        other
            .0
            .partial_cmp(&self.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.1.cmp(&self.1))
    }
}

/// Shortest distances from one change to every node of the part interior.
/// Returns per-node distance and the edge used to reach the node.
fn change_distances(
    graph: &VoronoiGraph,
    changes: &[IslandPartChange],
    change_index: usize,
) -> (Vec<CoordF>, Vec<Option<EdgeId>>) {
    let blocked: Vec<EdgeId> = {
        let mut edges: Vec<EdgeId> = changes
            .iter()
            .flat_map(|c| [c.position.edge, graph.twin(c.position.edge)])
            .collect();
        edges.sort_unstable();
        edges
    };
    let is_blocked = |edge: EdgeId| blocked.binary_search(&edge).is_ok();

    let mut dist = vec![CoordF::INFINITY; graph.nodes.len()];
    let mut prev = vec![None; graph.nodes.len()];
    let start = graph.source(changes[change_index].position.edge);
    dist[start] = graph.position_distance(changes[change_index].position);

    let mut heap = BinaryHeap::new();
    heap.push(HeapEntry(dist[start], start));
    while let Some(HeapEntry(d, node)) = heap.pop() {
        if d > dist[node] {
            continue;
        }
        for &edge in &graph.nodes[node].edges {
            if is_blocked(edge) {
                continue;
            }
            let to = graph.edges[edge].node;
            let candidate = d + graph.edges[edge].length;
            if candidate < dist[to] {
                dist[to] = candidate;
                prev[to] = Some(edge);
                heap.push(HeapEntry(candidate, to));
            }
        }
    }
    (dist, prev)
}

/// Longest distance between any two changes (or from a change to the
/// farthest interior node) over the part-internal subgraph. Optionally
/// reconstructs the half-distance center.
fn get_longest_distance(
    graph: &VoronoiGraph,
    changes: &[IslandPartChange],
    mut center: Option<&mut Position>,
) -> CoordF {
    if changes.is_empty() {
        // a change-free part spans the whole graph and is never short
        return CoordF::INFINITY;
    }

    // part lying on a single edge between two changes
    let front = &changes[0].position;
    if changes.len() == 2 && graph.twin(front.edge) == changes[1].position.edge {
        let back = &changes[1].position;
        let length = graph.edges[front.edge].length * (1.0 - front.ratio - back.ratio);
        if let Some(center) = center {
            // midpoint of the residual interval, in the front edge frame
            *center = Position::new(front.edge, (front.ratio + (1.0 - back.ratio)) / 2.0);
        }
        return length.max(0.0);
    }

    let per_change: Vec<(Vec<CoordF>, Vec<Option<EdgeId>>)> = (0..changes.len())
        .map(|i| change_distances(graph, changes, i))
        .collect();

    // farthest interior node from any change
    let mut best = 0.0_f64;
    let mut best_source = 0;
    let mut best_target = Target::Node(graph.source(front.edge));
    for (i, (dist, _)) in per_change.iter().enumerate() {
        for (node, &d) in dist.iter().enumerate() {
            if d.is_finite() && d > best {
                best = d;
                best_source = i;
                best_target = Target::Node(node);
            }
        }
    }
    // farthest pair of changes
    for i in 0..changes.len() {
        for (j, change) in changes.iter().enumerate().skip(i + 1) {
            let through = graph.source(change.position.edge);
            if !per_change[i].0[through].is_finite() {
                continue;
            }
            let d = per_change[i].0[through] + graph.position_distance(change.position);
            if d > best {
                best = d;
                best_source = i;
                best_target = Target::Change(j);
            }
        }
    }

    let Some(center) = center.take() else {
        return best;
    };

    let half = best / 2.0;
    let source_position = changes[best_source].position;
    if graph.position_distance(source_position) >= half {
        // center lies on the source change edge, walking back into the part
        let ratio = source_position.ratio
            - half / graph.edges[source_position.edge].length;
        *center = Position::new(source_position.edge, ratio.clamp(0.0, 1.0));
        return best;
    }
    if let Target::Change(j) = best_target {
        let target_position = changes[j].position;
        if graph.position_distance(target_position) >= half {
            let ratio = target_position.ratio
                - half / graph.edges[target_position.edge].length;
            *center = Position::new(target_position.edge, ratio.clamp(0.0, 1.0));
            return best;
        }
    }

    // walk the predecessor chain from the target end toward the source
    // change until the distance drops below half
    let (dist, prev) = &per_change[best_source];
    let mut node = match best_target {
        Target::Node(node) => node,
        Target::Change(j) => graph.source(changes[j].position.edge),
    };
    while let Some(edge) = prev[node] {
        let from = graph.source(edge);
        if dist[from] <= half {
            let ratio = (half - dist[from]) / graph.edges[edge].length;
            *center = Position::new(edge, ratio.clamp(0.0, 1.0));
            return best;
        }
        node = from;
    }
    // start node itself is past half (numeric edge), center on the change
    *center = Position::new(source_position.edge, source_position.ratio);
    best
}

#[derive(Clone, Copy)]
enum Target {
    Node(NodeId),
    Change(usize),
}

fn convert_parts(
    graph: &VoronoiGraph,
    parts: Vec<IslandPart>,
    path: &ExPath,
) -> (Vec<ThinPart>, Vec<ThickPart>) {
    debug_assert!(!parts.is_empty());

    if parts.len() == 1 {
        let part = &parts[0];
        return match part.part_type {
            IslandPartType::Thick => {
                let start = graph.nodes[path.nodes[0]].edges[0];
                (Vec::new(), vec![ThickPart {
                    start,
                    ends: Vec::new(),
                }])
            }
            _ => {
                let center = create_position_on_path(graph, &path.nodes, path.length / 2.0)
                    .unwrap_or(Position::new(graph.nodes[path.nodes[0]].edges[0], 0.5));
                (
                    vec![ThinPart {
                        center,
                        ends: Vec::new(),
                    }],
                    Vec::new(),
                )
            }
        };
    }

    let mut thin_parts = Vec::new();
    let mut thick_parts = Vec::new();
    for part in &parts {
        debug_assert!(!part.changes.is_empty());
        let mut ends: Vec<Position> = part.changes.iter().map(|c| c.position).collect();
        ends.sort_by_key(|p| p.edge);
        match part.part_type {
            IslandPartType::Thin => {
                let mut center = ends[0];
                get_longest_distance(graph, &part.changes, Some(&mut center));
                thin_parts.push(ThinPart { center, ends });
            }
            _ => {
                debug_assert_eq!(part.part_type, IslandPartType::Thick);
                let start = graph.twin(ends[0].edge);
                thick_parts.push(ThickPart { start, ends });
            }
        }
    }
    (thin_parts, thick_parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ExPolygon, Point, Polygon};
    use crate::scale;
    use crate::voronoi::{create_longest_path, create_skeleton};

    fn separate(island: &ExPolygon, config: &SampleConfig) -> (Vec<ThinPart>, Vec<ThickPart>) {
        let lines = island.to_lines();
        let graph = create_skeleton(island, &lines).unwrap();
        let start = graph.first_contour_node().unwrap();
        let path = create_longest_path(&graph, start);
        separate_thin_thick(&graph, &path, config)
    }

    fn rect(w: f64, h: f64) -> ExPolygon {
        ExPolygon::new(Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(scale(w), 0),
            Point::new(scale(w), scale(h)),
            Point::new(0, scale(h)),
        ]))
    }

    #[test]
    fn test_thin_rect_is_single_thin_part() {
        let config = SampleConfig::from_head_diameter(0.4);
        // 0.5 mm wide rect is far below thick_min_width (1 mm)
        let (thin, thick) = separate(&rect(8.0, 0.5), &config);
        assert_eq!(thin.len(), 1);
        assert!(thick.is_empty());
        assert!(thin[0].ends.is_empty());
    }

    #[test]
    fn test_wide_square_is_single_thick_part() {
        let config = SampleConfig::from_head_diameter(0.4);
        let (thin, thick) = separate(&rect(8.0, 8.0), &config);
        assert!(thin.is_empty());
        assert_eq!(thick.len(), 1);
        assert!(thick[0].ends.is_empty());
    }

    #[test]
    fn test_dumbbell_separates_and_matches_ends() {
        let config = SampleConfig::from_head_diameter(0.4);
        // two 6x6 mm plates joined by a long 0.6 mm neck
        let island = ExPolygon::new(Polygon::from_points(vec![
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
        ]));
        let (thin, thick) = separate(&island, &config);
        assert_eq!(thin.len(), 1, "neck should form one thin part");
        assert_eq!(thick.len(), 2, "plates should form two thick parts");
        assert_eq!(thin[0].ends.len(), 2);
        for part in &thick {
            assert_eq!(part.ends.len(), 1);
        }
        // no middle part can survive; ends are sorted by edge id
        let ends = &thin[0].ends;
        assert!(ends[0].edge <= ends[1].edge);
    }
}
