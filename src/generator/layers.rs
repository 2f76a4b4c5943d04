//! Slice preparation: layer parts, links, overhang samples, peninsulas.
//!
//! The outer generation loop is sequential, but the preparation passes are
//! data-parallel over layers. Parallel passes only compute; their results
//! are applied to the layer vector sequentially, which keeps the output a
//! pure function of the input.

use rayon::prelude::*;

use super::config::PrepareSupportConfig;
use crate::clipper;
use crate::geometry::{BoundingBox, ExPolygon, Line, Point, Points};
use crate::island::Peninsula;
use crate::{CancelFn, Coord, CoordF, Error, Result, StatusFn};

/// One connected region of a slice.
#[derive(Debug, Clone)]
pub struct LayerPart {
    /// The region's polygon with holes.
    pub shape: ExPolygon,
    /// Cached extent of the contour.
    pub shape_extent: BoundingBox,
    /// Indices of overlapping parts on the layer below.
    pub prev_parts: Vec<usize>,
    /// Indices of overlapping parts on the layer above.
    pub next_parts: Vec<usize>,
    /// Boundary samples of the portions not covered by the layer below.
    pub samples: Points,
    /// Cantilevered sub-regions needing their own field sampling.
    pub peninsulas: Vec<Peninsula>,
}

/// All parts of one slice.
#[derive(Debug, Clone)]
pub struct Layer {
    pub print_z: f32,
    pub parts: Vec<LayerPart>,
}

/// Output of [`prepare_generator_data`], input of support generation.
#[derive(Debug, Clone, Default)]
pub struct SupportPointGeneratorData {
    pub layers: Vec<Layer>,
}

/// Grain sizes of the parallel passes, sized so tasks amortize scheduling.
const EXTENT_GRAIN: usize = 32;
const LINK_GRAIN: usize = 8;
const PENINSULA_GRAIN: usize = 8;

/// Build the per-layer data for support generation.
///
/// `slices` and `heights` run bottom to top and must have equal length.
/// The cancel callback is polled every few items of each pass.
pub fn prepare_generator_data(
    slices: Vec<Vec<ExPolygon>>,
    heights: &[f32],
    config: &PrepareSupportConfig,
    cancel: CancelFn,
    status: StatusFn,
) -> Result<SupportPointGeneratorData> {
    config.validate()?;
    if slices.is_empty() || slices.len() != heights.len() {
        return Err(Error::Geometry(format!(
            "{} slices do not match {} heights",
            slices.len(),
            heights.len()
        )));
    }
    let count = slices.len();

    // pass 1: parts and extents
    let build_layer = |(layer_id, (islands, print_z)): (usize, (Vec<ExPolygon>, f32))| {
        if layer_id % 8 == 0 && cancel() {
            return Err(Error::Cancelled);
        }
        let parts = islands
            .into_iter()
            .map(|island| LayerPart {
                shape_extent: island.bounding_box(),
                shape: island,
                prev_parts: Vec::new(),
                next_parts: Vec::new(),
                samples: Points::new(),
                peninsulas: Vec::new(),
            })
            .collect();
        Ok(Layer { print_z, parts })
    };
    let mut layers: Vec<Layer> = if config.sequential {
        slices
            .into_iter()
            .zip(heights.iter().copied())
            .enumerate()
            .map(build_layer)
            .collect::<Result<_>>()?
    } else {
        slices
            .into_par_iter()
            .zip(heights.par_iter().copied())
            .enumerate()
            .with_min_len(EXTENT_GRAIN)
            .map(build_layer)
            .collect::<Result<_>>()?
    };
    status(25);

    // pass 2: link parts of adjacent layers by extent, then real overlap
    let link_layer = |layer_id: usize| -> Result<Vec<(usize, usize)>> {
        if layer_id % 2 == 0 && cancel() {
            return Err(Error::Cancelled);
        }
        let above = &layers[layer_id].parts;
        let below = &layers[layer_id - 1].parts;
        let mut links = Vec::new();
        for (above_index, above_part) in above.iter().enumerate() {
            for (below_index, below_part) in below.iter().enumerate() {
                if !above_part.shape_extent.overlap(&below_part.shape_extent) {
                    continue;
                }
                if !clipper::polygons_overlap(
                    std::slice::from_ref(&above_part.shape),
                    std::slice::from_ref(&below_part.shape),
                ) {
                    continue;
                }
                links.push((above_index, below_index));
            }
        }
        Ok(links)
    };
    let layer_links: Vec<Vec<(usize, usize)>> = if config.sequential {
        (1..count).map(link_layer).collect::<Result<_>>()?
    } else {
        (1..count)
            .into_par_iter()
            .with_min_len(LINK_GRAIN)
            .map(link_layer)
            .collect::<Result<_>>()?
    };
    for (layer_id, links) in (1..count).zip(layer_links) {
        for (above_index, below_index) in links {
            layers[layer_id].parts[above_index].prev_parts.push(below_index);
            layers[layer_id - 1].parts[below_index].next_parts.push(above_index);
        }
    }
    status(50);

    // pass 3: sample the overhanging boundary portions
    let step = config.discretize_overhang_step as CoordF;
    let step_sq = step * step;
    let sample_layer = |layer_id: usize| -> Result<Vec<Points>> {
        if layer_id % 2 == 0 && cancel() {
            return Err(Error::Cancelled);
        }
        let below = &layers[layer_id - 1];
        Ok(layers[layer_id]
            .parts
            .iter()
            .map(|part| {
                if part.prev_parts.is_empty() {
                    Points::new() // island, sampled by the island rules
                } else {
                    sample_overhangs(part, below, step_sq)
                }
            })
            .collect())
    };
    let layer_samples: Vec<Vec<Points>> = if config.sequential {
        (1..count).map(sample_layer).collect::<Result<_>>()?
    } else {
        (1..count)
            .into_par_iter()
            .with_min_len(LINK_GRAIN)
            .map(sample_layer)
            .collect::<Result<_>>()?
    };
    for (layer_id, samples) in (1..count).zip(layer_samples) {
        for (part, part_samples) in layers[layer_id].parts.iter_mut().zip(samples) {
            part.samples = part_samples;
        }
    }
    status(75);

    // pass 4: detect peninsulas
    let peninsula_layer = |layer_id: usize| -> Result<Vec<Vec<Peninsula>>> {
        if layer_id % 16 == 0 && cancel() {
            return Err(Error::Cancelled);
        }
        let below = &layers[layer_id - 1];
        Ok(layers[layer_id]
            .parts
            .iter()
            .map(|part| {
                if part.prev_parts.is_empty() {
                    Vec::new()
                } else {
                    create_peninsulas(part, below, config)
                }
            })
            .collect())
    };
    let layer_peninsulas: Vec<Vec<Vec<Peninsula>>> = if config.sequential {
        (1..count).map(peninsula_layer).collect::<Result<_>>()?
    } else {
        (1..count)
            .into_par_iter()
            .with_min_len(PENINSULA_GRAIN)
            .map(peninsula_layer)
            .collect::<Result<_>>()?
    };
    for (layer_id, peninsulas) in (1..count).zip(layer_peninsulas) {
        for (part, part_peninsulas) in layers[layer_id].parts.iter_mut().zip(peninsulas) {
            part.peninsulas = part_peninsulas;
        }
    }
    status(100);

    Ok(SupportPointGeneratorData { layers })
}

/// Shapes of the linked parts on the layer below.
fn below_shapes<'a>(part: &LayerPart, below: &'a Layer) -> Vec<&'a ExPolygon> {
    part.prev_parts
        .iter()
        .map(|&index| &below.parts[index].shape)
        .collect()
}

fn cloned_shapes(shapes: &[&ExPolygon]) -> Vec<ExPolygon> {
    shapes.iter().map(|&s| s.clone()).collect()
}

// ============================================================================
// Overhang sampling
// ============================================================================

/// Intersection of the segment `p1..p2` with the circle around `center`,
/// where `p1` lies inside and `p2` outside or on the circle.
fn intersection_line_circle(p1: Point, p2: Point, center: Point, radius_sq: CoordF) -> Point {
    let dp = (p2 - p1).to_f64();
    let f = (p1 - center).to_f64();

    let a = dp.dot(&dp);
    let b = 2.0 * f.dot(&dp);
    let c = f.dot(&f) - radius_sq;
    let discriminant = b * b - 4.0 * a * c;
    debug_assert!(discriminant >= 0.0);
    if discriminant < 0.0 || a == 0.0 {
        return p2;
    }
    let sqrt_d = discriminant.sqrt();
    for t in [(-b - sqrt_d) / (2.0 * a), (-b + sqrt_d) / (2.0 * a)] {
        if (0.0..=1.0).contains(&t) {
            return Point::new(
                (p1.x as CoordF + t * dp.x).round() as Coord,
                (p1.y as CoordF + t * dp.y).round() as Coord,
            );
        }
    }
    p2
}

/// Uniformly sample a polyline: keep the first point, then every crossing
/// of the sampling radius from the previously kept point.
fn sample_polyline(points: &[Point], dist_sq: CoordF) -> Points {
    if points.len() < 2 {
        return Points::new();
    }
    let mut result = vec![points[0]];
    for window in points.windows(2) {
        let target = window[1];
        let mut from = window[0];
        loop {
            let last = *result.last().expect("seeded with the first point");
            let d = (target - last).to_f64();
            if d.dot(&d) <= dist_sq {
                break;
            }
            let next = intersection_line_circle(from, target, last, dist_sq);
            if next == last {
                break; // numeric stall on a degenerate segment
            }
            result.push(next);
            from = next;
        }
    }
    result
}

/// Sample the boundary portions of `part` not shared with the layer below.
///
/// Boundary points of the below shapes split each ring into covered and
/// overhanging runs; only overhanging runs are sampled.
fn sample_overhangs(part: &LayerPart, below: &Layer, dist_sq: CoordF) -> Points {
    let below_refs = below_shapes(part, below);
    debug_assert!(!below_refs.is_empty());
    let below_owned = cloned_shapes(&below_refs);
    let overhangs = clipper::diff_ex(std::slice::from_ref(&part.shape), &below_owned);
    if overhangs.is_empty() {
        return Points::new(); // the part above is smaller in its whole contour
    }

    let mut below_points: Points = below_refs
        .iter()
        .flat_map(|shape| {
            shape
                .contour
                .points()
                .iter()
                .chain(shape.holes.iter().flat_map(|h| h.points().iter()))
                .copied()
        })
        .collect();
    below_points.sort_unstable();
    let is_below_point = |p: &Point| below_points.binary_search(p).is_ok();

    let mut samples = Points::new();
    let mut sample_ring = |points: &[Point]| {
        let n = points.len();
        if n < 2 {
            return;
        }
        // first boundary point shared with the layer below, if any
        let first_shared = points.iter().position(is_below_point);
        let Some(first_shared) = first_shared else {
            // the whole ring is overhang; close it for sampling
            let mut closed = points.to_vec();
            closed.push(points[0]);
            samples.extend(sample_polyline(&closed, dist_sq));
            return;
        };
        // walk from the first shared point, collecting overhanging runs
        let mut run: Points = Points::new();
        for offset in 1..=n {
            let point = points[(first_shared + offset) % n];
            if is_below_point(&point) {
                if run.len() >= 2 {
                    samples.extend(sample_polyline(&run, dist_sq));
                }
                run.clear();
            } else {
                run.push(point);
            }
        }
        if run.len() >= 2 {
            samples.extend(sample_polyline(&run, dist_sq));
        }
    };

    for overhang in &overhangs {
        sample_ring(overhang.contour.points());
        for hole in &overhang.holes {
            sample_ring(hole.points());
        }
    }
    samples
}

// ============================================================================
// Peninsula detection
// ============================================================================

/// Below-layer boundary lines indexed by undirected angle for overlap tests.
struct BelowLines {
    lines: Vec<Line>,
    /// (angle, index into `lines`) sorted by angle.
    by_angle: Vec<(CoordF, usize)>,
}

impl BelowLines {
    fn new(shapes: &[ExPolygon]) -> Self {
        let lines: Vec<Line> = shapes.iter().flat_map(|s| s.to_lines()).collect();
        let mut by_angle: Vec<(CoordF, usize)> = lines
            .iter()
            .enumerate()
            .map(|(i, l)| (l.undirected_angle(), i))
            .collect();
        by_angle.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        Self { lines, by_angle }
    }

    /// Whether `line` overlaps some below line: nearly parallel (1e-3 rad),
    /// within 10 um perpendicular distance, with overlapping extents.
    fn exist_below(&self, line: &Line) -> bool {
        const ANGLE_EPSILON: CoordF = 1e-3;
        let parallel_epsilon = crate::scale(0.01) as CoordF;

        let matches = |candidate: &Line| -> bool {
            let d = line.direction();
            let major_x = d.x.abs() >= d.y.abs();
            let axis = |p: &Point| if major_x { p.x } else { p.y };
            let (mut lo, mut hi) = (axis(&line.a), axis(&line.b));
            if lo > hi {
                std::mem::swap(&mut lo, &mut hi);
            }
            let (mut lo2, mut hi2) = (axis(&candidate.a), axis(&candidate.b));
            if lo2 > hi2 {
                std::mem::swap(&mut lo2, &mut hi2);
            }
            if hi2 < lo || lo2 > hi {
                return false;
            }
            if (candidate.a == line.a && candidate.b == line.b)
                || (candidate.a == line.b && candidate.b == line.a)
            {
                return true;
            }
            line.perp_distance_to(&candidate.a) < parallel_epsilon
        };

        let angle = line.undirected_angle();
        let mut ranges: Vec<(CoordF, CoordF)> = Vec::with_capacity(2);
        let (low, high) = (angle - ANGLE_EPSILON, angle + ANGLE_EPSILON);
        let half_pi = std::f64::consts::FRAC_PI_2;
        if low < -half_pi {
            ranges.push((low + std::f64::consts::PI, half_pi));
            ranges.push((-half_pi, high));
        } else if high > half_pi {
            ranges.push((low, half_pi));
            ranges.push((-half_pi, high - std::f64::consts::PI));
        } else {
            ranges.push((low, high));
        }

        for (lo, hi) in ranges {
            let start = self.by_angle.partition_point(|&(a, _)| a < lo);
            for &(a, index) in &self.by_angle[start..] {
                if a > hi {
                    break;
                }
                if matches(&self.lines[index]) {
                    return true;
                }
            }
        }
        false
    }
}

/// Detect the peninsulas of one layer part.
///
/// A peninsula is the region beyond `peninsula_self_supported_width` from
/// the mainland, kept only when it reaches past `peninsula_min_width`
/// somewhere. Edges overlapping the (expanded) mainland boundary are marked
/// as non-outline so the field sampler treats them like chords.
fn create_peninsulas(
    part: &LayerPart,
    below: &Layer,
    config: &PrepareSupportConfig,
) -> Vec<Peninsula> {
    let below_owned = cloned_shapes(&below_shapes(part, below));
    let below_expanded = clipper::expand(&below_owned, config.peninsula_min_width);
    let part_slice = std::slice::from_ref(&part.shape);
    let over_peninsula = clipper::diff_ex(part_slice, &below_expanded);
    if over_peninsula.is_empty() {
        return Vec::new(); // only tiny overhangs
    }

    let below_self_supported =
        clipper::expand(&below_owned, config.peninsula_self_supported_width);
    let peninsulas_shape = clipper::diff_ex(part_slice, &below_self_supported);
    let below_lines = BelowLines::new(&below_self_supported);

    let mut peninsulas = Vec::new();
    for peninsula in peninsulas_shape {
        // wide enough somewhere?
        if clipper::intersection_ex(std::slice::from_ref(&peninsula), &over_peninsula).is_empty()
        {
            continue;
        }
        let lines = peninsula.to_lines();
        let is_outline: Vec<bool> = lines
            .iter()
            .map(|line| !below_lines.exist_below(line))
            .collect();
        peninsulas.push(Peninsula {
            unsupported_area: peninsula,
            is_outline,
        });
    }
    peninsulas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;
    use crate::scale;

    fn square(size: f64, x: f64, y: f64) -> ExPolygon {
        let mut p = Polygon::from_points(vec![
            Point::new_scale(0.0, 0.0),
            Point::new_scale(size, 0.0),
            Point::new_scale(size, size),
            Point::new_scale(0.0, size),
        ]);
        p.translate(Point::new_scale(x, y));
        ExPolygon::new(p)
    }

    fn no_cancel() -> bool {
        false
    }

    #[test]
    fn test_prepare_links_layers() {
        let slices = vec![
            vec![square(10.0, 0.0, 0.0)],
            vec![square(10.0, 1.0, 0.0)],
            vec![square(10.0, 30.0, 0.0)], // island, no overlap
        ];
        let heights = vec![0.1, 0.2, 0.3];
        let data = prepare_generator_data(
            slices,
            &heights,
            &PrepareSupportConfig::default(),
            &no_cancel,
            &|_| {},
        )
        .unwrap();
        assert_eq!(data.layers.len(), 3);
        assert_eq!(data.layers[1].parts[0].prev_parts, vec![0]);
        assert_eq!(data.layers[0].parts[0].next_parts, vec![0]);
        assert!(data.layers[2].parts[0].prev_parts.is_empty());
    }

    #[test]
    fn test_overhang_samples_on_exposed_strip() {
        let slices = vec![
            vec![square(10.0, 0.0, 0.0)],
            vec![square(10.0, 1.0, 0.0)],
        ];
        let heights = vec![0.1, 0.2];
        let data = prepare_generator_data(
            slices,
            &heights,
            &PrepareSupportConfig::default(),
            &no_cancel,
            &|_| {},
        )
        .unwrap();
        let samples = &data.layers[1].parts[0].samples;
        assert!(!samples.is_empty());
        // every sample lies on the exposed side beyond the lower square
        for p in samples {
            assert!(p.x >= scale(10.0) - scale(0.01));
        }
        // consecutive crossings respect the sampling step
        for pair in samples.windows(2) {
            assert!(pair[0].distance(&pair[1]) <= scale(0.5) as f64 + 10.0);
        }
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let slices: Vec<Vec<ExPolygon>> = (0..12)
            .map(|i| vec![square(10.0, i as f64 * 0.3, 0.0)])
            .collect();
        let heights: Vec<f32> = (0..12).map(|i| i as f32 * 0.1).collect();
        let mut config = PrepareSupportConfig::default();
        let parallel = prepare_generator_data(
            slices.clone(),
            &heights,
            &config,
            &no_cancel,
            &|_| {},
        )
        .unwrap();
        config.sequential = true;
        let sequential =
            prepare_generator_data(slices, &heights, &config, &no_cancel, &|_| {}).unwrap();
        for (a, b) in parallel.layers.iter().zip(&sequential.layers) {
            for (pa, pb) in a.parts.iter().zip(&b.parts) {
                assert_eq!(pa.samples, pb.samples);
                assert_eq!(pa.prev_parts, pb.prev_parts);
            }
        }
    }

    #[test]
    fn test_cancellation() {
        let slices = vec![vec![square(10.0, 0.0, 0.0)]];
        let heights = vec![0.1];
        let result = prepare_generator_data(
            slices,
            &heights,
            &PrepareSupportConfig::default(),
            &|| true,
            &|_| {},
        );
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_peninsula_detected() {
        // a 5 mm wide tongue sticking 6 mm out of the lower square
        let tongue = Polygon::from_points(vec![
            Point::new_scale(10.0, 2.0),
            Point::new_scale(16.0, 2.0),
            Point::new_scale(16.0, 7.0),
            Point::new_scale(10.0, 7.0),
        ]);
        let upper = {
            let union = clipper::union_ex(&[square(10.0, 0.0, 0.0), ExPolygon::new(tongue)]);
            assert_eq!(union.len(), 1);
            union.into_iter().next().unwrap()
        };
        let slices = vec![vec![square(10.0, 0.0, 0.0)], vec![upper]];
        let heights = vec![0.1, 0.2];
        let data = prepare_generator_data(
            slices,
            &heights,
            &PrepareSupportConfig::default(),
            &no_cancel,
            &|_| {},
        )
        .unwrap();
        let part = &data.layers[1].parts[0];
        assert_eq!(part.peninsulas.len(), 1);
        let peninsula = &part.peninsulas[0];
        // the peninsula covers the tongue beyond the self-supported rim
        assert!(peninsula.unsupported_area.area() > 0.0);
        // it has both outline edges and a mainland edge
        assert!(peninsula.is_outline.iter().any(|&o| o));
        assert!(peninsula.is_outline.iter().any(|&o| !o));
    }
}
