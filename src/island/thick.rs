//! Sampling of thick island parts.
//!
//! The field border is decomposed into maximal runs of outline lines
//! separated by chords; each run gets points spread along its inset image.
//! The inset interior is covered by an equilateral triangular grid, rotated
//! into a canonical frame first so the pattern does not depend on the
//! island's orientation.

use std::rc::Rc;

use super::field::Field;
use super::point::{OutlineRestriction, SupportIslandPoint};
use super::SampleConfig;
use crate::geometry::{ExPolygon, Line, Point, Points, Polygon};
use crate::{Coord, CoordF};

/// Place support points on the border runs and inside the field.
pub fn sample_field(field: &Field, config: &SampleConfig, results: &mut Vec<SupportIslandPoint>) {
    sample_outline(field, config, results);

    // the inset polygon outlives sampling; inner points share it to
    // validate their moves during alignment
    let inner = Rc::new(field.inner.clone());
    for point in sample_expolygon_with_centering(inner.as_ref(), config.thick_inner_max_distance) {
        results.push(SupportIslandPoint::inner(point, Rc::clone(&inner)));
    }
}

/// Sample the border outline runs of a field.
fn sample_outline(field: &Field, config: &SampleConfig, results: &mut Vec<SupportIslandPoint>) {
    if field.inner.contour.len() < 3 {
        return; // no inset to slide along
    }

    let sample_distance = config.thick_outline_max_distance as CoordF;
    let max_align_distance = config.max_align_distance;

    let mut emit_run = |lines: Vec<Line>, circular: bool, results: &mut Vec<SupportIslandPoint>| {
        if lines.is_empty() {
            return;
        }
        let restriction = Rc::new(OutlineRestriction::new(lines, circular, max_align_distance));
        let total = restriction.total_length();
        // center the samples within the run
        let mut last_support = total.min(sample_distance) / 2.0;
        for index in 0..restriction.lines.len() {
            let line_length = restriction.length(index);
            while last_support + line_length > sample_distance {
                let ratio = (sample_distance - last_support) / line_length;
                results.push(SupportIslandPoint::outline_sequence(
                    Rc::clone(&restriction),
                    index,
                    ratio.clamp(0.0, 1.0),
                ));
                last_support -= sample_distance;
            }
            last_support += line_length;
        }
    };

    let mut border_offset = 0;
    let mut inner_offset = 0;
    sample_ring(
        &field.border.contour,
        &field.inner.contour,
        border_offset,
        inner_offset,
        field,
        &mut emit_run,
        results,
    );
    border_offset += field.border.contour.len();
    inner_offset += field.inner.contour.len();

    if field.border.holes.len() != field.inner.holes.len() {
        // insetting removed a hole; the remaining rings cannot be paired
        return;
    }
    for (border_hole, inner_hole) in field.border.holes.iter().zip(&field.inner.holes) {
        sample_ring(
            border_hole,
            inner_hole,
            border_offset,
            inner_offset,
            field,
            &mut emit_run,
            results,
        );
        border_offset += border_hole.len();
        inner_offset += inner_hole.len();
    }
}

/// Decompose one border ring into outline runs and emit samples on each.
fn sample_ring(
    border_ring: &Polygon,
    inner_ring: &Polygon,
    border_offset: usize,
    inner_offset: usize,
    field: &Field,
    emit_run: &mut dyn FnMut(Vec<Line>, bool, &mut Vec<SupportIslandPoint>),
    results: &mut Vec<SupportIslandPoint>,
) {
    let n = border_ring.len();
    if inner_ring.is_empty() || n == 0 {
        return;
    }

    let first_change_index = (0..n).find(|i| !field.is_outline[i + border_offset]);
    let inner_lines = inner_ring.lines();

    // a pure outline ring wraps around, one circular run
    let Some(first_change_index) = first_change_index else {
        emit_run(inner_lines, true, results);
        return;
    };

    let inner_invalid = inner_lines.len();
    let mut inner_first = inner_invalid;
    let mut inner_last = inner_invalid;
    let stop_index = if first_change_index == 0 {
        n
    } else {
        first_change_index
    };

    // first outline index after the change
    let mut index = first_change_index;
    loop {
        index += 1;
        if index == n {
            index = 0;
            if first_change_index == 0 {
                return; // the whole ring is chord, nothing to support
            }
        }
        if field.is_outline[index + border_offset] {
            break;
        }
    }

    let mut run = |first: usize, last: usize, results: &mut Vec<SupportIslandPoint>| {
        let end = last + 1;
        let lines: Vec<Line> = if first > last {
            inner_lines[first..]
                .iter()
                .chain(&inner_lines[..end])
                .copied()
                .collect()
        } else {
            inner_lines[first..end].to_vec()
        };
        emit_run(lines, false, results);
    };

    loop {
        if index == stop_index {
            break;
        }
        if index == n {
            index = 0;
            if index == stop_index {
                break;
            }
        }
        let flat = index + border_offset;
        if !field.is_outline[flat] {
            if inner_first != inner_invalid {
                run(inner_first, inner_last, results);
                inner_first = inner_invalid;
                inner_last = inner_invalid;
            }
        } else if let Some(&inner_flat) = field.field_to_inner.get(&flat) {
            if inner_flat >= inner_offset && inner_flat - inner_offset < inner_lines.len() {
                inner_last = inner_flat - inner_offset;
                if inner_first == inner_invalid {
                    inner_first = inner_last;
                }
            }
        }
        index += 1;
    }
    if inner_first != inner_invalid {
        run(inner_first, inner_last, results);
    }
}

/// Uniformly sample an ExPolygon interior with an equilateral triangular
/// grid of the given side length.
pub fn sample_expolygon(expoly: &ExPolygon, triangle_side: Coord) -> Points {
    let points = expoly.contour.points();
    if points.is_empty() {
        return Points::new();
    }
    let min_y = points.iter().map(|p| p.y).min().expect("contour points");
    let max_y = points.iter().map(|p| p.y).max().expect("contour points");

    let half_side = triangle_side / 2;
    let triangle_height =
        (triangle_side as CoordF * 3f64.sqrt() / 2.0).round() as Coord;

    // scanline over non-horizontal boundary lines sorted by lower y
    let mut lines: Vec<Line> = expoly
        .to_lines()
        .into_iter()
        .filter(|l| l.a.y != l.b.y)
        .map(|l| if l.a.y > l.b.y { l.reverse() } else { l })
        .collect();
    lines.sort_by_key(|l| l.a.y);

    let mut result = Points::new();
    let mut start_index = 0;
    let mut is_odd = false;
    let mut y = min_y + triangle_height / 2;
    while y < max_y {
        is_odd = !is_odd;
        let mut intersections: Vec<Coord> = Vec::new();
        let mut increase_start_index = true;
        for line in &lines[start_index..] {
            if line.b.y <= y {
                if increase_start_index {
                    start_index += 1;
                }
                continue;
            }
            increase_start_index = false;
            if line.a.y >= y {
                break;
            }
            let y_range = (line.b.y - line.a.y) as CoordF;
            let x_range = (line.b.x - line.a.x) as CoordF;
            let ratio = (y - line.a.y) as CoordF / y_range;
            intersections.push(line.a.x + (x_range * ratio) as Coord);
        }
        intersections.sort_unstable();
        for span in intersections.chunks_exact(2) {
            let mut start_x = span[0];
            let end_x = span[1];
            if is_odd {
                start_x += half_side;
            }
            let mut div = start_x / triangle_side;
            if start_x > 0 {
                div += 1;
            }
            let mut x = div * triangle_side;
            if is_odd {
                x -= half_side;
            }
            while x < end_x {
                result.push(Point::new(x, y));
                x += triangle_side;
            }
        }
        y += triangle_height;
    }
    result
}

/// Sample with the grid anchored to the polygon: the pattern is aligned to
/// the vector from the contour centroid to its farthest vertex, so rotating
/// the input rotates the samples with it.
pub fn sample_expolygon_with_centering(expoly: &ExPolygon, triangle_side: Coord) -> Points {
    if expoly.contour.is_empty() {
        return Points::new();
    }
    let center = expoly.contour.centroid();
    let mut extreme = expoly.contour.points()[0];
    let mut extreme_distance = -1i128;
    for point in expoly.contour.points() {
        let distance = (*point - center).length_squared();
        if distance > extreme_distance {
            extreme_distance = distance;
            extreme = *point;
        }
    }
    let angle = ((extreme.y - center.y) as CoordF).atan2((extreme.x - center.x) as CoordF);

    // rotate the anchor direction onto the x axis, sample, rotate back
    let mut rotated = expoly.clone();
    rotated.rotate_around(-angle, center);
    let mut samples = sample_expolygon(&rotated, triangle_side);
    for point in &mut samples {
        *point = point.rotate_around(angle, center);
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::island::field::create_peninsula_field;
    use crate::scale;

    fn square(size: f64) -> ExPolygon {
        ExPolygon::new(Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(scale(size), 0),
            Point::new(scale(size), scale(size)),
            Point::new(0, scale(size)),
        ]))
    }

    #[test]
    fn test_grid_density() {
        let island = square(10.0);
        let side = scale(2.0);
        let samples = sample_expolygon(&island, side);
        // one sample per triangle cell: area / (side * height)
        let height = side as f64 * 3f64.sqrt() / 2.0;
        let expected = (scale(10.0) as f64 * scale(10.0) as f64) / (side as f64 * height);
        assert!(samples.len() as f64 > expected * 0.7);
        assert!((samples.len() as f64) < expected * 1.3);
        for p in &samples {
            assert!(island.contains(p));
        }
    }

    #[test]
    fn test_centering_rotates_with_input() {
        let island = square(7.0);
        let side = scale(2.0);
        let base = sample_expolygon_with_centering(&island, side);

        let angle = 0.7;
        let mut rotated = island.clone();
        rotated.rotate(angle);
        let rotated_samples = sample_expolygon_with_centering(&rotated, side);
        assert_eq!(base.len(), rotated_samples.len());
    }

    #[test]
    fn test_outline_samples_centered_on_runs() {
        let config = SampleConfig::from_head_diameter(0.4);
        let island = square(8.0);
        let is_outline = vec![true; 4];
        let field = create_peninsula_field(island, is_outline, &config).unwrap();
        let mut results = Vec::new();
        sample_outline(&field, &config, &mut results);
        assert!(!results.is_empty());
        // every outline sample sits on the inset border
        let inner_lines = field.inner.to_lines();
        for p in &results {
            let on_border = inner_lines
                .iter()
                .any(|l| l.distance_to_point(&p.point) < 10.0);
            assert!(on_border);
        }
        // circumference / distance, with the run-centering start offset
        let circumference = 4.0 * (field.inner.contour.points()[1].distance(&field.inner.contour.points()[0]));
        let expected = (circumference / config.thick_outline_max_distance as f64).floor();
        assert!((results.len() as f64 - expected).abs() <= 1.0);
    }
}
