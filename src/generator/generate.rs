//! The bottom-to-top support generation loop.
//!
//! Layers are processed in ascending z. Every part either inherits the
//! coverage index of the parts below it or, as a fresh island, gets a new
//! one filled by island sampling. Peninsulas and uncovered overhang samples
//! add further points on top of the inherited coverage.

use super::config::SupportPointGeneratorConfig;
use super::layers::{Layer, LayerPart, SupportPointGeneratorData};
use super::near_points::NearPoints;
use super::points::{prepare_supports_for_layer, LayerSupportPoint, SupportPointKind};
use crate::clipper;
use crate::geometry::Point;
use crate::island::{uniform_support_island, uniform_support_peninsula, SupportIslandPoint};
use crate::{scale, CancelFn, Coord, Error, Result, StatusFn};

/// Generate the support points for prepared layer data.
///
/// The returned vector is the shared storage all NearPoints indices pointed
/// into; it is ordered by layer, then by part, then by sampling order.
pub fn generate_support_points(
    data: &SupportPointGeneratorData,
    config: &SupportPointGeneratorConfig,
    cancel: CancelFn,
    status: StatusFn,
) -> Result<Vec<LayerSupportPoint>> {
    config.validate()?;
    let curve = config.curve();

    // the widest circle any support can cover bounds every nearest query
    let maximal_radius: Coord = scale(curve.last().expect("curve has samples").0 as f64);

    let layers = &data.layers;
    let increment = 100.0 / layers.len() as f64;
    let mut progress = 0.0;
    let mut progress_int = 0;

    let mut result: Vec<LayerSupportPoint> = Vec::new();
    // grid index == part index within the previous layer
    let mut prev_grids: Vec<NearPoints> = Vec::new();

    for (layer_id, layer) in layers.iter().enumerate() {
        prepare_supports_for_layer(&mut result, layer.print_z, &curve, config);

        let mut grids: Vec<NearPoints> = Vec::with_capacity(layer.parts.len());
        for part in &layer.parts {
            if part.prev_parts.is_empty() {
                // a new island needs support, no doubt
                let mut near_points = NearPoints::new();
                support_island(part, layer.print_z, config, &curve, &mut result, &mut near_points);
                grids.push(near_points);
                continue;
            }

            debug_assert!(layer_id != 0);
            let prev_layer = &layers[layer_id - 1];
            let mut near_points =
                inherit_near_points(prev_layer, part, &mut prev_grids, &result);
            remove_supports_out_of_part(&mut near_points, part, config, &result);
            for peninsula in &part.peninsulas {
                let samples = match uniform_support_peninsula(peninsula, &config.island_configuration)
                {
                    Ok(samples) => samples,
                    Err(error) => {
                        log::warn!("peninsula sampling failed: {error}");
                        Vec::new()
                    }
                };
                add_island_samples(
                    &samples,
                    layer.print_z,
                    config,
                    &curve,
                    &mut result,
                    &mut near_points,
                );
            }
            support_part_overhangs(
                part,
                layer.print_z,
                config,
                &curve,
                maximal_radius,
                &mut result,
                &mut near_points,
            );
            grids.push(near_points);
        }
        prev_grids = grids;

        if cancel() {
            return Err(Error::Cancelled);
        }
        let old_progress_int = progress_int;
        progress += increment;
        progress_int = progress.round() as i32;
        if old_progress_int < progress_int {
            status(progress_int);
        }
    }
    Ok(result)
}

/// Take over (or clone) the NearPoints of the parts below, merged into one.
///
/// A below part feeding a single part above hands its tree over; one
/// feeding several parts is cloned so each inheritor has its own index over
/// the shared storage.
fn inherit_near_points(
    prev_layer: &Layer,
    part: &LayerPart,
    prev_grids: &mut [NearPoints],
    storage: &[LayerSupportPoint],
) -> NearPoints {
    let take_or_clone = |grids: &mut [NearPoints], below_index: usize| {
        if prev_layer.parts[below_index].next_parts.len() == 1 {
            std::mem::take(&mut grids[below_index])
        } else {
            grids[below_index].clone()
        }
    };

    let first = part.prev_parts[0];
    let mut near_points = take_or_clone(prev_grids, first);
    for &below_index in &part.prev_parts[1..] {
        let other = take_or_clone(prev_grids, below_index);
        near_points.merge(storage, other);
    }
    near_points
}

/// Supports outside the part (grown by `removing_delta`) stop covering it.
fn remove_supports_out_of_part(
    near_points: &mut NearPoints,
    part: &LayerPart,
    config: &SupportPointGeneratorConfig,
    storage: &[LayerSupportPoint],
) {
    let extended = clipper::offset_expolygon(
        &part.shape,
        config.removing_delta,
        clipper::OffsetJoinType::Square,
    );
    near_points.remove_out_of(storage, &extended);
}

/// Sample a fresh island and register every point.
fn support_island(
    part: &LayerPart,
    print_z: f32,
    config: &SupportPointGeneratorConfig,
    curve: &[(f32, f32)],
    storage: &mut Vec<LayerSupportPoint>,
    near_points: &mut NearPoints,
) {
    let samples = match uniform_support_island(&part.shape, &config.island_configuration) {
        Ok(samples) => samples,
        Err(error) => {
            // a degenerate island must not abort the layer
            log::warn!("island sampling failed: {error}");
            Vec::new()
        }
    };
    add_island_samples(&samples, print_z, config, curve, storage, near_points);
}

fn add_island_samples(
    samples: &[SupportIslandPoint],
    print_z: f32,
    config: &SupportPointGeneratorConfig,
    curve: &[(f32, f32)],
    storage: &mut Vec<LayerSupportPoint>,
    near_points: &mut NearPoints,
) {
    for sample in samples {
        let point = LayerSupportPoint::new(
            sample.point,
            print_z,
            SupportPointKind::Island,
            Point::new(0, 0), // supported from below
            config,
            curve,
        );
        let index = storage.len();
        storage.push(point);
        near_points.add(storage, index);
    }
}

/// Spawn slope supports on overhang samples no existing support covers.
fn support_part_overhangs(
    part: &LayerPart,
    print_z: f32,
    config: &SupportPointGeneratorConfig,
    curve: &[(f32, f32)],
    maximal_radius: Coord,
    storage: &mut Vec<LayerSupportPoint>,
    near_points: &mut NearPoints,
) {
    for &sample in &part.samples {
        let supported = near_points.exist_true_in_radius(
            storage,
            sample,
            maximal_radius,
            |support| support.covers(&sample),
        );
        if supported {
            continue;
        }
        let point = LayerSupportPoint::new(
            sample,
            print_z,
            SupportPointKind::Slope,
            Point::new(1, 0), // placeholder until angled heads exist
            config,
            curve,
        );
        let index = storage.len();
        storage.push(point);
        near_points.add(storage, index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::config::PrepareSupportConfig;
    use crate::generator::layers::prepare_generator_data;
    use crate::geometry::{ExPolygon, Polygon};
    use crate::scale;

    fn square(size: f64, x: f64) -> ExPolygon {
        let mut p = Polygon::from_points(vec![
            Point::new_scale(0.0, 0.0),
            Point::new_scale(size, 0.0),
            Point::new_scale(size, size),
            Point::new_scale(0.0, size),
        ]);
        p.translate(Point::new_scale(x, 0.0));
        ExPolygon::new(p)
    }

    fn generate(slices: Vec<Vec<ExPolygon>>, heights: Vec<f32>) -> Vec<LayerSupportPoint> {
        let data = prepare_generator_data(
            slices,
            &heights,
            &PrepareSupportConfig::default(),
            &|| false,
            &|_| {},
        )
        .unwrap();
        generate_support_points(
            &data,
            &SupportPointGeneratorConfig::default(),
            &|| false,
            &|_| {},
        )
        .unwrap()
    }

    #[test]
    fn test_first_layer_island_supported() {
        let points = generate(vec![vec![square(10.0, 0.0)]], vec![0.1]);
        assert!(!points.is_empty());
        for p in &points {
            assert_eq!(p.support.kind, SupportPointKind::Island);
            assert!((p.support.pos[2] - 0.1).abs() < 1e-6);
        }
    }

    #[test]
    fn test_shifted_layer_emits_slope_points() {
        let points = generate(
            vec![vec![square(10.0, 0.0)], vec![square(10.0, 1.0)]],
            vec![0.1, 0.2],
        );
        let slopes: Vec<_> = points
            .iter()
            .filter(|p| p.support.kind == SupportPointKind::Slope)
            .collect();
        assert!(!slopes.is_empty());
        for p in &slopes {
            // slope points sit on the newly exposed strip
            assert!(p.position_on_layer.x >= scale(10.0) - scale(0.01));
            assert_eq!(p.direction_to_mass, Point::new(1, 0));
            assert!((p.support.pos[2] - 0.2).abs() < 1e-6);
        }
    }

    #[test]
    fn test_stable_second_layer_adds_nothing() {
        let one = generate(vec![vec![square(10.0, 0.0)]], vec![0.1]);
        let two = generate(
            vec![vec![square(10.0, 0.0)], vec![square(10.0, 0.0)]],
            vec![0.1, 0.2],
        );
        assert_eq!(one.len(), two.len());
    }

    #[test]
    fn test_status_reaches_hundred() {
        let data = prepare_generator_data(
            vec![vec![square(5.0, 0.0)], vec![square(5.0, 0.0)]],
            &[0.1, 0.2],
            &PrepareSupportConfig::default(),
            &|| false,
            &|_| {},
        )
        .unwrap();
        let last = std::sync::atomic::AtomicI32::new(0);
        generate_support_points(
            &data,
            &SupportPointGeneratorConfig::default(),
            &|| false,
            &|p| last.store(p, std::sync::atomic::Ordering::Relaxed),
        )
        .unwrap();
        assert_eq!(last.load(std::sync::atomic::Ordering::Relaxed), 100);
    }

    #[test]
    fn test_cancel_propagates() {
        let data = prepare_generator_data(
            vec![vec![square(5.0, 0.0)]],
            &[0.1],
            &PrepareSupportConfig::default(),
            &|| false,
            &|_| {},
        )
        .unwrap();
        let result = generate_support_points(
            &data,
            &SupportPointGeneratorConfig::default(),
            &|| true,
            &|_| {},
        );
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
