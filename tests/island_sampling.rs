//! End-to-end checks of island sampling over the classic island zoo.

mod common;

use common::*;
use support_gen::island::to_points;
use support_gen::{scale, uniform_support_island, ExPolygon, PointType, SampleConfig};

fn sample(island: &ExPolygon, config: &SampleConfig) -> Vec<support_gen::SupportIslandPoint> {
    uniform_support_island(island, config).expect("sampling succeeds")
}

fn assert_points_inside(island: &ExPolygon, points: &[support_gen::SupportIslandPoint]) {
    for p in points {
        // allow boundary contact from outline samples after rounding
        let inside = island.contains(&p.point)
            || island
                .to_lines()
                .iter()
                .any(|l| l.distance_to_point(&p.point) < 100.0);
        assert!(inside, "{:?} escaped the island", p);
    }
}

fn assert_no_duplicates(points: &[support_gen::SupportIslandPoint]) {
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            assert!(
                points[i].point != points[j].point,
                "duplicate support at {:?}",
                points[i].point
            );
        }
    }
}

#[test]
fn small_triangle_gets_single_point() {
    let config = SampleConfig::from_head_diameter(0.4);
    let island = ExPolygon::new(create_equilateral_triangle(1.0));
    let points = sample(&island, &config);
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].point_type, PointType::OneCenterPoint);
    assert_points_inside(&island, &points);
}

#[test]
fn square_with_generous_one_point_limit() {
    let mut config = SampleConfig::from_head_diameter(0.4);
    // diagonal skeleton of a 3 mm square stays below twice its size
    config.max_length_for_one_support_point = scale(6.0);
    let island = ExPolygon::new(create_square(3.0));
    let points = sample(&island, &config);
    assert_eq!(points.len(), 1);
    // the single point sits at the square center
    assert!(points[0].point.distance(&support_gen::Point::zero()) < scale(0.5) as f64);
}

#[test]
fn thin_rect_two_points_near_tips() {
    let mut config = SampleConfig::from_head_diameter(0.4);
    config.thin_max_width = scale(1.0);
    config.max_length_for_two_support_points = scale(4.0);
    let island = ExPolygon::new(create_rect(3.0, 0.5));
    let points = sample(&island, &config);
    assert_eq!(points.len(), 2);
    for p in &points {
        assert_eq!(p.point_type, PointType::TwoPoints);
    }
    assert_points_inside(&island, &points);
    // symmetric around the center, spread along the long axis
    let (a, b) = (points[0].point, points[1].point);
    assert!((a.x + b.x).abs() < scale(0.3));
    assert!((a.x - b.x).abs() > scale(1.0));
}

#[test]
fn cross_is_sampled_along_all_arms() {
    let mut config = SampleConfig::from_head_diameter(0.4);
    config.thin_max_distance = scale(2.0);
    let island = create_cross(20.0, 0.6);
    let points = sample(&island, &config);
    // 40 mm of skeleton at a 2 mm step
    assert!(points.len() >= 8, "only {} points on the cross", points.len());
    assert_points_inside(&island, &points);
    assert_no_duplicates(&points);
    // every arm carries at least one support
    let arm_reach = scale(6.0);
    assert!(points.iter().any(|p| p.point.x > arm_reach));
    assert!(points.iter().any(|p| p.point.x < -arm_reach));
    assert!(points.iter().any(|p| p.point.y > arm_reach));
    assert!(points.iter().any(|p| p.point.y < -arm_reach));
}

#[test]
fn thick_disc_gets_outline_and_inner_points() {
    let config = SampleConfig::from_head_diameter(0.4);
    let island = ExPolygon::new(create_circle(5.0, 36));
    let points = sample(&island, &config);
    assert!(points.len() >= 5, "only {} points on the disc", points.len());
    assert!(points.len() <= 40);
    assert_points_inside(&island, &points);
    assert_no_duplicates(&points);
    let outline = points
        .iter()
        .filter(|p| p.point_type == PointType::ThickPartOutline)
        .count();
    let inner = points
        .iter()
        .filter(|p| p.point_type == PointType::ThickPartInner)
        .count();
    assert!(outline > 0, "no outline supports on a 10 mm disc");
    assert!(inner > 0, "no inner supports on a 10 mm disc");
}

#[test]
fn wide_square_coverage() {
    let config = SampleConfig::from_head_diameter(0.4);
    let island = ExPolygon::new(create_square(10.0));
    let points = sample(&island, &config);
    assert!(!points.is_empty());
    assert_points_inside(&island, &points);

    // every interior check point has a support within the coverage bound
    let bound = config.max_distance() as f64;
    let samples = to_points(&points);
    for check in rasterize(&island, 0.5) {
        let nearest = samples
            .iter()
            .map(|p| p.distance(&check))
            .fold(f64::MAX, f64::min);
        assert!(
            nearest <= bound,
            "check point {:?} is {:.2} mm from any support",
            check,
            nearest / 1e6
        );
    }
}

#[test]
fn island_zoo_smoke() {
    let config = SampleConfig::from_head_diameter(0.4);
    let islands: Vec<ExPolygon> = vec![
        ExPolygon::new(create_equilateral_triangle(3.0)),
        ExPolygon::new(create_square(3.0)),
        ExPolygon::new(create_rect(1.5, 3.0)),
        ExPolygon::new(create_rect(1.5, 30.0)),
        ExPolygon::new(create_circle(1.5, 10)),
        ExPolygon::new(create_circle(3.0, 20)),
        create_square_with_hole(6.0, 3.0),
        create_square_with_hole(6.0, 2.0),
        create_square_with_4holes(12.0, 2.5),
        create_disc(3.0, 0.75, 30),
        create_disc(6.0, 3.0, 12),
        create_cross(9.0, 1.0),
        create_mountains(3.0),
    ];
    for (index, island) in islands.iter().enumerate() {
        let points = sample(island, &config);
        assert!(!points.is_empty(), "island #{index} got no supports");
        assert_points_inside(island, &points);
        assert_no_duplicates(&points);
    }
}

#[test]
fn sampling_is_deterministic() {
    let config = SampleConfig::from_head_diameter(0.4);
    for island in [
        create_square_with_4holes(12.0, 2.5),
        create_cross(9.0, 1.0),
        ExPolygon::new(create_circle(5.0, 36)),
    ] {
        let a = to_points(&sample(&island, &config));
        let b = to_points(&sample(&island, &config));
        assert_eq!(a, b);
    }
}

#[test]
fn frozen_rules_are_rotation_invariant() {
    let config = SampleConfig::from_head_diameter(0.4);
    let angle = std::f64::consts::PI / 3.0;

    // one-point rule
    let island = ExPolygon::new(create_equilateral_triangle(1.0));
    let mut rotated = island.clone();
    rotated.rotate(angle);
    assert_eq!(
        sample(&island, &config).len(),
        sample(&rotated, &config).len()
    );

    // two-point rule
    let mut config2 = config.clone();
    config2.thin_max_width = scale(1.0);
    config2.max_length_for_two_support_points = scale(4.0);
    let island = ExPolygon::new(create_rect(3.0, 0.5));
    let mut rotated = island.clone();
    rotated.rotate(angle);
    let base = sample(&island, &config2);
    let turned = sample(&rotated, &config2);
    assert_eq!(base.len(), 2);
    assert_eq!(turned.len(), 2);
    // rotating the samples back lands them on the originals
    for p in &turned {
        let back = p.point.rotate(-angle);
        let closest = base
            .iter()
            .map(|q| q.point.distance(&back))
            .fold(f64::MAX, f64::min);
        assert!(closest < scale(0.2) as f64);
    }
}
