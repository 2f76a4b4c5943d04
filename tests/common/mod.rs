//! Island shape factory shared by the integration tests.
#![allow(dead_code)]

use support_gen::clipper;
use support_gen::{scale, ExPolygon, Point, Polygon};

/// Axis-aligned rectangle centered at the origin (sizes in mm).
pub fn create_rect(width: f64, height: f64) -> Polygon {
    Polygon::from_points(vec![
        Point::new_scale(-width / 2.0, -height / 2.0),
        Point::new_scale(width / 2.0, -height / 2.0),
        Point::new_scale(width / 2.0, height / 2.0),
        Point::new_scale(-width / 2.0, height / 2.0),
    ])
}

/// Square centered at the origin.
pub fn create_square(size: f64) -> Polygon {
    create_rect(size, size)
}

/// Equilateral triangle with the given side, centered at the origin.
pub fn create_equilateral_triangle(side: f64) -> Polygon {
    let height = side * 3f64.sqrt() / 2.0;
    Polygon::from_points(vec![
        Point::new_scale(-side / 2.0, -height / 3.0),
        Point::new_scale(side / 2.0, -height / 3.0),
        Point::new_scale(0.0, 2.0 * height / 3.0),
    ])
}

/// Regular polygon approximating a circle.
pub fn create_circle(radius: f64, segments: usize) -> Polygon {
    Polygon::from_points(
        (0..segments)
            .map(|i| {
                let angle = 2.0 * std::f64::consts::PI * i as f64 / segments as f64;
                Point::new_scale(radius * angle.cos(), radius * angle.sin())
            })
            .collect(),
    )
}

/// Square with one centered square hole rotated by 45 degrees.
pub fn create_square_with_hole(size: f64, hole_size: f64) -> ExPolygon {
    let mut hole = create_square(hole_size);
    hole.rotate(std::f64::consts::FRAC_PI_4);
    hole.reverse();
    ExPolygon::with_holes(create_square(size), vec![hole])
}

/// Square with four square holes in its quadrants.
pub fn create_square_with_4holes(size: f64, hole_size: f64) -> ExPolygon {
    let quarter = scale(size / 4.0);
    let mut holes = Vec::new();
    for (sx, sy) in [(1, 1), (-1, 1), (1, -1), (-1, -1)] {
        let mut hole = create_square(hole_size);
        hole.reverse();
        hole.translate(Point::new(sx * quarter, sy * quarter));
        holes.push(hole);
    }
    ExPolygon::with_holes(create_square(size), holes)
}

/// Annulus: circle boundary of the given center radius and stroke width.
pub fn create_disc(radius: f64, width: f64, segments: usize) -> ExPolygon {
    let mut hole = create_circle(radius - width / 2.0, segments);
    hole.reverse();
    ExPolygon::with_holes(create_circle(radius + width / 2.0, segments), vec![hole])
}

/// Two crossing bars forming a plus sign.
pub fn create_cross(length: f64, width: f64) -> ExPolygon {
    let horizontal = ExPolygon::new(create_rect(length, width));
    let vertical = ExPolygon::new(create_rect(width, length));
    let union = clipper::union_ex(&[horizontal, vertical]);
    assert_eq!(union.len(), 1);
    union.into_iter().next().unwrap()
}

/// Jagged skyline polygon stressing the longest-path search.
pub fn create_mountains(size: f64) -> ExPolygon {
    ExPolygon::new(Polygon::from_points(vec![
        Point::new_scale(0.0, 0.0),
        Point::new_scale(size, 0.0),
        Point::new_scale(5.0 * size / 6.0, size),
        Point::new_scale(4.0 * size / 6.0, size / 6.0),
        Point::new_scale(3.0 * size / 7.0, 2.0 * size),
        Point::new_scale(2.0 * size / 7.0, size / 6.0),
        Point::new_scale(size / 7.0, size),
    ]))
}

/// Uniform triangular check grid over the island interior.
pub fn rasterize(island: &ExPolygon, distance: f64) -> Vec<Point> {
    let bb = island.bounding_box();
    let step = scale(distance);
    let row_height = (step as f64 * 3f64.sqrt() / 2.0) as i64;
    let mut result = Vec::new();
    let mut odd = false;
    let mut y = bb.min.y;
    while y <= bb.max.y {
        let mut x = bb.min.x + if odd { step / 2 } else { 0 };
        while x <= bb.max.x {
            let p = Point::new(x, y);
            if island.contains(&p) {
                result.push(p);
            }
            x += step;
        }
        odd = !odd;
        y += row_height;
    }
    result
}
