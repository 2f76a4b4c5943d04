//! Support point records carried across layers.

use super::config::{CurvePoint, SupportPointGeneratorConfig};
use crate::geometry::Point;
use crate::{scale, Coord};
use serde::{Deserialize, Serialize};

/// Why a support point was placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupportPointKind {
    /// Sampled on a newly emerging island or peninsula.
    Island,
    /// Sampled on an uncovered overhang boundary.
    Slope,
}

/// A finished 3D support point (mm coordinates).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupportPoint {
    /// Position on (or near) the model surface, in mm.
    pub pos: [f32; 3],
    /// Radius of the support head front, in mm.
    pub head_front_radius: f32,
    pub kind: SupportPointKind,
}

/// A support point during layer processing, with its coverage state.
#[derive(Clone, Debug)]
pub struct LayerSupportPoint {
    pub support: SupportPoint,
    /// 2D projection of the support position on its birth layer.
    pub position_on_layer: Point,
    /// Hint for angled support tips; `(1, 0)` placeholder on slope supports.
    pub direction_to_mass: Point,
    /// Progress through the radius curve.
    pub radius_curve_index: usize,
    /// Horizontal coverage reach at the layer currently being processed.
    /// Non-decreasing over layers, clamped by the final curve sample.
    pub current_radius: Coord,
}

impl LayerSupportPoint {
    /// Create a fresh support at a 2D layer position.
    pub fn new(
        position: Point,
        print_z: f32,
        kind: SupportPointKind,
        direction_to_mass: Point,
        config: &SupportPointGeneratorConfig,
        curve: &[CurvePoint],
    ) -> Self {
        Self {
            support: SupportPoint {
                pos: [
                    crate::unscale(position.x) as f32,
                    crate::unscale(position.y) as f32,
                    print_z,
                ],
                head_front_radius: config.head_diameter / 2.0,
                kind,
            },
            position_on_layer: position,
            direction_to_mass,
            radius_curve_index: 0,
            current_radius: scale(curve[0].0 as f64),
        }
    }

    /// Whether this support's coverage circle contains `point`.
    pub fn covers(&self, point: &Point) -> bool {
        let r = self.current_radius;
        let dp = self.position_on_layer - *point;
        if dp.x.abs() > r || dp.y.abs() > r {
            return false;
        }
        let r2 = (r as i128) * (r as i128);
        dp.length_squared() < r2
    }
}

/// Advance the coverage radius of every support for a layer at `layer_z`.
///
/// Walks each support's curve index forward past segments fully below the
/// support's height difference, then interpolates inside the current
/// segment. The result is scaled by the inverse relative density.
pub fn prepare_supports_for_layer(
    supports: &mut [LayerSupportPoint],
    layer_z: f32,
    curve: &[CurvePoint],
    config: &SupportPointGeneratorConfig,
) {
    let set_radius = |support: &mut LayerSupportPoint, radius: f32| {
        let radius = if (config.density_relative - 1.0).abs() > 1e-4 {
            radius / config.density_relative
        } else {
            radius
        };
        support.current_radius = scale(radius as f64);
    };

    for support in supports.iter_mut() {
        if support.radius_curve_index + 1 >= curve.len() {
            continue; // already at the maximal radius
        }
        let diff_z = layer_z - support.support.pos[2];
        let index = &mut support.radius_curve_index;
        while *index + 1 < curve.len() && diff_z > curve[*index + 1].1 {
            *index += 1;
        }
        if *index + 1 >= curve.len() {
            let last = curve.last().expect("curve has samples");
            set_radius(support, last.0);
            continue;
        }
        let a = curve[*index];
        let b = curve[*index + 1];
        debug_assert!(a.1 <= diff_z && diff_z <= b.1);
        let t = if b.1 > a.1 { (diff_z - a.1) / (b.1 - a.1) } else { 1.0 };
        set_radius(support, a.0 + t * (b.0 - a.0));
    }
}
