//! Layer-to-layer support propagation.
//!
//! Slices are prepared into linked layer parts, then walked bottom to top:
//! coverage of already-placed supports expands with height along the radius
//! curve, while fresh islands, peninsulas and uncovered overhang samples
//! receive new points.

pub mod config;
pub mod generate;
pub mod layers;
pub mod near_points;
pub mod points;

pub use config::{
    default_support_curve, CurvePoint, PrepareSupportConfig, SupportPointGeneratorConfig,
};
pub use generate::generate_support_points;
pub use layers::{prepare_generator_data, Layer, LayerPart, SupportPointGeneratorData};
pub use near_points::NearPoints;
pub use points::{LayerSupportPoint, SupportPoint, SupportPointKind};
