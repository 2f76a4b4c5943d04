//! # support-gen
//!
//! Support point generation for masked-stereolithography (MSLA) printing.
//!
//! Given a stack of horizontal cross-sections of a solid (each slice a set of
//! polygons-with-holes), this library decides where to place conical support
//! tips so that every overhanging region is braced against gravity during
//! resin curing while using as few supports as possible.
//!
//! The work happens in two stages:
//! - **Island sampling** ([`uniform_support_island`]) covers a single 2D
//!   region with support points. A Voronoi-skeleton analysis partitions the
//!   island into thin and thick sub-regions, each sampled by its own rule,
//!   and a centroidal relaxation spreads the points evenly.
//! - **Layer propagation** ([`generate_support_points`]) walks slices bottom
//!   to top, tracks which supports on lower layers still cover upper-layer
//!   regions through an expanding radius curve, and samples newly emerging
//!   islands, peninsulas and overhangs.
//!
//! ## Example
//!
//! ```rust,ignore
//! use support_gen::{prepare_generator_data, generate_support_points};
//! use support_gen::{PrepareSupportConfig, SupportPointGeneratorConfig};
//!
//! let data = prepare_generator_data(slices, heights,
//!     &PrepareSupportConfig::default(), &|| false, &|_| {})?;
//! let points = generate_support_points(&data,
//!     &SupportPointGeneratorConfig::default(), &|| false, &|_| {})?;
//! ```

pub mod clipper;
pub mod generator;
pub mod geometry;
pub mod island;
pub mod mesh;
pub mod voronoi;

pub use generator::{
    default_support_curve, generate_support_points, prepare_generator_data, LayerPart,
    LayerSupportPoint, NearPoints, PrepareSupportConfig, SupportPoint, SupportPointGeneratorConfig,
    SupportPointGeneratorData, SupportPointKind,
};
pub use geometry::{BoundingBox, ExPolygon, ExPolygons, Line, Lines, Point, PointF, Polygon};
pub use island::{
    uniform_support_island, uniform_support_peninsula, Peninsula, PointType, SampleConfig,
    SupportIslandPoint,
};
pub use mesh::{move_on_mesh_surface, TriangleMesh};

/// Coordinate type used throughout the generator.
/// Integer coordinates scaled by [`SCALING_FACTOR`] to avoid floating-point issues.
pub type Coord = i64;

/// Floating-point coordinate type for unscaled values (mm).
pub type CoordF = f64;

/// Scaling factor: coordinates are stored as integers scaled by this factor.
/// 1 mm = 1_000_000 units.
pub const SCALING_FACTOR: f64 = 1_000_000.0;

/// Scale a floating-point coordinate (mm) to integer units.
#[inline]
pub fn scale(v: CoordF) -> Coord {
    (v * SCALING_FACTOR).round() as Coord
}

/// Unscale an integer coordinate to floating-point (mm).
#[inline]
pub fn unscale(v: Coord) -> CoordF {
    v as CoordF / SCALING_FACTOR
}

/// Result type used throughout the generator.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for support generation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid geometry: {0}")]
    Geometry(String),

    #[error("Voronoi error: {0}")]
    Voronoi(String),

    #[error("Cancelled")]
    Cancelled,
}

/// Callback polled by long-running passes; returning `true` aborts the
/// computation with [`Error::Cancelled`].
pub type CancelFn<'a> = &'a (dyn Fn() -> bool + Sync);

/// Progress callback receiving integer percent in `0..=100`.
pub type StatusFn<'a> = &'a (dyn Fn(i32) + Sync);
