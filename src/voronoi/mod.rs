//! Voronoi skeleton of an island.
//!
//! The external segment-Voronoi diagram is reduced to a labelled graph of
//! the edges lying inside the island (a medial-axis approximation). Each
//! edge knows the island width along itself, which drives the separation of
//! thin and thick island parts.

pub mod builder;
pub mod graph;
pub mod parabola;
pub mod path;

pub use builder::create_skeleton;
pub use graph::{Edge, EdgeId, Node, NodeId, Position, VoronoiGraph};
pub use path::{
    create_longest_path, create_position_on_path, create_position_on_path_with_width,
    ends_in_distance, get_max_width, get_neighbor_edge, ExPath,
};
