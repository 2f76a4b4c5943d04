//! KD-tree over support point indices for coverage queries.
//!
//! Trees never own points; they hold indices into the shared
//! `LayerSupportPoint` vector of one generation run. Cloning a tree for a
//! part that feeds several parts above therefore does not duplicate points,
//! and merging two trees only unions their index sets.

use kiddo::{KdTree, SquaredEuclidean};

use super::points::LayerSupportPoint;
use crate::geometry::ExPolygon;
use crate::{Coord, CoordF};

/// Spatial index over a subset of the shared support point storage.
#[derive(Clone)]
pub struct NearPoints {
    indices: Vec<usize>,
    tree: KdTree<f64, 2>,
}

impl Default for NearPoints {
    fn default() -> Self {
        Self {
            indices: Vec::new(),
            tree: KdTree::new(),
        }
    }
}

fn coords(storage: &[LayerSupportPoint], index: usize) -> [CoordF; 2] {
    let p = storage[index].position_on_layer;
    [p.x as CoordF, p.y as CoordF]
}

impl NearPoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indices currently covered by this tree.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Register a support point that was appended to `storage`.
    pub fn add(&mut self, storage: &[LayerSupportPoint], index: usize) {
        self.indices.push(index);
        self.tree.add(&coords(storage, index), index as u64);
    }

    /// Whether any indexed support within `radius` of `position` satisfies
    /// the predicate.
    pub fn exist_true_in_radius(
        &self,
        storage: &[LayerSupportPoint],
        position: crate::geometry::Point,
        radius: Coord,
        predicate: impl Fn(&LayerSupportPoint) -> bool,
    ) -> bool {
        let query = [position.x as CoordF, position.y as CoordF];
        let radius_sq = (radius as CoordF) * (radius as CoordF);
        self.tree
            .within_unsorted::<SquaredEuclidean>(&query, radius_sq)
            .iter()
            .any(|neighbour| predicate(&storage[neighbour.item as usize]))
    }

    /// Drop every indexed support whose layer position lies outside all of
    /// `shapes`. Keeps coverage local to the part being processed, so an
    /// overhang above another overhang is supported again.
    pub fn remove_out_of(&mut self, storage: &[LayerSupportPoint], shapes: &[ExPolygon]) {
        let before = self.indices.len();
        self.indices.retain(|&index| {
            let p = storage[index].position_on_layer;
            shapes.iter().any(|shape| shape.contains(&p))
        });
        if self.indices.len() != before {
            self.rebuild(storage);
        }
    }

    /// Union another tree over the same storage into this one.
    pub fn merge(&mut self, storage: &[LayerSupportPoint], other: NearPoints) {
        self.indices.extend(other.indices);
        self.indices.sort_unstable();
        // two merged parents may share an ancestor (diamond case)
        self.indices.dedup();
        self.rebuild(storage);
    }

    fn rebuild(&mut self, storage: &[LayerSupportPoint]) {
        self.tree = KdTree::new();
        for &index in &self.indices {
            self.tree.add(&coords(storage, index), index as u64);
        }
    }
}

impl std::fmt::Debug for NearPoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NearPoints")
            .field("indices", &self.indices)
            .finish()
    }
}
