//! Island sampling configuration.

use crate::{scale, Coord, CoordF, Error, Result};
use serde::{Deserialize, Serialize};

/// Geometric tolerances and density parameters for island sampling.
///
/// All distances are in scaled units. The record is immutable during
/// sampling; validate once with [`SampleConfig::validate`] before use.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Douglas-Peucker tolerance applied to the island outline before the
    /// Voronoi skeleton is built.
    pub simplification_tolerance: Coord,

    /// Radius of the support head touching the island.
    pub head_radius: Coord,

    /// Islands whose local width stays below this are sampled as thin parts.
    pub thin_max_width: Coord,

    /// Islands whose local width exceeds this are sampled as thick parts.
    /// Must be smaller than `thin_max_width`; the band between the two is
    /// the hysteresis region.
    pub thick_min_width: Coord,

    /// Distance between samples along a thin-part skeleton.
    pub thin_max_distance: Coord,

    /// Triangular grid spacing inside thick parts.
    pub thick_inner_max_distance: Coord,

    /// Distance between samples along a thick-part outline.
    pub thick_outline_max_distance: Coord,

    /// Inset distance of the sampled field from the island outline.
    pub minimal_distance_from_outline: Coord,

    /// Maximal distance of the two-point rule samples from the island tips.
    pub maximal_distance_from_outline: Coord,

    /// Longest-path limit below which a single center point suffices.
    pub max_length_for_one_support_point: Coord,

    /// Longest-path limit below which two points suffice on a thin island.
    pub max_length_for_two_support_points: Coord,

    /// Cap for the two-point distance from the tips, as a fraction of the
    /// longest-path length. In `[0, 1]`.
    pub max_length_ratio_for_two_support_points: CoordF,

    /// Parts with a longest internal distance below this merge into their
    /// neighbors.
    pub min_part_length: Coord,

    /// Maximal number of alignment iterations.
    pub count_iteration: usize,

    /// Alignment terminates once the largest move drops below this.
    pub minimal_move: Coord,

    /// Maximal shift of outline samples along their sequence.
    pub max_align_distance: Coord,
}

impl SampleConfig {
    /// Derive a full configuration from the support-head diameter (mm).
    ///
    /// The ratios keep the sampling density proportional to the head size so
    /// small heads produce proportionally denser support fields.
    pub fn from_head_diameter(head_diameter_mm: CoordF) -> Self {
        let head_radius = scale(head_diameter_mm / 2.0);
        SampleConfig {
            simplification_tolerance: scale(0.05),
            head_radius,
            thin_max_width: 6 * head_radius,
            thick_min_width: 5 * head_radius,
            thin_max_distance: 12 * head_radius,
            thick_inner_max_distance: 12 * head_radius,
            thick_outline_max_distance: 9 * head_radius,
            minimal_distance_from_outline: head_radius,
            maximal_distance_from_outline: 4 * head_radius,
            max_length_for_one_support_point: 6 * head_radius,
            max_length_for_two_support_points: 12 * head_radius,
            max_length_ratio_for_two_support_points: 0.25,
            min_part_length: 6 * head_radius,
            count_iteration: 30,
            minimal_move: (head_radius / 4).max(1),
            max_align_distance: 9 * head_radius / 2,
        }
    }

    /// Check the sampling preconditions.
    pub fn validate(&self) -> Result<()> {
        if self.thick_min_width >= self.thin_max_width {
            return Err(Error::Config(format!(
                "thick_min_width ({}) must be below thin_max_width ({})",
                self.thick_min_width, self.thin_max_width
            )));
        }
        if self.count_iteration == 0 {
            return Err(Error::Config("count_iteration must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.max_length_ratio_for_two_support_points) {
            return Err(Error::Config(
                "max_length_ratio_for_two_support_points must lie in [0, 1]".into(),
            ));
        }
        for (name, value) in [
            ("head_radius", self.head_radius),
            ("thin_max_distance", self.thin_max_distance),
            ("thick_inner_max_distance", self.thick_inner_max_distance),
            ("thick_outline_max_distance", self.thick_outline_max_distance),
            (
                "minimal_distance_from_outline",
                self.minimal_distance_from_outline,
            ),
        ] {
            if value <= 0 {
                return Err(Error::Config(format!("{name} must be positive")));
            }
        }
        Ok(())
    }

    /// Coverage radius used to bound alignment cells.
    pub fn max_distance(&self) -> Coord {
        self.thin_max_distance
            .max(self.thick_inner_max_distance)
            .max(self.thick_outline_max_distance)
    }
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self::from_head_diameter(0.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_is_valid() {
        SampleConfig::from_head_diameter(0.4).validate().unwrap();
        SampleConfig::from_head_diameter(1.0).validate().unwrap();
    }

    #[test]
    fn test_invalid_hysteresis() {
        let mut config = SampleConfig::default();
        config.thick_min_width = config.thin_max_width;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_iterations() {
        let mut config = SampleConfig::default();
        config.count_iteration = 0;
        assert!(config.validate().is_err());
    }
}
