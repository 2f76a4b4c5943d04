//! Layer propagation configuration.

use crate::island::SampleConfig;
use crate::{Coord, Error, Result};
use serde::{Deserialize, Serialize};

/// A sample of the radius curve: `(radius_mm, height_mm)`. The radius is the
/// horizontal reach of a support head once `height_mm` of layers have cured
/// above its tip.
pub type CurvePoint = (f32, f32);

/// The fallback radius curve: a constant 5 mm reach.
pub fn default_support_curve() -> Vec<CurvePoint> {
    vec![(5.0, 0.0), (5.0, 1.0)]
}

/// Configuration of the slice preparation passes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrepareSupportConfig {
    /// Step between overhang boundary samples.
    pub discretize_overhang_step: Coord,

    /// Overhang width from which a region becomes a peninsula.
    pub peninsula_min_width: Coord,

    /// Overhang width the material holds by itself. Strictly below
    /// `peninsula_min_width`.
    pub peninsula_self_supported_width: Coord,

    /// Run the preparation passes sequentially for bit reproducibility.
    pub sequential: bool,
}

impl Default for PrepareSupportConfig {
    fn default() -> Self {
        Self {
            discretize_overhang_step: crate::scale(0.5),
            peninsula_min_width: crate::scale(2.0),
            peninsula_self_supported_width: crate::scale(0.75),
            sequential: false,
        }
    }
}

impl PrepareSupportConfig {
    pub fn validate(&self) -> Result<()> {
        if self.discretize_overhang_step <= 0 {
            return Err(Error::Config(
                "discretize_overhang_step must be positive".into(),
            ));
        }
        if self.peninsula_self_supported_width >= self.peninsula_min_width {
            return Err(Error::Config(format!(
                "peninsula_self_supported_width ({}) must be below peninsula_min_width ({})",
                self.peninsula_self_supported_width, self.peninsula_min_width
            )));
        }
        Ok(())
    }
}

/// Configuration of support point generation over prepared layers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SupportPointGeneratorConfig {
    /// Island sampling parameters.
    pub island_configuration: SampleConfig,

    /// Diameter of the support head touching the model (mm).
    pub head_diameter: f32,

    /// Relative support density; the radius curve is scaled by its inverse.
    pub density_relative: f32,

    /// Supports outside a part grown by this delta stop covering it.
    pub removing_delta: Coord,

    /// Piecewise-linear radius-over-height curve, monotone in height, at
    /// least two samples. Empty selects [`default_support_curve`].
    pub support_curve: Vec<CurvePoint>,
}

impl Default for SupportPointGeneratorConfig {
    fn default() -> Self {
        Self {
            island_configuration: SampleConfig::default(),
            head_diameter: 0.4,
            density_relative: 1.0,
            removing_delta: crate::scale(0.1),
            support_curve: default_support_curve(),
        }
    }
}

impl SupportPointGeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        self.island_configuration.validate()?;
        if self.head_diameter <= 0.0 {
            return Err(Error::Config("head_diameter must be positive".into()));
        }
        if self.density_relative <= 0.0 {
            return Err(Error::Config("density_relative must be positive".into()));
        }
        if !self.support_curve.is_empty() {
            if self.support_curve.len() < 2 {
                return Err(Error::Config(
                    "support_curve needs at least two samples".into(),
                ));
            }
            if self
                .support_curve
                .windows(2)
                .any(|pair| pair[0].1 > pair[1].1)
            {
                return Err(Error::Config("support_curve must be monotone in z".into()));
            }
        }
        Ok(())
    }

    /// The curve to use, falling back to the default on an empty input.
    pub fn curve(&self) -> Vec<CurvePoint> {
        if self.support_curve.is_empty() {
            default_support_curve()
        } else {
            self.support_curve.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        PrepareSupportConfig::default().validate().unwrap();
        SupportPointGeneratorConfig::default().validate().unwrap();
    }

    #[test]
    fn test_peninsula_widths_ordered() {
        let mut config = PrepareSupportConfig::default();
        config.peninsula_self_supported_width = config.peninsula_min_width;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_curve_monotonicity() {
        let mut config = SupportPointGeneratorConfig::default();
        config.support_curve = vec![(1.0, 0.0), (2.0, 1.0), (3.0, 0.5)];
        assert!(config.validate().is_err());
        config.support_curve = vec![(1.0, 0.0)];
        assert!(config.validate().is_err());
        config.support_curve = Vec::new();
        config.validate().unwrap();
        assert_eq!(config.curve(), default_support_curve());
    }
}
