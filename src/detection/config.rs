use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Extra shape constraint applied on top of the area and solidity bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ShapeFilter {
    None,
    /// `4π·area / perimeter²` within `[min, max]`.
    Circularity { min: f64, max: f64 },
    /// Bounding box `width / height` within `[min, max]`.
    AspectRatio { min: f64, max: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ThresholdMode {
    /// One global intensity cut.
    Fixed { level: u8 },
    /// Compare each pixel with the mean of its `(2r+1)²` neighbourhood,
    /// shifted by `offset`. Copes with uneven scan illumination.
    Adaptive { block_radius: u32, offset: i16 },
}

/// Which side of the threshold counts as ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    #[default]
    DarkOnLight,
    LightOnDark,
}

/// Parameters of one detection run. Build it, call [`validate`](Self::validate)
/// (the engine does so too), and treat it as read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub min_area: f64,
    pub max_area: f64,
    pub min_solidity: f64,
    pub max_solidity: f64,
    pub shape_filter: ShapeFilter,
    pub threshold: ThresholdMode,
    pub polarity: Polarity,
    /// Gaussian pre-blur sigma; 0 disables it.
    pub blur_sigma: f32,
    /// Radius of the close-then-open cleanup; 0 disables it.
    pub morphology_radius: u8,
    /// Minimum share of the bounding box a candidate must fill.
    pub min_extent: f64,
    /// Boxes overlapping by more than this share of the smaller box are merged.
    pub overlap_fraction: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_area: 50.0,
            max_area: 5000.0,
            min_solidity: 0.3,
            max_solidity: 1.0,
            shape_filter: ShapeFilter::AspectRatio { min: 0.1, max: 10.0 },
            threshold: ThresholdMode::Fixed { level: 128 },
            polarity: Polarity::DarkOnLight,
            blur_sigma: 0.8,
            morphology_radius: 0,
            min_extent: 0.2,
            overlap_fraction: 0.5,
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<()> {
        check_range("area", self.min_area, self.max_area)?;
        if self.min_area < 0.0 {
            return Err(Error::invalid(format!("min_area must be >= 0, got {}", self.min_area)));
        }
        check_range("solidity", self.min_solidity, self.max_solidity)?;
        check_unit("min_solidity", self.min_solidity)?;
        check_unit("max_solidity", self.max_solidity)?;
        check_unit("min_extent", self.min_extent)?;
        check_unit("overlap_fraction", self.overlap_fraction)?;

        match self.shape_filter {
            ShapeFilter::None => {}
            ShapeFilter::Circularity { min, max } => {
                check_range("circularity", min, max)?;
                if min < 0.0 {
                    return Err(Error::invalid("circularity bounds must be >= 0"));
                }
            }
            ShapeFilter::AspectRatio { min, max } => {
                check_range("aspect ratio", min, max)?;
                if min < 0.0 {
                    return Err(Error::invalid("aspect ratio bounds must be >= 0"));
                }
            }
        }

        if matches!(self.threshold, ThresholdMode::Adaptive { block_radius: 0, .. }) {
            return Err(Error::invalid("adaptive block_radius must be > 0"));
        }
        if !(self.blur_sigma.is_finite() && self.blur_sigma >= 0.0) {
            return Err(Error::invalid(format!(
                "blur_sigma must be >= 0, got {}",
                self.blur_sigma
            )));
        }
        Ok(())
    }

    /// Copy with new area bounds, as the area sliders produce.
    pub fn with_area(mut self, min_area: f64, max_area: f64) -> Self {
        self.min_area = min_area;
        self.max_area = max_area;
        self
    }

    pub fn with_solidity(mut self, min_solidity: f64, max_solidity: f64) -> Self {
        self.min_solidity = min_solidity;
        self.max_solidity = max_solidity;
        self
    }

    pub fn with_threshold(mut self, threshold: ThresholdMode) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_shape_filter(mut self, shape_filter: ShapeFilter) -> Self {
        self.shape_filter = shape_filter;
        self
    }
}

fn check_range(what: &str, min: f64, max: f64) -> Result<()> {
    if min.is_nan() || max.is_nan() {
        return Err(Error::invalid(format!("{what} bounds must be numbers")));
    }
    if min > max {
        return Err(Error::invalid(format!("{what} bounds inverted: {min} > {max}")));
    }
    Ok(())
}

fn check_unit(what: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::invalid(format!("{what} must be within [0, 1], got {value}")));
    }
    Ok(())
}
