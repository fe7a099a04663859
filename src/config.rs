//! Tunable parameters for palette generation.
//!
//! With the `serde` feature enabled a config can be loaded from JSON. Missing fields take their
//! default values:
//!
//! ```json
//! { "maximum_color_count": 24, "resize": { "max_dimension": 192 } }
//! ```

use crate::{
    color_cut_quantizer::{validate_word_width, DEFAULT_QUANTIZE_WORD_WIDTH},
    error::Result,
    DEFAULT_CALCULATE_NUMBER_COLORS, DEFAULT_RESIZE_IMAGE_AREA,
};

/// Parameters used when generating a palette from an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GenerationConfig {
    /// The maximum number of colors the quantization step produces.
    ///
    /// Good values depend on the source image. For landscapes, good values are in the range 10-16.
    /// For images which are largely made up of people's faces this should be increased to ~24.
    pub maximum_color_count: usize,
    /// How the image is scaled down before quantization.
    pub resize: Resize,
    /// Bits per channel kept when quantizing pixels, between 1 and 8.
    pub quantize_word_width: u32,
}

/// How an image is scaled down before quantization.
///
/// Scaling has a large effect on processing time. The smaller the image, the more detail is lost
/// and the less precise the color selection becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Resize {
    /// Use the image as-is.
    Disabled,
    /// Scale images with a larger area down so their area matches this many pixels.
    Area(u32),
    /// Scale images whose longest side is larger down so the longest side matches this.
    MaxDimension(u32),
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<()> {
        validate_word_width(self.quantize_word_width)
    }

    /// Parse and validate a config from JSON.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            maximum_color_count: DEFAULT_CALCULATE_NUMBER_COLORS,
            resize: Resize::default(),
            quantize_word_width: DEFAULT_QUANTIZE_WORD_WIDTH,
        }
    }
}

impl Resize {
    /// The factor to scale a `width` x `height` image by, or `None` if it should be kept as-is.
    pub(crate) fn scale_ratio(self, width: u32, height: u32) -> Option<f64> {
        match self {
            Resize::Area(area) if area > 0 => {
                let image_area = width as f64 * height as f64;
                (image_area > area as f64).then(|| (area as f64 / image_area).sqrt())
            }
            Resize::MaxDimension(dimension) if dimension > 0 => {
                let max_dimension = width.max(height);
                (max_dimension > dimension).then(|| dimension as f64 / max_dimension as f64)
            }
            _ => None,
        }
    }
}

impl Default for Resize {
    fn default() -> Self {
        Resize::Area(DEFAULT_RESIZE_IMAGE_AREA)
    }
}
