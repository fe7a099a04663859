//! Error types for palette generation.

use thiserror::Error;

/// Result type alias for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Contrast can only be measured against a fully opaque background.
    #[error("background color must be fully opaque, got alpha {alpha}")]
    TranslucentBackground { alpha: u8 },

    /// A palette cannot be built from an empty list of swatches.
    #[error("list of swatches is not valid: it must contain at least one swatch")]
    EmptySwatches,

    /// The requested region has no overlap with the source image.
    #[error("region {width}x{height} at ({x}, {y}) does not intersect the {image_width}x{image_height} image")]
    RegionOutsideImage {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    /// Quantized colors must fit between 1 and 8 bits per channel.
    #[error("quantize word width must be between 1 and 8 bits, got {0}")]
    InvalidWordWidth(u32),

    /// A deserialized palette refers to a swatch it doesn't have.
    #[cfg(feature = "serde")]
    #[error("palette refers to swatch {index} but has only {swatch_count} swatches")]
    SwatchIndexOutOfRange { index: usize, swatch_count: usize },

    #[cfg(feature = "serde")]
    #[error("failed to parse generation config: {0}")]
    Config(#[from] serde_json::Error),
}
