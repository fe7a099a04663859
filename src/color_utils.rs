//! Color math used by the quantizer, the filters and the swatch text colors.
//!
//! Colors are plain tuples: `(red, green, blue)` for opaque colors and `(red, green, blue, alpha)`
//! when alpha matters. HSL values are `(hue, saturation, lightness)` with the hue in degrees in
//! `[0, 360)` and the other two in `[0, 1]`.

use crate::error::{Error, Result};
use palette::{Hsl, IntoColor, Srgb};

const MIN_ALPHA_SEARCH_MAX_ITERATIONS: u32 = 10;
const MIN_ALPHA_SEARCH_PRECISION: u32 = 10;

pub const WHITE: (u8, u8, u8, u8) = (255, 255, 255, 255);
pub const BLACK: (u8, u8, u8, u8) = (0, 0, 0, 255);

/// Convert an sRGB color into HSL.
pub fn rgb_to_hsl(rgb: (u8, u8, u8)) -> (f32, f32, f32) {
    let raw = Srgb::<u8>::from_components(rgb);
    let raw_float: Srgb<f32> = raw.into_format();
    let hsl: Hsl = raw_float.into_color();
    let (h, s, l) = hsl.into_components();

    (h.to_positive_degrees(), s.clamp(0.0, 1.0), l.clamp(0.0, 1.0))
}

/// Convert an HSL color back into sRGB, rounding each channel to the nearest integer.
pub fn hsl_to_rgb((h, s, l): (f32, f32, f32)) -> (u8, u8, u8) {
    let hsl = Hsl::new(h, s, l);
    let rgb: Srgb = hsl.into_color();
    let (r, g, b) = rgb.into_components();

    (to_channel(r), to_channel(g), to_channel(b))
}

/// Relative luminance of a color, between 0 for black and 1 for white.
pub fn luminance((r, g, b): (u8, u8, u8)) -> f64 {
    // the sRGB decoding threshold sits at 0.04045 while WCAG 2.0 states 0.03928. no 8-bit channel
    // value falls between the two, so the decoded values are identical
    let linear = Srgb::<u8>::new(r, g, b).into_format::<f64>().into_linear();

    0.2126 * linear.red + 0.7152 * linear.green + 0.0722 * linear.blue
}

/// The contrast ratio between two colors, from 1 for identical colors up to 21 for black on white.
///
/// A translucent foreground is composited over the background first. The background has to be
/// fully opaque.
pub fn contrast(foreground: (u8, u8, u8, u8), background: (u8, u8, u8, u8)) -> Result<f64> {
    let background = opaque(background)?;
    Ok(contrast_over_opaque(foreground, background))
}

/// Find the smallest alpha for `foreground` that still reaches `min_contrast_ratio` when drawn over
/// `background`.
///
/// Returns `Ok(None)` if even a fully opaque foreground doesn't reach the ratio. The background has
/// to be fully opaque.
pub fn minimum_alpha(
    foreground: (u8, u8, u8, u8),
    background: (u8, u8, u8, u8),
    min_contrast_ratio: f64,
) -> Result<Option<u8>> {
    let background = opaque(background)?;
    Ok(minimum_alpha_over_opaque(foreground, background, min_contrast_ratio))
}

/// Composite `foreground` over `background` with the "over" operator.
pub fn composite_colors(foreground: (u8, u8, u8, u8), background: (u8, u8, u8, u8)) -> (u8, u8, u8, u8) {
    let fg_alpha = foreground.3 as u32;
    let bg_alpha = background.3 as u32;
    let alpha = composite_alpha(fg_alpha, bg_alpha);

    let component = |fg: u8, bg: u8| -> u8 {
        if alpha == 0 {
            return 0;
        }

        let value = (255 * fg as u32 * fg_alpha + bg as u32 * bg_alpha * (255 - fg_alpha)) / (alpha * 255);
        value.min(255) as u8
    };

    (
        component(foreground.0, background.0),
        component(foreground.1, background.1),
        component(foreground.2, background.2),
        alpha as u8,
    )
}

/// Replace the alpha of a color.
pub fn set_alpha((r, g, b, _): (u8, u8, u8, u8), alpha: u8) -> (u8, u8, u8, u8) {
    (r, g, b, alpha)
}

pub(crate) fn contrast_over_opaque(foreground: (u8, u8, u8, u8), background: (u8, u8, u8)) -> f64 {
    let (r, g, b) = background;
    let foreground = if foreground.3 < 255 {
        composite_colors(foreground, (r, g, b, 255))
    } else {
        foreground
    };

    let fg_luminance = luminance((foreground.0, foreground.1, foreground.2)) + 0.05;
    let bg_luminance = luminance(background) + 0.05;

    fg_luminance.max(bg_luminance) / fg_luminance.min(bg_luminance)
}

pub(crate) fn minimum_alpha_over_opaque(
    foreground: (u8, u8, u8, u8),
    background: (u8, u8, u8),
    min_contrast_ratio: f64,
) -> Option<u8> {
    // first check that a fully opaque foreground has sufficient contrast
    if contrast_over_opaque(set_alpha(foreground, 255), background) < min_contrast_ratio {
        return None;
    }

    let mut iterations = 0;
    let mut min_alpha: u32 = 0;
    let mut max_alpha: u32 = 255;

    while iterations <= MIN_ALPHA_SEARCH_MAX_ITERATIONS && max_alpha - min_alpha > MIN_ALPHA_SEARCH_PRECISION {
        let test_alpha = (min_alpha + max_alpha) / 2;

        if contrast_over_opaque(set_alpha(foreground, test_alpha as u8), background) < min_contrast_ratio {
            min_alpha = test_alpha;
        } else {
            max_alpha = test_alpha;
        }

        iterations += 1;
    }

    // max_alpha only ever holds values that passed
    Some(max_alpha as u8)
}

fn opaque((r, g, b, alpha): (u8, u8, u8, u8)) -> Result<(u8, u8, u8)> {
    if alpha == 255 {
        Ok((r, g, b))
    } else {
        Err(Error::TranslucentBackground { alpha })
    }
}

fn composite_alpha(foreground_alpha: u32, background_alpha: u32) -> u32 {
    255 - ((255 - background_alpha) * (255 - foreground_alpha)) / 255
}

fn to_channel(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
