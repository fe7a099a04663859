const BLACK_MAX_LIGHTNESS: f32 = 0.05;
const WHITE_MIN_LIGHTNESS: f32 = 0.95;

const RED_I_LINE_MIN_HUE: f32 = 10.0;
const RED_I_LINE_MAX_HUE: f32 = 37.0;
const RED_I_LINE_MAX_SATURATION: f32 = 0.82;

/// A trait used to implement filters for the image quantization process.
///
/// During the image quantization process, filters are used to remove colors from the quantization
/// process, and to remove final color swatches that may have their average color end up as
/// filtered. A color is used only if every filter allows it. This trait allows the library consumer
/// to implement custom filters, and any `Fn((u8, u8, u8), (f32, f32, f32)) -> bool` closure is a
/// filter as well.
///
/// Filters have to be `Send + Sync` so a palette builder can be handed off to another thread.
///
/// See [`crate::PaletteBuilder::add_filter`] on how to add filters to the quantization process.
pub trait Filter: Send + Sync {
    /// Return whether a given color should be allowed or not. The same color is given in both sRGB
    /// and HSL for convenience.
    fn is_allowed(&self, rgb: (u8, u8, u8), hsl: (f32, f32, f32)) -> bool;
}

impl<F> Filter for F
where
    F: Fn((u8, u8, u8), (f32, f32, f32)) -> bool + Send + Sync,
{
    fn is_allowed(&self, rgb: (u8, u8, u8), hsl: (f32, f32, f32)) -> bool {
        self(rgb, hsl)
    }
}

/// The default filter included in every [`crate::PaletteBuilder`] by default.
///
/// This filter will disallow colors very close to black, colors very close to white, and colors
/// near the red I line, whatever that is.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFilter;
impl Filter for DefaultFilter {
    fn is_allowed(&self, _: (u8, u8, u8), (h, s, l): (f32, f32, f32)) -> bool {
        !is_black(l) && !is_white(l) && !is_near_red_i_line(h, s)
    }
}

/// Check a color against every filter. An empty filter set allows everything.
pub(crate) fn is_allowed_by_all(filters: &[Box<dyn Filter>], rgb: (u8, u8, u8), hsl: (f32, f32, f32)) -> bool {
    filters.iter().all(|filter| filter.is_allowed(rgb, hsl))
}

fn is_black(l: f32) -> bool {
    l <= BLACK_MAX_LIGHTNESS
}

fn is_white(l: f32) -> bool {
    l >= WHITE_MIN_LIGHTNESS
}

fn is_near_red_i_line(h: f32, s: f32) -> bool {
    (RED_I_LINE_MIN_HUE..=RED_I_LINE_MAX_HUE).contains(&h) && s <= RED_I_LINE_MAX_SATURATION
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_utils::rgb_to_hsl;

    fn default_allows(rgb: (u8, u8, u8)) -> bool {
        DefaultFilter.is_allowed(rgb, rgb_to_hsl(rgb))
    }

    #[test]
    fn rejects_near_black_and_near_white() {
        assert!(!default_allows((0, 0, 0)));
        assert!(!default_allows((10, 10, 10)));
        assert!(!default_allows((255, 255, 255)));
        assert!(!default_allows((250, 250, 250)));
    }

    #[test]
    fn rejects_red_i_line_band() {
        // hue ~25 degrees, saturation ~0.6
        assert!(!default_allows((200, 130, 80)));
    }

    #[test]
    fn allows_saturated_colors_in_the_hue_band() {
        // hue ~24 degrees but fully saturated
        assert!(default_allows((255, 100, 0)));
    }

    #[test]
    fn allows_ordinary_colors() {
        assert!(default_allows((128, 128, 128)));
        assert!(default_allows((255, 0, 0)));
        assert!(default_allows((30, 60, 200)));
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert!(!DefaultFilter.is_allowed((0, 0, 0), (200.0, 0.5, 0.05)));
        assert!(!DefaultFilter.is_allowed((0, 0, 0), (200.0, 0.5, 0.95)));
        assert!(!DefaultFilter.is_allowed((0, 0, 0), (10.0, 0.82, 0.5)));
        assert!(!DefaultFilter.is_allowed((0, 0, 0), (37.0, 0.82, 0.5)));
        assert!(DefaultFilter.is_allowed((0, 0, 0), (37.5, 0.82, 0.5)));
        assert!(DefaultFilter.is_allowed((0, 0, 0), (20.0, 0.83, 0.5)));
    }

    #[test]
    fn closures_are_filters() {
        let filters: Vec<Box<dyn Filter>> = vec![Box::new(|(r, _, _): (u8, u8, u8), _: (f32, f32, f32)| r < 128)];

        assert!(is_allowed_by_all(&filters, (100, 0, 0), (0.0, 1.0, 0.2)));
        assert!(!is_allowed_by_all(&filters, (200, 0, 0), (0.0, 1.0, 0.4)));
    }

    #[test]
    fn filter_set_is_a_conjunction() {
        assert!(is_allowed_by_all(&[], (0, 0, 0), (0.0, 0.0, 0.0)));

        let filters: Vec<Box<dyn Filter>> = vec![
            Box::new(DefaultFilter),
            Box::new(|_: (u8, u8, u8), (h, _, _): (f32, f32, f32)| h > 180.0),
        ];

        assert!(is_allowed_by_all(&filters, (30, 60, 200), rgb_to_hsl((30, 60, 200))));
        assert!(!is_allowed_by_all(&filters, (255, 0, 0), rgb_to_hsl((255, 0, 0))));
        assert!(!is_allowed_by_all(&filters, (0, 0, 0), rgb_to_hsl((0, 0, 0))));
    }
}
