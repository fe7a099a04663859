use crate::{
    color_utils::{self, BLACK, WHITE},
    MIN_CONTRAST_BODY_TEXT, MIN_CONTRAST_TITLE_TEXT,
};
use std::{fmt, sync::OnceLock};

/// A color swatch generated from an image's palette, along with the number of pixels it stands for.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Swatch {
    red: u8,
    green: u8,
    blue: u8,
    population: u32,
    hsl: (f32, f32, f32),
    #[cfg_attr(feature = "serde", serde(skip))]
    text_colors: OnceLock<TextColors>,
}

#[derive(Debug, Clone, Copy)]
struct TextColors {
    title: (u8, u8, u8, u8),
    body: (u8, u8, u8, u8),
}

impl Swatch {
    pub fn new((red, green, blue): (u8, u8, u8), population: u32) -> Swatch {
        Self {
            red,
            green,
            blue,
            population,
            hsl: color_utils::rgb_to_hsl((red, green, blue)),
            text_colors: OnceLock::new(),
        }
    }

    /// Create a swatch from an HSL color. The color is rounded to the nearest sRGB color.
    pub fn from_hsl(hsl: (f32, f32, f32), population: u32) -> Swatch {
        Self::new(color_utils::hsl_to_rgb(hsl), population)
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        (self.red, self.green, self.blue)
    }

    /// The swatch's color in HSL: hue in degrees `[0, 360)`, saturation and lightness in `[0, 1]`.
    pub fn hsl(&self) -> (f32, f32, f32) {
        self.hsl
    }

    /// The number of pixels represented by this swatch.
    pub fn population(&self) -> u32 {
        self.population
    }

    /// An RGBA color to use for any title text displayed over this swatch. The color has a contrast
    /// ratio of at least 3.0 against the swatch.
    pub fn title_text_color(&self) -> (u8, u8, u8, u8) {
        self.text_colors().title
    }

    /// An RGBA color to use for any body text displayed over this swatch. The color has a contrast
    /// ratio of at least 4.5 against the swatch.
    pub fn body_text_color(&self) -> (u8, u8, u8, u8) {
        self.text_colors().body
    }

    fn text_colors(&self) -> TextColors {
        *self.text_colors.get_or_init(|| generate_text_colors(self.rgb()))
    }
}

impl PartialEq for Swatch {
    fn eq(&self, other: &Self) -> bool {
        self.rgb() == other.rgb() && self.population == other.population
    }
}

impl Eq for Swatch {}

impl fmt::Display for Swatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, s, l) = self.hsl;

        write!(
            f,
            "Swatch [RGB: #{:02x}{:02x}{:02x}] [HSL: {:.2}, {:.3}, {:.3}] [Population: {}] [Title Text: {}] [Body Text: {}]",
            self.red,
            self.green,
            self.blue,
            h,
            s,
            l,
            self.population,
            Argb(self.title_text_color()),
            Argb(self.body_text_color()),
        )
    }
}

struct Argb((u8, u8, u8, u8));

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b, a) = self.0;
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", a, r, g, b)
    }
}

fn generate_text_colors(background: (u8, u8, u8)) -> TextColors {
    let alpha_for = |foreground, ratio| color_utils::minimum_alpha_over_opaque(foreground, background, ratio);

    // first check white, as most colors will be dark
    let light_body = alpha_for(WHITE, MIN_CONTRAST_BODY_TEXT);
    let light_title = alpha_for(WHITE, MIN_CONTRAST_TITLE_TEXT);

    if let (Some(body), Some(title)) = (light_body, light_title) {
        return TextColors {
            title: color_utils::set_alpha(WHITE, title),
            body: color_utils::set_alpha(WHITE, body),
        };
    }

    let dark_body = alpha_for(BLACK, MIN_CONTRAST_BODY_TEXT);
    let dark_title = alpha_for(BLACK, MIN_CONTRAST_TITLE_TEXT);

    if let (Some(body), Some(title)) = (dark_body, dark_title) {
        return TextColors {
            title: color_utils::set_alpha(BLACK, title),
            body: color_utils::set_alpha(BLACK, body),
        };
    }

    // no single lightness works for both, so mix them. white or black always reaches 4.5 against
    // an 8-bit color, the opaque fallback is only there to keep this total
    let pick = |light: Option<u8>, dark: Option<u8>| match (light, dark) {
        (Some(alpha), _) => color_utils::set_alpha(WHITE, alpha),
        (None, Some(alpha)) => color_utils::set_alpha(BLACK, alpha),
        (None, None) => BLACK,
    };

    TextColors {
        title: pick(light_title, dark_title),
        body: pick(light_body, dark_body),
    }
}
