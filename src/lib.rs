// Copyright 2022 Spanfile
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A library to extract representative color swatches from an image and select them for UI theming.
//!
//! The image's colors are quantized into a small set of [`Swatch`]es with a median cut quantizer,
//! and a swatch is then selected for each [`Target`]: light vibrant, vibrant, dark vibrant, light
//! muted, muted and dark muted, along with any custom targets.
//!
//! This library is a reimplementation of the Palette library in Android Jetpack. Android Jetpack is Copyright 2018 The
//! Android Open Source Project. Android Jetpack is licensed under the Apache License, Version 2.0.
//!
//! [Android Jetpack license.](https://github.com/androidx/androidx/blob/7b7922489f9a7572f4462558691bf5550dd65c26/LICENSE.txt)
//!
//! ```
//! use vibrance::{image::{Rgb, RgbImage}, Palette};
//!
//! let image = RgbImage::from_pixel(32, 32, Rgb([200, 40, 40]));
//! let palette = Palette::from_image(image).generate();
//!
//! assert_eq!(palette.vibrant_color(), Some((200, 40, 40)));
//! assert_eq!(palette.dominant_color(), Some((200, 40, 40)));
//! assert_eq!(palette.muted_swatch(), None);
//! ```
//!
//! Generation is synchronous. Both [`PaletteBuilder`] and [`Palette`] are `Send`, so a whole
//! generation can be moved to a background thread.

mod builder;
mod color_cut_quantizer;
pub mod color_utils;
mod config;
mod error;
mod filter;
mod swatch;
mod target;

pub const DEFAULT_CALCULATE_NUMBER_COLORS: usize = 16;
pub const DEFAULT_RESIZE_IMAGE_AREA: u32 = 112 * 112;

/// Minimum contrast ratio of the title text color against its swatch.
pub const MIN_CONTRAST_TITLE_TEXT: f64 = 3.0;
/// Minimum contrast ratio of the body text color against its swatch.
pub const MIN_CONTRAST_BODY_TEXT: f64 = 4.5;

pub use crate::{
    builder::PaletteBuilder,
    color_cut_quantizer::{ColorCutQuantizer, DEFAULT_QUANTIZE_WORD_WIDTH},
    config::{GenerationConfig, Resize},
    error::{Error, Result},
    filter::{DefaultFilter, Filter},
    swatch::Swatch,
    target::{Target, TargetBuilder},
};
pub use image;
pub use palette;

use image::DynamicImage;
use log::trace;
use std::collections::{HashMap, HashSet};

/// The swatches of an image and the swatch selected for each target.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "UncheckedPalette"))]
pub struct Palette {
    swatches: Vec<Swatch>,
    targets: Vec<Target>,
    // target id -> index of the selected swatch
    selected_swatches: HashMap<u64, Option<usize>>,
    dominant_swatch: Option<usize>,
}

// a deserialized palette, before its swatch indices are checked
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct UncheckedPalette {
    swatches: Vec<Swatch>,
    targets: Vec<Target>,
    selected_swatches: HashMap<u64, Option<usize>>,
    dominant_swatch: Option<usize>,
}

#[cfg(feature = "serde")]
impl TryFrom<UncheckedPalette> for Palette {
    type Error = Error;

    fn try_from(palette: UncheckedPalette) -> Result<Self> {
        let swatch_count = palette.swatches.len();
        let mut indices = palette
            .selected_swatches
            .values()
            .chain(std::iter::once(&palette.dominant_swatch))
            .flatten();

        if let Some(&index) = indices.find(|&&index| index >= swatch_count) {
            return Err(Error::SwatchIndexOutOfRange { index, swatch_count });
        }

        Ok(Self {
            swatches: palette.swatches,
            targets: palette.targets,
            selected_swatches: palette.selected_swatches,
            dominant_swatch: palette.dominant_swatch,
        })
    }
}

impl Palette {
    pub fn from_image<I>(image: I) -> PaletteBuilder
    where
        I: Into<DynamicImage>,
    {
        PaletteBuilder::from_image(image)
    }

    /// Generate a palette from pre-generated swatches with the default targets. Fails if
    /// `swatches` is empty.
    pub fn from_swatches(swatches: Vec<Swatch>) -> Result<Palette> {
        Ok(PaletteBuilder::from_swatches(swatches)?.generate())
    }

    pub fn swatches(&self) -> &[Swatch] {
        &self.swatches
    }

    /// The targets used to generate this palette, with their weights normalized.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn light_vibrant_swatch(&self) -> Option<&Swatch> {
        self.get_swatch_for_target(Target::LIGHT_VIBRANT)
    }

    pub fn vibrant_swatch(&self) -> Option<&Swatch> {
        self.get_swatch_for_target(Target::VIBRANT)
    }

    pub fn dark_vibrant_swatch(&self) -> Option<&Swatch> {
        self.get_swatch_for_target(Target::DARK_VIBRANT)
    }

    pub fn light_muted_swatch(&self) -> Option<&Swatch> {
        self.get_swatch_for_target(Target::LIGHT_MUTED)
    }

    pub fn muted_swatch(&self) -> Option<&Swatch> {
        self.get_swatch_for_target(Target::MUTED)
    }

    pub fn dark_muted_swatch(&self) -> Option<&Swatch> {
        self.get_swatch_for_target(Target::DARK_MUTED)
    }

    pub fn light_vibrant_color(&self) -> Option<(u8, u8, u8)> {
        self.get_color_for_target(Target::LIGHT_VIBRANT)
    }

    pub fn vibrant_color(&self) -> Option<(u8, u8, u8)> {
        self.get_color_for_target(Target::VIBRANT)
    }

    pub fn dark_vibrant_color(&self) -> Option<(u8, u8, u8)> {
        self.get_color_for_target(Target::DARK_VIBRANT)
    }

    pub fn light_muted_color(&self) -> Option<(u8, u8, u8)> {
        self.get_color_for_target(Target::LIGHT_MUTED)
    }

    pub fn muted_color(&self) -> Option<(u8, u8, u8)> {
        self.get_color_for_target(Target::MUTED)
    }

    pub fn dark_muted_color(&self) -> Option<(u8, u8, u8)> {
        self.get_color_for_target(Target::DARK_MUTED)
    }

    /// The swatch selected for `target`, or `None` if the target wasn't used for this palette or no
    /// swatch fit it.
    pub fn get_swatch_for_target(&self, target: Target) -> Option<&Swatch> {
        self.selected_swatches
            .get(&target.id())
            .copied()
            .flatten()
            .map(|index| &self.swatches[index])
    }

    pub fn get_color_for_target(&self, target: Target) -> Option<(u8, u8, u8)> {
        self.get_swatch_for_target(target).map(|swatch| swatch.rgb())
    }

    /// The swatch with the greatest population. `None` only if the palette has no swatches.
    pub fn dominant_swatch(&self) -> Option<&Swatch> {
        self.dominant_swatch.map(|index| &self.swatches[index])
    }

    pub fn dominant_color(&self) -> Option<(u8, u8, u8)> {
        self.dominant_swatch().map(|swatch| swatch.rgb())
    }

    pub(crate) fn generate(swatches: Vec<Swatch>, mut targets: Vec<Target>) -> Palette {
        let dominant_swatch = find_dominant_swatch(&swatches);
        let max_population = dominant_swatch.map_or(1, |index| swatches[index].population());

        let mut selected_swatches = HashMap::with_capacity(targets.len());
        // colors taken by exclusive targets. only needed while selecting
        let mut used_colors = HashSet::new();

        for target in &mut targets {
            target.normalize_weights();

            let selected = generate_scored_target(&swatches, *target, max_population, &mut used_colors);
            trace!(
                "target {} selected {:?}",
                target.id(),
                selected.map(|index| swatches[index].rgb())
            );

            selected_swatches.insert(target.id(), selected);
        }

        Self {
            swatches,
            targets,
            selected_swatches,
            dominant_swatch,
        }
    }
}

fn find_dominant_swatch(swatches: &[Swatch]) -> Option<usize> {
    let mut dominant: Option<(usize, u32)> = None;

    for (index, swatch) in swatches.iter().enumerate() {
        // a later swatch has to be strictly more populous to take over
        if dominant.map_or(true, |(_, population)| swatch.population() > population) {
            dominant = Some((index, swatch.population()));
        }
    }

    dominant.map(|(index, _)| index)
}

fn generate_scored_target(
    swatches: &[Swatch],
    target: Target,
    max_population: u32,
    used_colors: &mut HashSet<(u8, u8, u8)>,
) -> Option<usize> {
    let max_scored_swatch = get_max_scored_swatch_for_target(swatches, target, max_population, used_colors);

    if let Some(index) = max_scored_swatch {
        if target.is_exclusive() {
            used_colors.insert(swatches[index].rgb());
        }
    }

    max_scored_swatch
}

fn get_max_scored_swatch_for_target(
    swatches: &[Swatch],
    target: Target,
    max_population: u32,
    used_colors: &HashSet<(u8, u8, u8)>,
) -> Option<usize> {
    let mut max_score = 0.0;
    let mut max_score_swatch = None;

    for (index, swatch) in swatches.iter().enumerate() {
        if should_be_scored_for_target(swatch, target, used_colors) {
            let score = generate_score(swatch, target, max_population);

            if max_score_swatch.is_none() || score > max_score {
                max_score_swatch = Some(index);
                max_score = score;
            }
        }
    }

    max_score_swatch
}

fn should_be_scored_for_target(swatch: &Swatch, target: Target, used_colors: &HashSet<(u8, u8, u8)>) -> bool {
    let (_, saturation, lightness) = swatch.hsl();

    (target.minimum_saturation()..=target.maximum_saturation()).contains(&saturation)
        && (target.minimum_lightness()..=target.maximum_lightness()).contains(&lightness)
        && !used_colors.contains(&swatch.rgb())
}

fn generate_score(swatch: &Swatch, target: Target, max_population: u32) -> f32 {
    let (_, saturation, lightness) = swatch.hsl();

    let saturation_score = if target.saturation_weight() > 0.0 {
        target.saturation_weight() * (1.0 - (saturation - target.target_saturation()).abs())
    } else {
        0.0
    };

    let luminance_score = if target.lightness_weight() > 0.0 {
        target.lightness_weight() * (1.0 - (lightness - target.target_lightness()).abs())
    } else {
        0.0
    };

    let population_score = if target.population_weight() > 0.0 {
        target.population_weight() * (swatch.population() as f32 / max_population as f32)
    } else {
        0.0
    };

    saturation_score + luminance_score + population_score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette_with(swatches: Vec<Swatch>, targets: Vec<Target>) -> Palette {
        Palette::generate(swatches, targets)
    }

    #[test]
    fn dominant_swatch_prefers_the_first_on_ties() {
        let swatches = vec![
            Swatch::new((10, 10, 200), 5),
            Swatch::new((200, 10, 10), 9),
            Swatch::new((10, 200, 10), 9),
        ];

        assert_eq!(find_dominant_swatch(&swatches), Some(1));
        assert_eq!(find_dominant_swatch(&[]), None);
    }

    #[test]
    fn empty_palette_has_no_selections() {
        let palette = palette_with(Vec::new(), Target::default_targets().to_vec());

        assert!(palette.dominant_swatch().is_none());
        for target in Target::default_targets() {
            assert!(palette.get_swatch_for_target(target).is_none());
        }
    }

    #[test]
    fn exclusive_targets_do_not_share_a_swatch() {
        let first = TargetBuilder::new().build();
        let second = TargetBuilder::new().build();
        let palette = palette_with(vec![Swatch::new((40, 90, 200), 10)], vec![first, second]);

        assert_eq!(palette.get_color_for_target(first), Some((40, 90, 200)));
        assert_eq!(palette.get_swatch_for_target(second), None);
    }

    #[test]
    fn exclusive_targets_fall_back_to_the_next_swatch() {
        let first = TargetBuilder::new().build();
        let second = TargetBuilder::new().build();
        let palette = palette_with(
            vec![Swatch::new((40, 90, 200), 10), Swatch::new((200, 90, 40), 2)],
            vec![first, second],
        );

        assert_eq!(palette.get_color_for_target(first), Some((40, 90, 200)));
        assert_eq!(palette.get_color_for_target(second), Some((200, 90, 40)));
    }

    #[test]
    fn non_exclusive_targets_share_a_swatch() {
        let first = TargetBuilder::new().exclusive(false).build();
        let second = TargetBuilder::new().build();
        let palette = palette_with(vec![Swatch::new((40, 90, 200), 10)], vec![first, second]);

        assert_eq!(palette.get_color_for_target(first), Some((40, 90, 200)));
        assert_eq!(palette.get_color_for_target(second), Some((40, 90, 200)));
    }

    #[test]
    fn ranges_are_inclusive() {
        let swatch = Swatch::new((255, 0, 0), 1);
        let (_, saturation, lightness) = swatch.hsl();
        let target = TargetBuilder::new()
            .minimum_saturation(saturation)
            .maximum_saturation(saturation)
            .minimum_lightness(lightness)
            .maximum_lightness(lightness)
            .build();

        assert!(should_be_scored_for_target(&swatch, target, &HashSet::new()));
        assert!(!should_be_scored_for_target(
            &swatch,
            target,
            &HashSet::from([(255, 0, 0)])
        ));
    }

    #[test]
    fn score_uses_population_relative_to_dominant() {
        let target = TargetBuilder::new()
            .saturation_weight(0.0)
            .lightness_weight(0.0)
            .population_weight(1.0)
            .build();

        let swatch = Swatch::new((40, 90, 200), 25);
        assert!((generate_score(&swatch, target, 100) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn equal_scores_keep_the_first_swatch() {
        let target = TargetBuilder::new().population_weight(0.0).build();
        let palette = palette_with(
            vec![Swatch::new((40, 90, 200), 1), Swatch::new((40, 90, 200), 50)],
            vec![target],
        );

        assert_eq!(palette.get_swatch_for_target(target).map(Swatch::population), Some(1));
    }

    #[test]
    fn preset_targets_are_not_mutated() {
        let target = TargetBuilder::from_target(Target::VIBRANT)
            .saturation_weight(2.0)
            .lightness_weight(2.0)
            .population_weight(4.0)
            .build();
        let palette = palette_with(vec![Swatch::new((200, 40, 40), 1)], vec![Target::VIBRANT, target]);

        assert_eq!(palette.targets()[1].population_weight(), 0.5);
        assert_eq!(Target::VIBRANT.population_weight(), 0.24);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_round_trip() {
        let palette = palette_with(
            vec![Swatch::new((200, 40, 40), 3), Swatch::new((100, 110, 120), 9)],
            Target::default_targets().to_vec(),
        );
        let json = serde_json::to_string(&palette).unwrap();
        let restored: Palette = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.swatches(), palette.swatches());
        assert_eq!(restored.vibrant_color(), Some((200, 40, 40)));
        assert_eq!(restored.dominant_color(), Some((100, 110, 120)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_rejects_dangling_indices() {
        let result = serde_json::from_str::<Palette>(
            r#"{"swatches":[],"targets":[],"selected_swatches":{},"dominant_swatch":3}"#,
        );
        assert!(result.is_err());

        let result = serde_json::from_str::<Palette>(
            r#"{"swatches":[],"targets":[],"selected_swatches":{"1":7},"dominant_swatch":null}"#,
        );
        assert!(result.is_err());

        let palette = serde_json::from_str::<Palette>(
            r#"{"swatches":[],"targets":[],"selected_swatches":{"1":null},"dominant_swatch":null}"#,
        )
        .unwrap();
        assert!(palette.vibrant_swatch().is_none());
        assert!(palette.dominant_swatch().is_none());
    }

    #[test]
    fn unknown_target_has_no_swatch() {
        let palette = palette_with(vec![Swatch::new((200, 40, 40), 1)], Target::default_targets().to_vec());

        assert_eq!(palette.get_swatch_for_target(Target::new()), None);
    }
}
