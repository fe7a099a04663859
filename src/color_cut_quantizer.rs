//! Median cut color quantization.
//!
//! Pixels are reduced to quantized colors of `word_width` bits per channel, packed as
//! `red << 2w | green << w | blue`. The distinct quantized colors are then split into boxes along
//! their longest color dimension until there are enough boxes, and each box is averaged into a
//! single swatch.

use crate::{
    color_utils,
    error::{Error, Result},
    filter::{self, Filter},
    swatch::Swatch,
};
use log::trace;
use std::collections::BinaryHeap;

pub const DEFAULT_QUANTIZE_WORD_WIDTH: u32 = 5;
pub const MAX_QUANTIZE_WORD_WIDTH: u32 = 8;

/// Reduces a buffer of pixels into at most `max_colors` swatches.
///
/// The pixels are packed `0xAARRGGBB` values; alpha is ignored.
pub struct ColorCutQuantizer<'f> {
    // the distinct allowed quantized colors in ascending order, reordered in place while splitting
    colors: Vec<u32>,
    // population of every quantized color, indexed by the quantized color itself
    histogram: Vec<u32>,
    word_width: u32,
    max_colors: usize,
    filters: &'f [Box<dyn Filter>],
}

struct Vbox<'a> {
    colors: &'a mut [u32],
    histogram: &'a [u32],
    word_width: u32,
    population: u32,
    red_range: (u8, u8),
    green_range: (u8, u8),
    blue_range: (u8, u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
    Red,
    Green,
    Blue,
}

impl<'f> ColorCutQuantizer<'f> {
    /// Build the color histogram of `pixels` using the default 5-bit quantization.
    ///
    /// Every pixel in `pixels` is replaced with its quantized color.
    pub fn new(pixels: &mut [u32], max_colors: usize, filters: &'f [Box<dyn Filter>]) -> Self {
        Self::build(pixels, max_colors, filters, DEFAULT_QUANTIZE_WORD_WIDTH)
    }

    /// Like [`ColorCutQuantizer::new`] but with a custom number of bits per channel, between 1 and 8.
    pub fn with_word_width(
        pixels: &mut [u32],
        max_colors: usize,
        filters: &'f [Box<dyn Filter>],
        word_width: u32,
    ) -> Result<Self> {
        validate_word_width(word_width)?;
        Ok(Self::build(pixels, max_colors, filters, word_width))
    }

    pub(crate) fn build(pixels: &mut [u32], max_colors: usize, filters: &'f [Box<dyn Filter>], word_width: u32) -> Self {
        // begin by generating a histogram of quantized pixel values. the pixels are replaced by their quantized values
        // along the way
        let mut histogram = vec![0; 1 << (3 * word_width)];
        for pixel in pixels.iter_mut() {
            let quantized = quantize_from_rgb888(*pixel, word_width);
            *pixel = quantized;
            histogram[quantized as usize] += 1;
        }

        // zero out the colors the filters don't allow and collect the rest. walking the histogram in order keeps the
        // colors in ascending order
        let mut colors = Vec::new();
        for (color, count) in histogram.iter_mut().enumerate() {
            if *count == 0 {
                continue;
            }

            let rgb = approximate_to_rgb888(color as u32, word_width);
            if filter::is_allowed_by_all(filters, rgb, color_utils::rgb_to_hsl(rgb)) {
                colors.push(color as u32);
            } else {
                *count = 0;
            }
        }

        trace!(
            "quantized {} pixels into {} distinct colors at {} bits per channel",
            pixels.len(),
            colors.len(),
            word_width
        );

        Self {
            colors,
            histogram,
            word_width,
            max_colors,
            filters,
        }
    }

    /// The number of distinct quantized colors the filters allowed.
    pub fn distinct_color_count(&self) -> usize {
        self.colors.len()
    }

    /// The total population of all allowed colors.
    pub fn population(&self) -> u64 {
        self.histogram.iter().map(|&count| count as u64).sum()
    }

    pub fn get_quantized_colors(self) -> Vec<Swatch> {
        if self.max_colors == 0 {
            return Vec::new();
        }

        if self.colors.len() <= self.max_colors {
            // there are less colors than requested, no need for further processing; just return each color as a swatch
            self.colors
                .iter()
                .map(|&color| {
                    Swatch::new(
                        approximate_to_rgb888(color, self.word_width),
                        self.histogram[color as usize],
                    )
                })
                .collect()
        } else {
            self.quantize_pixels()
        }
    }

    fn quantize_pixels(self) -> Vec<Swatch> {
        let Self {
            mut colors,
            histogram,
            word_width,
            max_colors,
            filters,
        } = self;

        // create a priority queue of Vboxes with the first one containing all the colors. Vboxes are ordered by their
        // volume so the queue always pops the largest Vbox first
        let mut pq = BinaryHeap::with_capacity(max_colors);
        pq.push(Vbox::new(&mut colors, &histogram, word_width));

        // go through the queue until there are enough colors or no more boxes to split
        split_boxes(&mut pq, max_colors);

        // return the remaining Vboxes converting them into swatches. averaging may produce a color that the filters
        // don't allow, so filter them again
        pq.into_vec()
            .into_iter()
            .map(|vbox| vbox.get_average_color())
            .filter(|swatch| filter::is_allowed_by_all(filters, swatch.rgb(), swatch.hsl()))
            .collect()
    }
}

fn split_boxes(pq: &mut BinaryHeap<Vbox<'_>>, max_colors: usize) {
    while pq.len() < max_colors {
        match pq.pop() {
            Some(vbox) if vbox.can_split() => {
                // split the box in two and push them both back to the queue
                let (low, high) = vbox.split_box();
                trace!("split box into {} and {} colors", low.colors.len(), high.colors.len());

                pq.push(low);
                pq.push(high);
            }
            Some(vbox) => {
                // only reachable when every box holds a single color. keep the box and stop
                pq.push(vbox);
                return;
            }
            None => return,
        }
    }
}

impl<'a> Vbox<'a> {
    fn new(colors: &'a mut [u32], histogram: &'a [u32], word_width: u32) -> Self {
        // compute the boundaries of the Vbox to tightly fit around the colors within it
        let word_max = word_mask(word_width) as u8;

        let mut population = 0;
        // min, max
        let (mut min_red, mut max_red) = (word_max, 0);
        let (mut min_green, mut max_green) = (word_max, 0);
        let (mut min_blue, mut max_blue) = (word_max, 0);

        for &color in colors.iter() {
            let (r, g, b) = quantized_components(color, word_width);
            population += histogram[color as usize];

            min_red = min_red.min(r);
            max_red = max_red.max(r);
            min_green = min_green.min(g);
            max_green = max_green.max(g);
            min_blue = min_blue.min(b);
            max_blue = max_blue.max(b);
        }

        Self {
            colors,
            histogram,
            word_width,
            population,
            red_range: (min_red, max_red),
            green_range: (min_green, max_green),
            blue_range: (min_blue, max_blue),
        }
    }

    fn volume(&self) -> u32 {
        (self.red_range.1 - self.red_range.0 + 1) as u32
            * (self.green_range.1 - self.green_range.0 + 1) as u32
            * (self.blue_range.1 - self.blue_range.0 + 1) as u32
    }

    fn split_box(mut self) -> (Vbox<'a>, Vbox<'a>) {
        // split the Vbox at the population midpoint of its largest color dimension
        assert!(self.can_split(), "cannot split a box with only one color");

        // sort the colors by the longest dimension so the midpoint can be searched for
        self.sort_colors_by_longest_dimension();

        let split_point = self.find_split_point();
        let Vbox {
            colors,
            histogram,
            word_width,
            ..
        } = self;
        let (low, high) = colors.split_at_mut(split_point + 1);

        (
            Vbox::new(low, histogram, word_width),
            Vbox::new(high, histogram, word_width),
        )
    }

    fn sort_colors_by_longest_dimension(&mut self) {
        let dimension = self.get_longest_dimension();
        let word_width = self.word_width;

        // the sort key moves the chosen dimension to the most significant position, so colors sharing a value in that
        // dimension are still ordered by the other two
        self.colors
            .sort_unstable_by_key(|&color| with_significant_component(color, dimension, word_width));
    }

    fn find_split_point(&self) -> usize {
        let midpoint = self.population / 2;
        let mut count = 0;

        // keep a total sum of all the color populations and return the first one that reaches the midpoint. the last
        // color is never returned, so that both halves always get at least one color
        for (i, &color) in self.colors.iter().enumerate() {
            count += self.histogram[color as usize];

            if count >= midpoint {
                return i.min(self.colors.len() - 2);
            }
        }

        0
    }

    fn can_split(&self) -> bool {
        self.colors.len() > 1
    }

    fn get_longest_dimension(&self) -> Component {
        let red_length = self.red_range.1 - self.red_range.0;
        let green_length = self.green_range.1 - self.green_range.0;
        let blue_length = self.blue_range.1 - self.blue_range.0;

        if red_length >= green_length && red_length >= blue_length {
            Component::Red
        } else if green_length >= red_length && green_length >= blue_length {
            Component::Green
        } else {
            Component::Blue
        }
    }

    fn get_average_color(&self) -> Swatch {
        // calculate the sum of all the color populations, as well as weighted sums of each color channel based on the
        // color populations
        let (pop, red_sum, green_sum, blue_sum) =
            self.colors
                .iter()
                .fold((0u32, 0u64, 0u64, 0u64), |(pop, red_sum, green_sum, blue_sum), &color| {
                    let (r, g, b) = quantized_components(color, self.word_width);
                    let count = self.histogram[color as usize];

                    (
                        pop + count,
                        red_sum + r as u64 * count as u64,
                        green_sum + g as u64 * count as u64,
                        blue_sum + b as u64 * count as u64,
                    )
                });

        // calculate the rounded means of the channel weighted sums...
        let red_mean = (red_sum as f32 / pop as f32).round() as u32;
        let green_mean = (green_sum as f32 / pop as f32).round() as u32;
        let blue_mean = (blue_sum as f32 / pop as f32).round() as u32;

        // ...and widen them back into 8 bits
        let rgb = (
            modify_word_width(red_mean, self.word_width, 8) as u8,
            modify_word_width(green_mean, self.word_width, 8) as u8,
            modify_word_width(blue_mean, self.word_width, 8) as u8,
        );

        Swatch::new(rgb, pop)
    }
}

impl Eq for Vbox<'_> {}
impl PartialEq for Vbox<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.volume() == other.volume()
    }
}

impl Ord for Vbox<'_> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.volume().cmp(&other.volume())
    }
}

impl PartialOrd for Vbox<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

pub(crate) fn validate_word_width(word_width: u32) -> Result<()> {
    if (1..=MAX_QUANTIZE_WORD_WIDTH).contains(&word_width) {
        Ok(())
    } else {
        Err(Error::InvalidWordWidth(word_width))
    }
}

fn word_mask(width: u32) -> u32 {
    (1 << width) - 1
}

fn quantize_from_rgb888(pixel: u32, word_width: u32) -> u32 {
    let r = modify_word_width((pixel >> 16) & 0xff, 8, word_width);
    let g = modify_word_width((pixel >> 8) & 0xff, 8, word_width);
    let b = modify_word_width(pixel & 0xff, 8, word_width);

    (r << (word_width + word_width)) | (g << word_width) | b
}

fn quantized_components(color: u32, word_width: u32) -> (u8, u8, u8) {
    let mask = word_mask(word_width);

    (
        ((color >> (word_width + word_width)) & mask) as u8,
        ((color >> word_width) & mask) as u8,
        (color & mask) as u8,
    )
}

fn approximate_to_rgb888(color: u32, word_width: u32) -> (u8, u8, u8) {
    let (r, g, b) = quantized_components(color, word_width);

    (
        modify_word_width(r as u32, word_width, 8) as u8,
        modify_word_width(g as u32, word_width, 8) as u8,
        modify_word_width(b as u32, word_width, 8) as u8,
    )
}

fn with_significant_component(color: u32, dimension: Component, word_width: u32) -> u32 {
    let (r, g, b) = quantized_components(color, word_width);
    let (r, g, b) = (r as u32, g as u32, b as u32);

    match dimension {
        Component::Red => color,
        Component::Green => (g << (word_width + word_width)) | (r << word_width) | b,
        Component::Blue => (b << (word_width + word_width)) | (g << word_width) | r,
    }
}

fn modify_word_width(value: u32, current_width: u32, target_width: u32) -> u32 {
    let value = if target_width > current_width {
        value << (target_width - current_width)
    } else {
        value >> (current_width - target_width)
    };

    value & word_mask(target_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DefaultFilter;
    use proptest::prelude::*;

    fn pack((r, g, b): (u8, u8, u8)) -> u32 {
        0xff00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32
    }

    fn no_filters() -> Vec<Box<dyn Filter>> {
        Vec::new()
    }

    fn total_population(swatches: &[Swatch]) -> u64 {
        swatches.iter().map(|swatch| swatch.population() as u64).sum()
    }

    #[test]
    fn word_width_conversion_keeps_most_significant_bits() {
        assert_eq!(modify_word_width(0xff, 8, 5), 31);
        assert_eq!(modify_word_width(0x80, 8, 5), 16);
        assert_eq!(modify_word_width(31, 5, 8), 248);
        assert_eq!(modify_word_width(0xab, 8, 8), 0xab);
    }

    #[test]
    fn quantized_color_layout() {
        assert_eq!(quantize_from_rgb888(pack((255, 0, 0)), 5), 31 << 10);
        assert_eq!(quantize_from_rgb888(pack((0, 255, 0)), 5), 31 << 5);
        assert_eq!(quantize_from_rgb888(pack((0, 0, 255)), 5), 31);
        assert_eq!(approximate_to_rgb888(31 << 10, 5), (248, 0, 0));
    }

    #[test]
    fn significant_component_repacking() {
        let color = (1 << 10) | (2 << 5) | 3;

        assert_eq!(with_significant_component(color, Component::Red, 5), color);
        assert_eq!(with_significant_component(color, Component::Green, 5), (2 << 10) | (1 << 5) | 3);
        assert_eq!(with_significant_component(color, Component::Blue, 5), (3 << 10) | (2 << 5) | 1);
    }

    #[test]
    fn pixels_are_replaced_by_quantized_colors() {
        let mut pixels = vec![pack((255, 0, 0)), pack((0, 0, 255))];
        let filters = no_filters();
        ColorCutQuantizer::new(&mut pixels, 16, &filters);

        assert_eq!(pixels, vec![31 << 10, 31]);
    }

    #[test]
    fn empty_input_gives_no_swatches() {
        let filters = no_filters();
        let quantizer = ColorCutQuantizer::new(&mut [], 16, &filters);

        assert_eq!(quantizer.distinct_color_count(), 0);
        assert!(quantizer.get_quantized_colors().is_empty());
    }

    #[test]
    fn fully_filtered_input_gives_no_swatches() {
        let mut pixels = vec![pack((0, 0, 0)); 50];
        pixels.extend(vec![pack((255, 255, 255)); 50]);
        let filters: Vec<Box<dyn Filter>> = vec![Box::new(DefaultFilter)];
        let quantizer = ColorCutQuantizer::new(&mut pixels, 16, &filters);

        assert_eq!(quantizer.population(), 0);
        assert!(quantizer.get_quantized_colors().is_empty());
    }

    #[test]
    fn few_colors_are_returned_as_is() {
        let mut pixels = vec![pack((255, 0, 0)); 3];
        pixels.push(pack((0, 0, 255)));
        let filters = no_filters();
        let swatches = ColorCutQuantizer::new(&mut pixels, 16, &filters).get_quantized_colors();

        // ascending quantized order puts blue first
        assert_eq!(swatches, vec![Swatch::new((0, 0, 248), 1), Swatch::new((248, 0, 0), 3)]);
    }

    #[test]
    fn zero_max_colors_gives_no_swatches() {
        let mut pixels = vec![pack((255, 0, 0))];
        let filters = no_filters();

        assert!(ColorCutQuantizer::new(&mut pixels, 0, &filters)
            .get_quantized_colors()
            .is_empty());
    }

    #[test]
    fn splits_along_the_longest_dimension() {
        // red spans the whole range while green and blue are fixed, so every split is along red
        let mut pixels: Vec<u32> = (0..32).map(|i| pack(((i * 8) as u8, 64, 64))).collect();
        let filters = no_filters();
        let mut swatches = ColorCutQuantizer::new(&mut pixels, 4, &filters).get_quantized_colors();
        swatches.sort_by_key(|swatch| swatch.rgb());

        assert_eq!(swatches.len(), 4);
        assert_eq!(total_population(&swatches), 32);
        for swatch in &swatches {
            let (_, g, b) = swatch.rgb();
            assert_eq!((g, b), (64, 64));
            assert_eq!(swatch.population(), 8);
        }
    }

    #[test]
    fn split_point_follows_population() {
        let histogram = {
            let mut histogram = vec![0; 1 << 15];
            histogram[1 << 10] = 1;
            histogram[2 << 10] = 1;
            histogram[3 << 10] = 10;
            histogram[4 << 10] = 1;
            histogram
        };
        let mut colors = vec![1 << 10, 2 << 10, 3 << 10, 4 << 10];
        let vbox = Vbox::new(&mut colors, &histogram, 5);

        assert_eq!(vbox.population, 13);
        // the running total reaches 13 / 2 at the heavy color
        assert_eq!(vbox.find_split_point(), 2);

        let (low, high) = vbox.split_box();
        assert_eq!(low.colors.len(), 3);
        assert_eq!(high.colors.len(), 1);
        assert_eq!(low.population + high.population, 13);
    }

    #[test]
    fn split_point_never_takes_the_last_color() {
        let mut histogram = vec![0; 1 << 15];
        histogram[1 << 10] = 1;
        histogram[2 << 10] = 1;
        let mut colors = vec![1 << 10, 2 << 10];
        let vbox = Vbox::new(&mut colors, &histogram, 5);

        let (low, high) = vbox.split_box();
        assert_eq!(low.colors.len(), 1);
        assert_eq!(high.colors.len(), 1);
    }

    #[test]
    #[should_panic(expected = "cannot split a box with only one color")]
    fn splitting_a_single_color_box_panics() {
        let mut histogram = vec![0; 1 << 15];
        histogram[7] = 3;
        let mut colors = vec![7];

        Vbox::new(&mut colors, &histogram, 5).split_box();
    }

    #[test]
    fn longest_dimension_ties_prefer_red_then_green() {
        let histogram = vec![1; 1 << 15];

        let mut colors = vec![0, (4 << 10) | (4 << 5) | 4];
        assert_eq!(Vbox::new(&mut colors, &histogram, 5).get_longest_dimension(), Component::Red);

        let mut colors = vec![0, (4 << 5) | 4];
        assert_eq!(Vbox::new(&mut colors, &histogram, 5).get_longest_dimension(), Component::Green);

        let mut colors = vec![0, (1 << 10) | 4];
        assert_eq!(Vbox::new(&mut colors, &histogram, 5).get_longest_dimension(), Component::Blue);
    }

    #[test]
    fn average_color_is_population_weighted() {
        let mut histogram = vec![0; 1 << 15];
        histogram[10 << 10] = 3;
        histogram[20 << 10] = 1;
        let mut colors = vec![10 << 10, 20 << 10];
        let swatch = Vbox::new(&mut colors, &histogram, 5).get_average_color();

        // (10 * 3 + 20) / 4 = 12.5, rounds to 13
        assert_eq!(swatch.rgb(), (13 << 3, 0, 0));
        assert_eq!(swatch.population(), 4);
    }

    #[test]
    fn custom_word_width() {
        let mut pixels = vec![pack((0x12, 0x34, 0x56)), pack((0x12, 0x34, 0x57))];
        let filters = no_filters();
        let quantizer = ColorCutQuantizer::with_word_width(&mut pixels, 16, &filters, 8).unwrap();

        assert_eq!(quantizer.distinct_color_count(), 2);
        assert!(matches!(
            ColorCutQuantizer::with_word_width(&mut pixels, 16, &filters, 9),
            Err(Error::InvalidWordWidth(9))
        ));
        assert!(ColorCutQuantizer::with_word_width(&mut pixels, 16, &filters, 0).is_err());
    }

    #[test]
    fn result_is_deterministic() {
        let pixels: Vec<u32> = (0..2000u32).map(|i| pack(((i * 7) as u8, (i * 13) as u8, (i * 29) as u8))).collect();
        let filters: Vec<Box<dyn Filter>> = vec![Box::new(DefaultFilter)];

        let first = ColorCutQuantizer::new(&mut pixels.clone(), 16, &filters).get_quantized_colors();
        let second = ColorCutQuantizer::new(&mut pixels.clone(), 16, &filters).get_quantized_colors();

        assert_eq!(first, second);
    }

    #[test]
    fn averaged_colors_are_filtered_again() {
        let mut pixels = vec![0xffff_0000; 10];
        pixels.extend(vec![0xff00_00ffu32; 10]);
        let filters: Vec<Box<dyn Filter>> =
            vec![Box::new(|(r, _, b): (u8, u8, u8), _: (f32, f32, f32)| !(r > 100 && b > 100))];
        let quantizer = ColorCutQuantizer::new(&mut pixels, 1, &filters);

        // red and blue both pass on their own, their purple average doesn't
        assert_eq!(quantizer.distinct_color_count(), 2);
        assert!(quantizer.get_quantized_colors().is_empty());
    }

    proptest! {
        #[test]
        fn histogram_counts_every_allowed_pixel(pixels in prop::collection::vec(any::<u32>(), 0..500)) {
            let filters: Vec<Box<dyn Filter>> = vec![Box::new(DefaultFilter)];
            let allowed = pixels
                .iter()
                .filter(|&&pixel| {
                    let rgb = approximate_to_rgb888(quantize_from_rgb888(pixel, 5), 5);
                    DefaultFilter.is_allowed(rgb, color_utils::rgb_to_hsl(rgb))
                })
                .count();

            let quantizer = ColorCutQuantizer::new(&mut pixels.clone(), 16, &filters);
            prop_assert_eq!(quantizer.population(), allowed as u64);
        }

        #[test]
        fn swatch_count_is_bounded(pixels in prop::collection::vec(any::<u32>(), 0..500), max_colors in 1usize..24) {
            let filters = no_filters();
            let quantizer = ColorCutQuantizer::new(&mut pixels.clone(), max_colors, &filters);
            let distinct = quantizer.distinct_color_count();
            let swatches = quantizer.get_quantized_colors();

            prop_assert!(swatches.len() <= max_colors);
            if distinct <= max_colors {
                prop_assert_eq!(swatches.len(), distinct);
            }
        }

        #[test]
        fn population_is_conserved_without_filters(
            pixels in prop::collection::vec(any::<u32>(), 0..500),
            max_colors in 1usize..24,
        ) {
            let filters = no_filters();
            let swatches = ColorCutQuantizer::new(&mut pixels.clone(), max_colors, &filters).get_quantized_colors();

            prop_assert_eq!(total_population(&swatches), pixels.len() as u64);
        }
    }
}
