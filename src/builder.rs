use crate::{
    color_cut_quantizer::ColorCutQuantizer,
    config::{GenerationConfig, Resize},
    error::{Error, Result},
    filter::{DefaultFilter, Filter},
    swatch::Swatch,
    target::Target,
    Palette,
};
use image::{imageops::FilterType, math::Rect, DynamicImage, GenericImageView, RgbImage};
use log::debug;
use std::time::Instant;

/// Builder for generating [`Palette`] instances, either from an image or from a list of swatches.
///
/// The builder starts with the six built-in targets and the [`DefaultFilter`].
pub struct PaletteBuilder {
    source: Source,
    targets: Vec<Target>,
    config: GenerationConfig,
    region: Option<Rect>,
    filters: Vec<Box<dyn Filter>>,
}

enum Source {
    Image(RgbImage),
    Swatches(Vec<Swatch>),
}

impl PaletteBuilder {
    /// Start from an image. The image's colors are quantized into swatches when generating.
    pub fn from_image<I>(image: I) -> Self
    where
        I: Into<DynamicImage>,
    {
        let image: DynamicImage = image.into();
        Self::with_source(Source::Image(image.into_rgb8()))
    }

    /// Start from a pre-generated, non-empty list of swatches. Quantization, resizing and regions
    /// don't apply to swatches.
    pub fn from_swatches(swatches: Vec<Swatch>) -> Result<Self> {
        if swatches.is_empty() {
            return Err(Error::EmptySwatches);
        }

        Ok(Self::with_source(Source::Swatches(swatches)))
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            targets: Target::default_targets().to_vec(),
            config: GenerationConfig::default(),
            region: None,
            filters: vec![Box::new(DefaultFilter)],
        }
    }

    /// Replace the whole generation config.
    pub fn config(self, config: GenerationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, ..self })
    }

    /// Set the maximum number of colors to use in the quantization step.
    pub fn maximum_color_count(mut self, colors: usize) -> Self {
        self.config.maximum_color_count = colors;
        self
    }

    /// Scale images with an area larger than `resize_area` down to that area before quantization.
    /// Zero disables resizing.
    pub fn resize_image_area(mut self, resize_area: u32) -> Self {
        self.config.resize = if resize_area > 0 {
            Resize::Area(resize_area)
        } else {
            Resize::Disabled
        };
        self
    }

    /// Scale images whose longest side is larger than `max_dimension` down before quantization. Zero
    /// disables resizing.
    pub fn resize_max_dimension(mut self, max_dimension: u32) -> Self {
        self.config.resize = if max_dimension > 0 {
            Resize::MaxDimension(max_dimension)
        } else {
            Resize::Disabled
        };
        self
    }

    /// Set how many bits per channel are kept when quantizing, between 1 and 8.
    pub fn quantize_word_width(mut self, word_width: u32) -> Result<Self> {
        crate::color_cut_quantizer::validate_word_width(word_width)?;
        self.config.quantize_word_width = word_width;
        Ok(self)
    }

    /// Use only a region of the image when calculating the palette. The region is clipped to the
    /// image and has to overlap it.
    pub fn region(self, x: u32, y: u32, width: u32, height: u32) -> Result<Self> {
        let Source::Image(image) = &self.source else {
            return Ok(self);
        };

        let (image_width, image_height) = image.dimensions();
        let right = x.saturating_add(width).min(image_width);
        let bottom = y.saturating_add(height).min(image_height);

        if x >= right || y >= bottom {
            return Err(Error::RegionOutsideImage {
                x,
                y,
                width,
                height,
                image_width,
                image_height,
            });
        }

        Ok(Self {
            region: Some(Rect {
                x,
                y,
                width: right - x,
                height: bottom - y,
            }),
            ..self
        })
    }

    /// Add a target to be generated in the palette. A target that was already added is ignored.
    pub fn add_target(mut self, target: Target) -> Self {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }

        self
    }

    pub fn add_filter<F>(mut self, filter: F) -> Self
    where
        F: Filter + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn clear_region(self) -> Self {
        Self { region: None, ..self }
    }

    /// Remove all targets, including the built-in ones.
    pub fn clear_targets(self) -> Self {
        Self {
            targets: Vec::new(),
            ..self
        }
    }

    /// Remove all filters, including the default one.
    pub fn clear_filters(self) -> Self {
        Self {
            filters: Vec::new(),
            ..self
        }
    }

    pub fn generate(self) -> Palette {
        let start = Instant::now();
        let PaletteBuilder {
            source,
            targets,
            config,
            region,
            filters,
        } = self;

        let swatches = match source {
            Source::Swatches(swatches) => swatches,
            Source::Image(image) => {
                let swatches = quantize_image(image, region, &config, &filters);
                debug!("color quantization completed in {:?}", start.elapsed());
                swatches
            }
        };

        let palette = Palette::generate(swatches, targets);
        debug!(
            "created palette of {} swatches in {:?}",
            palette.swatches().len(),
            start.elapsed()
        );

        palette
    }
}

fn quantize_image(
    image: RgbImage,
    region: Option<Rect>,
    config: &GenerationConfig,
    filters: &[Box<dyn Filter>],
) -> Vec<Swatch> {
    let (image, region) = scale_image_down(image, region, config.resize);
    let mut pixels = get_pixels(&image, region);

    ColorCutQuantizer::build(
        &mut pixels,
        config.maximum_color_count,
        filters,
        config.quantize_word_width,
    )
    .get_quantized_colors()
}

fn scale_image_down(image: RgbImage, region: Option<Rect>, resize: Resize) -> (RgbImage, Option<Rect>) {
    let (width, height) = image.dimensions();
    let Some(scale_ratio) = resize.scale_ratio(width, height) else {
        return (image, region);
    };

    let scaled_width = (width as f64 * scale_ratio).ceil() as u32;
    let scaled_height = (height as f64 * scale_ratio).ceil() as u32;
    debug!(
        "scaling image down from {}x{} to {}x{}",
        width, height, scaled_width, scaled_height
    );

    let scaled = image::imageops::resize(&image, scaled_width, scaled_height, FilterType::Nearest);

    // scale down the region to match the new scaled image
    let scale = scaled_width as f64 / width as f64;
    let region = region.map(|region| scale_region(region, scale, scaled_width, scaled_height));

    (scaled, region)
}

fn scale_region(region: Rect, scale: f64, image_width: u32, image_height: u32) -> Rect {
    let left = (region.x as f64 * scale).floor() as u32;
    let top = (region.y as f64 * scale).floor() as u32;
    let right = (((region.x + region.width) as f64 * scale).ceil() as u32).min(image_width);
    let bottom = (((region.y + region.height) as f64 * scale).ceil() as u32).min(image_height);

    Rect {
        x: left,
        y: top,
        width: right.saturating_sub(left),
        height: bottom.saturating_sub(top),
    }
}

fn get_pixels(image: &RgbImage, region: Option<Rect>) -> Vec<u32> {
    let view = if let Some(region) = region {
        image.view(region.x, region.y, region.width, region.height)
    } else {
        image.view(0, 0, image.width(), image.height())
    };

    view.pixels()
        .map(|(_, _, pixel)| {
            let [r, g, b] = pixel.0;
            0xff00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32
        })
        .collect()
}
