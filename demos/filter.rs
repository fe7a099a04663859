use std::{env, error::Error};
use vibrance::{image::io::Reader as ImageReader, Filter, PaletteBuilder};

const BLACK_MAX_LIGHTNESS: f32 = 0.02;
const WHITE_MIN_LIGHTNESS: f32 = 0.90;

// same approach as the default filter, except it allows more darker colors and blocks more lighter colors
struct CustomFilter;
impl Filter for CustomFilter {
    fn is_allowed(&self, _: (u8, u8, u8), (_, _, l): (f32, f32, f32)) -> bool {
        !is_black(l) && !is_white(l)
    }
}

fn is_black(l: f32) -> bool {
    l <= BLACK_MAX_LIGHTNESS
}

fn is_white(l: f32) -> bool {
    l >= WHITE_MIN_LIGHTNESS
}

fn main() -> Result<(), Box<dyn Error>> {
    let path = env::args().nth(1).ok_or("usage: filter <image>")?;
    let image = ImageReader::open(path)?.decode()?;

    let palette = PaletteBuilder::from_image(image)
        .clear_filters() // remove the default filter
        .add_filter(CustomFilter) // add our custom filter
        .add_filter(|(r, g, b): (u8, u8, u8), _: (f32, f32, f32)| !(g > r && g > b)) // and skip greenish colors
        .generate();

    println!("{:#?}", palette);

    Ok(())
}
