use std::{env, error::Error};
use vibrance::{image::io::Reader as ImageReader, PaletteBuilder};

fn main() -> Result<(), Box<dyn Error>> {
    let path = env::args().nth(1).ok_or("usage: basic <image>")?;
    let image = ImageReader::open(path)?.decode()?;

    let palette = PaletteBuilder::from_image(image)
        .resize_image_area(0) // quantize every pixel
        .generate();

    println!("{:#?}", palette);

    for swatch in palette.swatches() {
        println!("{} title {:?} body {:?}", swatch, swatch.title_text_color(), swatch.body_text_color());
    }

    Ok(())
}
