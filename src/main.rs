use std::{env, error::Error, process};
use vibrance::{image::io::Reader as ImageReader, Palette, Swatch};

fn main() -> Result<(), Box<dyn Error>> {
    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: vibrance <image>");
        process::exit(2);
    };

    let image = ImageReader::open(&path)?.with_guessed_format()?.decode()?;
    let palette = Palette::from_image(image).generate();

    print_swatch("light vibrant", palette.light_vibrant_swatch());
    print_swatch("vibrant", palette.vibrant_swatch());
    print_swatch("dark vibrant", palette.dark_vibrant_swatch());
    print_swatch("light muted", palette.light_muted_swatch());
    print_swatch("muted", palette.muted_swatch());
    print_swatch("dark muted", palette.dark_muted_swatch());
    print_swatch("dominant", palette.dominant_swatch());

    Ok(())
}

fn print_swatch(name: &str, swatch: Option<&Swatch>) {
    match swatch {
        Some(swatch) => println!("{:>14}: {}", name, swatch),
        None => println!("{:>14}: -", name),
    }
}
