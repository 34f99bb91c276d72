//! GAF Frame Exporter - decodes GAF archives and writes layers as PNG
//!
//! Indexed layers need an external palette to become colors; without one
//! they export as a grayscale index visualization. Packed 16-bit layers
//! convert through the color module.
//!
//! Usage:
//!   gaf-export <file.gaf> [<more.gaf> ...] [-o <dir>]
//!   gaf-export units.gaf --palette palette.pal -o out/
//!   gaf-export units.gaf --entry ARMCOM

use anyhow::{bail, Context, Result};
use image::{Rgba, RgbaImage};
use libgaf::{color, Decoder, FrameData, GafArchive, Layer, LayerPixels};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 256-color RGB palette, 3 bytes per color.
struct Palette([u8; 768]);

impl Palette {
    fn load(path: &str) -> Result<Self> {
        let data = std::fs::read(path).context("Failed to read palette")?;
        if data.len() != 768 {
            bail!(
                "Palette must be exactly 768 bytes (256 RGB colors), got {}",
                data.len()
            );
        }
        let mut colors = [0u8; 768];
        colors.copy_from_slice(&data);
        Ok(Self(colors))
    }

    fn color(&self, index: u8) -> [u8; 3] {
        let i = index as usize * 3;
        [self.0[i], self.0[i + 1], self.0[i + 2]]
    }
}

fn print_usage() {
    println!("GAF Frame Exporter");
    println!();
    println!("Usage:");
    println!("  gaf-export <file.gaf> [<more.gaf> ...] [options]");
    println!();
    println!("Options:");
    println!("  -o, --out-dir <dir>   Output directory (default: current)");
    println!("  --palette <file>      768-byte RGB palette for indexed layers");
    println!("  --entry <name>        Only export the named entry");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut inputs: Vec<String> = Vec::new();
    let mut out_dir = ".".to_string();
    let mut palette_path: Option<String> = None;
    let mut entry_filter: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--out-dir" => {
                if i + 1 >= args.len() {
                    bail!("{} needs a value", args[i]);
                }
                out_dir = args[i + 1].clone();
                i += 2;
            }
            "--palette" => {
                if i + 1 >= args.len() {
                    bail!("--palette needs a value");
                }
                palette_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--entry" => {
                if i + 1 >= args.len() {
                    bail!("--entry needs a value");
                }
                entry_filter = Some(args[i + 1].clone());
                i += 2;
            }
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            other => {
                inputs.push(other.to_string());
                i += 1;
            }
        }
    }

    if inputs.is_empty() {
        print_usage();
        return Ok(());
    }

    let palette = match &palette_path {
        Some(path) => Some(Palette::load(path)?),
        None => None,
    };

    let out_dir = Path::new(&out_dir);
    std::fs::create_dir_all(out_dir).context("Failed to create output directory")?;

    for input in &inputs {
        let mut decoder = Decoder::new();
        decoder.load_async(input).await?;
        let archive = decoder.archive().expect("archive present after load");

        let written = export_archive(archive, out_dir, palette.as_ref(), entry_filter.as_deref())?;
        println!("{}: wrote {} image(s)", input, written);
    }

    Ok(())
}

fn export_archive(
    archive: &GafArchive,
    out_dir: &Path,
    palette: Option<&Palette>,
    entry_filter: Option<&str>,
) -> Result<usize> {
    let mut written = 0;

    for entry in &archive.entries {
        if let Some(name) = entry_filter {
            if entry.name != name {
                continue;
            }
        }

        for (frame_index, frame) in entry.frames.iter().enumerate() {
            match &frame.data {
                FrameData::Single(layer) => {
                    let file = format!("{}_{:03}.png", entry.name, frame_index);
                    written += save_layer(layer, &out_dir.join(file), palette)?;
                }
                FrameData::Multi(layers) => {
                    for (layer_index, layer) in layers.iter().enumerate() {
                        let file =
                            format!("{}_{:03}_l{}.png", entry.name, frame_index, layer_index);
                        written += save_layer(layer, &out_dir.join(file), palette)?;
                    }
                }
            }
        }
    }

    Ok(written)
}

fn save_layer(layer: &Layer, path: &Path, palette: Option<&Palette>) -> Result<usize> {
    if layer.pixels.width() == 0 || layer.pixels.height() == 0 {
        log::warn!("skipping empty layer for {:?}", path);
        return Ok(0);
    }

    let image = layer_to_image(layer, palette);
    image
        .save(path)
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(1)
}

fn layer_to_image(layer: &Layer, palette: Option<&Palette>) -> RgbaImage {
    let height = layer.pixels.height() as u32;

    match &layer.pixels {
        LayerPixels::Indexed { width, pixels, .. } => {
            let row = *width;
            let transparency = layer.transparency_index;
            RgbaImage::from_fn(row as u32, height, |x, y| {
                let index = pixels[y as usize * row + x as usize];
                if index == transparency {
                    return Rgba([0, 0, 0, 0]);
                }
                match palette {
                    Some(pal) => {
                        let [r, g, b] = pal.color(index);
                        Rgba([r, g, b, 255])
                    }
                    None => Rgba([index, index, index, 255]),
                }
            })
        }
        LayerPixels::Packed {
            format,
            width,
            pixels,
            ..
        } => {
            let row = *width;
            let format = *format;
            RgbaImage::from_fn(row as u32, height, |x, y| {
                let packed = pixels[y as usize * row + x as usize];
                let [a, r, g, b] = color::packed_to_components(packed, format);
                Rgba([r, g, b, a])
            })
        }
    }
}
