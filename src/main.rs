//! GAF Inspector
//!
//! Prints the entry/frame tree of a GAF archive, or a JSON summary for
//! scripting.
//!
//! Usage:
//!   gaf-info <file.gaf>
//!   gaf-info <file.gaf> --json

use anyhow::{bail, Result};
use libgaf::{Decoder, FrameData, GafArchive, Layer};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Serialize)]
struct ArchiveSummary<'a> {
    path: &'a str,
    file_size: u64,
    version_id: u32,
    entry_count: usize,
    frame_count: usize,
    anomaly_count: usize,
    entries: Vec<EntrySummary<'a>>,
}

#[derive(Serialize)]
struct EntrySummary<'a> {
    name: &'a str,
    frames: Vec<FrameSummary>,
}

#[derive(Serialize)]
struct FrameSummary {
    duration: u32,
    layers: Vec<LayerSummary>,
}

#[derive(Serialize)]
struct LayerSummary {
    width: u16,
    height: u16,
    x_offset: u16,
    y_offset: u16,
    kind: &'static str,
}

fn print_usage() {
    println!("GAF Inspector");
    println!();
    println!("Usage:");
    println!("  gaf-info <file.gaf> [--json]");
    println!();
    println!("Options:");
    println!("  --json    Emit a JSON summary instead of the tree view");
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut json = false;
    let mut input: Option<String> = None;
    for arg in &args[1..] {
        match arg.as_str() {
            "--json" => json = true,
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            other => input = Some(other.to_string()),
        }
    }

    let input = match input {
        Some(path) => path,
        None => {
            print_usage();
            return Ok(());
        }
    };

    let mut decoder = Decoder::new();
    decoder.load(&input)?;
    let archive = decoder.archive().expect("archive present after load");

    if json {
        let summary = summarize(&input, decoder.file_size(), archive);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_tree(&input, decoder.file_size(), archive);
    }

    Ok(())
}

fn summarize<'a>(path: &'a str, file_size: u64, archive: &'a GafArchive) -> ArchiveSummary<'a> {
    ArchiveSummary {
        path,
        file_size,
        version_id: archive.version_id,
        entry_count: archive.entries.len(),
        frame_count: archive.frame_count(),
        anomaly_count: archive.anomalies.len(),
        entries: archive
            .entries
            .iter()
            .map(|entry| EntrySummary {
                name: &entry.name,
                frames: entry
                    .frames
                    .iter()
                    .map(|frame| FrameSummary {
                        duration: frame.duration,
                        layers: frame.data.layers().map(summarize_layer).collect(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn summarize_layer(layer: &Layer) -> LayerSummary {
    LayerSummary {
        width: layer.width,
        height: layer.height,
        x_offset: layer.x_offset,
        y_offset: layer.y_offset,
        kind: layer.pixels.kind_name(),
    }
}

fn print_tree(path: &str, file_size: u64, archive: &GafArchive) {
    println!(
        "{}: {} bytes, version {:#010x}",
        path, file_size, archive.version_id
    );
    println!(
        "{} entries, {} frames, {} layers",
        archive.entries.len(),
        archive.frame_count(),
        archive.layer_count()
    );

    for entry in &archive.entries {
        println!("  {} ({} frames)", entry.name, entry.frames.len());
        for (i, frame) in entry.frames.iter().enumerate() {
            match &frame.data {
                FrameData::Single(layer) => {
                    println!("    [{}] {} dur {}", i, describe_layer(layer), frame.duration);
                }
                FrameData::Multi(layers) => {
                    println!("    [{}] {} layers, dur {}", i, layers.len(), frame.duration);
                    for layer in layers {
                        println!("        - {}", describe_layer(layer));
                    }
                }
            }
        }
    }

    if !archive.anomalies.is_empty() {
        println!("{} layer(s) needed row-width repair:", archive.anomalies.len());
        for anomaly in &archive.anomalies {
            println!(
                "  entry '{}' frame {}: width {} -> {}",
                anomaly.entry, anomaly.frame_index, anomaly.declared_width, anomaly.padded_width
            );
        }
    }
}

fn describe_layer(layer: &Layer) -> String {
    format!(
        "{}x{} at ({},{}) {}",
        layer.width,
        layer.height,
        layer.x_offset,
        layer.y_offset,
        layer.pixels.kind_name()
    )
}
