use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use image_to_palette_wasm::{
    DEFAULT_COUNT, ExtractOptions, Extractor, KMeans, Mode, NormalizeOptions, text_color,
    validate_count,
};
use serde_json::json;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    /// k-means, falling back to color counting on failure
    Auto,
    /// Quantized color counting only
    Count,
}

/// Print the dominant colors of images as `#rrggbb` codes.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of colors to extract
    #[arg(short = 'k', long, default_value_t = DEFAULT_COUNT as i64, allow_negative_numbers = true)]
    count: i64,

    /// Estimation strategy
    #[arg(short, long, value_enum, default_value_t = ModeArg::Auto)]
    mode: ModeArg,

    /// Side length images are resized to before estimation
    #[arg(short, long, default_value_t = 150)]
    size: u32,

    /// Seed for k-means initialisation
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Emit JSON instead of one color per line
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let options = ExtractOptions {
        count: validate_count(args.count)?,
        mode: match args.mode {
            ModeArg::Auto => Mode::Auto,
            ModeArg::Count => Mode::Count,
        },
        normalize: NormalizeOptions {
            size: args.size,
            ..Default::default()
        },
        kmeans: KMeans {
            seed: args.seed,
            ..Default::default()
        },
        ..Default::default()
    };
    let extractor = Extractor::new(options);

    let mut documents = Vec::new();
    for input in &args.inputs {
        let palette = extractor
            .extract(input)
            .with_context(|| format!("color extraction failed for {}", input.display()))?;

        if args.json {
            let colors: Vec<_> = palette
                .entries
                .iter()
                .map(|e| {
                    json!({
                        "hex": e.hex(),
                        "rank": e.rank,
                        "population": e.population,
                        "text": text_color(e.color()).as_str(),
                    })
                })
                .collect();
            documents.push(json!({
                "path": input.display().to_string(),
                "method": palette.method.as_str(),
                "colors": colors,
            }));
        } else {
            if args.inputs.len() > 1 {
                println!("{}:", input.display());
            }
            for hex in palette.hex_codes() {
                println!("{hex}");
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&documents)?);
    }

    Ok(())
}
