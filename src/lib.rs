//! Dominant color palettes from raster images.
//!
//! The pipeline:
//! 1. Decode the image and normalize it to a small, fixed-size RGB matrix.
//! 2. Cluster the pixels with k-means and rank centroids by population.
//! 3. If clustering fails for any reason, quantize to at most 64 colors and
//!    rank them by pixel count instead.
//! 4. Encode every color as `#rrggbb`.
//!
//! ```no_run
//! let colors = image_to_palette_wasm::extract(std::path::Path::new("photo.jpg"), 10)?;
//! for hex in colors {
//!     println!("{hex}");
//! }
//! # Ok::<(), image_to_palette_wasm::Error>(())
//! ```

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

pub mod cluster;
pub mod count;
pub mod error;
pub mod extract;
pub mod hex;
pub mod normalize;

pub use cluster::{Cluster, ClusterEstimator, KMeans};
pub use error::{ClusterFailure, Error};
pub use extract::{
    DEFAULT_COUNT, ExtractOptions, Extractor, Method, Mode, Palette, PaletteEntry, extract,
    extract_with_options, validate_count,
};
pub use hex::{TextColor, parse_hex, text_color, to_hex};
pub use normalize::{ImageSource, NormalizeOptions, PixelMatrix};

/// Extract the dominant colors of an encoded image (PNG, JPEG, GIF, ...).
///
/// Resolves to `{ colors: string[], method: "clustering" | "counting" }`,
/// with `colors` holding at most `count` `#rrggbb` codes.
///
/// Panics abort on wasm32, so a panic inside k-means is not caught here
/// the way it is natively; inputs known to upset `kmeans_colors` (too few
/// distinct colors, more than 255 clusters) are routed to counting before
/// it runs.
#[wasm_bindgen]
pub fn extract_colors(input: Vec<u8>, count: i32) -> Result<Object, JsValue> {
    let count = validate_count(count as i64).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let palette = Extractor::new(ExtractOptions::with_count(count))
        .extract(&input)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let colors_js = Array::new();
    for hex in palette.hex_codes() {
        colors_js.push(&JsValue::from_str(&hex));
    }

    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("colors"), &colors_js)?;
    Reflect::set(
        &result,
        &JsValue::from_str("method"),
        &JsValue::from_str(palette.method.as_str()),
    )?;

    Ok(result)
}
