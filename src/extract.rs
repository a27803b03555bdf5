use palette::Srgb;

use crate::cluster::{Cluster, ClusterEstimator, KMeans};
use crate::count::{self, Bucket, MAX_QUANTIZED_COLORS};
use crate::error::Error;
use crate::hex::{Channel, to_hex};
use crate::normalize::{self, ImageSource, NormalizeOptions, PixelMatrix};

/// Palette length used when the caller does not ask for one.
pub const DEFAULT_COUNT: usize = 10;

/// Which estimator produced a palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Clustering,
    Counting,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Clustering => "clustering",
            Method::Counting => "counting",
        }
    }
}

/// How dominant colors are estimated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// k-means first, quantized counting if that fails.
    #[default]
    Auto,
    /// Quantized counting only.
    Count,
}

/// One ranked color of a [`Palette`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaletteEntry {
    /// 1-based position, most dominant first.
    pub rank: usize,
    /// Channel values in 0–255 units. Centroids are not rounded.
    pub rgb: [f32; 3],
    /// Pixels of the normalized image attributed to this color.
    pub population: usize,
}

impl PaletteEntry {
    pub fn hex(&self) -> String {
        to_hex(self.rgb)
    }

    /// The entry as an 8-bit color, truncated the same way as [`Self::hex`].
    pub fn color(&self) -> Srgb<u8> {
        Srgb::new(
            self.rgb[0].low_byte(),
            self.rgb[1].low_byte(),
            self.rgb[2].low_byte(),
        )
    }
}

/// Dominant colors of an image, most dominant first.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pub method: Method,
    pub entries: Vec<PaletteEntry>,
}

impl Palette {
    fn from_clusters(clusters: impl IntoIterator<Item = Cluster>) -> Self {
        let entries = clusters
            .into_iter()
            .enumerate()
            .map(|(i, c)| PaletteEntry {
                rank: i + 1,
                rgb: c.centroid,
                population: c.population,
            })
            .collect();
        Palette {
            method: Method::Clustering,
            entries,
        }
    }

    fn from_buckets(buckets: Vec<Bucket>) -> Self {
        let entries = buckets
            .into_iter()
            .enumerate()
            .map(|(i, b)| PaletteEntry {
                rank: i + 1,
                rgb: [b.color.red as f32, b.color.green as f32, b.color.blue as f32],
                population: b.count,
            })
            .collect();
        Palette {
            method: Method::Counting,
            entries,
        }
    }

    pub fn hex_codes(&self) -> Vec<String> {
        self.entries.iter().map(PaletteEntry::hex).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every knob of one extraction. Nothing is read from global state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtractOptions {
    /// Maximum palette length.
    ///
    /// k-means handles at most 255 clusters. Above that, [`Mode::Auto`]
    /// falls back to counting, whose palette holds at most
    /// `quantize_colors` (64 by default) entries.
    pub count: usize,
    pub mode: Mode,
    pub normalize: NormalizeOptions,
    pub kmeans: KMeans,
    /// Size of the quantized palette the counting estimator draws from.
    pub quantize_colors: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            mode: Mode::Auto,
            normalize: NormalizeOptions::default(),
            kmeans: KMeans::default(),
            quantize_colors: MAX_QUANTIZED_COLORS,
        }
    }
}

impl ExtractOptions {
    pub fn with_count(count: usize) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }
}

/// Check a signed, caller-supplied palette length.
pub fn validate_count(count: i64) -> Result<usize, Error> {
    if count <= 0 {
        return Err(Error::InvalidParameter(format!(
            "color count must be positive, got {count}"
        )));
    }
    usize::try_from(count)
        .map_err(|_| Error::InvalidParameter(format!("color count {count} is too large")))
}

/// Runs normalization, clustering and the counting fallback.
#[derive(Clone, Debug)]
pub struct Extractor<C = KMeans> {
    options: ExtractOptions,
    estimator: C,
}

impl Extractor<KMeans> {
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            estimator: options.kmeans,
            options,
        }
    }
}

impl Default for Extractor<KMeans> {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}

impl<C: ClusterEstimator> Extractor<C> {
    /// Swap the clustering estimator, keeping the options.
    pub fn with_estimator<D: ClusterEstimator>(self, estimator: D) -> Extractor<D> {
        Extractor {
            options: self.options,
            estimator,
        }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Decode and normalize `source`, then estimate its palette.
    pub fn extract<'a>(&self, source: impl Into<ImageSource<'a>>) -> Result<Palette, Error> {
        self.check()?;
        let matrix = normalize::load(source.into(), &self.options.normalize)?;
        self.extract_pixels(&matrix)
    }

    /// Estimate the palette of an already-normalized matrix.
    ///
    /// Once the matrix exists this only fails on invalid options: any
    /// clustering failure is replaced by the counting estimator's result.
    pub fn extract_pixels(&self, matrix: &PixelMatrix) -> Result<Palette, Error> {
        self.check()?;
        let k = self.options.count;

        let palette = match self.options.mode {
            Mode::Count => self.count(matrix, k),
            Mode::Auto => match self.estimator.estimate(matrix, k) {
                Ok(clusters) => Palette::from_clusters(clusters.into_iter().take(k)),
                Err(failure) => {
                    log::warn!("clustering failed ({failure}); falling back to color counting");
                    self.count(matrix, k)
                }
            },
        };
        log::debug!(
            "extracted {} colors by {}",
            palette.len(),
            palette.method.as_str()
        );
        Ok(palette)
    }

    fn count(&self, matrix: &PixelMatrix, k: usize) -> Palette {
        Palette::from_buckets(count::dominant(matrix, k, self.options.quantize_colors))
    }

    fn check(&self) -> Result<(), Error> {
        if self.options.count == 0 {
            return Err(Error::InvalidParameter(
                "color count must be at least 1".into(),
            ));
        }
        if self.options.quantize_colors == 0 {
            return Err(Error::InvalidParameter(
                "quantized palette must hold at least 1 color".into(),
            ));
        }
        Ok(())
    }
}

/// Dominant colors of `source` as `#rrggbb` strings, most dominant first.
///
/// At most `count` codes come back. For `count` above 255 the result comes
/// from quantized counting and holds at most 64 codes.
pub fn extract<'a>(source: impl Into<ImageSource<'a>>, count: usize) -> Result<Vec<String>, Error> {
    Extractor::new(ExtractOptions::with_count(count))
        .extract(source)
        .map(|palette| palette.hex_codes())
}

pub fn extract_with_options<'a>(
    source: impl Into<ImageSource<'a>>,
    options: &ExtractOptions,
) -> Result<Palette, Error> {
    Extractor::new(*options).extract(source)
}
