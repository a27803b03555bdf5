use std::collections::HashSet;

use palette::Srgb;

use crate::error::ClusterFailure;
use crate::normalize::PixelMatrix;

/// A k-means centroid in 0–255 channel units, with the number of pixels
/// assigned to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cluster {
    pub centroid: [f32; 3],
    pub population: usize,
}

/// Something that can partition a pixel matrix into `k` color clusters.
///
/// Implementations return exactly `k` clusters, most populous first.
pub trait ClusterEstimator {
    fn estimate(&self, pixels: &PixelMatrix, k: usize) -> Result<Vec<Cluster>, ClusterFailure>;
}

/// Lloyd-style k-means in RGB space, backed by `kmeans_colors`.
///
/// Seeding is k-means++ driven by `seed`, so results are reproducible.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KMeans {
    pub max_iter: usize,
    /// Stop once the summed squared centroid movement (8-bit units) drops
    /// below this.
    pub converge: f32,
    pub seed: u64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            max_iter: 20,
            converge: 1e-3,
            seed: 0,
        }
    }
}

/// Cluster indices inside `kmeans_colors` are `u8`.
const MAX_CLUSTERS: usize = u8::MAX as usize;

impl ClusterEstimator for KMeans {
    fn estimate(&self, pixels: &PixelMatrix, k: usize) -> Result<Vec<Cluster>, ClusterFailure> {
        if k == 0 || k > pixels.len() {
            return Err(ClusterFailure::InvalidParameter {
                k,
                pixels: pixels.len(),
            });
        }
        if !cfg!(feature = "kmeans") {
            return Err(ClusterFailure::Unavailable);
        }

        // A flat image would only collapse every centroid onto one point.
        let distinct = distinct_colors(pixels.pixels(), k.max(2));
        if distinct == 1 {
            let p = pixels.pixels()[0];
            let mut clusters = vec![
                Cluster {
                    centroid: [p.red as f32, p.green as f32, p.blue as f32],
                    population: 0,
                };
                k
            ];
            clusters[0].population = pixels.len();
            return Ok(clusters);
        }
        if distinct < k {
            return Err(ClusterFailure::TooFewColors { distinct, k });
        }
        if k > MAX_CLUSTERS {
            return Err(ClusterFailure::TooManyClusters { k });
        }

        self.run(pixels, k)
    }
}

impl KMeans {
    #[cfg(feature = "kmeans")]
    fn run(&self, pixels: &PixelMatrix, k: usize) -> Result<Vec<Cluster>, ClusterFailure> {
        use kmeans_colors::get_kmeans;

        // Channels stay in 0–255 so integer means come out exact. An
        // emptied centroid is reseeded by `kmeans_colors` in 0.0–1.0, i.e.
        // near black here; if it is still empty at the end the run is
        // rejected below and the caller falls back to counting.
        let buf: Vec<Srgb<f32>> = pixels
            .pixels()
            .iter()
            .map(|p| Srgb::new(p.red as f32, p.green as f32, p.blue as f32))
            .collect();

        // Only effective where panics unwind; wasm32 aborts instead, which
        // is why the distinct-color and k guards run before this.
        let (max_iter, converge, seed) = (self.max_iter, self.converge, self.seed);
        let result = std::panic::catch_unwind(|| get_kmeans(k, max_iter, converge, false, &buf, seed))
            .map_err(|_| ClusterFailure::NonConvergence("k-means panicked"))?;

        let centroids: Vec<[f32; 3]> = result
            .centroids
            .iter()
            .map(|c| [c.red, c.green, c.blue])
            .collect();
        let clusters = collect_clusters(&centroids, &result.indices, k)?;
        log::debug!("k-means settled on {k} clusters after at most {max_iter} iterations");
        Ok(clusters)
    }

    #[cfg(not(feature = "kmeans"))]
    fn run(&self, _pixels: &PixelMatrix, _k: usize) -> Result<Vec<Cluster>, ClusterFailure> {
        Err(ClusterFailure::Unavailable)
    }
}

/// Pair centroids with their assigned-pixel counts and order them most
/// populous first. Empty or non-finite clusters count as a failed run.
#[cfg_attr(not(feature = "kmeans"), allow(dead_code))]
fn collect_clusters(
    centroids: &[[f32; 3]],
    indices: &[u8],
    k: usize,
) -> Result<Vec<Cluster>, ClusterFailure> {
    if centroids.len() != k {
        return Err(ClusterFailure::NonConvergence("wrong number of centroids"));
    }

    let mut population = vec![0usize; k];
    for &idx in indices {
        match population.get_mut(idx as usize) {
            Some(n) => *n += 1,
            None => return Err(ClusterFailure::NonConvergence("pixel assigned to unknown cluster")),
        }
    }

    let mut clusters: Vec<Cluster> = centroids
        .iter()
        .zip(population)
        .map(|(&centroid, population)| Cluster {
            centroid,
            population,
        })
        .collect();

    if clusters
        .iter()
        .any(|c| c.centroid.iter().any(|v| !v.is_finite()))
    {
        return Err(ClusterFailure::NonConvergence("non-finite centroid"));
    }
    if clusters.iter().any(|c| c.population == 0) {
        return Err(ClusterFailure::NonConvergence("empty cluster"));
    }

    // Stable: equal populations keep k-means order.
    clusters.sort_by(|a, b| b.population.cmp(&a.population));
    Ok(clusters)
}

/// Number of distinct colors in `pixels`, counting no further than `limit`.
fn distinct_colors(pixels: &[Srgb<u8>], limit: usize) -> usize {
    let mut seen = HashSet::new();
    for p in pixels {
        seen.insert([p.red, p.green, p.blue]);
        if seen.len() >= limit {
            break;
        }
    }
    seen.len()
}
