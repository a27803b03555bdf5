use thiserror::Error;

/// Errors surfaced to callers of the extraction pipeline.
///
/// Clustering problems never show up here: they are absorbed by the
/// counting fallback (see [`ClusterFailure`]).
#[derive(Debug, Error)]
pub enum Error {
    /// The source could not be read, or is not a supported raster image.
    #[error("unable to decode image: {0}")]
    Decode(#[source] image::ImageError),
    /// A caller-supplied parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Decode(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Decode(image::ImageError::IoError(err))
    }
}

/// Reasons the clustering estimator could not produce a palette.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterFailure {
    /// Crate was built without the `kmeans` feature.
    #[error("k-means clustering is not available in this build")]
    Unavailable,
    #[error("cannot form {k} clusters from {pixels} pixels")]
    InvalidParameter { k: usize, pixels: usize },
    /// Cluster assignments are stored as `u8`, so k is capped at 255.
    #[error("k-means supports at most 255 clusters, {k} requested")]
    TooManyClusters { k: usize },
    #[error("only {distinct} distinct colors for {k} clusters")]
    TooFewColors { distinct: usize, k: usize },
    #[error("k-means did not converge: {0}")]
    NonConvergence(&'static str),
}
