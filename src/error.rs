use k_nn::KnnError;
use thiserror::Error;

/// Failures surfaced by the demos.
///
/// None of these are fatal to the process: the affected operation is
/// abandoned for that invocation and the error is shown once to the user.
#[derive(Debug, Error)]
pub enum DemoError {
    /// An adapter was used before its model finished initializing.
    #[error("Model is not ready yet")]
    ModelNotReady,
    #[error("Failed to read image \"{name}\": {source}")]
    ImageRead {
        name: String,
        source: std::io::Error,
    },
    #[error("Failed to decode image \"{name}\": {source}")]
    ImageDecode {
        name: String,
        source: image::ImageError,
    },
    /// A rotation prediction was requested before any example was stored.
    #[error("No training examples stored yet")]
    EmptyExampleStore,
    #[error("Load at least one image first")]
    NoImages,
    #[error("Embedding failed: {0}")]
    Embedding(String),
    #[error("Classification failed: {0}")]
    Classification(String),
    #[error("Nearest-neighbor classifier error: {0}")]
    NearestNeighbor(#[from] KnnError),
}

impl DemoError {
    /// True for the failures that come from a single bad image rather than
    /// from the session as a whole.
    pub fn is_image_failure(&self) -> bool {
        matches!(self, DemoError::ImageRead { .. } | DemoError::ImageDecode { .. })
    }
}
