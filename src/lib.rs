//! Two demos around a pretrained image network: pseudo-labeling images with
//! a classifier, and a self-supervised rotation-prediction loop that trains a
//! nearest-neighbor classifier on embeddings of rotated crops.

pub mod config;
pub mod controller;
pub mod embedding;
pub mod error;
pub mod images;
pub mod labeling;
pub mod logging;
pub mod render;
pub mod session;
pub mod stats;
pub mod training;

pub use config::{DemoConfig, ImageSettings, LabelingSettings, RotationSettings};
pub use controller::{IterationOutcome, LoopController, LoopState, RunSummary, StopHandle};
pub use embedding::{Embedding, EmbeddingModel, PixelEmbedder};
pub use error::DemoError;
pub use images::{ImageEntry, ImageSource, ImageStore};
pub use labeling::{
    ClassificationResult, HistoryEntry, HistoryLog, ImageClassifier, LabelOutcome,
    PaletteClassifier, PseudoLabeler,
};
pub use pseudolab_helpers::{DataPoint, Distance, DistanceMetric, L1Dist, L2Dist, LInfDist};
pub use render::{Rotation, render_rotated};
pub use session::{RotationSession, Trial};
pub use stats::Stats;
pub use training::{ExampleStore, RotationPrediction};
