//! Numeric building blocks shared by the nearest-neighbor crate and the demos.

use ndarray::NdFloat;
use num_traits::FromPrimitive;

mod common;
mod distance;

pub use common::DataPoint;
pub use distance::{Distance, DistanceMetric, L1Dist, L2Dist, LInfDist};

/// Scalar type for feature vectors: ndarray arithmetic plus conversion from
/// vote counts.
pub trait Float: NdFloat + FromPrimitive + Default {}

impl Float for f32 {}

impl Float for f64 {}
