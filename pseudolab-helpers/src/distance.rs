use crate::Float;
use ndarray::{ArrayView1, Zip};
use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A distance between two feature vectors of equal length.
pub trait Distance<F: Float>: Clone + Send + Sync {
    /// The true distance between `a` and `b`.
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F;

    /// A cheaper quantity with the same ordering as `distance`.
    ///
    /// Neighbor searches only compare distances, so metrics whose final step
    /// is monotonic (a square root for L2) can skip it here.
    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        self.distance(a, b)
    }
}

/// Manhattan distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct L1Dist;

impl<F: Float> Distance<F> for L1Dist {
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        Zip::from(&a)
            .and(&b)
            .fold(F::zero(), |acc, &x, &y| acc + (x - y).abs())
    }
}

/// Euclidean distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct L2Dist;

impl<F: Float> Distance<F> for L2Dist {
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        self.rdistance(a, b).sqrt()
    }

    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        Zip::from(&a).and(&b).fold(F::zero(), |acc, &x, &y| {
            let d = x - y;
            acc + d * d
        })
    }
}

/// Chebyshev (L-infinity) distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LInfDist;

impl<F: Float> Distance<F> for LInfDist {
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        Zip::from(&a)
            .and(&b)
            .fold(F::zero(), |acc, &x, &y| acc.max((x - y).abs()))
    }
}

/// Runtime-selectable metric, for when the choice comes from configuration.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DistanceMetric {
    Manhattan,
    #[default]
    Euclidean,
    Chebyshev,
}

impl<F: Float> Distance<F> for DistanceMetric {
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        match self {
            DistanceMetric::Manhattan => L1Dist.distance(a, b),
            DistanceMetric::Euclidean => L2Dist.distance(a, b),
            DistanceMetric::Chebyshev => LInfDist.distance(a, b),
        }
    }

    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        match self {
            DistanceMetric::Manhattan => L1Dist.rdistance(a, b),
            DistanceMetric::Euclidean => L2Dist.rdistance(a, b),
            DistanceMetric::Chebyshev => LInfDist.rdistance(a, b),
        }
    }
}

impl Display for DistanceMetric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceMetric::Manhattan => write!(f, "L1"),
            DistanceMetric::Euclidean => write!(f, "L2"),
            DistanceMetric::Chebyshev => write!(f, "L-Infinity"),
        }
    }
}
