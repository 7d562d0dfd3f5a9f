use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use ndarray::{Array1, ArrayView1};
use pseudolab_helpers::{DataPoint, Distance, Float};
use thiserror::Error;

/// Errors that can occur when using the k-NN classifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KnnError {
    /// k cannot be zero for a k-NN classifier
    #[error("k cannot be zero for a k-NN classifier")]
    InvalidK,
    /// Cannot predict with an empty training set
    #[error("Cannot predict with an empty training set")]
    EmptyTrainingSet,
    /// A vector's length differs from the examples already stored
    #[error("Expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// Invalid distance comparison (likely due to NaN values in data)
    #[error("Invalid distance comparison (likely due to NaN values in data)")]
    InvalidDistance,
}

/// The outcome of a single k-NN query.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction<L, F>
where
    L: Eq + Hash,
{
    /// The label that won the vote.
    pub label: L,
    /// Share of the considered neighbors that voted for each label.
    ///
    /// Every label with at least one stored example is present, so labels
    /// that received no votes show up with a confidence of zero.
    pub confidences: HashMap<L, F>,
}

impl<L, F> Prediction<L, F>
where
    L: Eq + Hash,
    F: Float,
{
    /// Confidence for `label`, zero if it never appeared.
    pub fn confidence(&self, label: &L) -> F {
        self.confidences.get(label).copied().unwrap_or_else(F::zero)
    }
}

/// An incremental k-Nearest Neighbors (k-NN) classifier.
///
/// Examples are added one at a time and can be dropped per class or all at
/// once. A query finds the `k` stored examples closest to the input and takes
/// a majority vote among their labels.
///
/// # Type Parameters
///
/// * `L`: The type of the label (e.g., `String`, `i32`, or a custom `enum`).
/// * `F`: The float type for the features (e.g., `f32`, `f64`).
/// * `D`: The distance metric, which must implement the `Distance` trait.
#[derive(Debug, Clone)]
pub struct KnnClassifier<L, F, D>
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
    D: Distance<F>,
{
    training_data: Vec<DataPoint<L, F>>,
    distance: D,
}

impl<L, F, D> KnnClassifier<L, F, D>
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
    D: Distance<F>,
{
    /// Creates an empty classifier that compares examples with `distance`.
    pub fn new(distance: D) -> Self {
        Self {
            training_data: Vec::new(),
            distance,
        }
    }

    /// Creates a classifier pre-loaded with `training_data`.
    ///
    /// # Errors
    ///
    /// Returns `KnnError::DimensionMismatch` if the points do not all have the
    /// same number of features.
    pub fn with_examples(
        training_data: Vec<DataPoint<L, F>>,
        distance: D,
    ) -> Result<Self, KnnError> {
        let mut classifier = Self::new(distance);
        for point in training_data {
            classifier.add_example(point.features, point.label)?;
        }
        Ok(classifier)
    }

    /// Stores one labeled example.
    ///
    /// # Errors
    ///
    /// Returns `KnnError::DimensionMismatch` if `features` is not as long as
    /// the examples already stored.
    pub fn add_example(&mut self, features: Array1<F>, label: L) -> Result<(), KnnError> {
        if let Some(expected) = self.dimension() {
            if features.len() != expected {
                return Err(KnnError::DimensionMismatch {
                    expected,
                    actual: features.len(),
                });
            }
        }
        self.training_data.push(DataPoint::new(features, label));
        Ok(())
    }

    /// Feature length of the stored examples, `None` while empty.
    pub fn dimension(&self) -> Option<usize> {
        self.training_data.first().map(DataPoint::dimension)
    }

    /// Total number of stored examples across all classes.
    pub fn len(&self) -> usize {
        self.training_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.training_data.is_empty()
    }

    /// Number of stored examples for each label.
    pub fn class_example_counts(&self) -> HashMap<L, usize> {
        let mut counts = HashMap::new();
        for point in &self.training_data {
            *counts.entry(point.label.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Drops every example of `label`, returning how many were removed.
    pub fn clear_class(&mut self, label: &L) -> usize {
        let before = self.training_data.len();
        self.training_data.retain(|point| &point.label != label);
        before - self.training_data.len()
    }

    /// Drops every stored example.
    pub fn clear_all_classes(&mut self) {
        self.training_data.clear();
    }

    /// Predicts the label for a new, unseen point by voting among its `k`
    /// nearest stored examples.
    ///
    /// A vote tie goes to whichever tied label owns the nearest neighbor.
    ///
    /// # Errors
    ///
    /// Returns `KnnError::InvalidK` if `k` is 0.
    /// Returns `KnnError::EmptyTrainingSet` if no examples are stored.
    /// Returns `KnnError::DimensionMismatch` if `features` has the wrong length.
    /// Returns `KnnError::InvalidDistance` if a distance is NaN.
    pub fn predict(&self, features: ArrayView1<F>, k: usize) -> Result<Prediction<L, F>, KnnError> {
        if k == 0 {
            return Err(KnnError::InvalidK);
        }
        let expected = self.dimension().ok_or(KnnError::EmptyTrainingSet)?;
        if features.len() != expected {
            return Err(KnnError::DimensionMismatch {
                expected,
                actual: features.len(),
            });
        }

        // Squared distances keep the ordering and skip the square root.
        let mut distances: Vec<(F, &L)> = self
            .training_data
            .iter()
            .map(|dp| (self.distance.rdistance(dp.features.view(), features), &dp.label))
            .collect();
        if distances.iter().any(|(dist, _)| dist.is_nan()) {
            return Err(KnnError::InvalidDistance);
        }
        distances.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let num_neighbors = k.min(distances.len());
        let neighbors = &distances[..num_neighbors];

        // (votes, rank of the closest neighbor carrying the label)
        let mut votes: HashMap<&L, (usize, usize)> = HashMap::new();
        for (rank, (_, label)) in neighbors.iter().enumerate() {
            votes.entry(*label).or_insert((0, rank)).0 += 1;
        }

        let winner = votes
            .iter()
            .max_by(|(_, (votes_a, rank_a)), (_, (votes_b, rank_b))| {
                votes_a.cmp(votes_b).then(rank_b.cmp(rank_a))
            })
            .map(|(label, _)| (*label).clone())
            .ok_or(KnnError::EmptyTrainingSet)?;

        let total = F::from_usize(num_neighbors).unwrap_or_else(F::one);
        let mut confidences: HashMap<L, F> = self
            .class_example_counts()
            .into_keys()
            .map(|label| (label, F::zero()))
            .collect();
        for (label, (count, _)) in votes {
            let share = F::from_usize(count).unwrap_or_else(F::zero) / total;
            confidences.insert(label.clone(), share);
        }

        Ok(Prediction {
            label: winner,
            confidences,
        })
    }
}
