//! The nearest-neighbor training set behind the rotation demo.

use std::collections::HashMap;

use k_nn::{KnnClassifier, KnnError};
use pseudolab_helpers::DistanceMetric;

use crate::embedding::Embedding;
use crate::error::DemoError;
use crate::render::Rotation;

/// A rotation guess with the vote share of every rotation class.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationPrediction {
    pub label: Rotation,
    pub confidences: HashMap<Rotation, f32>,
}

impl RotationPrediction {
    pub fn confidence(&self, rotation: Rotation) -> f32 {
        self.confidences.get(&rotation).copied().unwrap_or(0.0)
    }
}

/// Labeled embeddings with a per-class cap.
///
/// Crossing the cap in any class resets the whole store rather than evicting
/// individual examples.
#[derive(Debug, Clone)]
pub struct ExampleStore {
    knn: KnnClassifier<Rotation, f32, DistanceMetric>,
    cap: usize,
}

impl ExampleStore {
    pub fn new(cap: usize, metric: DistanceMetric) -> Self {
        Self {
            knn: KnnClassifier::new(metric),
            cap,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn add_example(&mut self, embedding: Embedding, rotation: Rotation) -> Result<(), DemoError> {
        self.knn.add_example(embedding, rotation)?;
        Ok(())
    }

    /// Clears every class once any class holds more than `cap` examples.
    /// Returns whether the store was cleared.
    pub fn enforce_capacity(&mut self) -> bool {
        let over = self
            .knn
            .class_example_counts()
            .values()
            .any(|&count| count > self.cap);
        if over {
            tracing::info!(
                "Example cap of {} exceeded; clearing all {} examples",
                self.cap,
                self.knn.len()
            );
            self.knn.clear_all_classes();
        }
        over
    }

    /// Majority vote among the `k` nearest stored examples.
    pub fn predict(&self, embedding: &Embedding, k: usize) -> Result<RotationPrediction, DemoError> {
        match self.knn.predict(embedding.view(), k) {
            Ok(prediction) => Ok(RotationPrediction {
                label: prediction.label,
                confidences: prediction.confidences,
            }),
            Err(KnnError::EmptyTrainingSet) => Err(DemoError::EmptyExampleStore),
            Err(other) => Err(other.into()),
        }
    }

    /// Example count for each rotation, including empty classes.
    pub fn class_counts(&self) -> [(Rotation, usize); 4] {
        let counts = self.knn.class_example_counts();
        Rotation::ALL.map(|r| (r, counts.get(&r).copied().unwrap_or(0)))
    }

    pub fn total(&self) -> usize {
        self.knn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.knn.is_empty()
    }

    pub fn clear(&mut self) {
        self.knn.clear_all_classes();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn one_hot(index: usize) -> Embedding {
        let mut v = Embedding::zeros(4);
        v[index] = 1.0;
        v
    }

    #[test]
    fn empty_store_refuses_to_predict() {
        let store = ExampleStore::new(400, DistanceMetric::Euclidean);
        assert!(matches!(
            store.predict(&one_hot(0), 3),
            Err(DemoError::EmptyExampleStore)
        ));
    }

    #[test]
    fn predicts_the_nearest_rotation() {
        let mut store = ExampleStore::new(400, DistanceMetric::Euclidean);
        for (i, rotation) in Rotation::ALL.into_iter().enumerate() {
            store.add_example(one_hot(i), rotation).unwrap();
            store.add_example(one_hot(i) * 0.9, rotation).unwrap();
        }

        let prediction = store.predict(&array![0.0, 0.0, 0.95, 0.05], 3).unwrap();
        assert_eq!(prediction.label, Rotation::Deg180);
        assert!(prediction.confidence(Rotation::Deg180) > 0.5);
        assert_eq!(prediction.confidences.len(), 4);
    }

    #[test]
    fn exceeding_the_cap_clears_every_class() {
        let mut store = ExampleStore::new(400, DistanceMetric::Euclidean);
        for _ in 0..3 {
            store.add_example(one_hot(1), Rotation::Deg90).unwrap();
            store.add_example(one_hot(2), Rotation::Deg180).unwrap();
        }
        for _ in 0..398 {
            store.add_example(one_hot(0), Rotation::Deg0).unwrap();
        }
        assert!(!store.enforce_capacity());

        store.add_example(one_hot(0), Rotation::Deg0).unwrap();
        store.add_example(one_hot(0), Rotation::Deg0).unwrap();
        assert!(!store.enforce_capacity(), "exactly at the cap is allowed");

        store.add_example(one_hot(0), Rotation::Deg0).unwrap();
        assert_eq!(store.class_counts()[0], (Rotation::Deg0, 401));
        assert!(store.enforce_capacity());
        assert!(store.is_empty());
        assert!(store.class_counts().iter().all(|(_, count)| *count == 0));
    }

    #[test]
    fn wrong_length_embedding_surfaces_as_knn_error() {
        let mut store = ExampleStore::new(10, DistanceMetric::Euclidean);
        store.add_example(one_hot(0), Rotation::Deg0).unwrap();
        let err = store.add_example(array![1.0], Rotation::Deg90).unwrap_err();
        assert!(matches!(
            err,
            DemoError::NearestNeighbor(KnnError::DimensionMismatch { .. })
        ));
    }
}
