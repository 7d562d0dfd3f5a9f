//! State of the rotation-prediction demo, owned in one place and handed to
//! the loop controller by reference.

use std::path::{Path, PathBuf};

use image::RgbImage;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::config::RotationSettings;
use crate::embedding::{Embedding, EmbeddingModel};
use crate::error::DemoError;
use crate::images::{self, ImageEntry, ImageStore};
use crate::render::{Rotation, render_rotated};
use crate::stats::Stats;
use crate::training::{ExampleStore, RotationPrediction};

/// One completed train-then-test iteration.
#[derive(Debug, Clone)]
pub struct Trial {
    pub image_name: String,
    pub truth: Rotation,
    pub prediction: RotationPrediction,
    /// The crop that was tested.
    pub crop: RgbImage,
}

impl Trial {
    pub fn is_correct(&self) -> bool {
        self.prediction.label == self.truth
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: true {} -> predicted {} ({:.0}%) {}",
            self.image_name,
            self.truth,
            self.prediction.label,
            self.prediction.confidence(self.prediction.label) * 100.0,
            if self.is_correct() { "✓" } else { "✗" }
        )
    }
}

pub struct RotationSession {
    embedder: Box<dyn EmbeddingModel>,
    images: ImageStore,
    store: ExampleStore,
    stats: Stats,
    settings: RotationSettings,
    rng: Xoshiro256PlusPlus,
}

impl RotationSession {
    /// Start a session with an empty example store and zeroed stats.
    pub fn new(settings: RotationSettings, embedder: Box<dyn EmbeddingModel>) -> Self {
        let rng = match settings.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_rng(&mut rand::rng()),
        };
        Self {
            embedder,
            images: ImageStore::new(),
            store: ExampleStore::new(settings.example_cap, settings.distance),
            stats: Stats::default(),
            settings,
            rng,
        }
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn store(&self) -> &ExampleStore {
        &self.store
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn settings(&self) -> &RotationSettings {
        &self.settings
    }

    pub fn embedder_ready(&self) -> bool {
        self.embedder.is_ready()
    }

    pub fn set_delay_ms(&mut self, delay_ms: u64) {
        self.settings.delay_ms = delay_ms;
    }

    pub fn add_image(&mut self, entry: ImageEntry) {
        self.images.add(entry);
    }

    /// Replace the images with the picked files, returning unreadable ones.
    pub fn load_files(&mut self, paths: &[PathBuf]) -> Vec<DemoError> {
        let (entries, errors) = images::read_files(paths);
        tracing::info!("Loaded {} image(s) for rotation training", entries.len());
        self.images.replace(entries);
        errors
    }

    pub fn load_defaults(&mut self, dir: &Path, count: usize) {
        self.images.replace(images::default_entries(dir, count));
    }

    pub fn clear_images(&mut self) -> usize {
        self.images.clear()
    }

    /// Zero the stats; the trained examples stay.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Forget every trained example; the stats stay.
    pub fn clear_model(&mut self) {
        self.store.clear();
        tracing::info!("Cleared all rotation examples");
    }

    pub fn reset(&mut self) {
        self.reset_stats();
        self.clear_model();
    }

    fn embed(&mut self, crop: &RgbImage) -> Result<Embedding, DemoError> {
        if !self.embedder.is_ready() {
            return Err(DemoError::ModelNotReady);
        }
        self.embedder.embed(crop)
    }

    /// Train on all four rotations of a random image, then test on a fresh
    /// random rotation of it. Stats change only if the test step completes.
    pub(crate) fn run_iteration(&mut self) -> Result<Trial, DemoError> {
        let index = self
            .images
            .random_index(&mut self.rng)
            .ok_or(DemoError::NoImages)?;
        let entry = self.images.get(index).ok_or(DemoError::NoImages)?;
        let image_name = entry.name().to_string();
        let source = entry.load()?;
        let size = self.settings.crop_size;

        for rotation in Rotation::ALL {
            let crop = render_rotated(&source, rotation, size);
            let embedding = self.embed(&crop)?;
            self.store.add_example(embedding, rotation)?;
            self.store.enforce_capacity();
        }

        let truth = Rotation::random(&mut self.rng);
        let crop = render_rotated(&source, truth, size);
        let embedding = self.embed(&crop)?;
        let prediction = self.store.predict(&embedding, self.settings.k)?;

        let trial = Trial {
            image_name,
            truth,
            prediction,
            crop,
        };
        self.stats.record(trial.is_correct());
        tracing::debug!("{}", trial.summary());
        Ok(trial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::PixelEmbedder;
    use crate::images::tests::png_bytes;

    fn settings(seed: u64) -> RotationSettings {
        RotationSettings {
            crop_size: 32,
            embedding_grid: 8,
            seed: Some(seed),
            ..RotationSettings::default()
        }
    }

    fn session_with_one_image() -> RotationSession {
        let mut session = RotationSession::new(settings(5), Box::new(PixelEmbedder::new(8)));
        session.add_image(ImageEntry::from_bytes("gradient.png", png_bytes(48, 32)));
        session
    }

    #[test]
    fn one_iteration_trains_each_rotation_once() {
        let mut session = session_with_one_image();
        let trial = session.run_iteration().unwrap();

        assert_eq!(trial.image_name, "gradient.png");
        assert_eq!(session.stats().iterations, 1);
        assert_eq!(session.store().total(), 4);
        for (_, count) in session.store().class_counts() {
            assert_eq!(count, 1);
        }
        // An exact copy of the tested crop is in the store.
        assert!(trial.is_correct());
    }

    #[test]
    fn no_images_aborts_without_touching_stats() {
        let mut session = RotationSession::new(settings(1), Box::new(PixelEmbedder::new(8)));
        assert!(matches!(session.run_iteration(), Err(DemoError::NoImages)));
        assert_eq!(*session.stats(), Stats::default());
    }

    #[test]
    fn undecodable_image_aborts_the_iteration() {
        let mut session = RotationSession::new(settings(1), Box::new(PixelEmbedder::new(8)));
        session.add_image(ImageEntry::from_bytes("broken.png", b"nope".to_vec()));

        let err = session.run_iteration().unwrap_err();
        assert!(err.is_image_failure());
        assert!(session.store().is_empty());
        assert_eq!(session.stats().iterations, 0);
    }

    #[test]
    fn resets_are_independent() {
        let mut session = session_with_one_image();
        session.run_iteration().unwrap();

        session.reset_stats();
        assert_eq!(session.stats().iterations, 0);
        assert_eq!(session.store().total(), 4);

        session.run_iteration().unwrap();
        session.clear_model();
        assert!(session.store().is_empty());
        assert_eq!(session.stats().iterations, 1);

        session.reset();
        assert_eq!(*session.stats(), Stats::default());
    }

    #[test]
    fn same_seed_same_trials() {
        let mut a = session_with_one_image();
        let mut b = session_with_one_image();
        for _ in 0..5 {
            let ta = a.run_iteration().unwrap();
            let tb = b.run_iteration().unwrap();
            assert_eq!(ta.truth, tb.truth);
            assert_eq!(ta.prediction, tb.prediction);
        }
        assert_eq!(a.stats(), b.stats());
    }
}
