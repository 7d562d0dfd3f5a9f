use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use pseudolab::{
    DemoError, DistanceMetric, Embedding, EmbeddingModel, ExampleStore, ImageEntry,
    IterationOutcome, LoopController, LoopState, PixelEmbedder, Rotation, RotationSession,
    RotationSettings, StopHandle,
};

fn settings() -> RotationSettings {
    RotationSettings {
        crop_size: 32,
        embedding_grid: 8,
        seed: Some(2024),
        ..RotationSettings::default()
    }
}

fn stripe_png() -> Vec<u8> {
    let img = RgbImage::from_fn(48, 36, |x, y| {
        if y < 12 && x < 30 {
            Rgb([240, 200, 40])
        } else {
            Rgb([(x * 5) as u8, 30, (y * 7) as u8])
        }
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn session_with_one_image(embedder: Box<dyn EmbeddingModel>) -> RotationSession {
    let mut session = RotationSession::new(settings(), embedder);
    session.add_image(ImageEntry::from_bytes("stripe.png", stripe_png()));
    session
}

/// Wraps the pixel embedder and asks the loop to stop from inside the first
/// training step, i.e. in the middle of an iteration.
struct StopsMidIteration {
    inner: PixelEmbedder,
    handle: Option<StopHandle>,
}

impl EmbeddingModel for StopsMidIteration {
    fn is_ready(&self) -> bool {
        true
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn embed(&mut self, crop: &RgbImage) -> Result<Embedding, DemoError> {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
        self.inner.embed(crop)
    }
}

/// Fails every embedding after the first `ok_calls`.
struct FlakyEmbedder {
    inner: PixelEmbedder,
    ok_calls: usize,
}

impl EmbeddingModel for FlakyEmbedder {
    fn is_ready(&self) -> bool {
        true
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn embed(&mut self, crop: &RgbImage) -> Result<Embedding, DemoError> {
        if self.ok_calls == 0 {
            return Err(DemoError::Embedding("backend hiccup".to_string()));
        }
        self.ok_calls -= 1;
        self.inner.embed(crop)
    }
}

#[test]
fn single_iteration_stores_one_example_per_rotation() {
    let mut session = session_with_one_image(Box::new(PixelEmbedder::new(8)));
    let mut controller = LoopController::new();
    controller.start(&session).unwrap();

    let summary = controller.run(&mut session, Some(1));

    assert_eq!(summary.completed, 1);
    assert_eq!(session.stats().iterations, 1);
    assert_eq!(session.store().total(), 4);
    assert_eq!(
        session.store().class_counts(),
        [
            (Rotation::Deg0, 1),
            (Rotation::Deg90, 1),
            (Rotation::Deg180, 1),
            (Rotation::Deg270, 1),
        ]
    );
    assert_eq!(controller.state(), LoopState::Stopped);
}

#[test]
fn stop_requested_mid_iteration_lets_it_finish() {
    let mut controller = LoopController::new();
    let embedder = StopsMidIteration {
        inner: PixelEmbedder::new(8),
        handle: Some(controller.stop_handle()),
    };
    let mut session = session_with_one_image(Box::new(embedder));
    controller.start(&session).unwrap();

    let summary = controller.run(&mut session, None);

    // Four training embeddings plus one test embedding all happened.
    assert_eq!(summary.completed, 1);
    assert_eq!(session.store().total(), 4);
    assert_eq!(session.stats().iterations, 1);
    assert_eq!(controller.state(), LoopState::Stopped);
}

#[test]
fn embedding_failure_aborts_only_that_iteration() {
    // Enough for one full iteration (4 train + 1 test) and two more train steps.
    let embedder = FlakyEmbedder {
        inner: PixelEmbedder::new(8),
        ok_calls: 7,
    };
    let mut session = session_with_one_image(Box::new(embedder));
    let mut controller = LoopController::new();
    controller.start(&session).unwrap();

    assert!(matches!(
        controller.step(&mut session),
        Some(IterationOutcome::Completed(_))
    ));
    assert!(matches!(
        controller.step(&mut session),
        Some(IterationOutcome::Aborted(DemoError::Embedding(_)))
    ));
    // Still running: an adapter failure is not fatal to the loop.
    assert!(controller.is_running());
    assert_eq!(session.stats().iterations, 1);
    assert_eq!(session.store().total(), 6);
}

#[test]
fn predicting_on_an_empty_store_fails() {
    let store = ExampleStore::new(400, DistanceMetric::Euclidean);
    let err = store.predict(&Embedding::zeros(64), 3).unwrap_err();

    assert!(matches!(err, DemoError::EmptyExampleStore));
}

#[test]
fn loop_prediction_on_an_emptied_store_leaves_stats_alone() {
    // With a cap of one, every second add to a class wipes the store. The
    // wipes land on 0°, 90° and 180° in iterations 2 to 4, and on 270° in
    // iteration 5, right before the test prediction.
    let settings = RotationSettings {
        example_cap: 1,
        seed: Some(1),
        ..settings()
    };
    let mut session = RotationSession::new(settings, Box::new(PixelEmbedder::new(8)));
    session.add_image(ImageEntry::from_bytes("stripe.png", stripe_png()));
    let mut controller = LoopController::new();
    controller.start(&session).unwrap();

    for _ in 0..4 {
        assert!(matches!(
            controller.step(&mut session),
            Some(IterationOutcome::Completed(_))
        ));
    }
    let before = *session.stats();
    assert_eq!(before.iterations, 4);

    assert!(matches!(
        controller.step(&mut session),
        Some(IterationOutcome::Aborted(DemoError::EmptyExampleStore))
    ));
    assert_eq!(*session.stats(), before);
    assert!(session.store().is_empty());
    assert!(controller.is_running());
}

#[test]
fn cap_breach_resets_every_class() {
    let mut store = ExampleStore::new(400, DistanceMetric::Euclidean);
    store.add_example(Embedding::from_elem(3, 0.5), Rotation::Deg90).unwrap();
    for _ in 0..401 {
        store.add_example(Embedding::from_elem(3, 1.0), Rotation::Deg0).unwrap();
    }

    assert!(store.enforce_capacity());
    assert!(store.class_counts().iter().all(|&(_, count)| count == 0));
}

#[test]
fn learns_rotations_of_a_single_image() {
    let mut session = session_with_one_image(Box::new(PixelEmbedder::new(8)));
    let mut controller = LoopController::new();
    controller.start(&session).unwrap();
    controller.run(&mut session, Some(10));

    // Every test crop has an identical training twin, so every guess is right.
    let stats = session.stats();
    assert_eq!(stats.iterations, 10);
    assert_eq!(stats.correct, 10);
    assert_eq!(stats.accuracy(), 1.0);
}
