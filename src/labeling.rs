//! Pseudo-labeling: ask a pretrained classifier to describe loaded images and
//! keep a log of what it said.

use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView};
use image::imageops::FilterType;
use rand::Rng;

use crate::config::LabelingSettings;
use crate::error::DemoError;
use crate::images::{self, ImageStore};

/// One label proposed by a classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub label: String,
    /// In `[0, 1]`.
    pub confidence: f32,
}

impl ClassificationResult {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

impl Display for ClassificationResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.1}%)", self.label, self.confidence * 100.0)
    }
}

/// Contract for a pretrained image classifier such as MobileNet.
pub trait ImageClassifier {
    fn is_ready(&self) -> bool;

    /// Labels for `image`, in any order; callers sort and truncate.
    fn classify(&mut self, image: &DynamicImage) -> Result<Vec<ClassificationResult>, DemoError>;
}

/// Built-in classifier that names the dominant colours of an image.
///
/// Each label's confidence is the share of sampled pixels falling in that
/// colour bucket.
#[derive(Debug, Clone)]
pub struct PaletteClassifier {
    sample_side: u32,
}

impl Default for PaletteClassifier {
    fn default() -> Self {
        Self { sample_side: 64 }
    }
}

const HUE_BUCKETS: [(f32, &str); 8] = [
    (15.0, "red"),
    (45.0, "orange"),
    (70.0, "yellow"),
    (165.0, "green"),
    (195.0, "cyan"),
    (255.0, "blue"),
    (290.0, "purple"),
    (345.0, "pink"),
];

fn colour_name(r: u8, g: u8, b: u8) -> &'static str {
    let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = max - min;
    let saturation = if max > 0.0 { chroma / max } else { 0.0 };

    if max < 0.2 {
        return "black";
    }
    if saturation < 0.15 {
        return if max > 0.8 { "white" } else { "gray" };
    }

    let hue = if max == r {
        60.0 * ((g - b) / chroma).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / chroma + 2.0)
    } else {
        60.0 * ((r - g) / chroma + 4.0)
    };
    HUE_BUCKETS
        .iter()
        .find(|(upper, _)| hue < *upper)
        .map(|(_, name)| *name)
        .unwrap_or("red")
}

impl ImageClassifier for PaletteClassifier {
    fn is_ready(&self) -> bool {
        true
    }

    fn classify(&mut self, image: &DynamicImage) -> Result<Vec<ClassificationResult>, DemoError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DemoError::Classification("image has no pixels".to_string()));
        }
        let side = self.sample_side.min(width).min(height).max(1);
        let sample = image.resize_exact(side, side, FilterType::Nearest).to_rgb8();

        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for pixel in sample.pixels() {
            let name = colour_name(pixel[0], pixel[1], pixel[2]);
            match counts.iter_mut().find(|(n, _)| *n == name) {
                Some((_, count)) => *count += 1,
                None => counts.push((name, 1)),
            }
        }

        let total = (side * side) as f32;
        Ok(counts
            .into_iter()
            .map(|(name, count)| ClassificationResult::new(name, count as f32 / total))
            .collect())
    }
}

/// Most confident first, at most `top_k`.
pub fn rank_results(mut results: Vec<ClassificationResult>, top_k: usize) -> Vec<ClassificationResult> {
    results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    results.truncate(top_k);
    results
}

/// A past classification as shown in the history log.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub name: String,
    pub top: ClassificationResult,
    /// Up to two runners-up.
    pub alternates: Vec<ClassificationResult>,
}

impl Display for HistoryEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n  top: {}", self.name, self.top)?;
        if !self.alternates.is_empty() {
            let alts: Vec<String> = self.alternates.iter().map(ToString::to_string).collect();
            write!(f, "\n  alt: {}", alts.join(", "))?;
        }
        Ok(())
    }
}

/// Recent classifications, newest first.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl HistoryLog {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    /// Record a classification; empty result lists are not logged.
    pub fn record(&mut self, name: &str, results: &[ClassificationResult]) -> bool {
        let Some((top, rest)) = results.split_first() else {
            return false;
        };
        self.entries.push_front(HistoryEntry {
            name: name.to_string(),
            top: top.clone(),
            alternates: rest.iter().take(2).cloned().collect(),
        });
        self.entries.truncate(self.limit);
        true
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A successful labeling of one image.
#[derive(Debug, Clone)]
pub struct LabelOutcome {
    pub index: usize,
    pub name: String,
    /// The decoded image, for previews.
    pub image: DynamicImage,
    pub results: Vec<ClassificationResult>,
}

impl LabelOutcome {
    pub fn status_line(&self) -> String {
        match self.results.first() {
            Some(top) => format!("Top label for \"{}\" -> {}", self.name, top),
            None => format!("No confident label for \"{}\".", self.name),
        }
    }
}

/// Totals from labeling every loaded image.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub labeled: usize,
    pub failures: Vec<DemoError>,
}

/// What the user currently sees: the last image labeled and its results.
#[derive(Debug, Clone)]
struct Current {
    index: usize,
    name: String,
    results: Vec<ClassificationResult>,
}

/// Session state of the pseudo-labeling demo.
pub struct PseudoLabeler {
    classifier: Box<dyn ImageClassifier>,
    images: ImageStore,
    history: HistoryLog,
    current: Option<Current>,
    settings: LabelingSettings,
}

impl PseudoLabeler {
    pub fn new(classifier: Box<dyn ImageClassifier>, settings: LabelingSettings) -> Self {
        Self {
            classifier,
            images: ImageStore::new(),
            history: HistoryLog::new(settings.history_limit),
            current: None,
            settings,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.classifier.is_ready()
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current.as_ref().map(|c| c.index)
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.name.as_str())
    }

    pub fn current_results(&self) -> &[ClassificationResult] {
        self.current.as_ref().map(|c| c.results.as_slice()).unwrap_or(&[])
    }

    /// Replace the collection with the picked files, returning unreadable ones.
    pub fn load_files(&mut self, paths: &[PathBuf]) -> Vec<DemoError> {
        self.clear_images();
        let (entries, errors) = images::read_files(paths);
        tracing::info!("Loaded {} image(s)", entries.len());
        self.images.replace(entries);
        errors
    }

    /// Replace the collection with the fixed default set.
    pub fn load_defaults(&mut self, dir: &Path, count: usize) {
        self.clear_images();
        self.images.replace(images::default_entries(dir, count));
        tracing::info!("Loaded {count} default image(s) from {}", dir.display());
    }

    /// Drop every image along with the results and history that refer to them.
    pub fn clear_images(&mut self) -> usize {
        let released = self.images.clear();
        self.current = None;
        self.history.clear();
        released
    }

    /// Classify the image at `index`.
    ///
    /// Returns `Ok(None)` for an out-of-range index. On error the current
    /// results, history, and selection are left as they were.
    pub fn label(&mut self, index: usize) -> Result<Option<LabelOutcome>, DemoError> {
        if !self.classifier.is_ready() {
            return Err(DemoError::ModelNotReady);
        }
        let Some(entry) = self.images.get(index) else {
            return Ok(None);
        };
        let name = entry.name().to_string();

        let result = entry
            .load()
            .and_then(|image| self.classifier.classify(&image).map(|results| (image, results)));
        let (image, results) = match result {
            Ok(ok) => ok,
            Err(err) => {
                tracing::warn!("Failed to label \"{name}\": {err}");
                return Err(err);
            }
        };
        let results = rank_results(results, self.settings.top_k);

        self.history.record(&name, &results);
        self.current = Some(Current {
            index,
            name: name.clone(),
            results: results.clone(),
        });
        let outcome = LabelOutcome {
            index,
            name,
            image,
            results,
        };
        tracing::info!("{}", outcome.status_line());
        Ok(Some(outcome))
    }

    /// Classify a uniformly random image.
    pub fn label_random<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Option<LabelOutcome>, DemoError> {
        match self.images.random_index(rng) {
            Some(index) => self.label(index),
            None => Ok(None),
        }
    }

    /// Classify every loaded image in order. A failure is recorded and the
    /// batch moves on.
    pub fn label_all(&mut self) -> Result<BatchReport, DemoError> {
        if !self.classifier.is_ready() {
            return Err(DemoError::ModelNotReady);
        }
        let mut report = BatchReport::default();
        for index in 0..self.images.len() {
            match self.label(index) {
                Ok(Some(_)) => report.labeled += 1,
                Ok(None) => {}
                Err(err) => report.failures.push(err),
            }
        }
        tracing::info!(
            "Finished labeling: {} ok, {} failed",
            report.labeled,
            report.failures.len()
        );
        Ok(report)
    }
}

/// Status shown when labeling `name` failed.
pub fn failure_line(name: &str) -> String {
    format!("Failed to label \"{name}\".")
}
