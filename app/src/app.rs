use crate::ui;

use eframe::egui::{self, Color32};
use eframe::{App, Frame};
use ecolor::Hsva;
use image::{DynamicImage, RgbImage};
use pseudolab::labeling::failure_line;
use pseudolab::{
    DemoConfig, DemoError, IterationOutcome, LoopController, PaletteClassifier, PixelEmbedder,
    PseudoLabeler, Rotation, RotationSession, Stats, Trial,
};
use std::path::PathBuf;
use std::time::Duration;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Which demo is on screen.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Tab {
    PseudoLabels,
    Rotation,
}

/// The main application struct.
/// It holds both demo sessions and the UI state around them; drawing lives in `ui`.
pub struct DemoApp {
    pub config: DemoConfig,
    pub tab: Tab,

    // --- Pseudo-labeling ---
    pub labeler: PseudoLabeler,
    pub label_status: String,
    pub images_status: String,
    pub label_preview: Option<egui::TextureHandle>,
    /// Next image to label while "label all" is in progress.
    pub bulk_next: Option<usize>,

    // --- Rotation prediction ---
    pub session: RotationSession,
    pub controller: LoopController,
    pub rotation_status: String,
    pub last_trial: Option<Trial>,
    pub crop_preview: Option<egui::TextureHandle>,
    pub delay_ms: u64,
}

impl DemoApp {
    pub fn new(config: DemoConfig) -> Self {
        let labeler = PseudoLabeler::new(
            Box::new(PaletteClassifier::default()),
            config.labeling.clone(),
        );
        let label_status = if labeler.is_ready() {
            "Model ready. Load images then request machine-generated labels.".to_string()
        } else {
            "Model is still loading.".to_string()
        };
        let embedder = PixelEmbedder::new(config.rotation.embedding_grid);
        let session = RotationSession::new(config.rotation.clone(), Box::new(embedder));
        let delay_ms = config.rotation.delay_ms;

        Self {
            config,
            tab: Tab::PseudoLabels,
            labeler,
            label_status,
            images_status: "No images yet.".to_string(),
            label_preview: None,
            bulk_next: None,
            session,
            controller: LoopController::new(),
            rotation_status: "Load images, then start the loop.".to_string(),
            last_trial: None,
            crop_preview: None,
            delay_ms,
        }
    }

    pub fn is_bulk_labeling(&self) -> bool {
        self.bulk_next.is_some()
    }

    // --- Pseudo-labeling actions ---

    pub fn pick_label_files(&mut self) {
        let Some(paths) = pick_images() else {
            return;
        };
        self.bulk_next = None;
        self.label_preview = None;
        for err in self.labeler.load_files(&paths) {
            tracing::warn!("{err}");
        }
        let count = self.labeler.images().len();
        self.images_status = if count == 0 {
            "No images yet.".to_string()
        } else {
            format!(
                "Loaded {count} image{}. Click a name or let the model pick at random.",
                if count == 1 { "" } else { "s" }
            )
        };
    }

    pub fn load_label_defaults(&mut self) {
        self.bulk_next = None;
        self.label_preview = None;
        let images = &self.config.images;
        self.labeler.load_defaults(&images.default_dir, images.default_count);
        self.images_status = format!(
            "Loaded {} default cat images. Ask the network to describe them or click a name.",
            images.default_count
        );
    }

    pub fn clear_label_images(&mut self) {
        self.bulk_next = None;
        self.label_preview = None;
        self.labeler.clear_images();
        self.images_status = "Removed all images.".to_string();
    }

    pub fn label_index(&mut self, ctx: &egui::Context, index: usize) {
        let name = self
            .labeler
            .images()
            .get(index)
            .map(|entry| entry.name().to_string());
        match self.labeler.label(index) {
            Ok(Some(outcome)) => {
                self.label_status = outcome.status_line();
                self.label_preview = Some(texture_from_image(ctx, "label-preview", &outcome.image));
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!("{err}");
                self.label_status = failure_line(name.as_deref().unwrap_or("image"));
            }
        }
    }

    pub fn label_random(&mut self, ctx: &egui::Context) {
        let mut rng = rand::rng();
        if let Some(index) = self.labeler.images().random_index(&mut rng) {
            self.label_index(ctx, index);
        }
    }

    pub fn start_label_all(&mut self) {
        if self.labeler.is_ready() && !self.labeler.images().is_empty() {
            self.bulk_next = Some(0);
        }
    }

    /// Labels one image per frame so the window stays responsive.
    fn drive_bulk_labeling(&mut self, ctx: &egui::Context) {
        let Some(index) = self.bulk_next else {
            return;
        };
        if index >= self.labeler.images().len() {
            self.bulk_next = None;
            self.label_status = "Finished labeling every image currently loaded.".to_string();
            return;
        }
        self.label_index(ctx, index);
        self.bulk_next = Some(index + 1);
        ctx.request_repaint();
    }

    // --- Rotation actions ---

    pub fn pick_rotation_files(&mut self) {
        let Some(paths) = pick_images() else {
            return;
        };
        for err in self.session.load_files(&paths) {
            tracing::warn!("{err}");
        }
        self.rotation_status = format!("Loaded {} image(s).", self.session.images().len());
    }

    pub fn load_rotation_defaults(&mut self) {
        let images = &self.config.images;
        self.session.load_defaults(&images.default_dir, images.default_count);
        self.rotation_status = format!("Loaded {} default image(s).", images.default_count);
    }

    pub fn clear_rotation_images(&mut self) {
        self.controller.stop();
        self.session.clear_images();
        self.rotation_status = "Removed all images.".to_string();
    }

    pub fn start_loop(&mut self) {
        match self.controller.start(&self.session) {
            Ok(()) => self.rotation_status = "Training...".to_string(),
            Err(err) => self.rotation_status = err.to_string(),
        }
    }

    pub fn stop_loop(&mut self) {
        self.controller.stop();
        self.rotation_status = "Stopping after the current iteration...".to_string();
    }

    pub fn set_delay(&mut self, delay_ms: u64) {
        self.delay_ms = delay_ms;
        self.session.set_delay_ms(delay_ms);
    }

    pub fn reset_stats(&mut self) {
        self.session.reset_stats();
    }

    pub fn clear_model(&mut self) {
        self.session.clear_model();
        self.rotation_status = "Cleared all trained examples.".to_string();
    }

    /// Advances the rotation loop by at most one iteration per frame.
    fn drive_rotation_loop(&mut self, ctx: &egui::Context) {
        if !self.controller.is_running() {
            return;
        }
        let mut abort_reason = None;
        if let Some(outcome) = self.controller.tick(&mut self.session) {
            match outcome {
                IterationOutcome::Completed(trial) => {
                    self.crop_preview = Some(texture_from_crop(ctx, &trial.crop));
                    self.rotation_status = trial.summary();
                    self.last_trial = Some(trial);
                }
                IterationOutcome::Aborted(err) => {
                    self.rotation_status = format!("Iteration skipped: {err}");
                    abort_reason = Some(err);
                }
            }
        }
        if !self.controller.is_running() {
            self.rotation_status = stopped_status(abort_reason.as_ref(), self.session.stats());
        }
        ctx.request_repaint_after(Duration::from_millis(16));
    }

    /// Each rotation gets a quarter of the hue wheel.
    pub fn rotation_color(rotation: Rotation) -> Color32 {
        let hue = match rotation {
            Rotation::Deg0 => 0.0,
            Rotation::Deg90 => 0.25,
            Rotation::Deg180 => 0.5,
            Rotation::Deg270 => 0.75,
        };
        Color32::from(Hsva { h: hue, s: 0.85, v: 0.9, a: 1.0 })
    }
}

/// Status shown once the loop has stopped, keeping the reason when an
/// aborted iteration is what stopped it.
fn stopped_status(reason: Option<&DemoError>, stats: &Stats) -> String {
    match reason {
        Some(err) => format!("Stopped: {err}. {stats}"),
        None => format!("Stopped. {stats}"),
    }
}

impl App for DemoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.drive_bulk_labeling(ctx);
        self.drive_rotation_loop(ctx);

        ui::draw_side_panel(self, ctx);
        ui::draw_central_panel(self, ctx);
    }
}

fn pick_images() -> Option<Vec<PathBuf>> {
    rfd::FileDialog::new()
        .add_filter("images", IMAGE_EXTENSIONS)
        .pick_files()
}

fn texture_from_image(ctx: &egui::Context, name: &str, image: &DynamicImage) -> egui::TextureHandle {
    let rgba = image.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let pixels = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
    ctx.load_texture(name, pixels, egui::TextureOptions::LINEAR)
}

fn texture_from_crop(ctx: &egui::Context, crop: &RgbImage) -> egui::TextureHandle {
    let size = [crop.width() as usize, crop.height() as usize];
    let pixels = egui::ColorImage::from_rgb(size, crop.as_raw());
    ctx.load_texture("rotation-crop", pixels, egui::TextureOptions::LINEAR)
}
