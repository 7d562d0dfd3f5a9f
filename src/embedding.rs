//! Embedding adapter: turns a rendered crop into a feature vector.

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array1;

use crate::error::DemoError;

/// Fixed-length feature vector produced by an [`EmbeddingModel`].
pub type Embedding = Array1<f32>;

/// Contract for anything that can embed an image, e.g. a MobileNet backbone.
pub trait EmbeddingModel {
    /// Whether the model finished loading and can be called.
    fn is_ready(&self) -> bool;

    /// Length of every vector this model returns.
    fn dimension(&self) -> usize;

    /// Embed a rendered crop.
    ///
    /// # Errors
    ///
    /// `DemoError::ModelNotReady` before initialization, otherwise whatever
    /// the backend reports as `DemoError::Embedding`.
    fn embed(&mut self, crop: &RgbImage) -> Result<Embedding, DemoError>;
}

/// Deterministic embedder that keeps the coarse spatial layout of an image.
///
/// The crop is reduced to a `grid x grid` luminance map, mean-centred and
/// scaled to unit length, so nearby vectors mean similar brightness layouts
/// regardless of overall exposure.
#[derive(Debug, Clone)]
pub struct PixelEmbedder {
    grid: u32,
}

impl PixelEmbedder {
    pub fn new(grid: u32) -> Self {
        Self { grid: grid.max(1) }
    }
}

impl EmbeddingModel for PixelEmbedder {
    fn is_ready(&self) -> bool {
        true
    }

    fn dimension(&self) -> usize {
        (self.grid * self.grid) as usize
    }

    fn embed(&mut self, crop: &RgbImage) -> Result<Embedding, DemoError> {
        if crop.width() == 0 || crop.height() == 0 {
            return Err(DemoError::Embedding("crop has no pixels".to_string()));
        }
        let luma = imageops::grayscale(crop);
        let small = imageops::resize(&luma, self.grid, self.grid, FilterType::Triangle);

        let mut vector: Embedding = small.pixels().map(|p| p[0] as f32 / 255.0).collect();
        let mean = vector.mean().unwrap_or(0.0);
        vector -= mean;
        let norm = vector.dot(&vector).sqrt();
        if norm > f32::EPSILON {
            vector /= norm;
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Rotation, render_rotated};
    use approx::assert_abs_diff_eq;
    use image::{DynamicImage, Rgb};

    fn corner_image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(32, 32, |x, y| {
            if x < 12 && y < 12 {
                Rgb([255, 255, 255])
            } else {
                Rgb([20, 20, 20])
            }
        }))
    }

    #[test]
    fn vectors_have_model_dimension_and_unit_length() {
        let mut embedder = PixelEmbedder::new(4);
        let crop = render_rotated(&corner_image(), Rotation::Deg0, 16);
        let vector = embedder.embed(&crop).unwrap();

        assert_eq!(vector.len(), embedder.dimension());
        assert_abs_diff_eq!(vector.dot(&vector), 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(vector.sum(), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn flat_images_embed_to_zero() {
        let mut embedder = PixelEmbedder::new(4);
        let flat = RgbImage::from_pixel(8, 8, Rgb([90, 90, 90]));
        let vector = embedder.embed(&flat).unwrap();
        assert!(vector.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn rotations_are_far_apart() {
        let mut embedder = PixelEmbedder::new(4);
        let source = corner_image();
        let upright = embedder.embed(&render_rotated(&source, Rotation::Deg0, 16)).unwrap();
        let again = embedder.embed(&render_rotated(&source, Rotation::Deg0, 16)).unwrap();
        let flipped = embedder.embed(&render_rotated(&source, Rotation::Deg180, 16)).unwrap();

        assert_eq!(upright, again);
        assert!(upright.dot(&flipped) < 0.5);
    }

    #[test]
    fn empty_crop_is_an_embedding_error() {
        let mut embedder = PixelEmbedder::new(4);
        let empty = RgbImage::new(0, 0);
        assert!(matches!(embedder.embed(&empty), Err(DemoError::Embedding(_))));
    }
}
