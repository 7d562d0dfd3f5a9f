//! Square, rotated crops fed to the embedding model.

use std::fmt::{Display, Formatter};

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, RgbImage};
use rand::Rng;

/// The four rotation classes the self-supervised task predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Training order within an iteration.
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Clockwise angle in degrees.
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    pub fn from_degrees(degrees: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.degrees() == degrees % 360)
    }

    /// Uniformly random rotation.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

impl Display for Rotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Center-crop `source` to its smaller side, scale to `size x size`, then
/// rotate clockwise by `rotation` about the center.
pub fn render_rotated(source: &DynamicImage, rotation: Rotation, size: u32) -> RgbImage {
    let (width, height) = source.dimensions();
    let side = width.min(height);
    let cropped = source.crop_imm((width - side) / 2, (height - side) / 2, side, side);
    let square = cropped
        .resize_exact(size, size, FilterType::Triangle)
        .to_rgb8();

    match rotation {
        Rotation::Deg0 => square,
        Rotation::Deg90 => imageops::rotate90(&square),
        Rotation::Deg180 => imageops::rotate180(&square),
        Rotation::Deg270 => imageops::rotate270(&square),
    }
}
