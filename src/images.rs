//! The image collection both demos draw from.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use rand::Rng;

use crate::error::DemoError;

/// Where an entry's encoded bytes come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// A file read on every load, e.g. the bundled default set.
    Path(PathBuf),
    /// Bytes held in memory, e.g. files handed over by a file picker.
    Blob(Arc<[u8]>),
}

#[derive(Debug, Clone)]
pub struct ImageEntry {
    name: String,
    source: ImageSource,
    release_required: bool,
}

impl ImageEntry {
    /// An entry backed by a file on disk. Nothing to release.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            source: ImageSource::Path(path),
            release_required: false,
        }
    }

    /// An entry that owns its encoded bytes; released when the store is cleared.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            source: ImageSource::Blob(bytes.into()),
            release_required: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn release_required(&self) -> bool {
        self.release_required
    }

    /// Read and decode the entry.
    pub fn load(&self) -> Result<DynamicImage, DemoError> {
        let decoded = match &self.source {
            ImageSource::Path(path) => {
                let bytes = std::fs::read(path).map_err(|source| DemoError::ImageRead {
                    name: self.name.clone(),
                    source,
                })?;
                image::load_from_memory(&bytes)
            }
            ImageSource::Blob(bytes) => image::load_from_memory(bytes),
        };
        decoded.map_err(|source| DemoError::ImageDecode {
            name: self.name.clone(),
            source,
        })
    }
}

/// Read picked files into memory, the way a browser hands over file blobs.
///
/// Unreadable files are returned as errors next to the entries that did load.
pub fn read_files<P: AsRef<Path>>(paths: &[P]) -> (Vec<ImageEntry>, Vec<DemoError>) {
    let mut entries = Vec::with_capacity(paths.len());
    let mut errors = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match std::fs::read(path) {
            Ok(bytes) => entries.push(ImageEntry::from_bytes(name, bytes)),
            Err(source) => errors.push(DemoError::ImageRead { name, source }),
        }
    }
    (entries, errors)
}

/// The fixed default set: `cat1.png` through `cat{count}.png` under `dir`.
pub fn default_entries(dir: &Path, count: usize) -> Vec<ImageEntry> {
    (1..=count)
        .map(|i| ImageEntry::from_path(dir.join(format!("cat{i}.png"))))
        .collect()
}

/// Ordered collection of loaded images.
#[derive(Debug, Default)]
pub struct ImageStore {
    entries: Vec<ImageEntry>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: ImageEntry) {
        self.entries.push(entry);
    }

    /// `None` for an out-of-range index; callers treat that as a no-op.
    pub fn get(&self, index: usize) -> Option<&ImageEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageEntry> {
        self.entries.iter()
    }

    /// Drop every entry, returning how many held resources that needed releasing.
    pub fn clear(&mut self) -> usize {
        let released = self.entries.iter().filter(|e| e.release_required).count();
        self.entries.clear();
        if released > 0 {
            tracing::debug!("Released {released} in-memory image(s)");
        }
        released
    }

    /// Clear, then take `entries` as the new collection.
    pub fn replace(&mut self, entries: Vec<ImageEntry>) -> usize {
        let released = self.clear();
        self.entries = entries;
        released
    }

    /// Uniformly random index, `None` when empty.
    pub fn random_index<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.entries.is_empty() {
            None
        } else {
            Some(rng.random_range(0..self.entries.len()))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use std::io::Cursor;

    /// PNG bytes of a `width x height` gradient with a bright top-left corner.
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            if x < width / 3 && y < height / 3 {
                Rgb([250, 250, 250])
            } else {
                Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 40])
            }
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn blob_entries_decode_and_need_release() {
        let entry = ImageEntry::from_bytes("gradient.png", png_bytes(20, 10));
        assert!(entry.release_required());
        let decoded = entry.load().unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let entry = ImageEntry::from_bytes("broken.png", b"not an image".to_vec());
        let err = entry.load().unwrap_err();
        assert!(matches!(err, DemoError::ImageDecode { ref name, .. } if name == "broken.png"));
        assert!(err.is_image_failure());
    }

    #[test]
    fn missing_path_is_a_read_error() {
        let entry = ImageEntry::from_path("/definitely/not/here/cat1.png");
        assert_eq!(entry.name(), "cat1.png");
        assert!(!entry.release_required());
        assert!(matches!(entry.load(), Err(DemoError::ImageRead { .. })));
    }

    #[test]
    fn clear_counts_only_releasable_entries() {
        let mut store = ImageStore::new();
        store.add(ImageEntry::from_bytes("a.png", png_bytes(4, 4)));
        store.add(ImageEntry::from_path("images/cat1.png"));
        store.add(ImageEntry::from_bytes("b.png", png_bytes(4, 4)));

        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
        assert!(store.get(0).is_none());
    }

    #[test]
    fn replace_releases_previous_collection() {
        let mut store = ImageStore::new();
        store.add(ImageEntry::from_bytes("a.png", png_bytes(4, 4)));

        let released = store.replace(default_entries(Path::new("images"), 10));
        assert_eq!(released, 1);
        assert_eq!(store.len(), 10);
        assert_eq!(store.get(0).map(ImageEntry::name), Some("cat1.png"));
        assert_eq!(store.get(9).map(ImageEntry::name), Some("cat10.png"));
    }

    #[test]
    fn random_index_stays_in_range() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let mut store = ImageStore::new();
        assert_eq!(store.random_index(&mut rng), None);

        store.replace(default_entries(Path::new("images"), 3));
        for _ in 0..50 {
            let idx = store.random_index(&mut rng).unwrap();
            assert!(idx < 3);
        }
    }

    #[test]
    fn read_files_collects_errors_separately() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        std::fs::write(&good, png_bytes(8, 8)).unwrap();
        let missing = dir.path().join("missing.png");

        let (entries, errors) = read_files(&[good, missing]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), "good.png");
        assert!(entries[0].release_required());
        assert_eq!(errors.len(), 1);
    }
}
