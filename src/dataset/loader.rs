//! Spot dataset loader
//!
//! Walks a root directory of per-session image folders, decodes and resizes
//! every crop to the entity's fixed dimensions, derives labels from the
//! filenames, and (for station markers) expands each crop into four rotated
//! copies. The whole dataset is held in memory; board-spot crops are small
//! and the corpora are a few thousand images at most.

use std::path::{Path, PathBuf};

use image::{ImageReader, RgbImage};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::augmentation::quarter_rotations;
use super::label::PieceColor;
use super::split::{split_indices, TrainTestSplit};
use super::{EntityKind, CHANNELS};
use crate::utils::error::{Result, SpotError};
use crate::NUM_CLASSES;

/// File extensions accepted as images
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Options controlling dataset construction
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    /// Whether files with an unrecognized color prefix (label id 0) are
    /// kept as training samples or dropped at load time
    pub include_unknown: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            include_unknown: true,
        }
    }
}

/// A single preprocessed sample ready for batching
#[derive(Debug, Clone)]
pub struct SpotItem {
    /// Image data as a flattened CHW float array in [0, 1]
    pub image: Vec<f32>,
    /// Class id (see [`PieceColor`])
    pub label: usize,
    /// Source path, for logging
    pub path: String,
}

impl SpotItem {
    /// Convert a decoded RGB crop into CHW floats in [0, 1]
    pub fn from_rgb(img: &RgbImage, label: usize, path: String) -> Self {
        let (width, height) = (img.width() as usize, img.height() as usize);
        let mut image = vec![0.0f32; CHANNELS * height * width];

        for y in 0..height {
            for x in 0..width {
                let pixel = img.get_pixel(x as u32, y as u32);
                for c in 0..CHANNELS {
                    image[c * height * width + y * width + x] = pixel[c] as f32 / 255.0;
                }
            }
        }

        Self { image, label, path }
    }
}

/// In-memory dataset of labeled board-spot crops for one entity type
#[derive(Debug, Clone)]
pub struct SpotDataset {
    items: Vec<SpotItem>,
    entity: EntityKind,
}

impl SpotDataset {
    /// Build a dataset from a directory tree of per-session image folders.
    ///
    /// Fails fast on a missing root, on the first undecodable image, and on
    /// a tree that yields zero usable samples.
    pub fn from_dir<P: AsRef<Path>>(
        root_dir: P,
        entity: EntityKind,
        config: &DatasetConfig,
    ) -> Result<Self> {
        let root_dir = root_dir.as_ref();
        info!("Loading {} dataset from {:?}", entity, root_dir);

        if !root_dir.is_dir() {
            return Err(SpotError::Dataset(format!(
                "dataset root is not a directory: {root_dir:?}"
            )));
        }

        let mut folders: Vec<PathBuf> = Vec::new();
        for entry in std::fs::read_dir(root_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() && !is_hidden(&entry.file_name().to_string_lossy()) {
                folders.push(entry.path());
            }
        }
        // Sorted traversal keeps sample order reproducible across runs
        folders.sort();

        let mut items = Vec::new();
        let mut skipped_unknown = 0usize;

        for folder in &folders {
            let mut files: Vec<PathBuf> = WalkDir::new(folder)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.into_path())
                .filter(|p| is_image_file(p))
                .collect();
            files.sort();

            for path in files {
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let label = PieceColor::from_filename(&filename);

                if label == PieceColor::Unknown && !config.include_unknown {
                    skipped_unknown += 1;
                    continue;
                }

                load_into(&mut items, &path, entity, label)?;
            }

            debug!("Folder {:?}: {} samples so far", folder, items.len());
        }

        if items.is_empty() {
            return Err(SpotError::Dataset(format!(
                "no usable images found under {root_dir:?}"
            )));
        }

        if skipped_unknown > 0 {
            info!("Skipped {} images with unrecognized labels", skipped_unknown);
        }
        info!("Loaded {} samples", items.len());

        Ok(Self { items, entity })
    }

    /// Build a dataset directly from preprocessed items (used by tests and
    /// by callers that synthesize samples)
    pub fn from_items(items: Vec<SpotItem>, entity: EntityKind) -> Self {
        Self { items, entity }
    }

    /// Number of samples, after augmentation
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entity type this dataset targets
    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    /// All samples in traversal order
    pub fn items(&self) -> &[SpotItem] {
        &self.items
    }

    /// Randomly partition the index space into train/test subsets
    pub fn split(&self, train_fraction: f64, seed: u64) -> Result<TrainTestSplit> {
        split_indices(self.len(), train_fraction, seed)
    }

    /// Clone out the samples selected by an index set
    pub fn select(&self, indices: &[usize]) -> Vec<SpotItem> {
        indices.iter().map(|&i| self.items[i].clone()).collect()
    }

    /// Number of samples per class id
    pub fn class_distribution(&self) -> Vec<usize> {
        let mut counts = vec![0usize; NUM_CLASSES];
        for item in &self.items {
            if item.label < NUM_CLASSES {
                counts[item.label] += 1;
            }
        }
        counts
    }

    /// Summary statistics
    pub fn stats(&self) -> DatasetStats {
        DatasetStats {
            total_samples: self.len(),
            entity: self.entity,
            class_counts: self.class_distribution(),
        }
    }
}

impl burn::data::dataset::Dataset<SpotItem> for SpotDataset {
    fn get(&self, index: usize) -> Option<SpotItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Decode, resize, and append one source image (plus rotated copies for
/// station markers)
fn load_into(
    items: &mut Vec<SpotItem>,
    path: &Path,
    entity: EntityKind,
    label: PieceColor,
) -> Result<()> {
    let (width, height) = entity.dimensions();

    let decoded = ImageReader::open(path)
        .map_err(|e| SpotError::ImageLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
        .decode()
        .map_err(|e| SpotError::ImageLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let resized = decoded
        .resize_exact(width, height, image::imageops::FilterType::Triangle)
        .to_rgb8();

    let path_str = path.to_string_lossy().to_string();

    match entity {
        EntityKind::Station => {
            for rotated in quarter_rotations(&resized) {
                items.push(SpotItem::from_rgb(&rotated, label.id(), path_str.clone()));
            }
        }
        EntityKind::Train => {
            items.push(SpotItem::from_rgb(&resized, label.id(), path_str));
        }
    }

    Ok(())
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn is_image_file(path: &Path) -> bool {
    if path
        .file_name()
        .map(|n| is_hidden(&n.to_string_lossy()))
        .unwrap_or(true)
    {
        return false;
    }
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Statistics about a loaded dataset
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub total_samples: usize,
    pub entity: EntityKind,
    pub class_counts: Vec<usize>,
}

impl std::fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Dataset ({} spots): {} samples", self.entity, self.total_samples)?;
        for (id, count) in self.class_counts.iter().enumerate() {
            let name = PieceColor::from_id(id).map(|c| c.name()).unwrap_or("?");
            writeln!(f, "  {:>8}: {}", name, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::fs;

    fn write_png(path: &Path, width: u32, height: u32, color: [u8; 3]) {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        img.save(path).unwrap();
    }

    fn build_station_fixture(root: &Path) {
        // 5 folders x 2 images, all red
        for folder in 0..5 {
            let dir = root.join(format!("session_{folder:02}"));
            fs::create_dir_all(&dir).unwrap();
            write_png(&dir.join("red-1.png"), 64, 48, [200, 30, 30]);
            write_png(&dir.join("red-2.png"), 32, 32, [180, 20, 20]);
        }
    }

    #[test]
    fn test_station_augmentation_quadruples_samples() {
        let tmp = tempfile::tempdir().unwrap();
        build_station_fixture(tmp.path());

        let dataset =
            SpotDataset::from_dir(tmp.path(), EntityKind::Station, &DatasetConfig::default())
                .unwrap();

        // 5 folders x 2 images x 4 rotations
        assert_eq!(dataset.len(), 40);
        for item in dataset.items() {
            assert_eq!(item.label, PieceColor::Red.id());
            assert_eq!(item.image.len(), 3 * 100 * 100);
        }
    }

    #[test]
    fn test_train_entity_not_augmented() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("session_00");
        fs::create_dir_all(&dir).unwrap();
        write_png(&dir.join("blue-1.png"), 40, 40, [20, 20, 200]);
        write_png(&dir.join("green-1.png"), 40, 40, [20, 200, 20]);

        let dataset =
            SpotDataset::from_dir(tmp.path(), EntityKind::Train, &DatasetConfig::default())
                .unwrap();

        assert_eq!(dataset.len(), 2);
        for item in dataset.items() {
            assert_eq!(item.image.len(), 3 * 50 * 125);
        }
    }

    #[test]
    fn test_unlabeled_file_maps_to_unknown() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("session_00");
        fs::create_dir_all(&dir).unwrap();
        write_png(&dir.join("foo-1.png"), 16, 16, [1, 2, 3]);

        let dataset =
            SpotDataset::from_dir(tmp.path(), EntityKind::Train, &DatasetConfig::default())
                .unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.items()[0].label, 0);
    }

    #[test]
    fn test_unknown_samples_can_be_excluded() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("session_00");
        fs::create_dir_all(&dir).unwrap();
        write_png(&dir.join("foo-1.png"), 16, 16, [1, 2, 3]);
        write_png(&dir.join("red-1.png"), 16, 16, [200, 0, 0]);

        let config = DatasetConfig {
            include_unknown: false,
        };
        let dataset = SpotDataset::from_dir(tmp.path(), EntityKind::Train, &config).unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.items()[0].label, PieceColor::Red.id());
    }

    #[test]
    fn test_hidden_entries_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("session_00");
        fs::create_dir_all(&dir).unwrap();
        write_png(&dir.join("red-1.png"), 16, 16, [200, 0, 0]);
        fs::write(dir.join(".DS_Store"), b"junk").unwrap();
        fs::create_dir_all(tmp.path().join(".cache")).unwrap();

        let dataset =
            SpotDataset::from_dir(tmp.path(), EntityKind::Train, &DatasetConfig::default())
                .unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_corrupt_image_fails_fast() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("session_00");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("red-1.png"), b"not a png").unwrap();

        let result =
            SpotDataset::from_dir(tmp.path(), EntityKind::Station, &DatasetConfig::default());
        assert!(matches!(result, Err(SpotError::ImageLoad { .. })));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let result = SpotDataset::from_dir(
            "/nonexistent/spot_data",
            EntityKind::Train,
            &DatasetConfig::default(),
        );
        assert!(matches!(result, Err(SpotError::Dataset(_))));
    }

    #[test]
    fn test_empty_root_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let result =
            SpotDataset::from_dir(tmp.path(), EntityKind::Train, &DatasetConfig::default());
        assert!(matches!(result, Err(SpotError::Dataset(_))));
    }

    #[test]
    fn test_pixels_normalized_to_unit_range() {
        let img = RgbImage::from_pixel(4, 4, Rgb([255, 0, 128]));
        let item = SpotItem::from_rgb(&img, 1, "test.png".to_string());

        // CHW layout: R plane, then G, then B
        assert_eq!(item.image[0], 1.0);
        assert_eq!(item.image[16], 0.0);
        assert!((item.image[32] - 128.0 / 255.0).abs() < 1e-6);
    }
}
