//! End-to-end training orchestration
//!
//! Glues the pipeline together: labeled folders on disk -> dataset ->
//! train/test split -> epoch loop -> persisted weights and metrics curve.

use std::path::{Path, PathBuf};

use burn::tensor::backend::AutodiffBackend;
use tracing::info;

use super::trainer::{CancelToken, TrainConfig, Trainer};
use crate::dataset::loader::{DatasetConfig, SpotDataset};
use crate::dataset::EntityKind;
use crate::model::cnn::SpotClassifierConfig;
use crate::utils::error::Result;
use crate::utils::metrics::TrainingCurve;

/// Train a spot classifier for one entity type and persist the result.
///
/// Writes the weights to `output_path` (recorder appends its extension)
/// and the metrics curve to `<output_path>.metrics.json`. Returns the
/// full epoch curve.
pub fn run_training<B: AutodiffBackend>(
    data_dir: &str,
    entity: EntityKind,
    train_config: &TrainConfig,
    dataset_config: &DatasetConfig,
    output_path: &Path,
) -> Result<TrainingCurve> {
    train_config.validate()?;

    let device = B::Device::default();
    info!("Training {} classifier on device {:?}", entity, device);

    let dataset = SpotDataset::from_dir(data_dir, entity, dataset_config)?;
    info!("{}", dataset.stats());

    let split = dataset.split(train_config.train_fraction, train_config.seed)?;
    info!(
        "Split: {} train / {} test samples",
        split.train.len(),
        split.test.len()
    );

    let train_items = dataset.select(&split.train);
    let test_items = dataset.select(&split.test);

    let model = SpotClassifierConfig::for_entity(entity).init::<B>(&device);
    let mut trainer = Trainer::new(model, entity, train_config.clone(), device);

    let curve = trainer.fit(&train_items, &test_items, None)?;

    trainer.save_checkpoint(output_path)?;
    curve.save(&metrics_path(output_path))?;

    Ok(curve)
}

/// Same as [`run_training`], with a cancellation token checked between
/// batches.
pub fn run_training_cancellable<B: AutodiffBackend>(
    data_dir: &str,
    entity: EntityKind,
    train_config: &TrainConfig,
    dataset_config: &DatasetConfig,
    output_path: &Path,
    cancel: &CancelToken,
) -> Result<TrainingCurve> {
    train_config.validate()?;

    let device = B::Device::default();
    let dataset = SpotDataset::from_dir(data_dir, entity, dataset_config)?;
    let split = dataset.split(train_config.train_fraction, train_config.seed)?;

    let train_items = dataset.select(&split.train);
    let test_items = dataset.select(&split.test);

    let model = SpotClassifierConfig::for_entity(entity).init::<B>(&device);
    let mut trainer = Trainer::new(model, entity, train_config.clone(), device);

    let curve = trainer.fit(&train_items, &test_items, Some(cancel))?;

    trainer.save_checkpoint(output_path)?;
    curve.save(&metrics_path(output_path))?;

    Ok(curve)
}

fn metrics_path(output_path: &Path) -> PathBuf {
    let mut name = output_path.as_os_str().to_os_string();
    name.push(".metrics.json");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use image::{Rgb, RgbImage};
    use std::fs;

    type TestAutodiffBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn test_end_to_end_training_run() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        // Ten train-car crops across two sessions, two colors
        for session in 0..2 {
            let dir = data.path().join(format!("session_{session}"));
            fs::create_dir_all(&dir).unwrap();
            for i in 0..5 {
                let (name, color) = if i % 2 == 0 {
                    (format!("red-{i}.png"), [200u8, 20, 20])
                } else {
                    (format!("blue-{i}.png"), [20u8, 20, 200])
                };
                RgbImage::from_pixel(30, 20, Rgb(color))
                    .save(dir.join(name))
                    .unwrap();
            }
        }

        let config = TrainConfig {
            epochs: 2,
            batch_size: 4,
            ..Default::default()
        };
        let model_path = out.path().join("train_spots");

        let curve = run_training::<TestAutodiffBackend>(
            data.path().to_str().unwrap(),
            EntityKind::Train,
            &config,
            &DatasetConfig::default(),
            &model_path,
        )
        .unwrap();

        assert_eq!(curve.len(), 2);
        assert!(curve.records.iter().all(|r| r.duration_secs > 0.0));

        // Both artifacts persisted
        assert!(out.path().join("train_spots.mpk").exists());
        let reloaded = TrainingCurve::load(&metrics_path(&model_path)).unwrap();
        assert_eq!(reloaded.len(), 2);
    }
}
