//! Inference predictor
//!
//! The interface the board scorer consumes: load a persisted spot model and
//! turn newly captured board-region crops into piece colors. Preprocessing
//! (resize, CHW conversion, centered normalization) matches the training
//! pipeline exactly.

use std::path::Path;

use burn::data::dataloader::batcher::Batcher;
use burn::tensor::backend::Backend;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::dataset::batcher::SpotBatcher;
use crate::dataset::label::PieceColor;
use crate::dataset::loader::SpotItem;
use crate::dataset::EntityKind;
use crate::model::cnn::{SpotClassifier, SpotClassifierConfig};
use crate::model::persistence::load_weights;
use crate::utils::error::{Result, SpotError};

/// Result of classifying one crop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted piece color
    pub color: PieceColor,
    /// Probability of the predicted class
    pub confidence: f32,
    /// Full probability distribution over the 6 class ids
    pub probabilities: Vec<f32>,
}

/// Loaded spot classifier ready for inference on board crops
pub struct Predictor<B: Backend> {
    model: SpotClassifier<B>,
    batcher: SpotBatcher<B>,
    entity: EntityKind,
}

impl<B: Backend> Predictor<B> {
    /// Load persisted weights for the given entity type
    pub fn from_file(path: &Path, entity: EntityKind, device: B::Device) -> Result<Self> {
        let config = SpotClassifierConfig::for_entity(entity);
        let model = load_weights::<B>(&config, path, &device)?;

        Ok(Self {
            model,
            batcher: SpotBatcher::new(entity, device),
            entity,
        })
    }

    /// Wrap an already constructed model (e.g. straight after training)
    pub fn from_model(model: SpotClassifier<B>, entity: EntityKind, device: B::Device) -> Self {
        Self {
            model,
            batcher: SpotBatcher::new(entity, device),
            entity,
        }
    }

    /// Entity type this predictor was trained for
    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    /// Classify a single crop
    pub fn predict(&self, image: &DynamicImage) -> Result<Prediction> {
        Ok(self.predict_batch(std::slice::from_ref(image))?.remove(0))
    }

    /// Classify a batch of crops, one prediction per input in order
    pub fn predict_batch(&self, images: &[DynamicImage]) -> Result<Vec<Prediction>> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let (width, height) = self.entity.dimensions();
        let items: Vec<SpotItem> = images
            .iter()
            .map(|img| {
                let resized = img
                    .resize_exact(width, height, image::imageops::FilterType::Triangle)
                    .to_rgb8();
                SpotItem::from_rgb(&resized, 0, String::new())
            })
            .collect();

        let batch = self.batcher.batch(items);
        let probs = self.model.forward_softmax(batch.images);
        let [batch_size, num_classes] = probs.dims();

        let values: Vec<f32> = probs
            .into_data()
            .to_vec()
            .map_err(|e| SpotError::Config(format!("failed to read prediction tensor: {e:?}")))?;

        let mut predictions = Vec::with_capacity(batch_size);
        for row in values.chunks(num_classes) {
            let (best_id, &confidence) = row
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .unwrap_or((0, &0.0));

            predictions.push(Prediction {
                color: PieceColor::from_id(best_id).unwrap_or(PieceColor::Unknown),
                confidence,
                probabilities: row.to_vec(),
            });
        }

        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::persistence::save_weights;
    use burn::backend::NdArray;
    use image::{Rgb, RgbImage};

    type TestBackend = NdArray<f32>;

    fn crop(color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, Rgb(color)))
    }

    #[test]
    fn test_predict_returns_distribution() {
        let device = Default::default();
        let model =
            SpotClassifierConfig::for_entity(EntityKind::Station).init::<TestBackend>(&device);
        let predictor = Predictor::from_model(model, EntityKind::Station, device);

        let prediction = predictor.predict(&crop([200, 30, 30])).unwrap();

        assert_eq!(prediction.probabilities.len(), 6);
        let sum: f32 = prediction.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert!(prediction.confidence > 0.0);
    }

    #[test]
    fn test_predict_batch_preserves_order_and_count() {
        let device = Default::default();
        let model =
            SpotClassifierConfig::for_entity(EntityKind::Train).init::<TestBackend>(&device);
        let predictor = Predictor::from_model(model, EntityKind::Train, device);

        let crops = vec![crop([200, 0, 0]), crop([0, 0, 200]), crop([0, 200, 0])];
        let predictions = predictor.predict_batch(&crops).unwrap();
        assert_eq!(predictions.len(), 3);

        // Same input twice yields the same prediction (frozen parameters)
        let again = predictor.predict_batch(&crops).unwrap();
        for (a, b) in predictions.iter().zip(&again) {
            assert_eq!(a.probabilities, b.probabilities);
        }
    }

    #[test]
    fn test_predict_batch_empty_input() {
        let device = Default::default();
        let model =
            SpotClassifierConfig::for_entity(EntityKind::Train).init::<TestBackend>(&device);
        let predictor = Predictor::from_model(model, EntityKind::Train, device);
        assert!(predictor.predict_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_from_file_round_trip() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("station_spots");

        let model =
            SpotClassifierConfig::for_entity(EntityKind::Station).init::<TestBackend>(&device);
        let direct = Predictor::from_model(model.clone(), EntityKind::Station, device.clone());
        save_weights(model, &path).unwrap();

        let loaded = Predictor::<TestBackend>::from_file(&path, EntityKind::Station, device)
            .unwrap();

        let image = crop([10, 120, 240]);
        let a = direct.predict(&image).unwrap();
        let b = loaded.predict(&image).unwrap();
        assert_eq!(a.probabilities, b.probabilities);
    }
}
