//! Batching for the Burn training loop
//!
//! Assembles `SpotItem`s into image/target tensors and applies the centered
//! normalization the models are trained with: pixels arrive in [0, 1] and
//! leave as `(x - 0.5) / 0.5`, i.e. [-1, 1].

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;

use super::loader::SpotItem;
use super::{EntityKind, CHANNELS};

/// A batch of spot crops for training or evaluation
#[derive(Clone, Debug)]
pub struct SpotBatch<B: Backend> {
    /// Images with shape [batch_size, 3, height, width], normalized to [-1, 1]
    pub images: Tensor<B, 4>,
    /// Labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher for spot crops of one entity type
#[derive(Clone, Debug)]
pub struct SpotBatcher<B: Backend> {
    device: B::Device,
    height: usize,
    width: usize,
}

impl<B: Backend> SpotBatcher<B> {
    /// Create a batcher for the given entity's fixed dimensions
    pub fn new(entity: EntityKind, device: B::Device) -> Self {
        let (width, height) = entity.dimensions();
        Self {
            device,
            height: height as usize,
            width: width as usize,
        }
    }
}

impl<B: Backend> Batcher<SpotItem, SpotBatch<B>> for SpotBatcher<B> {
    fn batch(&self, items: Vec<SpotItem>) -> SpotBatch<B> {
        let batch_size = items.len();

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, CHANNELS, self.height, self.width]),
            &self.device,
        );

        // Center [0, 1] pixels to [-1, 1]
        let images = images.sub_scalar(0.5).div_scalar(0.5);

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(targets_data, [batch_size]),
            &self.device,
        );

        SpotBatch { images, targets }
    }
}
