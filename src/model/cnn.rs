//! Spot classifier CNN
//!
//! A single convolutional stage followed by a small dense head, mapping a
//! fixed-size color crop to a 6-way score vector. The two published
//! configurations (train cars, station markers) differ only in input
//! dimensions; the flattened feature width feeding the first dense layer is
//! derived from those dimensions rather than hard-coded.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Linear, LinearConfig, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

use crate::dataset::EntityKind;

/// Configuration for the spot classifier
#[derive(Config, Debug)]
pub struct SpotClassifierConfig {
    /// Input image height in pixels
    pub input_height: usize,

    /// Input image width in pixels
    pub input_width: usize,

    /// Number of output classes
    #[config(default = "6")]
    pub num_classes: usize,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Number of convolutional filters
    #[config(default = "15")]
    pub conv_filters: usize,

    /// Kernel size of the convolution (no padding)
    #[config(default = "3")]
    pub kernel_size: usize,

    /// Units in the hidden dense layer
    #[config(default = "512")]
    pub hidden_units: usize,
}

impl SpotClassifierConfig {
    /// Configuration for the given entity's fixed crop dimensions
    pub fn for_entity(entity: EntityKind) -> Self {
        let (width, height) = entity.dimensions();
        Self::new(height as usize, width as usize)
    }

    /// Width of the flattened feature vector after convolution and pooling.
    ///
    /// The convolution has no padding (each spatial dimension shrinks by
    /// `kernel_size - 1`) and the 2x2 max pool halves and floors what
    /// remains.
    pub fn flattened_features(&self) -> usize {
        let h = (self.input_height - (self.kernel_size - 1)) / 2;
        let w = (self.input_width - (self.kernel_size - 1)) / 2;
        self.conv_filters * h * w
    }

    /// Initialize a model from this configuration
    pub fn init<B: Backend>(&self, device: &B::Device) -> SpotClassifier<B> {
        let conv = Conv2dConfig::new(
            [self.in_channels, self.conv_filters],
            [self.kernel_size, self.kernel_size],
        )
        .init(device);

        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();
        let fc1 = LinearConfig::new(self.flattened_features(), self.hidden_units).init(device);
        let fc2 = LinearConfig::new(self.hidden_units, self.num_classes).init(device);

        SpotClassifier {
            conv,
            pool,
            relu: Relu::new(),
            fc1,
            fc2,
            num_classes: self.num_classes,
        }
    }
}

/// Spot color classifier
///
/// Architecture: Conv2d 3->15 (3x3, no padding) -> ReLU -> MaxPool 2x2 ->
/// ReLU -> flatten -> Linear ->512 -> ReLU -> Linear ->6 logits.
#[derive(Module, Debug)]
pub struct SpotClassifier<B: Backend> {
    pub conv: Conv2d<B>,
    pub pool: MaxPool2d,
    pub relu: Relu,
    pub fc1: Linear<B>,
    pub fc2: Linear<B>,

    num_classes: usize,
}

impl<B: Backend> SpotClassifier<B> {
    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, height, width]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv.forward(x);
        let x = self.relu.forward(x);
        let x = self.pool.forward(x);
        // Second activation is a no-op on pooled values but part of the
        // published layer stack
        let x = self.relu.forward(x);

        let [batch_size, channels, height, width] = x.dims();
        let x = x.reshape([batch_size, channels * height * width]);

        let x = self.fc1.forward(x);
        let x = self.relu.forward(x);
        self.fc2.forward(x)
    }

    /// Forward pass with softmax, for inference
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(x);
        burn::tensor::activation::softmax(logits, 1)
    }

    /// Number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}
