//! Training module
//!
//! This module provides:
//! - The epoch loop with separate train and evaluation entry points
//! - Run orchestration from a dataset directory to persisted artifacts
//! - Cooperative cancellation between batches
//!
//! One epoch is a full shuffled, batched gradient pass over the train
//! subset followed by a full shuffled, batched evaluation pass over the
//! test subset. Evaluation runs on the non-autodiff model view and never
//! updates parameters.

pub mod run;
pub mod trainer;

pub use run::{run_training, run_training_cancellable};
pub use trainer::{accuracy, BatchStats, CancelToken, TrainConfig, Trainer};

/// Default number of training epochs
pub const DEFAULT_EPOCHS: usize = 10;

/// Default batch size
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Default learning rate
pub const DEFAULT_LEARNING_RATE: f64 = 1e-3;

/// Default train fraction of the dataset
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.7;
