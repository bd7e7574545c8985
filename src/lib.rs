//! # Trainspotter
//!
//! A Rust library for classifying the color of physical game pieces (train
//! cars and station markers) photographed on a board, built on the Burn
//! framework. Downstream scoring logic consumes the persisted models to turn
//! board-region crops into structured color labels.
//!
//! ## Modules
//!
//! - `dataset`: Labeled-folder loading, rotation augmentation, train/test
//!   splitting, and batching
//! - `model`: The spot classifier CNN, one configuration per entity type
//! - `training`: Train/eval loop with per-epoch metrics and persistence
//! - `inference`: Prediction interface for the board scorer
//! - `utils`: Errors, logging, and metric reporting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trainspotter::backend::TrainingBackend;
//! use trainspotter::dataset::{DatasetConfig, EntityKind};
//! use trainspotter::training::{run_training, TrainConfig};
//!
//! let curve = run_training::<TrainingBackend>(
//!     "data/station_data",
//!     EntityKind::Station,
//!     &TrainConfig::default(),
//!     &DatasetConfig::default(),
//!     "models/station_spots".as_ref(),
//! )?;
//! println!("{curve}");
//! ```

pub mod backend;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod training;
pub mod utils;

pub use dataset::label::PieceColor;
pub use dataset::{DatasetConfig, EntityKind, SpotBatch, SpotBatcher, SpotDataset, SpotItem};
pub use inference::predictor::{Prediction, Predictor};
pub use model::cnn::{SpotClassifier, SpotClassifierConfig};
pub use training::run::{run_training, run_training_cancellable};
pub use training::trainer::{CancelToken, TrainConfig, Trainer};
pub use utils::error::{Result, SpotError};
pub use utils::metrics::{EpochRecord, TrainingCurve};

/// Number of output classes (five colors plus unknown)
pub const NUM_CLASSES: usize = 6;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
