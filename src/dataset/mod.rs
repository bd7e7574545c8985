//! Dataset module for board-spot imagery
//!
//! This module provides functionality for:
//! - Loading labeled piece images from per-session folders on disk
//! - Rotation augmentation for station markers
//! - Random train/test splitting
//! - Batching and normalization for the Burn training loop
//!
//! ## Directory layout
//!
//! The loader expects a root directory whose immediate children are folders
//! of images, with labels encoded in the filenames:
//!
//! ```text
//! station_data/
//! ├── session_01/
//! │   ├── red-1.png
//! │   └── blue-2.png
//! ├── session_02/
//! │   └── yellow-1.png
//! └── ...
//! ```

pub mod augmentation;
pub mod batcher;
pub mod label;
pub mod loader;
pub mod split;

// Re-export main types for convenience
pub use batcher::{SpotBatch, SpotBatcher};
pub use label::PieceColor;
pub use loader::{DatasetConfig, DatasetStats, SpotDataset, SpotItem};
pub use split::{split_indices, TrainTestSplit, DEFAULT_SEED};

use serde::{Deserialize, Serialize};

/// Number of color channels per image
pub const CHANNELS: usize = 3;

/// Which physical game-piece class a dataset or model instance targets.
///
/// Each entity has its own fixed image dimensions and its own trained
/// weights; the two are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Station markers, square 100x100 crops, augmented by rotation
    Station,
    /// Train cars, 125x50 crops, no augmentation
    Train,
}

impl EntityKind {
    /// Fixed image dimensions as (width, height)
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            EntityKind::Station => (100, 100),
            EntityKind::Train => (125, 50),
        }
    }

}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Station => write!(f, "station"),
            EntityKind::Train => write!(f, "train"),
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "station" => Ok(EntityKind::Station),
            "train" => Ok(EntityKind::Train),
            other => Err(format!("unknown entity kind '{other}' (expected 'station' or 'train')")),
        }
    }
}
