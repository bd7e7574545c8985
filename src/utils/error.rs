//! Error Handling Module
//!
//! Defines the error taxonomy for the trainspotter library.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for trainspotter operations
#[derive(Error, Debug)]
pub enum SpotError {
    /// An image file could not be opened or decoded. Dataset construction
    /// fails fast on the first unreadable image rather than silently
    /// dropping samples and skewing the label distribution.
    #[error("failed to load image at '{path}': {reason}")]
    ImageLoad { path: PathBuf, reason: String },

    /// Error with dataset construction (missing root, no usable images)
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Train/test split parameter outside the open interval (0, 1)
    #[error("train fraction must be in (0, 1), got {0}")]
    InvalidFraction(f64),

    /// A batch produced a non-finite loss; the run aborts instead of
    /// skipping the batch and biasing the reported metrics
    #[error("non-finite loss {loss} in epoch {epoch}, batch {batch}")]
    TrainingDivergence {
        epoch: usize,
        batch: usize,
        loss: f64,
    },

    /// Persisted weights do not match the target architecture
    #[error("model file '{path}' does not match the expected architecture: {reason}")]
    CorruptModel { path: PathBuf, reason: String },

    /// A training run was cancelled between batches
    #[error("training run cancelled")]
    Cancelled,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for trainspotter operations
pub type Result<T> = std::result::Result<T, SpotError>;
