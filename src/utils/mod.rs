//! Shared utilities: errors, logging, metrics

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{Result, SpotError};
pub use metrics::{EpochRecord, TrainingCurve};
