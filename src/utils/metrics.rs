//! Training metrics
//!
//! One `EpochRecord` is appended per epoch; the ordered sequence forms the
//! training curve returned at the end of a run and written next to the
//! persisted model for later inspection.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::error::{Result, SpotError};

/// Metrics for a single epoch, immutable once appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// Epoch index, 0-based
    pub epoch: usize,
    /// Mean cross-entropy loss over all train batches
    pub train_loss: f64,
    /// Mean batch accuracy over all train batches
    pub train_accuracy: f64,
    /// Mean cross-entropy loss over all test batches
    pub test_loss: f64,
    /// Mean batch accuracy over all test batches
    pub test_accuracy: f64,
    /// Wall-clock duration of the epoch in seconds
    pub duration_secs: f64,
}

/// The ordered per-epoch metric sequence for one training run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingCurve {
    pub records: Vec<EpochRecord>,
}

impl TrainingCurve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: EpochRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest test accuracy seen across epochs, `None` for an empty curve
    pub fn best_test_accuracy(&self) -> Option<f64> {
        self.records
            .iter()
            .map(|r| r.test_accuracy)
            .reduce(f64::max)
    }

    /// Metrics of the last completed epoch
    pub fn last(&self) -> Option<&EpochRecord> {
        self.records.last()
    }

    /// Write the curve as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SpotError::Config(format!("failed to serialize curve: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a curve back from JSON
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| SpotError::Config(format!("failed to parse curve: {e}")))
    }
}

impl std::fmt::Display for TrainingCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{:>5}  {:>10}  {:>9}  {:>10}  {:>9}  {:>8}",
            "epoch", "train_loss", "train_acc", "test_loss", "test_acc", "secs"
        )?;
        for r in &self.records {
            writeln!(
                f,
                "{:>5}  {:>10.4}  {:>8.2}%  {:>10.4}  {:>8.2}%  {:>8.1}",
                r.epoch + 1,
                r.train_loss,
                r.train_accuracy * 100.0,
                r.test_loss,
                r.test_accuracy * 100.0,
                r.duration_secs
            )?;
        }
        Ok(())
    }
}
