//! Model weight persistence
//!
//! Weights are stored with Burn's named-MessagePack file recorder at full
//! precision so a save/load round trip recovers parameters bit-exactly.
//! The recorder appends its own `.mpk` extension; callers pass the path
//! without one.

use std::path::Path;

use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use burn::tensor::backend::Backend;
use tracing::info;

use super::cnn::{SpotClassifier, SpotClassifierConfig, SpotClassifierRecord};
use crate::utils::error::{Result, SpotError};

type SpotRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Serialize a model's parameter state to `path`
pub fn save_weights<B: Backend>(model: SpotClassifier<B>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    model
        .save_file(path, &SpotRecorder::new())
        .map_err(|e| SpotError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;

    info!("Model saved to {:?}", path);
    Ok(())
}

/// Deserialize weights from `path` into a model of the given architecture.
///
/// A file whose recorded shapes do not match the configuration fails with
/// `CorruptModel`.
pub fn load_weights<B: Backend>(
    config: &SpotClassifierConfig,
    path: &Path,
    device: &B::Device,
) -> Result<SpotClassifier<B>> {
    let record: SpotClassifierRecord<B> = SpotRecorder::new()
        .load(path.to_path_buf(), device)
        .map_err(|e| SpotError::CorruptModel {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    // The record format does not carry the architecture, so a file saved
    // for the other entity's dimensions deserializes fine; reject it by
    // checking the dense-layer shapes against the target configuration.
    check_shape(
        path,
        "fc1.weight",
        record.fc1.weight.val().dims(),
        [config.flattened_features(), config.hidden_units],
    )?;
    check_shape(
        path,
        "fc2.weight",
        record.fc2.weight.val().dims(),
        [config.hidden_units, config.num_classes],
    )?;

    let model = config.init::<B>(device).load_record(record);

    info!("Model loaded from {:?}", path);
    Ok(model)
}

fn check_shape(path: &Path, name: &str, actual: [usize; 2], expected: [usize; 2]) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(SpotError::CorruptModel {
            path: path.to_path_buf(),
            reason: format!("{name} has shape {actual:?}, expected {expected:?}"),
        })
    }
}
