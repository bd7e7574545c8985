//! Spot classifier CNN and weight persistence

pub mod cnn;
pub mod persistence;

pub use cnn::{SpotClassifier, SpotClassifierConfig};
pub use persistence::{load_weights, save_weights};
