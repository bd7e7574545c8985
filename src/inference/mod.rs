//! Inference on trained spot classifiers

pub mod predictor;

pub use predictor::{Prediction, Predictor};
