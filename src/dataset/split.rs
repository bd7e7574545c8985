//! Random train/test partitioning
//!
//! Assignment is randomized with a seeded RNG so runs are reproducible by
//! default; operators opt into true randomness by passing an entropy-derived
//! seed. No class stratification is attempted: the split guarantees only
//! that the two index sets are disjoint and together cover the dataset.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::utils::error::{Result, SpotError};

/// Seed used when the operator does not supply one
pub const DEFAULT_SEED: u64 = 42;

/// A partition of `[0, len)` into disjoint train/test index sets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    /// Total number of indices across both sets
    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty() && self.test.is_empty()
    }
}

/// Partition `[0, dataset_len)` into train and test index sets.
///
/// `|train| = floor(train_fraction * dataset_len)`; the remainder goes to
/// the test set. Fails when `train_fraction` is outside the open interval
/// `(0, 1)` or when the dataset is empty.
pub fn split_indices(dataset_len: usize, train_fraction: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(SpotError::InvalidFraction(train_fraction));
    }
    if dataset_len == 0 {
        return Err(SpotError::Dataset(
            "cannot split an empty dataset".to_string(),
        ));
    }

    let mut indices: Vec<usize> = (0..dataset_len).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train_len = (train_fraction * dataset_len as f64).floor() as usize;
    let test = indices.split_off(train_len);

    Ok(TrainTestSplit {
        train: indices,
        test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_split_sizes_use_floor() {
        let split = split_indices(100, 0.7, DEFAULT_SEED).unwrap();
        assert_eq!(split.train.len(), 70);
        assert_eq!(split.test.len(), 30);

        let split = split_indices(10, 0.75, DEFAULT_SEED).unwrap();
        assert_eq!(split.train.len(), 7);
        assert_eq!(split.test.len(), 3);
    }

    #[test]
    fn test_split_is_disjoint_and_complete() {
        let split = split_indices(137, 0.7, 7).unwrap();

        let train: HashSet<_> = split.train.iter().copied().collect();
        let test: HashSet<_> = split.test.iter().copied().collect();

        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), 137);

        let all: HashSet<_> = train.union(&test).copied().collect();
        assert_eq!(all, (0..137).collect());
    }

    #[test]
    fn test_same_seed_reproduces_split() {
        let a = split_indices(50, 0.6, 99).unwrap();
        let b = split_indices(50, 0.6, 99).unwrap();
        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);
    }

    #[test]
    fn test_different_seed_changes_split() {
        let a = split_indices(50, 0.6, 1).unwrap();
        let b = split_indices(50, 0.6, 2).unwrap();
        assert_ne!(a.train, b.train);
    }

    #[test]
    fn test_invalid_fractions_rejected() {
        for fraction in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let result = split_indices(10, fraction, DEFAULT_SEED);
            assert!(matches!(result, Err(SpotError::InvalidFraction(_))));
        }
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let result = split_indices(0, 0.7, DEFAULT_SEED);
        assert!(matches!(result, Err(SpotError::Dataset(_))));
    }
}
