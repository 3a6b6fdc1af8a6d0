//! Seeded train/test partitioning.

use crate::error::SplitError;
use crate::samples::Samples;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Split configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Share of examples held out for testing, in (0, 1).
    pub test_fraction: f64,
    /// Seed of the shuffle.
    pub seed: u64,
    /// Shuffle before splitting. Without shuffling the tail is the test set.
    pub shuffle: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.3,
            seed: 1,
            shuffle: true,
        }
    }
}

impl SplitConfig {
    /// Set the test fraction.
    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    /// Set the shuffle seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Partition sizes `(train, test)` for `rows` examples.
    pub fn sizes(&self, rows: usize) -> Result<(usize, usize), SplitError> {
        let fraction = self.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(SplitError::InvalidFraction(fraction));
        }
        let exact = rows as f64 * fraction;
        // 100 * 0.3 is 30.000000000000004 in f64
        let test = if (exact - exact.round()).abs() < 1e-9 {
            exact.round() as usize
        } else {
            exact.ceil() as usize
        };
        let train = rows.saturating_sub(test);
        if test == 0 || train == 0 {
            return Err(SplitError::EmptyPartition { rows, test, train });
        }
        Ok((train, test))
    }
}

/// Training and test partitions of one sample set.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    /// Training examples.
    pub train: Samples,
    /// Held-out examples.
    pub test: Samples,
    /// Source positions of the training examples.
    pub train_indices: Vec<usize>,
    /// Source positions of the test examples.
    pub test_indices: Vec<usize>,
}

/// Split `samples` into training and test partitions.
///
/// The test partition has `ceil(len * test_fraction)` examples. With
/// shuffling on, it is the head of a seeded permutation and the training
/// partition is the rest, so equal inputs and configs always give equal
/// partitions.
pub fn train_test_split(
    samples: &Samples,
    config: &SplitConfig,
) -> Result<TrainTestSplit, SplitError> {
    let (train_len, test_len) = config.sizes(samples.len())?;

    let mut order: Vec<usize> = (0..samples.len()).collect();
    let (test_indices, train_indices) = if config.shuffle {
        let mut rng = StdRng::seed_from_u64(config.seed);
        order.shuffle(&mut rng);
        let train = order.split_off(test_len);
        (order, train)
    } else {
        let test = order.split_off(train_len);
        (test, order)
    };

    Ok(TrainTestSplit {
        train: samples.select(&train_indices),
        test: samples.select(&test_indices),
        train_indices,
        test_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::Label;
    use std::collections::HashSet;

    fn samples(n: usize) -> Samples {
        let mut samples = Samples::new();
        for i in 0..n {
            samples.push(vec![i as f64; 3], Label::from(i % 2 == 0));
        }
        samples
    }

    #[test]
    fn test_sizes() {
        let config = SplitConfig::default();
        assert_eq!(config.sizes(10).unwrap(), (7, 3));
        assert_eq!(config.sizes(11).unwrap(), (7, 4));
        assert_eq!(config.sizes(100).unwrap(), (70, 30));
        assert!(config.sizes(1).is_err());
        assert!(SplitConfig::default()
            .with_test_fraction(1.0)
            .sizes(10)
            .is_err());
        assert!(SplitConfig::default()
            .with_test_fraction(0.0)
            .sizes(10)
            .is_err());
    }

    #[test]
    fn test_partitions_cover_all_rows_once() {
        let source = samples(100);
        let split = train_test_split(&source, &SplitConfig::default()).unwrap();

        assert_eq!(split.train.len(), 70);
        assert_eq!(split.test.len(), 30);

        let all: HashSet<usize> = split
            .train_indices
            .iter()
            .chain(&split.test_indices)
            .copied()
            .collect();
        assert_eq!(all.len(), 100);

        for (pos, &i) in split.test_indices.iter().enumerate() {
            assert_eq!(split.test.features()[pos], source.features()[i]);
            assert_eq!(split.test.labels()[pos], source.labels()[i]);
        }
    }

    #[test]
    fn test_split_is_stable() {
        let source = samples(57);
        let config = SplitConfig::default().with_seed(99);
        let a = train_test_split(&source, &config).unwrap();
        let b = train_test_split(&source, &config).unwrap();
        assert_eq!(a, b);

        let c = train_test_split(&source, &config.clone().with_seed(100)).unwrap();
        assert_ne!(a.test_indices, c.test_indices);
    }

    #[test]
    fn test_no_shuffle_takes_tail() {
        let config = SplitConfig {
            shuffle: false,
            ..Default::default()
        };
        let split = train_test_split(&samples(10), &config).unwrap();
        assert_eq!(split.train_indices, (0..7).collect::<Vec<_>>());
        assert_eq!(split.test_indices, vec![7, 8, 9]);
    }
}
