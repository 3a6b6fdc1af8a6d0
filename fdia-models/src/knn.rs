// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Brute-force k-nearest neighbours

use crate::classifier::{Classifier, FittedClassifier};
use crate::data::{check_records, check_training_set};
use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

/// k-NN hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnnConfig {
    /// Neighbours consulted per prediction
    pub k: usize,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self { k: 5 }
    }
}

/// Unfitted k-NN classifier.
#[derive(Debug, Clone, Default)]
pub struct KnnClassifier {
    config: KnnConfig,
}

impl KnnClassifier {
    pub const NAME: &'static str = "knn";

    pub fn new(config: KnnConfig) -> Result<Self> {
        if config.k == 0 {
            return Err(ModelError::config(Self::NAME, "k must be positive"));
        }
        Ok(Self { config })
    }
}

impl Classifier for KnnClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(
        &self,
        records: ArrayView2<f64>,
        targets: ArrayView1<usize>,
    ) -> Result<Box<dyn FittedClassifier>> {
        check_training_set(records, targets)?;
        Ok(Box::new(FittedKnn {
            k: self.config.k.min(records.nrows()),
            records: records.to_owned(),
            targets: targets.to_owned(),
        }))
    }
}

/// Memorised training set.
struct FittedKnn {
    k: usize,
    records: Array2<f64>,
    targets: Array1<usize>,
}

impl FittedKnn {
    fn vote(&self, query: ArrayView1<f64>) -> usize {
        let mut distances: Vec<(f64, usize)> = self
            .records
            .rows()
            .into_iter()
            .zip(self.targets.iter())
            .map(|(row, &target)| {
                let mut d = 0.0;
                Zip::from(&row).and(&query).for_each(|a, b| d += (a - b).powi(2));
                (d, target)
            })
            .collect();

        distances.select_nth_unstable_by(self.k - 1, |a, b| a.0.total_cmp(&b.0));
        let tampered = distances[..self.k].iter().filter(|(_, t)| *t == 1).count();
        // ties go to the class of the single closest neighbour
        match (tampered * 2).cmp(&self.k) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => 0,
            std::cmp::Ordering::Equal => {
                distances[..self.k]
                    .iter()
                    .min_by(|a, b| a.0.total_cmp(&b.0))
                    .map(|(_, t)| *t)
                    .unwrap_or(0)
            }
        }
    }
}

impl FittedClassifier for FittedKnn {
    fn name(&self) -> &str {
        KnnClassifier::NAME
    }

    fn predict(&self, records: ArrayView2<f64>) -> Result<Array1<usize>> {
        check_records(records, self.records.ncols())?;
        Ok(records.rows().into_iter().map(|row| self.vote(row)).collect())
    }
}
