// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Uniform classifier contract
//!
//! Every detector is split in two halves: an unfitted [`Classifier`] that
//! holds hyperparameters, and the [`FittedClassifier`] it produces. The bank
//! only ever talks to these two traits.

use crate::error::Result;
use fdia::{accuracy, ConfusionMatrix};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// An untrained model and its hyperparameters.
pub trait Classifier {
    /// Name the model is reported under.
    fn name(&self) -> &str;

    /// Train on `records` (one row per example) and binary `targets`.
    fn fit(
        &self,
        records: ArrayView2<f64>,
        targets: ArrayView1<usize>,
    ) -> Result<Box<dyn FittedClassifier>>;
}

/// A trained model.
pub trait FittedClassifier {
    /// Name the model is reported under.
    fn name(&self) -> &str;

    /// Predicted class (0 or 1) for every row.
    fn predict(&self, records: ArrayView2<f64>) -> Result<Array1<usize>>;

    /// Accuracy of the predictions against `targets`.
    fn evaluate(&self, records: ArrayView2<f64>, targets: ArrayView1<usize>) -> Result<Evaluation> {
        let predicted = self.predict(records)?;
        Evaluation::from_predictions(targets, predicted.view())
    }

    /// Per-epoch history, for models trained by gradient descent.
    fn history(&self) -> Option<&TrainingHistory> {
        None
    }
}

/// Statistics of one training epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number
    pub epoch: usize,
    /// Mean training loss
    pub loss: f64,
    /// Training accuracy
    pub accuracy: f64,
    /// Loss on the held-back validation rows
    pub validation_loss: Option<f64>,
    /// Accuracy on the held-back validation rows
    pub validation_accuracy: Option<f64>,
}

/// Epoch-by-epoch record of a training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochStats>,
    /// Training stopped before the configured epoch count
    pub stopped_early: bool,
}

impl TrainingHistory {
    /// Stats of the last completed epoch.
    pub fn last(&self) -> Option<&EpochStats> {
        self.epochs.last()
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }
}

/// Score of one model on one labeled set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Fraction of exact label matches
    pub accuracy: f64,
    /// Mean binary cross-entropy, for models that output probabilities
    pub loss: Option<f64>,
    /// Per-class tallies
    pub confusion: ConfusionMatrix,
}

impl Evaluation {
    /// Score hard predictions.
    pub fn from_predictions(truth: ArrayView1<usize>, predicted: ArrayView1<usize>) -> Result<Self> {
        let truth = truth.to_vec();
        let predicted = predicted.to_vec();
        Ok(Self {
            accuracy: accuracy(&truth, &predicted)?,
            loss: None,
            confusion: ConfusionMatrix::from_values(&truth, &predicted)?,
        })
    }

    /// Attach a loss value.
    pub fn with_loss(mut self, loss: f64) -> Self {
        self.loss = Some(loss);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    struct Constant(usize);

    impl FittedClassifier for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn predict(&self, records: ArrayView2<f64>) -> Result<Array1<usize>> {
            Ok(Array1::from_elem(records.nrows(), self.0))
        }
    }

    #[test]
    fn test_default_evaluate() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![1, 1, 1, 0];

        let eval = Constant(1).evaluate(x.view(), y.view()).unwrap();
        assert_relative_eq!(eval.accuracy, 0.75);
        assert_eq!(eval.loss, None);
        assert_eq!(eval.confusion.false_positives, 1);
        assert!(Constant(1).history().is_none());
    }

    #[test]
    fn test_evaluate_length_mismatch() {
        let x = array![[0.0], [1.0]];
        let y = array![1];
        assert!(Constant(0).evaluate(x.view(), y.view()).is_err());
    }
}
