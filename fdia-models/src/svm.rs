// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Support vector machine backed by `linfa-svm`
//!
//! Gaussian kernel scaled from the training data: the kernel width is the
//! feature count times the overall variance of the records, the same scale
//! as the usual `gamma = 1 / (n_features * var)` rule. The SMO solver keeps a
//! dense kernel matrix, so training can be capped to a seeded subsample.

use crate::classifier::{Classifier, FittedClassifier};
use crate::data::{check_records, check_training_set, overall_variance};
use crate::error::{ModelError, Result};
use linfa::prelude::*;
use linfa_svm::Svm;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// SVM hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmConfig {
    /// Soft-margin penalty
    pub c: f64,
    /// Fixed kernel width, `None` derives it from the data
    pub kernel_width: Option<f64>,
    /// Solver tolerance
    pub tolerance: f64,
    /// Largest number of training rows, `None` for no cap
    pub max_training_rows: Option<usize>,
    /// Seed of the training subsample
    pub seed: u64,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel_width: None,
            tolerance: 1e-3,
            max_training_rows: Some(3000),
            seed: 11,
        }
    }
}

/// Unfitted SVM.
#[derive(Debug, Clone, Default)]
pub struct SvmClassifier {
    config: SvmConfig,
}

impl SvmClassifier {
    pub const NAME: &'static str = "svm";

    pub fn new(config: SvmConfig) -> Result<Self> {
        if !(config.c > 0.0 && config.c.is_finite()) {
            return Err(ModelError::config(Self::NAME, "c must be positive"));
        }
        if let Some(width) = config.kernel_width {
            if !(width > 0.0 && width.is_finite()) {
                return Err(ModelError::config(Self::NAME, "kernel_width must be positive"));
            }
        }
        if config.max_training_rows.map_or(false, |cap| cap < 2) {
            return Err(ModelError::config(
                Self::NAME,
                "max_training_rows must allow both classes",
            ));
        }
        Ok(Self { config })
    }

    fn kernel_width(&self, records: ArrayView2<f64>) -> f64 {
        if let Some(width) = self.config.kernel_width {
            return width;
        }
        let width = records.ncols() as f64 * overall_variance(records);
        if width > f64::EPSILON {
            width
        } else {
            1.0
        }
    }
}

impl Classifier for SvmClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(
        &self,
        records: ArrayView2<f64>,
        targets: ArrayView1<usize>,
    ) -> Result<Box<dyn FittedClassifier>> {
        check_training_set(records, targets)?;

        let rows = match self.config.max_training_rows {
            Some(cap) if cap < records.nrows() => {
                let mut rng = StdRng::seed_from_u64(self.config.seed);
                let mut picked = index::sample(&mut rng, records.nrows(), cap).into_vec();
                picked.sort_unstable();
                debug!(
                    "svm: training on {} of {} rows",
                    picked.len(),
                    records.nrows()
                );
                picked
            }
            _ => (0..records.nrows()).collect(),
        };

        let x = records.select(Axis(0), &rows);
        let y: Array1<bool> = rows.iter().map(|&i| targets[i] == 1).collect();
        // a subsample can still lose a class
        check_training_set(x.view(), y.mapv(usize::from).view())?;

        let width = self.kernel_width(x.view());
        let dataset = Dataset::new(x, y);
        let model = Svm::<f64, bool>::params()
            .pos_neg_weights(self.config.c, self.config.c)
            .gaussian_kernel(width)
            .eps(self.config.tolerance)
            .fit(&dataset)
            .map_err(|e| ModelError::fit(Self::NAME, e))?;

        debug!(
            "svm: kernel width {:.4}, {} support vectors",
            width,
            model.nsupport()
        );

        Ok(Box::new(FittedSvm {
            model,
            width: records.ncols(),
        }))
    }
}

struct FittedSvm {
    model: Svm<f64, bool>,
    width: usize,
}

impl FittedClassifier for FittedSvm {
    fn name(&self) -> &str {
        SvmClassifier::NAME
    }

    fn predict(&self, records: ArrayView2<f64>) -> Result<Array1<usize>> {
        check_records(records, self.width)?;
        let flags: Array1<bool> = self.model.predict(&records);
        Ok(flags.mapv(usize::from))
    }
}
