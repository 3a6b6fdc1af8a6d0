// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Logistic regression backed by `linfa-logistic`

use crate::classifier::{Classifier, FittedClassifier};
use crate::data::{check_records, check_training_set};
use crate::error::{ModelError, Result};
use linfa::prelude::*;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Logistic regression hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticConfig {
    /// L2 penalty strength
    pub alpha: f64,
    /// L-BFGS iteration cap
    pub max_iterations: u64,
    /// Gradient norm at which the solver stops
    pub gradient_tolerance: f64,
    /// Fit an intercept term
    pub fit_intercept: bool,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            max_iterations: 100,
            gradient_tolerance: 1e-4,
            fit_intercept: true,
        }
    }
}

/// Unfitted logistic regression.
#[derive(Debug, Clone, Default)]
pub struct LogisticClassifier {
    config: LogisticConfig,
}

impl LogisticClassifier {
    pub const NAME: &'static str = "logistic_regression";

    pub fn new(config: LogisticConfig) -> Result<Self> {
        if !(config.alpha >= 0.0 && config.alpha.is_finite()) {
            return Err(ModelError::config(Self::NAME, "alpha must be non-negative"));
        }
        if config.max_iterations == 0 {
            return Err(ModelError::config(
                Self::NAME,
                "max_iterations must be positive",
            ));
        }
        Ok(Self { config })
    }
}

impl Classifier for LogisticClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(
        &self,
        records: ArrayView2<f64>,
        targets: ArrayView1<usize>,
    ) -> Result<Box<dyn FittedClassifier>> {
        check_training_set(records, targets)?;

        let dataset = Dataset::new(records.to_owned(), targets.to_owned());
        let model = LogisticRegression::default()
            .alpha(self.config.alpha)
            .max_iterations(self.config.max_iterations)
            .gradient_tolerance(self.config.gradient_tolerance)
            .with_intercept(self.config.fit_intercept)
            .fit(&dataset)
            .map_err(|e| ModelError::fit(Self::NAME, e))?;

        Ok(Box::new(FittedLogistic {
            model,
            width: records.ncols(),
        }))
    }
}

struct FittedLogistic {
    model: FittedLogisticRegression<f64, usize>,
    width: usize,
}

impl FittedClassifier for FittedLogistic {
    fn name(&self) -> &str {
        LogisticClassifier::NAME
    }

    fn predict(&self, records: ArrayView2<f64>) -> Result<Array1<usize>> {
        check_records(records, self.width)?;
        Ok(self.model.predict(&records))
    }
}
