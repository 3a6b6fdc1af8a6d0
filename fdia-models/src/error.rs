// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for the classifier bank

use thiserror::Error;

/// Model bank errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// No examples to train or score on
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Records and targets disagree on the number of examples
    #[error("Length mismatch: {records} records, {targets} targets")]
    LengthMismatch { records: usize, targets: usize },

    /// Feature width differs from what the model was trained on
    #[error("Feature width mismatch: expected {expected}, got {actual}")]
    FeatureWidth { expected: usize, actual: usize },

    /// NaN or infinite feature value
    #[error("Non-finite feature at row {row}, column {column}")]
    NonFinite { row: usize, column: usize },

    /// Target outside {0, 1}
    #[error("Invalid target {value} at row {row}")]
    InvalidTarget { row: usize, value: usize },

    /// Training targets contain a single class
    #[error("Training labels contain a single class ({class}); both classes are required")]
    DegenerateLabels { class: usize },

    /// Hyperparameters out of range
    #[error("Invalid configuration for {model}: {reason}")]
    InvalidConfig { model: String, reason: String },

    /// The underlying fitting routine failed
    #[error("Fitting {model} failed: {reason}")]
    Fit { model: String, reason: String },

    /// Model name not known to the bank
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// Scoring failure
    #[error("Metrics error: {0}")]
    Metrics(#[from] fdia::MetricsError),
}

impl ModelError {
    /// Shorthand for a configuration error of `model`.
    pub fn config(model: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            model: model.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a fitting error of `model`.
    pub fn fit(model: &str, reason: impl ToString) -> Self {
        Self::Fit {
            model: model.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for model bank operations
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::DegenerateLabels { class: 1 };
        assert!(err.to_string().contains("single class (1)"));

        let err = ModelError::config("knn", "k must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for knn: k must be positive"
        );

        let err = ModelError::fit("svm", "solver diverged");
        assert!(err.to_string().contains("svm"));
    }

    #[test]
    fn test_metrics_conversion() {
        let err: ModelError = fdia::MetricsError::Empty.into();
        assert!(matches!(err, ModelError::Metrics(_)));
    }
}
