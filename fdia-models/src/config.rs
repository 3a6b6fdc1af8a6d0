// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Bank configuration

use crate::boosting::BoostingConfig;
use crate::cnn::CnnConfig;
use crate::error::{ModelError, Result};
use crate::forest::ForestConfig;
use crate::knn::KnnConfig;
use crate::logistic::LogisticConfig;
use crate::svm::SvmConfig;
use crate::tree::TreeConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Models the bank knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LogisticRegression,
    DecisionTree,
    Knn,
    Svm,
    RandomForest,
    GradientBoosting,
    Cnn1,
    Cnn2,
    Cnn3,
}

impl ModelKind {
    /// Every model, in reporting order.
    pub const ALL: [ModelKind; 9] = [
        Self::LogisticRegression,
        Self::DecisionTree,
        Self::Knn,
        Self::Svm,
        Self::RandomForest,
        Self::GradientBoosting,
        Self::Cnn1,
        Self::Cnn2,
        Self::Cnn3,
    ];

    /// Identifier used in configs and reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::LogisticRegression => "logistic_regression",
            Self::DecisionTree => "decision_tree",
            Self::Knn => "knn",
            Self::Svm => "svm",
            Self::RandomForest => "random_forest",
            Self::GradientBoosting => "gradient_boosting",
            Self::Cnn1 => "cnn1",
            Self::Cnn2 => "cnn2",
            Self::Cnn3 => "cnn3",
        }
    }

    /// Human-readable label for console output.
    pub fn label(self) -> &'static str {
        match self {
            Self::LogisticRegression => "Logistic Regression",
            Self::DecisionTree => "Decision Tree",
            Self::Knn => "KNN",
            Self::Svm => "SVM",
            Self::RandomForest => "Random Forest",
            Self::GradientBoosting => "Gradient Boosting",
            Self::Cnn1 => "CNN1",
            Self::Cnn2 => "CNN2",
            Self::Cnn3 => "CNN3",
        }
    }

    /// Kind reported under `name`, if any.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s.trim()).ok_or_else(|| ModelError::UnknownModel(s.to_string()))
    }
}

/// Which models run and their hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankConfig {
    /// Models to fit, in reporting order
    pub models: Vec<ModelKind>,
    pub logistic_regression: LogisticConfig,
    pub decision_tree: TreeConfig,
    pub knn: KnnConfig,
    pub svm: SvmConfig,
    pub random_forest: ForestConfig,
    pub gradient_boosting: BoostingConfig,
    pub cnn1: CnnConfig,
    pub cnn2: CnnConfig,
    pub cnn3: CnnConfig,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            models: ModelKind::ALL.to_vec(),
            logistic_regression: LogisticConfig::default(),
            decision_tree: TreeConfig::default(),
            knn: KnnConfig::default(),
            svm: SvmConfig::default(),
            random_forest: ForestConfig::default(),
            gradient_boosting: BoostingConfig::default(),
            cnn1: CnnConfig::cnn1(),
            cnn2: CnnConfig::cnn2(),
            cnn3: CnnConfig::cnn3(),
        }
    }
}

impl BankConfig {
    /// Keep only `models`, in the given order.
    pub fn with_models(mut self, models: impl IntoIterator<Item = ModelKind>) -> Self {
        self.models = models.into_iter().collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.name().parse::<ModelKind>().unwrap(), kind);
            assert_eq!(
                serde_json::to_string(&kind).unwrap(),
                format!("\"{}\"", kind.name())
            );
        }
        assert!(matches!(
            "perceptron".parse::<ModelKind>(),
            Err(ModelError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_default_runs_everything() {
        let config = BankConfig::default();
        assert_eq!(config.models.len(), 9);
        assert_eq!(config.knn.k, 5);
        assert_eq!(config.random_forest.trees, 300);
        assert_eq!(config.cnn1.epochs, 25);
    }

    #[test]
    fn test_partial_json() {
        let config: BankConfig =
            serde_json::from_str(r#"{"models": ["knn", "decision_tree"], "knn": {"k": 3}}"#)
                .unwrap();
        assert_eq!(
            config.models,
            vec![ModelKind::Knn, ModelKind::DecisionTree]
        );
        assert_eq!(config.knn.k, 3);
        assert_eq!(config.gradient_boosting, BoostingConfig::default());
    }
}
