// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Model bank: fit a set of classifiers on one training set and score them together

use crate::boosting::BoostingClassifier;
use crate::classifier::{Classifier, FittedClassifier};
use crate::cnn::{CnnClassifier, CnnConfig};
use crate::config::{BankConfig, ModelKind};
use crate::data::{check_training_set, records, targets};
use crate::error::{ModelError, Result};
use crate::forest::ForestClassifier;
use crate::knn::KnnClassifier;
use crate::logistic::LogisticClassifier;
use crate::svm::SvmClassifier;
use crate::tree::TreeClassifier;
use fdia::{percent, ConfusionMatrix, Samples};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::info;

/// Build the classifier configured for `kind`.
pub fn build(kind: ModelKind, config: &BankConfig) -> Result<Box<dyn Classifier>> {
    Ok(match kind {
        ModelKind::LogisticRegression => {
            Box::new(LogisticClassifier::new(config.logistic_regression.clone())?)
        }
        ModelKind::DecisionTree => Box::new(TreeClassifier::new(config.decision_tree.clone())?),
        ModelKind::Knn => Box::new(KnnClassifier::new(config.knn.clone())?),
        ModelKind::Svm => Box::new(SvmClassifier::new(config.svm.clone())?),
        ModelKind::RandomForest => Box::new(ForestClassifier::new(config.random_forest.clone())?),
        ModelKind::GradientBoosting => {
            Box::new(BoostingClassifier::new(config.gradient_boosting.clone())?)
        }
        ModelKind::Cnn1 => Box::new(CnnClassifier::new(
            kind.name(),
            config.cnn1.clone().or_layers_of(CnnConfig::cnn1()),
        )?),
        ModelKind::Cnn2 => Box::new(CnnClassifier::new(
            kind.name(),
            config.cnn2.clone().or_layers_of(CnnConfig::cnn2()),
        )?),
        ModelKind::Cnn3 => Box::new(CnnClassifier::new(
            kind.name(),
            config.cnn3.clone().or_layers_of(CnnConfig::cnn3()),
        )?),
    })
}

/// Unfitted classifiers, fitted and reported in insertion order.
#[derive(Default)]
pub struct ModelBank {
    classifiers: Vec<Box<dyn Classifier>>,
}

impl ModelBank {
    /// Empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bank of the models selected in `config`.
    pub fn from_config(config: &BankConfig) -> Result<Self> {
        let mut bank = Self::new();
        for &kind in &config.models {
            bank.add(build(kind, config)?)?;
        }
        Ok(bank)
    }

    /// Add a classifier; names must be unique.
    pub fn add(&mut self, classifier: Box<dyn Classifier>) -> Result<()> {
        if self.classifiers.iter().any(|c| c.name() == classifier.name()) {
            return Err(ModelError::config(classifier.name(), "listed twice"));
        }
        self.classifiers.push(classifier);
        Ok(())
    }

    /// Builder form of [`ModelBank::add`].
    pub fn with(mut self, classifier: Box<dyn Classifier>) -> Result<Self> {
        self.add(classifier)?;
        Ok(self)
    }

    pub fn names(&self) -> Vec<&str> {
        self.classifiers.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    /// Fit every classifier on `train`. The first failure aborts the fit.
    pub fn fit(&self, train: &Samples) -> Result<TrainedBank> {
        let x = records(train)?;
        let y = targets(train);
        check_training_set(x.view(), y.view())?;

        let mut models = Vec::with_capacity(self.classifiers.len());
        for classifier in &self.classifiers {
            let start = Instant::now();
            let model = classifier.fit(x.view(), y.view())?;
            let fit_time = start.elapsed();
            info!(
                "Fitted {} on {} rows in {:?}",
                classifier.name(),
                train.len(),
                fit_time
            );
            models.push(TrainedModel { model, fit_time });
        }
        Ok(TrainedBank { models })
    }
}

/// A fitted classifier and how long it took to train.
pub struct TrainedModel {
    pub model: Box<dyn FittedClassifier>,
    pub fit_time: Duration,
}

/// Fitted classifiers, keyed by name.
pub struct TrainedBank {
    models: Vec<TrainedModel>,
}

impl TrainedBank {
    pub fn get(&self, name: &str) -> Option<&dyn FittedClassifier> {
        self.models
            .iter()
            .find(|m| m.model.name() == name)
            .map(|m| m.model.as_ref())
    }

    pub fn models(&self) -> &[TrainedModel] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Score every model on `test`.
    pub fn evaluate(&self, test: &Samples) -> Result<BankReport> {
        let x = records(test)?;
        let y = targets(test);

        let mut scores = Vec::with_capacity(self.models.len());
        for trained in &self.models {
            let model = trained.model.as_ref();
            let evaluation = model.evaluate(x.view(), y.view())?;
            scores.push(ModelScore {
                name: model.name().to_string(),
                accuracy: evaluation.accuracy,
                percent: percent(evaluation.accuracy),
                loss: evaluation.loss,
                confusion: evaluation.confusion,
                fit_ms: trained.fit_time.as_millis() as u64,
                epochs: model.history().map(|h| h.len()),
            });
        }
        Ok(BankReport {
            rows: test.len(),
            scores,
        })
    }
}

/// Score of one model in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub name: String,
    /// Fraction of exact label matches
    pub accuracy: f64,
    /// Accuracy rounded to a whole percentage
    pub percent: u32,
    pub loss: Option<f64>,
    pub confusion: ConfusionMatrix,
    /// Training time in milliseconds
    pub fit_ms: u64,
    /// Epochs trained, for networks
    pub epochs: Option<usize>,
}

impl ModelScore {
    /// Console label: the stock label for bank models, the name otherwise.
    pub fn label(&self) -> &str {
        ModelKind::from_name(&self.name)
            .map(ModelKind::label)
            .unwrap_or(self.name.as_str())
    }
}

/// Scores of every model on one labeled set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankReport {
    /// Rows scored
    pub rows: usize,
    /// One entry per model, in bank order
    pub scores: Vec<ModelScore>,
}

impl BankReport {
    pub fn get(&self, name: &str) -> Option<&ModelScore> {
        self.scores.iter().find(|s| s.name == name)
    }

    /// Highest-accuracy model; the earliest wins ties.
    pub fn best(&self) -> Option<&ModelScore> {
        self.scores.iter().fold(None, |best: Option<&ModelScore>, s| match best {
            Some(b) if b.accuracy >= s.accuracy => Some(b),
            _ => Some(s),
        })
    }

    /// `Accuracy of <model>: NN%` lines.
    pub fn lines(&self) -> Vec<String> {
        self.scores
            .iter()
            .map(|s| format!("Accuracy of {}: {}%", s.label(), s.percent))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdia::Label;

    fn separable(n: usize) -> Samples {
        let mut samples = Samples::new();
        for i in 0..n {
            let tampered = i % 2 == 1;
            let base = if tampered { 2.0 } else { 8.0 };
            let features = (0..4).map(|j| base + ((i + j) % 3) as f64 * 0.1).collect();
            samples.push(features, Label::from(tampered));
        }
        samples
    }

    #[test]
    fn test_fit_and_evaluate_selected_models() {
        let config = BankConfig::default().with_models([ModelKind::Knn, ModelKind::DecisionTree]);
        let bank = ModelBank::from_config(&config).unwrap();
        assert_eq!(bank.names(), vec!["knn", "decision_tree"]);

        let trained = bank.fit(&separable(40)).unwrap();
        assert_eq!(trained.len(), 2);
        assert!(trained.get("knn").is_some());
        assert!(trained.get("svm").is_none());

        let report = trained.evaluate(&separable(20)).unwrap();
        assert_eq!(report.rows, 20);
        assert_eq!(report.scores.len(), 2);
        assert_eq!(report.get("knn").unwrap().percent, 100);
        assert_eq!(
            report.lines(),
            vec!["Accuracy of KNN: 100%", "Accuracy of Decision Tree: 100%"]
        );
    }

    #[test]
    fn test_single_class_training_set_is_rejected() {
        let mut samples = Samples::new();
        for i in 0..10 {
            samples.push(vec![i as f64; 3], Label::Genuine);
        }
        let bank = ModelBank::new()
            .with(Box::new(KnnClassifier::default()))
            .unwrap();
        assert!(matches!(
            bank.fit(&samples),
            Err(ModelError::DegenerateLabels { class: 0 })
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let bank = ModelBank::new()
            .with(Box::new(KnnClassifier::default()))
            .unwrap();
        assert!(bank.with(Box::new(KnnClassifier::default())).is_err());
    }

    #[test]
    fn test_best_prefers_earliest_on_tie() {
        let score = |name: &str, accuracy: f64| ModelScore {
            name: name.to_string(),
            accuracy,
            percent: percent(accuracy),
            loss: None,
            confusion: ConfusionMatrix::default(),
            fit_ms: 0,
            epochs: None,
        };
        let report = BankReport {
            rows: 10,
            scores: vec![score("a", 0.9), score("b", 0.95), score("c", 0.95)],
        };
        assert_eq!(report.best().unwrap().name, "b");
        assert_eq!(report.get("c").unwrap().label(), "c");
        assert!(BankReport::default().best().is_none());
    }
}
