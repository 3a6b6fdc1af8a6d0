// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # FDIA Models
//!
//! Classifiers that tell genuine sensor rows from tampered ones, trained
//! and scored through one uniform contract.
//!
//! ## Models
//!
//! | Name | Backend |
//! |------|---------|
//! | `logistic_regression` | `linfa-logistic` |
//! | `decision_tree` | `linfa-trees` |
//! | `knn` | brute force, k = 5 |
//! | `svm` | `linfa-svm`, Gaussian kernel |
//! | `random_forest` | bagged `linfa-trees` |
//! | `gradient_boosting` | second-order boosted trees |
//! | `cnn1`, `cnn2`, `cnn3` | 1-D convolutional networks on `burn` |
//!
//! ## Example
//!
//! ```rust
//! use fdia::{Label, Samples};
//! use fdia_models::{BankConfig, ModelBank, ModelKind};
//!
//! let mut train = Samples::new();
//! for i in 0..40 {
//!     let tampered = i % 2 == 1;
//!     let level = if tampered { 9.0 } else { 10.0 };
//!     train.push(vec![level + (i % 3) as f64 * 0.01; 11], Label::from(tampered));
//! }
//!
//! let config = BankConfig::default().with_models([ModelKind::Knn, ModelKind::DecisionTree]);
//! let bank = ModelBank::from_config(&config).unwrap();
//! let trained = bank.fit(&train).unwrap();
//! let report = trained.evaluate(&train).unwrap();
//!
//! for line in report.lines() {
//!     println!("{}", line);
//! }
//! assert_eq!(report.get("knn").unwrap().percent, 100);
//! ```

pub mod bank;
pub mod boosting;
pub mod classifier;
pub mod cnn;
pub mod config;
pub mod data;
pub mod error;
pub mod forest;
pub mod knn;
pub mod logistic;
pub mod svm;
pub mod tree;

pub use bank::{BankReport, ModelBank, ModelScore, TrainedBank, TrainedModel};
pub use boosting::{BoostingClassifier, BoostingConfig};
pub use classifier::{Classifier, EpochStats, Evaluation, FittedClassifier, TrainingHistory};
pub use cnn::{CnnClassifier, CnnConfig, LayerSpec, Padding};
pub use config::{BankConfig, ModelKind};
pub use error::{ModelError, Result};
pub use forest::{ForestClassifier, ForestConfig, MaxFeatures};
pub use knn::{KnnClassifier, KnnConfig};
pub use logistic::{LogisticClassifier, LogisticConfig};
pub use svm::{SvmClassifier, SvmConfig};
pub use tree::{TreeClassifier, TreeConfig};
