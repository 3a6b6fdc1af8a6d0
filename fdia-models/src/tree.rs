// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! CART decision tree backed by `linfa-trees`

use crate::classifier::{Classifier, FittedClassifier};
use crate::data::{check_records, check_training_set};
use crate::error::{ModelError, Result};
use linfa::prelude::*;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, ArrayView1, ArrayView2, Ix1};
use serde::{Deserialize, Serialize};

/// Decision tree hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Depth limit, `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    /// Minimum weight of a node to be split
    pub min_weight_split: f32,
    /// Minimum weight of a leaf
    pub min_weight_leaf: f32,
    /// Use entropy instead of Gini impurity
    pub entropy: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_weight_split: 2.0,
            min_weight_leaf: 1.0,
            entropy: false,
        }
    }
}

impl TreeConfig {
    pub(crate) fn validate(&self, model: &str) -> Result<()> {
        if self.max_depth == Some(0) {
            return Err(ModelError::config(model, "max_depth must be positive"));
        }
        if !(self.min_weight_leaf >= 0.0 && self.min_weight_split >= self.min_weight_leaf) {
            return Err(ModelError::config(
                model,
                "min_weight_split must be at least min_weight_leaf",
            ));
        }
        Ok(())
    }

    /// Grow one tree on an owned dataset.
    pub(crate) fn grow(
        &self,
        model: &str,
        dataset: &Dataset<f64, usize, Ix1>,
    ) -> Result<DecisionTree<f64, usize>> {
        let quality = if self.entropy {
            SplitQuality::Entropy
        } else {
            SplitQuality::Gini
        };
        DecisionTree::params()
            .split_quality(quality)
            .max_depth(self.max_depth)
            .min_weight_split(self.min_weight_split)
            .min_weight_leaf(self.min_weight_leaf)
            .fit(dataset)
            .map_err(|e| ModelError::fit(model, e))
    }
}

/// Unfitted decision tree.
#[derive(Debug, Clone, Default)]
pub struct TreeClassifier {
    config: TreeConfig,
}

impl TreeClassifier {
    pub const NAME: &'static str = "decision_tree";

    pub fn new(config: TreeConfig) -> Result<Self> {
        config.validate(Self::NAME)?;
        Ok(Self { config })
    }
}

impl Classifier for TreeClassifier {
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
        let tree = self.config.grow(Self::NAME, &dataset)?;
        Ok(Box::new(FittedTree {
            tree,
            width: records.ncols(),
        }))
    }
}

struct FittedTree {
    tree: DecisionTree<f64, usize>,
    width: usize,
}

impl FittedClassifier for FittedTree {
    fn name(&self) -> &str {
        TreeClassifier::NAME
    }

    fn predict(&self, records: ArrayView2<f64>) -> Result<Array1<usize>> {
        check_records(records, self.width)?;
        Ok(self.tree.predict(&records))
    }
}
