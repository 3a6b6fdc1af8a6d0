// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Random forest of bagged `linfa-trees` trees
//!
//! Each tree sees a bootstrap sample of the rows and, unless `max_features`
//! is `All`, a random subset of the columns. Linfa trees cannot sample columns
//! per split, so a subset is drawn once per tree and the ensemble becomes a
//! random-subspace one: with `Sqrt` on 11 sensors a tree sees 3 of them and
//! may miss every attacked reading. The default keeps all columns and lets
//! the bootstrap carry the randomness. Predictions are a majority vote, ties
//! counting as genuine.

use crate::classifier::{Classifier, FittedClassifier};
use crate::data::{check_records, check_training_set};
use crate::error::{ModelError, Result};
use crate::tree::TreeConfig;
use linfa::prelude::*;
use linfa_trees::DecisionTree;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Columns each tree may use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// Every column
    All,
    /// Square root of the column count
    Sqrt,
    /// Share of the column count, in (0, 1]
    Fraction(f64),
}

impl MaxFeatures {
    /// Number of columns out of `width`, at least one.
    pub fn count(self, width: usize) -> usize {
        let n = match self {
            Self::All => width,
            Self::Sqrt => (width as f64).sqrt().round() as usize,
            Self::Fraction(f) => (width as f64 * f).round() as usize,
        };
        n.clamp(1, width.max(1))
    }
}

/// Random forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees
    pub trees: usize,
    /// Settings of every tree
    pub tree: TreeConfig,
    /// Columns per tree, drawn once when the tree is grown
    pub max_features: MaxFeatures,
    /// Draw rows with replacement; off trains every tree on all rows
    pub bootstrap: bool,
    /// Seed of the bootstrap and column draws
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            trees: 300,
            tree: TreeConfig {
                max_depth: Some(30),
                ..Default::default()
            },
            max_features: MaxFeatures::All,
            bootstrap: true,
            seed: 7,
        }
    }
}

/// Unfitted random forest.
#[derive(Debug, Clone, Default)]
pub struct ForestClassifier {
    config: ForestConfig,
}

impl ForestClassifier {
    pub const NAME: &'static str = "random_forest";

    pub fn new(config: ForestConfig) -> Result<Self> {
        if config.trees == 0 {
            return Err(ModelError::config(Self::NAME, "trees must be positive"));
        }
        if let MaxFeatures::Fraction(f) = config.max_features {
            if !(f > 0.0 && f <= 1.0) {
                return Err(ModelError::config(
                    Self::NAME,
                    "max_features fraction must be in (0, 1]",
                ));
            }
        }
        config.tree.validate(Self::NAME)?;
        Ok(Self { config })
    }
}

impl Classifier for ForestClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(
        &self,
        records: ArrayView2<f64>,
        targets: ArrayView1<usize>,
    ) -> Result<Box<dyn FittedClassifier>> {
        check_training_set(records, targets)?;

        let rows = records.nrows();
        let width = records.ncols();
        let columns_per_tree = self.config.max_features.count(width);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut members = Vec::with_capacity(self.config.trees);

        for _ in 0..self.config.trees {
            let sample: Vec<usize> = if self.config.bootstrap {
                (0..rows).map(|_| rng.gen_range(0..rows)).collect()
            } else {
                (0..rows).collect()
            };
            let mut columns = index::sample(&mut rng, width, columns_per_tree).into_vec();
            columns.sort_unstable();

            let x = records.select(Axis(0), &sample).select(Axis(1), &columns);
            let y = targets.select(Axis(0), &sample);
            let tree = self
                .config
                .tree
                .grow(Self::NAME, &Dataset::new(x, y))?;
            members.push(Member { tree, columns });
        }

        debug!(
            "random_forest: {} trees, {} of {} columns each",
            members.len(),
            columns_per_tree,
            width
        );

        Ok(Box::new(FittedForest { members, width }))
    }
}

struct Member {
    tree: DecisionTree<f64, usize>,
    columns: Vec<usize>,
}

struct FittedForest {
    members: Vec<Member>,
    width: usize,
}

impl FittedClassifier for FittedForest {
    fn name(&self) -> &str {
        ForestClassifier::NAME
    }

    fn predict(&self, records: ArrayView2<f64>) -> Result<Array1<usize>> {
        check_records(records, self.width)?;
        let mut votes = vec![0usize; records.nrows()];
        for member in &self.members {
            let x = records.select(Axis(1), &member.columns);
            let predicted: Array1<usize> = member.tree.predict(&x);
            for (count, &class) in votes.iter_mut().zip(predicted.iter()) {
                *count += class;
            }
        }
        let trees = self.members.len();
        Ok(votes.into_iter().map(|v| majority(v, trees)).collect())
    }
}

/// Tampered only with a strict majority of tampered votes.
fn majority(votes: usize, trees: usize) -> usize {
    usize::from(votes * 2 > trees)
}
