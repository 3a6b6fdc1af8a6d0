// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Gradient boosted trees on logistic loss
//!
//! Second-order boosting: every round fits a regression tree to the
//! gradient and hessian of the log loss at the current margin, choosing
//! splits by the regularised gain
//!
//! ```text
//! gain = ½ [ G_L² / (H_L + λ) + G_R² / (H_R + λ) - G² / (H + λ) ] - γ
//! ```
//!
//! and leaf weights `-η G / (H + λ)`.

use crate::classifier::{Classifier, FittedClassifier};
use crate::data::{check_records, check_training_set};
use crate::error::{ModelError, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Boosting hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    /// Boosting rounds
    pub rounds: usize,
    /// Shrinkage applied to every leaf
    pub learning_rate: f64,
    /// Depth of each tree
    pub max_depth: usize,
    /// L2 penalty on leaf weights
    pub lambda: f64,
    /// Minimum gain for a split to be kept
    pub gamma: f64,
    /// Minimum hessian sum in a child
    pub min_child_weight: f64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            rounds: 100,
            learning_rate: 0.3,
            max_depth: 6,
            lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
        }
    }
}

/// Unfitted boosted ensemble.
#[derive(Debug, Clone, Default)]
pub struct BoostingClassifier {
    config: BoostingConfig,
}

impl BoostingClassifier {
    pub const NAME: &'static str = "gradient_boosting";

    pub fn new(config: BoostingConfig) -> Result<Self> {
        if config.rounds == 0 {
            return Err(ModelError::config(Self::NAME, "rounds must be positive"));
        }
        if !(config.learning_rate > 0.0 && config.learning_rate <= 1.0) {
            return Err(ModelError::config(
                Self::NAME,
                "learning_rate must be in (0, 1]",
            ));
        }
        if config.max_depth == 0 {
            return Err(ModelError::config(Self::NAME, "max_depth must be positive"));
        }
        if config.lambda < 0.0 || config.gamma < 0.0 || config.min_child_weight < 0.0 {
            return Err(ModelError::config(
                Self::NAME,
                "lambda, gamma and min_child_weight must be non-negative",
            ));
        }
        Ok(Self { config })
    }
}

impl Classifier for BoostingClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(
        &self,
        records: ArrayView2<f64>,
        targets: ArrayView1<usize>,
    ) -> Result<Box<dyn FittedClassifier>> {
        check_training_set(records, targets)?;

        let n = records.nrows();
        let y: Vec<f64> = targets.iter().map(|&t| t as f64).collect();
        let mut margin = vec![0.0; n];
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];
        let mut trees = Vec::with_capacity(self.config.rounds);

        // column-sorted row orders are shared by every round
        let sorted: Vec<Vec<usize>> = (0..records.ncols())
            .map(|j| {
                let mut order: Vec<usize> = (0..n).collect();
                order.sort_by(|&a, &b| records[[a, j]].total_cmp(&records[[b, j]]));
                order
            })
            .collect();

        for round in 0..self.config.rounds {
            for i in 0..n {
                let p = sigmoid(margin[i]);
                grad[i] = p - y[i];
                hess[i] = (p * (1.0 - p)).max(1e-16);
            }

            let mut builder = TreeBuilder {
                config: &self.config,
                records: records.view(),
                grad: &grad,
                hess: &hess,
                sorted: &sorted,
                nodes: Vec::new(),
            };
            let members = vec![true; n];
            builder.build(&members, 0);
            let tree = RegressionTree {
                nodes: builder.nodes,
            };

            for (i, row) in records.rows().into_iter().enumerate() {
                margin[i] += tree.score(row);
            }

            if round % 25 == 0 {
                let loss = log_loss(&margin, &y);
                debug!(
                    "gradient_boosting: round {} log loss {:.5}, {} nodes",
                    round,
                    loss,
                    tree.nodes.len()
                );
            }
            trees.push(tree);
        }

        Ok(Box::new(FittedBoosting {
            trees,
            width: records.ncols(),
        }))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn log_loss(margin: &[f64], y: &[f64]) -> f64 {
    let total: f64 = margin
        .iter()
        .zip(y)
        .map(|(&z, &t)| z.max(0.0) - z * t + (-z.abs()).exp().ln_1p())
        .sum();
    total / margin.len().max(1) as f64
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    fn score(&self, row: ArrayView1<f64>) -> f64 {
        let mut at = 0;
        loop {
            match self.nodes[at] {
                Node::Leaf(weight) => return weight,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => at = if row[feature] < threshold { left } else { right },
            }
        }
    }
}

struct TreeBuilder<'a, 'r> {
    config: &'a BoostingConfig,
    records: ArrayView2<'r, f64>,
    grad: &'a [f64],
    hess: &'a [f64],
    sorted: &'a [Vec<usize>],
    nodes: Vec<Node>,
}

struct BestSplit {
    gain: f64,
    feature: usize,
    threshold: f64,
}

impl TreeBuilder<'_, '_> {
    /// Grow the subtree over the rows flagged in `members`, returning its node index.
    fn build(&mut self, members: &[bool], depth: usize) -> usize {
        let (g, h) = members
            .iter()
            .enumerate()
            .filter(|&(_, &m)| m)
            .fold((0.0, 0.0), |(g, h), (i, _)| (g + self.grad[i], h + self.hess[i]));

        let at = self.nodes.len();
        self.nodes
            .push(Node::Leaf(-self.config.learning_rate * g / (h + self.config.lambda)));

        if depth >= self.config.max_depth {
            return at;
        }
        let Some(best) = self.best_split(members, g, h) else {
            return at;
        };

        let mut left_members = vec![false; members.len()];
        let mut right_members = vec![false; members.len()];
        for (i, _) in members.iter().enumerate().filter(|&(_, &m)| m) {
            if self.records[[i, best.feature]] < best.threshold {
                left_members[i] = true;
            } else {
                right_members[i] = true;
            }
        }

        let left = self.build(&left_members, depth + 1);
        let right = self.build(&right_members, depth + 1);
        self.nodes[at] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        at
    }

    fn best_split(&self, members: &[bool], g: f64, h: f64) -> Option<BestSplit> {
        let lambda = self.config.lambda;
        let parent = g * g / (h + lambda);
        let mut best: Option<BestSplit> = None;

        for (feature, order) in self.sorted.iter().enumerate() {
            let (mut gl, mut hl) = (0.0, 0.0);
            let mut previous: Option<usize> = None;

            for &i in order.iter().filter(|&&i| members[i]) {
                if let Some(p) = previous {
                    let (lo, hi) = (self.records[[p, feature]], self.records[[i, feature]]);
                    let (gr, hr) = (g - gl, h - hl);
                    if hi > lo
                        && hl >= self.config.min_child_weight
                        && hr >= self.config.min_child_weight
                    {
                        let gain = 0.5 * (gl * gl / (hl + lambda) + gr * gr / (hr + lambda) - parent)
                            - self.config.gamma;
                        if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                            best = Some(BestSplit {
                                gain,
                                feature,
                                threshold: lo + (hi - lo) / 2.0,
                            });
                        }
                    }
                }
                gl += self.grad[i];
                hl += self.hess[i];
                previous = Some(i);
            }
        }
        best
    }
}

struct FittedBoosting {
    trees: Vec<RegressionTree>,
    width: usize,
}

impl FittedBoosting {
    fn margin(&self, row: ArrayView1<f64>) -> f64 {
        self.trees.iter().map(|t| t.score(row)).sum()
    }
}

impl FittedClassifier for FittedBoosting {
    fn name(&self) -> &str {
        BoostingClassifier::NAME
    }

    fn predict(&self, records: ArrayView2<f64>) -> Result<Array1<usize>> {
        check_records(records, self.width)?;
        Ok(records
            .rows()
            .into_iter()
            .map(|row| usize::from(self.margin(row) > 0.0))
            .collect())
    }
}
