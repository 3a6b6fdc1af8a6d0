// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! 1-D convolutional detectors on burn
//!
//! Each feature vector is read as a single-channel sequence, one step per
//! sensor. Networks end in one logit and are trained with Adam on binary
//! cross-entropy over shuffled mini-batches; the tail of the training rows is
//! held back for validation. Training runs on `Autodiff<NdArray>`, prediction
//! on the plain `NdArray` backend, where dropout is off and batch norm uses
//! its running statistics.
//!
//! Three stock architectures are provided:
//!
//! | Preset | Layers |
//! |--------|--------|
//! | `cnn1` | conv 100/200/100/50/100, batch norm, LeakyReLU, dropout, dense 100 |
//! | `cnn2` | conv 100/50, batch norm, LeakyReLU, dropout, dense 100 |
//! | `cnn3` | conv 16/32, dropout, dense 20 |

mod batch;
mod layers;
mod network;

pub use layers::{LayerSpec, Padding};

use crate::classifier::{Classifier, EpochStats, Evaluation, FittedClassifier, TrainingHistory};
use crate::data::{check_records, check_training_set, Standardizer};
use crate::error::{ModelError, Result};
use batch::{ReadingBatcher, ReadingItem};
use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use burn::data::dataloader::batcher::Batcher;
use burn::module::AutodiffModule;
use burn::nn::loss::BinaryCrossEntropyLossConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::ElementConversion;
use layers::{Plan, Step};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};
use network::Net;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

type TrainBackend = Autodiff<NdArray>;

/// Rows per forward pass when predicting.
const INFERENCE_ROWS: usize = 500;

/// The NdArray random source is process-wide; fits hold this while seeded.
static BACKEND_SEED: Mutex<()> = Mutex::new(());

/// Network description and training schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CnnConfig {
    /// Hidden layers; the one-unit sigmoid head is appended. Left empty in a
    /// bank config, the slot's stock architecture is used.
    pub layers: Vec<LayerSpec>,
    /// Passes over the training rows
    pub epochs: usize,
    /// Rows per optimiser step
    pub batch_size: usize,
    /// Adam step size
    pub learning_rate: f64,
    /// Share of rows held back for validation, taken from the tail
    pub validation_split: f64,
    /// Stop after this many epochs without a better training accuracy
    pub early_stopping_patience: Option<usize>,
    /// Standardise every sensor column before training
    pub standardize: bool,
    /// Seed of initialisation, shuffling and dropout
    pub seed: u64,
}

impl Default for CnnConfig {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            epochs: 25,
            batch_size: 500,
            learning_rate: 0.001,
            validation_split: 0.2,
            early_stopping_patience: None,
            standardize: true,
            seed: 42,
        }
    }
}

impl CnnConfig {
    fn with_layers(layers: Vec<LayerSpec>, seed: u64) -> Self {
        Self {
            layers,
            seed,
            ..Default::default()
        }
    }

    /// Fill in `preset`'s layers when none are given.
    pub fn or_layers_of(mut self, preset: CnnConfig) -> Self {
        if self.layers.is_empty() {
            self.layers = preset.layers;
        }
        self
    }

    /// Five-convolution network.
    pub fn cnn1() -> Self {
        Self::with_layers(
            vec![
                conv(100, 3, Padding::Valid),
                LayerSpec::Relu,
                conv(200, 3, Padding::Same),
                LayerSpec::Relu,
                LayerSpec::BatchNorm,
                LayerSpec::LeakyRelu { alpha: 0.3 },
                LayerSpec::Dropout { rate: 0.5 },
                conv(100, 3, Padding::Valid),
                LayerSpec::Relu,
                LayerSpec::Dropout { rate: 0.5 },
                conv(50, 3, Padding::Same),
                LayerSpec::Relu,
                LayerSpec::Dropout { rate: 0.5 },
                conv(100, 3, Padding::Valid),
                LayerSpec::Relu,
                LayerSpec::Flatten,
                LayerSpec::Dense { units: 100 },
                LayerSpec::Relu,
            ],
            101,
        )
    }

    /// Two-convolution network.
    pub fn cnn2() -> Self {
        Self::with_layers(
            vec![
                conv(100, 3, Padding::Valid),
                LayerSpec::Relu,
                LayerSpec::Dropout { rate: 0.5 },
                LayerSpec::BatchNorm,
                LayerSpec::LeakyRelu { alpha: 0.3 },
                conv(50, 3, Padding::Same),
                LayerSpec::Relu,
                LayerSpec::Dropout { rate: 0.5 },
                LayerSpec::Flatten,
                LayerSpec::Dense { units: 100 },
                LayerSpec::Relu,
            ],
            102,
        )
    }

    /// Small two-convolution network.
    pub fn cnn3() -> Self {
        Self::with_layers(
            vec![
                conv(16, 2, Padding::Valid),
                LayerSpec::Relu,
                LayerSpec::Dropout { rate: 0.5 },
                conv(32, 2, Padding::Valid),
                LayerSpec::Relu,
                LayerSpec::Flatten,
                LayerSpec::Dense { units: 20 },
                LayerSpec::Relu,
            ],
            103,
        )
    }

    fn validate(&self, model: &str) -> Result<()> {
        if self.epochs == 0 {
            return Err(ModelError::config(model, "epochs must be positive"));
        }
        if self.batch_size == 0 {
            return Err(ModelError::config(model, "batch_size must be positive"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ModelError::config(model, "learning_rate must be positive"));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(ModelError::config(
                model,
                "validation_split must be in [0, 1)",
            ));
        }
        if self.early_stopping_patience == Some(0) {
            return Err(ModelError::config(
                model,
                "early_stopping_patience must be positive",
            ));
        }
        Ok(())
    }
}

fn conv(filters: usize, kernel_size: usize, padding: Padding) -> LayerSpec {
    LayerSpec::Conv1d {
        filters,
        kernel_size,
        padding,
    }
}

/// Binary cross-entropy of a logit, stable for large magnitudes.
fn cross_entropy(logit: f64, target: f64) -> f64 {
    logit.max(0.0) - logit * target + (-logit.abs()).exp().ln_1p()
}

fn plan_mismatch(model: &str) -> ModelError {
    ModelError::fit(model, "layer plan does not match the network")
}

/// Logits of `net` for every row, in chunks of [`INFERENCE_ROWS`].
fn logits<B: Backend>(
    model: &str,
    net: &Net<B>,
    steps: &[Step],
    records: ArrayView2<f64>,
    device: &B::Device,
) -> Result<Vec<f64>> {
    let batcher = ReadingBatcher::<B>::new(device.clone());
    let items = ReadingItem::unlabeled(records);
    let mut out = Vec::with_capacity(items.len());
    for chunk in items.chunks(INFERENCE_ROWS) {
        let batch = batcher.batch(chunk.to_vec());
        let logits = net
            .forward(steps, batch.readings)
            .ok_or_else(|| plan_mismatch(model))?;
        out.extend(logits.into_data().iter::<f32>().map(f64::from));
    }
    Ok(out)
}

/// Mean loss and accuracy of a set of logits.
fn score(logits: &[f64], targets: ArrayView1<usize>) -> (f64, f64) {
    let mut loss = 0.0;
    let mut hits = 0usize;
    for (&logit, &target) in logits.iter().zip(targets) {
        loss += cross_entropy(logit, target as f64);
        hits += usize::from((logit > 0.0) == (target == 1));
    }
    let n = targets.len().max(1) as f64;
    (loss / n, hits as f64 / n)
}

/// Unfitted convolutional detector.
#[derive(Debug, Clone)]
pub struct CnnClassifier {
    name: String,
    config: CnnConfig,
}

impl CnnClassifier {
    pub fn new(name: impl Into<String>, config: CnnConfig) -> Result<Self> {
        let name = name.into();
        config.validate(&name)?;
        Ok(Self { name, config })
    }

    pub fn config(&self) -> &CnnConfig {
        &self.config
    }
}

impl Classifier for CnnClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(
        &self,
        records: ArrayView2<f64>,
        targets: ArrayView1<usize>,
    ) -> Result<Box<dyn FittedClassifier>> {
        check_training_set(records, targets)?;
        let config = &self.config;
        let plan = Plan::new(&self.name, &config.layers, records.ncols())?;

        let standardizer = config.standardize.then(|| Standardizer::fit(records));
        let x = match &standardizer {
            Some(s) => s.transform(records),
            None => records.to_owned(),
        };

        let rows = x.nrows();
        let train_rows = (rows as f64 * (1.0 - config.validation_split)) as usize;
        if train_rows == 0 {
            return Err(ModelError::config(
                &self.name,
                format!("validation_split leaves no training rows out of {}", rows),
            ));
        }
        let validation = (train_rows < rows).then(|| {
            (
                x.slice(s![train_rows.., ..]),
                targets.slice(s![train_rows..]),
            )
        });

        let device = NdArrayDevice::Cpu;
        let _seeded = BACKEND_SEED.lock().unwrap_or_else(PoisonError::into_inner);
        TrainBackend::seed(config.seed);

        let mut model = Net::<TrainBackend>::new(&plan, &device);
        let mut optim = AdamConfig::new()
            .with_epsilon(1e-7)
            .init::<TrainBackend, Net<TrainBackend>>();
        let loss_fn = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init::<TrainBackend>(&device);
        let batcher = ReadingBatcher::<TrainBackend>::new(device);

        let items = ReadingItem::labeled(
            x.slice(s![..train_rows, ..]),
            targets.slice(s![..train_rows]),
        );
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut order: Vec<usize> = (0..train_rows).collect();
        let mut history = TrainingHistory::default();
        let (mut best, mut stale) = (f64::NEG_INFINITY, 0usize);

        debug!(
            "{}: {} parameters, {} training rows, {} validation rows",
            self.name,
            model.num_params(),
            train_rows,
            rows - train_rows
        );

        for epoch in 1..=config.epochs {
            order.shuffle(&mut rng);
            let mut loss = 0.0;
            let mut hits = 0usize;

            for chunk in order.chunks(config.batch_size) {
                let batch = batcher.batch(chunk.iter().map(|&i| items[i].clone()).collect());
                let logits = model
                    .forward(&plan.steps, batch.readings)
                    .ok_or_else(|| plan_mismatch(&self.name))?;

                let values: Vec<f32> = logits.clone().into_data().iter::<f32>().collect();
                hits += values
                    .iter()
                    .zip(chunk)
                    .filter(|&(&logit, &i)| (logit > 0.0) == (items[i].label == 1))
                    .count();

                let batch_loss = loss_fn.forward(logits, batch.targets);
                loss += batch_loss.clone().into_scalar().elem::<f64>() * chunk.len() as f64;

                let grads = GradientsParams::from_grads(batch_loss.backward(), &model);
                model = optim.step(config.learning_rate, model, grads);
            }

            let (validation_loss, validation_accuracy) = match validation {
                Some((vx, vy)) => {
                    let valid = model.valid();
                    let values = logits(&self.name, &valid, &plan.steps, vx, &device)?;
                    let (l, a) = score(&values, vy);
                    (Some(l), Some(a))
                }
                None => (None, None),
            };
            let stats = EpochStats {
                epoch,
                loss: loss / train_rows as f64,
                accuracy: hits as f64 / train_rows as f64,
                validation_loss,
                validation_accuracy,
            };
            debug!(
                "{}: epoch {}/{} loss {:.4} accuracy {:.4} val_accuracy {:?}",
                self.name, epoch, config.epochs, stats.loss, stats.accuracy, validation_accuracy
            );

            let accuracy = stats.accuracy;
            history.epochs.push(stats);

            if let Some(patience) = config.early_stopping_patience {
                if accuracy > best {
                    best = accuracy;
                    stale = 0;
                } else {
                    stale += 1;
                    if stale >= patience {
                        history.stopped_early = epoch < config.epochs;
                        break;
                    }
                }
            }
        }

        if let Some(last) = history.last() {
            info!(
                "{}: trained {} epochs, final loss {:.4}, accuracy {:.4}",
                self.name, last.epoch, last.loss, last.accuracy
            );
        }

        Ok(Box::new(FittedCnn {
            name: self.name.clone(),
            model: model.valid(),
            steps: plan.steps,
            standardizer,
            width: records.ncols(),
            history,
        }))
    }
}

struct FittedCnn {
    name: String,
    model: Net<NdArray>,
    steps: Vec<Step>,
    standardizer: Option<Standardizer>,
    width: usize,
    history: TrainingHistory,
}

impl FittedCnn {
    fn logits(&self, records: ArrayView2<f64>) -> Result<Vec<f64>> {
        check_records(records, self.width)?;
        let x: Array2<f64> = match &self.standardizer {
            Some(s) => s.transform(records),
            None => records.to_owned(),
        };
        logits(
            &self.name,
            &self.model,
            &self.steps,
            x.view(),
            &NdArrayDevice::Cpu,
        )
    }
}

impl FittedClassifier for FittedCnn {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, records: ArrayView2<f64>) -> Result<Array1<usize>> {
        Ok(self
            .logits(records)?
            .into_iter()
            .map(|logit| usize::from(logit > 0.0))
            .collect())
    }

    fn evaluate(&self, records: ArrayView2<f64>, targets: ArrayView1<usize>) -> Result<Evaluation> {
        let logits = self.logits(records)?;
        let predicted: Array1<usize> = logits.iter().map(|&l| usize::from(l > 0.0)).collect();
        let evaluation = Evaluation::from_predictions(targets, predicted.view())?;
        let (loss, _) = score(&logits, targets);
        Ok(evaluation.with_loss(loss))
    }

    fn history(&self) -> Option<&TrainingHistory> {
        Some(&self.history)
    }
}
