// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Burn module built from a [`Plan`]

use super::layers::{Padding, Plan, Step};
use burn::nn::conv::{Conv1d, Conv1dConfig};
use burn::nn::{
    BatchNorm, BatchNormConfig, Dropout, DropoutConfig, LeakyRelu, LeakyReluConfig, Linear,
    LinearConfig, PaddingConfig1d, Relu,
};
use burn::prelude::*;

/// Layers of a plan, grouped by kind; the plan's steps give their order.
#[derive(Module, Debug)]
pub(crate) struct Net<B: Backend> {
    convs: Vec<Conv1d<B>>,
    norms: Vec<BatchNorm<B, 1>>,
    dense: Vec<Linear<B>>,
    dropouts: Vec<Dropout>,
    leaky: Vec<LeakyRelu>,
    relu: Relu,
    head: Linear<B>,
}

enum Activation<B: Backend> {
    /// `(rows, channels, steps)`
    Sequence(Tensor<B, 3>),
    /// `(rows, width)`
    Flat(Tensor<B, 2>),
}

impl<B: Backend> Net<B> {
    pub fn new(plan: &Plan, device: &B::Device) -> Self {
        let convs = plan
            .convs
            .iter()
            .map(|c| {
                let padding = match c.padding {
                    Padding::Valid => PaddingConfig1d::Valid,
                    Padding::Same => PaddingConfig1d::Same,
                };
                Conv1dConfig::new(c.in_channels, c.filters, c.kernel_size)
                    .with_padding(padding)
                    .init(device)
            })
            .collect();
        let norms: Vec<BatchNorm<B, 1>> = plan
            .norms
            .iter()
            .map(|&channels| BatchNormConfig::new(channels).init(device))
            .collect();
        let dense = plan
            .dense
            .iter()
            .map(|&(inputs, units)| LinearConfig::new(inputs, units).init(device))
            .collect();
        let dropouts = plan
            .dropouts
            .iter()
            .map(|&rate| DropoutConfig::new(rate).init())
            .collect();
        let leaky = plan
            .slopes
            .iter()
            .map(|&alpha| LeakyReluConfig::new().with_negative_slope(alpha).init())
            .collect();

        Self {
            convs,
            norms,
            dense,
            dropouts,
            leaky,
            relu: Relu::new(),
            head: LinearConfig::new(plan.head_inputs, 1).init(device),
        }
    }

    /// One logit per row of `(rows, sensors)` readings; `None` when `steps`
    /// does not belong to this network.
    pub fn forward(&self, steps: &[Step], readings: Tensor<B, 2>) -> Option<Tensor<B, 1>> {
        let [rows, sensors] = readings.dims();
        let mut x = Activation::Sequence(readings.reshape([rows, 1, sensors]));

        for &step in steps {
            x = match (step, x) {
                (Step::Conv(i), Activation::Sequence(t)) => {
                    Activation::Sequence(self.convs.get(i)?.forward(t))
                }
                (Step::BatchNorm(i), Activation::Sequence(t)) => {
                    Activation::Sequence(self.norms.get(i)?.forward(t))
                }
                (Step::Relu, Activation::Sequence(t)) => Activation::Sequence(self.relu.forward(t)),
                (Step::Relu, Activation::Flat(t)) => Activation::Flat(self.relu.forward(t)),
                (Step::LeakyRelu(i), Activation::Sequence(t)) => {
                    Activation::Sequence(self.leaky.get(i)?.forward(t))
                }
                (Step::LeakyRelu(i), Activation::Flat(t)) => {
                    Activation::Flat(self.leaky.get(i)?.forward(t))
                }
                (Step::Dropout(i), Activation::Sequence(t)) => {
                    Activation::Sequence(self.dropouts.get(i)?.forward(t))
                }
                (Step::Dropout(i), Activation::Flat(t)) => {
                    Activation::Flat(self.dropouts.get(i)?.forward(t))
                }
                (Step::Flatten, Activation::Sequence(t)) => {
                    let [rows, channels, len] = t.dims();
                    Activation::Flat(t.reshape([rows, channels * len]))
                }
                (Step::Dense(i), Activation::Flat(t)) => {
                    Activation::Flat(self.dense.get(i)?.forward(t))
                }
                _ => return None,
            };
        }

        match x {
            Activation::Flat(t) => Some(self.head.forward(t).reshape([rows])),
            Activation::Sequence(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::CnnConfig;
    use super::*;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::{Autodiff, NdArray};
    use burn::module::AutodiffModule;

    fn readings<B: Backend>(rows: usize, device: &B::Device) -> Tensor<B, 2> {
        let values: Vec<f32> = (0..rows * 11).map(|v| (v % 7) as f32 * 0.1).collect();
        Tensor::from_data(TensorData::new(values, [rows, 11]), device)
    }

    #[test]
    fn test_presets_give_one_logit_per_row() {
        let device = NdArrayDevice::Cpu;
        for config in [CnnConfig::cnn1(), CnnConfig::cnn2(), CnnConfig::cnn3()] {
            let plan = Plan::new("preset", &config.layers, 11).unwrap();
            let net = Net::<NdArray>::new(&plan, &device);
            let logits = net.forward(&plan.steps, readings(4, &device)).unwrap();
            assert_eq!(logits.dims(), [4]);
        }
    }

    #[test]
    fn test_parameter_count() {
        // conv 16x1x2 + 16, conv 32x16x2 + 32, dense 288x20 + 20, head 20 + 1
        let plan = Plan::new("cnn3", &CnnConfig::cnn3().layers, 11).unwrap();
        let net = Net::<NdArray>::new(&plan, &NdArrayDevice::Cpu);
        assert_eq!(net.num_params(), 48 + 1056 + 5780 + 21);
    }

    #[test]
    fn test_dropout_is_off_for_inference() {
        let device = NdArrayDevice::Cpu;
        let plan = Plan::new("cnn2", &CnnConfig::cnn2().layers, 11).unwrap();
        let net = Net::<Autodiff<NdArray>>::new(&plan, &device).valid();

        let a: Vec<f32> = net
            .forward(&plan.steps, readings(3, &device))
            .unwrap()
            .into_data()
            .iter::<f32>()
            .collect();
        let b: Vec<f32> = net
            .forward(&plan.steps, readings(3, &device))
            .unwrap()
            .into_data()
            .iter::<f32>()
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_foreign_steps_are_refused() {
        let device = NdArrayDevice::Cpu;
        let plan = Plan::new("cnn3", &CnnConfig::cnn3().layers, 11).unwrap();
        let net = Net::<NdArray>::new(&plan, &device);

        assert!(net
            .forward(&[Step::Dense(0)], readings(2, &device))
            .is_none());
        assert!(net.forward(&[Step::Conv(0)], readings(2, &device)).is_none());
        assert!(net
            .forward(&[Step::Conv(7), Step::Flatten], readings(2, &device))
            .is_none());
    }
}
