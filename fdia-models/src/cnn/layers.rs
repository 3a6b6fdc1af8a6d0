// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Network descriptions
//!
//! A description is a list of [`LayerSpec`]s applied to a single-channel
//! sequence with one step per sensor. [`Plan::new`] checks it against the
//! input length, works out every layer's shape and numbers the layers that
//! the network has to build.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// Convolution border handling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// No padding, the sequence shrinks by `kernel_size - 1`
    #[default]
    Valid,
    /// Zero padding that keeps the sequence length; odd kernels only
    Same,
}

/// One layer of a network description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    /// Stride-1 convolution over the sequence
    Conv1d {
        filters: usize,
        kernel_size: usize,
        #[serde(default)]
        padding: Padding,
    },
    /// Per-channel normalisation over the batch
    BatchNorm,
    /// max(0, x)
    Relu,
    /// x for positive inputs, alpha * x otherwise
    LeakyRelu { alpha: f64 },
    /// Zeroes a share of activations while training
    Dropout { rate: f64 },
    /// Channels and steps into one row
    Flatten,
    /// Fully connected layer
    Dense { units: usize },
}

/// One forward step. Indices point into the matching list of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Conv(usize),
    BatchNorm(usize),
    Relu,
    LeakyRelu(usize),
    Dropout(usize),
    Flatten,
    Dense(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConvShape {
    pub in_channels: usize,
    pub filters: usize,
    pub kernel_size: usize,
    pub padding: Padding,
}

/// Checked layer stack ending in a one-unit head.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Plan {
    pub steps: Vec<Step>,
    pub convs: Vec<ConvShape>,
    /// Channels of each batch norm
    pub norms: Vec<usize>,
    /// `(inputs, units)` of each dense layer
    pub dense: Vec<(usize, usize)>,
    pub dropouts: Vec<f64>,
    pub slopes: Vec<f64>,
    /// Width feeding the head
    pub head_inputs: usize,
}

/// Output length for an input of `len` steps, `None` if the kernel does not fit.
pub(crate) fn output_len(kernel: usize, padding: Padding, len: usize) -> Option<usize> {
    match padding {
        Padding::Valid => (len >= kernel).then(|| len + 1 - kernel),
        Padding::Same => Some(len),
    }
}

impl Plan {
    /// Plan `specs` for single-channel sequences of `input_len` steps.
    ///
    /// A flatten is inserted before the head when the description ends on a
    /// sequence.
    pub fn new(model: &str, specs: &[LayerSpec], input_len: usize) -> Result<Self> {
        let mut plan = Plan {
            steps: Vec::with_capacity(specs.len() + 1),
            convs: Vec::new(),
            norms: Vec::new(),
            dense: Vec::new(),
            dropouts: Vec::new(),
            slopes: Vec::new(),
            head_inputs: 0,
        };
        let (mut channels, mut len) = (1usize, input_len);
        let mut width: Option<usize> = None;
        let bad = |i: usize, reason: String| ModelError::config(model, format!("layer {}: {}", i, reason));

        for (i, spec) in specs.iter().enumerate() {
            let step = match *spec {
                LayerSpec::Conv1d {
                    filters,
                    kernel_size,
                    padding,
                } => {
                    if width.is_some() {
                        return Err(bad(i, "convolution after flatten".into()));
                    }
                    if filters == 0 || kernel_size == 0 {
                        return Err(bad(i, "filters and kernel_size must be positive".into()));
                    }
                    if padding == Padding::Same && kernel_size % 2 == 0 {
                        return Err(bad(i, "same padding needs an odd kernel_size".into()));
                    }
                    let out = output_len(kernel_size, padding, len).ok_or_else(|| {
                        bad(
                            i,
                            format!("kernel of {} does not fit a sequence of {}", kernel_size, len),
                        )
                    })?;
                    plan.convs.push(ConvShape {
                        in_channels: channels,
                        filters,
                        kernel_size,
                        padding,
                    });
                    channels = filters;
                    len = out;
                    Step::Conv(plan.convs.len() - 1)
                }
                LayerSpec::BatchNorm => {
                    if width.is_some() {
                        return Err(bad(i, "batch norm after flatten".into()));
                    }
                    plan.norms.push(channels);
                    Step::BatchNorm(plan.norms.len() - 1)
                }
                LayerSpec::Relu => Step::Relu,
                LayerSpec::LeakyRelu { alpha } => {
                    if !(alpha >= 0.0 && alpha.is_finite()) {
                        return Err(bad(i, "alpha must be non-negative".into()));
                    }
                    plan.slopes.push(alpha);
                    Step::LeakyRelu(plan.slopes.len() - 1)
                }
                LayerSpec::Dropout { rate } => {
                    if !(0.0..1.0).contains(&rate) {
                        return Err(bad(i, "dropout rate must be in [0, 1)".into()));
                    }
                    plan.dropouts.push(rate);
                    Step::Dropout(plan.dropouts.len() - 1)
                }
                LayerSpec::Flatten => {
                    if width.is_some() {
                        return Err(bad(i, "input is already flat".into()));
                    }
                    width = Some(channels * len);
                    Step::Flatten
                }
                LayerSpec::Dense { units } => {
                    let Some(inputs) = width else {
                        return Err(bad(i, "dense layer needs a flatten first".into()));
                    };
                    if units == 0 {
                        return Err(bad(i, "units must be positive".into()));
                    }
                    width = Some(units);
                    plan.dense.push((inputs, units));
                    Step::Dense(plan.dense.len() - 1)
                }
            };
            plan.steps.push(step);
        }

        plan.head_inputs = match width {
            Some(w) => w,
            None => {
                plan.steps.push(Step::Flatten);
                channels * len
            }
        };
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(filters: usize, kernel_size: usize, padding: Padding) -> LayerSpec {
        LayerSpec::Conv1d {
            filters,
            kernel_size,
            padding,
        }
    }

    #[test]
    fn test_output_len() {
        assert_eq!(output_len(3, Padding::Valid, 11), Some(9));
        assert_eq!(output_len(3, Padding::Same, 11), Some(11));
        assert_eq!(output_len(12, Padding::Valid, 11), None);
        assert_eq!(output_len(11, Padding::Valid, 11), Some(1));
    }

    #[test]
    fn test_shapes_follow_the_stack() {
        let plan = Plan::new(
            "shapes",
            &[
                conv(4, 3, Padding::Valid),
                LayerSpec::BatchNorm,
                LayerSpec::LeakyRelu { alpha: 0.3 },
                conv(6, 3, Padding::Same),
                LayerSpec::Dropout { rate: 0.5 },
                LayerSpec::Flatten,
                LayerSpec::Dense { units: 5 },
                LayerSpec::Relu,
            ],
            11,
        )
        .unwrap();

        assert_eq!(
            plan.steps,
            vec![
                Step::Conv(0),
                Step::BatchNorm(0),
                Step::LeakyRelu(0),
                Step::Conv(1),
                Step::Dropout(0),
                Step::Flatten,
                Step::Dense(0),
                Step::Relu,
            ]
        );
        assert_eq!(plan.convs[1].in_channels, 4);
        assert_eq!(plan.norms, vec![4]);
        assert_eq!(plan.dense, vec![(6 * 9, 5)]);
        assert_eq!(plan.slopes, vec![0.3]);
        assert_eq!(plan.head_inputs, 5);
    }

    #[test]
    fn test_flatten_is_inserted_before_head() {
        let plan = Plan::new("conv_only", &[conv(2, 2, Padding::Valid)], 11).unwrap();
        assert_eq!(plan.steps, vec![Step::Conv(0), Step::Flatten]);
        assert_eq!(plan.head_inputs, 20);

        let plan = Plan::new("empty", &[], 11).unwrap();
        assert_eq!(plan.steps, vec![Step::Flatten]);
        assert_eq!(plan.head_inputs, 11);
    }

    #[test]
    fn test_rejects_bad_stacks() {
        let bad: Vec<Vec<LayerSpec>> = vec![
            vec![LayerSpec::Dense { units: 3 }],
            vec![LayerSpec::Flatten, conv(2, 3, Padding::Valid)],
            vec![LayerSpec::Flatten, LayerSpec::BatchNorm],
            vec![LayerSpec::Flatten, LayerSpec::Flatten],
            vec![conv(2, 12, Padding::Valid)],
            vec![conv(2, 2, Padding::Same)],
            vec![conv(0, 3, Padding::Valid)],
            vec![LayerSpec::Dropout { rate: 1.0 }],
            vec![LayerSpec::LeakyRelu { alpha: -0.1 }],
            vec![LayerSpec::Flatten, LayerSpec::Dense { units: 0 }],
        ];
        for specs in bad {
            match Plan::new("bad", &specs, 11) {
                Err(ModelError::InvalidConfig { model, reason }) => {
                    assert_eq!(model, "bad");
                    assert!(reason.starts_with("layer "), "{}", reason);
                }
                other => panic!("{:?} accepted: {:?}", specs, other),
            }
        }
    }

    #[test]
    fn test_layer_spec_json() {
        let specs: Vec<LayerSpec> = serde_json::from_str(
            r#"[{"type": "conv1d", "filters": 8, "kernel_size": 3},
                {"type": "batch_norm"},
                {"type": "leaky_relu", "alpha": 0.3}]"#,
        )
        .unwrap();
        assert_eq!(
            specs,
            vec![
                conv(8, 3, Padding::Valid),
                LayerSpec::BatchNorm,
                LayerSpec::LeakyRelu { alpha: 0.3 }
            ]
        );
    }
}
