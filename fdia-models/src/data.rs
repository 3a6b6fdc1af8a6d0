// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Matrix conversion and training-set checks

use crate::error::{ModelError, Result};
use fdia::Samples;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Feature matrix of a sample set, one row per example.
pub fn records(samples: &Samples) -> Result<Array2<f64>> {
    if samples.is_empty() {
        return Err(ModelError::EmptyDataset);
    }
    let width = samples.feature_width();
    if let Some(row) = samples.features().iter().find(|row| row.len() != width) {
        return Err(ModelError::FeatureWidth {
            expected: width,
            actual: row.len(),
        });
    }
    let features = samples.features();
    Ok(Array2::from_shape_fn((samples.len(), width), |(i, j)| {
        features[i][j]
    }))
}

/// Label vector of a sample set (0 genuine, 1 tampered).
pub fn targets(samples: &Samples) -> Array1<usize> {
    Array1::from(samples.label_values())
}

/// Check records before scoring against a model fitted on `width` features.
pub fn check_records(records: ArrayView2<f64>, width: usize) -> Result<()> {
    if records.nrows() == 0 {
        return Err(ModelError::EmptyDataset);
    }
    if records.ncols() != width {
        return Err(ModelError::FeatureWidth {
            expected: width,
            actual: records.ncols(),
        });
    }
    for ((row, column), value) in records.indexed_iter() {
        if !value.is_finite() {
            return Err(ModelError::NonFinite { row, column });
        }
    }
    Ok(())
}

/// Check a training set: non-empty, aligned, finite, binary with both classes.
pub fn check_training_set(records: ArrayView2<f64>, targets: ArrayView1<usize>) -> Result<()> {
    if records.nrows() != targets.len() {
        return Err(ModelError::LengthMismatch {
            records: records.nrows(),
            targets: targets.len(),
        });
    }
    check_records(records, records.ncols())?;
    if records.ncols() == 0 {
        return Err(ModelError::FeatureWidth {
            expected: 1,
            actual: 0,
        });
    }

    let mut seen = [false; 2];
    for (row, &value) in targets.iter().enumerate() {
        match value {
            0 | 1 => seen[value] = true,
            _ => return Err(ModelError::InvalidTarget { row, value }),
        }
    }
    match seen {
        [true, true] => Ok(()),
        [_, true] => Err(ModelError::DegenerateLabels { class: 1 }),
        _ => Err(ModelError::DegenerateLabels { class: 0 }),
    }
}

/// Per-column standardisation to zero mean and unit variance.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl Standardizer {
    /// Learn column means and deviations. Constant columns keep scale 1.
    pub fn fit(records: ArrayView2<f64>) -> Self {
        let rows = records.nrows().max(1) as f64;
        let mean = records.sum_axis(Axis(0)) / rows;
        let scale = records
            .axis_iter(Axis(1))
            .zip(mean.iter())
            .map(|(column, &m)| {
                let variance = column.iter().map(|v| (v - m).powi(2)).sum::<f64>() / rows;
                let sd = variance.sqrt();
                if sd > f64::EPSILON {
                    sd
                } else {
                    1.0
                }
            })
            .collect();
        Self { mean, scale }
    }

    /// Standardise `records` with the learned statistics.
    pub fn transform(&self, records: ArrayView2<f64>) -> Array2<f64> {
        let mut out = records.to_owned();
        for mut row in out.rows_mut() {
            row -= &self.mean;
            row /= &self.scale;
        }
        out
    }

    /// Number of columns the standardizer was fitted on.
    pub fn width(&self) -> usize {
        self.mean.len()
    }
}

/// Population variance over every element of `records`.
pub fn overall_variance(records: ArrayView2<f64>) -> f64 {
    let n = records.len();
    if n == 0 {
        return 0.0;
    }
    let mean = records.sum() / n as f64;
    records.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64
}
