// FDIA Models - Classifier bank for tampered-reading detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Mini-batches of sensor readings

use burn::{data::dataloader::batcher::Batcher, prelude::*};
use ndarray::{ArrayView1, ArrayView2};

/// One row of readings and its label.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReadingItem {
    pub readings: Vec<f32>,
    pub label: usize,
}

impl ReadingItem {
    pub fn labeled(records: ArrayView2<f64>, targets: ArrayView1<usize>) -> Vec<Self> {
        records
            .rows()
            .into_iter()
            .zip(targets)
            .map(|(row, &label)| Self {
                readings: row.iter().map(|&v| v as f32).collect(),
                label,
            })
            .collect()
    }

    /// Rows to predict; the label is never read.
    pub fn unlabeled(records: ArrayView2<f64>) -> Vec<Self> {
        records
            .rows()
            .into_iter()
            .map(|row| Self {
                readings: row.iter().map(|&v| v as f32).collect(),
                label: 0,
            })
            .collect()
    }
}

#[derive(Clone)]
pub(crate) struct ReadingBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> ReadingBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ReadingBatch<B: Backend> {
    /// `(rows, sensors)`
    pub readings: Tensor<B, 2>,
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> Batcher<ReadingItem, ReadingBatch<B>> for ReadingBatcher<B> {
    fn batch(&self, items: Vec<ReadingItem>) -> ReadingBatch<B> {
        let width = items.first().map_or(0, |item| item.readings.len());
        let readings: Vec<f32> = items
            .iter()
            .flat_map(|item| item.readings.iter().copied())
            .collect();
        let targets: Vec<i64> = items.iter().map(|item| item.label as i64).collect();

        ReadingBatch {
            readings: Tensor::from_data(
                TensorData::new(readings, [items.len(), width]),
                &self.device,
            ),
            targets: Tensor::from_data(TensorData::new(targets, [items.len()]), &self.device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::NdArray;
    use ndarray::array;

    #[test]
    fn test_batch_shapes_and_values() {
        let x = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let y = array![0, 1];
        let items = ReadingItem::labeled(x.view(), y.view());
        assert_eq!(items[1].readings, vec![4.0, 5.0, 6.0]);

        let batch: ReadingBatch<NdArray> =
            ReadingBatcher::new(NdArrayDevice::Cpu).batch(items);
        assert_eq!(batch.readings.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(), [2]);

        let values: Vec<f32> = batch.readings.into_data().iter::<f32>().collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let labels: Vec<i64> = batch.targets.into_data().iter::<i64>().collect();
        assert_eq!(labels, vec![0, 1]);
    }

    #[test]
    fn test_unlabeled_rows() {
        let x = array![[0.5, 1.5]];
        let items = ReadingItem::unlabeled(x.view());
        assert_eq!(
            items,
            vec![ReadingItem {
                readings: vec![0.5, 1.5],
                label: 0
            }]
        );
    }
}
