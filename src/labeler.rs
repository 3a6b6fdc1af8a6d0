//! Dataset labeling: turn a sensor table into features and ground truth.
//!
//! Every row gets an independent coin flip. Rows that lose it are passed
//! through the [`InjectionEngine`] and labeled [`Label::Tampered`]; the
//! others are copied as recorded and labeled [`Label::Genuine`]. The
//! source table is never modified; a tampered copy is built alongside.

use crate::error::{Error, LabelingError};
use crate::injection::{CorruptionSpec, InjectionConfig, InjectionEngine};
use crate::samples::{Label, Samples};
use crate::table::SensorTable;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, trace};

/// Labeling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelingConfig {
    /// Probability that a row is corrupted.
    pub corruption_probability: f64,
    /// Injection engine settings.
    pub injection: InjectionConfig,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            corruption_probability: 0.5,
            injection: InjectionConfig::default(),
        }
    }
}

impl LabelingConfig {
    /// Set the per-row corruption probability.
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.corruption_probability = probability;
        self
    }

    /// Set the injection settings.
    pub fn with_injection(mut self, injection: InjectionConfig) -> Self {
        self.injection = injection;
        self
    }
}

/// Output of one labeling pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    samples: Samples,
    corruptions: Vec<Option<CorruptionSpec>>,
    tampered: SensorTable,
}

impl LabeledDataset {
    /// Features and labels.
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Consume into features and labels.
    pub fn into_samples(self) -> Samples {
        self.samples
    }

    /// Feature vectors, one per source row.
    pub fn features(&self) -> &[Vec<f64>] {
        self.samples.features()
    }

    /// Labels, one per source row.
    pub fn labels(&self) -> &[Label] {
        self.samples.labels()
    }

    /// Attack applied to each row (`None` for genuine rows).
    pub fn corruptions(&self) -> &[Option<CorruptionSpec>] {
        &self.corruptions
    }

    /// Copy of the source table with corrupted rows swapped in.
    pub fn tampered_table(&self) -> &SensorTable {
        &self.tampered
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of corrupted rows.
    pub fn tampered_count(&self) -> usize {
        self.samples.tampered_count()
    }
}

/// Applies the injection engine to a random subset of table rows.
#[derive(Debug, Clone)]
pub struct DatasetLabeler {
    engine: InjectionEngine,
    corruption_probability: f64,
}

impl DatasetLabeler {
    /// Create a labeler, validating the config.
    pub fn new(config: LabelingConfig) -> Result<Self, Error> {
        let p = config.corruption_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(LabelingError::InvalidProbability(p).into());
        }
        let engine = InjectionEngine::new(config.injection)?;
        Ok(Self {
            engine,
            corruption_probability: p,
        })
    }

    /// Get the injection engine.
    pub fn engine(&self) -> &InjectionEngine {
        &self.engine
    }

    /// Get the per-row corruption probability.
    pub fn corruption_probability(&self) -> f64 {
        self.corruption_probability
    }

    /// Label a table, flipping a biased coin per row.
    ///
    /// Draw order per row: the uniform decision value, then (if corrupted)
    /// the target count, the targets and the magnitudes. The same seed
    /// therefore reproduces the same dataset.
    pub fn label<R: Rng + ?Sized>(
        &self,
        table: &SensorTable,
        rng: &mut R,
    ) -> Result<LabeledDataset, LabelingError> {
        let p = self.corruption_probability;
        self.label_with(table, rng, |_, rng| rng.gen::<f64>() < p)
    }

    /// Label a table with an explicit per-row decision.
    ///
    /// `decide` receives the row position and the randomness source and
    /// returns whether that row is corrupted.
    pub fn label_with<R, D>(
        &self,
        table: &SensorTable,
        rng: &mut R,
        mut decide: D,
    ) -> Result<LabeledDataset, LabelingError>
    where
        R: Rng + ?Sized,
        D: FnMut(usize, &mut R) -> bool,
    {
        if table.is_empty() {
            return Err(LabelingError::EmptyTable);
        }
        for (row, values) in table.rows().iter().enumerate() {
            self.engine
                .check_row(values)
                .map_err(|source| LabelingError::Row { row, source })?;
        }

        let start = Instant::now();
        let mut samples = Samples::new();
        let mut corruptions = Vec::with_capacity(table.len());
        let mut rows = Vec::with_capacity(table.len());

        for (position, row) in table.rows().iter().enumerate() {
            if decide(position, &mut *rng) {
                let injection = self
                    .engine
                    .inject(row, rng)
                    .map_err(|source| LabelingError::Row {
                        row: position,
                        source,
                    })?;
                trace!(
                    "Row {}: injected {:?} at {:?}",
                    position,
                    injection.spec.magnitudes,
                    injection.spec.indices
                );
                samples.push(injection.row.features().to_vec(), Label::Tampered);
                corruptions.push(Some(injection.spec));
                rows.push(injection.row);
            } else {
                samples.push(row.features().to_vec(), Label::Genuine);
                corruptions.push(None);
                rows.push(row.clone());
            }
        }

        let tampered = table
            .with_rows(rows)
            .map_err(|_| LabelingError::EmptyTable)?;

        info!(
            "Data injected: {} of {} rows tampered (in {:.3}s)",
            samples.tampered_count(),
            samples.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(LabeledDataset {
            samples,
            corruptions,
            tampered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::SensorRow;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table(rows: usize) -> SensorTable {
        SensorTable::from_rows(
            (0..rows)
                .map(|i| SensorRow::new(i.to_string(), format!("t{}", i), vec![5.0 + i as f64; 11]))
                .collect(),
        )
        .unwrap()
    }

    fn labeler() -> DatasetLabeler {
        DatasetLabeler::new(LabelingConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_probability() {
        let result = DatasetLabeler::new(LabelingConfig::default().with_probability(1.5));
        assert!(matches!(
            result,
            Err(Error::Labeling(LabelingError::InvalidProbability(_)))
        ));
    }

    #[test]
    fn test_row_count_preserved() {
        let source = table(50);
        let mut rng = StdRng::seed_from_u64(7);
        let dataset = labeler().label(&source, &mut rng).unwrap();

        assert_eq!(dataset.len(), 50);
        assert_eq!(dataset.labels().len(), 50);
        assert_eq!(dataset.corruptions().len(), 50);
        assert_eq!(dataset.tampered_table().len(), 50);
        assert!(dataset.features().iter().all(|f| f.len() == 11));
    }

    #[test]
    fn test_source_table_untouched() {
        let source = table(20);
        let before = source.clone();
        let mut rng = StdRng::seed_from_u64(3);
        let dataset = labeler()
            .label_with(&source, &mut rng, |_, _| true)
            .unwrap();

        assert_eq!(source, before);
        assert_eq!(dataset.tampered_count(), 20);
        assert_ne!(dataset.tampered_table(), &source);
        for (row, features) in dataset
            .tampered_table()
            .rows()
            .iter()
            .zip(dataset.features())
        {
            assert_eq!(&row.readings, features);
        }
    }

    #[test]
    fn test_probability_extremes() {
        let source = table(30);
        let mut rng = StdRng::seed_from_u64(11);

        let none = DatasetLabeler::new(LabelingConfig::default().with_probability(0.0))
            .unwrap()
            .label(&source, &mut rng)
            .unwrap();
        assert_eq!(none.tampered_count(), 0);

        let all = DatasetLabeler::new(LabelingConfig::default().with_probability(1.0))
            .unwrap()
            .label(&source, &mut rng)
            .unwrap();
        assert_eq!(all.tampered_count(), 30);
    }

    #[test]
    fn test_corruption_record_matches_features() {
        let source = table(40);
        let mut rng = StdRng::seed_from_u64(5);
        let dataset = labeler().label(&source, &mut rng).unwrap();

        for (i, spec) in dataset.corruptions().iter().enumerate() {
            let original = &source.rows()[i].readings;
            let features = &dataset.features()[i];
            match spec {
                Some(spec) => {
                    assert_eq!(dataset.labels()[i], Label::Tampered);
                    for (&idx, &m) in spec.indices.iter().zip(&spec.magnitudes) {
                        approx::assert_relative_eq!(features[idx], original[idx] - m);
                    }
                }
                None => {
                    assert_eq!(dataset.labels()[i], Label::Genuine);
                    assert_eq!(features, original);
                }
            }
        }
    }

    #[test]
    fn test_short_row_rejected_before_drawing() {
        let source = SensorTable::from_rows(vec![SensorRow::new("0", "t", vec![1.0; 4])]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let err = labeler().label(&source, &mut rng).unwrap_err();
        assert!(matches!(err, LabelingError::Row { row: 0, .. }));
    }
}
