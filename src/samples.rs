//! Labeled feature vectors and their CSV persistence.
//!
//! Features and labels are stored as two header-less, comma-separated
//! files with one example per line, so an experiment can be re-run on the
//! exact same injected data.

use crate::error::TableError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ground truth for one feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Label {
    /// Reading left as recorded.
    Genuine = 0,
    /// Reading altered by the injection engine.
    Tampered = 1,
}

impl Label {
    /// Numeric class value (0 or 1).
    pub fn value(self) -> usize {
        self as usize
    }

    /// Label for a numeric class value.
    pub fn from_value(value: usize) -> Option<Self> {
        match value {
            0 => Some(Label::Genuine),
            1 => Some(Label::Tampered),
            _ => None,
        }
    }

    /// Whether this is the tampered class.
    pub fn is_tampered(self) -> bool {
        self == Label::Tampered
    }
}

impl From<bool> for Label {
    fn from(tampered: bool) -> Self {
        if tampered {
            Label::Tampered
        } else {
            Label::Genuine
        }
    }
}

/// Ordered feature vectors with a parallel label vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Samples {
    features: Vec<Vec<f64>>,
    labels: Vec<Label>,
}

impl Samples {
    /// Create an empty sample set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from parallel vectors. Lengths must match.
    pub fn from_parts(features: Vec<Vec<f64>>, labels: Vec<Label>) -> Option<Self> {
        if features.len() != labels.len() {
            return None;
        }
        Some(Self { features, labels })
    }

    /// Append one example.
    pub fn push(&mut self, features: Vec<f64>, label: Label) {
        self.features.push(features);
        self.labels.push(label);
    }

    /// Feature vectors, one per example.
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Labels, one per example.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Labels as class values.
    pub fn label_values(&self) -> Vec<usize> {
        self.labels.iter().map(|l| l.value()).collect()
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Width of the feature vectors (0 when empty).
    pub fn feature_width(&self) -> usize {
        self.features.first().map_or(0, |f| f.len())
    }

    /// Number of tampered examples.
    pub fn tampered_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_tampered()).count()
    }

    /// Pick examples by position, in the given order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Split back into parallel vectors.
    pub fn into_parts(self) -> (Vec<Vec<f64>>, Vec<Label>) {
        (self.features, self.labels)
    }

    /// Write features and labels to two CSV files.
    pub fn save_csv(
        &self,
        features_path: impl AsRef<Path>,
        labels_path: impl AsRef<Path>,
    ) -> Result<(), TableError> {
        let mut features = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(features_path)?;
        for row in &self.features {
            features.write_record(row.iter().map(|v| v.to_string()))?;
        }
        features.flush()?;

        let mut labels = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(labels_path)?;
        for label in &self.labels {
            labels.write_record([label.value().to_string()])?;
        }
        labels.flush()?;
        Ok(())
    }

    /// Read features and labels written by [`Samples::save_csv`].
    pub fn load_csv(
        features_path: impl AsRef<Path>,
        labels_path: impl AsRef<Path>,
    ) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(features_path)?;
        let mut features = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map_or(features.len() + 1, |p| p.line() as usize);
            let row = record
                .iter()
                .enumerate()
                .map(|(column, raw)| {
                    raw.trim()
                        .parse::<f64>()
                        .map_err(|_| TableError::InvalidReading {
                            line,
                            column: column.to_string(),
                            value: raw.to_string(),
                        })
                })
                .collect::<Result<Vec<f64>, _>>()?;
            features.push(row);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(labels_path)?;
        let mut labels = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map_or(labels.len() + 1, |p| p.line() as usize);
            let raw = record.get(0).unwrap_or("").trim();
            let label = raw
                .parse::<f64>()
                .ok()
                .filter(|v| *v >= 0.0 && v.fract() == 0.0)
                .and_then(|v| Label::from_value(v as usize))
                .ok_or_else(|| TableError::InvalidReading {
                    line,
                    column: "label".to_string(),
                    value: raw.to_string(),
                })?;
            labels.push(label);
        }

        if features.is_empty() {
            return Err(TableError::Empty);
        }
        if features.len() != labels.len() {
            return Err(TableError::RaggedRow {
                line: features.len().min(labels.len()) + 1,
                expected: features.len(),
                actual: labels.len(),
            });
        }

        Ok(Self { features, labels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_label_values() {
        assert_eq!(Label::Genuine.value(), 0);
        assert_eq!(Label::Tampered.value(), 1);
        assert_eq!(Label::from_value(1), Some(Label::Tampered));
        assert_eq!(Label::from_value(2), None);
        assert_eq!(Label::from(true), Label::Tampered);
    }

    #[test]
    fn test_from_parts_checks_lengths() {
        assert!(Samples::from_parts(vec![vec![1.0]], vec![]).is_none());
        let samples = Samples::from_parts(vec![vec![1.0, 2.0]], vec![Label::Genuine]).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples.feature_width(), 2);
    }

    #[test]
    fn test_select_keeps_order() {
        let mut samples = Samples::new();
        samples.push(vec![0.0], Label::Genuine);
        samples.push(vec![1.0], Label::Tampered);
        samples.push(vec![2.0], Label::Genuine);

        let picked = samples.select(&[2, 0]);
        assert_eq!(picked.features(), &[vec![2.0], vec![0.0]]);
        assert_eq!(picked.labels(), &[Label::Genuine, Label::Genuine]);
    }

    #[test]
    fn test_csv_persistence() {
        let dir = tempdir().unwrap();
        let features_path = dir.path().join("features.csv");
        let labels_path = dir.path().join("labels.csv");

        let mut samples = Samples::new();
        samples.push(vec![10.0, 9.4123, 0.1], Label::Tampered);
        samples.push(vec![1e-3, -2.5, 7.0], Label::Genuine);

        samples.save_csv(&features_path, &labels_path).unwrap();
        let loaded = Samples::load_csv(&features_path, &labels_path).unwrap();

        assert_eq!(loaded, samples);
        assert_eq!(loaded.tampered_count(), 1);
    }

    #[test]
    fn test_load_rejects_bad_label() {
        let dir = tempdir().unwrap();
        let features_path = dir.path().join("features.csv");
        let labels_path = dir.path().join("labels.csv");
        std::fs::write(&features_path, "1.0,2.0\n").unwrap();
        std::fs::write(&labels_path, "3\n").unwrap();

        assert!(matches!(
            Samples::load_csv(&features_path, &labels_path),
            Err(TableError::InvalidReading { .. })
        ));
    }

    #[test]
    fn test_load_rejects_length_mismatch() {
        let dir = tempdir().unwrap();
        let features_path = dir.path().join("features.csv");
        let labels_path = dir.path().join("labels.csv");
        std::fs::write(&features_path, "1.0,2.0\n3.0,4.0\n").unwrap();
        std::fs::write(&labels_path, "1\n").unwrap();

        assert!(Samples::load_csv(&features_path, &labels_path).is_err());
    }
}
