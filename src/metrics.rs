//! Classification scoring
//!
//! Accuracy as the share of exact label matches, plus a binary confusion
//! matrix for a closer look at where a detector goes wrong.

use crate::error::MetricsError;
use serde::{Deserialize, Serialize};

/// Fraction of predictions equal to the truth (0.0 - 1.0).
pub fn accuracy<T: PartialEq>(truth: &[T], predicted: &[T]) -> Result<f64, MetricsError> {
    check_lengths(truth.len(), predicted.len())?;
    let hits = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    Ok(hits as f64 / truth.len() as f64)
}

/// Accuracy as a whole percentage, rounded to the nearest integer.
pub fn percent(accuracy: f64) -> u32 {
    (accuracy * 100.0).round().clamp(0.0, 100.0) as u32
}

fn check_lengths(truth: usize, predicted: usize) -> Result<(), MetricsError> {
    if truth != predicted {
        return Err(MetricsError::LengthMismatch { truth, predicted });
    }
    if truth == 0 {
        return Err(MetricsError::Empty);
    }
    Ok(())
}

/// Binary confusion matrix, class 1 (tampered) being positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Tampered rows flagged as tampered
    pub true_positives: u64,
    /// Genuine rows passed as genuine
    pub true_negatives: u64,
    /// Genuine rows flagged as tampered
    pub false_positives: u64,
    /// Tampered rows passed as genuine
    pub false_negatives: u64,
}

impl ConfusionMatrix {
    /// Tally class values (0 = genuine, anything else = tampered).
    pub fn from_values(truth: &[usize], predicted: &[usize]) -> Result<Self, MetricsError> {
        check_lengths(truth.len(), predicted.len())?;
        let mut matrix = Self::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            match (t != 0, p != 0) {
                (true, true) => matrix.true_positives += 1,
                (false, false) => matrix.true_negatives += 1,
                (false, true) => matrix.false_positives += 1,
                (true, false) => matrix.false_negatives += 1,
            }
        }
        Ok(matrix)
    }

    /// Number of scored rows.
    pub fn total(&self) -> u64 {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// Accuracy (0.0 - 1.0).
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_positives + self.true_negatives) as f64 / total as f64
    }

    /// Share of flagged rows that were tampered.
    pub fn precision(&self) -> f64 {
        let flagged = self.true_positives + self.false_positives;
        if flagged == 0 {
            return 0.0;
        }
        self.true_positives as f64 / flagged as f64
    }

    /// Share of tampered rows that were flagged.
    pub fn recall(&self) -> f64 {
        let tampered = self.true_positives + self.false_negatives;
        if tampered == 0 {
            return 0.0;
        }
        self.true_positives as f64 / tampered as f64
    }

    /// Harmonic mean of precision and recall.
    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            return 0.0;
        }
        2.0 * p * r / (p + r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_accuracy() {
        assert_relative_eq!(accuracy(&[1, 0, 1, 1], &[1, 0, 0, 1]).unwrap(), 0.75);
        assert_eq!(
            accuracy(&[1, 0], &[1]),
            Err(MetricsError::LengthMismatch {
                truth: 2,
                predicted: 1
            })
        );
        assert_eq!(accuracy::<usize>(&[], &[]), Err(MetricsError::Empty));
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(0.944), 94);
        assert_eq!(percent(0.946), 95);
        assert_eq!(percent(1.0), 100);
        assert_eq!(percent(0.0), 0);
    }

    #[test]
    fn test_confusion_matrix() {
        let truth = [1, 1, 0, 0, 1];
        let predicted = [1, 0, 0, 1, 1];
        let m = ConfusionMatrix::from_values(&truth, &predicted).unwrap();

        assert_eq!(m.true_positives, 2);
        assert_eq!(m.true_negatives, 1);
        assert_eq!(m.false_positives, 1);
        assert_eq!(m.false_negatives, 1);
        assert_eq!(m.total(), 5);
        assert_relative_eq!(m.accuracy(), 0.6);
        assert_relative_eq!(m.precision(), 2.0 / 3.0);
        assert_relative_eq!(m.recall(), 2.0 / 3.0);
        assert_relative_eq!(m.f1(), 2.0 / 3.0);
    }

    #[test]
    fn test_empty_matrix() {
        let m = ConfusionMatrix::default();
        assert_eq!(m.accuracy(), 0.0);
        assert_eq!(m.precision(), 0.0);
        assert_eq!(m.recall(), 0.0);
        assert_eq!(m.f1(), 0.0);
    }
}
