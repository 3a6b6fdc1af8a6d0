//! # FDIA - False Data Injection Attack datasets
//!
//! Builds labeled training data for detecting False Data Injection Attacks
//! on smart-grid sensor telemetry.
//!
//! ## Key Features
//!
//! - **Sensor tables**: CSV loading with strict schema checks
//! - **Injection engine**: Seeded, attacker-style under-reporting of a few readings
//! - **Dataset labeler**: Per-row coin flip, parallel label vector, tampered copy
//! - **Splitting and scoring**: Stable train/test partitions, accuracy, confusion matrix
//!
//! ## Quick Start
//!
//! ```rust
//! use fdia::{DatasetLabeler, LabelingConfig, SensorRow, SensorTable};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let rows = (0..8)
//!     .map(|i| SensorRow::new(i.to_string(), format!("{:02}:00", i), vec![10.0; 11]))
//!     .collect();
//! let table = SensorTable::from_rows(rows).unwrap();
//!
//! let labeler = DatasetLabeler::new(LabelingConfig::default()).unwrap();
//! let mut rng = StdRng::seed_from_u64(42);
//! let dataset = labeler.label(&table, &mut rng).unwrap();
//!
//! assert_eq!(dataset.len(), 8);
//! assert_eq!(dataset.features()[0].len(), 11);
//! ```
//!
//! ## Modules
//!
//! - [`table`]: Sensor rows, tables, CSV import and column statistics
//! - [`injection`]: Corruption of single rows
//! - [`labeler`]: Labeling of whole tables
//! - [`samples`]: Labels, feature/label sets and their persistence
//! - [`split`]: Train/test partitioning
//! - [`metrics`]: Accuracy and confusion matrix

// Modules
pub mod error;
pub mod injection;
pub mod labeler;
pub mod metrics;
pub mod samples;
pub mod split;
pub mod table;

// Re-exports for convenient access
pub use error::{
    Error, InjectionError, LabelingError, MetricsError, Result, SplitError, TableError,
};
pub use injection::{
    CorruptionSpec, FloorPolicy, Injection, InjectionConfig, InjectionEngine, MagnitudePolicy,
};
pub use labeler::{DatasetLabeler, LabeledDataset, LabelingConfig};
pub use metrics::{accuracy, percent, ConfusionMatrix};
pub use samples::{Label, Samples};
pub use split::{train_test_split, SplitConfig, TrainTestSplit};
pub use table::{SensorRow, SensorStats, SensorTable, LEADING_COLUMNS, REFERENCE_SENSOR_COUNT};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_label_split_score() {
        let rows = (0..20)
            .map(|i| SensorRow::new(i.to_string(), "t", vec![3.0; REFERENCE_SENSOR_COUNT]))
            .collect();
        let table = SensorTable::from_rows(rows).unwrap();
        let labeler = DatasetLabeler::new(LabelingConfig::default()).unwrap();
        let dataset = labeler
            .label(&table, &mut StdRng::seed_from_u64(0))
            .unwrap();

        let split = train_test_split(dataset.samples(), &SplitConfig::default()).unwrap();
        assert_eq!(split.train.len() + split.test.len(), 20);

        let truth = split.test.label_values();
        assert_eq!(accuracy(&truth, &truth).unwrap(), 1.0);
    }
}
