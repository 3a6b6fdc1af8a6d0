//! Error types for FDIA
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias for FDIA operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for FDIA operations
#[derive(Error, Debug)]
pub enum Error {
    /// Sensor table error
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Injection error
    #[error("Injection error: {0}")]
    Injection(#[from] InjectionError),

    /// Labeling error
    #[error("Labeling error: {0}")]
    Labeling(#[from] LabelingError),

    /// Train/test split error
    #[error("Split error: {0}")]
    Split(#[from] SplitError),

    /// Metrics error
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),
}

/// Errors while loading or building a sensor table
#[derive(Error, Debug)]
pub enum TableError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Table has no data rows
    #[error("Empty table")]
    Empty,

    /// Row narrower than the schema requires
    #[error("Line {line}: expected at least {expected} columns, got {actual}")]
    TooFewColumns {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// Row width differs from the header
    #[error("Line {line}: expected {expected} columns, got {actual}")]
    RaggedRow {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// Reading is not a finite number
    #[error("Line {line}, column {column}: invalid reading '{value}'")]
    InvalidReading {
        line: usize,
        column: String,
        value: String,
    },
}

/// Errors raised by the injection engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InjectionError {
    /// Row does not carry enough sensor readings
    #[error("Row has {actual} sensor readings, at least {required} required")]
    RowTooShort { required: usize, actual: usize },

    /// Row carries a NaN or infinite reading
    #[error("Non-finite reading at sensor index {index}")]
    NonFiniteReading { index: usize },

    /// Injection configuration is unusable
    #[error("Invalid injection config: {0}")]
    InvalidConfig(String),
}

/// Errors raised by the dataset labeler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LabelingError {
    /// Nothing to label
    #[error("Cannot label an empty table")]
    EmptyTable,

    /// Corruption probability outside [0, 1]
    #[error("Corruption probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),

    /// Row could not be corrupted
    #[error("Row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: InjectionError,
    },
}

/// Errors raised while splitting a dataset
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplitError {
    /// Test fraction outside (0, 1)
    #[error("Test fraction must be within (0, 1), got {0}")]
    InvalidFraction(f64),

    /// One of the partitions would be empty
    #[error("Split of {rows} rows leaves an empty partition (test={test}, train={train})")]
    EmptyPartition {
        rows: usize,
        test: usize,
        train: usize,
    },
}

/// Errors raised by metric computations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// Truth and prediction lengths differ
    #[error("Length mismatch: {truth} labels vs {predicted} predictions")]
    LengthMismatch { truth: usize, predicted: usize },

    /// No labels to score
    #[error("Cannot score an empty prediction set")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Table(TableError::InvalidReading {
            line: 7,
            column: "4".to_string(),
            value: "abc".to_string(),
        });
        let msg = format!("{}", err);
        assert!(msg.contains("Line 7"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_error_conversion() {
        let injection_err = InjectionError::RowTooShort {
            required: 11,
            actual: 3,
        };
        let err: Error = injection_err.into();
        assert!(matches!(err, Error::Injection(_)));
    }

    #[test]
    fn test_labeling_error_keeps_source() {
        let err = LabelingError::Row {
            row: 4,
            source: InjectionError::NonFiniteReading { index: 2 },
        };
        assert!(format!("{}", err).contains("Row 4"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
