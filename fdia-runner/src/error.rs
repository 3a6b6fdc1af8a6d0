// FDIA Runner - Detector experiments on sensor tables
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for the experiment runner

use std::path::PathBuf;
use thiserror::Error;

/// Runner errors
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for an experiment
    #[error("Invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Sensor table could not be loaded
    #[error("Failed to load {path}: {source}")]
    Table {
        path: PathBuf,
        #[source]
        source: fdia::TableError,
    },

    /// Labeling, splitting or persistence failure
    #[error(transparent)]
    Data(#[from] fdia::Error),

    /// Model building, fitting or scoring failure
    #[error("Model error: {0}")]
    Model(#[from] fdia_models::ModelError),

    /// Report could not be written
    #[error("Failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Report serialization failure
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<fdia::LabelingError> for RunnerError {
    fn from(e: fdia::LabelingError) -> Self {
        Self::Data(e.into())
    }
}

impl From<fdia::SplitError> for RunnerError {
    fn from(e: fdia::SplitError) -> Self {
        Self::Data(e.into())
    }
}

impl From<fdia::TableError> for RunnerError {
    fn from(e: fdia::TableError) -> Self {
        Self::Data(e.into())
    }
}

/// Result type for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;
