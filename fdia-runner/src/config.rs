// FDIA Runner - Detector experiments on sensor tables
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Experiment configuration

use crate::error::{Result, RunnerError};
use fdia::{LabelingConfig, SplitConfig};
use fdia_models::BankConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything an experiment run depends on besides its input tables.
///
/// Every field has a default, so a config file only lists what it changes:
///
/// ```json
/// {
///   "seed": 7,
///   "split": { "test_fraction": 0.25 },
///   "bank": { "models": ["random_forest", "cnn3"], "random_forest": { "trees": 100 } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Seed of the label stream shared by the min- and max-power runs
    pub seed: u64,
    pub labeling: LabelingConfig,
    pub split: SplitConfig,
    pub bank: BankConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            labeling: LabelingConfig::default(),
            split: SplitConfig::default(),
            bank: BankConfig::default(),
        }
    }
}

impl ExperimentConfig {
    /// Load a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RunnerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| RunnerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdia_models::ModelKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"seed": 7, "split": {{"test_fraction": 0.25}}, "bank": {{"models": ["cnn3"]}}}}"#
        )
        .unwrap();

        let config = ExperimentConfig::from_file(file.path()).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.split.test_fraction, 0.25);
        assert_eq!(config.split.seed, 1);
        assert_eq!(config.bank.models, vec![ModelKind::Cnn3]);
        assert_eq!(config.labeling, LabelingConfig::default());
    }

    #[test]
    fn test_bad_files() {
        assert!(matches!(
            ExperimentConfig::from_file("/nonexistent/experiment.json"),
            Err(RunnerError::ConfigRead { .. })
        ));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"seed\": \"seven\"}}").unwrap();
        assert!(matches!(
            ExperimentConfig::from_file(file.path()),
            Err(RunnerError::ConfigParse { .. })
        ));
    }
}
