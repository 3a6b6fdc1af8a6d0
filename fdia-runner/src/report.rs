// FDIA Runner - Detector experiments on sensor tables
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Experiment report

use crate::error::{Result, RunnerError};
use chrono::{DateTime, Utc};
use fdia::{LabeledDataset, SensorStats, SensorTable};
use fdia_models::BankReport;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Shape and labeling outcome of one input table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Where the table came from, when read from disk
    pub source: Option<String>,
    pub rows: usize,
    /// Rows the labeler corrupted
    pub tampered: usize,
    /// Per-sensor statistics of the untouched table
    pub columns: Vec<SensorStats>,
}

impl TableSummary {
    pub fn new(source: Option<&Path>, table: &SensorTable, dataset: &LabeledDataset) -> Self {
        Self {
            source: source.map(|p| p.display().to_string()),
            rows: table.len(),
            tampered: dataset.tampered_count(),
            columns: table.column_stats(),
        }
    }
}

/// Scores of the trained bank on the labeled max-power table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRun {
    pub table: TableSummary,
    pub report: BankReport,
}

/// Full record of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub generated_at: DateTime<Utc>,
    pub version: String,
    pub seed: u64,
    pub min_power: TableSummary,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Scores on the held-out split of the min-power table
    pub held_out: BankReport,
    pub max_power: Option<TransferRun>,
}

impl ExperimentReport {
    /// Console lines, held-out scores first.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.held_out.lines();
        if let Some(run) = &self.max_power {
            lines.extend(run.report.scores.iter().map(|s| {
                format!(
                    "Accuracy of {} on Max Power Data: {}%",
                    s.label(),
                    s.percent
                )
            }));
        }
        lines
    }

    /// Write as pretty-printed JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| RunnerError::Report {
            path: path.to_path_buf(),
            source,
        })
    }
}
