// FDIA Runner - Detector experiments on sensor tables
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Label, split, fit and score
//!
//! The min-power table is labeled and split into training and held-out
//! rows. The bank is fitted on the training rows and scored on the held-out
//! rows. A max-power table, when given, is labeled with the same stream
//! right after the min-power table and scored as a whole by the same models.

use crate::config::ExperimentConfig;
use crate::error::{Result, RunnerError};
use crate::report::{ExperimentReport, TableSummary, TransferRun};
use chrono::Utc;
use fdia::{train_test_split, DatasetLabeler, Samples, SensorTable};
use fdia_models::ModelBank;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File names used by `--save-features`.
pub const FEATURES_FILE: &str = "features.csv";
pub const LABELS_FILE: &str = "labels.csv";

/// Input and output locations of a run.
#[derive(Debug, Clone, Default)]
pub struct RunPaths {
    pub min_power: PathBuf,
    pub max_power: Option<PathBuf>,
    /// Directory receiving the labeled min-power features and labels
    pub save_features: Option<PathBuf>,
}

/// Load the tables named in `paths` and run the experiment.
pub fn run(config: &ExperimentConfig, paths: &RunPaths) -> Result<ExperimentReport> {
    let min_power = load_table(&paths.min_power)?;
    let max_power = paths.max_power.as_deref().map(load_table).transpose()?;

    run_tables(
        config,
        Source::new(&min_power, Some(&paths.min_power)),
        max_power
            .as_ref()
            .map(|t| Source::new(t, paths.max_power.as_deref())),
        paths.save_features.as_deref(),
    )
}

/// A table and where it was read from.
#[derive(Debug, Clone, Copy)]
pub struct Source<'a> {
    pub table: &'a SensorTable,
    pub path: Option<&'a Path>,
}

impl<'a> Source<'a> {
    pub fn new(table: &'a SensorTable, path: Option<&'a Path>) -> Self {
        Self { table, path }
    }
}

/// Run the experiment on tables already in memory.
pub fn run_tables(
    config: &ExperimentConfig,
    min_power: Source<'_>,
    max_power: Option<Source<'_>>,
    save_features: Option<&Path>,
) -> Result<ExperimentReport> {
    log_columns("min-power", min_power.table);

    let labeler = DatasetLabeler::new(config.labeling.clone())?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let dataset = labeler.label(min_power.table, &mut rng)?;
    if let Some(dir) = save_features {
        save_samples(dir, dataset.samples())?;
    }

    let split = train_test_split(dataset.samples(), &config.split)?;
    info!(
        "Split {} rows into {} training and {} held-out",
        dataset.len(),
        split.train.len(),
        split.test.len()
    );

    let bank = ModelBank::from_config(&config.bank)?;
    if bank.is_empty() {
        warn!("No models selected");
    }
    let trained = bank.fit(&split.train)?;
    let held_out = trained.evaluate(&split.test)?;

    let max_power = match max_power {
        Some(source) => {
            log_columns("max-power", source.table);
            let labeled = labeler.label(source.table, &mut rng)?;
            let report = trained.evaluate(labeled.samples())?;
            Some(TransferRun {
                table: TableSummary::new(source.path, source.table, &labeled),
                report,
            })
        }
        None => None,
    };

    Ok(ExperimentReport {
        generated_at: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        seed: config.seed,
        min_power: TableSummary::new(min_power.path, min_power.table, &dataset),
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        held_out,
        max_power,
    })
}

fn load_table(path: &Path) -> Result<SensorTable> {
    let table = SensorTable::from_csv(path).map_err(|source| RunnerError::Table {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        "Loaded {}: {} rows, {} sensors",
        path.display(),
        table.len(),
        table.sensor_count()
    );
    Ok(table)
}

fn log_columns(name: &str, table: &SensorTable) {
    let stats = table.column_stats();
    let means: Vec<String> = stats.iter().map(|s| format!("{:.4}", s.mean)).collect();
    let variances: Vec<String> = stats.iter().map(|s| format!("{:.4}", s.variance)).collect();
    info!("{} column means: [{}]", name, means.join(", "));
    info!("{} column variances: [{}]", name, variances.join(", "));
}

/// Write `features.csv` and `labels.csv` into `dir`, creating it if needed.
pub fn save_samples(dir: &Path, samples: &Samples) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(fdia::TableError::from)?;
    samples.save_csv(dir.join(FEATURES_FILE), dir.join(LABELS_FILE))?;
    info!("Saved {} labeled rows to {}", samples.len(), dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdia::{Samples, SensorRow, REFERENCE_SENSOR_COUNT};
    use fdia_models::{BankConfig, ModelKind};
    use rand::Rng;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn table(rows: usize, seed: u64) -> SensorTable {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows = (0..rows)
            .map(|i| {
                let readings = (0..REFERENCE_SENSOR_COUNT)
                    .map(|s| 30.0 + s as f64 + rng.gen_range(-0.05..0.05))
                    .collect();
                SensorRow::new(i.to_string(), format!("{}:00", i), readings)
            })
            .collect();
        SensorTable::from_rows(rows).unwrap()
    }

    fn fast_config() -> ExperimentConfig {
        ExperimentConfig {
            bank: BankConfig::default()
                .with_models([ModelKind::DecisionTree, ModelKind::Knn]),
            ..Default::default()
        }
    }

    #[test]
    fn test_run_tables() {
        let min = table(100, 1);
        let max = table(50, 2);
        let report = run_tables(
            &fast_config(),
            Source::new(&min, None),
            Some(Source::new(&max, None)),
            None,
        )
        .unwrap();

        assert_eq!(report.train_rows, 70);
        assert_eq!(report.test_rows, 30);
        assert_eq!(report.held_out.scores.len(), 2);
        assert_eq!(report.min_power.columns.len(), REFERENCE_SENSOR_COUNT);

        let transfer = report.max_power.as_ref().unwrap();
        assert_eq!(transfer.report.rows, 50);
        assert_eq!(transfer.table.rows, 50);

        let lines = report.lines();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Accuracy of Decision Tree: "));
        assert!(lines[3].starts_with("Accuracy of KNN on Max Power Data: "));
    }

    #[test]
    fn test_same_seed_same_labels() {
        let min = table(80, 3);
        let config = fast_config();
        let a = run_tables(&config, Source::new(&min, None), None, None).unwrap();
        let b = run_tables(&config, Source::new(&min, None), None, None).unwrap();
        assert_eq!(a.min_power, b.min_power);
        assert_eq!(a.held_out.scores[0].accuracy, b.held_out.scores[0].accuracy);
    }

    #[test]
    fn test_save_features() {
        let dir = tempdir().unwrap();
        let min = table(40, 4);
        let out = dir.path().join("arrays");
        run_tables(&fast_config(), Source::new(&min, None), None, Some(&out)).unwrap();

        let reloaded = Samples::load_csv(out.join(FEATURES_FILE), out.join(LABELS_FILE)).unwrap();
        assert_eq!(reloaded.len(), 40);
        assert_eq!(reloaded.feature_width(), REFERENCE_SENSOR_COUNT);
    }

    #[test]
    fn test_run_from_files_and_report() {
        let mut csv = NamedTempFile::new().unwrap();
        writeln!(csv, ",Time,1,2,3,4,5,6,7,8,9,10,11").unwrap();
        for row in table(60, 5).rows() {
            let readings: Vec<String> = row.readings.iter().map(|v| v.to_string()).collect();
            writeln!(csv, "{},{},{}", row.index, row.time, readings.join(",")).unwrap();
        }
        csv.flush().unwrap();

        let paths = RunPaths {
            min_power: csv.path().to_path_buf(),
            ..Default::default()
        };
        let report = run(&fast_config(), &paths).unwrap();
        assert_eq!(
            report.min_power.source.as_deref(),
            Some(csv.path().display().to_string().as_str())
        );

        let dir = tempdir().unwrap();
        let out = dir.path().join("report.json");
        report.write_json(&out).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        let parsed: ExperimentReport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.seed, report.seed);
        assert_eq!(parsed.test_rows, 18);
        assert_eq!(parsed.lines(), report.lines());
    }

    #[test]
    fn test_missing_table() {
        let paths = RunPaths {
            min_power: PathBuf::from("/nonexistent/LoadMinPower.csv"),
            ..Default::default()
        };
        assert!(matches!(
            run(&fast_config(), &paths),
            Err(RunnerError::Table { .. })
        ));
    }
}
