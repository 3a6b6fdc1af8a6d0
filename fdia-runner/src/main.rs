// FDIA Runner - Detector experiments on sensor tables
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # FDIA Runner
//!
//! Labels a min-power sensor table with injected attacks, trains the
//! classifier bank on it and prints held-out accuracies. A max-power table,
//! when given, is labeled the same way and scored by the trained models.
//!
//! ## Usage
//!
//! ```bash
//! # Full bank on the min-power table
//! fdia-runner --min-power LoadMinPower.csv
//!
//! # Two models, transfer to max power, JSON report
//! fdia-runner --min-power LoadMinPower.csv --max-power LoadMaxPower.csv \
//!     --models random_forest,cnn3 --report report.json
//! ```

mod config;
mod error;
mod pipeline;
mod report;

use clap::Parser;
use config::ExperimentConfig;
use fdia_models::ModelKind;
use pipeline::RunPaths;
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// FDIA detector experiments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Min-power sensor table (training and held-out rows)
    #[arg(long)]
    min_power: PathBuf,

    /// Max-power sensor table, scored by the models trained on min power
    #[arg(long)]
    max_power: Option<PathBuf>,

    /// JSON experiment config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed of the label stream, overrides the config
    #[arg(short, long)]
    seed: Option<u64>,

    /// Comma-separated models to run, overrides the config
    #[arg(short, long, value_delimiter = ',')]
    models: Option<Vec<ModelKind>>,

    /// Write a JSON report to this file
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Save labeled min-power features.csv and labels.csv into this directory
    #[arg(long)]
    save_features: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("FDIA Runner v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = execute(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn execute(args: Args) -> error::Result<()> {
    let mut config = match &args.config {
        Some(path) => ExperimentConfig::from_file(path)?,
        None => ExperimentConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(models) = args.models {
        config.bank.models = models;
    }

    let paths = RunPaths {
        min_power: args.min_power,
        max_power: args.max_power,
        save_features: args.save_features,
    };
    let report = pipeline::run(&config, &paths)?;

    for line in report.lines() {
        println!("{}", line);
    }
    if let Some(best) = report.held_out.best() {
        info!("Best held-out model: {} ({}%)", best.label(), best.percent);
    }

    if let Some(path) = &args.report {
        report.write_json(path)?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
