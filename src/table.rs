//! Sensor tables and CSV I/O
//!
//! A [`SensorTable`] holds the load-power readings of one dataset: every
//! row starts with a row index and a time value, followed by one reading
//! per consumer line. The leading columns are carried as text and never
//! enter a feature vector.

use crate::error::TableError;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// Number of non-sensor columns (row index, time) at the start of each row
pub const LEADING_COLUMNS: usize = 2;

/// Consumer sensor columns in the reference 14-bus dataset
pub const REFERENCE_SENSOR_COUNT: usize = 11;

/// One time step of sensor readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRow {
    /// Row index as found in the source file
    pub index: String,
    /// Time value as found in the source file
    pub time: String,
    /// Sensor readings, in column order
    pub readings: Vec<f64>,
}

impl SensorRow {
    /// Create a new row.
    pub fn new(index: impl Into<String>, time: impl Into<String>, readings: Vec<f64>) -> Self {
        Self {
            index: index.into(),
            time: time.into(),
            readings,
        }
    }

    /// Number of sensor readings.
    pub fn sensor_count(&self) -> usize {
        self.readings.len()
    }

    /// Feature vector of this row (the readings, without index and time).
    pub fn features(&self) -> &[f64] {
        &self.readings
    }
}

/// A non-empty table of sensor rows sharing one schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorTable {
    columns: Vec<String>,
    rows: Vec<SensorRow>,
}

impl SensorTable {
    /// Build a table from header names and rows.
    ///
    /// The header must name the two leading columns plus at least one
    /// sensor, and every row must carry one reading per sensor column.
    pub fn new(columns: Vec<String>, rows: Vec<SensorRow>) -> Result<Self, TableError> {
        if columns.len() <= LEADING_COLUMNS {
            return Err(TableError::TooFewColumns {
                line: 1,
                expected: LEADING_COLUMNS + 1,
                actual: columns.len(),
            });
        }
        if rows.is_empty() {
            return Err(TableError::Empty);
        }

        let expected = columns.len() - LEADING_COLUMNS;
        for (i, row) in rows.iter().enumerate() {
            if row.readings.len() != expected {
                return Err(TableError::RaggedRow {
                    line: i + 2,
                    expected: columns.len(),
                    actual: row.readings.len() + LEADING_COLUMNS,
                });
            }
        }

        Ok(Self { columns, rows })
    }

    /// Build a table with default header names (`index`, `time`, `0..n`).
    pub fn from_rows(rows: Vec<SensorRow>) -> Result<Self, TableError> {
        let width = rows.first().map(|r| r.readings.len()).unwrap_or(0);
        let mut columns = vec!["index".to_string(), "time".to_string()];
        columns.extend((0..width).map(|i| i.to_string()));
        Self::new(columns, rows)
    }

    /// Same header, new rows.
    pub fn with_rows(&self, rows: Vec<SensorRow>) -> Result<Self, TableError> {
        Self::new(self.columns.clone(), rows)
    }

    /// Import from a CSV file with a header row.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;
        Self::read(reader)
    }

    /// Import from any CSV source with a header row.
    pub fn from_reader<R: io::Read>(source: R) -> Result<Self, TableError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(source);
        Self::read(reader)
    }

    fn read<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, TableError> {
        let columns: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        if columns.len() <= LEADING_COLUMNS {
            return Err(TableError::TooFewColumns {
                line: 1,
                expected: LEADING_COLUMNS + 1,
                actual: columns.len(),
            });
        }

        let mut rows = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let record = result?;
            let line = record
                .position()
                .map_or(i + 2, |p| p.line() as usize);

            if record.len() < LEADING_COLUMNS + 1 {
                return Err(TableError::TooFewColumns {
                    line,
                    expected: columns.len(),
                    actual: record.len(),
                });
            }
            if record.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    line,
                    expected: columns.len(),
                    actual: record.len(),
                });
            }

            let mut readings = Vec::with_capacity(record.len() - LEADING_COLUMNS);
            for (column, raw) in columns.iter().zip(record.iter()).skip(LEADING_COLUMNS) {
                let value: f64 = raw.parse().map_err(|_| TableError::InvalidReading {
                    line,
                    column: column.clone(),
                    value: raw.to_string(),
                })?;
                if !value.is_finite() {
                    return Err(TableError::InvalidReading {
                        line,
                        column: column.clone(),
                        value: raw.to_string(),
                    });
                }
                readings.push(value);
            }

            rows.push(SensorRow::new(&record[0], &record[1], readings));
        }

        Self::new(columns, rows)
    }

    /// Export to a CSV file with the original header.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            let mut record = Vec::with_capacity(self.columns.len());
            record.push(row.index.clone());
            record.push(row.time.clone());
            record.extend(row.readings.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Header names, leading columns included.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Sensor column names.
    pub fn sensor_ids(&self) -> &[String] {
        &self.columns[LEADING_COLUMNS..]
    }

    /// Number of sensor columns.
    pub fn sensor_count(&self) -> usize {
        self.columns.len() - LEADING_COLUMNS
    }

    /// Get all rows.
    pub fn rows(&self) -> &[SensorRow] {
        &self.rows
    }

    /// Get one row.
    pub fn row(&self, index: usize) -> Option<&SensorRow> {
        self.rows.get(index)
    }

    /// Get number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Readings of one sensor column.
    pub fn column(&self, sensor: usize) -> Option<Vec<f64>> {
        if sensor >= self.sensor_count() {
            return None;
        }
        Some(self.rows.iter().map(|r| r.readings[sensor]).collect())
    }

    /// Calculate basic statistics for a sensor column.
    pub fn stats(&self, sensor: usize) -> Option<SensorStats> {
        let values = self.column(sensor)?;

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        // Population variance, as reported for the raw dataset.
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        Some(SensorStats {
            sensor_id: self.sensor_ids()[sensor].clone(),
            count,
            mean,
            variance,
            min,
            max,
        })
    }

    /// Statistics for every sensor column, in column order.
    pub fn column_stats(&self) -> Vec<SensorStats> {
        (0..self.sensor_count())
            .filter_map(|sensor| self.stats(sensor))
            .collect()
    }
}

/// Basic statistics for a sensor column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorStats {
    pub sensor_id: String,
    pub count: usize,
    pub mean: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
}

impl SensorStats {
    /// Standard deviation of the column.
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }
}
