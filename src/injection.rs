//! False data injection into single sensor rows.
//!
//! The attacker modelled here does not know the per-sensor mean or
//! variance. For each attacked row it picks a handful of consumer lines
//! and under-reports their required power by a small Gaussian amount,
//! trying to get the supply to deliver less than it needs.

use crate::error::InjectionError;
use crate::table::{SensorRow, REFERENCE_SENSOR_COUNT};
use rand::seq::index;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// How sampled corruption magnitudes are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MagnitudePolicy {
    /// Use the Gaussian draw as is. A draw at or below zero leaves the
    /// reading unchanged or raises it.
    Raw,
    /// Redraw until the magnitude is strictly positive, so every attacked
    /// reading strictly decreases.
    #[default]
    PositiveOnly,
}

/// What happens when a corrupted reading drops below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FloorPolicy {
    /// Keep the negative value: the sensor reports an impossible reading.
    #[default]
    AllowNegative,
    /// Floor the corrupted reading at zero.
    ClampAtZero,
}

/// Injection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectionConfig {
    /// Fewest sensors attacked in a row (inclusive).
    pub min_targets: usize,
    /// Most sensors attacked in a row (exclusive).
    pub max_targets: usize,
    /// Sensor columns eligible for attack, counted from the first reading.
    pub sensor_count: usize,
    /// Mean of the subtracted amount.
    pub magnitude_mean: f64,
    /// Standard deviation of the subtracted amount.
    pub magnitude_std_dev: f64,
    /// Handling of non-positive draws.
    pub magnitude_policy: MagnitudePolicy,
    /// Handling of readings pushed below zero.
    pub floor_policy: FloorPolicy,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            min_targets: 2,
            max_targets: 6,
            sensor_count: REFERENCE_SENSOR_COUNT,
            magnitude_mean: 0.6,
            magnitude_std_dev: 0.15,
            magnitude_policy: MagnitudePolicy::PositiveOnly,
            floor_policy: FloorPolicy::AllowNegative,
        }
    }
}

impl InjectionConfig {
    /// Create a config with the reference constants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attacked sensor count range (`min..max`, max exclusive).
    pub fn with_targets(mut self, min: usize, max: usize) -> Self {
        self.min_targets = min;
        self.max_targets = max;
        self
    }

    /// Set the magnitude distribution.
    pub fn with_magnitude(mut self, mean: f64, std_dev: f64) -> Self {
        self.magnitude_mean = mean;
        self.magnitude_std_dev = std_dev;
        self
    }

    /// Set the magnitude policy.
    pub fn with_magnitude_policy(mut self, policy: MagnitudePolicy) -> Self {
        self.magnitude_policy = policy;
        self
    }

    /// Set the floor policy.
    pub fn with_floor_policy(mut self, policy: FloorPolicy) -> Self {
        self.floor_policy = policy;
        self
    }

    /// Check that every draw this config describes is possible.
    pub fn validate(&self) -> Result<(), InjectionError> {
        if self.min_targets == 0 {
            return Err(InjectionError::InvalidConfig(
                "min_targets must be at least 1".to_string(),
            ));
        }
        if self.max_targets <= self.min_targets {
            return Err(InjectionError::InvalidConfig(format!(
                "target range {}..{} is empty",
                self.min_targets, self.max_targets
            )));
        }
        if self.max_targets - 1 > self.sensor_count {
            return Err(InjectionError::InvalidConfig(format!(
                "cannot attack up to {} of {} sensors",
                self.max_targets - 1,
                self.sensor_count
            )));
        }
        if !self.magnitude_mean.is_finite()
            || !self.magnitude_std_dev.is_finite()
            || self.magnitude_std_dev < 0.0
        {
            return Err(InjectionError::InvalidConfig(format!(
                "invalid magnitude distribution N({}, {})",
                self.magnitude_mean, self.magnitude_std_dev
            )));
        }
        if self.magnitude_policy == MagnitudePolicy::PositiveOnly && self.magnitude_mean <= 0.0 {
            return Err(InjectionError::InvalidConfig(
                "positive-only magnitudes need a positive mean".to_string(),
            ));
        }
        Ok(())
    }
}

/// The randomized part of one attack: which sensors, by how much.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorruptionSpec {
    /// Attacked sensors, relative to the feature vector. Unique.
    pub indices: Vec<usize>,
    /// Amount subtracted from each attacked sensor, same order.
    pub magnitudes: Vec<f64>,
}

impl CorruptionSpec {
    /// Number of attacked sensors.
    pub fn target_count(&self) -> usize {
        self.indices.len()
    }

    /// Subtract the magnitudes from `readings` in place.
    pub fn apply(&self, readings: &mut [f64], floor: FloorPolicy) {
        for (&i, &m) in self.indices.iter().zip(&self.magnitudes) {
            let corrupted = readings[i] - m;
            readings[i] = match floor {
                FloorPolicy::AllowNegative => corrupted,
                FloorPolicy::ClampAtZero => corrupted.max(0.0),
            };
        }
    }
}

/// A corrupted copy of a row and the attack that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Injection {
    /// Row after corruption.
    pub row: SensorRow,
    /// Attack applied to it.
    pub spec: CorruptionSpec,
}

impl Injection {
    /// Feature-relative indices that were corrupted.
    pub fn indices(&self) -> &[usize] {
        &self.spec.indices
    }
}

/// Corrupts sensor rows with an injected randomness source.
#[derive(Debug, Clone)]
pub struct InjectionEngine {
    config: InjectionConfig,
    magnitude: Normal<f64>,
}

impl InjectionEngine {
    /// Create an engine, validating the config.
    pub fn new(config: InjectionConfig) -> Result<Self, InjectionError> {
        config.validate()?;
        let magnitude = Normal::new(config.magnitude_mean, config.magnitude_std_dev)
            .map_err(|e| InjectionError::InvalidConfig(e.to_string()))?;
        Ok(Self { config, magnitude })
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &InjectionConfig {
        &self.config
    }

    /// Draw an attack: target count, distinct targets, then magnitudes.
    pub fn draw_spec<R: Rng + ?Sized>(&self, rng: &mut R) -> CorruptionSpec {
        let count = rng.gen_range(self.config.min_targets..self.config.max_targets);
        let indices = index::sample(rng, self.config.sensor_count, count).into_vec();
        let magnitudes = (0..count).map(|_| self.draw_magnitude(rng)).collect();
        CorruptionSpec {
            indices,
            magnitudes,
        }
    }

    fn draw_magnitude<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self.config.magnitude_policy {
            MagnitudePolicy::Raw => self.magnitude.sample(rng),
            MagnitudePolicy::PositiveOnly => loop {
                let m = self.magnitude.sample(rng);
                if m > 0.0 {
                    break m;
                }
            },
        }
    }

    /// Check that a row can be attacked under this config.
    pub fn check_row(&self, row: &SensorRow) -> Result<(), InjectionError> {
        if row.readings.len() < self.config.sensor_count {
            return Err(InjectionError::RowTooShort {
                required: self.config.sensor_count,
                actual: row.readings.len(),
            });
        }
        if let Some(index) = row.readings.iter().position(|v| !v.is_finite()) {
            return Err(InjectionError::NonFiniteReading { index });
        }
        Ok(())
    }

    /// Corrupt a copy of `row`. The input row is left untouched.
    pub fn inject<R: Rng + ?Sized>(
        &self,
        row: &SensorRow,
        rng: &mut R,
    ) -> Result<Injection, InjectionError> {
        self.check_row(row)?;

        let spec = self.draw_spec(rng);
        let mut corrupted = row.clone();
        spec.apply(&mut corrupted.readings, self.config.floor_policy);

        Ok(Injection {
            row: corrupted,
            spec,
        })
    }
}
