//! Differencing utilities for ARIMA models.

use crate::error::{ForecastError, Result};
use crate::utils::stats::variance;
use serde::{Deserialize, Serialize};

/// Apply differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Differencing order (number of times to difference)
///
/// # Returns
/// The differenced series, `d` values shorter than the input.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    lag_difference(series, d, 1)
}

/// Apply seasonal differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Seasonal differencing order
/// * `period` - Seasonal period
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }
    lag_difference(series, d, period)
}

fn lag_difference(series: &[f64], d: usize, lag: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= lag {
            return Vec::new();
        }
        result = result
            .iter()
            .skip(lag)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Choose a regular differencing order with a variance-ratio rule.
///
/// Differences once more while the next difference has sample variance below
/// `ratio` times the current one, up to `max_d`.
pub fn select_differencing(series: &[f64], ratio: f64, max_d: usize) -> usize {
    let mut current = series.to_vec();
    let mut d = 0;

    while d < max_d {
        let next = difference(&current, 1);
        if next.len() < 2 || current.len() < 2 {
            break;
        }
        let var_current = variance(&current);
        let var_next = variance(&next);
        if !(var_current > 0.0) || var_next >= ratio * var_current {
            break;
        }
        current = next;
        d += 1;
    }

    d
}

/// One differencing pass and the series it was applied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffStep {
    /// Lag of the pass: 1 for regular, the period for seasonal.
    pub lag: usize,
    /// Series before this pass.
    pub input: Vec<f64>,
}

impl DiffStep {
    pub fn is_seasonal(&self) -> bool {
        self.lag > 1
    }
}

/// Differencing plan: `seasonal_order` passes at lag `period`, then `d`
/// regular passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Differencer {
    d: usize,
    seasonal_order: usize,
    period: usize,
}

impl Differencer {
    /// Regular differencing of order `d`.
    pub fn new(d: usize) -> Self {
        Self {
            d,
            seasonal_order: 0,
            period: 0,
        }
    }

    /// Add `order` seasonal passes at lag `period`, applied before the
    /// regular ones.
    pub fn with_seasonal(mut self, order: usize, period: usize) -> Self {
        self.seasonal_order = order;
        self.period = period;
        self
    }

    /// Total number of observations consumed by differencing.
    pub fn lost_points(&self) -> usize {
        self.d + self.seasonal_order * self.period
    }

    /// Difference `series`, recording every stage.
    pub fn apply(&self, series: &[f64]) -> Result<Differenced> {
        let lags = std::iter::repeat(self.period)
            .take(if self.period > 1 { self.seasonal_order } else { 0 })
            .chain(std::iter::repeat(1).take(self.d));

        let mut current = series.to_vec();
        let mut steps = Vec::new();
        for lag in lags {
            if current.len() <= lag {
                return Err(ForecastError::InsufficientData {
                    needed: self.lost_points() + 1,
                    got: series.len(),
                });
            }
            let next = lag_difference(&current, 1, lag);
            steps.push(DiffStep {
                lag,
                input: std::mem::replace(&mut current, next),
            });
        }

        Ok(Differenced {
            values: current,
            steps,
        })
    }
}

/// A differenced series together with what is needed to undo it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Differenced {
    values: Vec<f64>,
    steps: Vec<DiffStep>,
}

impl Differenced {
    /// The differenced values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Stages in the order they were applied.
    pub fn steps(&self) -> &[DiffStep] {
        &self.steps
    }

    /// Number of regular (lag 1) passes.
    pub fn regular_order(&self) -> usize {
        self.steps.iter().filter(|s| !s.is_seasonal()).count()
    }

    /// Rebuild the undifferenced series by cumulative summation from the
    /// recorded anchors.
    pub fn reconstruct(&self) -> Vec<f64> {
        let mut current = self.values.clone();
        for step in self.steps.iter().rev() {
            let mut level: Vec<f64> = step.input[..step.lag].to_vec();
            level.reserve(current.len());
            for &delta in &current {
                let base = level[level.len() - step.lag];
                level.push(base + delta);
            }
            current = level;
        }
        current
    }

    /// Integrate values that continue the differenced series back to the
    /// original scale, anchored at the last observed values of each stage.
    pub fn integrate_forecast(&self, forecast: &[f64]) -> Vec<f64> {
        let mut current = forecast.to_vec();
        for step in self.steps.iter().rev() {
            let mut extended = step.input.clone();
            extended.reserve(current.len());
            for &delta in &current {
                let base = extended[extended.len() - step.lag];
                extended.push(base + delta);
            }
            current = extended.split_off(step.input.len());
        }
        current
    }
}
