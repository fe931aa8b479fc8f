//! Recursive multi-step forecasting from a fitted ARIMA model.

use crate::error::{ForecastError, Result};
use crate::models::arima::estimator::FittedArima;
use crate::utils::stats::{quantile_normal, round2};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Shortest accepted horizon in days.
pub const MIN_HORIZON: usize = 1;

/// Default longest accepted horizon in days.
pub const DEFAULT_MAX_HORIZON: usize = 90;

/// One forecast step with the values used to compute it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastStep {
    /// 1-based step index.
    pub step: usize,
    pub date: NaiveDate,
    /// Forecast on the differenced scale.
    pub differenced_value: f64,
    /// Level after integration, before clamping and rounding.
    pub level: f64,
    /// Reported price: clamped at zero and rounded to 2 decimals.
    pub price: f64,
    /// Lower edge of the prediction band.
    pub lower: f64,
    /// Upper edge of the prediction band.
    pub upper: f64,
    /// The recurrence with its numeric inputs.
    pub formula: String,
}

/// Multi-step forecaster with horizon validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forecaster {
    max_horizon: usize,
    interval_level: f64,
}

impl Default for Forecaster {
    fn default() -> Self {
        Self {
            max_horizon: DEFAULT_MAX_HORIZON,
            interval_level: 0.95,
        }
    }
}

impl Forecaster {
    pub fn new(max_horizon: usize) -> Self {
        Self {
            max_horizon,
            ..Self::default()
        }
    }

    /// Coverage of the prediction band, in (0, 1).
    pub fn with_interval_level(mut self, level: f64) -> Self {
        self.interval_level = level;
        self
    }

    pub fn max_horizon(&self) -> usize {
        self.max_horizon
    }

    /// Reject horizons outside `[1, max_horizon]`.
    pub fn validate_horizon(&self, horizon: usize) -> Result<()> {
        if horizon < MIN_HORIZON || horizon > self.max_horizon {
            return Err(ForecastError::InvalidHorizon {
                horizon,
                min: MIN_HORIZON,
                max: self.max_horizon,
            });
        }
        Ok(())
    }

    /// Forecast `horizon` days after `last_date`.
    ///
    /// Future innovations are taken as zero. The band assumes the one-step
    /// residual variance grows linearly with the step.
    pub fn forecast(
        &self,
        model: &FittedArima,
        last_date: NaiveDate,
        horizon: usize,
    ) -> Result<Vec<ForecastStep>> {
        self.validate_horizon(horizon)?;

        let (diffs, formulas) = recurse(model, horizon, true);
        let levels = model.differenced().integrate_forecast(&diffs);
        if levels.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::IllConditioned(
                "forecast recursion diverged".to_string(),
            ));
        }

        let sigma = model.residual_variance().sqrt();
        let z = quantile_normal(0.5 + self.interval_level / 2.0);

        let mut steps = Vec::with_capacity(horizon);
        let rows = diffs.into_iter().zip(levels).zip(formulas);
        for (i, ((diff, level), mut formula)) in rows.enumerate() {
            let step = i + 1;
            let date = last_date
                .checked_add_signed(Duration::days(step as i64))
                .ok_or_else(|| {
                    ForecastError::InvalidParameter(format!(
                        "forecast date out of range after {last_date}"
                    ))
                })?;
            let half_width = if z.is_finite() {
                z * sigma * (step as f64).sqrt()
            } else {
                0.0
            };
            let _ = write!(formula, "; level = {level:.4}");

            steps.push(ForecastStep {
                step,
                date,
                differenced_value: diff,
                level,
                price: round2(level.max(0.0)),
                lower: round2((level - half_width).max(0.0)),
                upper: round2((level + half_width).max(0.0)),
                formula,
            });
        }

        Ok(steps)
    }
}

/// Forecast levels `horizon` steps ahead without validation, clamping or rounding.
pub fn project(model: &FittedArima, horizon: usize) -> Vec<f64> {
    let (diffs, _) = recurse(model, horizon, false);
    model.differenced().integrate_forecast(&diffs)
}

/// Extend the differenced series with zero future innovations.
fn recurse(model: &FittedArima, horizon: usize, explain: bool) -> (Vec<f64>, Vec<String>) {
    let mut values = model.differenced().values().to_vec();
    let mut innovations = model.innovations().to_vec();
    let mut diffs = Vec::with_capacity(horizon);
    let mut formulas = Vec::new();

    for _ in 0..horizon {
        let next = model.predict_next(&values, &innovations);
        if explain {
            formulas.push(render_formula(model, &values, &innovations, next));
        }
        values.push(next);
        innovations.push(0.0);
        diffs.push(next);
    }

    (diffs, formulas)
}

fn render_formula(model: &FittedArima, values: &[f64], innovations: &[f64], next: f64) -> String {
    let t = values.len();
    let mut symbolic = format!("w[{t}] = {:.4}", model.intercept());
    let mut numeric = format!("{:.4}", model.intercept());

    for (lag, coef) in model.ar_terms() {
        let _ = write!(symbolic, " + {coef:.4}*w[{}]", t - lag);
        let _ = write!(numeric, " + {coef:.4}*{:.4}", values[t - lag]);
    }
    for (lag, coef) in model.ma_terms() {
        let _ = write!(symbolic, " + {coef:.4}*e[{}]", t - lag);
        let _ = write!(numeric, " + {coef:.4}*{:.4}", innovations[t - lag]);
    }

    format!("{symbolic} = {numeric} = {next:.4}")
}
