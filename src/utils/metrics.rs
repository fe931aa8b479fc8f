//! Fit-quality and holdout accuracy metrics.

use crate::error::{ForecastError, Result};
use crate::utils::stats::{round2, round4};
use serde::{Deserialize, Serialize};

/// Smallest mean squared residual used inside the AIC logarithm.
const MIN_RESIDUAL_VARIANCE: f64 = 1e-12;

/// In-sample fit quality of a fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitMetrics {
    /// Coefficient of determination on the level scale.
    pub r_squared: f64,
    /// Mean Absolute Error.
    pub mae: f64,
    /// Root Mean Squared Error.
    pub rmse: f64,
    /// `n·ln(SSE/n) + 2k`.
    pub aic: f64,
}

impl FitMetrics {
    /// Presentation copy: 4 decimals for r_squared/aic, 2 for mae/rmse.
    pub fn rounded(&self) -> Self {
        Self {
            r_squared: round4(self.r_squared),
            mae: round2(self.mae),
            rmse: round2(self.rmse),
            aic: round4(self.aic),
        }
    }
}

/// Compute fit metrics from residuals.
///
/// # Arguments
/// * `actual` - Observed values aligned with `residuals`
/// * `residuals` - One-step-ahead in-sample errors
/// * `num_params` - Parameter count k used in the AIC penalty
pub fn fit_metrics(actual: &[f64], residuals: &[f64], num_params: usize) -> Result<FitMetrics> {
    if residuals.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if actual.len() != residuals.len() {
        return Err(ForecastError::InvalidParameter(format!(
            "expected {} actual values, got {}",
            residuals.len(),
            actual.len()
        )));
    }

    let n = residuals.len() as f64;
    let sse: f64 = residuals.iter().map(|e| e * e).sum();
    let mae = residuals.iter().map(|e| e.abs()).sum::<f64>() / n;
    let rmse = (sse / n).sqrt();

    let mean_actual = actual.iter().sum::<f64>() / n;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
    // sums of squares below solver round-off count as zero
    let negligible = MIN_RESIDUAL_VARIANCE * n * mean_actual.powi(2).max(1.0);
    let r_squared = if ss_tot <= negligible {
        if sse <= negligible {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - sse / ss_tot
    };

    let aic = n * (sse / n).max(MIN_RESIDUAL_VARIANCE).ln() + 2.0 * num_params as f64;

    Ok(FitMetrics {
        r_squared,
        mae,
        rmse,
        aic,
    })
}

/// Out-of-sample accuracy of a forecast against held-out actuals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub mae: f64,
    pub rmse: f64,
    /// Mean absolute percentage error as a fraction, over non-zero actuals.
    pub mape: f64,
    pub r_squared: f64,
}

/// Calculate accuracy metrics between actual and predicted values.
///
/// Non-finite or negative predictions are scored as zero.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if actual.len() != predicted.len() {
        return Err(ForecastError::InvalidParameter(format!(
            "expected {} predictions, got {}",
            actual.len(),
            predicted.len()
        )));
    }

    let n = actual.len() as f64;
    let mean_actual = actual.iter().sum::<f64>() / n;

    let mut sum_abs = 0.0;
    let mut sum_sq = 0.0;
    let mut ss_tot = 0.0;
    let mut sum_ape = 0.0;
    let mut ape_count = 0usize;

    for (&a, &p) in actual.iter().zip(predicted) {
        let p = if p.is_finite() { p.max(0.0) } else { 0.0 };
        let e = a - p;
        sum_abs += e.abs();
        sum_sq += e * e;
        ss_tot += (a - mean_actual).powi(2);
        if a.abs() > 1e-9 {
            sum_ape += (e / a).abs();
            ape_count += 1;
        }
    }

    let r_squared = if ss_tot <= 1e-12 {
        0.0
    } else {
        1.0 - sum_sq / ss_tot
    };

    Ok(AccuracyMetrics {
        mae: sum_abs / n,
        rmse: (sum_sq / n).sqrt(),
        mape: if ape_count == 0 {
            0.0
        } else {
            sum_ape / ape_count as f64
        },
        r_squared: if r_squared.is_finite() { r_squared } else { 0.0 },
    })
}
