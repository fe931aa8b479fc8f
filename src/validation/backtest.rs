//! Rolling-origin holdout backtesting of a selected order.
//!
//! The last `horizon` points of the series are held out, the order is refitted
//! on everything before them and forecast across the holdout; the origin then
//! moves back by one horizon for each further fold.

use crate::models::arima::{project, ArimaEstimator, ArimaOrder};
use crate::utils::metrics::{calculate_metrics, fit_metrics, AccuracyMetrics};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for holdout backtesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub enabled: bool,
    /// Shortest holdout horizon.
    pub min_horizon: usize,
    /// Longest holdout horizon.
    pub max_horizon: usize,
    /// Folds whose training part has no more than this many points are skipped.
    pub min_training_points: usize,
    /// Points required beyond one horizon before any fold is attempted.
    pub min_extra_points: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_horizon: 7,
            max_horizon: 45,
            min_training_points: 5,
            min_extra_points: 10,
        }
    }
}

impl BacktestConfig {
    /// Turn backtesting off.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Holdout horizon for a series of `n` points when `wanted` days are requested.
    pub fn horizon(&self, n: usize, wanted: usize) -> usize {
        let h = wanted.clamp(self.min_horizon, self.max_horizon.max(self.min_horizon));
        h.min(self.min_horizon.max(n / 4))
    }

    /// Number of folds for `n` points at holdout `horizon`.
    pub fn folds(&self, n: usize, horizon: usize) -> usize {
        if n >= horizon * 5 {
            4
        } else if n >= horizon * 4 {
            3
        } else if n >= horizon * 3 {
            2
        } else {
            1
        }
    }
}

/// Accuracy of one holdout fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    /// 0 for the most recent holdout.
    pub fold: usize,
    pub train_len: usize,
    pub metrics: AccuracyMetrics,
    /// In-sample AIC of the fold's fit.
    pub aic: f64,
}

/// Mean accuracy over the folds that could be evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub horizon: usize,
    pub folds_planned: usize,
    pub folds_used: usize,
    pub mae: f64,
    pub rmse: f64,
    /// Fraction, not percent.
    pub mape: f64,
    pub r_squared: f64,
    pub aic: f64,
    pub folds: Vec<FoldResult>,
}

/// Backtest `order` on `prices`.
///
/// Returns `None` when disabled, when the series is too short, or when no
/// fold could be fitted.
pub fn backtest(
    prices: &[f64],
    order: &ArimaOrder,
    estimator: &ArimaEstimator,
    wanted_horizon: usize,
    config: &BacktestConfig,
) -> Option<BacktestSummary> {
    if !config.enabled {
        return None;
    }

    let n = prices.len();
    let horizon = config.horizon(n, wanted_horizon);
    if n < horizon + config.min_extra_points {
        debug!(points = n, horizon, "backtest skipped: series too short");
        return None;
    }
    let folds_planned = config.folds(n, horizon);

    let mut results = Vec::with_capacity(folds_planned);
    for fold in 0..folds_planned {
        let Some(test_start) = n.checked_sub(horizon * (fold + 1)) else {
            break;
        };
        if test_start <= config.min_training_points {
            break;
        }
        let train = &prices[..test_start];
        let actual = &prices[test_start..test_start + horizon];

        let model = match estimator.fit(train, order) {
            Ok(model) => model,
            Err(err) => {
                debug!(fold, error = %err, "backtest fold skipped");
                continue;
            }
        };

        let fallback = train[train.len() - 1];
        let predicted: Vec<f64> = project(&model, horizon)
            .into_iter()
            .map(|p| if p.is_finite() && p >= 0.0 { p } else { fallback })
            .collect();

        let Ok(metrics) = calculate_metrics(actual, &predicted) else {
            continue;
        };
        let residuals = model.residuals();
        let aic = fit_metrics(
            &train[train.len() - residuals.len()..],
            residuals,
            order.num_params(),
        )
        .map_or(f64::NAN, |m| m.aic);

        results.push(FoldResult {
            fold,
            train_len: test_start,
            metrics,
            aic,
        });
    }

    if results.is_empty() {
        return None;
    }

    let used = results.len() as f64;
    let avg = |f: fn(&FoldResult) -> f64| results.iter().map(f).sum::<f64>() / used;
    let summary = BacktestSummary {
        horizon,
        folds_planned,
        folds_used: results.len(),
        mae: avg(|r| r.metrics.mae),
        rmse: avg(|r| r.metrics.rmse),
        mape: avg(|r| r.metrics.mape),
        r_squared: avg(|r| r.metrics.r_squared),
        aic: avg(|r| r.aic),
        folds: results,
    };

    debug!(
        horizon,
        folds = summary.folds_used,
        rmse = summary.rmse,
        "backtest completed"
    );
    Some(summary)
}
