//! ARIMA coefficient estimation.
//!
//! AR terms come from least squares on lagged values. MA terms use a
//! Hannan-Rissanen style iteration: innovations from the AR stage stand in for
//! the unobserved shocks, the joint regression on lagged values and lagged
//! innovations is refitted, and the innovations are recomputed recursively
//! until the coefficients settle. Seasonal terms are extra lags at multiples of
//! the period. Stationarity and invertibility are not enforced.

use crate::error::{ForecastError, Result};
use crate::models::arima::diff::Differenced;
use crate::models::arima::selector::{ArimaOrder, Selection};
use crate::utils::ols::{ols_fit, OLSResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration for the MA refinement loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Maximum joint-regression passes when MA terms are present.
    pub max_iterations: usize,
    /// Stop once the largest coefficient change falls below this.
    pub tolerance: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 8,
            tolerance: 1e-6,
        }
    }
}

impl EstimatorConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// A labelled model coefficient, e.g. `ar.L1` or `sma.L7`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub label: String,
    pub value: f64,
}

/// Lag and coefficient of one AR or MA term.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Term {
    lag: usize,
    coef: f64,
    seasonal: bool,
}

/// A fitted ARIMA model on the differenced scale.
#[derive(Debug, Clone)]
pub struct FittedArima {
    order: ArimaOrder,
    intercept: f64,
    ar_terms: Vec<Term>,
    ma_terms: Vec<Term>,
    differenced: Differenced,
    /// One innovation per differenced value; zero before the first fitted index.
    innovations: Vec<f64>,
    /// First differenced index with an in-sample prediction.
    start: usize,
    iterations: usize,
    converged: bool,
}

impl FittedArima {
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Non-seasonal AR coefficients (length p).
    pub fn ar_coefficients(&self) -> Vec<f64> {
        select(&self.ar_terms, false)
    }

    /// Non-seasonal MA coefficients (length q).
    pub fn ma_coefficients(&self) -> Vec<f64> {
        select(&self.ma_terms, false)
    }

    /// Seasonal AR coefficients (length P).
    pub fn seasonal_ar_coefficients(&self) -> Vec<f64> {
        select(&self.ar_terms, true)
    }

    /// Seasonal MA coefficients (length Q).
    pub fn seasonal_ma_coefficients(&self) -> Vec<f64> {
        select(&self.ma_terms, true)
    }

    /// All coefficients with their labels, intercept first.
    pub fn coefficients(&self) -> Vec<Coefficient> {
        let mut out = vec![Coefficient {
            label: "intercept".to_string(),
            value: self.intercept,
        }];
        for (prefix, terms) in [("ar", &self.ar_terms), ("ma", &self.ma_terms)] {
            for t in terms.iter() {
                let seasonal = if t.seasonal { "s" } else { "" };
                out.push(Coefficient {
                    label: format!("{seasonal}{prefix}.L{}", t.lag),
                    value: t.coef,
                });
            }
        }
        out
    }

    /// The differenced series the model was fitted on.
    pub fn differenced(&self) -> &Differenced {
        &self.differenced
    }

    /// In-sample one-step predictions on the differenced scale.
    pub fn fitted_values(&self) -> Vec<f64> {
        let w = self.differenced.values();
        (self.start..w.len())
            .map(|t| w[t] - self.innovations[t])
            .collect()
    }

    /// Observed minus predicted differenced values.
    pub fn residuals(&self) -> &[f64] {
        &self.innovations[self.start..]
    }

    /// Mean squared residual.
    pub fn residual_variance(&self) -> f64 {
        let r = self.residuals();
        if r.is_empty() {
            return 0.0;
        }
        r.iter().map(|e| e * e).sum::<f64>() / r.len() as f64
    }

    /// Joint-regression passes performed (1 without MA terms).
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// One-step prediction for the value following `values`, given the
    /// innovations aligned with `values`.
    pub(crate) fn predict_next(&self, values: &[f64], innovations: &[f64]) -> f64 {
        predict_at(
            self.intercept,
            &self.ar_terms,
            &self.ma_terms,
            values,
            innovations,
            values.len(),
        )
    }

    /// AR terms as `(lag, coefficient)`.
    pub(crate) fn ar_terms(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.ar_terms.iter().map(|t| (t.lag, t.coef))
    }

    /// MA terms as `(lag, coefficient)`.
    pub(crate) fn ma_terms(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.ma_terms.iter().map(|t| (t.lag, t.coef))
    }

    /// Innovations over the whole differenced series.
    pub(crate) fn innovations(&self) -> &[f64] {
        &self.innovations
    }
}

fn select(terms: &[Term], seasonal: bool) -> Vec<f64> {
    terms
        .iter()
        .filter(|t| t.seasonal == seasonal)
        .map(|t| t.coef)
        .collect()
}

fn predict_at(
    intercept: f64,
    ar: &[Term],
    ma: &[Term],
    values: &[f64],
    innovations: &[f64],
    t: usize,
) -> f64 {
    let ar_part: f64 = ar.iter().map(|term| term.coef * values[t - term.lag]).sum();
    let ma_part: f64 = ma.iter().map(|term| term.coef * innovations[t - term.lag]).sum();
    intercept + ar_part + ma_part
}

/// ARIMA coefficient estimator.
#[derive(Debug, Clone, Default)]
pub struct ArimaEstimator {
    config: EstimatorConfig,
}

impl ArimaEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Difference `series` according to `order` and fit it.
    pub fn fit(&self, series: &[f64], order: &ArimaOrder) -> Result<FittedArima> {
        order.validate()?;
        let differenced = order.differencer().apply(series)?;
        self.fit_differenced(differenced, order)
    }

    /// Fit a selected order, stepping down while the fit is ill-conditioned.
    ///
    /// Redundant AR and MA terms make the lag regression singular. Each failed
    /// order is replaced by [`ArimaOrder::reduced`] and the step is appended to
    /// the rationale; `selection` ends up holding the order actually fitted.
    pub fn fit_selection(&self, series: &[f64], selection: &mut Selection) -> Result<FittedArima> {
        loop {
            match self.fit(series, &selection.order) {
                Err(ForecastError::IllConditioned(reason)) => {
                    let Some(next) = selection.order.reduced() else {
                        return Err(ForecastError::IllConditioned(reason));
                    };
                    warn!(
                        from = %selection.order,
                        to = %next,
                        reason = %reason,
                        "ill-conditioned fit, stepping down"
                    );
                    selection.rationale.push_str(&format!(
                        "; {} ill-conditioned, stepped down to {next}",
                        selection.order
                    ));
                    selection.order = next;
                }
                result => return result,
            }
        }
    }

    /// Fit `order` to an already differenced series.
    pub fn fit_differenced(
        &self,
        differenced: Differenced,
        order: &ArimaOrder,
    ) -> Result<FittedArima> {
        order.validate()?;
        let w = differenced.values().to_vec();
        let m = w.len();

        let needed = order.num_params() + 1;
        if m < needed {
            return Err(ForecastError::InsufficientData { needed, got: m });
        }
        let needed = order.min_differenced_len();
        if m < needed {
            return Err(ForecastError::InsufficientData { needed, got: m });
        }

        let seasonal_period = order.seasonal.map(|s| s.period);
        let mk_terms = |lags: Vec<usize>| -> Vec<Term> {
            lags.into_iter()
                .map(|lag| Term {
                    lag,
                    coef: 0.0,
                    seasonal: seasonal_period.is_some_and(|s| lag >= s && lag % s == 0),
                })
                .collect()
        };
        let mut ar_terms = mk_terms(order.ar_lags());
        let mut ma_terms = mk_terms(order.ma_lags());

        let start = order.max_lag();
        let target = &w[start..];

        // AR stage
        let ar_columns: Vec<Vec<f64>> =
            ar_terms.iter().map(|t| lagged(&w, t.lag, start)).collect();
        let stage = ols_fit(target, &ar_columns)?;
        assign(&mut ar_terms, &stage.coefficients);
        let mut intercept = stage.intercept;

        let mut innovations = vec![0.0; m];
        for t in start..m {
            innovations[t] = w[t] - predict_at(intercept, &ar_terms, &[], &w, &innovations, t);
        }

        let mut iterations = 1;
        let mut converged = true;

        if !ma_terms.is_empty() {
            converged = false;
            let mut previous: Option<Vec<f64>> = None;
            iterations = 0;

            while iterations < self.config.max_iterations {
                iterations += 1;

                let mut columns = ar_columns.clone();
                columns.extend(ma_terms.iter().map(|t| lagged(&innovations, t.lag, start)));
                let fit = ols_fit(target, &columns)?;

                let (ar_part, ma_part) = fit.coefficients.split_at(ar_terms.len());
                assign(&mut ar_terms, ar_part);
                assign(&mut ma_terms, ma_part);
                intercept = fit.intercept;

                for t in start..m {
                    innovations[t] =
                        w[t] - predict_at(intercept, &ar_terms, &ma_terms, &w, &innovations, t);
                }
                if innovations.iter().any(|e| !e.is_finite()) {
                    return Err(ForecastError::IllConditioned(
                        "moving-average recursion diverged".to_string(),
                    ));
                }

                let current = flatten(&fit);
                let change = previous.as_ref().map_or(f64::INFINITY, |prev| {
                    prev.iter()
                        .zip(&current)
                        .map(|(a, b)| (a - b).abs())
                        .fold(0.0, f64::max)
                });
                previous = Some(current);

                if change < self.config.tolerance {
                    converged = true;
                    break;
                }
            }

            if !converged {
                warn!(
                    order = %order,
                    iterations,
                    "moving-average refinement did not converge"
                );
            }
        }

        debug!(
            order = %order,
            points = m,
            iterations,
            intercept,
            "arima fitted"
        );

        Ok(FittedArima {
            order: *order,
            intercept,
            ar_terms,
            ma_terms,
            differenced,
            innovations,
            start,
            iterations,
            converged,
        })
    }
}

/// Column of `values[t - lag]` for t in `start..len`.
fn lagged(values: &[f64], lag: usize, start: usize) -> Vec<f64> {
    (start..values.len()).map(|t| values[t - lag]).collect()
}

fn assign(terms: &mut [Term], coefficients: &[f64]) {
    for (term, &c) in terms.iter_mut().zip(coefficients) {
        term.coef = c;
    }
}

fn flatten(fit: &OLSResult) -> Vec<f64> {
    std::iter::once(fit.intercept)
        .chain(fit.coefficients.iter().copied())
        .collect()
}
