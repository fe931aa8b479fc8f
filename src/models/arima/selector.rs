//! Heuristic ARIMA order selection.
//!
//! Orders are identified from variance ratios and the sample ACF/PACF of the
//! differenced series rather than by fitting a grid of candidate models, so the
//! selection is cheap and fully deterministic.

use crate::error::{ForecastError, Result};
use crate::features::autocorrelation::{autocorrelation, partial_autocorrelation};
use crate::models::arima::diff::{difference, seasonal_difference, select_differencing, Differencer};
use crate::utils::stats::{population_variance, variance};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Seasonal part of an order: (P, D, Q) at period s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalOrder {
    /// Seasonal AR order (P).
    pub p: usize,
    /// Seasonal differencing order (D).
    pub d: usize,
    /// Seasonal MA order (Q).
    pub q: usize,
    /// Seasonal period (s > 1).
    pub period: usize,
}

/// ARIMA(p, d, q) order with an optional seasonal (P, D, Q)\[s\] part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// AR order.
    pub p: usize,
    /// Differencing order.
    pub d: usize,
    /// MA order.
    pub q: usize,
    pub seasonal: Option<SeasonalOrder>,
}

impl ArimaOrder {
    /// Non-seasonal order.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            seasonal: None,
        }
    }

    /// Attach a seasonal part. The period must exceed 1 and both `p` and `q`.
    pub fn with_seasonal(mut self, p: usize, d: usize, q: usize, period: usize) -> Result<Self> {
        self.seasonal = Some(SeasonalOrder { p, d, q, period });
        self.validate()?;
        Ok(self)
    }

    /// Check the order invariants.
    pub fn validate(&self) -> Result<()> {
        if let Some(s) = self.seasonal {
            if s.period < 2 {
                return Err(ForecastError::InvalidParameter(format!(
                    "seasonal period must be greater than 1, got {}",
                    s.period
                )));
            }
            if s.period <= self.p.max(self.q) {
                return Err(ForecastError::InvalidParameter(format!(
                    "seasonal period {} overlaps the non-seasonal lags of {}",
                    s.period, self
                )));
            }
        }
        Ok(())
    }

    pub fn is_seasonal(&self) -> bool {
        self.seasonal.is_some()
    }

    /// Number of AR and MA coefficients, seasonal included.
    pub fn num_params(&self) -> usize {
        let seasonal = self.seasonal.map_or(0, |s| s.p + s.q);
        self.p + self.q + seasonal
    }

    /// AR lags: 1..=p followed by s, 2s, ..., Ps.
    pub fn ar_lags(&self) -> Vec<usize> {
        let mut lags: Vec<usize> = (1..=self.p).collect();
        if let Some(s) = self.seasonal {
            lags.extend((1..=s.p).map(|k| k * s.period));
        }
        lags
    }

    /// MA lags: 1..=q followed by s, 2s, ..., Qs.
    pub fn ma_lags(&self) -> Vec<usize> {
        let mut lags: Vec<usize> = (1..=self.q).collect();
        if let Some(s) = self.seasonal {
            lags.extend((1..=s.q).map(|k| k * s.period));
        }
        lags
    }

    /// Largest lag entering the recurrence.
    pub fn max_lag(&self) -> usize {
        self.ar_lags()
            .into_iter()
            .chain(self.ma_lags())
            .max()
            .unwrap_or(0)
    }

    /// Differencing plan for this order.
    pub fn differencer(&self) -> Differencer {
        let diff = Differencer::new(self.d);
        match self.seasonal {
            Some(s) => diff.with_seasonal(s.d, s.period),
            None => diff,
        }
    }

    /// Minimum differenced length the estimator accepts.
    ///
    /// The lag regression needs more rows than coefficients (intercept
    /// included) after the first `max_lag` values are consumed.
    pub fn min_differenced_len(&self) -> usize {
        self.max_lag() + self.num_params() + 1
    }

    /// Minimum raw series length for this order.
    pub fn min_series_len(&self) -> usize {
        self.differencer().lost_points() + self.min_differenced_len()
    }

    /// The next smaller order, keeping the differencing.
    ///
    /// Removes one MA term, else one AR term, else one seasonal MA term, else
    /// one seasonal AR term. `None` once only differencing is left.
    pub fn reduced(&self) -> Option<Self> {
        let mut next = *self;
        if next.q > 0 {
            next.q -= 1;
        } else if next.p > 0 {
            next.p -= 1;
        } else {
            let s = next.seasonal.as_mut()?;
            if s.q > 0 {
                s.q -= 1;
            } else if s.p > 0 {
                s.p -= 1;
            } else {
                return None;
            }
        }
        if next.seasonal.is_some_and(|s| s.p + s.d + s.q == 0) {
            next.seasonal = None;
        }
        Some(next)
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.seasonal {
            Some(s) => write!(
                f,
                "SARIMA({},{},{})({},{},{})[{}]",
                self.p, self.d, self.q, s.p, s.d, s.q, s.period
            ),
            None => write!(f, "ARIMA({},{},{})", self.p, self.d, self.q),
        }
    }
}

/// Configuration for order selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Maximum AR order.
    pub max_p: usize,
    /// Maximum differencing order.
    pub max_d: usize,
    /// Maximum MA order.
    pub max_q: usize,
    /// Another difference is taken while it shrinks variance below this ratio.
    pub variance_ratio: f64,
    /// z-value of the ±z/√n significance band for ACF/PACF.
    pub significance: f64,
    /// Whether to look for a seasonal period at all.
    pub detect_seasonality: bool,
    /// Candidate seasonal periods in days.
    pub seasonal_periods: Vec<usize>,
    /// ACF at the seasonal lag must exceed this.
    pub seasonal_threshold: f64,
    /// Seasonal differencing is used when it shrinks variance below this ratio.
    pub seasonal_variance_ratio: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            max_p: 2,
            max_d: 2,
            max_q: 2,
            variance_ratio: 0.9,
            significance: 1.96,
            detect_seasonality: true,
            seasonal_periods: vec![7, 12, 30],
            seasonal_threshold: 0.5,
            seasonal_variance_ratio: 0.7,
        }
    }
}

impl SelectorConfig {
    /// Set maximum non-seasonal orders.
    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    /// Set the candidate seasonal periods.
    pub fn with_seasonal_periods(mut self, periods: Vec<usize>) -> Self {
        self.seasonal_periods = periods;
        self
    }

    /// Never select a seasonal part.
    pub fn without_seasonality(mut self) -> Self {
        self.detect_seasonality = false;
        self
    }
}

/// A selected order and a human-readable account of how it was chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub order: ArimaOrder,
    pub rationale: String,
}

/// Deterministic ARIMA order selector.
#[derive(Debug, Clone, Default)]
pub struct ParameterSelector {
    config: SelectorConfig,
}

impl ParameterSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Select an order for the undifferenced `series`.
    ///
    /// The returned order always fits the series length when any order does;
    /// otherwise it is the smallest order, and estimation reports the shortfall.
    pub fn select(&self, series: &[f64]) -> Result<Selection> {
        let n = series.len();
        if n < 2 {
            return Err(ForecastError::InsufficientData { needed: 2, got: n });
        }

        let cfg = &self.config;
        let mut notes = Vec::new();

        let d = select_differencing(series, cfg.variance_ratio, cfg.max_d);
        let mut working = difference(series, d);
        notes.push(differencing_note(series, &working, d));

        let mut seasonal = None;
        if cfg.detect_seasonality {
            if let Some((period, strength)) = self.detect_period(&working) {
                let cap_d = self.seasonal_differencing(&working, period);
                working = seasonal_difference(&working, cap_d, period);
                notes.push(format!(
                    "seasonal period {period} (ACF {strength:.3}), D={cap_d}, P=1, Q=0"
                ));
                seasonal = Some(SeasonalOrder {
                    p: 1,
                    d: cap_d,
                    q: 0,
                    period,
                });
            } else {
                notes.push("no seasonal period detected".to_string());
            }
        }

        let threshold = if working.is_empty() {
            f64::INFINITY
        } else {
            cfg.significance / (working.len() as f64).sqrt()
        };
        let p = leading_significant(cfg.max_p, threshold, |k| {
            partial_autocorrelation(&working, k)
        });
        let mut q = leading_significant(cfg.max_q, threshold, |k| autocorrelation(&working, k));
        notes.push(format!(
            "p={p} from PACF, q={q} from ACF (band ±{threshold:.3})"
        ));
        if p > 0 && q > 1 {
            q = 1;
            notes.push("q capped at 1 alongside AR terms".to_string());
        }

        let mut order = ArimaOrder {
            p,
            d,
            q,
            seasonal: seasonal.filter(|s| s.period > p.max(q)),
        };

        let seasonal_floor = ArimaOrder::new(0, d, 0);
        if let Some(s) = order.seasonal {
            let floor = ArimaOrder {
                seasonal: Some(s),
                ..seasonal_floor
            };
            if n < floor.min_series_len() {
                order.seasonal = None;
                notes.push("seasonal terms dropped: series too short".to_string());
            }
        }

        let requested = (order.p, order.q);
        while n < order.min_series_len() && order.p + order.q > 0 {
            if order.p > order.q {
                order.p -= 1;
            } else {
                order.q -= 1;
            }
        }
        if (order.p, order.q) != requested {
            notes.push(format!(
                "reduced to p={}, q={} to fit {n} points",
                order.p, order.q
            ));
        }

        debug!(order = %order, points = n, "order selected");
        Ok(Selection {
            order,
            rationale: notes.join("; "),
        })
    }

    /// Strongest candidate period with enough data and a high enough ACF.
    fn detect_period(&self, values: &[f64]) -> Option<(usize, f64)> {
        self.config
            .seasonal_periods
            .iter()
            .filter(|&&s| s > 1 && values.len() >= 2 * s)
            .filter_map(|&s| {
                let r = autocorrelation(values, s);
                (r > self.config.seasonal_threshold).then_some((s, r))
            })
            .fold(None, |best: Option<(usize, f64)>, cand| match best {
                Some(b) if b.1 >= cand.1 => Some(b),
                _ => Some(cand),
            })
    }

    /// Seasonal differencing order from the variance reduction at lag `period`.
    fn seasonal_differencing(&self, values: &[f64], period: usize) -> usize {
        let diffs = seasonal_difference(values, 1, period);
        if diffs.is_empty() {
            return 0;
        }
        let ratio = self.config.seasonal_variance_ratio;
        if population_variance(&diffs) < population_variance(values) * ratio {
            1
        } else {
            0
        }
    }
}

fn leading_significant<F>(max_lag: usize, threshold: f64, coef: F) -> usize
where
    F: Fn(usize) -> f64,
{
    (1..=max_lag)
        .take_while(|&k| {
            let r = coef(k);
            r.is_finite() && r.abs() > threshold
        })
        .count()
}

fn differencing_note(series: &[f64], differenced: &[f64], d: usize) -> String {
    if d == 0 {
        return "d=0: differencing does not reduce variance".to_string();
    }
    format!(
        "d={d}: variance {:.4} -> {:.4}",
        variance(series),
        variance(differenced)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ar1(n: usize, phi: f64, seed: u64) -> Vec<f64> {
        let mut state = seed;
        let mut values = vec![10.0];
        for i in 1..n {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let shock = (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
            values.push(10.0 + phi * (values[i - 1] - 10.0) + shock);
        }
        values
    }

    #[test]
    fn order_lags_and_requirements() {
        let order = ArimaOrder::new(2, 1, 1).with_seasonal(1, 1, 1, 7).unwrap();
        assert_eq!(order.ar_lags(), vec![1, 2, 7]);
        assert_eq!(order.ma_lags(), vec![1, 7]);
        assert_eq!(order.max_lag(), 7);
        assert_eq!(order.num_params(), 5);
        assert_eq!(order.min_differenced_len(), 13);
        assert_eq!(order.min_series_len(), 21);
        assert_eq!(order.to_string(), "SARIMA(2,1,1)(1,1,1)[7]");
        assert_eq!(ArimaOrder::new(1, 0, 0).to_string(), "ARIMA(1,0,0)");
    }

    #[test]
    fn reduction_drops_q_then_p_then_seasonal_terms() {
        let mut order = ArimaOrder::new(2, 1, 1).with_seasonal(1, 0, 1, 7).unwrap();
        let mut chain = vec![order.to_string()];
        while let Some(next) = order.reduced() {
            chain.push(next.to_string());
            order = next;
        }
        assert_eq!(
            chain,
            vec![
                "SARIMA(2,1,1)(1,0,1)[7]",
                "SARIMA(2,1,0)(1,0,1)[7]",
                "SARIMA(1,1,0)(1,0,1)[7]",
                "SARIMA(0,1,0)(1,0,1)[7]",
                "SARIMA(0,1,0)(1,0,0)[7]",
                "ARIMA(0,1,0)",
            ]
        );
    }

    #[test]
    fn reduction_keeps_seasonal_differencing() {
        let order = ArimaOrder::new(0, 0, 0).with_seasonal(1, 1, 0, 7).unwrap();
        let next = order.reduced().unwrap();
        assert_eq!(next.to_string(), "SARIMA(0,0,0)(0,1,0)[7]");
        assert!(next.reduced().is_none());
        assert!(ArimaOrder::new(0, 2, 0).reduced().is_none());
    }

    #[test]
    fn order_rejects_bad_period() {
        assert!(ArimaOrder::new(0, 1, 0).with_seasonal(1, 0, 0, 1).is_err());
        let err = ArimaOrder::new(2, 0, 0)
            .with_seasonal(1, 0, 0, 2)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn linear_series_needs_one_difference() {
        let series: Vec<f64> = (0..30).map(|i| 10.0 + i as f64).collect();
        let selection = ParameterSelector::default().select(&series).unwrap();
        assert_eq!(selection.order, ArimaOrder::new(0, 1, 0));
        assert!(selection.rationale.contains("d=1"));
    }

    #[test]
    fn selection_is_deterministic() {
        let series = ar1(120, 0.6, 7);
        let selector = ParameterSelector::default();
        let first = selector.select(&series).unwrap();
        let second = selector.select(&series).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn ar_process_gets_ar_terms() {
        let series = ar1(200, 0.3, 42);
        let order = ParameterSelector::default().select(&series).unwrap().order;
        assert_eq!(order.d, 0);
        assert!(order.p >= 1);
        assert!(order.q <= 1);
    }

    #[test]
    fn weekly_pattern_is_seasonal() {
        let pattern = [0.0, 3.0, -2.0, 5.0, 1.0, -4.0, 2.0];
        let series: Vec<f64> = (0..70).map(|i| 20.0 + pattern[i % 7]).collect();
        let order = ParameterSelector::default().select(&series).unwrap().order;

        assert_eq!(order.d, 0);
        let seasonal = order.seasonal.unwrap();
        assert_eq!(seasonal.period, 7);
        assert_eq!(seasonal.d, 1);
        assert_eq!(seasonal.p, 1);
        assert!(series.len() >= order.min_series_len());
    }

    #[test]
    fn seasonality_can_be_disabled() {
        let pattern = [0.0, 3.0, -2.0, 5.0, 1.0, -4.0, 2.0];
        let series: Vec<f64> = (0..70).map(|i| 20.0 + pattern[i % 7]).collect();
        let selector = ParameterSelector::new(SelectorConfig::default().without_seasonality());
        assert!(selector.select(&series).unwrap().order.seasonal.is_none());
    }

    #[test]
    fn short_series_shrinks_to_fit() {
        let series = [10.0, 11.0, 10.5, 12.0, 11.5];
        let order = ParameterSelector::default().select(&series).unwrap().order;
        assert!(order.seasonal.is_none());
        assert!(order.p + order.q == 0 || series.len() >= order.min_series_len());
    }

    #[test]
    fn single_point_is_rejected() {
        let err = ParameterSelector::default().select(&[4.0]).unwrap_err();
        assert!(err.is_insufficient_data());
    }
}
