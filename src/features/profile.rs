//! Descriptive profile of a price series.

use crate::core::Series;
use crate::features::autocorrelation::autocorrelation;
use crate::features::trend::linear_slope;
use crate::utils::stats::{mean, population_std_dev, population_variance};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary statistics of a price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesProfile {
    pub data_points: usize,
    pub time_span_days: i64,
    /// Typical spacing between observations in days.
    pub interval_days: i64,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    /// std_dev / mean, 0 when the mean is not positive.
    pub coefficient_of_variation: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub median: f64,
    pub q25: f64,
    pub q75: f64,
    /// Least-squares slope per observation.
    pub trend_slope: f64,
    pub skewness: f64,
    /// Excess kurtosis.
    pub kurtosis: f64,
    pub autocorrelation_lag1: f64,
    pub autocorrelation_lag2: f64,
    /// Mean of the last 30% of observations.
    pub recent_mean: f64,
    pub recent_std_dev: f64,
}

/// Profile a non-empty series.
pub fn profile(series: &Series) -> SeriesProfile {
    let prices = series.prices();
    let n = prices.len();

    let m = mean(&prices);
    let var = population_variance(&prices);
    let sd = var.sqrt();

    let mut sorted = prices.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let pick = |idx: usize| sorted.get(idx.min(n.saturating_sub(1))).copied().unwrap_or(f64::NAN);

    // last 30% of the series
    let recent_start = n * 7 / 10;
    let recent = &prices[recent_start.min(n.saturating_sub(1))..];

    let lag = |k: usize| {
        let r = autocorrelation(&prices, k);
        if r.is_nan() {
            0.0
        } else {
            r
        }
    };

    SeriesProfile {
        data_points: n,
        time_span_days: series.span_days(),
        interval_days: detect_interval(series.x()),
        mean: m,
        variance: var,
        std_dev: sd,
        coefficient_of_variation: if m > 0.0 { sd / m } else { 0.0 },
        min_price: sorted.first().copied().unwrap_or(f64::NAN),
        max_price: sorted.last().copied().unwrap_or(f64::NAN),
        median: pick(n / 2),
        q25: pick(n / 4),
        q75: pick(n * 3 / 4),
        trend_slope: linear_slope(&prices),
        skewness: standardized_moment(&prices, m, sd, 3),
        kurtosis: standardized_moment(&prices, m, sd, 4) - if sd < 1e-12 { 0.0 } else { 3.0 },
        autocorrelation_lag1: lag(1),
        autocorrelation_lag2: lag(2),
        recent_mean: mean(recent),
        recent_std_dev: population_std_dev(recent),
    }
}

fn standardized_moment(values: &[f64], m: f64, sd: f64, order: i32) -> f64 {
    if sd < 1e-12 || values.is_empty() {
        return 0.0;
    }
    values.iter().map(|x| ((x - m) / sd).powi(order)).sum::<f64>() / values.len() as f64
}

/// Detect the typical sampling interval in days from day offsets.
///
/// Uses the most frequent positive gap when it accounts for more than half of
/// the gaps, otherwise the median gap. Defaults to 1.
pub fn detect_interval(offsets: &[i64]) -> i64 {
    let mut gaps: Vec<i64> = offsets
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&g| g > 0)
        .collect();

    if gaps.is_empty() {
        return 1;
    }

    let mut freq: BTreeMap<i64, usize> = BTreeMap::new();
    for &g in &gaps {
        *freq.entry(g).or_insert(0) += 1;
    }
    // Smallest gap wins ties.
    let (mode, max_freq) = freq
        .iter()
        .fold((gaps[0], 0usize), |best, (&gap, &count)| {
            if count > best.1 {
                (gap, count)
            } else {
                best
            }
        });

    if max_freq * 2 > gaps.len() {
        mode
    } else {
        gaps.sort_unstable();
        gaps[gaps.len() / 2]
    }
}
