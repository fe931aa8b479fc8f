//! Trend features for price series.
//!
//! Provides the recent-trajectory classifier reported with every forecast and
//! a least-squares slope used in the series profile.

use crate::core::Series;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the recent price trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Flat,
    /// Near-zero average slope with alternating signs. Only reported when
    /// [`TrendConfig::distinguish_volatile`] is set.
    Volatile,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Falling => "falling",
            Trend::Flat => "flat",
            Trend::Volatile => "volatile",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for trend classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Maximum number of trailing slopes inspected.
    pub window: usize,
    /// Average slope magnitude (price per day) separating rising/falling from flat.
    pub threshold: f64,
    /// Report `Volatile` instead of `Flat` when the inspected slopes alternate sign.
    pub distinguish_volatile: bool,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window: 5,
            threshold: 0.01,
            distinguish_volatile: false,
        }
    }
}

impl TrendConfig {
    /// Enable the separate `volatile` label.
    pub fn with_volatile(mut self) -> Self {
        self.distinguish_volatile = true;
        self
    }
}

/// Result of trend classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAssessment {
    pub trend: Trend,
    /// Inspected slopes, oldest first.
    pub slopes: Vec<f64>,
    pub average_slope: f64,
}

/// Classify the recent trajectory of `series`.
///
/// Averages the last `min(window, n - 1)` consecutive slopes Δprice/Δdays.
/// Observations sharing a date are treated as one day apart.
pub fn classify_trend(series: &Series, config: &TrendConfig) -> TrendAssessment {
    let prices = series.prices();
    let x = series.x();
    let n = prices.len();

    if n < 2 || config.window == 0 {
        return TrendAssessment {
            trend: Trend::Flat,
            slopes: Vec::new(),
            average_slope: 0.0,
        };
    }

    let look = config.window.min(n - 1);
    let slopes: Vec<f64> = (n - look..n)
        .map(|i| {
            let dx = (x[i] - x[i - 1]).max(1) as f64;
            (prices[i] - prices[i - 1]) / dx
        })
        .collect();
    let average_slope = slopes.iter().sum::<f64>() / slopes.len() as f64;

    let trend = if average_slope > config.threshold {
        Trend::Rising
    } else if average_slope < -config.threshold {
        Trend::Falling
    } else if config.distinguish_volatile && alternates_sign(&slopes) {
        Trend::Volatile
    } else {
        Trend::Flat
    };

    TrendAssessment {
        trend,
        slopes,
        average_slope,
    }
}

fn alternates_sign(slopes: &[f64]) -> bool {
    slopes.len() >= 2 && slopes.windows(2).all(|w| w[0] * w[1] < 0.0)
}

/// Least-squares slope of `values` against their index.
///
/// Returns 0 for fewer than two points.
pub fn linear_slope(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;

    let mut ss_xy = 0.0;
    let mut ss_xx = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        ss_xy += dx * (y - mean_y);
        ss_xx += dx * dx;
    }

    if ss_xx.abs() < 1e-12 {
        return 0.0;
    }
    ss_xy / ss_xx
}
