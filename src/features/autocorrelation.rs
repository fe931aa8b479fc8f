//! Autocorrelation-based features for time series.
//!
//! Provides the serial-correlation measures used for order identification.

use crate::utils::stats::mean;

/// Returns the autocorrelation at a specific lag.
///
/// Returns NaN when the series is not longer than `lag`, and 0 for a
/// constant series.
///
/// # Arguments
/// * `series` - Input time series
/// * `lag` - Lag value
pub fn autocorrelation(series: &[f64], lag: usize) -> f64 {
    if series.len() <= lag {
        return f64::NAN;
    }

    let m = mean(series);

    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (i, &x) in series.iter().enumerate() {
        denominator += (x - m).powi(2);
        if i >= lag {
            numerator += (x - m) * (series[i - lag] - m);
        }
    }

    if denominator < 1e-10 {
        return 0.0;
    }

    numerator / denominator
}

/// Returns the partial autocorrelation at a specific lag.
///
/// Uses the Durbin-Levinson algorithm.
///
/// # Arguments
/// * `series` - Input time series
/// * `lag` - Lag value (must be >= 1)
pub fn partial_autocorrelation(series: &[f64], lag: usize) -> f64 {
    if lag == 0 {
        return 1.0;
    }
    if series.len() <= lag {
        return f64::NAN;
    }

    let acf: Vec<f64> = (0..=lag).map(|k| autocorrelation(series, k)).collect();

    if acf.iter().any(|x| x.is_nan()) {
        return f64::NAN;
    }

    let mut phi = vec![vec![0.0; lag + 1]; lag + 1];
    phi[1][1] = acf[1];

    for k in 2..=lag {
        let mut num = acf[k];
        for j in 1..k {
            num -= phi[k - 1][j] * acf[k - j];
        }

        let mut denom = 1.0;
        for j in 1..k {
            denom -= phi[k - 1][j] * acf[j];
        }

        if denom.abs() < 1e-10 {
            return f64::NAN;
        }

        phi[k][k] = num / denom;

        for j in 1..k {
            phi[k][j] = phi[k - 1][j] - phi[k][k] * phi[k - 1][k - j];
        }
    }

    phi[lag][lag]
}
