//! Statistical utility functions.

use statrs::distribution::{ContinuousCDF, Normal};

/// Quantile function of the standard normal distribution.
///
/// Returns NaN for `p` outside (0, 1).
///
/// # Example
/// ```
/// use harvest_forecast::utils::stats::quantile_normal;
///
/// let z = quantile_normal(0.975);
/// assert!((z - 1.96).abs() < 0.01);
/// ```
pub fn quantile_normal(p: f64) -> f64 {
    if !(p > 0.0 && p < 1.0) {
        return f64::NAN;
    }
    Normal::new(0.0, 1.0)
        .map(|n| n.inverse_cdf(p))
        .unwrap_or(f64::NAN)
}

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (n denominator).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn population_std_dev(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

/// Sample variance (n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

pub fn round4(value: f64) -> f64 {
    round_to(value, 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quantile_normal_known_values() {
        assert_relative_eq!(quantile_normal(0.5), 0.0, epsilon = 1e-6);
        assert_relative_eq!(quantile_normal(0.975), 1.96, epsilon = 0.01);
        assert_relative_eq!(quantile_normal(0.025), -1.96, epsilon = 0.01);
    }

    #[test]
    fn quantile_normal_boundary_values() {
        assert!(quantile_normal(0.0).is_nan());
        assert!(quantile_normal(1.0).is_nan());
    }

    #[test]
    fn mean_calculates_correctly() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn variances_use_expected_denominators() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(variance(&v), 2.5, epsilon = 1e-10);
        assert_relative_eq!(population_variance(&v), 2.0, epsilon = 1e-10);
        assert_relative_eq!(population_std_dev(&v), 2.0_f64.sqrt(), epsilon = 1e-10);
        assert!(variance(&[1.0]).is_nan());
    }

    #[test]
    fn rounding() {
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(-0.004), -0.0);
        assert_eq!(round4(0.123_456), 0.1235);
    }
}
