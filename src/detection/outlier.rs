//! Outlier filtering for price series.
//!
//! Applies a mean ± kσ rule over the whole series and removes observations
//! outside the band. The filter backs off entirely when it would discard too
//! much of the series, which happens on trending or multimodal data.

use crate::core::{Observation, Series};
use crate::utils::stats::{mean, population_std_dev};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration for outlier filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Series shorter than this are returned unchanged.
    pub min_points: usize,
    /// Half-width of the retention band in population standard deviations.
    pub sigma_multiplier: f64,
    /// Minimum retained fraction; below it the filtering is discarded.
    pub min_retained_fraction: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            min_points: 10,
            sigma_multiplier: 3.0,
            min_retained_fraction: 0.7,
        }
    }
}

impl OutlierConfig {
    /// Use a different band half-width.
    pub fn with_sigma_multiplier(mut self, multiplier: f64) -> Self {
        self.sigma_multiplier = multiplier;
        self
    }

    /// Use a different minimum series length.
    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Use a different minimum retained fraction.
    pub fn with_min_retained_fraction(mut self, fraction: f64) -> Self {
        self.min_retained_fraction = fraction;
        self
    }
}

/// What the filter did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierOutcome {
    /// Too few points; no statistics computed.
    Skipped,
    /// Points outside the band were removed (possibly none).
    Filtered,
    /// Removal was too aggressive and the original series was kept.
    Reverted,
}

/// Report of an outlier filtering pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub outcome: OutlierOutcome,
    pub original_count: usize,
    pub retained_count: usize,
    /// Mean price over the original series.
    pub mean: Option<f64>,
    /// Population standard deviation over the original series.
    pub std_dev: Option<f64>,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    /// Observations outside the band (empty when skipped).
    pub outliers: Vec<Observation>,
}

impl OutlierReport {
    /// Number of observations dropped from the series.
    pub fn removed_count(&self) -> usize {
        self.original_count - self.retained_count
    }
}

/// Remove anomalous prices from `series`.
///
/// Returns the cleaned series and a report of the decision.
pub fn filter_outliers(series: &Series, config: &OutlierConfig) -> (Series, OutlierReport) {
    let n = series.len();
    if n < config.min_points {
        debug!(points = n, min_points = config.min_points, "outlier filter skipped");
        return (
            series.clone(),
            OutlierReport {
                outcome: OutlierOutcome::Skipped,
                original_count: n,
                retained_count: n,
                mean: None,
                std_dev: None,
                lower_bound: None,
                upper_bound: None,
                outliers: Vec::new(),
            },
        );
    }

    let prices = series.prices();
    let mu = mean(&prices);
    let sigma = population_std_dev(&prices);
    let lower = mu - config.sigma_multiplier * sigma;
    let upper = mu + config.sigma_multiplier * sigma;
    let within = |p: f64| p >= lower && p <= upper;

    let outliers: Vec<Observation> = series
        .observations()
        .iter()
        .filter(|o| !within(o.price))
        .copied()
        .collect();
    let retained = n - outliers.len();

    let mut report = OutlierReport {
        outcome: OutlierOutcome::Filtered,
        original_count: n,
        retained_count: retained,
        mean: Some(mu),
        std_dev: Some(sigma),
        lower_bound: Some(lower),
        upper_bound: Some(upper),
        outliers,
    };

    if (retained as f64) < n as f64 * config.min_retained_fraction {
        warn!(
            retained,
            original = n,
            "outlier filter would remove too much of the series, keeping original"
        );
        report.outcome = OutlierOutcome::Reverted;
        report.retained_count = n;
        return (series.clone(), report);
    }

    debug!(
        removed = report.removed_count(),
        lower = %format!("{lower:.4}"),
        upper = %format!("{upper:.4}"),
        "outlier filter applied"
    );
    (series.filtered(|o| within(o.price)), report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn base_prices(n: usize) -> Vec<f64> {
        (0..n).map(|i| 10.0 + 0.3 * (i as f64 * 0.7).sin()).collect()
    }

    #[test]
    fn clean_series_is_unchanged() {
        let series = Series::daily(start(), &base_prices(40)).unwrap();
        let (cleaned, report) = filter_outliers(&series, &OutlierConfig::default());

        assert_eq!(cleaned, series);
        assert_eq!(report.outcome, OutlierOutcome::Filtered);
        assert_eq!(report.removed_count(), 0);
    }

    #[test]
    fn short_series_is_skipped() {
        let mut prices = base_prices(9);
        prices[4] = 10_000.0;
        let series = Series::daily(start(), &prices).unwrap();
        let (cleaned, report) = filter_outliers(&series, &OutlierConfig::default());

        assert_eq!(cleaned, series);
        assert_eq!(report.outcome, OutlierOutcome::Skipped);
        assert!(report.lower_bound.is_none());
    }

    #[test]
    fn single_spike_among_twelve_is_removed() {
        let mut prices = base_prices(12);
        let local_mean = prices.iter().sum::<f64>() / 12.0;
        prices[6] = 1000.0 * local_mean;
        let series = Series::daily(start(), &prices).unwrap();

        let (cleaned, report) = filter_outliers(&series, &OutlierConfig::default());

        assert_eq!(report.outcome, OutlierOutcome::Filtered);
        assert_eq!(report.removed_count(), 1);
        assert_eq!(report.outliers[0].price, prices[6]);
        assert_eq!(cleaned.len(), 11);
        assert!(cleaned.prices().iter().all(|&p| p < 11.0));
    }

    #[test]
    fn bounds_are_mean_plus_minus_three_sigma_of_original() {
        let mut prices = base_prices(12);
        let local_mean = prices.iter().sum::<f64>() / 12.0;
        prices[3] = 1000.0 * local_mean;
        prices[9] = 1000.0 * local_mean;
        let series = Series::daily(start(), &prices).unwrap();

        let (_, report) = filter_outliers(&series, &OutlierConfig::default());

        let mu = prices.iter().sum::<f64>() / 12.0;
        let sigma = (prices.iter().map(|p| (p - mu).powi(2)).sum::<f64>() / 12.0).sqrt();
        assert_relative_eq!(report.mean.unwrap(), mu, epsilon = 1e-9);
        assert_relative_eq!(report.lower_bound.unwrap(), mu - 3.0 * sigma, epsilon = 1e-9);
        assert_relative_eq!(report.upper_bound.unwrap(), mu + 3.0 * sigma, epsilon = 1e-9);

        // Two equal spikes among twelve sit at sqrt(5) sigma, inside a 3 sigma band.
        assert_eq!(report.removed_count(), 0);

        // A 2 sigma band isolates exactly the two spikes.
        let config = OutlierConfig::default().with_sigma_multiplier(2.0);
        let (cleaned, report) = filter_outliers(&series, &config);
        assert_eq!(report.removed_count(), 2);
        assert_eq!(cleaned.len(), 10);
        assert!(report.outliers.iter().all(|o| o.price > 1000.0));
    }

    #[test]
    fn aggressive_removal_reverts_to_original() {
        // Two plateaus: a tight band removes more than 30% of the points.
        let mut prices = vec![10.0; 14];
        prices.extend(vec![20.0; 6]);
        let series = Series::daily(start(), &prices).unwrap();

        let config = OutlierConfig::default().with_sigma_multiplier(0.5);
        let (cleaned, report) = filter_outliers(&series, &config);

        assert_eq!(report.outcome, OutlierOutcome::Reverted);
        assert_eq!(cleaned, series);
        assert_eq!(report.removed_count(), 0);
        assert_eq!(report.outliers.len(), 20);
    }

    #[test]
    fn idempotent_on_filtered_output() {
        let mut prices = base_prices(30);
        prices[10] = 500.0;
        let series = Series::daily(start(), &prices).unwrap();
        let config = OutlierConfig::default();

        let (once, _) = filter_outliers(&series, &config);
        let (twice, report) = filter_outliers(&once, &config);
        assert_eq!(once, twice);
        assert_eq!(report.removed_count(), 0);
    }

    #[test]
    fn default_config() {
        let config = OutlierConfig::default();
        assert_eq!(config.min_points, 10);
        assert_relative_eq!(config.sigma_multiplier, 3.0, epsilon = 1e-10);
        assert_relative_eq!(config.min_retained_fraction, 0.7, epsilon = 1e-10);
    }
}
