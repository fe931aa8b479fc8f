//! Property-based tests for the forecasting pipeline.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated price series.

use chrono::NaiveDate;
use harvest_forecast::models::arima::{difference, Differencer, ParameterSelector};
use harvest_forecast::prelude::*;
use harvest_forecast::utils::fit_metrics;
use proptest::prelude::*;

fn make_series(values: &[f64]) -> Series {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    Series::daily(start, values).unwrap()
}

/// Strictly positive prices with a little drift so the variance is non-zero.
fn price_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(5.0..500.0_f64, len).prop_map(|mut v| {
            for (i, val) in v.iter_mut().enumerate() {
                *val += (i as f64) * 0.01;
            }
            v
        })
    })
}

/// Trending prices with bounded noise.
fn trending_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        (
            10.0..200.0_f64,
            0.05..2.0_f64,
            prop::collection::vec(-0.5..0.5_f64, len),
        )
            .prop_map(|(base, slope, noise)| {
                noise
                    .iter()
                    .enumerate()
                    .map(|(i, e)| base + slope * i as f64 + e)
                    .collect()
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    #[test]
    fn fit_metrics_bounds(
        actual in prop::collection::vec(1.0..100.0_f64, 3..60),
        scale in 0.0..5.0_f64,
    ) {
        let residuals: Vec<f64> = actual
            .iter()
            .enumerate()
            .map(|(i, _)| scale * ((i as f64) * 1.3).sin())
            .collect();
        let m = fit_metrics(&actual, &residuals, 2).unwrap();
        prop_assert!(m.r_squared <= 1.0);
        prop_assert!(m.rmse >= 0.0);
        prop_assert!(m.mae >= 0.0);
        prop_assert!(m.mae <= m.rmse + 1e-12);
    }

    #[test]
    fn selection_is_deterministic(values in price_strategy(10, 120)) {
        let selector = ParameterSelector::default();
        let first = selector.select(&values);
        let second = selector.select(&values);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn difference_then_integrate_round_trip(
        values in price_strategy(8, 60),
        d in 0usize..3,
    ) {
        let differenced = Differencer::new(d).apply(&values).unwrap();
        prop_assert_eq!(differenced.values().len(), values.len() - d);
        let rebuilt = differenced.reconstruct();
        for (a, b) in rebuilt.iter().zip(&values) {
            prop_assert!((a - b).abs() < 1e-8);
        }
    }

    #[test]
    fn first_difference_length(values in price_strategy(2, 50)) {
        prop_assert_eq!(difference(&values, 1).len(), values.len() - 1);
    }

    #[test]
    fn trending_series_always_forecast(
        values in trending_strategy(21, 80),
        horizon in 1usize..30,
    ) {
        let series = make_series(&values);
        let result = PriceForecaster::default().predict_series(&series, horizon);
        prop_assert!(result.is_ok(), "{} points: {:?}", values.len(), result.err());

        let response = result.unwrap();
        prop_assert_eq!(response.horizon(), horizon);
        prop_assert!(response.prices().iter().all(|p| p.is_finite() && *p >= 0.0));
        prop_assert!(response.metrics.r_squared <= 1.0);
        prop_assert!(response.metrics.rmse >= 0.0);
        prop_assert!(response.metrics.mae >= 0.0);
        prop_assert!(series.len() >= response.trace.model.order.min_series_len());
    }
}
