//! End-to-end tests of the forecasting pipeline.

use chrono::{Duration, NaiveDate};
use harvest_forecast::detection::OutlierOutcome;
use harvest_forecast::prelude::*;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn linear_series(n: usize) -> Series {
    let prices: Vec<f64> = (0..n).map(|i| 10.0 + i as f64).collect();
    Series::daily(start(), &prices).unwrap()
}

/// Weekly cycle on a slow upward drift, similar to a wholesale market.
fn market_series(n: usize) -> Series {
    let prices: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64;
            120.0 + 0.15 * t + 4.0 * (2.0 * std::f64::consts::PI * t / 7.0).sin()
        })
        .collect();
    Series::daily(start(), &prices).unwrap().with_label("tomato grade A")
}

#[test]
fn linear_series_forecasts_rising_prices() {
    let response = PriceForecaster::default()
        .predict_series(&linear_series(30), 5)
        .unwrap();

    assert_eq!(response.horizon(), 5);
    assert_eq!(response.trend, Trend::Rising);

    let prices = response.prices();
    assert!(prices.iter().all(|&p| p >= 39.0), "prices: {prices:?}");
    assert!(prices.windows(2).all(|w| w[1] >= w[0]), "prices: {prices:?}");

    let last = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
    for point in &response.predicted {
        assert_eq!(point.date, last + Duration::days(point.step as i64));
    }
    assert!(response.metrics.r_squared <= 1.0);
}

#[test]
fn five_points_skip_outlier_filtering() {
    let series = Series::daily(start(), &[20.0, 20.5, 21.0, 20.8, 21.4]).unwrap();
    match PriceForecaster::default().predict_series(&series, 3) {
        Ok(response) => {
            assert_eq!(response.trace.outliers.outcome, OutlierOutcome::Skipped);
            assert_eq!(response.historical.len(), 5);
            assert_eq!(response.horizon(), 3);
        }
        Err(err) => assert!(err.is_insufficient_data(), "unexpected error: {err}"),
    }
}

#[test]
fn horizon_bounds() {
    let forecaster = PriceForecaster::default();
    let series = linear_series(30);

    for horizon in [0, 91] {
        let err = forecaster.predict_series(&series, horizon).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidHorizon { .. }));
        assert!(err.is_validation());
    }
    for horizon in [1, 90] {
        let response = forecaster.predict_series(&series, horizon).unwrap();
        assert_eq!(response.horizon(), horizon);
    }
}

#[test]
fn dataset_lookup_through_store() {
    let store = InMemoryStore::new();
    store.insert("onion-2024", market_series(60));
    let forecaster = PriceForecaster::default();

    let response = forecaster.predict(&store, "onion-2024", 14).unwrap();
    assert_eq!(response.horizon(), 14);
    assert_eq!(response.trace.label.as_deref(), Some("tomato grade A"));

    let err = forecaster.predict(&store, "garlic-2024", 14).unwrap_err();
    assert_eq!(err, ForecastError::DatasetNotFound("garlic-2024".into()));
}

#[test]
fn store_can_be_used_as_trait_object() {
    let store = InMemoryStore::new();
    store.insert("k", linear_series(30));
    let store: &dyn DatasetStore = &store;
    assert!(PriceForecaster::default().predict(store, "k", 2).is_ok());
}

#[test]
fn spike_is_removed_before_fitting() {
    let mut prices: Vec<f64> = (0..12).map(|i| 50.0 + 0.2 * (i as f64)).collect();
    prices[7] = 50_000.0;
    let series = Series::daily(start(), &prices).unwrap();

    let response = PriceForecaster::default().predict_series(&series, 4).unwrap();
    let outliers = &response.trace.outliers;

    assert_eq!(outliers.outcome, OutlierOutcome::Filtered);
    assert_eq!(outliers.removed_count(), 1);
    assert_eq!(outliers.outliers[0].price, 50_000.0);
    assert_eq!(response.historical.len(), 11);
    assert_eq!(response.trace.historical.len(), 12);
    assert!(response.prices().iter().all(|&p| p < 100.0));
}

#[test]
fn seasonal_market_series() {
    let response = PriceForecaster::default()
        .predict_series(&market_series(84), 14)
        .unwrap();

    assert_eq!(response.horizon(), 14);
    assert!(response.prices().iter().all(|p| p.is_finite() && *p >= 0.0));
    assert!(response.metrics.rmse >= 0.0);
    assert!(!response.trace.model.coefficients.is_empty());
    assert!(response.trace.backtest.is_some());
}

#[test]
fn json_uses_response_field_names() {
    let response = PriceForecaster::default()
        .predict_series(&linear_series(30), 3)
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();

    for key in [
        "historical_data",
        "predicted_data",
        "model_metrics",
        "trend",
        "calculation_details",
    ] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
    assert_eq!(value["trend"], "rising");
    assert_eq!(value["historical_data"][0]["date"], "2024-01-01");
    for key in ["r_squared", "mae", "rmse", "aic"] {
        assert!(value["model_metrics"][key].is_number(), "missing {key}");
    }

    let back: ForecastResponse = serde_json::from_value(value).unwrap();
    assert_eq!(back.predicted, response.predicted);
}

#[test]
fn config_from_toml_drives_the_pipeline() {
    let config = EngineConfig::from_toml_str(
        r#"
        max_horizon = 10
        fill_missing_days = true

        [backtest]
        enabled = false
        "#,
    )
    .unwrap();
    let forecaster = PriceForecaster::new(config).unwrap();

    let series = Series::from_pairs(
        [0i64, 1, 2, 4, 5, 6, 7, 9, 10, 11, 12, 13, 14, 15]
            .iter()
            .map(|&d| (start() + Duration::days(d), 30.0 + d as f64 * 0.5)),
    )
    .unwrap();

    let response = forecaster.predict_series(&series, 10).unwrap();
    assert_eq!(response.trace.interpolated_points, 2);
    assert!(response.trace.backtest.is_none());
    assert!(forecaster.predict_series(&series, 11).is_err());
}

#[test]
fn multi_grade_dataset_json() {
    let store = InMemoryStore::new();
    store.insert_set(
        "tomato-2024",
        vec![
            market_series(60).with_label("grade B"),
            linear_series(30).with_label("grade A"),
            linear_series(45),
        ],
    );

    let forecast = PriceForecaster::default()
        .predict_all(&store, "tomato-2024", 7)
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&forecast.to_json().unwrap()).unwrap();

    let types: Vec<&str> = value["series_data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["default", "grade A", "grade B"]);
    for entry in value["series_data"].as_array().unwrap() {
        assert_eq!(entry["predicted_data"].as_array().unwrap().len(), 7);
        assert!(entry.get("calculation_details").is_none());
    }

    // top-level fields come from the first type
    assert_eq!(forecast.primary_label(), Some("default"));
    assert_eq!(value["historical_data"].as_array().unwrap().len(), 45);
    assert_eq!(value["trend"], "rising");
    assert!(value.get("calculation_details").is_some());

    let back: DatasetForecast = serde_json::from_value(value).unwrap();
    assert_eq!(back.series_data.len(), 3);
}
