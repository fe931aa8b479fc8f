//! Forecast a synthetic wholesale price series and print the calculation trace.
//!
//! Run with: cargo run --example price_forecast

use chrono::{Duration, NaiveDate};
use harvest_forecast::prelude::*;

fn main() {
    println!("=== harvest-forecast price forecast ===\n");

    // 1. Upload a series into the in-memory store
    let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let prices: Vec<f64> = (0..90)
        .map(|i| {
            let t = i as f64;
            2400.0                                               // base price per quintal
            + 3.5 * t                                            // drift
            + 60.0 * (2.0 * std::f64::consts::PI * t / 7.0).sin() // weekly market cycle
            + 15.0 * (t * 1.7).cos()                             // noise
        })
        .collect();
    let mut series = Series::daily(start, &prices).unwrap().with_label("wheat, mill grade");

    // a data-entry error the outlier filter should catch
    let mut observations = series.observations().to_vec();
    observations[40].price = 240_000.0;
    series = Series::new(observations).unwrap().with_label("wheat, mill grade");

    let store = InMemoryStore::new();
    store.insert("wheat-2024", series);
    println!("Stored {} dataset(s)", store.len());

    // 2. Forecast two weeks ahead
    let forecaster = PriceForecaster::default();
    let response = forecaster.predict(&store, "wheat-2024", 14).unwrap();
    let trace = &response.trace;

    println!("\n--- Cleaning ---");
    println!(
        "Outlier filter: {:?}, removed {} point(s)",
        trace.outliers.outcome,
        trace.outliers.removed_count()
    );

    println!("\n--- Model ---");
    println!("{} ({})", trace.model.name, trace.model.rationale);
    for c in &trace.model.coefficients {
        println!("  {:<8} {:>10.4}", c.label, c.value);
    }

    println!("\n--- Fit ---");
    let m = &response.metrics;
    println!("R²={}  MAE={}  RMSE={}  AIC={}", m.r_squared, m.mae, m.rmse, m.aic);
    println!("Trend: {}", response.trend);
    if let Some(bt) = &trace.backtest {
        println!(
            "Backtest: horizon {} over {} fold(s), MAPE {:.2}%",
            bt.horizon,
            bt.folds_used,
            bt.mape * 100.0
        );
    }

    println!("\n--- Forecast ---");
    for step in &trace.forecast {
        println!(
            "  {} {:>10.2}  [{:.2}, {:.2}]",
            step.date, step.price, step.lower, step.upper
        );
    }

    // 3. Requests outside 1..=90 days are rejected
    let err = forecaster.predict(&store, "wheat-2024", 120).unwrap_err();
    println!("\nHorizon 120: {err}");

    let last = response.predicted.last().unwrap();
    assert_eq!(last.date, start + Duration::days(89 + 14));
}
