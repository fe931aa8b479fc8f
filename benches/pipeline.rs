//! Benchmarks for the forecasting pipeline.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use harvest_forecast::models::arima::{ArimaEstimator, ParameterSelector};
use harvest_forecast::prelude::*;

fn generate_prices(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + 0.2 * t + 5.0 * (2.0 * std::f64::consts::PI * t / 7.0).sin() + (t * 1.3).cos()
        })
        .collect()
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let forecaster = PriceForecaster::default();

    for size in [30, 90, 365, 1095].iter() {
        let series = Series::daily(start, &generate_prices(*size)).unwrap();
        group.bench_with_input(BenchmarkId::new("predict_series", size), size, |b, _| {
            b.iter(|| forecaster.predict_series(black_box(&series), 30))
        });
    }

    group.finish();
}

fn bench_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages");
    let prices = generate_prices(365);
    let selector = ParameterSelector::default();
    let estimator = ArimaEstimator::default();

    group.bench_function("select", |b| b.iter(|| selector.select(black_box(&prices))));

    if let Ok(selection) = selector.select(&prices) {
        group.bench_function("fit", |b| {
            b.iter(|| estimator.fit(black_box(&prices), &selection.order))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_stages);
criterion_main!(benches);
