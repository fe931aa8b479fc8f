//! The forecasting pipeline.
//!
//! outlier filter → order selection → estimation → forecast, metrics and
//! trend → response assembly.

use crate::config::EngineConfig;
use crate::core::{DatasetForecast, ForecastPoint, ForecastResponse, Series, SeriesForecast};
use crate::detection::outlier::filter_outliers;
use crate::error::{ForecastError, Result};
use crate::features::profile::profile;
use crate::features::trend::classify_trend;
use crate::models::arima::{ArimaEstimator, Forecaster, ParameterSelector};
use crate::store::DatasetStore;
use crate::trace::{differencing_stages, historical_points, CalculationTrace, ModelTrace};
use crate::utils::metrics::fit_metrics;
use crate::validation::backtest::backtest;
use tracing::{debug, info, warn};

/// ARIMA price forecaster.
///
/// Holds only configuration; one instance can serve concurrent requests.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use harvest_forecast::prelude::*;
///
/// let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let prices: Vec<f64> = (0..30).map(|i| 10.0 + i as f64).collect();
/// let series = Series::daily(start, &prices).unwrap();
///
/// let response = PriceForecaster::default().predict_series(&series, 5).unwrap();
/// assert_eq!(response.predicted.len(), 5);
/// assert_eq!(response.trend, Trend::Rising);
/// ```
#[derive(Debug, Clone)]
pub struct PriceForecaster {
    config: EngineConfig,
    selector: ParameterSelector,
    estimator: ArimaEstimator,
    forecaster: Forecaster,
}

impl Default for PriceForecaster {
    fn default() -> Self {
        Self::from_valid_config(EngineConfig::default())
    }
}

impl PriceForecaster {
    /// Create a forecaster after validating `config`.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: EngineConfig) -> Self {
        Self {
            selector: ParameterSelector::new(config.selector.clone()),
            estimator: ArimaEstimator::new(config.estimator.clone()),
            forecaster: Forecaster::new(config.max_horizon)
                .with_interval_level(config.interval_level),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Forecast the dataset stored under `key`.
    pub fn predict<S>(&self, store: &S, key: &str, horizon: usize) -> Result<ForecastResponse>
    where
        S: DatasetStore + ?Sized,
    {
        self.forecaster.validate_horizon(horizon)?;
        let series = store.series(key)?;
        debug!(key, points = series.len(), "dataset loaded");
        self.predict_series(&series, horizon)
    }

    /// Forecast every series of the dataset stored under `key`.
    ///
    /// Series are forecast in label order and the first label is the primary.
    /// Any failing series fails the whole request.
    pub fn predict_all<S>(&self, store: &S, key: &str, horizon: usize) -> Result<DatasetForecast>
    where
        S: DatasetStore + ?Sized,
    {
        self.forecaster.validate_horizon(horizon)?;
        let set = store.series_set(key)?;
        debug!(key, series = set.len(), "dataset loaded");

        let mut primary = None;
        let mut series_data = Vec::with_capacity(set.len());
        for series in &set {
            let label = series.label_or_default();
            let response = self.predict_series(series, horizon).map_err(|err| {
                warn!(key, label, error = %err, "series forecast failed");
                err
            })?;
            series_data.push(SeriesForecast::new(label, &response));
            if primary.is_none() {
                primary = Some(response);
            }
        }

        let primary = primary.ok_or_else(|| ForecastError::DatasetNotFound(key.to_string()))?;
        Ok(DatasetForecast {
            primary,
            series_data,
        })
    }

    /// Forecast `horizon` days past the end of `series`.
    pub fn predict_series(&self, series: &Series, horizon: usize) -> Result<ForecastResponse> {
        self.forecaster.validate_horizon(horizon)?;
        if series.is_empty() {
            return Err(ForecastError::EmptyData);
        }

        let working = if self.config.fill_missing_days {
            series.fill_missing_days()
        } else {
            series.clone()
        };
        let interpolated_points = working.len() - series.len();

        let (cleaned, outliers) = filter_outliers(&working, &self.config.outlier);
        let prices = cleaned.prices();
        if prices.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: prices.len(),
            });
        }
        let last_date = cleaned.last_date().ok_or(ForecastError::EmptyData)?;

        let mut selection = self.selector.select(&prices)?;
        let model = self.estimator.fit_selection(&prices, &mut selection)?;
        let order = selection.order;
        let steps = self.forecaster.forecast(&model, last_date, horizon)?;

        let residuals = model.residuals();
        let actual = &prices[prices.len() - residuals.len()..];
        let metrics = fit_metrics(actual, residuals, order.num_params())?;

        let trend = classify_trend(&cleaned, &self.config.trend);
        let backtest = backtest(
            &prices,
            &order,
            &self.estimator,
            horizon,
            &self.config.backtest,
        );

        info!(
            points = prices.len(),
            horizon,
            order = %order,
            r_squared = metrics.r_squared,
            trend = %trend.trend,
            "forecast completed"
        );

        let predicted = steps
            .iter()
            .map(|s| ForecastPoint {
                step: s.step,
                date: s.date,
                price: s.price,
            })
            .collect();

        let trace = CalculationTrace {
            label: series.label().map(str::to_string),
            historical: historical_points(series),
            interpolated_points,
            outliers,
            profile: profile(&cleaned),
            model: ModelTrace::new(&selection, &model),
            differencing: differencing_stages(model.differenced()),
            metrics,
            trend: trend.clone(),
            forecast: steps,
            backtest,
        };

        Ok(ForecastResponse {
            historical: cleaned.observations().to_vec(),
            predicted,
            metrics: metrics.rounded(),
            trend: trend.trend,
            trace,
        })
    }
}
