//! Engine configuration.
//!
//! Every section has working defaults; a TOML document only needs the keys it
//! overrides.
//!
//! ```
//! use harvest_forecast::config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(
//!     r#"
//!     max_horizon = 30
//!
//!     [outlier]
//!     sigma_multiplier = 2.5
//!
//!     [trend]
//!     distinguish_volatile = true
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.max_horizon, 30);
//! assert_eq!(config.selector.max_p, 2);
//! ```

use crate::detection::outlier::OutlierConfig;
use crate::error::{ForecastError, Result};
use crate::features::trend::TrendConfig;
use crate::models::arima::{EstimatorConfig, SelectorConfig, DEFAULT_MAX_HORIZON};
use crate::validation::backtest::BacktestConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of the forecasting pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest accepted horizon in days.
    pub max_horizon: usize,
    /// Interpolate calendar days missing between observations before fitting.
    pub fill_missing_days: bool,
    /// Coverage of the per-step prediction band in the trace.
    pub interval_level: f64,
    pub outlier: OutlierConfig,
    pub selector: SelectorConfig,
    pub estimator: EstimatorConfig,
    pub trend: TrendConfig,
    pub backtest: BacktestConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_horizon: DEFAULT_MAX_HORIZON,
            fill_missing_days: false,
            interval_level: 0.95,
            outlier: OutlierConfig::default(),
            selector: SelectorConfig::default(),
            estimator: EstimatorConfig::default(),
            trend: TrendConfig::default(),
            backtest: BacktestConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| ForecastError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ForecastError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| ForecastError::Config(e.to_string()))
    }

    pub fn with_max_horizon(mut self, max_horizon: usize) -> Self {
        self.max_horizon = max_horizon;
        self
    }

    pub fn with_fill_missing_days(mut self, fill: bool) -> Self {
        self.fill_missing_days = fill;
        self
    }

    pub fn with_outlier(mut self, outlier: OutlierConfig) -> Self {
        self.outlier = outlier;
        self
    }

    pub fn with_selector(mut self, selector: SelectorConfig) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_estimator(mut self, estimator: EstimatorConfig) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_trend(mut self, trend: TrendConfig) -> Self {
        self.trend = trend;
        self
    }

    pub fn with_backtest(mut self, backtest: BacktestConfig) -> Self {
        self.backtest = backtest;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(ForecastError::Config(msg));

        if self.max_horizon == 0 || self.max_horizon > DEFAULT_MAX_HORIZON {
            return fail(format!(
                "max_horizon must be in 1..={DEFAULT_MAX_HORIZON}, got {}",
                self.max_horizon
            ));
        }
        if !(self.interval_level > 0.0 && self.interval_level < 1.0) {
            return fail(format!(
                "interval_level must be in (0, 1), got {}",
                self.interval_level
            ));
        }

        let o = &self.outlier;
        if !(o.sigma_multiplier > 0.0) {
            return fail(format!(
                "outlier.sigma_multiplier must be positive, got {}",
                o.sigma_multiplier
            ));
        }
        if !(0.0..=1.0).contains(&o.min_retained_fraction) {
            return fail(format!(
                "outlier.min_retained_fraction must be in [0, 1], got {}",
                o.min_retained_fraction
            ));
        }

        let s = &self.selector;
        if !(s.variance_ratio > 0.0) || !(s.seasonal_variance_ratio > 0.0) {
            return fail("selector variance ratios must be positive".into());
        }
        if !(s.significance > 0.0) {
            return fail(format!(
                "selector.significance must be positive, got {}",
                s.significance
            ));
        }
        if let Some(&p) = s.seasonal_periods.iter().find(|&&p| p < 2) {
            return fail(format!("seasonal periods must exceed 1, got {p}"));
        }

        let e = &self.estimator;
        if e.max_iterations == 0 {
            return fail("estimator.max_iterations must be at least 1".into());
        }
        if !(e.tolerance > 0.0) {
            return fail(format!(
                "estimator.tolerance must be positive, got {}",
                e.tolerance
            ));
        }

        if !(self.trend.threshold >= 0.0) {
            return fail(format!(
                "trend.threshold must be non-negative, got {}",
                self.trend.threshold
            ));
        }

        let b = &self.backtest;
        if b.min_horizon == 0 || b.min_horizon > b.max_horizon {
            return fail(format!(
                "backtest horizons must satisfy 1 <= min_horizon <= max_horizon, got {}..{}",
                b.min_horizon, b.max_horizon
            ));
        }

        Ok(())
    }
}
