//! ARIMA and seasonal ARIMA models.
//!
//! This module provides:
//! - Differencing with recorded stages for exact integration
//! - Heuristic (p, d, q)(P, D, Q)\[s\] order selection
//! - Lag-regression coefficient estimation with MA refinement
//! - Recursive multi-step forecasting

mod diff;
mod estimator;
mod forecast;
mod selector;

pub use diff::{
    difference, seasonal_difference, select_differencing, DiffStep, Differenced, Differencer,
};
pub use estimator::{ArimaEstimator, Coefficient, EstimatorConfig, FittedArima};
pub use forecast::{project, ForecastStep, Forecaster, DEFAULT_MAX_HORIZON, MIN_HORIZON};
pub use selector::{ArimaOrder, ParameterSelector, SeasonalOrder, Selection, SelectorConfig};
