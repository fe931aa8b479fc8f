//! Forecasting models.

pub mod arima;

pub use arima::{ArimaEstimator, ArimaOrder, FittedArima, Forecaster, ParameterSelector};
