//! # harvest-forecast
//!
//! ARIMA price forecasting for agricultural commodity series.
//!
//! A daily price series is cleaned of outliers, an ARIMA or seasonal ARIMA
//! order is chosen from its autocorrelation structure, coefficients are
//! estimated by Hannan–Rissanen regression and the fitted model is projected
//! up to 90 days ahead. Every response carries fit metrics, a trend label and
//! a full calculation trace.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod detection;
pub mod engine;
pub mod error;
pub mod features;
pub mod models;
pub mod store;
pub mod trace;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::{
        DatasetForecast, ForecastPoint, ForecastResponse, Observation, Series, SeriesForecast,
    };
    pub use crate::engine::PriceForecaster;
    pub use crate::error::{ForecastError, Result};
    pub use crate::features::Trend;
    pub use crate::models::ArimaOrder;
    pub use crate::store::{DatasetStore, InMemoryStore};
}
