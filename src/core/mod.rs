//! Core data structures for price forecasting.

mod forecast;
mod series;

pub use forecast::{DatasetForecast, ForecastPoint, ForecastResponse, SeriesForecast};
pub use series::{Observation, Series, DEFAULT_LABEL};
