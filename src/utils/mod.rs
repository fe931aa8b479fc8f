//! Numerical utilities shared by the models.

pub mod metrics;
pub mod ols;
pub mod stats;

pub use metrics::{calculate_metrics, fit_metrics, AccuracyMetrics, FitMetrics};
pub use ols::{ols_fit, OLSResult};
pub use stats::quantile_normal;
