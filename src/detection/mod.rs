//! Detection utilities for price series.

pub mod outlier;

pub use outlier::{filter_outliers, OutlierConfig, OutlierOutcome, OutlierReport};
