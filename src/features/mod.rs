//! Series features used for reporting and order identification.

pub mod autocorrelation;
pub mod profile;
pub mod trend;

pub use autocorrelation::{autocorrelation, partial_autocorrelation};
pub use profile::{detect_interval, profile, SeriesProfile};
pub use trend::{classify_trend, linear_slope, Trend, TrendAssessment, TrendConfig};
