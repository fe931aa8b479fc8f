//! Error types for the harvest-forecast library.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Coarse classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A caller-supplied parameter is outside its contract. Never retried.
    Validation,
    /// The series is too short (or too degenerate) for the selected order.
    InsufficientData,
}

/// Errors that can occur during forecasting operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Requested horizon is outside the accepted range.
    #[error("horizon must be between {min} and {max} days, got {horizon}")]
    InvalidHorizon {
        horizon: usize,
        min: usize,
        max: usize,
    },

    /// No dataset is stored under the given key.
    #[error("dataset '{0}' does not exist or has expired")]
    DatasetNotFound(String),

    /// An observation violates the data model (negative price, dates out of order).
    #[error("invalid observation at index {index}: {reason}")]
    InvalidObservation { index: usize, reason: String },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration could not be parsed or failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// A response could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Numerical failure while estimating the model (e.g. singular lag regression).
    #[error("insufficient data: {0}")]
    IllConditioned(String),
}

impl ForecastError {
    /// Classify the error into the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientData { .. } | Self::IllConditioned(_) => ErrorKind::InsufficientData,
            _ => ErrorKind::Validation,
        }
    }

    /// True for caller-side contract violations.
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// True when the series cannot support the requested fit.
    pub fn is_insufficient_data(&self) -> bool {
        self.kind() == ErrorKind::InsufficientData
    }
}
