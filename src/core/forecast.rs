//! Forecast response structures.

use crate::core::Observation;
use crate::error::{ForecastError, Result};
use crate::features::trend::Trend;
use crate::trace::CalculationTrace;
use crate::utils::metrics::FitMetrics;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A forecast price for one future day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// 1-based step.
    pub step: usize,
    pub date: NaiveDate,
    /// Clamped at zero and rounded to 2 decimals.
    pub price: f64,
}

/// Complete result of a forecast request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    /// Observations the model was fitted on.
    #[serde(rename = "historical_data")]
    pub historical: Vec<Observation>,
    #[serde(rename = "predicted_data")]
    pub predicted: Vec<ForecastPoint>,
    /// Fit metrics rounded for presentation.
    #[serde(rename = "model_metrics")]
    pub metrics: FitMetrics,
    pub trend: Trend,
    #[serde(rename = "calculation_details")]
    pub trace: CalculationTrace,
}

impl ForecastResponse {
    /// Forecast horizon in days.
    pub fn horizon(&self) -> usize {
        self.predicted.len()
    }

    /// Predicted prices in step order.
    pub fn prices(&self) -> Vec<f64> {
        self.predicted.iter().map(|p| p.price).collect()
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ForecastError::Serialization(e.to_string()))
    }

    /// Serialize to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ForecastError::Serialization(e.to_string()))
    }
}

/// Forecast summary of one labelled series in a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesForecast {
    /// Grade or type the series was uploaded under.
    #[serde(rename = "type")]
    pub label: String,
    #[serde(rename = "historical_data")]
    pub historical: Vec<Observation>,
    #[serde(rename = "predicted_data")]
    pub predicted: Vec<ForecastPoint>,
    pub trend: Trend,
    #[serde(rename = "model_metrics")]
    pub metrics: FitMetrics,
}

impl SeriesForecast {
    /// Summarise `response` under `label`, leaving out its trace.
    pub fn new(label: impl Into<String>, response: &ForecastResponse) -> Self {
        Self {
            label: label.into(),
            historical: response.historical.clone(),
            predicted: response.predicted.clone(),
            trend: response.trend,
            metrics: response.metrics,
        }
    }
}

/// Forecasts for every series of a dataset.
///
/// The top-level fields describe the primary series, the first label in sorted
/// order; `series_data` lists every series, primary included, by label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetForecast {
    #[serde(flatten)]
    pub primary: ForecastResponse,
    pub series_data: Vec<SeriesForecast>,
}

impl DatasetForecast {
    /// Label of the primary series.
    pub fn primary_label(&self) -> Option<&str> {
        self.series_data.first().map(|s| s.label.as_str())
    }

    /// Summary for `label`.
    pub fn get(&self, label: &str) -> Option<&SeriesForecast> {
        self.series_data.iter().find(|s| s.label == label)
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ForecastError::Serialization(e.to_string()))
    }
}
