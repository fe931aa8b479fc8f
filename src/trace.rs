//! Step-by-step record of a forecast computation.
//!
//! The trace is derived data for auditing; nothing in the pipeline reads it.

use crate::core::Series;
use crate::detection::outlier::OutlierReport;
use crate::features::profile::SeriesProfile;
use crate::features::trend::TrendAssessment;
use crate::models::arima::{
    ArimaOrder, Coefficient, Differenced, FittedArima, ForecastStep, Selection,
};
use crate::utils::metrics::FitMetrics;
use crate::validation::backtest::BacktestSummary;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An input observation echoed with its 1-based position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub index: usize,
    pub date: NaiveDate,
    pub price: f64,
}

/// One differencing pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferencingStage {
    pub lag: usize,
    pub seasonal: bool,
    pub length_before: usize,
    pub length_after: usize,
}

/// The fitted model as reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTrace {
    pub order: ArimaOrder,
    /// e.g. `ARIMA(1,1,0)`.
    pub name: String,
    pub rationale: String,
    pub coefficients: Vec<Coefficient>,
    pub iterations: usize,
    pub converged: bool,
    pub residual_count: usize,
    pub residual_variance: f64,
}

impl ModelTrace {
    pub fn new(selection: &Selection, model: &FittedArima) -> Self {
        Self {
            order: model.order(),
            name: model.order().to_string(),
            rationale: selection.rationale.clone(),
            coefficients: model.coefficients(),
            iterations: model.iterations(),
            converged: model.converged(),
            residual_count: model.residuals().len(),
            residual_variance: model.residual_variance(),
        }
    }
}

/// Everything computed on the way to a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationTrace {
    pub label: Option<String>,
    pub historical: Vec<HistoricalPoint>,
    /// Points added by gap filling.
    pub interpolated_points: usize,
    pub outliers: OutlierReport,
    pub profile: SeriesProfile,
    pub model: ModelTrace,
    pub differencing: Vec<DifferencingStage>,
    /// Full-precision fit metrics.
    pub metrics: FitMetrics,
    pub trend: TrendAssessment,
    pub forecast: Vec<ForecastStep>,
    pub backtest: Option<BacktestSummary>,
}

/// Echo `series` with 1-based indices.
pub fn historical_points(series: &Series) -> Vec<HistoricalPoint> {
    series
        .observations()
        .iter()
        .enumerate()
        .map(|(i, o)| HistoricalPoint {
            index: i + 1,
            date: o.date,
            price: o.price,
        })
        .collect()
}

/// Describe each recorded differencing pass.
pub fn differencing_stages(differenced: &Differenced) -> Vec<DifferencingStage> {
    differenced
        .steps()
        .iter()
        .map(|step| DifferencingStage {
            lag: step.lag,
            seasonal: step.is_seasonal(),
            length_before: step.input.len(),
            length_after: step.input.len().saturating_sub(step.lag),
        })
        .collect()
}
