//! Out-of-sample validation of selected models.

pub mod backtest;

pub use backtest::{backtest, BacktestConfig, BacktestSummary, FoldResult};
