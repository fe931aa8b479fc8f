//! Ordinary Least Squares (OLS) regression for lag regressions.
//!
//! Solves the normal equations with a Cholesky factorisation. A numerically
//! singular system is reported as an error rather than regularised away, so the
//! estimator can surface it to the caller.

use crate::error::{ForecastError, Result};

/// Pivot threshold relative to the largest diagonal entry of X'X.
const SINGULAR_TOLERANCE: f64 = 1e-10;

/// OLS regression coefficients and intercept.
#[derive(Debug, Clone, PartialEq)]
pub struct OLSResult {
    /// Regression coefficients (one per regressor column).
    pub coefficients: Vec<f64>,
    /// Intercept term.
    pub intercept: f64,
}

impl OLSResult {
    /// Predict a single observation from its regressor values.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

/// Fit `y = intercept + X @ coefficients`.
///
/// # Arguments
/// * `y` - Target values (length n)
/// * `columns` - Regressor columns, each of length n
pub fn ols_fit(y: &[f64], columns: &[Vec<f64>]) -> Result<OLSResult> {
    let n = y.len();
    let k = columns.len();
    let num_params = k + 1;

    if n < num_params {
        return Err(ForecastError::InsufficientData {
            needed: num_params,
            got: n,
        });
    }

    for col in columns {
        if col.len() != n {
            return Err(ForecastError::InvalidParameter(format!(
                "regressor length {} does not match target length {}",
                col.len(),
                n
            )));
        }
    }

    // Design matrix columns: [1, x1, x2, ...]
    let mut xtx = vec![vec![0.0; num_params]; num_params];
    let mut xty = vec![0.0; num_params];

    for obs in 0..n {
        let y_obs = y[obs];
        xtx[0][0] += 1.0;
        xty[0] += y_obs;
        for i in 0..k {
            let xi = columns[i][obs];
            xtx[0][i + 1] += xi;
            xtx[i + 1][0] += xi;
            xty[i + 1] += xi * y_obs;
            for j in 0..k {
                xtx[i + 1][j + 1] += xi * columns[j][obs];
            }
        }
    }

    let beta = solve_symmetric(&xtx, &xty).ok_or_else(|| {
        ForecastError::IllConditioned(
            "lag regression matrix is singular; the series has too little variation for the selected order"
                .into(),
        )
    })?;

    if beta.iter().any(|b| !b.is_finite()) {
        return Err(ForecastError::IllConditioned(
            "lag regression produced non-finite coefficients".into(),
        ));
    }

    Ok(OLSResult {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
    })
}

/// Solve symmetric positive definite system using Cholesky decomposition.
///
/// Returns `None` when a pivot falls below the relative singularity tolerance.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0, f64::max).max(1.0);
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= SINGULAR_TOLERANCE * scale {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // L @ y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // L' @ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}
