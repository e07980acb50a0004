//! Regression metrics

use crate::error::{Result, XaiError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Goodness-of-fit summary for one partition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub r2: f64,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compute all metrics from aligned targets and predictions
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        check_aligned(y_true, y_pred)?;

        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        // MSE
        let mse: f64 = errors.iter().map(|e| e * e).sum::<f64>() / n;

        // MAE
        let mae: f64 = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        Ok(Self {
            r2: r2_score(y_true, y_pred)?,
            mse,
            rmse: mse.sqrt(),
            mae,
            n_samples: y_true.len(),
        })
    }
}

/// Coefficient of determination `1 − SS_res / SS_tot`.
///
/// A constant target scores 1.0 when predicted exactly and 0.0 otherwise.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_aligned(y_true, y_pred)?;

    let n = y_true.len() as f64;
    let y_mean: f64 = y_true.iter().sum::<f64>() / n;
    let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot > 0.0 {
        Ok(1.0 - ss_res / ss_tot)
    } else if ss_res == 0.0 {
        Ok(1.0)
    } else {
        Ok(0.0)
    }
}

fn check_aligned(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(XaiError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(XaiError::InsufficientDataError { required: 1, actual: 0 });
    }
    Ok(())
}
