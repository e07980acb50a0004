//! Standard (z-score) feature scaling

use crate::error::{Result, XaiError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Fitted parameters of one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    /// Column mean
    pub center: f64,
    /// Population standard deviation, or 1.0 for a constant column
    pub scale: f64,
}

/// Standard scaler: `(x - mean) / std`, fitted on one partition and
/// applied unchanged to any other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute per-column mean and standard deviation (ddof = 0).
    ///
    /// A column with zero spread keeps scale 1.0, so it is centered but not rescaled.
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        let n = x.nrows();
        if n == 0 {
            return Err(XaiError::InsufficientDataError { required: 1, actual: 0 });
        }

        self.params = x
            .axis_iter(Axis(1))
            .enumerate()
            .map(|(j, column)| {
                let mean = column.sum() / n as f64;
                let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
                let std = var.sqrt();
                if std == 0.0 || !std.is_finite() {
                    warn!(column = j, mean, "Zero standard deviation, column left unscaled");
                    ScalerParams { center: mean, scale: 1.0 }
                } else {
                    ScalerParams { center: mean, scale: std }
                }
            })
            .collect();

        self.is_fitted = true;
        Ok(self)
    }

    /// Apply the fitted transform
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_input(x)?;
        let mut out = x.clone();
        for (mut column, params) in out.axis_iter_mut(Axis(1)).zip(self.params.iter()) {
            column.mapv_inplace(|v| (v - params.center) / params.scale);
        }
        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Map scaled values back to original units
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_input(x)?;
        let mut out = x.clone();
        for (mut column, params) in out.axis_iter_mut(Axis(1)).zip(self.params.iter()) {
            column.mapv_inplace(|v| v * params.scale + params.center);
        }
        Ok(out)
    }

    /// Fitted per-column parameters
    pub fn params(&self) -> &[ScalerParams] {
        &self.params
    }

    pub fn means(&self) -> Array1<f64> {
        self.params.iter().map(|p| p.center).collect()
    }

    pub fn scales(&self) -> Array1<f64> {
        self.params.iter().map(|p| p.scale).collect()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<()> {
        if !self.is_fitted {
            return Err(XaiError::ModelNotFitted);
        }
        if x.ncols() != self.params.len() {
            return Err(XaiError::ShapeError {
                expected: format!("{} columns", self.params.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(())
    }
}
