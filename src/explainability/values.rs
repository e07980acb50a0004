//! SHAP values container.
//!
//! Holds per-sample, per-feature contributions together with the rows they
//! explain and the shared base value.

use super::local_explanations::{FeatureContribution, LocalExplanation};
use crate::error::{Result, XaiError};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// SHAP values for a batch of rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapValues {
    /// `[samples × features]` contributions
    values: Array2<f64>,
    /// Explained feature rows, same shape as `values`
    data: Array2<f64>,
    /// Expected model output over the training distribution
    base_value: f64,
    feature_names: Vec<String>,
}

impl ShapValues {
    pub fn new(
        values: Array2<f64>,
        data: Array2<f64>,
        base_value: f64,
        feature_names: Vec<String>,
    ) -> Result<Self> {
        if values.dim() != data.dim() {
            return Err(XaiError::ShapeError {
                expected: format!("{:?}", values.dim()),
                actual: format!("{:?}", data.dim()),
            });
        }
        if feature_names.len() != values.ncols() {
            return Err(XaiError::ShapeError {
                expected: format!("{} feature names", values.ncols()),
                actual: format!("{} feature names", feature_names.len()),
            });
        }
        Ok(Self { values, data, base_value, feature_names })
    }

    /// Replace the explained rows with another view of the same rows, e.g.
    /// unscaled measurements for display.
    pub fn with_data(mut self, data: Array2<f64>) -> Result<Self> {
        if data.dim() != self.values.dim() {
            return Err(XaiError::ShapeError {
                expected: format!("{:?}", self.values.dim()),
                actual: format!("{:?}", data.dim()),
            });
        }
        self.data = data;
        Ok(self)
    }

    /// Number of samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }

    /// Number of features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    #[inline]
    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Contributions of one sample
    pub fn row(&self, index: usize) -> Result<ArrayView1<'_, f64>> {
        self.check_index(index)?;
        Ok(self.values.row(index))
    }

    /// Position of a feature by name
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|n| n == name)
    }

    /// Mean absolute contribution per feature (global importance)
    pub fn mean_abs(&self) -> Array1<f64> {
        if self.n_samples() == 0 {
            return Array1::zeros(self.n_features());
        }
        self.values.mapv(f64::abs).mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(self.n_features()))
    }

    /// Feature indices ordered by decreasing mean absolute contribution
    pub fn importance_order(&self) -> Vec<usize> {
        let importance = self.mean_abs();
        let mut order: Vec<usize> = (0..self.n_features()).collect();
        order.sort_by(|&a, &b| {
            importance[b]
                .partial_cmp(&importance[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order
    }

    /// `base_value + Σ contributions` for every sample
    pub fn reconstructed_outputs(&self) -> Array1<f64> {
        self.values.sum_axis(Axis(1)) + self.base_value
    }

    /// Verify that contributions sum to the model output.
    ///
    /// Fails with the first sample whose reconstruction is off by more than `tolerance`.
    pub fn verify(&self, predictions: &Array1<f64>, tolerance: f64) -> Result<()> {
        if predictions.len() != self.n_samples() {
            return Err(XaiError::ShapeError {
                expected: format!("{} predictions", self.n_samples()),
                actual: format!("{} predictions", predictions.len()),
            });
        }

        let reconstructed = self.reconstructed_outputs();
        for (i, (sum, pred)) in reconstructed.iter().zip(predictions.iter()).enumerate() {
            if (sum - pred).abs() > tolerance {
                return Err(XaiError::ValidationError(format!(
                    "SHAP values of row {} sum to {:.6}, prediction is {:.6}",
                    i, sum, pred
                )));
            }
        }
        Ok(())
    }

    /// Per-feature explanation of one row.
    ///
    /// `index` outside `0..n_samples` is an [`XaiError::IndexOutOfBounds`].
    pub fn explain(&self, index: usize) -> Result<LocalExplanation> {
        self.check_index(index)?;

        let contributions: Vec<FeatureContribution> = self
            .feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| FeatureContribution {
                feature_index: j,
                feature_name: name.clone(),
                feature_value: self.data[[index, j]],
                contribution: self.values[[index, j]],
            })
            .collect();

        let prediction = self.base_value + contributions.iter().map(|c| c.contribution).sum::<f64>();

        Ok(LocalExplanation {
            instance_index: index,
            base_value: self.base_value,
            prediction,
            contributions,
        })
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.n_samples() {
            return Err(XaiError::IndexOutOfBounds {
                index,
                len: self.n_samples(),
            });
        }
        Ok(())
    }
}
