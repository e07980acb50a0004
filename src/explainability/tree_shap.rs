//! Exact TreeSHAP for the random forest.
//!
//! Path-dependent polynomial-time algorithm: every tree is walked once per row
//! while a running "unique path" tracks, for each feature met on the way,
//! the fraction of training covers that flows down the path (`zero_fraction`)
//! and whether the row itself follows it (`one_fraction`). Forest values are
//! the mean of the per-tree values.

use super::values::ShapValues;
use crate::error::{Result, XaiError};
use crate::training::{DecisionTree, RandomForest, TreeNode};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use std::time::Instant;
use tracing::debug;

/// One element of the unique feature path.
#[derive(Debug, Clone, Copy, Default)]
struct PathElement {
    /// `None` only for the root sentinel
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    /// Weight of all subsets of the current path of a given size
    pweight: f64,
}

/// SHAP explainer for a fitted [`RandomForest`].
pub struct TreeExplainer<'a> {
    forest: &'a RandomForest,
    base_value: f64,
    /// Scratch length that fits the deepest tree
    path_capacity: usize,
    feature_names: Vec<String>,
}

impl<'a> TreeExplainer<'a> {
    /// Build an explainer. Fails with [`XaiError::ModelNotFitted`] for an unfitted forest.
    pub fn new(forest: &'a RandomForest) -> Result<Self> {
        if !forest.is_fitted() {
            return Err(XaiError::ModelNotFitted);
        }

        let max_depth = forest.trees().iter().map(DecisionTree::get_depth).max().unwrap_or(0);
        let feature_names = (0..forest.n_features()).map(|j| format!("feature_{}", j)).collect();

        Ok(Self {
            forest,
            base_value: forest.expected_value()?,
            path_capacity: (max_depth + 1) * (max_depth + 2) / 2,
            feature_names,
        })
    }

    /// Name the explained columns
    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.forest.n_features() {
            return Err(XaiError::ShapeError {
                expected: format!("{} feature names", self.forest.n_features()),
                actual: format!("{} feature names", names.len()),
            });
        }
        self.feature_names = names;
        Ok(self)
    }

    /// Expected forest output: mean of each tree's cover-weighted leaf average
    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    /// SHAP values for every row of `x`, computed in parallel.
    pub fn shap_values(&self, x: &Array2<f64>) -> Result<ShapValues> {
        self.check_width(x.ncols())?;

        let start = Instant::now();
        let rows: Vec<Array1<f64>> = (0..x.nrows())
            .into_par_iter()
            .map(|i| self.row_contributions(x.row(i)))
            .collect();

        let mut values = Array2::zeros(x.dim());
        for (mut target, row) in values.rows_mut().into_iter().zip(rows) {
            target.assign(&row);
        }

        debug!(
            rows = x.nrows(),
            trees = self.forest.n_trees(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "SHAP values computed"
        );

        ShapValues::new(values, x.clone(), self.base_value, self.feature_names.clone())
    }

    /// SHAP values of a single row
    pub fn explain_row(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        self.check_width(row.len())?;
        Ok(self.row_contributions(row))
    }

    fn row_contributions(&self, row: ArrayView1<'_, f64>) -> Array1<f64> {
        let mut phi = vec![0.0; self.forest.n_features()];
        let mut scratch = vec![PathElement::default(); self.path_capacity];

        for tree in self.forest.trees() {
            if let Some(root) = tree.root() {
                tree_shap(root, row, &mut phi, &[], &mut scratch, 0, 1.0, 1.0, None);
            }
        }

        let n_trees = self.forest.n_trees() as f64;
        phi.into_iter().map(|v| v / n_trees).collect()
    }

    fn check_width(&self, n_cols: usize) -> Result<()> {
        if n_cols != self.forest.n_features() {
            return Err(XaiError::ShapeError {
                expected: format!("{} features", self.forest.n_features()),
                actual: format!("{} features", n_cols),
            });
        }
        Ok(())
    }
}

/// Recursive walk adding one tree's contributions for `x` into `phi`.
#[allow(clippy::too_many_arguments)]
fn tree_shap(
    node: &TreeNode,
    x: ArrayView1<'_, f64>,
    phi: &mut [f64],
    parent_path: &[PathElement],
    scratch: &mut [PathElement],
    mut unique_depth: usize,
    parent_zero_fraction: f64,
    parent_one_fraction: f64,
    parent_feature: Option<usize>,
) {
    let (path, rest) = scratch.split_at_mut(unique_depth + 1);
    path[..unique_depth].copy_from_slice(&parent_path[..unique_depth]);
    extend_path(path, unique_depth, parent_zero_fraction, parent_one_fraction, parent_feature);

    match node {
        TreeNode::Leaf { value, .. } => {
            for i in 1..=unique_depth {
                let weight = unwound_path_sum(path, unique_depth, i);
                let el = path[i];
                if let Some(feature) = el.feature {
                    phi[feature] += weight * (el.one_fraction - el.zero_fraction) * value;
                }
            }
        }
        TreeNode::Split { feature_idx, threshold, left, right, n_samples, .. } => {
            let (hot, cold) = if x[*feature_idx] <= *threshold {
                (left, right)
            } else {
                (right, left)
            };

            let cover = *n_samples as f64;
            let hot_zero_fraction = hot.n_samples() as f64 / cover;
            let cold_zero_fraction = cold.n_samples() as f64 / cover;
            let mut incoming_zero_fraction = 1.0;
            let mut incoming_one_fraction = 1.0;

            // A feature already on the path is undone so it appears once
            if let Some(k) = path[..=unique_depth]
                .iter()
                .position(|el| el.feature == Some(*feature_idx))
            {
                incoming_zero_fraction = path[k].zero_fraction;
                incoming_one_fraction = path[k].one_fraction;
                unwind_path(path, unique_depth, k);
                unique_depth -= 1;
            }

            tree_shap(
                hot,
                x,
                phi,
                path,
                rest,
                unique_depth + 1,
                hot_zero_fraction * incoming_zero_fraction,
                incoming_one_fraction,
                Some(*feature_idx),
            );
            tree_shap(
                cold,
                x,
                phi,
                path,
                rest,
                unique_depth + 1,
                cold_zero_fraction * incoming_zero_fraction,
                0.0,
                Some(*feature_idx),
            );
        }
    }
}

fn extend_path(
    path: &mut [PathElement],
    unique_depth: usize,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    path[unique_depth] = PathElement {
        feature,
        zero_fraction,
        one_fraction,
        pweight: if unique_depth == 0 { 1.0 } else { 0.0 },
    };

    let d = unique_depth as f64;
    for i in (0..unique_depth).rev() {
        path[i + 1].pweight += one_fraction * path[i].pweight * (i + 1) as f64 / (d + 1.0);
        path[i].pweight = zero_fraction * path[i].pweight * (d - i as f64) / (d + 1.0);
    }
}

fn unwind_path(path: &mut [PathElement], unique_depth: usize, path_index: usize) {
    let one_fraction = path[path_index].one_fraction;
    let zero_fraction = path[path_index].zero_fraction;
    let d = unique_depth as f64;
    let mut next_one_portion = path[unique_depth].pweight;

    for i in (0..unique_depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].pweight;
            path[i].pweight = next_one_portion * (d + 1.0) / ((i + 1) as f64 * one_fraction);
            next_one_portion = tmp - path[i].pweight * zero_fraction * (d - i as f64) / (d + 1.0);
        } else {
            path[i].pweight = path[i].pweight * (d + 1.0) / (zero_fraction * (d - i as f64));
        }
    }

    for i in path_index..unique_depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
}

/// Total permutation weight of the path with element `path_index` removed,
/// without modifying the path.
fn unwound_path_sum(path: &[PathElement], unique_depth: usize, path_index: usize) -> f64 {
    let one_fraction = path[path_index].one_fraction;
    let zero_fraction = path[path_index].zero_fraction;
    let d = unique_depth as f64;
    let mut next_one_portion = path[unique_depth].pweight;
    let mut total = 0.0;

    for i in (0..unique_depth).rev() {
        if one_fraction != 0.0 {
            let tmp = next_one_portion * (d + 1.0) / ((i + 1) as f64 * one_fraction);
            total += tmp;
            next_one_portion = path[i].pweight - tmp * zero_fraction * ((d - i as f64) / (d + 1.0));
        } else if zero_fraction != 0.0 {
            total += (path[i].pweight / zero_fraction) / ((d - i as f64) / (d + 1.0));
        }
    }

    total
}
