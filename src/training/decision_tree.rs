//! CART regression tree

use crate::error::{Result, XaiError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Minimum gap between consecutive sorted values for a threshold to be placed between them
const FEATURE_THRESHOLD: f64 = 1e-7;

/// Decision tree node.
///
/// `n_samples` counts the (bootstrap-weighted) training rows that reached
/// the node; children's counts always sum to the parent's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node; rows with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

impl TreeNode {
    /// Number of training rows that reached this node
    pub fn n_samples(&self) -> usize {
        match self {
            TreeNode::Leaf { n_samples, .. } | TreeNode::Split { n_samples, .. } => *n_samples,
        }
    }

    /// Cover-weighted mean of the leaf values below this node
    pub fn expected_value(&self) -> f64 {
        match self {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split { left, right, n_samples, .. } => {
                let l = left.n_samples() as f64;
                let r = right.n_samples() as f64;
                (l * left.expected_value() + r * right.expected_value()) / *n_samples as f64
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// `sum_l² / n_l + sum_r² / n_r`; larger means lower weighted variance
    proxy: f64,
}

/// Regression tree grown by variance reduction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Seed used by [`DecisionTree::fit`]
    pub random_state: Option<u64>,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new_regressor()
    }
}

impl DecisionTree {
    /// Create a new regressor tree
    pub fn new_regressor() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            random_state: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree to all rows of the training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));
        self.fit_indices(x, y, &indices, &mut rng)
    }

    /// Fit the tree to the rows named by `indices` (duplicates allowed, as in a
    /// bootstrap sample). `rng` drives the per-split feature order.
    pub fn fit_indices(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(XaiError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if indices.is_empty() {
            return Err(XaiError::InsufficientDataError { required: 1, actual: 0 });
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= n_samples) {
            return Err(XaiError::IndexOutOfBounds { index: bad, len: n_samples });
        }
        if n_features == 0 {
            return Err(XaiError::ValidationError("no feature columns".to_string()));
        }

        self.n_features = n_features;

        let mut importances = vec![0.0; n_features];
        self.root = Some(self.build_tree(x, y, indices, 0, rng, &mut importances));

        // Normalize feature importances
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let value = indices.iter().map(|&i| y[i]).sum::<f64>() / n_samples as f64;

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || Self::is_pure(y, indices);

        if should_stop {
            return TreeNode::Leaf { value, n_samples };
        }

        let Some(best) = self.find_best_split(x, y, indices, rng) else {
            return TreeNode::Leaf { value, n_samples };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature]] <= best.threshold);

        if left_indices.len() < self.min_samples_leaf || right_indices.len() < self.min_samples_leaf {
            return TreeNode::Leaf { value, n_samples };
        }

        // Weighted impurity decrease: n·var(parent) − n_l·var(left) − n_r·var(right)
        let total_sum = value * n_samples as f64;
        let decrease = best.proxy - total_sum * total_sum / n_samples as f64;
        importances[best.feature] += decrease.max(0.0);

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, rng, importances));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, rng, importances));

        TreeNode::Split {
            feature_idx: best.feature,
            threshold: best.threshold,
            left,
            right,
            n_samples,
        }
    }

    /// Sort-and-sweep search over every feature, visited in a random order
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let mut features: Vec<usize> = (0..x.ncols()).collect();
        features.shuffle(rng);

        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let n = indices.len();

        let mut best: Option<SplitCandidate> = None;
        let mut sorted: Vec<(f64, f64)> = Vec::with_capacity(n);

        for &feature in &features {
            sorted.clear();
            sorted.extend(indices.iter().map(|&i| (x[[i, feature]], y[i])));
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0f64;
            for pos in 1..n {
                left_sum += sorted[pos - 1].1;

                let (prev, cur) = (sorted[pos - 1].0, sorted[pos].0);
                if cur <= prev + FEATURE_THRESHOLD {
                    continue;
                }

                let n_left = pos;
                let n_right = n - pos;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let proxy = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;

                if best.map_or(true, |b| proxy > b.proxy) {
                    let mut threshold = prev + (cur - prev) / 2.0;
                    if threshold >= cur || !threshold.is_finite() {
                        threshold = prev;
                    }
                    best = Some(SplitCandidate { feature, threshold, proxy });
                }
            }
        }

        best
    }

    fn is_pure(y: &Array1<f64>, indices: &[usize]) -> bool {
        let first = y[indices[0]];
        indices.iter().all(|&i| (y[i] - first).abs() < 1e-10)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(XaiError::ModelNotFitted)?;
        self.check_width(x.ncols())?;

        Ok(x.rows().into_iter().map(|row| Self::predict_sample(root, row)).collect())
    }

    fn predict_sample(node: &TreeNode, sample: ArrayView1<'_, f64>) -> f64 {
        match node {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                if sample[*feature_idx] <= *threshold {
                    Self::predict_sample(left, sample)
                } else {
                    Self::predict_sample(right, sample)
                }
            }
        }
    }

    fn check_width(&self, n_cols: usize) -> Result<()> {
        if n_cols != self.n_features {
            return Err(XaiError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", n_cols),
            });
        }
        Ok(())
    }

    /// Root node of a fitted tree
    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    /// Cover-weighted mean prediction over the training rows
    pub fn expected_value(&self) -> Result<f64> {
        self.root
            .as_ref()
            .map(TreeNode::expected_value)
            .ok_or(XaiError::ModelNotFitted)
    }

    /// Impurity decrease per feature, normalized to sum to 1
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth (a lone leaf has depth 1)
    pub fn get_depth(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => Self::node_depth(node),
        }
    }

    fn node_depth(node: &TreeNode) -> usize {
        match node {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + Self::node_depth(left).max(Self::node_depth(right)),
        }
    }

}
