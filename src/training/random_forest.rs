//! Random Forest regressor

use crate::error::{Result, XaiError};
use super::decision_tree::DecisionTree;
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Random Forest model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    /// Individual trees
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random state
    pub random_state: Option<u64>,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
    /// Number of features
    n_features: usize,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new_regressor(100)
    }
}

impl RandomForest {
    /// Create a new regressor forest
    pub fn new_regressor(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            random_state: None,
            feature_importances: None,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Enable or disable bootstrap sampling
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the forest to training data.
    ///
    /// Tree `i` draws its bootstrap sample and split order from a ChaCha8
    /// stream seeded with `random_state + i`, so the fitted forest does not
    /// depend on how rayon schedules the work.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(XaiError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(XaiError::InsufficientDataError { required: 1, actual: 0 });
        }
        if self.n_estimators == 0 {
            return Err(XaiError::ConfigError("n_estimators must be at least 1".to_string()));
        }

        self.n_features = n_features;

        // Build trees in parallel
        let base_seed = self.random_state.unwrap_or(42);

        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                // Bootstrap sample
                let sample_indices: Vec<usize> = if self.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = DecisionTree::new_regressor()
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_random_state(seed);

                if let Some(d) = self.max_depth {
                    tree = tree.with_max_depth(d);
                }

                tree.fit_indices(x, y, &sample_indices, &mut rng)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;

        debug!(
            n_trees = self.trees.len(),
            max_tree_depth = self.trees.iter().map(DecisionTree::get_depth).max().unwrap_or(0),
            "Forest fitted"
        );

        // Compute feature importances
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        if self.trees.is_empty() {
            return;
        }

        let mut total_importances = vec![0.0; self.n_features];

        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (total, &val) in total_importances.iter_mut().zip(imp.iter()) {
                    *total += val;
                }
            }
        }

        let n_trees = self.trees.len() as f64;
        for imp in &mut total_importances {
            *imp /= n_trees;
        }

        // Normalize
        let total: f64 = total_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut total_importances {
                *imp /= total;
            }
        }

        self.feature_importances = Some(Array1::from_vec(total_importances));
    }

    /// Mean prediction over all trees
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(XaiError::ModelNotFitted);
        }

        let all_predictions: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let mut sum = Array1::zeros(x.nrows());
        for preds in &all_predictions {
            sum += preds;
        }
        Ok(sum / all_predictions.len() as f64)
    }

    /// Average of each tree's cover-weighted expected value
    pub fn expected_value(&self) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(XaiError::ModelNotFitted);
        }
        let total = self
            .trees
            .iter()
            .map(DecisionTree::expected_value)
            .sum::<Result<f64>>()?;
        Ok(total / self.trees.len() as f64)
    }

    /// Fitted trees, in seed order
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Mean impurity-decrease importance over the trees, normalized to sum to 1
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regressor() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut rf = RandomForest::new_regressor(10).with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let predictions = rf.predict(&x).unwrap();

        let mse: f64 = predictions
            .iter()
            .zip(y.iter())
            .map(|(p, a)| (p - a).powi(2))
            .sum::<f64>()
            / y.len() as f64;

        assert!(mse < 2.0, "MSE too high: {}", mse);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let x = array![[1.0, 3.0], [2.0, 1.0], [3.0, 4.0], [4.0, 1.0], [5.0, 5.0], [6.0, 9.0]];
        let y = array![2.0, 1.0, 6.0, 3.0, 7.0, 12.0];

        let mut a = RandomForest::new_regressor(8).with_random_state(7);
        let mut b = RandomForest::new_regressor(8).with_random_state(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
        assert_eq!(a.expected_value().unwrap(), b.expected_value().unwrap());
    }

    #[test]
    fn test_expected_value_is_mean_of_trees() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0];

        let mut rf = RandomForest::new_regressor(5).with_random_state(0);
        rf.fit(&x, &y).unwrap();

        let manual = rf.trees().iter().map(|t| t.expected_value().unwrap()).sum::<f64>() / 5.0;
        assert!((rf.expected_value().unwrap() - manual).abs() < 1e-12);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        let mut rf = RandomForest::new_regressor(10).with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let importances = rf.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);

        // First feature should be more important
        assert!(importances[0] >= importances[1]);
    }

    #[test]
    fn test_not_fitted() {
        let rf = RandomForest::new_regressor(3);
        assert!(matches!(rf.predict(&array![[1.0]]), Err(XaiError::ModelNotFitted)));
        assert!(matches!(rf.expected_value(), Err(XaiError::ModelNotFitted)));
    }
}
