//! Model training module
//!
//! Provides the regression model behind the explanations:
//! - CART regression trees that record per-node sample covers
//! - A seeded, bootstrap-aggregated Random Forest
//! - R² and error metrics

pub mod decision_tree;
pub mod metrics;
pub mod random_forest;

pub use decision_tree::{DecisionTree, TreeNode};
pub use metrics::{r2_score, RegressionMetrics};
pub use random_forest::RandomForest;
