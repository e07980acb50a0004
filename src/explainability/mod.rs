//! Model explainability module
//!
//! Provides exact Shapley attributions for the forest:
//! - TreeSHAP over every tree, averaged across the forest
//! - A SHAP values container with global importance and additivity checks
//! - Per-row local explanations

mod local_explanations;
mod tree_shap;
mod values;

pub use local_explanations::{FeatureContribution, LocalExplanation};
pub use tree_shap::TreeExplainer;
pub use values::ShapValues;
