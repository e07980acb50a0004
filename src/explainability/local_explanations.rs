//! Local explanations (per-row SHAP feature contributions)

use serde::{Deserialize, Serialize};

/// Feature contribution to a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    /// Feature index
    pub feature_index: usize,
    /// Feature name
    pub feature_name: String,
    /// Feature value for this instance (model units)
    pub feature_value: f64,
    /// Contribution to prediction (SHAP value)
    pub contribution: f64,
}

/// Local explanation for a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalExplanation {
    /// Instance index within the explained partition
    pub instance_index: usize,
    /// Base value (expected prediction)
    pub base_value: f64,
    /// Model output, `base_value + Σ contributions`
    pub prediction: f64,
    /// Feature contributions, in column order
    pub contributions: Vec<FeatureContribution>,
}

impl LocalExplanation {
    /// Get sum of contributions
    pub fn sum_contributions(&self) -> f64 {
        self.contributions.iter().map(|c| c.contribution).sum()
    }

    /// Get sorted contributions (by absolute value, descending)
    pub fn sorted_contributions(&self) -> Vec<&FeatureContribution> {
        let mut sorted: Vec<&FeatureContribution> = self.contributions.iter().collect();
        sorted.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));
        sorted
    }

    /// Get positive contributors
    pub fn positive_contributors(&self) -> Vec<&FeatureContribution> {
        self.contributions
            .iter()
            .filter(|c| c.contribution > 0.0)
            .collect()
    }

    /// Get negative contributors
    pub fn negative_contributors(&self) -> Vec<&FeatureContribution> {
        self.contributions
            .iter()
            .filter(|c| c.contribution < 0.0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contribution(index: usize, name: &str, value: f64) -> FeatureContribution {
        FeatureContribution {
            feature_index: index,
            feature_name: name.to_string(),
            feature_value: 0.0,
            contribution: value,
        }
    }

    #[test]
    fn test_local_explanation() {
        let explanation = LocalExplanation {
            instance_index: 0,
            base_value: 454.3,
            prediction: 446.8,
            contributions: vec![
                contribution(0, "AT", -9.0),
                contribution(1, "V", 2.5),
                contribution(2, "AP", -1.5),
                contribution(3, "RH", 0.5),
            ],
        };

        assert!((explanation.sum_contributions() + 7.5).abs() < 1e-10);

        let sorted = explanation.sorted_contributions();
        assert_eq!(sorted[0].feature_name, "AT");
        assert_eq!(sorted[1].feature_name, "V");

        assert_eq!(explanation.positive_contributors().len(), 2);
        assert_eq!(explanation.negative_contributors().len(), 2);
    }
}
