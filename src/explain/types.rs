use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub name: String,
    /// Signed shift of the default probability attributed to this feature
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainResult {
    /// Probability the contributions start from (model mean output)
    pub expected_value: f64,
    pub probability: f64,
    /// One entry per input feature, input order
    pub contributions: Vec<FeatureContribution>,
}

impl ExplainResult {
    pub fn total(&self) -> f64 {
        self.contributions.iter().map(|c| c.contribution).sum()
    }
}
